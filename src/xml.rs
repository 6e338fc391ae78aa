//! `RSAKeyValue` XML parameter documents.
//!
//! ```text
//! <RSAKeyValue>
//!   <Modulus>…</Modulus><Exponent>…</Exponent>
//!   <P>…</P><Q>…</Q><DP>…</DP><DQ>…</DQ><InverseQ>…</InverseQ><D>…</D>
//! </RSAKeyValue>
//! ```
//!
//! Every value is base64.

use core::fmt;

use base64ct::{Base64, Encoding};
use quick_xml::{events::Event, Reader};
use zeroize::Zeroizing;

use crate::errors::{Error, Result};
use crate::key::{RsaParameters, RsaPrivateParts};

const ROOT: &str = "RSAKeyValue";

/// Deepest element nesting accepted by [`XmlElement::parse`]. Tree walks
/// recurse per level, so unbounded input must not reach them.
const MAX_DEPTH: usize = 16;

/// A parsed or generated XML element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Element holding only text.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::new(name)
        }
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First descendant (or self) whose name matches case-insensitively.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name.eq_ignore_ascii_case(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Parse a document and return its root element. Attributes,
    /// comments, processing instructions and the doctype are skipped.
    /// Documents nested deeper than 16 elements are rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    if root.is_some() {
                        return Err(Error::Xml("more than one root element".into()));
                    }
                    if stack.len() >= MAX_DEPTH {
                        return Err(Error::Xml("elements nested too deeply".into()));
                    }
                    stack.push(XmlElement::new(String::from_utf8_lossy(e.name().as_ref())));
                }
                Event::Empty(ref e) => {
                    let element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()));
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unexpected end tag".into()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref e) => {
                    let text = e.unescape()?;
                    match stack.last_mut() {
                        Some(parent) => parent.text.push_str(&text),
                        None => return Err(Error::Xml("text outside the root element".into())),
                    }
                }
                Event::CData(e) => {
                    let data = e.into_inner();
                    let parent = stack
                        .last_mut()
                        .ok_or_else(|| Error::Xml("CDATA outside the root element".into()))?;
                    parent.text.push_str(&String::from_utf8_lossy(&data));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml("unclosed element".into()));
        }
        root.ok_or_else(|| Error::Xml("missing root element".into()))
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(Error::Xml("more than one root element".into())),
    }
    Ok(())
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)?;
        write_escaped(f, &self.text)?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.name)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '&' => f.write_str("&amp;")?,
            '"' => f.write_str("&quot;")?,
            '\'' => f.write_str("&apos;")?,
            _ => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

/// Decode an optional base64 field; whitespace inside the value is ignored.
fn field(root: &XmlElement, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
    let Some(element) = root.find(name) else {
        return Ok(None);
    };
    let compact: Zeroizing<String> = Zeroizing::new(
        element
            .text()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect(),
    );
    if compact.is_empty() {
        return Ok(None);
    }
    Ok(Some(Zeroizing::new(Base64::decode_vec(&compact)?)))
}

fn required(root: &XmlElement, name: &'static str) -> Result<Zeroizing<Vec<u8>>> {
    field(root, name)?.ok_or(Error::Format(name))
}

impl RsaParameters {
    /// Parse an `RSAKeyValue` XML document. Element names are matched
    /// case-insensitively; `Modulus` and `Exponent` are required and the
    /// private elements must be all present or all absent.
    pub fn from_xml(text: &str) -> Result<Self> {
        let root = XmlElement::parse(text)?;
        let modulus = required(&root, "Modulus")?;
        let exponent = required(&root, "Exponent")?;

        let private = [
            field(&root, "D")?,
            field(&root, "P")?,
            field(&root, "Q")?,
            field(&root, "DP")?,
            field(&root, "DQ")?,
            field(&root, "InverseQ")?,
        ];
        let present = private.iter().filter(|value| value.is_some()).count();

        match private {
            [Some(d), Some(p), Some(q), Some(dp), Some(dq), Some(inverse_q)] => {
                let parts = RsaPrivateParts::new(&d, &p, &q, &dp, &dq, &inverse_q);
                RsaParameters::new_private(&modulus, &exponent, parts)
            }
            _ if present == 0 => RsaParameters::new_public(&modulus, &exponent),
            _ => Err(Error::Format("incomplete private key parameters")),
        }
    }

    /// Build the `RSAKeyValue` element tree. Private elements are included
    /// only when requested and available.
    pub fn to_xml_document(&self, include_private: bool) -> XmlElement {
        let mut root = XmlElement::new(ROOT);
        root.push(XmlElement::with_text("Modulus", Base64::encode_string(self.modulus())));
        root.push(XmlElement::with_text("Exponent", Base64::encode_string(self.exponent())));

        if let (true, Some(private)) = (include_private, self.private_parts()) {
            let fields: [(&str, &[u8]); 6] = [
                ("P", private.p()),
                ("Q", private.q()),
                ("DP", private.dp()),
                ("DQ", private.dq()),
                ("InverseQ", private.inverse_q()),
                ("D", private.d()),
            ];
            for (name, value) in fields {
                root.push(XmlElement::with_text(name, Base64::encode_string(value)));
            }
        }
        root
    }

    /// Serialize as an `RSAKeyValue` XML string.
    pub fn to_xml(&self, include_private: bool) -> String {
        self.to_xml_document(include_private).to_string()
    }
}
