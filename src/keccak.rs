//! Keccak-f\[1600\] sponge with SHA-3 (FIPS 202) and original Keccak padding.
//!
//! [`KeccakState`] is the runtime-parameterized engine used by the hashing
//! facade. The fixed-width wrappers ([`Sha3_256`], [`Keccak256`], ...)
//! implement the RustCrypto [`digest`] traits so they can be plugged into
//! [`Digest`](digest::Digest), [`hmac`] and the RSA PKCS#1 v1.5 signer.

use core::fmt;

use const_oid::{AssociatedOid, ObjectIdentifier};
use digest::{
    consts::{U104, U136, U144, U28, U32, U48, U64, U72},
    FixedOutput, FixedOutputReset, HashMarker, Output, OutputSizeUser, Reset, Update,
};
use digest::core_api::BlockSizeUser;
use zeroize::Zeroize;

const ROUNDS: usize = 24;

const ROUND_CONSTANTS: [u64; ROUNDS] = [
    0x0000_0000_0000_0001,
    0x0000_0000_0000_8082,
    0x8000_0000_0000_808a,
    0x8000_0000_8000_8000,
    0x0000_0000_0000_808b,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8009,
    0x0000_0000_0000_008a,
    0x0000_0000_0000_0088,
    0x0000_0000_8000_8009,
    0x0000_0000_8000_000a,
    0x0000_0000_8000_808b,
    0x8000_0000_0000_008b,
    0x8000_0000_0000_8089,
    0x8000_0000_0000_8003,
    0x8000_0000_0000_8002,
    0x8000_0000_0000_0080,
    0x0000_0000_0000_800a,
    0x8000_0000_8000_000a,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8080,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8008,
];

/// Rho rotation amounts, in the order lanes are visited by the pi walk.
const RHO: [u32; 24] = [
    1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44,
];

/// Pi lane walk starting from lane 1.
const PI: [usize; 24] = [
    10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1,
];

const STATE_BYTES: usize = 200;
const MAX_RATE: usize = 144;

/// The Keccak-f\[1600\] permutation.
pub(crate) fn keccak_f1600(a: &mut [u64; 25]) {
    for rc in ROUND_CONSTANTS {
        // theta
        let mut c = [0u64; 5];
        for x in 0..5 {
            c[x] = a[x] ^ a[x + 5] ^ a[x + 10] ^ a[x + 15] ^ a[x + 20];
        }
        for x in 0..5 {
            let d = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
            for y in (0..25).step_by(5) {
                a[y + x] ^= d;
            }
        }

        // rho and pi
        let mut carry = a[1];
        for (&lane, &rot) in PI.iter().zip(RHO.iter()) {
            let next = a[lane];
            a[lane] = carry.rotate_left(rot);
            carry = next;
        }

        // chi
        for y in (0..25).step_by(5) {
            let row = [a[y], a[y + 1], a[y + 2], a[y + 3], a[y + 4]];
            for x in 0..5 {
                a[y + x] = row[x] ^ (!row[(x + 1) % 5] & row[(x + 2) % 5]);
            }
        }

        // iota
        a[0] ^= rc;
    }
}

fn xor_block(lanes: &mut [u64; 25], block: &[u8]) {
    for (lane, chunk) in lanes.iter_mut().zip(block.chunks_exact(8)) {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        *lane ^= u64::from_le_bytes(word);
    }
}

/// Output width of a Keccak instance. Fixes the rate/capacity split.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeccakWidth {
    /// 224-bit digest, 1152-bit rate.
    W224,
    /// 256-bit digest, 1088-bit rate.
    W256,
    /// 384-bit digest, 832-bit rate.
    W384,
    /// 512-bit digest, 576-bit rate.
    W512,
}

impl KeccakWidth {
    /// Digest size in bits.
    pub const fn bits(self) -> usize {
        match self {
            KeccakWidth::W224 => 224,
            KeccakWidth::W256 => 256,
            KeccakWidth::W384 => 384,
            KeccakWidth::W512 => 512,
        }
    }

    /// Digest size in bytes.
    pub const fn output_len(self) -> usize {
        self.bits() / 8
    }

    /// Rate in bytes: the state size minus twice the digest size.
    pub const fn rate(self) -> usize {
        STATE_BYTES - 2 * self.output_len()
    }
}

/// Domain separation applied by the final padding block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeccakPadding {
    /// Original Keccak submission padding (`0x01`), as used by Ethereum.
    Keccak,
    /// FIPS 202 SHA-3 padding (`0x06`).
    Sha3,
}

impl KeccakPadding {
    const fn domain_byte(self) -> u8 {
        match self {
            KeccakPadding::Keccak => 0x01,
            KeccakPadding::Sha3 => 0x06,
        }
    }
}

/// Streaming Keccak sponge.
///
/// One instance serves one computation at a time: feed it with
/// [`update`](Self::update), then [`finalize_reset`](Self::finalize_reset)
/// returns the digest and leaves the state ready for the next message.
#[derive(Clone)]
pub struct KeccakState {
    lanes: [u64; 25],
    pending: [u8; MAX_RATE],
    cursor: usize,
    width: KeccakWidth,
    padding: KeccakPadding,
}

impl KeccakState {
    /// Create a zeroed sponge for the given width and padding.
    pub fn new(width: KeccakWidth, padding: KeccakPadding) -> Self {
        Self {
            lanes: [0; 25],
            pending: [0; MAX_RATE],
            cursor: 0,
            width,
            padding,
        }
    }

    /// Configured output width.
    pub fn width(&self) -> KeccakWidth {
        self.width
    }

    /// Configured padding rule.
    pub fn padding(&self) -> KeccakPadding {
        self.padding
    }

    /// Digest size in bytes.
    pub fn output_len(&self) -> usize {
        self.width.output_len()
    }

    /// Absorb `data` into the sponge.
    pub fn update(&mut self, mut data: &[u8]) {
        let rate = self.width.rate();

        if self.cursor > 0 {
            let take = (rate - self.cursor).min(data.len());
            self.pending[self.cursor..self.cursor + take].copy_from_slice(&data[..take]);
            self.cursor += take;
            data = &data[take..];

            if self.cursor < rate {
                return;
            }
            xor_block(&mut self.lanes, &self.pending[..rate]);
            keccak_f1600(&mut self.lanes);
            self.cursor = 0;
        }

        let mut blocks = data.chunks_exact(rate);
        for block in &mut blocks {
            xor_block(&mut self.lanes, block);
            keccak_f1600(&mut self.lanes);
        }

        let tail = blocks.remainder();
        self.pending[..tail.len()].copy_from_slice(tail);
        self.cursor = tail.len();
    }

    /// Pad, absorb the final block and write the digest into `out`, then
    /// reset the sponge.
    ///
    /// `out` receives at most [`output_len`](Self::output_len) bytes.
    pub fn finalize_into_reset(&mut self, out: &mut [u8]) {
        let rate = self.width.rate();
        debug_assert!(out.len() <= self.output_len());

        self.pending[self.cursor..rate].fill(0);
        self.pending[self.cursor] ^= self.padding.domain_byte();
        self.pending[rate - 1] |= 0x80;
        xor_block(&mut self.lanes, &self.pending[..rate]);
        keccak_f1600(&mut self.lanes);

        for (chunk, lane) in out.chunks_mut(8).zip(self.lanes.iter()) {
            chunk.copy_from_slice(&lane.to_le_bytes()[..chunk.len()]);
        }

        self.reset();
    }

    /// Finalize into a freshly allocated digest and reset the sponge.
    pub fn finalize_reset(&mut self) -> Vec<u8> {
        let mut out = vec![0u8; self.output_len()];
        self.finalize_into_reset(&mut out);
        out
    }

    /// Clear state, pending buffer and cursor.
    pub fn reset(&mut self) {
        self.lanes.zeroize();
        self.pending.zeroize();
        self.cursor = 0;
    }
}

impl Drop for KeccakState {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for KeccakState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeccakState")
            .field("width", &self.width)
            .field("padding", &self.padding)
            .finish_non_exhaustive()
    }
}

macro_rules! impl_keccak_digest {
    (
        $name:ident, $width:ident, $padding:ident, $out:ty, $block:ty, $alg:expr
    ) => {
        #[doc = concat!($alg, " hasher.")]
        #[derive(Clone)]
        pub struct $name {
            state: KeccakState,
        }

        impl $name {
            /// Create a new hasher.
            pub fn new() -> Self {
                Self {
                    state: KeccakState::new(KeccakWidth::$width, KeccakPadding::$padding),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl HashMarker for $name {}

        impl OutputSizeUser for $name {
            type OutputSize = $out;
        }

        impl BlockSizeUser for $name {
            type BlockSize = $block;
        }

        impl Update for $name {
            fn update(&mut self, data: &[u8]) {
                self.state.update(data);
            }
        }

        impl FixedOutput for $name {
            fn finalize_into(mut self, out: &mut Output<Self>) {
                self.state.finalize_into_reset(out);
            }
        }

        impl FixedOutputReset for $name {
            fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
                self.state.finalize_into_reset(out);
            }
        }

        impl Reset for $name {
            fn reset(&mut self) {
                self.state.reset();
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!($alg, " { ... }"))
            }
        }
    };
}

impl_keccak_digest!(Sha3_224, W224, Sha3, U28, U144, "SHA3-224");
impl_keccak_digest!(Sha3_256, W256, Sha3, U32, U136, "SHA3-256");
impl_keccak_digest!(Sha3_384, W384, Sha3, U48, U104, "SHA3-384");
impl_keccak_digest!(Sha3_512, W512, Sha3, U64, U72, "SHA3-512");
impl_keccak_digest!(Keccak224, W224, Keccak, U28, U144, "Keccak-224");
impl_keccak_digest!(Keccak256, W256, Keccak, U32, U136, "Keccak-256");
impl_keccak_digest!(Keccak384, W384, Keccak, U48, U104, "Keccak-384");
impl_keccak_digest!(Keccak512, W512, Keccak, U64, U72, "Keccak-512");

// NIST hash algorithm arcs, used in the PKCS#1 v1.5 DigestInfo prefix.
impl AssociatedOid for Sha3_224 {
    const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.7");
}

impl AssociatedOid for Sha3_256 {
    const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.8");
}

impl AssociatedOid for Sha3_384 {
    const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.9");
}

impl AssociatedOid for Sha3_512 {
    const OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.10");
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest::Digest;
    use hex_literal::hex;

    fn oneshot(width: KeccakWidth, padding: KeccakPadding, msg: &[u8]) -> Vec<u8> {
        let mut state = KeccakState::new(width, padding);
        state.update(msg);
        state.finalize_reset()
    }

    #[test]
    fn test_sha3_fips202_empty() {
        use KeccakPadding::Sha3;
        assert_eq!(
            oneshot(KeccakWidth::W224, Sha3, b""),
            hex!("6b4e03423667dbb73b6e15454f0eb1abd4597f9a1b078e3f5b5a6bc7")
        );
        assert_eq!(
            oneshot(KeccakWidth::W256, Sha3, b""),
            hex!("a7ffc6f8bf1ed76651c14756a061d662f580ff4de43b49fa82d80a4b80f8434a")
        );
        assert_eq!(
            oneshot(KeccakWidth::W384, Sha3, b""),
            hex!(
                "0c63a75b845e4f7d01107d852e4c2485c51a50aaaa94fc61995e71bbee983a2a"
                "c3713831264adb47fb6bd1e058d5f004"
            )
        );
        assert_eq!(
            oneshot(KeccakWidth::W512, Sha3, b""),
            hex!(
                "a69f73cca23a9ac5c8b567dc185a756e97c982164fe25859e0d1dcc1475c80a6"
                "15b2123af1f5f94c11e3e9402c3ac558f500199d95b6d3e301758586281dcd26"
            )
        );
    }

    #[test]
    fn test_sha3_fips202_abc() {
        use KeccakPadding::Sha3;
        assert_eq!(
            oneshot(KeccakWidth::W224, Sha3, b"abc"),
            hex!("e642824c3f8cf24ad09234ee7d3c766fc9a3a5168d0c94ad73b46fdf")
        );
        assert_eq!(
            oneshot(KeccakWidth::W256, Sha3, b"abc"),
            hex!("3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532")
        );
        assert_eq!(
            oneshot(KeccakWidth::W384, Sha3, b"abc"),
            hex!(
                "ec01498288516fc926459f58e2c6ad8df9b473cb0fc08c2596da7cf0e49be4b2"
                "98d88cea927ac7f539f1edf228376d25"
            )
        );
        assert_eq!(
            oneshot(KeccakWidth::W512, Sha3, b"abc"),
            hex!(
                "b751850b1a57168a5693cd924b6b096e08f621827444f70d884f5d0240d2712e"
                "10e116e9192af3c91a7ec57647e3934057340b4cf408d5a56592f8274eec53f0"
            )
        );
    }

    #[test]
    fn test_sha3_256_two_blocks() {
        let msg = b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq";
        assert_eq!(
            Sha3_256::digest(msg)[..],
            hex!("41c0dba2a9d6240849100376a8235e2c82e1b9998a999e21db32dd97496d3376")
        );
        assert_eq!(
            Sha3_256::digest([b'a'; 200])[..],
            hex!("cce34485baf2bf2aca99b94833892a4f52896d3d153f7b840cc4f9fe695f1387")
        );
    }

    #[test]
    fn test_keccak_original_padding() {
        use KeccakPadding::Keccak;
        assert_eq!(
            oneshot(KeccakWidth::W224, Keccak, b""),
            hex!("f71837502ba8e10837bdd8d365adb85591895602fc552b48b7390abd")
        );
        assert_eq!(
            oneshot(KeccakWidth::W256, Keccak, b""),
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
        assert_eq!(
            oneshot(KeccakWidth::W256, Keccak, b"abc"),
            hex!("4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45")
        );
        assert_eq!(
            oneshot(KeccakWidth::W384, Keccak, b"abc"),
            hex!(
                "f7df1165f033337be098e7d288ad6a2f74409d7a60b49c36642218de161b1f99"
                "f8c681e4afaf31a34db29fb763e3c28e"
            )
        );
        assert_eq!(
            oneshot(KeccakWidth::W512, Keccak, b""),
            hex!(
                "0eab42de4c3ceb9235fc91acffe746b29c29a8c366b7c60e4e67c466f36a4304"
                "c00fa9caf9d87976ba469bcbe06713b435f091ef2769fb160cdab33d3670680e"
            )
        );
    }

    #[test]
    fn test_chunking_does_not_change_digest() {
        let msg: Vec<u8> = (0..1000u32).map(|i| (i * 7 + 3) as u8).collect();
        for width in [
            KeccakWidth::W224,
            KeccakWidth::W256,
            KeccakWidth::W384,
            KeccakWidth::W512,
        ] {
            let expected = oneshot(width, KeccakPadding::Sha3, &msg);
            for split in [0, 1, width.rate() - 1, width.rate(), width.rate() + 1, 999] {
                let mut state = KeccakState::new(width, KeccakPadding::Sha3);
                state.update(&msg[..split]);
                state.update(&msg[split..]);
                assert_eq!(state.finalize_reset(), expected, "split at {}", split);
            }

            let mut state = KeccakState::new(width, KeccakPadding::Sha3);
            for byte in &msg {
                state.update(core::slice::from_ref(byte));
            }
            assert_eq!(state.finalize_reset(), expected);
        }
    }

    #[test]
    fn test_final_padding_byte_collision() {
        // Message of rate - 1 bytes puts 0x01 and 0x80 in the same byte.
        let width = KeccakWidth::W256;
        let msg = vec![0x5a; width.rate() - 1];
        let mut reference = sha3::Keccak256::default();
        Digest::update(&mut reference, &msg);
        assert_eq!(
            oneshot(width, KeccakPadding::Keccak, &msg),
            reference.finalize().to_vec()
        );
    }

    #[test]
    fn test_reuse_after_finalize() {
        let mut state = KeccakState::new(KeccakWidth::W384, KeccakPadding::Sha3);
        state.update(b"first message");
        let _ = state.finalize_reset();
        state.update(b"abc");
        assert_eq!(
            state.finalize_reset(),
            oneshot(KeccakWidth::W384, KeccakPadding::Sha3, b"abc")
        );

        state.update(b"discarded");
        state.reset();
        assert_eq!(
            state.finalize_reset(),
            oneshot(KeccakWidth::W384, KeccakPadding::Sha3, b"")
        );
    }

    #[test]
    fn test_digest_trait_wrappers() {
        assert_eq!(<Sha3_224 as Digest>::output_size(), 28);
        assert_eq!(<Keccak512 as Digest>::output_size(), 64);

        let mut hasher = Keccak256::new();
        Digest::update(&mut hasher, b"ab");
        Digest::update(&mut hasher, b"c");
        assert_eq!(
            hasher.finalize_reset()[..],
            hex!("4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45")
        );
        assert_eq!(
            hasher.finalize()[..],
            hex!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }
}
