// hash/fast.rs — 32-bit FNV-1a, the non-cryptographic strategy
//
// Used for out-of-tree pure identities and for re-hashing semantic
// identities. State resets after every digest so one instance can serve
// many modules.

use crate::config::{DigestEncoding, InputEncoding};
use crate::error::IdError;

use super::HashInput;

const FNV_OFFSET: u32 = 2166136261;
const FNV_PRIME: u32 = 16777619;

#[derive(Debug, Clone)]
pub struct FastHash {
    state: u32,
}

impl Default for FastHash {
    fn default() -> Self {
        Self::new()
    }
}

impl FastHash {
    pub fn new() -> Self {
        FastHash { state: FNV_OFFSET }
    }

    pub fn update(
        &mut self,
        data: HashInput<'_>,
        encoding: Option<InputEncoding>,
    ) -> Result<&mut Self, IdError> {
        match (data, encoding) {
            (HashInput::Text(text), None) => self.write(text.as_bytes()),
            (HashInput::Bytes(bytes), _) => self.write(bytes),
            (data, encoding) => {
                let bytes = data.to_bytes(encoding)?;
                self.write(&bytes);
            }
        }
        Ok(self)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u32;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn finish(&mut self) -> u32 {
        std::mem::replace(&mut self.state, FNV_OFFSET)
    }

    /// Big-endian digest bytes in `encoding`; resets the state.
    pub fn digest(&mut self, encoding: DigestEncoding) -> String {
        encoding.encode(&self.finish().to_be_bytes())
    }
}

/// One-shot digest of `text`.
pub fn fast_digest(text: &str, encoding: DigestEncoding) -> String {
    let mut h = FastHash::new();
    h.write(text.as_bytes());
    h.digest(encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_vectors() {
        let mut h = FastHash::new();
        assert_eq!(h.finish(), 0x811c9dc5);
        h.write(b"a");
        assert_eq!(h.finish(), 0xe40c292c);
        h.write(b"foobar");
        assert_eq!(h.finish(), 0xbf9cf968);
    }

    #[test]
    fn digest_resets_state() {
        let mut h = FastHash::new();
        h.update(HashInput::Text("a"), None).unwrap();
        let first = h.digest(DigestEncoding::Hex);
        h.update(HashInput::Text("a"), None).unwrap();
        assert_eq!(h.digest(DigestEncoding::Hex), first);
        assert_eq!(first, "e40c292c");
    }

    #[test]
    fn encodings() {
        assert_eq!(fast_digest("a", DigestEncoding::Hex), "e40c292c");
        assert_eq!(fast_digest("a", DigestEncoding::Base64), "5AwpLA==");
        assert_eq!(fast_digest("a", DigestEncoding::Base64url), "5AwpLA");
    }

    #[test]
    fn tagged_input_hashes_decoded_bytes() {
        let mut h = FastHash::new();
        h.update(HashInput::Text("61"), Some(InputEncoding::Hex))
            .unwrap();
        assert_eq!(h.digest(DigestEncoding::Hex), "e40c292c");
    }
}
