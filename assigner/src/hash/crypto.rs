// hash/crypto.rs — Named digest primitives (MD4, MD5, SHA-1, SHA-2, BLAKE2)

use sha2::Digest;

use crate::config::DigestEncoding;

use super::{HashPrimitive, RawDigest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoAlgorithm {
    Md4,
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_224,
    Sha512_256,
    Blake2b512,
    Blake2s256,
}

impl CryptoAlgorithm {
    /// Expects a lower-cased name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "md4" => CryptoAlgorithm::Md4,
            "md5" => CryptoAlgorithm::Md5,
            "sha1" => CryptoAlgorithm::Sha1,
            "sha224" => CryptoAlgorithm::Sha224,
            "sha256" => CryptoAlgorithm::Sha256,
            "sha384" => CryptoAlgorithm::Sha384,
            "sha512" => CryptoAlgorithm::Sha512,
            "sha512-224" => CryptoAlgorithm::Sha512_224,
            "sha512-256" => CryptoAlgorithm::Sha512_256,
            "blake2b512" => CryptoAlgorithm::Blake2b512,
            "blake2s256" => CryptoAlgorithm::Blake2s256,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            CryptoAlgorithm::Md4 => "md4",
            CryptoAlgorithm::Md5 => "md5",
            CryptoAlgorithm::Sha1 => "sha1",
            CryptoAlgorithm::Sha224 => "sha224",
            CryptoAlgorithm::Sha256 => "sha256",
            CryptoAlgorithm::Sha384 => "sha384",
            CryptoAlgorithm::Sha512 => "sha512",
            CryptoAlgorithm::Sha512_224 => "sha512-224",
            CryptoAlgorithm::Sha512_256 => "sha512-256",
            CryptoAlgorithm::Blake2b512 => "blake2b512",
            CryptoAlgorithm::Blake2s256 => "blake2s256",
        }
    }

    pub fn primitive(self) -> Box<dyn HashPrimitive> {
        match self {
            CryptoAlgorithm::Md4 => Box::new(DigestPrimitive(md4::Md4::new())),
            CryptoAlgorithm::Md5 => Box::new(DigestPrimitive(md5::Md5::new())),
            CryptoAlgorithm::Sha1 => Box::new(DigestPrimitive(sha1::Sha1::new())),
            CryptoAlgorithm::Sha224 => Box::new(DigestPrimitive(sha2::Sha224::new())),
            CryptoAlgorithm::Sha256 => Box::new(DigestPrimitive(sha2::Sha256::new())),
            CryptoAlgorithm::Sha384 => Box::new(DigestPrimitive(sha2::Sha384::new())),
            CryptoAlgorithm::Sha512 => Box::new(DigestPrimitive(sha2::Sha512::new())),
            CryptoAlgorithm::Sha512_224 => Box::new(DigestPrimitive(sha2::Sha512_224::new())),
            CryptoAlgorithm::Sha512_256 => Box::new(DigestPrimitive(sha2::Sha512_256::new())),
            CryptoAlgorithm::Blake2b512 => Box::new(DigestPrimitive(blake2::Blake2b512::new())),
            CryptoAlgorithm::Blake2s256 => Box::new(DigestPrimitive(blake2::Blake2s256::new())),
        }
    }
}

/// Any RustCrypto digest as a `HashPrimitive`.
struct DigestPrimitive<D>(D);

impl<D: Digest + Default> HashPrimitive for DigestPrimitive<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn digest(&mut self, encoding: DigestEncoding) -> RawDigest {
        let out = std::mem::take(&mut self.0).finalize();
        RawDigest::Text(encoding.encode(&out))
    }
}
