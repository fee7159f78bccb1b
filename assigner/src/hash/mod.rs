// hash/mod.rs — Hash strategy registry
//
// A closed set of strategies sharing the capability set {update, digest}:
//
//   Bulk   buffered adapter over an incremental primitive (digests, custom)
//   Debug  human-readable, hex-escapes non-alphanumeric runs
//   Fast   32-bit FNV-1a, reusable across modules
//   Named  semantic path identity; the "digest" is the canonical identity
//
// The selector is resolved to an `Algorithm` when options are validated.
//
// Preconditions: a `Named` strategy needs an `IdentityDeriver`.
// Postconditions: `digest` consumes the strategy (digest primitives are one-shot).
// Failure modes: `ConfigError::UnknownAlgorithm` for unsupported names;
//                update errors from input decoding or identity derivation.
// Side effects: `Named` updates may read package manifests.

pub mod bulk;
pub mod crypto;
pub mod debug;
pub mod fast;
pub mod named;

use std::fmt;
use std::sync::Arc;

use crate::config::{DigestEncoding, InputEncoding};
use crate::error::{ConfigError, IdError};
use crate::identity::IdentityDeriver;

pub use bulk::{BulkUpdate, BULK_SIZE};
pub use crypto::CryptoAlgorithm;
pub use debug::DebugHash;
pub use fast::FastHash;
pub use named::NamedHash;

// ── Primitive capability ────────────────────────────────────────────────────

/// Data handed to `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashInput<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> HashInput<'a> {
    /// Bytes this input denotes under `encoding`. Byte input ignores the tag.
    pub fn to_bytes(self, encoding: Option<InputEncoding>) -> Result<Vec<u8>, IdError> {
        match (self, encoding) {
            (HashInput::Text(text), Some(enc)) => enc.decode(text),
            (HashInput::Text(text), None) => Ok(text.as_bytes().to_vec()),
            (HashInput::Bytes(bytes), _) => Ok(bytes.to_vec()),
        }
    }
}

/// What an incremental primitive returns from `digest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDigest {
    Text(String),
    Bytes(Vec<u8>),
}

/// An incremental hash the bulk adapter can drive.
pub trait HashPrimitive {
    fn update(&mut self, data: &[u8]);
    fn digest(&mut self, encoding: DigestEncoding) -> RawDigest;
}

/// Zero-argument constructor for a custom primitive.
pub type HashConstructor = Arc<dyn Fn() -> Box<dyn HashPrimitive> + Send + Sync>;

// ── Algorithm selector ──────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Algorithm {
    Debug,
    Fast,
    Named,
    Crypto(CryptoAlgorithm),
    Custom(HashConstructor),
}

impl Algorithm {
    /// Resolve a built-in name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let lower = name.trim().to_ascii_lowercase();
        match lower.as_str() {
            "" => Err(ConfigError::EmptyHashFunction),
            "debug" => Ok(Algorithm::Debug),
            "fast" | "fnv1a32" => Ok(Algorithm::Fast),
            "named" => Ok(Algorithm::Named),
            _ => CryptoAlgorithm::from_name(&lower)
                .map(Algorithm::Crypto)
                .ok_or_else(|| ConfigError::UnknownAlgorithm(name.to_string())),
        }
    }

    pub fn custom<F>(constructor: F) -> Self
    where
        F: Fn() -> Box<dyn HashPrimitive> + Send + Sync + 'static,
    {
        Algorithm::Custom(Arc::new(constructor))
    }

    /// Whether the strategy produces semantic identities rather than digests.
    pub fn is_semantic(&self) -> bool {
        matches!(self, Algorithm::Named)
    }
}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Debug => f.write_str("Debug"),
            Algorithm::Fast => f.write_str("Fast"),
            Algorithm::Named => f.write_str("Named"),
            Algorithm::Crypto(c) => write!(f, "Crypto({})", c.name()),
            Algorithm::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ── Strategy ────────────────────────────────────────────────────────────────

pub enum HashStrategy<'a> {
    Bulk(BulkUpdate),
    Debug(DebugHash),
    Fast(FastHash),
    Named(NamedHash<'a>),
}

impl<'a> HashStrategy<'a> {
    pub fn update(
        &mut self,
        data: HashInput<'_>,
        encoding: Option<InputEncoding>,
    ) -> Result<&mut Self, IdError> {
        match self {
            HashStrategy::Bulk(h) => {
                h.update(data, encoding)?;
            }
            HashStrategy::Debug(h) => {
                h.update(data);
            }
            HashStrategy::Fast(h) => {
                h.update(data, encoding)?;
            }
            HashStrategy::Named(h) => {
                h.update(data, encoding)?;
            }
        }
        Ok(self)
    }

    pub fn update_str(&mut self, text: &str) -> Result<&mut Self, IdError> {
        self.update(HashInput::Text(text), None)
    }

    pub fn digest(self, encoding: DigestEncoding) -> String {
        match self {
            HashStrategy::Bulk(h) => h.digest(encoding),
            HashStrategy::Debug(h) => h.digest(),
            HashStrategy::Fast(mut h) => h.digest(encoding),
            HashStrategy::Named(h) => h.digest(encoding),
        }
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, HashStrategy::Named(_))
    }

    /// Unrewritten identity of a dependency module, if the last update
    /// produced one.
    pub fn fallback_identity(&self) -> Option<&str> {
        match self {
            HashStrategy::Named(h) => h.fallback_identity(),
            _ => None,
        }
    }

    /// The wildcard-collapsed identity of an out-of-tree module, if the last
    /// update produced one.
    pub fn pure_identity(&self) -> Option<&str> {
        match self {
            HashStrategy::Named(h) => h.pure_identity(),
            _ => None,
        }
    }
}

/// Construct a fresh strategy for `algorithm`. Custom constructors and
/// digest names are always wrapped in the bulk adapter.
pub fn create_hash<'a>(algorithm: &Algorithm, deriver: &'a IdentityDeriver) -> HashStrategy<'a> {
    match algorithm {
        Algorithm::Debug => HashStrategy::Debug(DebugHash::new()),
        Algorithm::Fast => HashStrategy::Fast(FastHash::new()),
        Algorithm::Named => HashStrategy::Named(NamedHash::new(deriver)),
        Algorithm::Crypto(c) => HashStrategy::Bulk(BulkUpdate::new(c.primitive())),
        Algorithm::Custom(ctor) => HashStrategy::Bulk(BulkUpdate::new(ctor())),
    }
}
