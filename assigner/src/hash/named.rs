// hash/named.rs — Semantic path identity strategy
//
// `update` derives a canonical identity from a path; `digest` returns it
// verbatim. Out-of-tree paths digest to the fast hash of their pure
// identity. Inputs that are not paths fall through to a SHA-256 bulk hash.

use crate::config::{DigestEncoding, InputEncoding};
use crate::error::IdError;
use crate::identity::{Identity, IdentityDeriver};

use super::crypto::CryptoAlgorithm;
use super::fast::fast_digest;
use super::{BulkUpdate, HashInput};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Verbatim {
        identity: String,
        fallback: Option<String>,
    },
    Pure(String),
}

pub struct NamedHash<'a> {
    deriver: &'a IdentityDeriver,
    pending: Option<Pending>,
    bulk: BulkUpdate,
}

impl<'a> NamedHash<'a> {
    pub fn new(deriver: &'a IdentityDeriver) -> Self {
        NamedHash {
            deriver,
            pending: None,
            bulk: BulkUpdate::new(CryptoAlgorithm::Sha256.primitive()),
        }
    }

    pub fn update(
        &mut self,
        data: HashInput<'_>,
        encoding: Option<InputEncoding>,
    ) -> Result<&mut Self, IdError> {
        let text = match (data, encoding) {
            (HashInput::Text(text), None | Some(InputEncoding::Utf8)) => text,
            (data, encoding) => {
                self.bulk.update(data, encoding)?;
                return Ok(self);
            }
        };
        match self.deriver.derive(text)? {
            Identity::Global(identity) => {
                self.pending = Some(Pending::Verbatim {
                    identity,
                    fallback: None,
                });
            }
            Identity::Project {
                identity, fallback, ..
            } => {
                self.pending = Some(Pending::Verbatim { identity, fallback });
            }
            Identity::OutOfTree { pure } => {
                self.pending = Some(Pending::Pure(pure));
            }
            Identity::Opaque => {
                self.bulk.update(data, encoding)?;
            }
        }
        Ok(self)
    }

    pub fn pure_identity(&self) -> Option<&str> {
        match &self.pending {
            Some(Pending::Pure(pure)) => Some(pure),
            _ => None,
        }
    }

    /// A distinct, unrewritten identity for a dependency module whose
    /// canonical identity may be shared with another install.
    pub fn fallback_identity(&self) -> Option<&str> {
        match &self.pending {
            Some(Pending::Verbatim { fallback, .. }) => fallback.as_deref(),
            _ => None,
        }
    }

    pub fn digest(self, encoding: DigestEncoding) -> String {
        match self.pending {
            Some(Pending::Verbatim { identity, .. }) => identity,
            Some(Pending::Pure(pure)) => fast_digest(&pure, encoding),
            None => self.bulk.digest(encoding),
        }
    }
}
