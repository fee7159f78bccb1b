// hash/bulk.rs — Buffering adapter over an incremental hash primitive
//
// Short untagged text updates are concatenated and forwarded in chunks of
// more than BULK_SIZE bytes. Tagged, binary or oversized updates flush the
// buffer first and then go straight to the primitive, so the byte stream the
// primitive sees is identical to unbuffered use.

use tracing::trace;

use crate::config::{DigestEncoding, InputEncoding};
use crate::error::IdError;

use super::{HashInput, HashPrimitive, RawDigest};

/// Buffering threshold, in bytes of UTF-8 text.
pub const BULK_SIZE: usize = 1000;

pub struct BulkUpdate {
    hash: Box<dyn HashPrimitive>,
    buffer: String,
}

impl BulkUpdate {
    pub fn new(hash: Box<dyn HashPrimitive>) -> Self {
        BulkUpdate {
            hash,
            buffer: String::new(),
        }
    }

    pub fn update(
        &mut self,
        data: HashInput<'_>,
        encoding: Option<InputEncoding>,
    ) -> Result<&mut Self, IdError> {
        match (data, encoding) {
            (HashInput::Text(text), None) if text.len() <= BULK_SIZE => {
                self.buffer.push_str(text);
                if self.buffer.len() > BULK_SIZE {
                    self.flush();
                }
            }
            (data, encoding) => {
                let bytes = data.to_bytes(encoding)?;
                self.flush();
                self.hash.update(&bytes);
            }
        }
        Ok(self)
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            trace!(bytes = self.buffer.len(), "flushing hash buffer");
            self.hash.update(self.buffer.as_bytes());
            self.buffer.clear();
        }
    }

    /// Flush, digest, and coerce a byte digest to text.
    pub fn digest(mut self, encoding: DigestEncoding) -> String {
        self.flush();
        match self.hash.digest(encoding) {
            RawDigest::Text(text) => text,
            RawDigest::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Bytes waiting to be forwarded.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
