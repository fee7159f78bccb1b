// config.rs — Option surface for module id assignment
//
// `IdOptions` mirrors the plugin option names (camelCase in JSON) and is the
// only serialisable part of the configuration. Callbacks and custom hash
// constructors are attached to the plugin through builder methods instead.
//
// Preconditions: none.
// Postconditions: `validate` succeeds only for options a run can start with.
// Failure modes: `ConfigError` for any invalid option shape.
// Side effects: `load` reads one file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, IdError};
use crate::hash::Algorithm;

pub const DEFAULT_HASH_FUNCTION: &str = "md4";
pub const DEFAULT_DIGEST_LENGTH: usize = 4;

// ── Encodings ───────────────────────────────────────────────────────────────

/// Text encoding requested from a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestEncoding {
    Hex,
    #[default]
    Base64,
    /// URL-safe alphabet, no padding.
    Base64url,
}

impl DigestEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            DigestEncoding::Hex => hex::encode(bytes),
            DigestEncoding::Base64 => STANDARD.encode(bytes),
            DigestEncoding::Base64url => URL_SAFE_NO_PAD.encode(bytes),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DigestEncoding::Hex => "hex",
            DigestEncoding::Base64 => "base64",
            DigestEncoding::Base64url => "base64url",
        }
    }
}

impl FromStr for DigestEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(DigestEncoding::Hex),
            "base64" => Ok(DigestEncoding::Base64),
            "base64url" => Ok(DigestEncoding::Base64url),
            _ => Err(ConfigError::UnknownDigestEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for DigestEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding tag attached to a text update. Tagged updates bypass buffering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    Utf8,
    Hex,
    Base64,
    /// One byte per char, high bits dropped.
    Latin1,
}

impl InputEncoding {
    /// Decode `text` into the bytes it denotes.
    pub fn decode(self, text: &str) -> Result<Vec<u8>, IdError> {
        match self {
            InputEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            InputEncoding::Hex => hex::decode(text).map_err(|e| IdError::InvalidInput {
                encoding: "hex",
                message: e.to_string(),
            }),
            InputEncoding::Base64 => STANDARD.decode(text).map_err(|e| IdError::InvalidInput {
                encoding: "base64",
                message: e.to_string(),
            }),
            InputEncoding::Latin1 => Ok(text.chars().map(|c| (c as u32 & 0xff) as u8).collect()),
        }
    }
}

impl FromStr for InputEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(InputEncoding::Utf8),
            "hex" => Ok(InputEncoding::Hex),
            "base64" => Ok(InputEncoding::Base64),
            "latin1" | "binary" => Ok(InputEncoding::Latin1),
            _ => Err(ConfigError::UnknownInputEncoding(s.to_string())),
        }
    }
}

// ── Options ─────────────────────────────────────────────────────────────────

/// Recognised options. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct IdOptions {
    /// Overrides the project root used for relative-path derivation.
    pub context: Option<PathBuf>,
    /// Built-in algorithm name (`named`, `debug`, `fast`, or a digest name).
    pub hash_function: String,
    pub hash_digest: DigestEncoding,
    /// Initial truncation length before collision-driven growth.
    pub hash_digest_length: usize,
    /// Dependency names exempt from version blurring (substring match).
    #[serde(alias = "enforeModules")]
    pub enforce_modules: Vec<String>,
    /// Re-hash semantic identities into opaque digests.
    pub named_to_hash: bool,
    /// Prefix in-project identities with the root package name.
    pub add_source_prefix: bool,
    /// Overrides the detected global install directory.
    pub global_dir: Option<PathBuf>,
}

impl Default for IdOptions {
    fn default() -> Self {
        IdOptions {
            context: None,
            hash_function: DEFAULT_HASH_FUNCTION.to_string(),
            hash_digest: DigestEncoding::default(),
            hash_digest_length: DEFAULT_DIGEST_LENGTH,
            enforce_modules: Vec::new(),
            named_to_hash: false,
            add_source_prefix: false,
            global_dir: None,
        }
    }
}

impl IdOptions {
    /// Parse options from a JSON document.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load options from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Check the option shape and resolve the hash algorithm selector.
    pub fn validate(&self) -> Result<Algorithm, ConfigError> {
        if self.hash_digest_length == 0 {
            return Err(ConfigError::ZeroDigestLength);
        }
        if self.enforce_modules.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::EmptyEnforcedModule);
        }
        Algorithm::from_name(&self.hash_function)
    }
}
