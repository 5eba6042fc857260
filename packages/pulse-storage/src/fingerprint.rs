//! Content fingerprints (Blake3)
//!
//! A process run is identified by the hash of everything that can change its
//! output: the dataset, the process id, its identity-relevant configuration,
//! the effective `fast` flag and the fingerprints of its dependencies'
//! results. Each section is tagged and length-prefixed so that distinct
//! inputs can never serialize to the same byte stream.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Blake3 content hash
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct Fingerprint(pub blake3::Hash);

impl Fingerprint {
    pub fn compute(content: &[u8]) -> Self {
        Self(blake3::hash(content))
    }

    /// Fingerprint of an ordered list of texts
    pub fn of_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(texts.len() as u64).to_le_bytes());
        for text in texts {
            let bytes = text.as_ref().as_bytes();
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        }
        Self(hasher.finalize())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    pub fn from_hex(hex: &str) -> Result<Self, blake3::HexError> {
        Ok(Self(blake3::Hash::from_hex(hex)?))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// First 12 hex chars, for logs
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(12);
        hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Blake3Hash has no serde support; stored as hex.
impl Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Incremental fingerprint of one process run.
///
/// Dependencies may be added in any order; they are hashed sorted by id.
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    dataset: Option<Fingerprint>,
    process_id: String,
    config: Vec<u8>,
    fast: bool,
    dependencies: BTreeMap<String, Fingerprint>,
}

impl FingerprintBuilder {
    pub fn new(process_id: impl Into<String>) -> Self {
        Self {
            dataset: None,
            process_id: process_id.into(),
            config: Vec::new(),
            fast: false,
            dependencies: BTreeMap::new(),
        }
    }

    pub fn dataset(mut self, dataset: Fingerprint) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Identity-relevant configuration.
    ///
    /// `serde_json::Value` objects keep keys sorted, so the encoding is
    /// canonical regardless of field declaration order.
    pub fn config(mut self, config: &serde_json::Value) -> serde_json::Result<Self> {
        self.config = serde_json::to_vec(config)?;
        Ok(self)
    }

    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn dependency(mut self, id: impl Into<String>, result: Fingerprint) -> Self {
        self.dependencies.insert(id.into(), result);
        self
    }

    pub fn finish(&self) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();

        let dataset: &[u8] = match &self.dataset {
            Some(dataset) => dataset.as_bytes(),
            None => &[],
        };
        write_section(&mut hasher, b"dataset", dataset);
        write_section(&mut hasher, b"process", self.process_id.as_bytes());
        write_section(&mut hasher, b"config", &self.config);
        write_section(&mut hasher, b"fast", &[self.fast as u8]);

        hasher.update(&(self.dependencies.len() as u64).to_le_bytes());
        for (id, dep) in &self.dependencies {
            write_section(&mut hasher, b"dep", id.as_bytes());
            hasher.update(dep.as_bytes());
        }

        Fingerprint(hasher.finalize())
    }
}

fn write_section(hasher: &mut blake3::Hasher, tag: &[u8], bytes: &[u8]) {
    hasher.update(tag);
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
