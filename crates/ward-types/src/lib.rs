//! Shared types for the ward patient ledger.
//!
//! This crate defines the record model used across the workspace:
//! the patient record ([`PatientData`]), partial updates ([`PatientPatch`]),
//! the SHA-256 state hash ([`Fingerprint`]), and the line-oriented text
//! encoding of records shared by log entries and tree snapshots ([`line`]).

mod error;
pub mod line;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use error::ParseError;

/// Unique, totally ordered key of a patient record.
pub type PatientId = i64;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A single patient record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatientData {
    /// Unique key. Never changes once the record is in a tree.
    pub id: PatientId,
    /// Display name. May be empty.
    pub name: String,
    /// Whether the patient has been cured.
    pub cured: bool,
    /// Diagnosed diseases, in the order they were recorded.
    pub diseases: Vec<String>,
}

impl PatientData {
    /// Build a record from its four fields.
    pub fn new(
        id: PatientId,
        name: impl Into<String>,
        cured: bool,
        diseases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            cured,
            diseases: diseases.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether any disease is empty text.
    ///
    /// An empty disease has no initial and no line encoding of its own, so
    /// records carrying one cannot be logged faithfully.
    pub fn has_empty_disease(&self) -> bool {
        self.diseases.iter().any(String::is_empty)
    }

    /// Overwrite the fields present in `patch`, leaving the others (and the id) alone.
    pub fn apply(&mut self, patch: &PatientPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(cured) = patch.cured {
            self.cured = cured;
        }
        if let Some(diseases) = &patch.diseases {
            self.diseases.clone_from(diseases);
        }
    }
}

impl fmt::Display for PatientData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Name: {} | Cured: {} | Diseases: {}",
            self.id,
            self.name,
            self.cured,
            self.diseases.join(", ")
        )
    }
}

/// A partial update: `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub cured: Option<bool>,
    pub diseases: Option<Vec<String>>,
}

impl PatientPatch {
    /// Patch that replaces every mutable field with the values in `record`.
    pub fn replace_with(record: &PatientData) -> Self {
        Self {
            name: Some(record.name.clone()),
            cured: Some(record.cured),
            diseases: Some(record.diseases.clone()),
        }
    }

    /// Whether the patch sets a disease list holding empty text.
    pub fn has_empty_disease(&self) -> bool {
        self.diseases
            .as_ref()
            .is_some_and(|d| d.iter().any(String::is_empty))
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.cured.is_none() && self.diseases.is_none()
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// SHA-256 hash of a tree's level-order code sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hash arbitrary data with SHA-256.
    pub fn from_data(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Return the raw 32-byte representation.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase 64-character hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Fingerprint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| ParseError::InvalidFingerprint(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
