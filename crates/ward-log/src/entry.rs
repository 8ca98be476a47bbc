//! Log entry types and their text encoding.

use std::fmt;
use std::str::FromStr;

use ward_types::{Fingerprint, PatientData, PatientId, line};

use crate::error::EntryParseError;
use crate::key::EntryKey;

/// Prefix of the last line of every entry.
const HASH_PREFIX: &str = "hash: ";

/// The kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Update,
    Remove,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = EntryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "update" => Ok(Self::Update),
            "remove" => Ok(Self::Remove),
            other => Err(EntryParseError::UnknownOperation(other.to_string())),
        }
    }
}

/// A single mutation of the patient tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A new record was inserted.
    Add { record: PatientData },
    /// An existing record was overwritten in place.
    Update {
        /// The record before the change.
        prior: PatientData,
        /// The record after the change.
        record: PatientData,
    },
    /// A record was deleted.
    Remove { prior: PatientData },
}

impl Mutation {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Add { .. } => Operation::Add,
            Self::Update { .. } => Operation::Update,
            Self::Remove { .. } => Operation::Remove,
        }
    }

    /// Id of the record the mutation touches.
    pub fn id(&self) -> PatientId {
        match self {
            Self::Add { record } | Self::Update { record, .. } => record.id,
            Self::Remove { prior } => prior.id,
        }
    }

    /// The record as it was before the mutation, if it existed.
    pub fn prior(&self) -> Option<&PatientData> {
        match self {
            Self::Add { .. } => None,
            Self::Update { prior, .. } | Self::Remove { prior } => Some(prior),
        }
    }

    /// The record as it is after the mutation, if it still exists.
    pub fn resulting(&self) -> Option<&PatientData> {
        match self {
            Self::Add { record } | Self::Update { record, .. } => Some(record),
            Self::Remove { .. } => None,
        }
    }
}

/// One immutable entry of the mutation log.
///
/// `hash` is the fingerprint of the whole tree after `mutation` was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationEntry {
    pub key: EntryKey,
    pub mutation: Mutation,
    pub hash: Fingerprint,
}

impl MutationEntry {
    /// Render the entry body: operation, data lines, then `hash: <hex>`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(self.mutation.operation().as_str());
        out.push('\n');
        match &self.mutation {
            Mutation::Add { record } => {
                out.push_str(&line::encode(record));
                out.push('\n');
            }
            Mutation::Update { prior, record } => {
                out.push_str(&line::encode(prior));
                out.push('\n');
                out.push_str(&line::encode(record));
                out.push('\n');
            }
            Mutation::Remove { prior } => {
                out.push_str(&line::encode(prior));
                out.push('\n');
            }
        }
        out.push_str(HASH_PREFIX);
        out.push_str(&self.hash.to_hex());
        out
    }

    /// Parse an entry body stored under `key`.
    pub fn parse(key: EntryKey, text: &str) -> Result<Self, EntryParseError> {
        let mut lines = text.lines();

        let op_line = lines.next().ok_or(EntryParseError::Empty)?;
        let operation: Operation = op_line.trim().parse()?;

        let mut record_line = |what: &'static str| -> Result<PatientData, EntryParseError> {
            let raw = lines.next().ok_or(EntryParseError::MissingLine(what))?;
            Ok(line::decode(raw)?)
        };

        let mutation = match operation {
            Operation::Add => Mutation::Add {
                record: record_line("record")?,
            },
            Operation::Update => {
                let prior = record_line("prior record")?;
                let record = record_line("record")?;
                Mutation::Update { prior, record }
            }
            Operation::Remove => Mutation::Remove {
                prior: record_line("record")?,
            },
        };

        let hash_line = lines.next().ok_or(EntryParseError::MissingLine("hash"))?;
        let hex = hash_line
            .strip_prefix(HASH_PREFIX)
            .ok_or_else(|| EntryParseError::HashLine(hash_line.to_string()))?;
        let hash: Fingerprint = hex.trim().parse().map_err(EntryParseError::Hash)?;

        if lines.any(|l| !l.trim().is_empty()) {
            return Err(EntryParseError::TrailingText);
        }

        Ok(Self {
            key,
            mutation,
            hash,
        })
    }
}
