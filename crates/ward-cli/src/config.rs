//! TOML configuration for the `ward` command.
//!
//! Every section is optional; missing keys fall back to their defaults.
//! Command-line flags override file values after loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;
use ward_ledger::{LedgerConfig, RollbackPolicy};
use ward_log::ReplayOptions;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Where the ledger lives.
    pub ledger: LedgerSection,
    /// Replay behaviour.
    pub replay: ReplaySection,
    /// Rollback behaviour.
    pub rollback: RollbackSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[ledger]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    /// Directory holding the snapshot, `log/` and `archive/`.
    pub data_dir: PathBuf,
    /// Backend type: `"file"` (default) or `"memory"`.
    pub backend: String,
}

impl Default for LedgerSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".ward"))
            .unwrap_or_else(|| PathBuf::from(".ward"));
        Self {
            data_dir,
            backend: "file".to_string(),
        }
    }
}

/// `[replay]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplaySection {
    /// Fail verification when an update names a record that does not exist,
    /// instead of inserting it.
    pub strict_updates: bool,
}

/// `[rollback]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RollbackSection {
    /// `"abandon"` (default) leaves undone entries in the log, `"archive"`
    /// moves them to `archive/`.
    pub policy: RollbackPolicy,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("cannot read {}", p.display()))?;
                let config: CliConfig = toml::from_str(&content)
                    .with_context(|| format!("invalid config {}", p.display()))?;
                config.validate()?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let config: CliConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the ledger should live in memory only.
    pub fn is_memory(&self) -> bool {
        self.ledger.backend == "memory"
    }

    /// Ledger settings derived from the `[replay]` and `[rollback]` sections.
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            replay: ReplayOptions {
                strict_updates: self.replay.strict_updates,
            },
            rollback_policy: self.rollback.policy,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self.ledger.backend.as_str() {
            "file" | "memory" => Ok(()),
            other => bail!("unknown ledger backend {other:?} (expected \"file\" or \"memory\")"),
        }
    }
}
