//! Configuration loading and representation.

use anyhow::{Context, bail};

/// Environment variable holding the save attempt limit for version authoring.
pub const MAX_SAVE_ATTEMPTS_VAR: &str = "TEMPORA_MAX_SAVE_ATTEMPTS";

const DEFAULT_MAX_SAVE_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfraConfig {
    /// Total attempts (first try included) for a read-validate-write cycle
    /// that keeps losing optimistic concurrency races.
    pub max_save_attempts: u32,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            max_save_attempts: DEFAULT_MAX_SAVE_ATTEMPTS,
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_SAVE_ATTEMPTS_VAR) {
            let attempts: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_SAVE_ATTEMPTS_VAR} must be a positive integer, got {raw:?}"))?;
            if attempts == 0 {
                bail!("{MAX_SAVE_ATTEMPTS_VAR} must be at least 1");
            }
            config.max_save_attempts = attempts;
        }

        Ok(config)
    }
}
