//! Pre-flight checks before contacting the index.
//!
//! Validates configuration and credentials up front so a run does not fail
//! after the input has already been read and batched.

use crate::config::Settings;
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Uploading needs valid settings and, unless dry-running, an API key.
    Ingest { dry_run: bool },
    /// Search and stats need an API key.
    Query,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    settings.validate()?;
    match operation {
        Operation::Ingest { dry_run: true } => {}
        Operation::Ingest { dry_run: false } | Operation::Query => {
            Settings::api_key()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_skips_api_key() {
        assert!(check(Operation::Ingest { dry_run: true }, &Settings::default()).is_ok());
    }

    #[test]
    fn test_invalid_settings_fail_first() {
        let mut settings = Settings::default();
        settings.ingest.batch_size = 0;
        assert!(check(Operation::Ingest { dry_run: true }, &settings).is_err());
    }
}
