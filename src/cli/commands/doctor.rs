//! Doctor command - verify credentials, configuration and index access.

use crate::cli::Output;
use crate::config::{Settings, API_KEY_ENV};
use crate::vector_store::PineconeClient;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Cineload Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let key_check = check_api_key(std::env::var(API_KEY_ENV).ok().as_deref());
    key_check.print();
    let has_key = key_check.status != CheckStatus::Error;
    checks.push(key_check);
    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = [check_config_file(), check_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    let settings_ok = config_checks[1].status == CheckStatus::Ok;
    checks.extend(config_checks);
    println!();

    println!("{}", style("Index").bold());
    let index_check = if has_key && settings_ok {
        check_index(settings).await
    } else {
        CheckResult::warning(
            &settings.index.name,
            "skipped",
            "Fix the errors above to test index access",
        )
    };
    index_check.print();
    checks.push(index_check);
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before ingesting.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Ready to ingest.");
    }

    Ok(())
}

fn check_api_key(value: Option<&str>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", API_KEY_ENV);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(API_KEY_ENV, "empty", &hint),
        Some(key) if key.chars().count() > 8 => {
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            CheckResult::ok(API_KEY_ENV, &format!("configured (...{})", tail))
        }
        Some(_) => CheckResult::warning(
            API_KEY_ENV,
            "set but looks too short",
            "Copy the key from the Pinecone console",
        ),
        None => CheckResult::error(API_KEY_ENV, "not set", &hint),
    }
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "not found (using defaults)",
            "Run 'cineload config init' to write one",
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Settings",
            &format!(
                "index '{}', namespace '{}', batch size {}",
                settings.index.name, settings.index.namespace, settings.ingest.batch_size
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Run 'cineload config show'"),
    }
}

async fn check_index(settings: &Settings) -> CheckResult {
    let name = settings.index.name.as_str();
    let client = match PineconeClient::from_settings(settings) {
        Ok(client) => client,
        Err(e) => return CheckResult::error(name, &e.to_string(), "Check index settings"),
    };

    match client.describe_index(name).await {
        Ok(description) => {
            let mode = if description.embed.is_some() {
                "integrated embedding"
            } else {
                "no integrated embedding"
            };
            if description.embed.is_some() {
                CheckResult::ok(name, &format!("{} ({})", description.host, mode))
            } else {
                CheckResult::warning(
                    name,
                    &format!("{} ({})", description.host, mode),
                    "Text records need an index created with an embedding model",
                )
            }
        }
        Err(e) => CheckResult::error(
            name,
            &e.to_string(),
            "Check the index name and that the key belongs to its project",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_check() {
        assert_eq!(check_api_key(None).status, CheckStatus::Error);
        assert_eq!(check_api_key(Some("  ")).status, CheckStatus::Error);
        assert_eq!(check_api_key(Some("abc")).status, CheckStatus::Warning);

        let ok = check_api_key(Some("pcsk_0123456789abcd"));
        assert_eq!(ok.status, CheckStatus::Ok);
        assert!(ok.message.ends_with("abcd)"));
    }

    #[test]
    fn test_settings_check() {
        assert_eq!(check_settings(&Settings::default()).status, CheckStatus::Ok);

        let mut settings = Settings::default();
        settings.index.namespace = String::new();
        assert_eq!(check_settings(&settings).status, CheckStatus::Error);
    }
}
