//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::commands::seen::read_seen_ids;
use crate::config::{AppConfig, load_chat_target, load_secret};

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    credentials: CheckResult,
    source: CheckResult,
    state: CheckResult,
    overall: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Ok,
    Warn,
    Error,
}

impl Status {
    fn symbol(self) -> &'static str {
        match self {
            Status::Ok => "✓",
            Status::Warn => "⚠",
            Status::Error => "✗",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Error => "ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: Status,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    fn ok(message: impl Into<String>) -> Self {
        Self::new(Status::Ok, message)
    }

    fn warn(message: impl Into<String>) -> Self {
        Self::new(Status::Warn, message)
    }

    fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, message)
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        credentials: CheckResult::error("Not checked"),
        source: CheckResult::error("Not checked"),
        state: CheckResult::error("Not checked"),
        overall: Status::Error,
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.credentials = check_credentials(config);
        report.source = check_source(config);
        report.state = check_state(config).await;
    }

    // Worst individual status wins
    report.overall = [
        &report.config,
        &report.credentials,
        &report.source,
        &report.state,
    ]
    .iter()
    .map(|check| check.status)
    .max()
    .unwrap_or(Status::Error);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == Status::Error {
        std::process::exit(1);
    }

    Ok(())
}

fn check_credentials(config: &AppConfig) -> CheckResult {
    let telegram = &config.telegram;

    // Values are only checked for presence; the token itself is never printed
    if let Err(e) = load_secret(&telegram.bot_token_env, "bot token") {
        return CheckResult::error(format!("{:#}", e));
    }

    match load_chat_target(&telegram.chat_id_env) {
        Ok(chat) => CheckResult::ok(format!(
            "Bot token: {} (set), Chat: {}",
            telegram.bot_token_env, chat
        )),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn check_source(config: &AppConfig) -> CheckResult {
    let source = &config.source;

    if !source.base_url.starts_with("http://") && !source.base_url.starts_with("https://") {
        return CheckResult::error(format!("Invalid listing base_url: {}", source.base_url));
    }

    if source.take == 0 {
        return CheckResult::warn("take = 0 requests no listings");
    }

    CheckResult::ok(format!(
        "Listings: {} (take {}, timeout {}s)",
        source.base_url, source.take, source.timeout_secs
    ))
}

async fn check_state(config: &AppConfig) -> CheckResult {
    let path = &config.general.state_path;
    let backend = config.general.state_backend;

    if !path.exists() {
        return CheckResult::warn(format!(
            "Seen-set {} does not exist yet and will be created on first run",
            path.display()
        ));
    }

    match read_seen_ids(config).await {
        Ok(ids) => CheckResult::ok(format!(
            "Seen-set {}: {} listings recorded",
            path.display(),
            ids.len()
        ))
        .with_details(serde_json::json!({
            "backend": backend,
            "path": path,
            "count": ids.len(),
        })),
        Err(e) => CheckResult::error(format!("Seen-set {}: {}", path.display(), e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("room-watch Doctor Report");
    println!("========================");
    println!();

    print_check("Config", &report.config);
    print_check("Credentials", &report.credentials);
    print_check("Listing source", &report.source);
    print_check("Seen-set", &report.state);

    println!();
    println!(
        "{} Overall: {}",
        report.overall.symbol(),
        report.overall.label()
    );

    if report.overall == Status::Ok {
        println!();
        println!("Ready to run! Try: room-watch run --dry-run --once");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    println!("{} {}: {}", result.status.symbol(), name, result.message);
}
