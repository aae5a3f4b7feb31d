//! Subcommand implementations.
//!
//! Every command validates its configuration before any AWS client is
//! built, so a misconfigured invocation fails fast without credentials.

mod aggregate;
mod bootstrap;
mod report;
mod steps;

pub(crate) use aggregate::{cmd_aggregate, AggregateArgs};
pub(crate) use bootstrap::cmd_bootstrap;
pub(crate) use report::cmd_report;
pub(crate) use steps::{cmd_group, cmd_merge, cmd_search};

use std::io::Read;
use std::path::Path;
use std::process;

use serde::Serialize;
use tag_inventory_storage::ErrorKind;

use crate::config::FileConfig;
use crate::{report_error, OutputFormat};

/// Report `msg` and exit with status 1.
pub(crate) fn fail(msg: &str, output: OutputFormat, quiet: bool) -> ! {
    report_error(msg, output, quiet);
    process::exit(1);
}

/// Append an operator hint to failures no retry will fix.
pub(crate) fn describe_failure(msg: String, kind: ErrorKind) -> String {
    let hint = match kind {
        ErrorKind::ExpiredCredentials => {
            "the caller's credentials have expired; refresh credentials and run again"
        }
        ErrorKind::AccessDenied => {
            "the calling role lacks permission; check its IAM policy and any service control policies"
        }
        _ => return msg,
    };
    format!("{} (hint: {})", msg, hint)
}

/// Read an event document from `path`, or stdin when `path` is `-`.
pub(crate) fn read_event(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("error reading stdin: {}", e))?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("error reading file '{}': {}", path.display(), e))
    }
}

pub(crate) fn parse_event<T: serde::de::DeserializeOwned>(
    path: &Path,
    output: OutputFormat,
    quiet: bool,
) -> T {
    let text = match read_event(path) {
        Ok(text) => text,
        Err(msg) => fail(&msg, output, quiet),
    };
    match serde_json::from_str(&text) {
        Ok(event) => event,
        Err(e) => fail(
            &format!("error parsing JSON in '{}': {}", path.display(), e),
            output,
            quiet,
        ),
    }
}

pub(crate) fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> FileConfig {
    match FileConfig::load(path) {
        Ok(config) => config.with_env(|name| std::env::var(name).ok()),
        Err(e) => fail(&e.to_string(), output, quiet),
    }
}

pub(crate) fn runtime(output: OutputFormat, quiet: bool) -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => fail(
            &format!("internal error: failed to create tokio runtime: {}", e),
            output,
            quiet,
        ),
    }
}

/// Step payloads are always JSON on stdout, whatever `--output` says.
pub(crate) fn print_payload<T: Serialize>(payload: &T, output: OutputFormat, quiet: bool) {
    match serde_json::to_string_pretty(payload) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(
            &format!("internal error: failed to serialize output: {}", e),
            output,
            quiet,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_failures_get_a_hint() {
        let msg = describe_failure("denied".into(), ErrorKind::AccessDenied);
        assert!(msg.starts_with("denied (hint:"));
        assert!(msg.contains("IAM policy"));
        assert_eq!(describe_failure("slow".into(), ErrorKind::Throttled), "slow");
    }

    #[test]
    fn expired_credentials_get_a_refresh_hint() {
        let msg = describe_failure("expired".into(), ErrorKind::ExpiredCredentials);
        assert!(msg.starts_with("expired (hint:"));
        assert!(msg.contains("refresh credentials"));
        assert!(!msg.contains("IAM policy"));
    }
}
