// ── Core error types ──
//
// Errors surfaced by wrtfleet-core to the CLI. Per-router connectivity
// failures during a sync never reach this type: they are recorded on the
// router's status instead. The `From<wrtfleet_ssh::Error>` impl covers
// single-router operations (stats, reboot, status check).

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach router at {target}: {reason}")]
    ConnectionFailed { target: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Router timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Remote command failed: {message}")]
    CommandFailed {
        message: String,
        exit_code: Option<u32>,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Router not found: {identifier}")]
    RouterNotFound { identifier: String },

    #[error("Router already registered: {identifier}")]
    RouterExists { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("A sync is already in progress")]
    SyncInProgress,

    #[error("Registry error: {message}")]
    Registry { message: String },

    // ── State / configuration errors ─────────────────────────────────
    #[error("State file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    State(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<wrtfleet_ssh::Error> for CoreError {
    fn from(err: wrtfleet_ssh::Error) -> Self {
        match err {
            wrtfleet_ssh::Error::Connection { target, reason } => {
                CoreError::ConnectionFailed { target, reason }
            }
            wrtfleet_ssh::Error::Authentication { target, username } => {
                CoreError::AuthenticationFailed {
                    message: format!("{username}@{target} rejected the supplied credentials"),
                }
            }
            wrtfleet_ssh::Error::Timeout { timeout_secs, .. } => CoreError::Timeout { timeout_secs },
            wrtfleet_ssh::Error::InvalidKey(msg) => CoreError::Config {
                message: format!("Invalid private key: {msg}"),
            },
            other => CoreError::CommandFailed {
                exit_code: other.exit_code(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_keeps_exit_code_and_stderr() {
        let err = CoreError::from(wrtfleet_ssh::Error::Command {
            exit_code: 1,
            stderr: "reboot: not permitted".into(),
        });
        match err {
            CoreError::CommandFailed { message, exit_code } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(message, "Command exited with code 1. Error: reboot: not permitted");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn timeout_keeps_its_budget() {
        let err = CoreError::from(wrtfleet_ssh::Error::Timeout {
            target: "10.0.0.2:22".into(),
            timeout_secs: 10,
        });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 10 }));
    }
}
