//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use wrtfleet_config::ConfigError;
use wrtfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach router at {target}")]
    #[diagnostic(
        code(wrtfleet::connection_failed),
        help(
            "Check that the router is powered on and accepts SSH.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { target: String, reason: String },

    #[error("Remote command failed: {message}")]
    #[diagnostic(code(wrtfleet::command_failed))]
    CommandFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(wrtfleet::auth_failed),
        help("{message}\nCheck the router's username and password or key in your config.")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for router '{router}'")]
    #[diagnostic(
        code(wrtfleet::no_credentials),
        help(
            "Set password_env, store the password in the system keyring as\n\
             '{router}/password' (service 'wrtfleet'), or set password / key_path."
        )
    )]
    NoCredentials { router: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(wrtfleet::not_found),
        help("Run: wrtfleet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(wrtfleet::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    // ── Operations ───────────────────────────────────────────────────
    #[error("A sync is already running")]
    #[diagnostic(
        code(wrtfleet::sync_in_progress),
        help("Wait for the current cycle to finish and try again.")
    )]
    SyncInProgress,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(wrtfleet::validation))]
    Validation { field: String, reason: String },

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(wrtfleet::confirmation_required),
        help("Pass --yes (-y) to confirm.")
    )]
    ConfirmationRequired { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No routers configured")]
    #[diagnostic(
        code(wrtfleet::no_routers),
        help(
            "Add a [routers.<id>] table with at least `address` to:\n\
             {path}"
        )
    )]
    NoRouters { path: String },

    #[error(transparent)]
    #[diagnostic(code(wrtfleet::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Router timed out after {seconds}s")]
    #[diagnostic(
        code(wrtfleet::timeout),
        help("Increase sync.connect_timeout_secs or check the router's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("State file is not valid JSON: {0}")]
    #[diagnostic(
        code(wrtfleet::state),
        help("Move the state file aside; it is rebuilt on the next sync.")
    )]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(wrtfleet::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::ConfirmationRequired { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn router_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "router".into(),
            identifier: identifier.into(),
            list_command: "routers".into(),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { router } => Self::NoCredentials { router },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { target, reason } => {
                Self::ConnectionFailed { target, reason }
            }
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::CommandFailed { message, .. } => Self::CommandFailed { message },
            CoreError::RouterNotFound { identifier } => Self::router_not_found(identifier),
            CoreError::RouterExists { identifier } => Self::Conflict {
                resource_type: "router".into(),
                identifier,
            },
            CoreError::SyncInProgress => Self::SyncInProgress,
            CoreError::Io(e) => Self::Io(e),
            CoreError::State(e) => Self::Json(e),
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Registry { message } | CoreError::Internal(message) => {
                Self::Internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let not_found = CliError::from(CoreError::RouterNotFound {
            identifier: "attic".into(),
        });
        assert_eq!(not_found.exit_code(), exit_code::NOT_FOUND);

        let timeout = CliError::from(CoreError::Timeout { timeout_secs: 10 });
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);

        let refused = CliError::from(CoreError::ConnectionFailed {
            target: "192.168.1.2:22".into(),
            reason: "Connection refused".into(),
        });
        assert_eq!(refused.exit_code(), exit_code::CONNECTION);

        let creds = CliError::from(ConfigError::NoCredentials {
            router: "gw".into(),
        });
        assert_eq!(creds.exit_code(), exit_code::AUTH);

        assert_eq!(CliError::SyncInProgress.exit_code(), exit_code::GENERAL);
    }
}
