use thiserror::Error;

/// Top-level error type for the `wrtfleet-ssh` crate.
///
/// Covers every failure mode of a single remote command run: name
/// resolution, TCP, handshake, authentication, channel setup, and a
/// non-zero remote exit. `wrtfleet-core` treats all of them as "router
/// unreachable this cycle".
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// DNS, TCP, or SSH handshake failure.
    #[error("SSH connection error to {target}: {reason}")]
    Connection { target: String, reason: String },

    /// Server rejected the supplied password or key.
    #[error("Authentication failed for {username}@{target}")]
    Authentication { target: String, username: String },

    /// Session did not become ready (or the command did not finish) in time.
    #[error("Timed out after {timeout_secs}s waiting for {target}")]
    Timeout { target: String, timeout_secs: u64 },

    /// The private key could not be decoded.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    // ── Command ─────────────────────────────────────────────────────
    /// Session channel failed after authentication.
    #[error("SSH channel error: {0}")]
    Channel(#[from] russh::Error),

    /// Remote command exited with a non-zero status.
    #[error("Command exited with code {exit_code}. Error: {stderr}")]
    Command { exit_code: u32, stderr: String },

    /// Channel closed without reporting an exit status.
    #[error("Command terminated without an exit status")]
    NoExitStatus,
}

impl Error {
    /// Returns `true` if the session never got as far as running the command.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::Authentication { .. }
                | Self::Timeout { .. }
                | Self::InvalidKey(_)
        )
    }

    /// Exit status reported by the remote command, if it got that far.
    pub fn exit_code(&self) -> Option<u32> {
        match self {
            Self::Command { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }
}
