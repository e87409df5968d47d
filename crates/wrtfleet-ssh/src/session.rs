// SSH command runner
//
// Opens one session per call, runs a single command on a fresh channel,
// and returns stdout once the channel closes with exit status 0. There
// are no retries here: the caller polls again next cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;
use secrecy::ExposeSecret;
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::auth::{Credentials, ShellTarget};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Host-key policy for consumer routers: keys are accepted as presented.
///
/// Router identity is established by address and credentials only.
struct AcceptingHandler;

#[async_trait]
impl client::Handler for AcceptingHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Runs single commands over short-lived SSH sessions.
///
/// Cheap to clone; holds only the shared transport config.
#[derive(Debug, Clone, Default)]
pub struct SshShell {
    config: TransportConfig,
}

impl SshShell {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Connect, authenticate, run `command`, and return its trimmed stdout.
    ///
    /// Connect + auth is bounded by `connect_timeout`; the command itself
    /// by `command_timeout`. Non-zero exit maps to [`Error::Command`].
    pub async fn run(&self, target: &ShellTarget, command: &str) -> Result<String, Error> {
        self.run_within(target, command, self.config.connect_timeout)
            .await
    }

    /// Like [`run`](Self::run) with a per-call connect + auth budget.
    pub async fn run_within(
        &self,
        target: &ShellTarget,
        command: &str,
        ready_timeout: Duration,
    ) -> Result<String, Error> {
        let session = timeout(ready_timeout, self.open(target))
            .await
            .map_err(|_| Error::Timeout {
                target: target.to_string(),
                timeout_secs: ready_timeout.as_secs(),
            })??;

        let result = timeout(self.config.command_timeout, exec(&session, command))
            .await
            .map_err(|_| Error::Timeout {
                target: target.to_string(),
                timeout_secs: self.config.command_timeout.as_secs(),
            })
            .and_then(|r| r);

        if let Err(e) = session
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            trace!(target = %target, error = %e, "disconnect failed (ignored)");
        }

        result
    }

    async fn open(&self, target: &ShellTarget) -> Result<Handle<AcceptingHandler>, Error> {
        let connection_error = |e: russh::Error| Error::Connection {
            target: target.to_string(),
            reason: e.to_string(),
        };

        let mut session = client::connect(
            self.config.build_client_config(),
            (target.host.as_str(), target.port),
            AcceptingHandler,
        )
        .await
        .map_err(connection_error)?;

        let authenticated = match &target.credentials {
            Credentials::Password(password) => session
                .authenticate_password(target.username.clone(), password.expose_secret())
                .await
                .map_err(connection_error)?,
            Credentials::PrivateKey { key, passphrase } => {
                let pair = russh_keys::decode_secret_key(
                    key.expose_secret(),
                    passphrase.as_ref().map(ExposeSecret::expose_secret),
                )
                .map_err(|e| Error::InvalidKey(e.to_string()))?;
                session
                    .authenticate_publickey(target.username.clone(), Arc::new(pair))
                    .await
                    .map_err(connection_error)?
            }
        };

        if !authenticated {
            return Err(Error::Authentication {
                target: target.to_string(),
                username: target.username.clone(),
            });
        }

        debug!(target = %target, auth = target.credentials.kind(), "ssh session ready");
        Ok(session)
    }
}

async fn exec(session: &Handle<AcceptingHandler>, command: &str) -> Result<String, Error> {
    let mut channel = session.channel_open_session().await?;
    channel.exec(true, command).await?;

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_status = None;

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
            // ext 1 is SSH_EXTENDED_DATA_STDERR
            ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
            ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
            _ => {}
        }
    }

    match exit_status {
        Some(0) => Ok(String::from_utf8_lossy(&stdout).trim().to_owned()),
        Some(code) => Err(Error::Command {
            exit_code: code,
            stderr: String::from_utf8_lossy(&stderr).trim().to_owned(),
        }),
        None => Err(Error::NoExitStatus),
    }
}
