use std::fmt;

use secrecy::SecretString;

/// Credentials for logging into a router shell.
///
/// Each variant carries the secret material needed for its auth flow.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Password authentication.
    Password(SecretString),

    /// Public-key authentication with an OpenSSH/PEM encoded private key.
    PrivateKey {
        key: SecretString,
        passphrase: Option<SecretString>,
    },
}

impl Credentials {
    /// Short label for logs; never includes secret material.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::PrivateKey { .. } => "key",
        }
    }
}

/// Where and as whom to open a session.
#[derive(Debug, Clone)]
pub struct ShellTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credentials: Credentials,
}

impl ShellTarget {
    pub fn new(host: impl Into<String>, username: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            host: host.into(),
            port: 22,
            username: username.into(),
            credentials,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl fmt::Display for ShellTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_host_and_port() {
        let target = ShellTarget::new(
            "192.168.1.1",
            "root",
            Credentials::Password(SecretString::from("pw".to_owned())),
        )
        .with_port(2222);
        assert_eq!(target.to_string(), "192.168.1.1:2222");
        assert_eq!(target.credentials.kind(), "password");
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials::Password(SecretString::from("hunter2".to_owned()));
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
