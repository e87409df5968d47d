// wrtfleet-ssh: async SSH command transport for router polling

pub mod auth;
pub mod error;
pub mod session;
pub mod transport;

pub use auth::{Credentials, ShellTarget};
pub use error::Error;
pub use session::SshShell;
pub use transport::TransportConfig;
