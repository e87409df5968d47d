// ── Production implementations of the collaborator ports ──

pub mod dns;
pub mod local_net;
pub mod notifier;
pub mod oui;

pub use dns::SystemDns;
pub use local_net::SystemNetwork;
pub use notifier::{LogNotifier, TelegramNotifier};
pub use oui::OuiTable;
