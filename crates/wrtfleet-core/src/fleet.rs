// ── Fleet-wide command fan-out ──
//
// Runs one command on many routers with at most `limit` sessions open at
// a time. Each router settles independently; results come back in the
// order the routers were given.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use serde::Serialize;
use tracing::debug;

use crate::model::{Router, RouterId};
use crate::ports::RemoteShell;

/// What one router returned for a fleet command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub router: RouterId,
    pub address: String,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Run `command` on every router in `routers`, `min(limit, n)` at a time.
pub async fn run_on_many(
    shell: &dyn RemoteShell,
    routers: &[Router],
    command: &str,
    limit: usize,
    ready_timeout: Duration,
) -> Vec<CommandOutcome> {
    let lanes = limit.min(routers.len()).max(1);
    debug!(routers = routers.len(), lanes, "fleet command");

    stream::iter(routers)
        .map(|router| async move {
            let result = shell
                .run(&router.shell_target(), command, ready_timeout)
                .await;
            let (output, error) = match result {
                Ok(out) => (Some(out), None),
                Err(e) => (None, Some(e.to_string())),
            };
            CommandOutcome {
                router: router.id.clone(),
                address: router.address.clone(),
                output,
                error,
            }
        })
        .buffered(lanes)
        .collect()
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use secrecy::SecretString;
    use wrtfleet_ssh::{Credentials, ShellTarget};

    /// Echoes the host back after a short delay, tracking peak concurrency.
    #[derive(Default)]
    struct CountingShell {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl RemoteShell for CountingShell {
        async fn run(
            &self,
            target: &ShellTarget,
            command: &str,
            _ready_timeout: Duration,
        ) -> Result<String, wrtfleet_ssh::Error> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if target.host.ends_with(".13") {
                return Err(wrtfleet_ssh::Error::Command {
                    exit_code: 1,
                    stderr: "boom".into(),
                });
            }
            Ok(format!("{} ran {command}", target.host))
        }
    }

    fn routers(n: u8) -> Vec<Router> {
        (1..=n)
            .map(|i| {
                Router::new(
                    format!("ap{i:02}"),
                    format!("10.0.0.{i}"),
                    "root",
                    Credentials::Password(SecretString::from("pw".to_owned())),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_limit_and_keeps_order() {
        let shell = CountingShell::default();
        let fleet = routers(14);

        let outcomes = run_on_many(&shell, &fleet, "uptime", 5, Duration::from_secs(1)).await;

        assert_eq!(shell.peak.load(Ordering::SeqCst), 5);
        let ids: Vec<&str> = outcomes.iter().map(|o| o.router.as_str()).collect();
        let expected: Vec<String> = (1..=14).map(|i| format!("ap{i:02}")).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(outcomes[0].output.as_deref(), Some("10.0.0.1 ran uptime"));
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_stop_the_rest() {
        let shell = CountingShell::default();
        let fleet = routers(14);

        let outcomes = run_on_many(&shell, &fleet, "true", 3, Duration::from_secs(1)).await;

        let failed: Vec<&CommandOutcome> = outcomes.iter().filter(|o| !o.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].address, "10.0.0.13");
        assert_eq!(
            failed[0].error.as_deref(),
            Some("Command exited with code 1. Error: boom")
        );
        assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn lanes_shrink_to_router_count() {
        let shell = CountingShell::default();
        let fleet = routers(2);

        let outcomes = run_on_many(&shell, &fleet, "true", 5, Duration::from_secs(1)).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(shell.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_fleet_is_empty_result() {
        let shell = CountingShell::default();
        assert!(run_on_many(&shell, &[], "true", 5, Duration::from_secs(1)).await.is_empty());
    }
}
