use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, trace};

use crate::network::websocket::handler::MessageRouter;

/// Pings every tracked connection once per interval and terminates the ones
/// that never answered the previous ping.
pub struct LivenessMonitor {
    router: MessageRouter,
    interval: Duration,
}

impl LivenessMonitor {
    pub fn new(router: MessageRouter, interval: Duration) -> Self {
        Self { router, interval }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(&self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; new connections get a full interval.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// One probe cycle. Returns how many connections were terminated.
    pub async fn sweep(&self) -> usize {
        let mut terminated = 0;
        for connection in self.router.registry().connections() {
            if connection.take_alive() {
                trace!("🏓 Pinging {}", connection.id());
                connection.ping();
                continue;
            }

            info!("💀 Connection {} missed its pong, terminating", connection.id());
            connection.terminate();
            self.router.on_close(&connection).await;
            terminated += 1;
        }
        terminated
    }
}
