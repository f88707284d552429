use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::network::messages::{serialize_response, PlayerKey, ServerResponse};
use crate::network::websocket::connection::Connection;

#[derive(Debug, Default)]
struct RegistryState {
    players: IndexMap<PlayerKey, Arc<Connection>>,
    admin: Option<Arc<Connection>>,
    draw_history: Vec<i64>,
}

/// Shared session state: every live connection, the player and admin routing
/// tables, and the draw history. All read-modify-write paths go through one lock.
#[derive(Debug, Default)]
pub struct Registry {
    connections: DashMap<String, Arc<Connection>>,
    state: Mutex<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, connection: Arc<Connection>) {
        self.connections
            .insert(connection.id().to_string(), connection);
    }

    pub fn untrack(&self, connection: &Connection) {
        self.connections.remove(connection.id());
    }

    /// Snapshot of every live connection regardless of role.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub async fn register_player(&self, player_key: PlayerKey, connection: Arc<Connection>) {
        let mut state = self.state.lock().await;
        if let Some(previous) = state.players.insert(player_key.clone(), connection.clone()) {
            if *previous != *connection {
                debug!(
                    "Player '{}' moved from connection {} to {}",
                    player_key,
                    previous.id(),
                    connection.id()
                );
            }
        }
    }

    pub async fn register_admin(&self, connection: Arc<Connection>) {
        let mut state = self.state.lock().await;
        if let Some(previous) = state.admin.replace(connection) {
            trace!("Previous admin connection {} unlinked", previous.id());
        }
    }

    /// Removes whatever the registry still maps to this exact connection.
    /// Returns true if a player entry or the admin slot was cleared.
    pub async fn unregister_by_connection(&self, connection: &Connection) -> bool {
        let mut state = self.state.lock().await;
        let before = state.players.len();
        state.players.retain(|_, stored| **stored != *connection);
        let mut removed = state.players.len() != before;

        if state.admin.as_deref() == Some(connection) {
            state.admin = None;
            removed = true;
        }
        removed
    }

    /// Appends the number unless it was already drawn.
    pub async fn record_draw(&self, number: i64) -> bool {
        let mut state = self.state.lock().await;
        if state.draw_history.contains(&number) {
            return false;
        }
        state.draw_history.push(number);
        true
    }

    pub async fn reset_draws(&self) {
        self.state.lock().await.draw_history.clear();
    }

    pub async fn snapshot_player_keys(&self) -> Vec<PlayerKey> {
        self.state.lock().await.players.keys().cloned().collect()
    }

    pub async fn current_history(&self) -> Vec<i64> {
        self.state.lock().await.draw_history.clone()
    }

    /// Player keys and draw history read under one lock.
    pub async fn snapshot(&self) -> (Vec<PlayerKey>, Vec<i64>) {
        let state = self.state.lock().await;
        (
            state.players.keys().cloned().collect(),
            state.draw_history.clone(),
        )
    }

    pub async fn player(&self, player_key: &str) -> Option<Arc<Connection>> {
        self.state.lock().await.players.get(player_key).cloned()
    }

    pub async fn admin(&self) -> Option<Arc<Connection>> {
        self.state.lock().await.admin.clone()
    }

    /// Serializes once and queues the frame on every connection live right now.
    pub fn broadcast(&self, response: &ServerResponse) {
        let message = match serialize_response(response) {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping broadcast: {}", e);
                return;
            }
        };

        for connection in self.connections() {
            connection.send_text(message.clone());
        }
    }
}
