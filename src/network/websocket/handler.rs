use std::sync::Arc;
use tracing::{debug, info};

use crate::network::messages::{deserialize_message, ClientMessage, ServerResponse};
use crate::network::registry::Registry;
use crate::network::websocket::connection::{Connection, ConnectionRole};

/// Classifies inbound frames and routes the resulting traffic. Failures never
/// reach the sender: malformed frames and missing targets are dropped here.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<Registry>,
}

impl MessageRouter {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn handle(&self, source: &Arc<Connection>, text: &str) {
        match deserialize_message(text) {
            Ok(message) => self.dispatch(source, message).await,
            Err(e) => debug!("Dropping frame from {}: {}", source.id(), e),
        }
    }

    pub async fn dispatch(&self, source: &Arc<Connection>, message: ClientMessage) {
        match message {
            ClientMessage::PlayerJoin { player_key } => {
                if !source.assign_role(ConnectionRole::Player(player_key.clone())) {
                    debug!(
                        "Connection {} already holds {:?}, ignoring player-join as '{}'",
                        source.id(),
                        source.role(),
                        player_key
                    );
                    return;
                }
                if source.is_closed() {
                    debug!("Connection {} already closed, ignoring player-join", source.id());
                    return;
                }
                self.registry
                    .register_player(player_key.clone(), source.clone())
                    .await;
                if !self.still_open_after_register(source).await {
                    return;
                }
                info!("🎟️ Player '{}' joined on {}", player_key, source.id());

                let last_numbers = self.registry.current_history().await;
                source.send(&ServerResponse::PlayerState { last_numbers });
                self.notify_admin_player_list().await;
            }

            ClientMessage::AdminJoin => {
                if !source.assign_role(ConnectionRole::Admin) {
                    debug!(
                        "Connection {} already holds {:?}, ignoring admin-join",
                        source.id(),
                        source.role()
                    );
                    return;
                }
                if source.is_closed() {
                    debug!("Connection {} already closed, ignoring admin-join", source.id());
                    return;
                }
                self.registry.register_admin(source.clone()).await;
                if !self.still_open_after_register(source).await {
                    return;
                }
                info!("🎛️ Admin joined on {}", source.id());

                let (players, last_numbers) = self.registry.snapshot().await;
                source.send(&ServerResponse::AdminState {
                    players,
                    last_numbers,
                });
            }

            ClientMessage::AssignCartones {
                player_key,
                cartones,
            } => {
                let cartones_count = cartones.len();
                match self.registry.player(&player_key).await {
                    Some(target) => target.send(&ServerResponse::AssignCartones { cartones }),
                    None => debug!("Player '{}' not connected, cartones not delivered", player_key),
                }

                if let Some(admin) = self.registry.admin().await {
                    admin.send(&ServerResponse::AssignConfirm {
                        player_key,
                        cartones_count,
                    });
                }
            }

            ClientMessage::NewNumber { number } => {
                if self.registry.record_draw(number).await {
                    info!("🔢 Drew {}", number);
                } else {
                    debug!("{} already drawn, rebroadcasting", number);
                }
                self.registry.broadcast(&ServerResponse::Number { number });
            }

            ClientMessage::ResetNumbers => {
                info!("🔄 Draw history reset");
                self.registry.reset_draws().await;
                self.registry.broadcast(&ServerResponse::Reset);
            }

            ClientMessage::Report { report } => {
                let Some(report) = report else {
                    return;
                };
                match self.registry.admin().await {
                    Some(admin) => admin.send(&ServerResponse::Report { report }),
                    None => debug!("No admin registered, dropping report from {}", source.id()),
                }
            }

            ClientMessage::RequestPlayerList => self.notify_admin_player_list().await,
        }
    }

    pub async fn notify_admin_player_list(&self) {
        let Some(admin) = self.registry.admin().await else {
            return;
        };
        let players = self.registry.snapshot_player_keys().await;
        admin.send(&ServerResponse::PlayerList { players });
    }

    /// A close racing a join may run between the closed check and the insert.
    /// Undo the registration if so; `on_close` has already cleaned up.
    async fn still_open_after_register(&self, source: &Connection) -> bool {
        if !source.is_closed() {
            return true;
        }
        debug!("Connection {} closed while joining, unregistering", source.id());
        self.registry.unregister_by_connection(source).await;
        false
    }

    /// Safe to call repeatedly: every call unregisters, but the admin only
    /// hears about the first close or about an entry that was actually removed.
    pub async fn on_close(&self, connection: &Connection) {
        let first = connection.mark_closed();
        self.registry.untrack(connection);
        let removed = self.registry.unregister_by_connection(connection).await;
        if removed {
            debug!("Unregistered connection {} ({:?})", connection.id(), connection.role());
        }
        if first || removed {
            self.notify_admin_player_list().await;
        }
    }
}
