pub mod config;
pub mod errors;
pub mod network;


// Re-export commonly used items for convenience
pub use config::ServerConfig;
pub use errors::{ErrorCategory, RelayError, RelayResult};
pub use network::registry::Registry;
pub use network::websocket::{Connection, MessageRouter, WebsocketServer};
