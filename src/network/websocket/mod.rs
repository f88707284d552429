pub mod connection;
pub mod connection_handler;
pub mod handler;
pub mod liveness;
pub mod server;

pub use connection::{Connection, ConnectionCommand, ConnectionRole};
pub use connection_handler::ConnectionHandler;
pub use handler::MessageRouter;
pub use liveness::LivenessMonitor;
pub use server::WebsocketServer;
