pub mod messages;
pub mod registry;
pub mod websocket;
