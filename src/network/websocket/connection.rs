use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use crate::network::messages::{serialize_response, PlayerKey, ServerResponse};

/// Work queued for the writer task that owns the socket sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCommand {
    Send { message: String },
    Ping,
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRole {
    Player(PlayerKey),
    Admin,
}

/// One live peer. The role is assigned at most once for the connection's lifetime.
#[derive(Debug)]
pub struct Connection {
    id: String,
    sender: mpsc::UnboundedSender<ConnectionCommand>,
    is_alive: AtomicBool,
    closed: AtomicBool,
    role: OnceLock<ConnectionRole>,
}

impl Connection {
    pub fn new(sender: mpsc::UnboundedSender<ConnectionCommand>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
            is_alive: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            role: OnceLock::new(),
        }
    }

    /// Builds a connection together with the receiving end of its outbound queue.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConnectionCommand>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Option<&ConnectionRole> {
        self.role.get()
    }

    /// Returns false when the connection already holds a different role.
    pub fn assign_role(&self, role: ConnectionRole) -> bool {
        match self.role.set(role.clone()) {
            Ok(()) => true,
            Err(_) => self.role.get() == Some(&role),
        }
    }

    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive.load(Ordering::SeqCst)
    }

    /// Clears the liveness flag, returning its previous value.
    pub fn take_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::SeqCst)
    }

    /// Returns true only for the first caller.
    pub fn mark_closed(&self) -> bool {
        !self.closed.swap(true, Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst) && !self.sender.is_closed()
    }

    /// Fire-and-forget: a closed connection or a failed serialization drops the message.
    pub fn send(&self, response: &ServerResponse) {
        match serialize_response(response) {
            Ok(message) => self.send_text(message),
            Err(e) => trace!("Dropping unserializable response for {}: {}", self.id, e),
        }
    }

    pub fn send_text(&self, message: String) {
        if !self.is_open() {
            trace!("Skipping send to closed connection {}", self.id);
            return;
        }
        let _ = self.sender.send(ConnectionCommand::Send { message });
    }

    pub fn ping(&self) {
        let _ = self.sender.send(ConnectionCommand::Ping);
    }

    pub fn terminate(&self) {
        let _ = self.sender.send(ConnectionCommand::Terminate);
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}
