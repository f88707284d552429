use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::network::registry::Registry;
use crate::network::websocket::{ConnectionHandler, LivenessMonitor, MessageRouter};
use crate::RelayResult;

pub struct WebsocketServer {
    listener: TcpListener,
    config: ServerConfig,
    router: MessageRouter,
}

impl WebsocketServer {
    pub async fn bind(config: ServerConfig) -> RelayResult<Self> {
        let listener = TcpListener::bind(config.address()).await?;
        let router = MessageRouter::new(Arc::new(Registry::new()));
        Ok(Self {
            listener,
            config,
            router,
        })
    }

    pub fn local_addr(&self) -> RelayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.router.registry()
    }

    pub async fn run(self) -> RelayResult<()> {
        info!("🌐 Bingo relay listening on {}", self.local_addr()?);

        let monitor = LivenessMonitor::new(self.router.clone(), self.config.ping_interval);
        let liveness = monitor.spawn();

        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    liveness.abort();
                    return Err(e.into());
                }
            };
            debug!("🔗 New connection from: {}", addr);

            let router = self.router.clone();
            tokio::spawn(async move {
                if let Err(e) = ConnectionHandler::handle_connection(stream, router).await {
                    debug!("❌ Connection from {} ended with error: {}", addr, e);
                }
            });
        }
    }
}
