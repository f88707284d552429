use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Duration};
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use tracing::{debug, info, trace};

use crate::network::websocket::connection::{Connection, ConnectionCommand};
use crate::network::websocket::handler::MessageRouter;
use crate::RelayResult;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

type WsSender = SplitSink<WebSocketStream<TcpStream>, Message>;

pub struct ConnectionHandler;

impl ConnectionHandler {
    pub async fn handle_connection(stream: TcpStream, router: MessageRouter) -> RelayResult<()> {
        let ws_stream = accept_async(stream).await?;
        let (ws_sender, mut ws_receiver) = ws_stream.split();

        let (connection, commands) = Connection::channel();
        let connection = Arc::new(connection);
        info!("✅ WebSocket connection {} established", connection.id());

        router.registry().track(connection.clone());
        let mut writer = tokio::spawn(Self::write_loop(
            connection.id().to_string(),
            ws_sender,
            commands,
        ));

        loop {
            tokio::select! {
                frame = ws_receiver.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        trace!("📨 {} received: {}", connection.id(), text);
                        router.handle(&connection, &text).await;
                    }
                    // tungstenite queues the pong itself and flushes it on the next read
                    Some(Ok(Message::Ping(_))) => continue,
                    Some(Ok(Message::Pong(_))) => connection.mark_alive(),
                    Some(Ok(Message::Close(_))) => {
                        debug!("👋 Connection {} requested close", connection.id());
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("WebSocket error on {}: {}", connection.id(), e);
                        break;
                    }
                    None => break,
                },
                // Writer stopped: terminated by the liveness sweep or the sink failed.
                _ = &mut writer => break,
            }
        }

        writer.abort();
        router.on_close(&connection).await;
        info!("📴 Connection {} closed", connection.id());
        Ok(())
    }

    async fn write_loop(
        connection_id: String,
        mut ws_sender: WsSender,
        mut commands: mpsc::UnboundedReceiver<ConnectionCommand>,
    ) {
        while let Some(command) = commands.recv().await {
            let result = match command {
                ConnectionCommand::Send { message } => ws_sender.send(Message::Text(message)).await,
                ConnectionCommand::Ping => ws_sender.send(Message::Ping(Vec::new())).await,
                ConnectionCommand::Terminate => {
                    let _ = time::timeout(CLOSE_TIMEOUT, ws_sender.close()).await;
                    break;
                }
            };

            if let Err(e) = result {
                trace!("Send to {} failed: {}", connection_id, e);
                break;
            }
        }
    }
}
