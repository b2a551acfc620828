use crate::connection::manager::{CompletionCallback, ConnectionError, ConnectionManager, InboundHandler};
use crate::connection::request::Request;
use crate::domain::DeviceState;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;
use tracing::{debug, error, info, instrument, trace, warn};

const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Resolves the `host:port` of the hub each time a connection is initiated.
#[async_trait]
pub trait AddressProvider: Send + Sync {
    async fn address(&self) -> Result<String, ConnectionError>;
}

#[async_trait]
impl AddressProvider for String {
    async fn address(&self) -> Result<String, ConnectionError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub client_name: String,
    pub retry_ms: u64,
    pub retry_max_delay: Duration,
    pub connect_attempts: usize,
}

pub struct TcpConnectionManager {
    address: Box<dyn AddressProvider>,
    handler: InboundHandler,
    config: Config,
    writer: Mutex<Option<OwnedWriteHalf>>,
    reader: StdMutex<Option<JoinHandle<()>>>,
}

impl TcpConnectionManager {
    pub fn new(address: impl AddressProvider + 'static, handler: InboundHandler, config: Config) -> Self {
        TcpConnectionManager {
            address: Box::new(address),
            handler,
            config,
            writer: Mutex::new(None),
            reader: StdMutex::new(None),
        }
    }

    async fn send(&self, request: &Request) -> Result<(), ConnectionError> {
        let mut payload = serde_json::to_vec(request)?;
        payload.extend_from_slice(LINE_TERMINATOR);

        let mut writer_guard = self.writer.lock().await;
        let writer = writer_guard.as_mut().ok_or(ConnectionError::NotConnected)?;
        writer.write_all(&payload).await?;
        writer.flush().await?;

        debug!(transaction_id = %request.transaction_id, "🔸 Sent {:?} request", request.request_type);
        Ok(())
    }

    fn replace_reader(&self, reader: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(&mut *self.reader.lock().unwrap_or_else(PoisonError::into_inner), reader);
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

#[async_trait]
impl ConnectionManager for TcpConnectionManager {
    #[instrument(skip_all)]
    async fn init_connection(&self) -> Result<(), ConnectionError> {
        let address = self.address.address().await?;
        let strategy = ExponentialBackoff::from_millis(self.config.retry_ms)
            .factor(2)
            .max_delay(self.config.retry_max_delay)
            .map(jitter)
            .take(self.config.connect_attempts.saturating_sub(1));

        info!("Connecting to hub {}...", address);
        let target = address.as_str();
        let stream = Retry::spawn(strategy, || async move {
            TcpStream::connect(target).await.inspect_err(|e| {
                warn!("⚠️ Unable to connect to hub {}: {}. Retrying...", target, e);
            })
        })
        .await?;
        info!("Connecting to hub {}... OK", address);

        let (read_half, write_half) = stream.into_split();
        *self.writer.lock().await = Some(write_half);
        self.replace_reader(Some(tokio::spawn(read_messages(read_half, self.handler.clone()))));

        Ok(())
    }

    #[instrument(skip_all)]
    async fn close(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                warn!("⚠️ Unable to shut down the hub connection cleanly: {}", e);
            }
        }
        self.replace_reader(None);
        info!("🔴 Closed hub connection");
    }

    async fn send_get_device_list(&self) -> Result<(), ConnectionError> {
        self.send(&Request::device_list(&self.config.client_name, None)).await
    }

    async fn send_state_change(&self, uuid: &str, state: DeviceState, completed: CompletionCallback) -> Result<(), ConnectionError> {
        self.send(&Request::state_change(&self.config.client_name, None, uuid, state)).await?;
        completed();
        Ok(())
    }
}

impl Drop for TcpConnectionManager {
    fn drop(&mut self) {
        self.replace_reader(None);
    }
}

#[instrument(skip_all)]
async fn read_messages<R>(reader: R, handler: InboundHandler)
where
    R: AsyncRead + Unpin,
{
    // Frames are raw bytes so a line that is not valid UTF-8 is dropped like any other undecodable one.
    let mut frames = SplitStream::new(BufReader::new(reader).split(b'\n'));

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(frame) => {
                let frame = frame.trim_ascii();
                if frame.is_empty() {
                    continue;
                }

                match serde_json::from_slice::<Value>(frame) {
                    Ok(message) => {
                        trace!(payload = %String::from_utf8_lossy(frame), "🔹 Received message");
                        handler(message);
                    }
                    Err(e) => warn!(payload = %String::from_utf8_lossy(frame), "⚠️ Dropping undecodable message: {}", e),
                }
            }
            Err(e) => {
                error!("❌ Hub stream error: {}", e);
                return;
            }
        }
    }

    warn!("🔴 Hub stream ended");
}
