//! TCP device client.
//!
//! Each read opens its own connection, performs one request/response
//! exchange and closes the connection again. The stream is owned by the
//! read call, so it is dropped (and the socket closed) on every return path.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{DeviceError, WireResult};
use crate::frame::{self, ReadRequest, RESPONSE_BUFFER_LEN};

/// TCP port devices listen on.
pub const DEFAULT_DEVICE_PORT: u16 = 5000;

/// Reads one scaled register value from a device.
#[async_trait]
pub trait RegisterReader: Send + Sync {
    /// Read `register` from the device at `address` and return the scaled
    /// value. No retries.
    async fn read_register(&self, address: &str, register: u16) -> WireResult<f64>;
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DEVICE_PORT,
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(2),
        }
    }
}

/// Device client speaking the register-read protocol over raw TCP.
#[derive(Debug, Clone, Default)]
pub struct TcpDeviceClient {
    config: ClientConfig,
}

impl TcpDeviceClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn connect(&self, address: &str) -> WireResult<TcpStream> {
        let connect = TcpStream::connect((address, self.config.port));

        match timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(DeviceError::Connect {
                address: address.to_string(),
                source,
            }),
            Err(_) => Err(DeviceError::ConnectTimeout {
                address: address.to_string(),
                timeout_ms: self.config.connect_timeout.as_millis() as u64,
            }),
        }
    }

    async fn exchange(stream: &mut TcpStream, request: &[u8]) -> WireResult<Vec<u8>> {
        stream.write_all(request).await?;

        let mut buffer = [0u8; RESPONSE_BUFFER_LEN];
        let received = stream.read(&mut buffer).await?;
        Ok(buffer[..received].to_vec())
    }
}

#[async_trait]
impl RegisterReader for TcpDeviceClient {
    async fn read_register(&self, address: &str, register: u16) -> WireResult<f64> {
        let mut stream = self.connect(address).await?;
        let request = ReadRequest::new(register).encode();

        let response = timeout(
            self.config.read_timeout,
            Self::exchange(&mut stream, &request),
        )
        .await
        .map_err(|_| DeviceError::ReadTimeout {
            timeout_ms: self.config.read_timeout.as_millis() as u64,
        })??;

        debug!(
            "Register {:#06x} from {}: {} bytes received",
            register,
            address,
            response.len()
        );

        let raw = frame::decode_response(&response)?;
        Ok(frame::scale(raw))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
