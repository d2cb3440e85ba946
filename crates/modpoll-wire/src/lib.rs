//! # Modpoll Wire
//!
//! Byte-exact implementation of the single-register read exchange spoken by
//! polled devices over TCP.
//!
//! ## Frames
//!
//! ```text
//! request  (8 bytes): [unit][func][reg hi][reg lo][cnt hi][cnt lo][crc lo][crc hi]
//! response (7 bytes): [unit][func][bytes][val hi][val lo][crc lo][crc hi]
//! ```
//!
//! The checksum is the 16-bit CRC with polynomial `0xA001`, transmitted
//! low byte first.

pub mod client;
pub mod crc;
pub mod error;
pub mod frame;

pub use client::{ClientConfig, RegisterReader, TcpDeviceClient, DEFAULT_DEVICE_PORT};
pub use error::{DeviceError, FaultKind, WireResult};
pub use frame::{ReadRequest, TelemetryRegister};
