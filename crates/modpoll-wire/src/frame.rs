//! Request encoding and response decoding.

use crate::crc;
use crate::error::{DeviceError, WireResult};

/// Unit identifier addressed by every request.
pub const UNIT_ID: u8 = 0x01;

/// Function code for reading holding registers.
pub const READ_HOLDING_REGISTERS: u8 = 0x03;

/// Size of an encoded request.
pub const REQUEST_LEN: usize = 8;

/// Smallest response that can carry one register.
pub const MIN_RESPONSE_LEN: usize = 7;

/// Receive buffer size for a single response read.
pub const RESPONSE_BUFFER_LEN: usize = 256;

/// Fixed-point divisor applied to raw register values.
pub const SCALE: f64 = 100.0;

/// Telemetry channels exposed by a device, one register each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryRegister {
    Cpu,
    Ram,
    Disk,
}

impl TelemetryRegister {
    /// All channels in polling order.
    pub const ALL: [TelemetryRegister; 3] = [Self::Cpu, Self::Ram, Self::Disk];

    /// Register address of this channel.
    pub fn address(self) -> u16 {
        match self {
            TelemetryRegister::Cpu => 0x04,
            TelemetryRegister::Ram => 0x06,
            TelemetryRegister::Disk => 0x08,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TelemetryRegister::Cpu => "cpu",
            TelemetryRegister::Ram => "ram",
            TelemetryRegister::Disk => "disk",
        }
    }
}

/// A single-register read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    register: u16,
}

impl ReadRequest {
    /// Create a request for one register.
    pub fn new(register: u16) -> Self {
        Self { register }
    }

    /// Register address being read.
    pub fn register(&self) -> u16 {
        self.register
    }

    /// Encode the request frame.
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut frame = [0u8; REQUEST_LEN];
        let [reg_hi, reg_lo] = self.register.to_be_bytes();

        frame[0] = UNIT_ID;
        frame[1] = READ_HOLDING_REGISTERS;
        frame[2] = reg_hi;
        frame[3] = reg_lo;
        // Register count, always one.
        frame[4] = 0x00;
        frame[5] = 0x01;
        crc::append(&mut frame, REQUEST_LEN - 2);

        frame
    }
}

/// Validate a response frame and extract the raw register value.
///
/// Checks run in order: minimum length, then checksum over everything but
/// the trailing two bytes, then the big-endian value at offsets 3..5.
pub fn decode_response(frame: &[u8]) -> WireResult<u16> {
    if frame.len() < MIN_RESPONSE_LEN {
        return Err(DeviceError::ShortResponse {
            received: frame.len(),
        });
    }

    let (body, _) = frame.split_at(frame.len() - 2);
    let computed = crc::compute(body);
    let received = crc::trailing(frame).unwrap_or_default();
    if computed != received {
        return Err(DeviceError::ChecksumMismatch { computed, received });
    }

    Ok(u16::from_be_bytes([frame[3], frame[4]]))
}

/// Convert a raw register value to its percentage reading (4500 -> 45.00).
pub fn scale(raw: u16) -> f64 {
    f64::from(raw) / SCALE
}

/// Build a well-formed response frame carrying `value`.
///
/// Devices produce these; the client only needs it for fakes and tests.
pub fn encode_response(value: u16) -> [u8; MIN_RESPONSE_LEN] {
    let mut frame = [0u8; MIN_RESPONSE_LEN];
    let [hi, lo] = value.to_be_bytes();

    frame[0] = UNIT_ID;
    frame[1] = READ_HOLDING_REGISTERS;
    frame[2] = 0x02;
    frame[3] = hi;
    frame[4] = lo;
    crc::append(&mut frame, MIN_RESPONSE_LEN - 2);

    frame
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
