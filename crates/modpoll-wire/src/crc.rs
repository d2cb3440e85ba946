//! 16-bit cyclic redundancy check used to validate every frame.

const POLYNOMIAL: u16 = 0xA001;

/// Compute the checksum over `data`.
///
/// Callers pass exactly the bytes to cover, e.g. `&frame[..len - 2]` when
/// validating a received frame.
pub fn compute(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for &byte in data {
        crc ^= u16::from(byte);

        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Write the checksum of `buffer[..payload_len]` into the two bytes that
/// follow the payload, low byte first.
///
/// # Panics
///
/// Panics if `buffer` has fewer than `payload_len + 2` bytes.
pub fn append(buffer: &mut [u8], payload_len: usize) {
    let crc = compute(&buffer[..payload_len]);
    buffer[payload_len..payload_len + 2].copy_from_slice(&crc.to_le_bytes());
}

/// Read the trailing checksum of a frame (low byte first).
///
/// Returns `None` when the frame is too short to carry one.
pub fn trailing(frame: &[u8]) -> Option<u16> {
    match frame {
        [.., lo, hi] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// Check that the trailing two bytes of `frame` match the checksum of
/// everything before them.
pub fn verify(frame: &[u8]) -> bool {
    match trailing(frame) {
        Some(received) => compute(&frame[..frame.len() - 2]) == received,
        None => false,
    }
}

#[cfg(test)]
#[path = "crc_tests.rs"]
mod tests;
