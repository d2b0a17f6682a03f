//! Length-prefixed message framing.

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use widecol_common::{StoreError, StoreResult};

/// Size of the length header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest payload accepted on either side (16 MiB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Encodes a message into a complete frame.
pub fn encode<T: Serialize>(message: &T) -> StoreResult<Bytes> {
    let payload = serde_json::to_vec(message)
        .map_err(|e| StoreError::protocol(format!("failed to encode message: {e}")))?;

    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(StoreError::protocol(format!(
            "message of {} bytes exceeds limit of {MAX_MESSAGE_SIZE}",
            payload.len()
        )));
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(&payload);
    Ok(buf.freeze())
}

/// Reads the payload length from a header.
pub fn payload_len(header: [u8; HEADER_SIZE]) -> StoreResult<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(StoreError::protocol(format!(
            "frame of {len} bytes exceeds limit of {MAX_MESSAGE_SIZE}"
        )));
    }
    Ok(len)
}

/// Returns the size of the first complete frame in `buf`, header included.
///
/// `Ok(None)` means more bytes are needed.
pub fn frame_size(buf: &[u8]) -> StoreResult<Option<usize>> {
    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }
    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&buf[..HEADER_SIZE]);
    let total = HEADER_SIZE + payload_len(header)?;
    Ok((buf.len() >= total).then_some(total))
}

/// Decodes a complete frame, header included.
pub fn decode<T: DeserializeOwned>(frame: Bytes) -> StoreResult<T> {
    if frame.len() < HEADER_SIZE {
        return Err(StoreError::protocol("truncated frame header"));
    }
    decode_payload(&frame[HEADER_SIZE..])
}

/// Decodes a payload without its header.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(payload)
        .map_err(|e| StoreError::protocol(format!("failed to decode message: {e}")))
}
