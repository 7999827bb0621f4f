//! Length-prefixed JSON framing for bridge operations.
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ JSON BridgeOp            │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - **Maximum payload**: 64 MiB (large occupancy grids are the biggest messages)
//! - **Oversized length**: error, the caller closes the connection
//! - **Undecodable payload**: logged and skipped, the connection stays open
//! - **Read timeout before a frame starts**: not an error, lets the reader
//!   poll its shutdown flag

use std::io::{self, Read, Write};

use crate::error::{DrishtiError, Result};

use super::messages::BridgeOp;

/// Largest accepted payload in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Initial capacity of the reusable read buffer.
const INITIAL_BUFFER_CAPACITY: usize = 4096;

/// Serialize `op` into a complete frame (prefix + payload).
pub fn encode_frame(op: &BridgeOp) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(op)?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(DrishtiError::Protocol(format!(
            "Frame too large: {} bytes",
            payload.len()
        )));
    }
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Write one frame and flush.
pub fn write_frame<W: Write>(writer: &mut W, op: &BridgeOp) -> Result<()> {
    let frame = encode_frame(op)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

#[inline]
fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// Fill `buf` completely.
///
/// With `allow_idle`, a timeout before the first byte returns `Ok(false)`.
/// Once bytes have arrived, timeouts are ridden out so a frame is never torn.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8], allow_idle: bool) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => filled += n,
            Err(e) if is_timeout(&e) => {
                if filled == 0 && allow_idle {
                    return Ok(false);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

/// Frame decoder with a reusable payload buffer.
#[derive(Debug)]
pub struct FrameReader {
    buffer: Vec<u8>,
    skipped: u64,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
            skipped: 0,
        }
    }

    /// Read the next operation.
    ///
    /// `Ok(None)` on an idle timeout or an undecodable payload; `Err` when
    /// the stream is closed, broken or announces an oversized frame.
    pub fn read_frame<R: Read>(&mut self, reader: &mut R) -> Result<Option<BridgeOp>> {
        let mut len_buf = [0u8; 4];
        if !read_full(reader, &mut len_buf, true)? {
            return Ok(None);
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(DrishtiError::Protocol(format!(
                "Message too large: {} bytes",
                len
            )));
        }

        self.buffer.clear();
        self.buffer.resize(len, 0);
        read_full(reader, &mut self.buffer, false)?;

        match serde_json::from_slice(&self.buffer) {
            Ok(op) => Ok(Some(op)),
            Err(e) => {
                self.skipped += 1;
                tracing::warn!("Discarding undecodable frame ({} bytes): {}", len, e);
                Ok(None)
            }
        }
    }

    /// Frames dropped because their payload did not decode.
    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
