//! Frame transport buffer for the gateway's Modbus-like framing.
//!
//! On the wire each message looks close to normal Modbus TCP, with an
//! 8-byte header followed by the PDU:
//!
//! ```text
//!     [_tid_][_pid_][_len_][_uid_][_fid_] [_____________PDU_____________]
//!       2b     2b     2b     1b     1b              (len - 2)b
//! ```
//!
//! The gateway's quirks: `tid` is always `0x5959`/`"YY"`, `pid` is always
//! `0x0001`, `uid` is always `0x01` and `fid` is always `0x02` no matter
//! which operation is actually requested (the real function code sits inside
//! the PDU). The header fields therefore carry no addressing information and
//! act purely as sentinels, which makes them the only corruption signal
//! available. The `len` field over-counts by 2 relative to the bytes that
//! actually follow the header; that correction is folded into
//! [`Framer::is_complete`] and [`Framer::advance`] so the off-by-two never
//! leaks anywhere else.

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::FrameError;

/// Fixed size of the sentinel header.
pub const HEADER_SIZE: usize = 8;

const TRANSACTION_ID: u16 = 0x5959;
const PROTOCOL_ID: u16 = 0x0001;
const UNIT_ID: u8 = 0x01;
const OUTER_FUNCTION_CODE: u8 = 0x02;

/// Accumulates raw transport bytes and yields one application frame at a
/// time. One framer owns one inbound stream; it performs no I/O itself.
pub struct Framer {
    buffer: BytesMut,
    declared: usize,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer {
    pub fn new() -> Self {
        Framer {
            buffer: BytesMut::with_capacity(256),
            declared: 0,
        }
    }

    /// Append incoming transport bytes to the processing buffer.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// True once enough bytes are buffered to read a frame header.
    pub fn is_header_ready(&self) -> bool {
        self.buffer.len() >= HEADER_SIZE
    }

    /// Parse the header at the front of the buffer and perform the sentinel
    /// sanity checks. Callers must check [`Framer::is_header_ready`] first.
    /// On success the declared length is cached and returned.
    /// On any sentinel mismatch the whole buffer is cleared: the sentinels
    /// are the only recovery signal there is, so a mismatch means nothing in
    /// the buffer can be trusted.
    pub fn validate_and_measure(&mut self) -> Result<usize, FrameError> {
        let head = &self.buffer[..HEADER_SIZE];
        debug!("extracting MBAP header from {}", hex::encode(head));
        let tid = u16::from_be_bytes([head[0], head[1]]);
        let pid = u16::from_be_bytes([head[2], head[3]]);
        let declared = u16::from_be_bytes([head[4], head[5]]) as usize;
        let uid = head[6];
        let fid = head[7];

        if tid != TRANSACTION_ID || pid != PROTOCOL_ID || uid != UNIT_ID || fid != OUTER_FUNCTION_CODE
        {
            self.reset();
            return Err(FrameError::Corruption { tid, pid, uid, fid });
        }

        self.declared = declared;
        Ok(declared)
    }

    /// True once the buffer holds the whole frame the cached header
    /// declared. The declared length over-counts by 2, hence the
    /// subtraction.
    pub fn is_complete(&self) -> bool {
        self.declared >= 2 && self.buffer.len() >= HEADER_SIZE + self.declared - 2
    }

    /// The PDU bytes of the frame at the front of the buffer. Does not
    /// consume anything; call [`Framer::advance`] afterwards.
    pub fn extract_payload(&self) -> &[u8] {
        &self.buffer[HEADER_SIZE..HEADER_SIZE + self.declared - 2]
    }

    /// Pop the front-most frame off the buffer and forget its length.
    pub fn advance(&mut self) {
        let length = (HEADER_SIZE + self.declared)
            .saturating_sub(2)
            .min(self.buffer.len());
        self.buffer.advance(length);
        debug!("buffer is now {} bytes", self.buffer.len());
        self.declared = 0;
    }

    /// Drop the entire buffer (used on corruption).
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.declared = 0;
    }

    /// Wrap an encoded PDU with the constant sentinel header, producing a
    /// complete transmittable packet.
    pub fn build_outgoing(pdu: &[u8]) -> Vec<u8> {
        let mut packet = Vec::with_capacity(HEADER_SIZE + pdu.len());
        packet.extend_from_slice(&TRANSACTION_ID.to_be_bytes());
        packet.extend_from_slice(&PROTOCOL_ID.to_be_bytes());
        packet.extend_from_slice(&((pdu.len() + 2) as u16).to_be_bytes());
        packet.push(UNIT_ID);
        packet.push(OUTER_FUNCTION_CODE);
        packet.extend_from_slice(pdu);
        packet
    }

    /// Feed a chunk from the transport and drain every complete frame it
    /// makes available, in arrival order.
    ///
    /// For each complete frame the PDU bytes are handed to `decode`, the
    /// frame is popped, and the decoded message is handed to `on_message`.
    /// Returns once the buffer can no longer yield a complete frame, which
    /// handles both coalesced deliveries (several frames in one chunk) and
    /// fragmented ones (partial frames stay buffered until more bytes
    /// arrive).
    ///
    /// Corruption and short frames are dealt with here — buffer reset or
    /// frame skip plus a warning — and never propagate. A decode failure
    /// pops the offending frame first, so the framer stays usable, then
    /// surfaces the error to the caller.
    pub fn process_stream<M, E, D, C>(
        &mut self,
        data: &[u8],
        mut decode: D,
        mut on_message: C,
    ) -> Result<(), E>
    where
        D: FnMut(&[u8]) -> Result<M, E>,
        C: FnMut(M),
    {
        debug!("processing {} bytes: {}", data.len(), hex::encode(data));
        self.feed(data);
        loop {
            if !self.is_header_ready() {
                return Ok(());
            }
            let declared = match self.validate_and_measure() {
                Ok(declared) => declared,
                Err(err) => {
                    // Buffer has already been cleared; nothing left to salvage.
                    warn!("frame check failed, dropping buffer: {err}");
                    return Ok(());
                }
            };
            // this short a message should not be possible?
            if declared < 2 {
                warn!("unexpected short message length {declared}, advancing frame");
                self.advance();
                continue;
            }
            if !self.is_complete() {
                return Ok(());
            }
            let message = match decode(self.extract_payload()) {
                Ok(message) => message,
                Err(err) => {
                    self.advance();
                    return Err(err);
                }
            };
            self.advance();
            on_message(message);
        }
    }
}
