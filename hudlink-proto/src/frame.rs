use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::command::MsgCommand;
use crate::constants::{FRAME_HEADER_SIZE, MAGIC_IMGF, MAGIC_MSGF, SNAPSHOT_PAYLOAD_SIZE};
use crate::error::ProtoError;
use crate::snapshot::{SnapshotBodyRaw, VehicleSnapshot};

/// On-wire frame header, fixed 20 bytes, all fields little-endian.
///
/// `frame_type`, `flags` and `rsv` are reserved and always zero today.
/// `crc32` is IEEE CRC-32 over the payload, or zero when CRC is disabled;
/// `seq` increases monotonically per sender.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned,
)]
#[repr(C)]
pub struct FrameHeader {
    pub magic: U32,
    pub frame_type: u8,
    pub flags: u8,
    pub rsv: U16,
    pub len: U32,
    pub crc32: U32,
    pub seq: U32,
}

impl FrameHeader {
    pub fn new(magic: u32, len: u32, crc32: u32, seq: u32) -> Self {
        Self {
            magic: U32::new(magic),
            frame_type: 0,
            flags: 0,
            rsv: U16::new(0),
            len: U32::new(len),
            crc32: U32::new(crc32),
            seq: U32::new(seq),
        }
    }

    /// Parse a header from the first 20 bytes of `bytes`.
    pub fn read_from(bytes: &[u8]) -> Result<Self, ProtoError> {
        let header = Self::ref_from_bytes(bytes.get(..FRAME_HEADER_SIZE).ok_or(
            ProtoError::Truncated {
                expected: FRAME_HEADER_SIZE,
                actual: bytes.len(),
            },
        )?)
        .map_err(|_| ProtoError::Truncated {
            expected: FRAME_HEADER_SIZE,
            actual: bytes.len(),
        })?;
        Ok(*header)
    }

    /// Whether `magic` names one of the defined channels.
    pub fn is_known_magic(magic: u32) -> bool {
        magic == MAGIC_MSGF || magic == MAGIC_IMGF
    }
}

impl From<[u8; FRAME_HEADER_SIZE]> for FrameHeader {
    fn from(bytes: [u8; FRAME_HEADER_SIZE]) -> Self {
        zerocopy::transmute!(bytes)
    }
}

/// A decoded frame: parsed header plus its payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

impl Frame {
    pub fn magic(&self) -> u32 {
        self.header.magic.get()
    }

    pub fn seq(&self) -> u32 {
        self.header.seq.get()
    }

    /// Check the header CRC against the payload.
    pub fn verify_crc(&self) -> Result<(), ProtoError> {
        let computed = crc32fast::hash(&self.payload);
        let header = self.header.crc32.get();
        if header != computed {
            return Err(ProtoError::CrcMismatch { header, computed });
        }
        Ok(())
    }
}

impl TryFrom<Bytes> for Frame {
    type Error = ProtoError;

    fn try_from(mut bytes: Bytes) -> Result<Self, Self::Error> {
        let header = FrameHeader::read_from(&bytes)?;
        let _ = bytes.split_to(FRAME_HEADER_SIZE);
        let len = header.len.get() as usize;
        if bytes.len() < len {
            return Err(ProtoError::LengthMismatch {
                header: len,
                actual: bytes.len(),
            });
        }
        let payload = bytes.split_to(len);
        Ok(Frame { header, payload })
    }
}

/// Encode a complete frame: 20-byte header followed by `payload` verbatim.
///
/// With `enable_crc` the header carries the IEEE CRC-32 of the payload,
/// otherwise zero.
pub fn encode_frame(magic: u32, payload: &[u8], seq: u32, enable_crc: bool) -> Bytes {
    let crc32 = if enable_crc {
        crc32fast::hash(payload)
    } else {
        0
    };
    let header = FrameHeader::new(magic, payload.len() as u32, crc32, seq);
    let mut out = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    out.put_slice(header.as_bytes());
    out.put_slice(payload);
    out.freeze()
}

/// Encode an MSGF snapshot frame (command byte 0x00 plus the 26-byte body).
pub fn encode_msg_snapshot(snapshot: &VehicleSnapshot, seq: u32, enable_crc: bool) -> Bytes {
    let mut payload = [0u8; SNAPSHOT_PAYLOAD_SIZE];
    payload[0] = MsgCommand::Snapshot.into();
    let raw = SnapshotBodyRaw::from(snapshot);
    payload[1..].copy_from_slice(raw.as_bytes());
    encode_frame(MAGIC_MSGF, &payload, seq, enable_crc)
}

/// Encode a body-less MSGF command frame such as [`MsgCommand::Reboot`].
pub fn encode_msg_command(command: MsgCommand, seq: u32, enable_crc: bool) -> Bytes {
    let payload = [u8::from(command)];
    encode_frame(MAGIC_MSGF, &payload, seq, enable_crc)
}

/// Encode an IMGF frame carrying raw PNG bytes.
pub fn encode_img_png(png: &[u8], seq: u32, enable_crc: bool) -> Bytes {
    encode_frame(MAGIC_IMGF, png, seq, enable_crc)
}
