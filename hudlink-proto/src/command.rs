use bytes::Bytes;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::error::ProtoError;
use crate::snapshot::VehicleSnapshot;

/// First payload byte of every MSGF frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum MsgCommand {
    /// A 26-byte vehicle snapshot body follows.
    Snapshot = 0x00,
    /// The device should reset; no body.
    Reboot = 0x01,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// A classified MSGF payload.
#[derive(Debug, Clone, PartialEq)]
pub enum MsgFrame {
    Snapshot(VehicleSnapshot),
    Reboot,
    Unknown { command: u8, body: Bytes },
}

impl MsgFrame {
    /// Classify an MSGF payload (command byte plus body).
    pub fn parse(payload: &[u8]) -> Result<Self, ProtoError> {
        let (&cmd, body) = payload.split_first().ok_or(ProtoError::EmptyPayload)?;
        match MsgCommand::from_primitive(cmd) {
            MsgCommand::Snapshot => Ok(MsgFrame::Snapshot(VehicleSnapshot::from_wire(body)?)),
            MsgCommand::Reboot => Ok(MsgFrame::Reboot),
            MsgCommand::Unknown(command) => Ok(MsgFrame::Unknown {
                command,
                body: Bytes::copy_from_slice(body),
            }),
        }
    }
}
