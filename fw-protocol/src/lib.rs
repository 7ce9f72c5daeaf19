// SPDX-License-Identifier: GPL-3.0-or-later

//! Firmware command protocol between the loader and the host.
//!
//! Every frame starts with a single header byte followed by a fixed
//! number of payload bytes given by the header's length class. The
//! first payload byte of a command is the opcode, the first payload
//! byte of a response is the response code. Both ends of the link
//! share this crate.
//!
//! Header byte layout:
//!
//! ```text
//! bit 7      frame protocol version, must be 0
//! bits 6..5  frame id
//! bits 4..3  endpoint
//! bit 2      reserved in commands (must be 0), status flag in responses
//! bits 1..0  length class
//! ```

#![cfg_attr(not(test), no_std)]

#[cfg(test)]
mod tests;

/// Largest payload a frame can carry, in bytes.
pub const CMDLEN_MAXBYTES: usize = 128;

/// Status byte embedded at payload offset 0 of most responses.
pub const STATUS_OK: u8 = 0;
/// Non-zero means "not OK"; hosts must not rely on the exact value.
pub const STATUS_BAD: u8 = 1;

/// The fixed set of payload sizes a frame may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CmdLen {
    Bytes1 = 0,
    Bytes4 = 1,
    Bytes32 = 2,
    Bytes128 = 3,
}

impl CmdLen {
    /// Number of payload bytes this length class stands for.
    pub const fn byte_len(self) -> usize {
        match self {
            CmdLen::Bytes1 => 1,
            CmdLen::Bytes4 => 4,
            CmdLen::Bytes32 => 32,
            CmdLen::Bytes128 => 128,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => CmdLen::Bytes1,
            1 => CmdLen::Bytes4,
            2 => CmdLen::Bytes32,
            _ => CmdLen::Bytes128,
        }
    }
}

/// Logical destination of a frame on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Endpoint {
    /// Interface hardware.
    HwIf = 0,
    /// Application hardware.
    HwApp = 1,
    /// This firmware.
    Fw = 2,
    /// The loaded application.
    App = 3,
}

impl Endpoint {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Endpoint::HwIf,
            1 => Endpoint::HwApp,
            2 => Endpoint::Fw,
            _ => Endpoint::App,
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    /// Frame id, echoed back in the response so the host can
    /// correlate it with its command.
    pub id: u8,
    pub endpoint: Endpoint,
    pub len: CmdLen,
}

/// Frame header parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Version bit was set.
    BadVersion,
    /// Reserved bit was set.
    BadReserved,
}

/// Parse one command header byte.
pub fn parse_header(byte: u8) -> Result<FrameHeader, FrameError> {
    if byte & 0x80 != 0 {
        return Err(FrameError::BadVersion);
    }
    if byte & 0x04 != 0 {
        return Err(FrameError::BadReserved);
    }

    Ok(FrameHeader {
        id: (byte >> 5) & 0b11,
        endpoint: Endpoint::from_bits(byte >> 3),
        len: CmdLen::from_bits(byte),
    })
}

/// Generate a header byte. `nok` is the response status flag; it is
/// always false for commands.
pub fn gen_header(id: u8, endpoint: Endpoint, nok: bool, len: CmdLen) -> u8 {
    (id & 0b11) << 5 | (endpoint as u8) << 3 | (nok as u8) << 2 | len as u8
}

/// Commands the host may send to the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FwCmd {
    NameVersion = 0x01,
    LoadApp = 0x03,
    LoadAppData = 0x05,
    GetUdi = 0x08,
}

impl FwCmd {
    /// Payload length class this command must be framed with.
    pub const fn cmdlen(self) -> CmdLen {
        match self {
            FwCmd::NameVersion => CmdLen::Bytes1,
            FwCmd::LoadApp => CmdLen::Bytes128,
            FwCmd::LoadAppData => CmdLen::Bytes128,
            FwCmd::GetUdi => CmdLen::Bytes32,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FwCmd::NameVersion),
            0x03 => Some(FwCmd::LoadApp),
            0x05 => Some(FwCmd::LoadAppData),
            0x08 => Some(FwCmd::GetUdi),
            _ => None,
        }
    }
}

/// Responses the firmware sends back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FwRsp {
    NameVersion = 0x02,
    LoadApp = 0x04,
    LoadAppData = 0x06,
    LoadAppDataReady = 0x07,
    GetUdi = 0x09,
}

impl FwRsp {
    /// Length class covering the response code byte plus its payload.
    pub const fn cmdlen(self) -> CmdLen {
        match self {
            FwRsp::NameVersion => CmdLen::Bytes32,
            FwRsp::LoadApp => CmdLen::Bytes4,
            FwRsp::LoadAppData => CmdLen::Bytes4,
            FwRsp::LoadAppDataReady => CmdLen::Bytes128,
            FwRsp::GetUdi => CmdLen::Bytes32,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x02 => Some(FwRsp::NameVersion),
            0x04 => Some(FwRsp::LoadApp),
            0x06 => Some(FwRsp::LoadAppData),
            0x07 => Some(FwRsp::LoadAppDataReady),
            0x09 => Some(FwRsp::GetUdi),
            _ => None,
        }
    }
}
