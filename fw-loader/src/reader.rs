// SPDX-License-Identifier: GPL-3.0-or-later

use fw_protocol::{parse_header, Endpoint, FrameError, FrameHeader, CMDLEN_MAXBYTES};
use log::warn;

/// Blocking byte transport to the host.
///
/// Reads block until the requested number of bytes has arrived. A
/// write failure is not observable in this execution environment, so
/// `write` is infallible by design.
pub trait Transport {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError>;
    fn write(&mut self, bytes: &[u8]);
}

/// The transport could not deliver the requested bytes. Always fatal
/// to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportError;

/// Why a command could not be assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Malformed frame header byte.
    Frame(FrameError),
    /// Frame addressed to another endpoint.
    Unaddressed,
    /// Underlying transport failed.
    Transport(TransportError),
}

/// One assembled command: decoded header plus the full, zero-padded
/// command buffer. `buf[0]` is the opcode.
#[derive(Debug)]
pub struct Command {
    pub hdr: FrameHeader,
    pub buf: [u8; CMDLEN_MAXBYTES],
}

impl Command {
    pub fn opcode(&self) -> u8 {
        self.buf[0]
    }
}

/// Assemble one command from the transport: one header byte, then
/// exactly as many payload bytes as the header's length class says.
pub fn read_command<T: Transport>(transport: &mut T) -> Result<Command, CommandError> {
    let mut hdr_byte = [0u8; 1];
    transport.read(&mut hdr_byte).map_err(CommandError::Transport)?;

    let hdr = match parse_header(hdr_byte[0]) {
        Ok(hdr) => hdr,
        Err(err) => {
            warn!("couldn't parse header byte {:#04x}: {:?}", hdr_byte[0], err);
            return Err(CommandError::Frame(err));
        }
    };

    // Fresh zeroed buffer for every command so a short command never
    // sees stale bytes from a longer predecessor.
    let mut buf = [0u8; CMDLEN_MAXBYTES];
    transport
        .read(&mut buf[..hdr.len.byte_len()])
        .map_err(CommandError::Transport)?;

    // The payload is drained before the endpoint check so a
    // misaddressed frame does not leave its bytes in the stream.
    if hdr.endpoint != Endpoint::Fw {
        warn!("frame for endpoint {:?}, not for us", hdr.endpoint);
        return Err(CommandError::Unaddressed);
    }

    Ok(Command { hdr, buf })
}
