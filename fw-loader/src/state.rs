// SPDX-License-Identifier: GPL-3.0-or-later

use fw_protocol::{FwCmd, FwRsp, CMDLEN_MAXBYTES, STATUS_BAD, STATUS_OK};
use log::{debug, warn};

use crate::consts::{FW_NAME0, FW_NAME1, FW_VERSION};
use crate::context::Context;
use crate::digest::ImageDigest;
use crate::reader::Command;
use crate::response::Response;

/// Loader state. `Run` and `Fail` are terminal: `Run` hands the CPU
/// to the staged image, `Fail` halts the device until external reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initial,
    Loading,
    Run,
    Fail,
}

/// Process one command: pure in `(state, command)`, with all staging
/// side effects routed through `ctx` and the staging window. Returns
/// the next state and the response to emit, if any. A fatal command
/// never gets a response.
pub fn transition<D: ImageDigest>(
    state: State,
    cmd: &Command,
    ctx: &mut Context,
    staging: &mut [u8],
    hasher: &D,
) -> (State, Option<Response>) {
    match state {
        State::Initial => initial_commands(cmd, ctx, staging),
        State::Loading => loading_commands(cmd, ctx, staging, hasher),
        // Terminal. The driver never feeds commands to these.
        State::Run | State::Fail => (state, None),
    }
}

fn initial_commands(
    cmd: &Command,
    ctx: &mut Context,
    staging: &mut [u8],
) -> (State, Option<Response>) {
    match FwCmd::from_byte(cmd.opcode()) {
        Some(FwCmd::NameVersion) => {
            debug!("cmd: name-version");
            if cmd.hdr.len != FwCmd::NameVersion.cmdlen() {
                return (State::Fail, None);
            }

            let mut rsp = Response::new(FwRsp::NameVersion);
            rsp.data[0..4].copy_from_slice(FW_NAME0);
            rsp.data[4..8].copy_from_slice(FW_NAME1);
            rsp.data[8..12].copy_from_slice(&FW_VERSION.to_le_bytes());

            (State::Initial, Some(rsp))
        }

        Some(FwCmd::LoadApp) => {
            debug!("cmd: load-app");
            if cmd.hdr.len != FwCmd::LoadApp.cmdlen() {
                return (State::Fail, None);
            }

            let size = u32::from_le_bytes([cmd.buf[1], cmd.buf[2], cmd.buf[3], cmd.buf[4]]);
            debug!("app size: {}", size);

            let mut rsp = Response::new(FwRsp::LoadApp);
            if size == 0 || size as usize > staging.len() {
                // Recoverable: the host may retry with a valid size.
                rsp.data[0] = STATUS_BAD;
                return (State::Initial, Some(rsp));
            }

            ctx.begin_load(size);
            rsp.data[0] = STATUS_OK;

            (State::Loading, Some(rsp))
        }

        // GET_UDI is in the opcode table but has no handler yet, so
        // it falls through to the fatal path with everything else.
        Some(FwCmd::LoadAppData) | Some(FwCmd::GetUdi) | None => {
            warn!("unknown firmware cmd in initial state: {:#04x}", cmd.opcode());
            (State::Fail, None)
        }
    }
}

fn loading_commands<D: ImageDigest>(
    cmd: &Command,
    ctx: &mut Context,
    staging: &mut [u8],
    hasher: &D,
) -> (State, Option<Response>) {
    match FwCmd::from_byte(cmd.opcode()) {
        Some(FwCmd::LoadAppData) => {
            debug!("cmd: load-app-data");
            if cmd.hdr.len != FwCmd::LoadAppData.cmdlen() {
                return (State::Fail, None);
            }

            // Byte 0 is the opcode; up to 127 data bytes follow.
            let nbytes = usize::min(CMDLEN_MAXBYTES - 1, ctx.left as usize);
            staging[ctx.load_cursor..ctx.load_cursor + nbytes]
                .copy_from_slice(&cmd.buf[1..1 + nbytes]);
            ctx.load_cursor += nbytes;
            ctx.left -= nbytes as u32;

            if ctx.left == 0 {
                debug!("fully loaded {} bytes", ctx.app_size);

                ctx.digest = hasher.digest(&staging[..ctx.app_size as usize]);

                // Final response carries the digest the host can
                // compare against what it sent.
                let mut rsp = Response::new(FwRsp::LoadAppDataReady);
                rsp.data[0] = STATUS_OK;
                rsp.data[1..33].copy_from_slice(&ctx.digest);

                return (State::Run, Some(rsp));
            }

            let mut rsp = Response::new(FwRsp::LoadAppData);
            rsp.data[0] = STATUS_OK;

            (State::Loading, Some(rsp))
        }

        Some(FwCmd::NameVersion) | Some(FwCmd::LoadApp) | Some(FwCmd::GetUdi) | None => {
            warn!("unknown firmware cmd in loading state: {:#04x}", cmd.opcode());
            (State::Fail, None)
        }
    }
}
