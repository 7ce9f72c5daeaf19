// SPDX-License-Identifier: GPL-3.0-or-later

//! Second-stage firmware loader core.
//!
//! Accepts framed commands from the host, stages an untrusted
//! application image into a fixed RAM window, digests it, reports the
//! digest, and hands control to the staged image. This is the only
//! gate between arbitrary host bytes and code execution with full
//! hardware privilege, so every boundary check here is a security
//! invariant.
//!
//! The crate is platform-agnostic: byte I/O comes in through
//! [`Transport`], the digest primitive through [`ImageDigest`], and
//! the two terminal operations (jump to the image, halt) through
//! [`Platform`]. The same library runs on the device, under the
//! simulator, and in the tests.

#![cfg_attr(not(test), no_std)]

pub mod consts;
mod context;
mod digest;
mod reader;
mod response;
mod state;


pub use context::Context;
pub use digest::{Blake2s, ImageDigest};
pub use reader::{read_command, Command, CommandError, Transport, TransportError};
pub use response::{send_response, Response};
pub use state::{transition, State};

use log::warn;

/// How a loader session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The image is fully staged and digested; control should be
    /// transferred to it.
    Run { app_size: u32, digest: [u8; 32] },
    /// A fatal protocol error; the device must halt.
    Fail,
}

/// Terminal capabilities of the platform. Neither operation returns:
/// `transfer_control` starts executing the staged image,
/// `halt` stops the CPU until external reset.
pub trait Platform {
    fn transfer_control(&mut self, app_size: u32, digest: &[u8; 32]) -> !;
    fn halt(&mut self) -> !;
}

/// The driver: owns the transport, the staging window, and the state
/// machine, and feeds it one decoded command per iteration.
pub struct Loader<'a, T, D> {
    transport: T,
    hasher: D,
    staging: &'a mut [u8],
    state: State,
    ctx: Context,
}

impl<'a, T: Transport, D: ImageDigest> Loader<'a, T, D> {
    /// A new loader in the initial state. `staging` is the fixed RAM
    /// window the image is copied into; its length is the maximum
    /// accepted application size.
    pub fn new(transport: T, hasher: D, staging: &'a mut [u8]) -> Self {
        Self {
            transport,
            hasher,
            staging,
            state: State::Initial,
            ctx: Context::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// One driver iteration: at most one blocking read and one
    /// blocking write. In a terminal state this is a no-op.
    pub fn step(&mut self) -> State {
        match self.state {
            State::Initial | State::Loading => {}
            terminal => return terminal,
        }

        let cmd = match read_command(&mut self.transport) {
            Ok(cmd) => cmd,
            Err(err) => {
                warn!("command read failed: {:?}", err);
                self.state = State::Fail;
                return self.state;
            }
        };

        let (next, rsp) = transition(
            self.state,
            &cmd,
            &mut self.ctx,
            &mut *self.staging,
            &self.hasher,
        );
        if let Some(rsp) = rsp {
            send_response(&mut self.transport, &cmd.hdr, &rsp);
        }

        self.state = next;
        self.state
    }

    /// Drive the loop until it reaches a terminal state. The caller
    /// must not re-enter command processing afterwards.
    pub fn run_to_exit(mut self) -> Exit {
        loop {
            match self.step() {
                State::Run => {
                    return Exit::Run {
                        app_size: self.ctx.app_size,
                        digest: self.ctx.digest,
                    }
                }
                State::Fail => return Exit::Fail,
                State::Initial | State::Loading => {}
            }
        }
    }
}

/// Run a whole loader session and end it through the platform's
/// terminal capability. Never returns.
pub fn serve<T, D, P>(loader: Loader<'_, T, D>, platform: &mut P) -> !
where
    T: Transport,
    D: ImageDigest,
    P: Platform,
{
    match loader.run_to_exit() {
        Exit::Run { app_size, digest } => platform.transfer_control(app_size, &digest),
        Exit::Fail => platform.halt(),
    }
}
