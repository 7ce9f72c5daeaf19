// SPDX-License-Identifier: GPL-3.0-or-later

//! Runs the loader core over a TCP socket with a heap staging window,
//! so the host client can be exercised end-to-end without hardware.
//! Transfer of control and halt map to the process exit status.

use std::error::Error;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::process;

use clap::Parser;
use fw_loader::{serve, Blake2s, Loader, Platform, Transport, TransportError};
use log::{error, info};

#[derive(Debug, Parser)]
#[command(about = "Host the firmware loader over a TCP socket")]
struct Args {
    /// Address to listen on.
    #[arg(short, long, default_value_t = String::from("127.0.0.1:4444"))]
    listen: String,
    /// Staging window size: the maximum loadable application size.
    #[arg(short, long, default_value_t = 0x20000)]
    max_app_size: usize,
}

struct TcpTransport(TcpStream);

impl Transport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.0.read_exact(buf).map_err(|_| TransportError)
    }

    fn write(&mut self, bytes: &[u8]) {
        // Write failures are indistinguishable from success on the
        // real device, so they are swallowed here too.
        let _ = self.0.write_all(bytes);
        let _ = self.0.flush();
    }
}

struct SimPlatform;

impl Platform for SimPlatform {
    fn transfer_control(&mut self, app_size: u32, digest: &[u8; 32]) -> ! {
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        info!("would jump to staged app: {app_size} bytes, digest {hex}");
        println!("RUN {app_size} {hex}");
        process::exit(0);
    }

    fn halt(&mut self) -> ! {
        error!("loader failed, halting");
        process::exit(1);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let args = Args::parse();

    let listener = std::net::TcpListener::bind(&args.listen)?;
    info!("listening on {}", args.listen);

    let (stream, peer) = listener.accept()?;
    info!("host connected from {peer}");

    let mut staging = vec![0u8; args.max_app_size];
    let loader = Loader::new(TcpTransport(stream), Blake2s, &mut staging);

    serve(loader, &mut SimPlatform)
}
