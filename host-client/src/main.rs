// SPDX-License-Identifier: GPL-3.0-or-later

//! Host-side counterpart of the firmware loader: speaks the frame
//! protocol over a serial port (or TCP, for the simulator), streams
//! an application image in 127-byte chunks, and cross-checks the
//! digest the device reports against a locally computed one.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use blake2::{Blake2s256, Digest};
use clap::{Parser, Subcommand};
use fw_protocol::{
    gen_header, parse_header, Endpoint, FwCmd, FwRsp, CMDLEN_MAXBYTES, STATUS_OK,
};
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_serial::SerialPortBuilderExt;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(about = "Load an application binary onto the device and start it")]
struct Args {
    /// List available serial ports and exit.
    #[arg(short, long)]
    list_ports: bool,
    /// Serial port device path.
    #[arg(short, long, default_value_t = String::from("/dev/ttyUSB0"))]
    port: String,
    /// Serial port speed in bits per second.
    #[arg(short, long, default_value_t = 62500)]
    baudrate: u32,
    /// Connect over TCP (host:port) instead of a serial port, e.g. to
    /// a running device-sim.
    #[arg(short, long)]
    tcp: Option<String>,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Query the firmware name and version.
    NameVersion,
    /// Load an application image and hand control to it.
    Load { file: PathBuf },
}

struct Client<S> {
    stream: S,
    id: u8,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    fn new(stream: S) -> Self {
        Self { stream, id: 0 }
    }

    /// Send one command frame, opcode plus body zero-padded to the
    /// opcode's length class. Returns the frame id for correlation.
    async fn send_command(&mut self, cmd: FwCmd, body: &[u8]) -> Result<u8, Box<dyn Error>> {
        // Two-bit frame id, cycled per command.
        self.id = (self.id + 1) & 0b11;

        let len = cmd.cmdlen();
        assert!(body.len() < len.byte_len());

        let mut frame = vec![gen_header(self.id, Endpoint::Fw, false, len)];
        let mut payload = vec![0u8; len.byte_len()];
        payload[0] = cmd as u8;
        payload[1..1 + body.len()].copy_from_slice(body);
        frame.extend_from_slice(&payload);

        debug!("sending {:?}, {} bytes on the wire", cmd, frame.len());
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        Ok(self.id)
    }

    /// Read one response frame and check it is the expected code,
    /// correlated with `id`. Returns the payload after the code byte.
    async fn read_response(&mut self, expect: FwRsp, id: u8) -> Result<Vec<u8>, Box<dyn Error>> {
        let mut hdr_byte = [0u8; 1];
        tokio::time::timeout(RESPONSE_TIMEOUT, self.stream.read_exact(&mut hdr_byte)).await??;

        let hdr =
            parse_header(hdr_byte[0]).map_err(|err| format!("bad response header: {err:?}"))?;
        let mut payload = vec![0u8; hdr.len.byte_len()];
        tokio::time::timeout(RESPONSE_TIMEOUT, self.stream.read_exact(&mut payload)).await??;

        if hdr.id != id {
            return Err(format!("response id {} does not match command id {id}", hdr.id).into());
        }
        if payload[0] != expect as u8 {
            return Err(format!(
                "expected response {expect:?} ({:#04x}), got {:#04x}",
                expect as u8, payload[0]
            )
            .into());
        }

        Ok(payload[1..].to_vec())
    }

    async fn name_version(&mut self) -> Result<(String, String, u32), Box<dyn Error>> {
        let id = self.send_command(FwCmd::NameVersion, &[]).await?;
        let data = self.read_response(FwRsp::NameVersion, id).await?;

        let name0 = String::from_utf8_lossy(&data[0..4]).into_owned();
        let name1 = String::from_utf8_lossy(&data[4..8]).into_owned();
        let version = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);

        Ok((name0, name1, version))
    }

    /// Stream the whole image. Returns the digest the device reports
    /// once everything is staged.
    async fn load_app(&mut self, app: &[u8]) -> Result<[u8; 32], Box<dyn Error>> {
        let size: u32 = app.len().try_into()?;

        let id = self.send_command(FwCmd::LoadApp, &size.to_le_bytes()).await?;
        let data = self.read_response(FwRsp::LoadApp, id).await?;
        if data[0] != STATUS_OK {
            return Err(format!("device rejected app size {size}").into());
        }

        let chunks = app.chunks(CMDLEN_MAXBYTES - 1);
        let total = chunks.len();
        for (idx, chunk) in chunks.enumerate() {
            let id = self.send_command(FwCmd::LoadAppData, chunk).await?;

            if idx + 1 < total {
                let data = self.read_response(FwRsp::LoadAppData, id).await?;
                if data[0] != STATUS_OK {
                    return Err(format!("device rejected data chunk {idx}").into());
                }
                debug!("chunk {}/{} acknowledged", idx + 1, total);
            } else {
                let data = self.read_response(FwRsp::LoadAppDataReady, id).await?;
                if data[0] != STATUS_OK {
                    return Err("device rejected final data chunk".into());
                }
                let mut digest = [0u8; 32];
                digest.copy_from_slice(&data[1..33]);
                return Ok(digest);
            }
        }

        Err("empty application image".into())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

async fn run<S: AsyncRead + AsyncWrite + Unpin>(
    stream: S,
    cmd: Cmd,
) -> Result<(), Box<dyn Error>> {
    let mut client = Client::new(stream);

    match cmd {
        Cmd::NameVersion => {
            let (name0, name1, version) = client.name_version().await?;
            println!("Firmware name0:'{name0}' name1:'{name1}' version:{version}");
        }
        Cmd::Load { file } => {
            let app = std::fs::read(&file)?;
            if app.starts_with(b"\x7fELF") {
                return Err(format!(
                    "{} looks like an ELF executable, but a raw binary is expected",
                    file.display()
                )
                .into());
            }

            // If this fails the device is likely not in loader mode.
            let (name0, name1, version) = client.name_version().await?;
            info!("Firmware name0:'{name0}' name1:'{name1}' version:{version}");

            info!("Loading {} bytes from {}", app.len(), file.display());
            let device_digest = client.load_app(&app).await?;

            let local_digest: [u8; 32] = Blake2s256::digest(&app).into();
            if device_digest != local_digest {
                return Err(format!(
                    "digest mismatch: device reported {}, expected {}",
                    hex(&device_digest),
                    hex(&local_digest)
                )
                .into());
            }

            println!("Loaded {} bytes, app is starting", app.len());
            println!("Digest: {}", hex(&device_digest));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init();

    let args = Args::parse();

    if args.list_ports {
        println!("List of available serial ports:");
        for port in tokio_serial::available_ports()? {
            println!("- {}", port.port_name);
        }
        return Ok(());
    }

    let Some(cmd) = args.cmd else {
        return Err("pass a command, see --help".into());
    };

    match args.tcp {
        Some(addr) => run(TcpStream::connect(&addr).await?, cmd).await,
        None => {
            let serial = tokio_serial::new(&args.port, args.baudrate).open_native_async()?;
            run(serial, cmd).await
        }
    }
}
