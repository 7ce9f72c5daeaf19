// SPDX-License-Identifier: GPL-3.0-or-later

use fw_protocol::{gen_header, FrameHeader, FwRsp, CMDLEN_MAXBYTES};

use crate::reader::Transport;

/// A firmware response: code plus a fixed, zero-padded payload. The
/// number of payload bytes actually sent is `code.cmdlen() - 1`, from
/// the static per-code length table.
pub struct Response {
    pub code: FwRsp,
    pub data: [u8; CMDLEN_MAXBYTES - 1],
}

impl Response {
    pub fn new(code: FwRsp) -> Self {
        Self {
            code,
            data: [0; CMDLEN_MAXBYTES - 1],
        }
    }
}

/// Emit one response frame, correlated with the command header it
/// answers: header byte, response code byte, then the payload padded
/// to the response's length class.
pub fn send_response<T: Transport>(transport: &mut T, hdr: &FrameHeader, rsp: &Response) {
    let len = rsp.code.cmdlen();

    transport.write(&[gen_header(hdr.id, hdr.endpoint, false, len)]);
    transport.write(&[rsp.code as u8]);
    transport.write(&rsp.data[..len.byte_len() - 1]);
}
