use super::*;

#[test]
fn header_roundtrip() {
    for id in 0..4u8 {
        for endpoint in [Endpoint::HwIf, Endpoint::HwApp, Endpoint::Fw, Endpoint::App] {
            for len in [CmdLen::Bytes1, CmdLen::Bytes4, CmdLen::Bytes32, CmdLen::Bytes128] {
                let byte = gen_header(id, endpoint, false, len);
                let hdr = parse_header(byte).unwrap();
                assert_eq!(hdr.id, id);
                assert_eq!(hdr.endpoint, endpoint);
                assert_eq!(hdr.len, len);
            }
        }
    }
}

#[test]
fn header_rejects_version_bit() {
    assert_eq!(parse_header(0x80), Err(FrameError::BadVersion));
    assert_eq!(parse_header(0xff), Err(FrameError::BadVersion));
}

#[test]
fn header_rejects_reserved_bit() {
    assert_eq!(parse_header(0x04), Err(FrameError::BadReserved));
    // The status flag is only valid in responses, never in commands.
    let nok = gen_header(1, Endpoint::Fw, true, CmdLen::Bytes4);
    assert_eq!(parse_header(nok), Err(FrameError::BadReserved));
}

#[test]
fn length_classes() {
    assert_eq!(CmdLen::Bytes1.byte_len(), 1);
    assert_eq!(CmdLen::Bytes4.byte_len(), 4);
    assert_eq!(CmdLen::Bytes32.byte_len(), 32);
    assert_eq!(CmdLen::Bytes128.byte_len(), 128);
}

#[test]
fn opcode_values() {
    assert_eq!(FwCmd::from_byte(0x01), Some(FwCmd::NameVersion));
    assert_eq!(FwCmd::from_byte(0x03), Some(FwCmd::LoadApp));
    assert_eq!(FwCmd::from_byte(0x05), Some(FwCmd::LoadAppData));
    assert_eq!(FwCmd::from_byte(0x08), Some(FwCmd::GetUdi));
    assert_eq!(FwCmd::from_byte(0x02), None);
    assert_eq!(FwCmd::from_byte(0xff), None);

    assert_eq!(FwRsp::from_byte(0x07), Some(FwRsp::LoadAppDataReady));
    assert_eq!(FwRsp::from_byte(0x01), None);
}

#[test]
fn response_length_table() {
    assert_eq!(FwRsp::NameVersion.cmdlen(), CmdLen::Bytes32);
    assert_eq!(FwRsp::LoadApp.cmdlen(), CmdLen::Bytes4);
    assert_eq!(FwRsp::LoadAppData.cmdlen(), CmdLen::Bytes4);
    assert_eq!(FwRsp::LoadAppDataReady.cmdlen(), CmdLen::Bytes128);
    assert_eq!(FwRsp::GetUdi.cmdlen(), CmdLen::Bytes32);
}

#[test]
fn command_length_requirements() {
    assert_eq!(FwCmd::NameVersion.cmdlen(), CmdLen::Bytes1);
    assert_eq!(FwCmd::LoadApp.cmdlen(), CmdLen::Bytes128);
    assert_eq!(FwCmd::LoadAppData.cmdlen(), CmdLen::Bytes128);
    assert_eq!(FwCmd::GetUdi.cmdlen(), CmdLen::Bytes32);
}
