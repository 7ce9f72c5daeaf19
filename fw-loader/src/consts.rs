// SPDX-License-Identifier: GPL-3.0-or-later

/// First half of the firmware name reported by NAME_VERSION.
pub const FW_NAME0: &[u8; 4] = b"anch";

/// Second half of the firmware name reported by NAME_VERSION.
pub const FW_NAME1: &[u8; 4] = b"load";

/// Firmware version reported by NAME_VERSION, little-endian on the
/// wire.
pub const FW_VERSION: u32 = 1;
