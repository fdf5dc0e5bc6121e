//! Command bytes and literal acknowledgement frames of the chip's serial
//! protocol.

/// Two-byte head every frame starts with.
pub const FRAME_HEAD: [u8; 2] = [0x57, 0xAB];

/// Default chip address on the serial bus.
pub const DEFAULT_ADDRESS: u8 = 0x00;

/// Replies echo the request command with this bit set.
pub const REPLY_FLAG: u8 = 0x80;

/// Queries chip version, USB enumeration status, and lock-LED state.
pub const CMD_GET_INFO: u8 = 0x01;
/// Sends an 8-byte general keyboard report.
pub const CMD_SEND_KB_GENERAL_DATA: u8 = 0x02;
/// Sends a 7-byte absolute mouse report.
pub const CMD_SEND_MS_ABS_DATA: u8 = 0x04;
/// Sends a 5-byte relative mouse report.
pub const CMD_SEND_MS_REL_DATA: u8 = 0x05;
/// Reads the 50-byte parameter record.
pub const CMD_GET_PARA_CFG: u8 = 0x08;
/// Writes the 50-byte parameter record.
pub const CMD_SET_PARA_CFG: u8 = 0x09;
/// Reads one USB string descriptor.
pub const CMD_GET_USB_STRING: u8 = 0x0A;
/// Writes one USB string descriptor.
pub const CMD_SET_USB_STRING: u8 = 0x0B;

/// Acknowledgement the chip sends after a successful parameter write.
pub const ACK_SET_PARA_CFG: [u8; 7] = [0x57, 0xAB, 0x00, 0x89, 0x01, 0x00, 0x8C];
/// Acknowledgement the chip sends after a successful descriptor write.
pub const ACK_SET_USB_STRING: [u8; 7] = [0x57, 0xAB, 0x00, 0x8B, 0x01, 0x00, 0x8E];
