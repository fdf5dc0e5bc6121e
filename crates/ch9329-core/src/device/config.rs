//! Configuration channel: chip status, USB identity, and string
//! descriptors.
//!
//! Writes follow a read-modify-write pattern. The 50-byte parameter record
//! is always fetched, spliced, and written back whole, so bytes this driver
//! has no opinion about (work mode, serial settings, timings) survive a
//! VID/PID change untouched. Descriptor operations drain a possibly stale
//! reply first because the chip buffers at most one response.

use std::io;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::commands::{
    ACK_SET_PARA_CFG, ACK_SET_USB_STRING, CMD_GET_INFO, CMD_GET_PARA_CFG, CMD_GET_USB_STRING,
    CMD_SET_PARA_CFG, CMD_SET_USB_STRING, DEFAULT_ADDRESS,
};
use crate::protocol::frame::{self, Frame, ProtocolError};
use crate::transport::Transport;

/// Size of the parameter record carried by the get and set commands.
pub const PARAMETERS_LEN: usize = 50;
/// Longest descriptor text the chip stores.
pub const DESCRIPTOR_MAX_LEN: usize = 23;

// Offsets into the parameter record.
const VID_OFFSET: usize = 11;
const PID_OFFSET: usize = 13;
const CUSTOM_DESCRIPTOR_FLAG_OFFSET: usize = 35;
/// Flag value that makes the chip report the stored custom descriptors.
const CUSTOM_DESCRIPTOR_ENABLED: u8 = 0x87;

/// The three USB string descriptors stored on the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StringDescriptor {
    Manufacturer = 0x00,
    Product = 0x01,
    SerialNumber = 0x02,
}

/// The chip's 50-byte parameter record, edited as a value and written back
/// whole.
///
/// Only the USB identity fields get typed accessors; everything else rides
/// along unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceParameters {
    raw: [u8; PARAMETERS_LEN],
}

impl DeviceParameters {
    /// Copies a parameter record out of a reply payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InsufficientData`] when the payload is
    /// shorter than the 50-byte record.
    pub fn from_payload(payload: &[u8]) -> std::result::Result<Self, ProtocolError> {
        if payload.len() < PARAMETERS_LEN {
            return Err(ProtocolError::InsufficientData {
                needed: PARAMETERS_LEN,
                available: payload.len(),
            });
        }
        let mut raw = [0u8; PARAMETERS_LEN];
        raw.copy_from_slice(&payload[..PARAMETERS_LEN]);
        Ok(Self { raw })
    }

    /// USB vendor ID.
    pub fn vid(&self) -> u16 {
        u16::from_le_bytes([self.raw[VID_OFFSET], self.raw[VID_OFFSET + 1]])
    }

    /// USB product ID.
    pub fn pid(&self) -> u16 {
        u16::from_le_bytes([self.raw[PID_OFFSET], self.raw[PID_OFFSET + 1]])
    }

    pub fn set_vid(&mut self, vid: u16) {
        self.raw[VID_OFFSET..VID_OFFSET + 2].copy_from_slice(&vid.to_le_bytes());
    }

    pub fn set_pid(&mut self, pid: u16) {
        self.raw[PID_OFFSET..PID_OFFSET + 2].copy_from_slice(&pid.to_le_bytes());
    }

    /// Whether the chip reports the stored custom descriptors instead of
    /// the factory ones.
    pub fn custom_descriptors_enabled(&self) -> bool {
        self.raw[CUSTOM_DESCRIPTOR_FLAG_OFFSET] == CUSTOM_DESCRIPTOR_ENABLED
    }

    /// Marks the stored custom descriptors as the ones to report.
    pub fn enable_custom_descriptors(&mut self) {
        self.raw[CUSTOM_DESCRIPTOR_FLAG_OFFSET] = CUSTOM_DESCRIPTOR_ENABLED;
    }

    /// The record as wire bytes for a set-parameters write.
    pub fn as_bytes(&self) -> &[u8; PARAMETERS_LEN] {
        &self.raw
    }
}

/// Chip status decoded from the info reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChipInfo {
    /// Raw firmware version byte, major nibble high.
    pub version: u8,
    /// Whether the USB side has enumerated against the target.
    pub usb_configured: bool,
    /// Num-lock LED state reported by the target.
    pub num_lock: bool,
    /// Caps-lock LED state reported by the target.
    pub caps_lock: bool,
    /// Scroll-lock LED state reported by the target.
    pub scroll_lock: bool,
}

impl ChipInfo {
    fn from_payload(payload: &[u8]) -> std::result::Result<Self, ProtocolError> {
        if payload.len() < 3 {
            return Err(ProtocolError::InsufficientData {
                needed: 3,
                available: payload.len(),
            });
        }
        let leds = payload[2];
        Ok(Self {
            version: payload[0],
            usb_configured: payload[1] == 0x01,
            num_lock: leds & 0x01 != 0,
            caps_lock: leds & 0x02 != 0,
            scroll_lock: leds & 0x04 != 0,
        })
    }

    /// Version in the chip's conventional rendering, e.g. "V1.1".
    pub fn version_string(&self) -> String {
        format!("V{}.{}", self.version >> 4, self.version & 0x0F)
    }
}

/// Configuration channel over a borrowed transport.
pub struct DeviceConfig<'t, T: ?Sized> {
    transport: &'t mut T,
}

impl<'t, T: Transport + ?Sized> DeviceConfig<'t, T> {
    /// Creates a configuration channel over `transport`.
    pub fn new(transport: &'t mut T) -> Self {
        Self { transport }
    }

    /// Queries chip version, USB enumeration status, and lock-LED state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for a malformed or missing reply and
    /// [`Error::Io`] when the transport fails.
    pub fn chip_info(&mut self) -> Result<ChipInfo> {
        let reply = self.query(CMD_GET_INFO, &[])?;
        Ok(ChipInfo::from_payload(&reply.payload)?)
    }

    /// Reads the 50-byte parameter record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] when the chip stays silent or answers
    /// with less than the full record, and [`Error::Io`] when the transport
    /// fails.
    pub fn parameters(&mut self) -> Result<DeviceParameters> {
        let reply = self.query(CMD_GET_PARA_CFG, &[])?;
        Ok(DeviceParameters::from_payload(&reply.payload)?)
    }

    /// Sets the USB vendor and product IDs.
    ///
    /// Fetches the current parameter record, splices the little-endian IDs
    /// in, optionally marks the custom-descriptor flag, writes the record
    /// back whole, and verifies the chip's literal success acknowledgement.
    ///
    /// # Errors
    ///
    /// Same conditions as [`DeviceConfig::parameters`], plus
    /// [`ProtocolError::UnexpectedAck`] when the chip declines the write.
    pub fn set_device_ids(&mut self, vid: u16, pid: u16, custom_descriptors: bool) -> Result<()> {
        let mut parameters = self.parameters()?;
        parameters.set_vid(vid);
        parameters.set_pid(pid);
        if custom_descriptors {
            parameters.enable_custom_descriptors();
        }
        debug!("writing device IDs {vid:#06X}:{pid:#06X}");
        self.command_with_ack(CMD_SET_PARA_CFG, parameters.as_bytes(), &ACK_SET_PARA_CFG)
    }

    /// Reads one USB string descriptor as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for a malformed or missing reply and
    /// [`Error::Io`] when the transport fails.
    pub fn usb_string(&mut self, descriptor: StringDescriptor) -> Result<String> {
        self.drain_pending_response()?;
        let reply = self.query(CMD_GET_USB_STRING, &[descriptor as u8])?;
        decode_descriptor(&reply.payload)
    }

    /// Reads the manufacturer descriptor.
    pub fn manufacturer(&mut self) -> Result<String> {
        self.usb_string(StringDescriptor::Manufacturer)
    }

    /// Reads the product descriptor.
    pub fn product(&mut self) -> Result<String> {
        self.usb_string(StringDescriptor::Product)
    }

    /// Reads the serial-number descriptor.
    pub fn serial_number(&mut self) -> Result<String> {
        self.usb_string(StringDescriptor::SerialNumber)
    }

    /// Writes one USB string descriptor.
    ///
    /// Text longer than 23 bytes is rejected before any device I/O. Empty
    /// text still declares length 1 because the chip rejects a zero length
    /// byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DescriptorTooLong`] for oversized text,
    /// [`ProtocolError::UnexpectedAck`] when the chip declines the write,
    /// and [`Error::Io`] when the transport fails.
    pub fn set_usb_string(&mut self, descriptor: StringDescriptor, text: &str) -> Result<()> {
        if text.len() > DESCRIPTOR_MAX_LEN {
            return Err(Error::DescriptorTooLong {
                len: text.len(),
                max: DESCRIPTOR_MAX_LEN,
            });
        }
        self.drain_pending_response()?;
        let mut payload = Vec::with_capacity(2 + text.len());
        payload.push(descriptor as u8);
        payload.push(text.len().max(1) as u8);
        payload.extend_from_slice(text.as_bytes());
        debug!("writing descriptor {descriptor:?} ({} bytes)", text.len());
        self.command_with_ack(CMD_SET_USB_STRING, &payload, &ACK_SET_USB_STRING)
    }

    /// Sends a request and reads its reply, checking the echoed command.
    fn query(&mut self, command: u8, payload: &[u8]) -> Result<Frame> {
        let packet = frame::encode(DEFAULT_ADDRESS, command, payload);
        trace!("config TX {:02X?}", packet);
        self.transport.write(&packet)?;
        let raw = frame::read_frame(self.transport)?;
        trace!("config RX {:02X?}", raw);
        let reply = Frame::parse(&raw)?;
        reply.expect_reply_to(command)?;
        Ok(reply)
    }

    /// Writes a set command and verifies the chip's fixed acknowledgement
    /// byte for byte.
    fn command_with_ack(&mut self, command: u8, payload: &[u8], expected_ack: &[u8]) -> Result<()> {
        let packet = frame::encode(DEFAULT_ADDRESS, command, payload);
        trace!("config TX {:02X?}", packet);
        self.transport.write(&packet)?;
        let ack = frame::read_frame(self.transport)?;
        trace!("config RX {:02X?}", ack);
        frame::expect_ack(&ack, expected_ack)?;
        Ok(())
    }

    /// Discards a stale reply the chip may still have buffered.
    ///
    /// One bounded read; a timeout means nothing was pending.
    fn drain_pending_response(&mut self) -> Result<()> {
        let mut discard = [0u8; 128];
        match self.transport.read(&mut discard) {
            Ok(n) => {
                if n > 0 {
                    trace!("drained {n} stale bytes");
                }
                Ok(())
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

/// Decodes a get-string reply payload: descriptor kind, length, then bytes.
fn decode_descriptor(payload: &[u8]) -> Result<String> {
    if payload.len() < 2 {
        return Err(ProtocolError::InsufficientData {
            needed: 2,
            available: payload.len(),
        }
        .into());
    }
    let length = payload[1] as usize;
    let text = payload.get(2..2 + length).ok_or(ProtocolError::InsufficientData {
        needed: 2 + length,
        available: payload.len(),
    })?;
    Ok(String::from_utf8_lossy(text).into_owned())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::commands::{CMD_SEND_KB_GENERAL_DATA, REPLY_FLAG};
    use crate::transport::MockTransport;

    /// Parameter record with a recognizable pattern and the given IDs.
    fn record_with_ids(vid: u16, pid: u16) -> [u8; PARAMETERS_LEN] {
        let mut raw: [u8; PARAMETERS_LEN] = std::array::from_fn(|i| i as u8);
        raw[VID_OFFSET..VID_OFFSET + 2].copy_from_slice(&vid.to_le_bytes());
        raw[PID_OFFSET..PID_OFFSET + 2].copy_from_slice(&pid.to_le_bytes());
        raw
    }

    fn reply(command: u8, payload: &[u8]) -> Vec<u8> {
        frame::encode(DEFAULT_ADDRESS, command | REPLY_FLAG, payload)
    }

    #[test]
    fn test_parameters_reads_ids_from_the_record() {
        // Arrange
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_PARA_CFG, &record_with_ids(0x1A86, 0xE129)));

        // Act
        let parameters = DeviceConfig::new(&mut port).parameters().unwrap();

        // Assert
        assert_eq!(parameters.vid(), 0x1A86);
        assert_eq!(parameters.pid(), 0xE129);
        assert_eq!(port.written, vec![frame::encode(0x00, CMD_GET_PARA_CFG, &[])]);
    }

    #[test]
    fn test_parameters_fails_on_a_silent_chip() {
        let mut port = MockTransport::new();

        let result = DeviceConfig::new(&mut port).parameters();

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::InsufficientData { .. }))
        ));
    }

    #[test]
    fn test_parameters_rejects_a_short_record() {
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_PARA_CFG, &[0x00; 10]));

        let result = DeviceConfig::new(&mut port).parameters();

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::InsufficientData {
                needed: 50,
                available: 10
            }))
        ));
    }

    #[test]
    fn test_parameters_rejects_a_mismatched_reply_command() {
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_SEND_KB_GENERAL_DATA, &[0x00; 50]));

        let result = DeviceConfig::new(&mut port).parameters();

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::UnexpectedReply {
                expected: 0x88,
                received: 0x82
            }))
        ));
    }

    #[test]
    fn test_set_device_ids_splices_ids_and_preserves_the_rest() {
        // Arrange
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_PARA_CFG, &record_with_ids(0x1A86, 0xE129)));
        port.push_response(&ACK_SET_PARA_CFG);

        // Act
        DeviceConfig::new(&mut port)
            .set_device_ids(0x413C, 0x2107, false)
            .unwrap();

        // Assert: the write-back is the fetched record with only the ID
        // bytes replaced.
        assert_eq!(port.written.len(), 2);
        assert_eq!(
            port.written[1],
            frame::encode(0x00, CMD_SET_PARA_CFG, &record_with_ids(0x413C, 0x2107))
        );
        // Byte 35 kept its fetched pattern value, so the flag stayed off.
        assert_eq!(port.written[1][5 + CUSTOM_DESCRIPTOR_FLAG_OFFSET], 35);
    }

    #[test]
    fn test_set_device_ids_can_mark_custom_descriptors() {
        // Arrange
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_PARA_CFG, &record_with_ids(0x1A86, 0xE129)));
        port.push_response(&ACK_SET_PARA_CFG);

        // Act
        DeviceConfig::new(&mut port)
            .set_device_ids(0x413C, 0x2107, true)
            .unwrap();

        // Assert
        let written_payload = &port.written[1][5..5 + PARAMETERS_LEN];
        assert_eq!(written_payload[CUSTOM_DESCRIPTOR_FLAG_OFFSET], 0x87);
    }

    #[test]
    fn test_set_device_ids_rejects_an_unexpected_ack() {
        // Arrange: the chip answers the write with the wrong literal.
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_PARA_CFG, &record_with_ids(0x1A86, 0xE129)));
        port.push_response(&ACK_SET_USB_STRING);

        // Act
        let result = DeviceConfig::new(&mut port).set_device_ids(0x0001, 0x0002, false);

        // Assert
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::UnexpectedAck { .. }))
        ));
    }

    #[test]
    fn test_usb_string_decodes_the_descriptor_text() {
        // Arrange: nothing stale to drain, then the product string.
        let mut port = MockTransport::new();
        port.push_timeout();
        let mut payload = vec![0x01, 0x06];
        payload.extend_from_slice(b"CH9329");
        port.push_response(&reply(CMD_GET_USB_STRING, &payload));

        // Act
        let text = DeviceConfig::new(&mut port)
            .usb_string(StringDescriptor::Product)
            .unwrap();

        // Assert
        assert_eq!(text, "CH9329");
        assert_eq!(
            port.written,
            vec![frame::encode(0x00, CMD_GET_USB_STRING, &[0x01])]
        );
    }

    #[test]
    fn test_usb_string_drains_a_stale_reply_first() {
        // Arrange: a leftover ack sits in the buffer ahead of the reply.
        let mut port = MockTransport::new();
        port.push_response(&ACK_SET_USB_STRING);
        let mut payload = vec![0x00, 0x03];
        payload.extend_from_slice(b"WCH");
        port.push_response(&reply(CMD_GET_USB_STRING, &payload));

        // Act
        let text = DeviceConfig::new(&mut port)
            .usb_string(StringDescriptor::Manufacturer)
            .unwrap();

        // Assert
        assert_eq!(text, "WCH");
    }

    #[test]
    fn test_usb_string_rejects_a_length_byte_past_the_payload() {
        let mut port = MockTransport::new();
        port.push_timeout();
        // Declares 10 text bytes but carries 2.
        port.push_response(&reply(CMD_GET_USB_STRING, &[0x02, 0x0A, 0x31, 0x32]));

        let result = DeviceConfig::new(&mut port).usb_string(StringDescriptor::SerialNumber);

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::InsufficientData {
                needed: 12,
                available: 4
            }))
        ));
    }

    #[test]
    fn test_set_usb_string_sends_kind_length_and_text() {
        // Arrange
        let mut port = MockTransport::new();
        port.push_timeout();
        port.push_response(&ACK_SET_USB_STRING);

        // Act
        DeviceConfig::new(&mut port)
            .set_usb_string(StringDescriptor::Product, "Widget")
            .unwrap();

        // Assert
        let mut payload = vec![0x01, 0x06];
        payload.extend_from_slice(b"Widget");
        assert_eq!(
            port.written,
            vec![frame::encode(0x00, CMD_SET_USB_STRING, &payload)]
        );
    }

    #[test]
    fn test_set_usb_string_empty_text_declares_length_one() {
        let mut port = MockTransport::new();
        port.push_timeout();
        port.push_response(&ACK_SET_USB_STRING);

        DeviceConfig::new(&mut port)
            .set_usb_string(StringDescriptor::SerialNumber, "")
            .unwrap();

        assert_eq!(
            port.written,
            vec![frame::encode(0x00, CMD_SET_USB_STRING, &[0x02, 0x01])]
        );
    }

    #[test]
    fn test_set_usb_string_rejects_long_text_before_io() {
        // Arrange
        let mut port = MockTransport::new();
        let text = "a".repeat(DESCRIPTOR_MAX_LEN + 1);

        // Act
        let result = DeviceConfig::new(&mut port).set_usb_string(StringDescriptor::Product, &text);

        // Assert
        assert!(matches!(
            result,
            Err(Error::DescriptorTooLong { len: 24, max: 23 })
        ));
        assert!(port.written.is_empty());
    }

    #[test]
    fn test_set_usb_string_accepts_text_at_the_limit() {
        let mut port = MockTransport::new();
        port.push_timeout();
        port.push_response(&ACK_SET_USB_STRING);
        let text = "b".repeat(DESCRIPTOR_MAX_LEN);

        let result = DeviceConfig::new(&mut port).set_usb_string(StringDescriptor::Product, &text);

        assert!(result.is_ok());
        assert_eq!(port.written[0][4], 2 + DESCRIPTOR_MAX_LEN as u8);
    }

    #[test]
    fn test_chip_info_decodes_version_usb_state_and_leds() {
        // Arrange
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_INFO, &[0x11, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00]));

        // Act
        let info = DeviceConfig::new(&mut port).chip_info().unwrap();

        // Assert
        assert_eq!(info.version_string(), "V1.1");
        assert!(info.usb_configured);
        assert!(info.num_lock);
        assert!(info.caps_lock);
        assert!(!info.scroll_lock);
        assert_eq!(port.written, vec![vec![0x57, 0xAB, 0x00, 0x01, 0x00, 0x03]]);
    }

    #[test]
    fn test_chip_info_reports_an_unconfigured_usb_side() {
        let mut port = MockTransport::new();
        port.push_response(&reply(CMD_GET_INFO, &[0x10, 0x00, 0x00]));

        let info = DeviceConfig::new(&mut port).chip_info().unwrap();

        assert_eq!(info.version_string(), "V1.0");
        assert!(!info.usb_configured);
        assert!(!info.num_lock && !info.caps_lock && !info.scroll_lock);
    }

    #[test]
    fn test_read_failure_surfaces_as_io_error() {
        let mut port = MockTransport::new();
        port.fail_reads();

        let result = DeviceConfig::new(&mut port).usb_string(StringDescriptor::Product);

        assert!(matches!(result, Err(Error::Io(_))));
    }
}
