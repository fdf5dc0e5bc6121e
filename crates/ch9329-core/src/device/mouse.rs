//! Mouse channel: relative and absolute pointer reports.
//!
//! Relative reports carry signed single-byte deltas:
//!
//! ```text
//! [0x01, buttons, dx, dy, wheel]
//! ```
//!
//! Absolute reports scale screen coordinates into the chip's fixed
//! 0..=4095 space and carry them little-endian:
//!
//! ```text
//! [0x02, buttons, x_lo, x_hi, y_lo, y_hi, wheel]
//! ```

use std::thread;
use std::time::Duration;

use tracing::trace;

use crate::device::jitter;
use crate::error::{Error, Result};
use crate::protocol::commands::{CMD_SEND_MS_ABS_DATA, CMD_SEND_MS_REL_DATA, DEFAULT_ADDRESS};
use crate::protocol::frame;
use crate::transport::Transport;

/// Payload marker for relative reports.
const RELATIVE_MODE: u8 = 0x01;
/// Payload marker for absolute reports.
const ABSOLUTE_MODE: u8 = 0x02;

/// Upper end of the chip's absolute coordinate space.
pub const ABS_COORD_MAX: u16 = 4095;

/// Shortest randomized hold for [`Mouse::click`].
pub const CLICK_HOLD_MIN: Duration = Duration::from_millis(100);
/// Longest randomized hold for [`Mouse::click`].
pub const CLICK_HOLD_MAX: Duration = Duration::from_millis(450);

/// Mouse buttons as wire mask values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MouseButton {
    /// No button held.
    #[default]
    None = 0x00,
    /// Left button.
    Left = 0x01,
    /// Right button.
    Right = 0x02,
    /// Center (wheel) button.
    Center = 0x04,
}

/// Mouse channel over a borrowed transport.
pub struct Mouse<'t, T: ?Sized> {
    transport: &'t mut T,
}

impl<'t, T: Transport + ?Sized> Mouse<'t, T> {
    /// Creates a mouse channel over `transport`.
    pub fn new(transport: &'t mut T) -> Self {
        Self { transport }
    }

    /// Moves the pointer.
    ///
    /// With `relative` set, `x` and `y` are deltas clamped into the signed
    /// byte range and the bounds are ignored. Otherwise they are screen
    /// coordinates scaled against `(width, height)` into the chip's
    /// 0..=4095 space, with negatives pinned to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] for an absolute move against a zero
    /// bound and [`Error::Io`] when the transport fails.
    pub fn move_pointer(
        &mut self,
        x: i32,
        y: i32,
        relative: bool,
        width: u32,
        height: u32,
    ) -> Result<()> {
        if relative {
            self.send_relative(MouseButton::None, x, y, 0)
        } else {
            if width == 0 || height == 0 {
                return Err(Error::InvalidBounds { width, height });
            }
            let device_x = scale_absolute(x, width);
            let device_y = scale_absolute(y, height);
            self.send_absolute(MouseButton::None, device_x, device_y, 0)
        }
    }

    /// Holds `button` down with no motion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the transport fails.
    pub fn press(&mut self, button: MouseButton) -> Result<()> {
        self.send_relative(button, 0, 0, 0)
    }

    /// Releases every button with no motion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the transport fails.
    pub fn release(&mut self) -> Result<()> {
        self.send_relative(MouseButton::None, 0, 0, 0)
    }

    /// Clicks `button`, holding it for a randomized 100 to 450 ms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the transport fails. A failure on the
    /// press skips the release.
    pub fn click(&mut self, button: MouseButton) -> Result<()> {
        self.press(button)?;
        thread::sleep(jitter(CLICK_HOLD_MIN, CLICK_HOLD_MAX));
        self.release()
    }

    /// Scrolls the wheel by `delta` notches, negative toward the user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WheelOutOfRange`] when `|delta| > 127` and
    /// [`Error::Io`] when the transport fails.
    pub fn wheel(&mut self, delta: i32) -> Result<()> {
        self.send_relative(MouseButton::None, 0, 0, delta)
    }

    fn send_relative(&mut self, button: MouseButton, dx: i32, dy: i32, wheel: i32) -> Result<()> {
        let payload = [
            RELATIVE_MODE,
            button as u8,
            delta_byte(dx),
            delta_byte(dy),
            wheel_byte(wheel)?,
        ];
        let packet = frame::encode(DEFAULT_ADDRESS, CMD_SEND_MS_REL_DATA, &payload);
        trace!("mouse TX {:02X?}", packet);
        self.transport.write(&packet)?;
        Ok(())
    }

    fn send_absolute(&mut self, button: MouseButton, x: u16, y: u16, wheel: i32) -> Result<()> {
        let mut payload = [0u8; 7];
        payload[0] = ABSOLUTE_MODE;
        payload[1] = button as u8;
        payload[2..4].copy_from_slice(&x.to_le_bytes());
        payload[4..6].copy_from_slice(&y.to_le_bytes());
        payload[6] = wheel_byte(wheel)?;
        let packet = frame::encode(DEFAULT_ADDRESS, CMD_SEND_MS_ABS_DATA, &payload);
        trace!("mouse TX {:02X?}", packet);
        self.transport.write(&packet)?;
        Ok(())
    }
}

/// Scales a screen coordinate into the 0..=4095 device space.
///
/// Negative coordinates pin to zero and the result clamps to the top of the
/// space, so a coordinate equal to the bound stays representable.
fn scale_absolute(coordinate: i32, bound: u32) -> u16 {
    let clamped = coordinate.max(0) as u64;
    let scaled = (4096 * clamped) / u64::from(bound);
    scaled.min(u64::from(ABS_COORD_MAX)) as u16
}

/// Two's-complement byte for a motion delta, clamped to the signed range.
fn delta_byte(delta: i32) -> u8 {
    delta.clamp(-128, 127) as i8 as u8
}

/// Wheel deltas share the two's-complement encoding but reject out-of-range
/// values instead of clamping, since a clamped scroll would silently change
/// distance.
fn wheel_byte(delta: i32) -> Result<u8> {
    if !(-127..=127).contains(&delta) {
        return Err(Error::WheelOutOfRange { delta });
    }
    Ok(delta as i8 as u8)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    fn payload_of(frame: &[u8]) -> &[u8] {
        &frame[5..frame.len() - 1]
    }

    #[test]
    fn test_relative_move_emits_signed_deltas() {
        // Arrange
        let mut port = MockTransport::new();

        // Act
        Mouse::new(&mut port).move_pointer(5, -3, true, 0, 0).unwrap();

        // Assert
        let frame = &port.written[0];
        assert_eq!(&frame[..5], &[0x57, 0xAB, 0x00, 0x05, 0x05]);
        assert_eq!(payload_of(frame), &[0x01, 0x00, 0x05, 0xFD, 0x00]);
    }

    #[test]
    fn test_relative_move_clamps_oversized_deltas() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port)
            .move_pointer(-300, 300, true, 0, 0)
            .unwrap();

        assert_eq!(payload_of(&port.written[0]), &[0x01, 0x00, 0x80, 0x7F, 0x00]);
    }

    #[test]
    fn test_absolute_move_scales_origin_to_zero() {
        // Arrange
        let mut port = MockTransport::new();

        // Act
        Mouse::new(&mut port)
            .move_pointer(0, 0, false, 1920, 1080)
            .unwrap();

        // Assert
        let frame = &port.written[0];
        assert_eq!(&frame[..5], &[0x57, 0xAB, 0x00, 0x04, 0x07]);
        assert_eq!(payload_of(frame), &[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_absolute_move_scales_far_corner_to_coordinate_max() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port)
            .move_pointer(1920, 1080, false, 1920, 1080)
            .unwrap();

        // 4095 little-endian in both axes.
        assert_eq!(
            payload_of(&port.written[0]),
            &[0x02, 0x00, 0xFF, 0x0F, 0xFF, 0x0F, 0x00]
        );
    }

    #[test]
    fn test_absolute_move_scales_midpoint_linearly() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port)
            .move_pointer(960, 270, false, 1920, 1080)
            .unwrap();

        // 4096 * 960 / 1920 = 2048, 4096 * 270 / 1080 = 1024.
        assert_eq!(
            payload_of(&port.written[0]),
            &[0x02, 0x00, 0x00, 0x08, 0x00, 0x04, 0x00]
        );
    }

    #[test]
    fn test_absolute_move_pins_negative_coordinates_to_zero() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port)
            .move_pointer(-50, -1, false, 1920, 1080)
            .unwrap();

        assert_eq!(
            payload_of(&port.written[0]),
            &[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_absolute_move_rejects_zero_bounds_before_writing() {
        let mut port = MockTransport::new();

        let result = Mouse::new(&mut port).move_pointer(10, 10, false, 0, 1080);

        assert!(matches!(
            result,
            Err(Error::InvalidBounds {
                width: 0,
                height: 1080
            })
        ));
        assert!(port.written.is_empty());
    }

    #[test]
    fn test_press_sets_the_button_mask() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port).press(MouseButton::Right).unwrap();

        assert_eq!(payload_of(&port.written[0]), &[0x01, 0x02, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_release_clears_the_button_mask() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port).release().unwrap();

        assert_eq!(payload_of(&port.written[0]), &[0x01, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_click_emits_press_then_release() {
        // Arrange
        let mut port = MockTransport::new();

        // Act
        Mouse::new(&mut port).click(MouseButton::Left).unwrap();

        // Assert
        assert_eq!(port.written.len(), 2);
        assert_eq!(payload_of(&port.written[0])[1], 0x01);
        assert_eq!(payload_of(&port.written[1])[1], 0x00);
    }

    #[test]
    fn test_wheel_encodes_negative_notches_as_twos_complement() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port).wheel(-127).unwrap();

        assert_eq!(payload_of(&port.written[0]), &[0x01, 0x00, 0x00, 0x00, 0x81]);
    }

    #[test]
    fn test_wheel_scrolls_up_with_plain_bytes() {
        let mut port = MockTransport::new();

        Mouse::new(&mut port).wheel(3).unwrap();

        assert_eq!(payload_of(&port.written[0]), &[0x01, 0x00, 0x00, 0x00, 0x03]);
    }

    #[test]
    fn test_wheel_rejects_deltas_outside_the_signed_range() {
        // Arrange
        let mut port = MockTransport::new();

        // Act + Assert: both ends fail and nothing is written.
        assert!(matches!(
            Mouse::new(&mut port).wheel(128),
            Err(Error::WheelOutOfRange { delta: 128 })
        ));
        assert!(matches!(
            Mouse::new(&mut port).wheel(-128),
            Err(Error::WheelOutOfRange { delta: -128 })
        ));
        assert!(port.written.is_empty());
    }

    #[test]
    fn test_wheel_rejects_deltas_at_the_integer_extremes() {
        // Arrange
        let mut port = MockTransport::new();

        // Act + Assert: the whole i32 range is a valid argument and the
        // extremes come back as range errors, not as a wrapped byte.
        assert!(matches!(
            Mouse::new(&mut port).wheel(i32::MIN),
            Err(Error::WheelOutOfRange { delta: i32::MIN })
        ));
        assert!(matches!(
            Mouse::new(&mut port).wheel(i32::MAX),
            Err(Error::WheelOutOfRange { delta: i32::MAX })
        ));
        assert!(port.written.is_empty());
    }

    #[test]
    fn test_relative_frame_checksum_covers_header_and_payload() {
        // Arrange
        let mut port = MockTransport::new();

        // Act
        Mouse::new(&mut port).move_pointer(1, 1, true, 0, 0).unwrap();

        // Assert
        assert_eq!(
            port.written[0],
            vec![0x57, 0xAB, 0x00, 0x05, 0x05, 0x01, 0x00, 0x01, 0x01, 0x00, 0x0F]
        );
    }
}
