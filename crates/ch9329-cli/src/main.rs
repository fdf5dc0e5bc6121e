//! Command-line tool for the CH9329 serial HID emulation chip.
//!
//! The chip sits between a serial port on this machine and a USB port on a
//! target machine, presenting itself to the target as a real keyboard and
//! mouse. Every subcommand opens the configured port, performs one
//! operation through the driver channels, and exits.
//!
//! # Usage
//!
//! ```text
//! ch9329-cli [OPTIONS] <COMMAND>
//!
//! Commands:
//!   info        Report chip status, device IDs, and string descriptors
//!   type        Type text on the emulated keyboard
//!   key         Press and release one key, optionally with modifiers
//!   move        Move the pointer (absolute by default)
//!   click       Click a mouse button
//!   wheel       Scroll the wheel by a signed number of notches
//!   set-ids     Write the USB vendor and product IDs
//!   get-string  Read one USB string descriptor
//!   set-string  Write one USB string descriptor
//!
//! Options:
//!   --port <PORT>             Serial port the chip is attached to
//!   --baud <BAUD>             UART baud rate [chip factory default: 9600]
//!   --timeout-ms <MS>         Read/write timeout in milliseconds
//!   --config <PATH>           TOML config file [default: ch9329.toml]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI flags take precedence when both are present.
//!
//! | Variable            | Description                         |
//! |---------------------|-------------------------------------|
//! | `CH9329_PORT`       | Serial port path                    |
//! | `CH9329_BAUD`       | UART baud rate                      |
//! | `CH9329_TIMEOUT_MS` | Read/write timeout in milliseconds  |
//! | `CH9329_CONFIG`     | Config file path                    |
//! | `RUST_LOG`          | Log filter, e.g. `debug` or `trace` |

mod config;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ch9329_core::device::{DeviceConfig, Keyboard, Mouse, MouseButton, StringDescriptor};
use ch9329_core::transport::Transport;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILE};

// ── CLI argument definitions ────────────────────────────────────────────────

/// Drive a CH9329 HID emulation chip over a serial port.
#[derive(Debug, Parser)]
#[command(
    name = "ch9329-cli",
    about = "Inject keyboard and mouse input into a target machine through a CH9329 chip",
    version
)]
struct Cli {
    /// Serial port the chip is attached to, e.g. `/dev/ttyUSB0` or `COM3`.
    #[arg(long, env = "CH9329_PORT", global = true)]
    port: Option<String>,

    /// UART baud rate. The chip ships configured for 9600.
    #[arg(long, env = "CH9329_BAUD", global = true)]
    baud: Option<u32>,

    /// Read and write timeout in milliseconds.
    #[arg(long, env = "CH9329_TIMEOUT_MS", global = true)]
    timeout_ms: Option<u64>,

    /// Path to a TOML config file with connection defaults. When not
    /// given, `ch9329.toml` is consulted and may be absent.
    #[arg(long, env = "CH9329_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report chip status, device IDs, and string descriptors.
    Info {
        /// Emit the report as JSON instead of the human layout.
        #[arg(long)]
        json: bool,
    },

    /// Type text on the emulated keyboard.
    Type {
        /// Text to type. Newlines press enter, tabs press tab.
        text: String,

        /// Shortest keypress hold and inter-key pause in milliseconds.
        #[arg(long)]
        min_interval_ms: Option<u64>,

        /// Longest keypress hold and inter-key pause in milliseconds.
        #[arg(long)]
        max_interval_ms: Option<u64>,
    },

    /// Press and release one key, optionally with modifiers.
    Key {
        /// Key name from the HID table, e.g. `a`, `enter`, `f5`, `arrow_up`.
        key: String,

        /// Modifier to hold, e.g. `ctrl` or `win_right`. Repeatable.
        #[arg(short, long = "modifier")]
        modifiers: Vec<String>,
    },

    /// Move the pointer (absolute screen coordinates by default).
    #[command(allow_negative_numbers = true)]
    Move {
        /// Horizontal position, or delta with `--relative`.
        x: i32,

        /// Vertical position, or delta with `--relative`.
        y: i32,

        /// Interpret x and y as a relative delta instead of coordinates.
        #[arg(long)]
        relative: bool,

        /// Screen width the absolute coordinates refer to.
        #[arg(long, default_value_t = 1920)]
        width: u32,

        /// Screen height the absolute coordinates refer to.
        #[arg(long, default_value_t = 1080)]
        height: u32,
    },

    /// Click a mouse button.
    Click {
        /// Button to click.
        #[arg(value_enum, default_value = "left")]
        button: Button,
    },

    /// Scroll the wheel by a signed number of notches.
    #[command(allow_negative_numbers = true)]
    Wheel {
        /// Notches to scroll; negative scrolls toward the user.
        delta: i32,
    },

    /// Write the USB vendor and product IDs.
    SetIds {
        /// Vendor ID, decimal or 0x-prefixed hex.
        #[arg(long, value_parser = parse_u16)]
        vid: u16,

        /// Product ID, decimal or 0x-prefixed hex.
        #[arg(long, value_parser = parse_u16)]
        pid: u16,

        /// Also mark the stored custom string descriptors as the ones the
        /// chip reports to the target.
        #[arg(long)]
        custom_descriptors: bool,
    },

    /// Read one USB string descriptor.
    GetString {
        /// Which descriptor to read.
        #[arg(value_enum)]
        kind: DescriptorKind,
    },

    /// Write one USB string descriptor (at most 23 bytes).
    SetString {
        /// Which descriptor to write.
        #[arg(value_enum)]
        kind: DescriptorKind,

        /// Descriptor text.
        text: String,
    },
}

/// Mouse buttons as command-line values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Button {
    Left,
    Right,
    Center,
}

impl From<Button> for MouseButton {
    fn from(button: Button) -> Self {
        match button {
            Button::Left => MouseButton::Left,
            Button::Right => MouseButton::Right,
            Button::Center => MouseButton::Center,
        }
    }
}

/// USB string descriptors as command-line values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DescriptorKind {
    Manufacturer,
    Product,
    Serial,
}

impl From<DescriptorKind> for StringDescriptor {
    fn from(kind: DescriptorKind) -> Self {
        match kind {
            DescriptorKind::Manufacturer => StringDescriptor::Manufacturer,
            DescriptorKind::Product => StringDescriptor::Product,
            DescriptorKind::Serial => StringDescriptor::SerialNumber,
        }
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal ID.
fn parse_u16(raw: &str) -> Result<u16, String> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| format!("expected a 16-bit ID (decimal or 0x hex), got {raw:?}"))
}

// ── Settings resolution ─────────────────────────────────────────────────────

/// Connection settings after layering CLI flags over the config file.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    port: String,
    baud: u32,
    timeout: Duration,
    min_interval: Duration,
    max_interval: Duration,
}

/// Applies precedence: CLI flag (or environment variable), then config
/// file, then built-in default.
fn resolve_settings(cli: &Cli, file: &AppConfig) -> anyhow::Result<Settings> {
    let port = cli
        .port
        .clone()
        .or_else(|| file.connection.port.clone())
        .context(
            "no serial port configured: pass --port, set CH9329_PORT, \
             or put `port` under [connection] in the config file",
        )?;
    Ok(Settings {
        port,
        baud: cli.baud.unwrap_or(file.connection.baud),
        timeout: Duration::from_millis(cli.timeout_ms.unwrap_or(file.connection.timeout_ms)),
        min_interval: Duration::from_millis(file.typing.min_interval_ms),
        max_interval: Duration::from_millis(file.typing.max_interval_ms),
    })
}

// ── Info report ─────────────────────────────────────────────────────────────

/// Everything the `info` subcommand reports.
#[derive(Debug, Serialize)]
struct InfoReport {
    version: String,
    usb_configured: bool,
    num_lock: bool,
    caps_lock: bool,
    scroll_lock: bool,
    vid: u16,
    pid: u16,
    custom_descriptors: bool,
    manufacturer: String,
    product: String,
    serial_number: String,
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut leds = Vec::new();
        if self.num_lock {
            leds.push("num");
        }
        if self.caps_lock {
            leds.push("caps");
        }
        if self.scroll_lock {
            leds.push("scroll");
        }
        let leds = if leds.is_empty() {
            "none".to_string()
        } else {
            leds.join(" ")
        };
        writeln!(f, "chip version      {}", self.version)?;
        writeln!(
            f,
            "usb configured    {}",
            if self.usb_configured { "yes" } else { "no" }
        )?;
        writeln!(f, "lock leds         {leds}")?;
        writeln!(f, "vid:pid           {:#06X}:{:#06X}", self.vid, self.pid)?;
        writeln!(
            f,
            "custom strings    {}",
            if self.custom_descriptors {
                "enabled"
            } else {
                "factory"
            }
        )?;
        writeln!(f, "manufacturer      {}", self.manufacturer)?;
        writeln!(f, "product           {}", self.product)?;
        writeln!(f, "serial number     {}", self.serial_number)
    }
}

fn gather_info<T: Transport + ?Sized>(transport: &mut T) -> ch9329_core::Result<InfoReport> {
    let mut config = DeviceConfig::new(transport);
    let chip = config.chip_info()?;
    let parameters = config.parameters()?;
    Ok(InfoReport {
        version: chip.version_string(),
        usb_configured: chip.usb_configured,
        num_lock: chip.num_lock,
        caps_lock: chip.caps_lock,
        scroll_lock: chip.scroll_lock,
        vid: parameters.vid(),
        pid: parameters.pid(),
        custom_descriptors: parameters.custom_descriptors_enabled(),
        manufacturer: config.manufacturer()?,
        product: config.product()?,
        serial_number: config.serial_number()?,
    })
}

// ── Subcommand dispatch ─────────────────────────────────────────────────────

/// Runs one subcommand against an open transport.
///
/// Kept generic over the transport so tests can drive it with a scripted
/// mock instead of a serial port.
fn run<T: Transport + ?Sized>(
    command: Command,
    settings: &Settings,
    transport: &mut T,
) -> anyhow::Result<()> {
    match command {
        Command::Info { json } => {
            let report = gather_info(transport).context("querying the chip")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::Type {
            text,
            min_interval_ms,
            max_interval_ms,
        } => {
            let min = min_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(settings.min_interval);
            let max = max_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(settings.max_interval);
            Keyboard::new(transport)
                .write(&text, min, max)
                .context("typing text")?;
            info!("typed {} characters", text.chars().count());
        }
        Command::Key { key, modifiers } => {
            let names: Vec<&str> = modifiers.iter().map(String::as_str).collect();
            Keyboard::new(transport)
                .press_and_release(&key, &names, settings.min_interval, settings.max_interval)
                .with_context(|| format!("pressing {key:?}"))?;
        }
        Command::Move {
            x,
            y,
            relative,
            width,
            height,
        } => {
            Mouse::new(transport)
                .move_pointer(x, y, relative, width, height)
                .context("moving the pointer")?;
        }
        Command::Click { button } => {
            Mouse::new(transport)
                .click(button.into())
                .context("clicking")?;
        }
        Command::Wheel { delta } => {
            Mouse::new(transport)
                .wheel(delta)
                .context("scrolling the wheel")?;
        }
        Command::SetIds {
            vid,
            pid,
            custom_descriptors,
        } => {
            DeviceConfig::new(transport)
                .set_device_ids(vid, pid, custom_descriptors)
                .context("writing device IDs")?;
            println!("device IDs set to {vid:#06X}:{pid:#06X}");
        }
        Command::GetString { kind } => {
            let text = DeviceConfig::new(transport)
                .usb_string(kind.into())
                .context("reading the descriptor")?;
            println!("{text}");
        }
        Command::SetString { kind, text } => {
            DeviceConfig::new(transport)
                .set_usb_string(kind.into(), &text)
                .context("writing the descriptor")?;
            println!("descriptor updated");
        }
    }
    Ok(())
}

// ── Entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    // An explicit path must exist; the default one is allowed to be absent.
    let file = match &cli.config {
        Some(path) => AppConfig::load_required(path)
            .with_context(|| format!("loading config file {}", path.display()))?,
        None => AppConfig::load(Path::new(DEFAULT_CONFIG_FILE))
            .with_context(|| format!("loading config file {DEFAULT_CONFIG_FILE}"))?,
    };
    let settings = resolve_settings(&cli, &file)?;

    debug!(
        "opening {} at {} baud, timeout {:?}",
        settings.port, settings.baud, settings.timeout
    );
    let mut port = serialport::new(&settings.port, settings.baud)
        .timeout(settings.timeout)
        .open()
        .with_context(|| format!("opening serial port {}", settings.port))?;

    run(cli.command, &settings, &mut *port)
}

// ── Tests ───────────────────────────────────────────────────────────────────
