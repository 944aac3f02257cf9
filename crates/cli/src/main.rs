//! t50ctl CLI: command-line configuration tool for Bloody T50 mice.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use t50ctl_core::device::{HidApiDiscovery, MouseDevice};
use t50ctl_core::error::TransportError;
use t50ctl_core::packet::{opcodes, READ, WRITE};
use t50ctl_core::transport::FeatureTransport;
use t50ctl_core::{catalog, core_slot, dpi, flash, lighting, profile, safety, save, transport};

/// Feature-report transport over one opened hidapi device.
struct CliHidTransport {
    device: hidapi::HidDevice,
    target: MouseDevice,
}

impl CliHidTransport {
    /// Open the first connected T50, or the unit with `serial` if given.
    fn open_t50(serial: Option<&str>) -> Result<Self> {
        let target = select_device(serial, catalog::is_t50_device)?;
        catalog::require_t50(&target)?;
        Self::open(target)
    }

    /// Open the first supported device of any family.
    fn open_supported(serial: Option<&str>) -> Result<Self> {
        Self::open(select_device(serial, |_| true)?)
    }

    fn open(target: MouseDevice) -> Result<Self> {
        let api = hidapi::HidApi::new().context("hidapi init")?;
        let opened = if target.serial_number.is_empty() {
            api.open(target.vendor_id, target.product_id)
        } else {
            api.open_serial(target.vendor_id, target.product_id, &target.serial_number)
        };
        let device = opened.map_err(TransportError::from).with_context(|| {
            format!(
                "open HID device (VID=0x{:04X} PID=0x{:04X})",
                target.vendor_id, target.product_id
            )
        })?;

        tracing::debug!(device = %target, "Opened HID device");
        Ok(Self { device, target })
    }

    fn check_target(&self, device: &MouseDevice) -> Result<(), TransportError> {
        if !self.target.is_same_unit(device) {
            return Err(TransportError::DeviceNotFound(format!(
                "transport is bound to {}, not {}",
                self.target, device
            )));
        }
        Ok(())
    }
}

impl FeatureTransport for CliHidTransport {
    fn write_feature_report(
        &self,
        device: &MouseDevice,
        report_id: u8,
        data: &[u8],
    ) -> Result<(), TransportError> {
        self.check_target(device)?;
        let mut buf = data.to_vec();
        match buf.first_mut() {
            Some(first) => *first = report_id,
            None => buf.push(report_id),
        }
        self.device.send_feature_report(&buf)?;
        Ok(())
    }

    fn read_feature_report(
        &self,
        device: &MouseDevice,
        report_id: u8,
        length: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.check_target(device)?;
        let mut buf = vec![0u8; length.max(1)];
        buf[0] = report_id;
        let n = self.device.get_feature_report(&mut buf)?;
        if n == 0 {
            return Err(TransportError::Timeout(format!(
                "empty feature report 0x{report_id:02X}"
            )));
        }
        buf.truncate(n);
        Ok(buf)
    }
}

/// Pick a supported device from the bus.
///
/// With `serial`, the unit carrying that serial is chosen regardless of
/// `prefer`; otherwise the first device matching `prefer`.
fn select_device(serial: Option<&str>, prefer: fn(&MouseDevice) -> bool) -> Result<MouseDevice> {
    let devices = t50ctl_core::device::discover_supported_devices(&HidApiDiscovery)?;
    let found = match serial {
        Some(serial) => devices.into_iter().find(|d| d.serial_number == serial),
        None => devices.into_iter().find(|d| prefer(d)),
    };
    found.ok_or_else(|| match serial {
        Some(serial) => anyhow::anyhow!("No supported Bloody mouse with serial '{serial}' found"),
        None => anyhow::anyhow!("No supported Bloody mouse found"),
    })
}

fn parse_u8(s: &str) -> Result<u8, String> {
    parse_number(s)
        .and_then(|v| u8::try_from(v).map_err(|_| format!("{s} does not fit in a byte")))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    parse_number(s)
        .and_then(|v| u16::try_from(v).map_err(|_| format!("{s} does not fit in 16 bits")))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    parse_number(s)
        .and_then(|v| u32::try_from(v).map_err(|_| format!("{s} does not fit in 32 bits")))
}

/// Decimal, or hex with a `0x` prefix.
fn parse_number(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

/// Parse a hex byte string. Whitespace, `:` and `-` separators are ignored.
fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .map(|c| {
            if c.is_ascii_hexdigit() {
                Ok(c as u8)
            } else {
                Err(anyhow::anyhow!("invalid hex digit '{c}'"))
            }
        })
        .collect::<Result<_>>()?;
    if digits.len() % 2 != 0 {
        bail!("hex string has an odd number of digits");
    }
    Ok(digits
        .chunks(2)
        .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
        .collect())
}

/// Value of an ASCII hex digit already checked with `is_ascii_hexdigit`.
fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// 1-based core number as printed by the vendor software.
fn core_number(slot: u8) -> u16 {
    u16::from(slot) + 1
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Parser)]
#[command(
    name = "t50ctl",
    version,
    about = "Open-source Bloody T50 mouse configuration"
)]
struct Cli {
    /// Target the unit with this serial number.
    #[arg(long, global = true)]
    serial: Option<String>,

    /// Enable debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected Bloody mice.
    ListDevices {
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate a performance profile.
    ValidateProfile {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Validate a profile and apply it to the selected device (dry run).
    ApplyProfile {
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Backlight brightness.
    Backlight {
        #[command(subcommand)]
        action: ByteAction,
    },
    /// Active core slot (0-3).
    CoreSlot {
        #[command(subcommand)]
        action: ByteAction,
    },
    /// Show the core state block.
    CoreState {
        #[arg(long)]
        json: bool,
    },
    /// SLED lighting profile index.
    SledProfile {
        #[command(subcommand)]
        action: ByteAction,
    },
    /// SLED lighting on/off.
    SledEnabled {
        #[command(subcommand)]
        action: ToggleAction,
    },
    /// Step DPI: down, up, or cycle.
    DpiStep {
        action: String,
        /// Opcode to send the step on.
        #[arg(long, value_parser = parse_u8, default_value = "0x0F")]
        opcode: u8,
        /// Ask the firmware to persist the new step.
        #[arg(long)]
        commit: bool,
    },
    /// Read 8 bytes of flash at a word address.
    FlashRead {
        #[arg(value_parser = parse_u16)]
        address: u16,
    },
    /// Read 1-14 dwords of flash at a dword address.
    FlashReadDwords {
        #[arg(value_parser = parse_u32)]
        address: u32,
        #[arg(value_parser = parse_u8)]
        count: u8,
    },
    /// Write words (little-endian hex bytes) to flash.
    FlashWrite {
        #[arg(value_parser = parse_u16)]
        address: u16,
        data: String,
        /// Read back every written word and compare.
        #[arg(long)]
        verify: bool,
    },
    /// Write dwords (little-endian hex bytes) to flash.
    FlashWriteDwords {
        #[arg(value_parser = parse_u32)]
        address: u32,
        data: String,
    },
    /// Write a 128-byte adjust-gun table from a binary file.
    AdjustGun {
        #[arg(value_parser = parse_u16)]
        base: u16,
        file: PathBuf,
    },
    /// Persist settings with a save strategy (quick, v1..v4, major-sync, or a code).
    Save { strategy: String },
    /// Send one raw vendor exchange and print the response payload.
    Exchange {
        #[arg(value_parser = parse_u8)]
        opcode: u8,
        /// Send as a write request.
        #[arg(long)]
        write: bool,
        /// Payload offset within the payload region.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Payload bytes in hex.
        #[arg(default_value = "")]
        payload: String,
    },
    /// Read a raw feature report.
    ReadReport {
        #[arg(value_parser = parse_u8)]
        report_id: u8,
        length: usize,
    },
    /// Write a raw feature report (first byte is replaced by the report ID).
    WriteReport {
        #[arg(value_parser = parse_u8)]
        report_id: u8,
        data: String,
    },
}

/// A performance profile given as flags or as a JSON file.
#[derive(Args)]
struct ProfileArgs {
    /// JSON profile file.
    #[arg(long, conflicts_with_all = ["dpi", "rate", "lift_off"])]
    file: Option<PathBuf>,
    #[arg(long, required_unless_present = "file")]
    dpi: Option<u32>,
    /// Polling rate in Hz (125, 250, 500, or 1000).
    #[arg(long, required_unless_present = "file")]
    rate: Option<u32>,
    #[arg(long, required_unless_present = "file")]
    lift_off: Option<u32>,
}

impl ProfileArgs {
    fn load(&self) -> Result<profile::PerformanceProfile> {
        if let Some(path) = &self.file {
            return Ok(profile::load_profile(path)?);
        }
        match (self.dpi, self.rate, self.lift_off) {
            (Some(dpi), Some(rate), Some(lift_off)) => {
                Ok(profile::PerformanceProfile::new(dpi, rate, lift_off))
            }
            _ => bail!("--dpi, --rate and --lift-off are required without --file"),
        }
    }
}

#[derive(Subcommand)]
enum ByteAction {
    Get,
    Set {
        #[arg(value_parser = parse_u8)]
        value: u8,
    },
}

#[derive(Subcommand)]
enum ToggleAction {
    Get,
    On,
    Off,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_strategy(s: &str) -> Result<save::SaveStrategy> {
    if let Some(strategy) = save::SaveStrategy::from_name(s) {
        return Ok(strategy);
    }
    let code = parse_u8(s).map_err(|_| {
        anyhow::anyhow!(
            "Unknown save strategy '{s}'. Valid strategies: quick, v1, v2, v3, v4, major-sync"
        )
    })?;
    Ok(save::SaveStrategy::from_code(code)?)
}

/// Exit status for errors raised by the device or the transport.
const EXIT_FAILURE: u8 = 1;
/// Exit status for requests rejected before any device I/O.
const EXIT_REJECTED: u8 = 2;

/// Map an error chain to a process exit status.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let rejected = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<t50ctl_core::error::Error>())
        .any(|cause| cause.is_request_rejection());
    if rejected {
        EXIT_REJECTED
    } else {
        EXIT_FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let serial = cli.serial.as_deref();

    match cli.command {
        Commands::ListDevices { json } => {
            let devices = t50ctl_core::device::discover_supported_devices(&HidApiDiscovery)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            } else if devices.is_empty() {
                println!("No Bloody mice found.");
                println!("Ensure your mouse is connected and udev permissions are set up.");
            } else {
                for dev in &devices {
                    let family = catalog::family(dev).map_or("unknown", |f| f.name());
                    println!("{dev} [{family}]");
                }
            }
        }
        Commands::ValidateProfile { profile: args } => {
            let loaded = args.load()?;
            safety::validate_profile(&loaded)?;
            println!("Profile OK: {}", serde_json::to_string(&loaded)?);
        }
        Commands::ApplyProfile { profile: args } => {
            let loaded = args.load()?;
            let device = select_device(serial, |_| true)?;
            let sink = profile::InMemoryProfileSink::new();
            profile::apply_performance_profile(&sink, &device, &loaded)?;
            if let Some((device, applied)) = sink.last_applied() {
                println!("Dry run: {device} would receive");
                println!("  DPI: {}", applied.dpi);
                println!("  Polling rate: {} Hz", applied.polling_rate_hz);
                println!("  Lift-off distance: {}", applied.lift_off_distance);
            }
        }
        Commands::Backlight { action } => {
            let transport = CliHidTransport::open_t50(serial)?;
            let device = transport.target.clone();
            match action {
                ByteAction::Get => {
                    let level = lighting::read_backlight_level(&transport, &device)?;
                    println!("Backlight level: {level}");
                }
                ByteAction::Set { value } => {
                    lighting::set_backlight_level(&transport, &device, value)?;
                    println!("Backlight level set to {value}");
                }
            }
        }
        Commands::CoreSlot { action } => {
            let transport = CliHidTransport::open_t50(serial)?;
            let device = transport.target.clone();
            match action {
                ByteAction::Get => {
                    let slot = core_slot::read_core_slot(&transport, &device)?;
                    println!("Active core slot: {slot} (Core {})", core_number(slot));
                }
                ByteAction::Set { value } => {
                    core_slot::set_core_slot(&transport, &device, value)?;
                    println!("Core slot set to {value}");
                }
            }
        }
        Commands::CoreState { json } => {
            let transport = CliHidTransport::open_t50(serial)?;
            let state = core_slot::read_core_state(&transport, &transport.target)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state.fields())?);
            } else {
                for (name, value) in state.fields() {
                    println!("{name}: {value}");
                }
            }
        }
        Commands::SledProfile { action } => {
            let transport = CliHidTransport::open_t50(serial)?;
            let device = transport.target.clone();
            match action {
                ByteAction::Get => {
                    let index = lighting::read_sled_profile_index(&transport, &device)?;
                    println!("SLED profile: {index}");
                }
                ByteAction::Set { value } => {
                    lighting::set_sled_profile_index(&transport, &device, value)?;
                    println!("SLED profile set to {value}");
                }
            }
        }
        Commands::SledEnabled { action } => {
            let transport = CliHidTransport::open_t50(serial)?;
            let device = transport.target.clone();
            match action {
                ToggleAction::Get => {
                    let enabled = lighting::read_sled_enabled(&transport, &device)?;
                    println!("SLED: {}", if enabled { "on" } else { "off" });
                }
                ToggleAction::On | ToggleAction::Off => {
                    let enabled = matches!(action, ToggleAction::On);
                    lighting::set_sled_enabled(&transport, &device, enabled)?;
                    println!("SLED turned {}", if enabled { "on" } else { "off" });
                }
            }
        }
        Commands::DpiStep {
            action,
            opcode,
            commit,
        } => {
            let parsed = match dpi::DpiStepAction::from_name(&action) {
                Some(parsed) => parsed,
                None => {
                    let code = parse_u8(&action).map_err(|_| {
                        anyhow::anyhow!("Unknown DPI step '{action}'. Valid steps: down, up, cycle")
                    })?;
                    dpi::DpiStepAction::from_code(code)?
                }
            };
            let transport = CliHidTransport::open_t50(serial)?;
            dpi::step_dpi(&transport, &transport.target, parsed, opcode, commit)?;
            println!("DPI step '{parsed}' sent on {}", opcodes::name(opcode));
        }
        Commands::FlashRead { address } => {
            let transport = CliHidTransport::open_t50(serial)?;
            let bytes = flash::read_flash_bytes8(&transport, &transport.target, address)?;
            println!("0x{address:04X}: {}", hex_dump(&bytes));
        }
        Commands::FlashReadDwords { address, count } => {
            let count = safety::validate_flash_dword_count(count)?;
            let transport = CliHidTransport::open_t50(serial)?;
            let bytes = flash::read_flash_dwords(&transport, &transport.target, address, count)?;
            for (i, dword) in bytes.chunks(safety::DWORD_LEN).enumerate() {
                println!("0x{:08X}: {}", address as usize + i, hex_dump(dword));
            }
        }
        Commands::FlashWrite {
            address,
            data,
            verify,
        } => {
            let bytes = parse_hex_bytes(&data)?;
            safety::validate_flash_payload_len(bytes.len(), safety::WORD_LEN)?;
            eprintln!("{}", safety::FLASH_DISCLAIMER);
            let transport = CliHidTransport::open_t50(serial)?;
            flash::write_flash_words(&transport, &transport.target, address, &bytes, verify)?;
            println!(
                "Wrote {} word(s) at 0x{address:04X}{}",
                bytes.len() / safety::WORD_LEN,
                if verify { " (verified)" } else { "" }
            );
        }
        Commands::FlashWriteDwords { address, data } => {
            let bytes = parse_hex_bytes(&data)?;
            safety::validate_flash_payload_len(bytes.len(), safety::DWORD_LEN)?;
            eprintln!("{}", safety::FLASH_DISCLAIMER);
            let transport = CliHidTransport::open_t50(serial)?;
            flash::write_flash_dwords(&transport, &transport.target, address, &bytes)?;
            println!(
                "Wrote {} dword(s) at 0x{address:08X}",
                bytes.len() / safety::DWORD_LEN
            );
        }
        Commands::AdjustGun { base, file } => {
            let table = std::fs::read(&file)
                .with_context(|| format!("read adjust-gun table {}", file.display()))?;
            safety::validate_adjust_gun_table_len(table.len())?;
            eprintln!("{}", safety::FLASH_DISCLAIMER);
            let transport = CliHidTransport::open_t50(serial)?;
            flash::write_adjust_gun_table(&transport, &transport.target, base, &table)?;
            println!("Adjust-gun table written at 0x{base:04X}");
        }
        Commands::Save { strategy } => {
            let strategy = parse_strategy(&strategy)?;
            let transport = CliHidTransport::open_t50(serial)?;
            save::save_settings(&transport, &transport.target, strategy)?;
            println!(
                "Settings saved ({strategy}, {} step(s))",
                save::save_step_count_for_strategy(strategy)
            );
        }
        Commands::Exchange {
            opcode,
            write,
            offset,
            payload,
        } => {
            let bytes = parse_hex_bytes(&payload)?;
            let hid = CliHidTransport::open_t50(serial)?;
            let flag = if write { WRITE } else { READ };
            let response = transport::execute(&hid, &hid.target, opcode, flag, offset, &bytes)?;
            println!("{} response: {}", opcodes::name(opcode), hex_dump(&response));
        }
        Commands::ReadReport { report_id, length } => {
            let hid = CliHidTransport::open_supported(serial)?;
            let report = transport::read_feature_report(&hid, &hid.target, report_id, length)?;
            println!("{}", hex_dump(&report));
        }
        Commands::WriteReport { report_id, data } => {
            let bytes = parse_hex_bytes(&data)?;
            let hid = CliHidTransport::open_supported(serial)?;
            transport::write_feature_report(&hid, &hid.target, report_id, &bytes)?;
            println!("Wrote {} byte(s) to report 0x{report_id:02X}", bytes.len());
        }
    }

    Ok(())
}
