use std::{path::PathBuf, time::Duration};

use clap::Parser;

pub const DEFAULT_CPU_HZ: u32 = 700;
pub const DEFAULT_TIMER_HZ: u32 = 60;
pub const DEFAULT_KEY_HOLD_MS: u64 = 150;
const NANOS_PER_SECOND: u64 = 1_000_000_000;

#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 interpreter for the terminal", long_about = None)]
pub struct Args {
    /// ROM to run straight away, skipping the selection menu
    pub rom: Option<PathBuf>,

    /// Directory scanned for *.ch8 files to list in the menu
    #[arg(short = 'd', long, default_value = "roms")]
    pub rom_dir: PathBuf,

    /// Instructions executed per second
    #[arg(short, long, default_value_t = DEFAULT_CPU_HZ, value_parser = clap::value_parser!(u32).range(1..))]
    pub cpu_hz: u32,

    /// Delay/sound timer rate
    #[arg(short, long, default_value_t = DEFAULT_TIMER_HZ, value_parser = clap::value_parser!(u32).range(1..))]
    pub timer_hz: u32,

    /// How long a key counts as held after the terminal last reported it
    #[arg(long, default_value_t = DEFAULT_KEY_HOLD_MS)]
    pub key_hold_ms: u64,

    #[arg(long, default_value = "nibble8.log")]
    pub log_file: PathBuf,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Never ring the terminal bell
    #[arg(long)]
    pub mute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rom: Option<PathBuf>,
    pub rom_dir: PathBuf,
    pub cpu_hz: u32,
    pub timer_hz: u32,
    pub key_hold: Duration,
    pub log_file: PathBuf,
    pub log_level: String,
    pub mute: bool,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Self {
            rom: args.rom,
            rom_dir: args.rom_dir,
            cpu_hz: args.cpu_hz,
            timer_hz: args.timer_hz,
            key_hold: Duration::from_millis(args.key_hold_ms),
            log_file: args.log_file,
            log_level: args.log_level,
            mute: args.mute,
        }
    }
}

impl Settings {
    pub fn cpu_interval(&self) -> Duration {
        Duration::from_nanos(NANOS_PER_SECOND / self.cpu_hz as u64)
    }

    pub fn timer_interval(&self) -> Duration {
        Duration::from_nanos(NANOS_PER_SECOND / self.timer_hz as u64)
    }
}
