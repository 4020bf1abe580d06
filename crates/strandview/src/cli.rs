use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "strandview",
    author,
    version,
    about = "Full-screen fragment shader viewer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Gallery TOML listing the shaders to cycle through.
    #[arg(long, value_name = "FILE", env = "STRANDVIEW_GALLERY")]
    pub gallery: Option<PathBuf>,

    /// Gallery entry to show first (defaults to the gallery's `start`).
    #[arg(long, value_name = "NAME")]
    pub shader: Option<String>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Milliseconds between scheduled frames; overrides the gallery setting.
    #[arg(long, value_name = "MS", value_parser = parse_tick_ms)]
    pub tick_ms: Option<Duration>,

    /// Evaluate every frame at this timestamp instead of the running clock.
    #[arg(long, value_name = "MS", value_parser = parse_time_ms)]
    pub still_time: Option<f64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the gallery entries, marking the one shown first.
    List,
    /// Render the strands pattern on the CPU into a PNG file.
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Timestamp to evaluate, in milliseconds.
    #[arg(long, value_name = "MS", default_value = "0", value_parser = parse_time_ms)]
    pub time: f64,

    /// Image size (e.g. `640x360`).
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "640x360", value_parser = parse_size)]
    pub size: (u32, u32),

    /// Destination PNG path.
    #[arg(value_name = "OUT")]
    pub output: PathBuf,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT, e.g. 1280x720".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

fn parse_tick_ms(value: &str) -> Result<Duration, String> {
    let millis: u64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid millisecond count '{value}'"))?;
    if millis == 0 {
        return Err("tick interval must be greater than zero".into());
    }
    Ok(Duration::from_millis(millis))
}

fn parse_time_ms(value: &str) -> Result<f64, String> {
    let millis: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid timestamp '{value}'"))?;
    if !millis.is_finite() || millis < 0.0 {
        return Err("timestamp must be a finite, non-negative number".into());
    }
    Ok(millis)
}
