use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use renderer::{DitherParams, SurfaceSize};

#[derive(Parser, Debug)]
#[command(
    name = "dithershade",
    author,
    version,
    about = "Animated dithered wave background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `config.toml` in the config directory.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Preset to render; defaults to `defaults.preset` from the config.
    #[arg(long, value_name = "NAME", global = true)]
    pub preset: Option<String>,

    /// Surface size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size, global = true)]
    pub size: Option<SurfaceSize>,

    /// Optional FPS cap for the preview window (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_non_negative, global = true)]
    pub fps: Option<f32>,

    #[command(flatten)]
    pub knobs: KnobArgs,
}

/// Per-knob overrides applied on top of the selected preset.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct KnobArgs {
    /// Base tint as `R,G,B`, each channel within 0..1.
    #[arg(long, value_name = "R,G,B", value_parser = parse_color, global = true)]
    pub wave_color: Option<[f32; 3]>,

    /// Brightness bands per channel (1 disables banding).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..), global = true)]
    pub color_num: Option<u32>,

    /// Edge length of the square pixel blocks.
    #[arg(long, value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..), global = true)]
    pub pixel_size: Option<u32>,

    #[arg(long, value_name = "SPEED", allow_negative_numbers = true, value_parser = parse_finite, global = true)]
    pub wave_speed: Option<f32>,

    #[arg(long, value_name = "FREQUENCY", allow_negative_numbers = true, value_parser = parse_finite, global = true)]
    pub wave_frequency: Option<f32>,

    /// Weight of the wave against the noise, within 0..1.
    #[arg(long, value_name = "AMPLITUDE", value_parser = parse_unit, global = true)]
    pub wave_amplitude: Option<f32>,

    /// Disable the pointer glow.
    #[arg(long, global = true)]
    pub no_pointer: bool,

    /// Spread of the pointer glow in normalized units.
    #[arg(long, value_name = "RADIUS", value_parser = parse_positive, global = true)]
    pub pointer_radius: Option<f32>,
}

impl KnobArgs {
    pub fn apply(&self, base: DitherParams) -> DitherParams {
        DitherParams {
            wave_color: self.wave_color.unwrap_or(base.wave_color),
            color_num: self.color_num.unwrap_or(base.color_num),
            pixel_size: self.pixel_size.unwrap_or(base.pixel_size),
            wave_speed: self.wave_speed.unwrap_or(base.wave_speed),
            wave_frequency: self.wave_frequency.unwrap_or(base.wave_frequency),
            wave_amplitude: self.wave_amplitude.unwrap_or(base.wave_amplitude),
            pointer_enabled: base.pointer_enabled && !self.no_pointer,
            pointer_radius: self.pointer_radius.unwrap_or(base.pointer_radius),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a single frame on the CPU and write it as PNG.
    Still(StillArgs),
    /// List the available presets and their parameters.
    Presets,
    /// Print the resolved configuration directory and file.
    Where,
}

#[derive(Args, Debug)]
pub struct StillArgs {
    /// Frame clock value to render, in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0, value_parser = parse_non_negative)]
    pub time: f32,

    /// PNG file to write.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Pointer position in pixels from the top-left corner, as `X,Y`.
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<[f64; 2]>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn split_components<const N: usize>(value: &str, what: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("invalid {what} '{value}'; expected {N} comma-separated numbers"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        let parsed = part
            .parse::<f64>()
            .map_err(|_| format!("invalid {what} component '{part}'"))?;
        if !parsed.is_finite() {
            return Err(format!("{what} component '{part}' must be finite"));
        }
        *slot = parsed;
    }
    Ok(out)
}

pub fn parse_color(value: &str) -> Result<[f32; 3], String> {
    let channels = split_components::<3>(value, "colour")?;
    if channels.iter().any(|channel| !(0.0..=1.0).contains(channel)) {
        return Err(format!("colour '{value}' has a channel outside 0..1"));
    }
    Ok(channels.map(|channel| channel as f32))
}

pub fn parse_surface_size(value: &str) -> Result<SurfaceSize, String> {
    presets::parse_size(value).map(SurfaceSize::from)
}

pub fn parse_pointer(value: &str) -> Result<[f64; 2], String> {
    split_components::<2>(value, "pointer")
}

fn parse_float(value: &str) -> Result<f32, String> {
    let parsed = value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("invalid number '{value}'"))?;
    if !parsed.is_finite() {
        return Err(format!("'{value}' must be finite"));
    }
    Ok(parsed)
}

pub fn parse_finite(value: &str) -> Result<f32, String> {
    parse_float(value)
}

pub fn parse_non_negative(value: &str) -> Result<f32, String> {
    let parsed = parse_float(value)?;
    if parsed < 0.0 {
        return Err(format!("'{value}' must be >= 0"));
    }
    Ok(parsed)
}

pub fn parse_positive(value: &str) -> Result<f32, String> {
    let parsed = parse_float(value)?;
    if parsed <= 0.0 {
        return Err(format!("'{value}' must be > 0"));
    }
    Ok(parsed)
}

pub fn parse_unit(value: &str) -> Result<f32, String> {
    let parsed = parse_float(value)?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(format!("'{value}' must be within 0..1"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colours() {
        assert_eq!(parse_color("0.1,0.7,0.8").unwrap(), [0.1, 0.7, 0.8]);
        assert_eq!(parse_color(" 1, 0 ,0.5").unwrap(), [1.0, 0.0, 0.5]);
        assert!(parse_color("0.1,0.7").is_err());
        assert!(parse_color("0.1,0.7,1.2").is_err());
        assert!(parse_color("red,green,blue").is_err());
        assert!(parse_color("nan,0,0").is_err());
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("640x360"), Ok(SurfaceSize::new(640, 360)));
        assert!(parse_surface_size("640x0").is_err());
    }

    #[test]
    fn parses_pointers() {
        assert_eq!(parse_pointer("12.5,40").unwrap(), [12.5, 40.0]);
        assert_eq!(parse_pointer("-3,7").unwrap(), [-3.0, 7.0]);
        assert!(parse_pointer("1,2,3").is_err());
        assert!(parse_pointer("inf,0").is_err());
    }

    #[test]
    fn validates_scalar_ranges() {
        assert_eq!(parse_unit("0.25"), Ok(0.25));
        assert!(parse_unit("1.5").is_err());
        assert!(parse_positive("0").is_err());
        assert_eq!(parse_non_negative("0"), Ok(0.0));
        assert!(parse_non_negative("-1").is_err());
        assert_eq!(parse_finite("-2.5"), Ok(-2.5));
        assert!(parse_finite("inf").is_err());
    }

    #[test]
    fn knobs_override_preset_fields() {
        let knobs = KnobArgs {
            wave_color: Some([0.1, 0.2, 0.3]),
            pixel_size: Some(6),
            no_pointer: true,
            ..KnobArgs::default()
        };
        let params = knobs.apply(DitherParams::default());
        assert_eq!(params.wave_color, [0.1, 0.2, 0.3]);
        assert_eq!(params.pixel_size, 6);
        assert!(!params.pointer_enabled);
        assert_eq!(params.color_num, DitherParams::default().color_num);

        assert_eq!(KnobArgs::default().apply(DitherParams::default()), DitherParams::default());
    }

    #[test]
    fn parses_still_command_with_global_overrides() {
        let cli = Cli::try_parse_from([
            "dithershade",
            "still",
            "--time",
            "1.5",
            "--output",
            "frame.png",
            "--pointer",
            "10,20",
            "--preset",
            "teal",
            "--size",
            "64x48",
            "--wave-speed",
            "-0.5",
        ])
        .unwrap();

        let Some(Command::Still(still)) = cli.command else {
            panic!("expected still command");
        };
        assert_eq!(still.time, 1.5);
        assert_eq!(still.output, PathBuf::from("frame.png"));
        assert_eq!(still.pointer, Some([10.0, 20.0]));
        assert_eq!(cli.run.preset.as_deref(), Some("teal"));
        assert_eq!(cli.run.size, Some(SurfaceSize::new(64, 48)));
        assert_eq!(cli.run.knobs.wave_speed, Some(-0.5));
    }

    #[test]
    fn rejects_zero_bands() {
        assert!(Cli::try_parse_from(["dithershade", "--color-num", "0"]).is_err());
        assert!(Cli::try_parse_from(["dithershade", "--pixel-size", "0"]).is_err());
    }
}
