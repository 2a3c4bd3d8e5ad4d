use std::path::PathBuf;

use anyhow::{Context, Result};
use presets::{Preset, PresetConfig};
use renderer::{DitherParams, Renderer, RendererConfig, StillRequest, SurfaceSize};
use tracing_subscriber::EnvFilter;

use crate::cli::{RunArgs, StillArgs};
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Opens the preview window.
pub fn run(args: &RunArgs) -> Result<()> {
    let (config, preset) = resolve(args)?;
    tracing::info!(
        preset = %preset,
        width = config.surface_size.width,
        height = config.surface_size.height,
        fps = ?config.target_fps,
        "starting dithershade preview"
    );
    Renderer::new(config).run()
}

pub fn export_still(args: &RunArgs, still: &StillArgs) -> Result<()> {
    let (config, preset) = resolve(args)?;
    tracing::debug!(preset = %preset, ?config, "exporting still frame");
    Renderer::new(config).export_still(&StillRequest {
        time: still.time,
        pointer: still.pointer,
        output: still.output.clone(),
    })
}

pub fn list_presets(args: &RunArgs) -> Result<()> {
    let (config_file, config) = load_config(args)?;
    println!("Presets ({}):", config_file.display());
    for (name, preset) in &config.presets {
        let marker = if name == config.default_preset() { "*" } else { " " };
        println!("{marker} {name:<14} {}", describe(&preset_params(preset)));
    }
    Ok(())
}

pub fn print_where(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config_file = config_path(args, &paths);
    let status = if config_file.exists() {
        "present"
    } else {
        "missing; built-in presets only"
    };
    println!("Configuration:");
    println!("  config dir:  {}", paths.config_dir().display());
    println!("  config file: {} ({status})", config_file.display());
    Ok(())
}

fn config_path(args: &RunArgs, paths: &AppPaths) -> PathBuf {
    args.config.clone().unwrap_or_else(|| paths.config_file())
}

fn load_config(args: &RunArgs) -> Result<(PathBuf, PresetConfig)> {
    let paths = AppPaths::discover()?;
    let config_file = config_path(args, &paths);
    if args.config.is_some() && !config_file.exists() {
        anyhow::bail!("configuration file {} does not exist", config_file.display());
    }
    let config = PresetConfig::load(&config_file)
        .with_context(|| format!("failed to load {}", config_file.display()))?;
    tracing::debug!(
        config = %config_file.display(),
        presets = config.presets.len(),
        "resolved dithershade configuration"
    );
    Ok((config_file, config))
}

/// Merges config defaults, the selected preset and CLI overrides.
fn resolve(args: &RunArgs) -> Result<(RendererConfig, String)> {
    let (_, config) = load_config(args)?;
    let preset = args
        .preset
        .clone()
        .unwrap_or_else(|| config.default_preset().to_string());
    let params = config
        .resolve(Some(&preset))
        .map(preset_params)
        .context("failed to resolve shader parameters")?;

    let renderer_config = RendererConfig {
        surface_size: args
            .size
            .unwrap_or_else(|| SurfaceSize::from(config.surface_size())),
        params: args.knobs.apply(params),
        target_fps: args.fps.or(config.fps()).filter(|fps| *fps > 0.0),
        frame_budget: config.frame_budget(),
    };
    Ok((renderer_config, preset))
}

/// Fills the fields a preset leaves unset from the renderer defaults.
fn preset_params(preset: &Preset) -> DitherParams {
    let base = DitherParams::default();
    DitherParams {
        wave_color: preset.wave_color.unwrap_or(base.wave_color),
        color_num: preset.color_num.unwrap_or(base.color_num),
        pixel_size: preset.pixel_size.unwrap_or(base.pixel_size),
        wave_speed: preset.wave_speed.unwrap_or(base.wave_speed),
        wave_frequency: preset.wave_frequency.unwrap_or(base.wave_frequency),
        wave_amplitude: preset.wave_amplitude.unwrap_or(base.wave_amplitude),
        pointer_enabled: preset.pointer.unwrap_or(base.pointer_enabled),
        pointer_radius: preset.pointer_radius.unwrap_or(base.pointer_radius),
    }
}

fn describe(params: &DitherParams) -> String {
    let [r, g, b] = params.wave_color;
    format!(
        "color=({r:.4}, {g:.4}, {b:.4}) bands={} pixel={} speed={} frequency={} amplitude={} pointer={}",
        params.color_num,
        params.pixel_size,
        params.wave_speed,
        params.wave_frequency,
        params.wave_amplitude,
        if params.pointer_enabled {
            format!("on(radius={})", params.pointer_radius)
        } else {
            "off".to_string()
        }
    )
}
