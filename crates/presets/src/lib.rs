//! Named dither presets and render defaults loaded from `config.toml`.
//!
//! Two presets are always available: `portfolio` and `teal`. A preset of the
//! same name in the file replaces the built-in one. Fields a preset omits are
//! left `None`; the host fills them from the renderer's defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const CONFIG_VERSION: u32 = 1;
pub const DEFAULT_PRESET: &str = "portfolio";
pub const DEFAULT_FRAME_BUDGET: Duration = Duration::from_millis(4);
/// Surface size as `(width, height)` in physical pixels.
pub const DEFAULT_SURFACE_SIZE: (u32, u32) = (1280, 720);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub preset: Option<String>,
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub frame_budget: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_size_opt")]
    pub size: Option<(u32, u32)>,
}

/// Partial set of shader knobs. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    pub wave_color: Option<[f32; 3]>,
    pub color_num: Option<u32>,
    pub pixel_size: Option<u32>,
    pub wave_speed: Option<f32>,
    pub wave_frequency: Option<f32>,
    pub wave_amplitude: Option<f32>,
    pub pointer: Option<bool>,
    pub pointer_radius: Option<f32>,
}

impl Preset {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let invalid = |what: &str| ConfigError::Invalid(format!("preset '{name}' {what}"));

        if let Some(color) = self.wave_color {
            if color.iter().any(|channel| !(0.0..=1.0).contains(channel)) {
                return Err(invalid("wave_color channels must be within [0, 1]"));
            }
        }
        if self.color_num == Some(0) {
            return Err(invalid("color_num must be >= 1"));
        }
        if self.pixel_size == Some(0) {
            return Err(invalid("pixel_size must be >= 1"));
        }
        if self.wave_speed.is_some_and(|speed| !speed.is_finite()) {
            return Err(invalid("wave_speed must be finite"));
        }
        if self.wave_frequency.is_some_and(|frequency| !frequency.is_finite()) {
            return Err(invalid("wave_frequency must be finite"));
        }
        if self
            .wave_amplitude
            .is_some_and(|amplitude| !(0.0..=1.0).contains(&amplitude))
        {
            return Err(invalid("wave_amplitude must be within [0, 1]"));
        }
        if self
            .pointer_radius
            .is_some_and(|radius| !(radius.is_finite() && radius > 0.0))
        {
            return Err(invalid("pointer_radius must be > 0"));
        }
        Ok(())
    }
}

/// Presets shipped with the binary. `portfolio` sets nothing, so it is
/// exactly the renderer's defaults.
pub fn builtin_presets() -> BTreeMap<String, Preset> {
    let mut presets = BTreeMap::new();
    presets.insert(DEFAULT_PRESET.to_string(), Preset::default());
    presets.insert(
        "teal".to_string(),
        Preset {
            wave_color: Some([0.1, 0.7, 0.8]),
            color_num: Some(4),
            pixel_size: Some(3),
            wave_speed: Some(0.05),
            wave_frequency: Some(3.0),
            wave_amplitude: Some(0.2),
            pointer: Some(true),
            pointer_radius: Some(0.4),
        },
    );
    presets
}

impl Default for PresetConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            defaults: Defaults::default(),
            presets: builtin_presets(),
        }
    }
}

impl PresetConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let mut config: PresetConfig = toml::from_str(input)?;
        for (name, preset) in builtin_presets() {
            config.presets.entry(name).or_insert(preset);
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the built-in configuration when the file is absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets.get(name)
    }

    pub fn default_preset(&self) -> &str {
        self.defaults.preset.as_deref().unwrap_or(DEFAULT_PRESET)
    }

    pub fn fps(&self) -> Option<f32> {
        self.defaults.fps
    }

    pub fn frame_budget(&self) -> Duration {
        self.defaults.frame_budget.unwrap_or(DEFAULT_FRAME_BUDGET)
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.defaults.size.unwrap_or(DEFAULT_SURFACE_SIZE)
    }

    /// The preset called `name`, or the default preset.
    pub fn resolve(&self, name: Option<&str>) -> Result<&Preset, ConfigError> {
        let name = name.unwrap_or_else(|| self.default_preset());
        self.preset(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        for (name, preset) in &self.presets {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("preset name may not be empty".into()));
            }
            preset.validate(name)?;
        }

        if let Some(default_preset) = &self.defaults.preset {
            if !self.presets.contains_key(default_preset) {
                return Err(ConfigError::Invalid(format!(
                    "defaults.preset references unknown preset '{default_preset}'"
                )));
            }
        }

        if let Some(fps) = self.defaults.fps {
            if !(fps.is_finite() && fps >= 0.0) {
                return Err(ConfigError::Invalid("defaults.fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

/// Parses `WIDTHxHEIGHT`, e.g. `1280x720`. Both dimensions must be non-zero.
pub fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let (width, height) = raw
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{raw}'; expected WIDTHxHEIGHT"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|err| format!("invalid size '{raw}': {err}"))
    };
    let size = (parse(width)?, parse(height)?);
    if size.0 == 0 || size.1 == 0 {
        return Err(format!("invalid size '{raw}'; dimensions must be > 0"));
    }
    Ok(size)
}

fn deserialize_size_opt<'de, D>(deserializer: D) -> Result<Option<(u32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|raw| parse_size(&raw).map_err(de::Error::custom))
        .transpose()
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}
