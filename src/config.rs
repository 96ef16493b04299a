use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ISS_URL: &str = "http://api.open-notify.org/iss-now.json";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File path or http(s) URL of the locations list.
    pub locations: String,
    pub track_satellite: bool,
    pub satellite_url: String,
    pub satellite_interval: Duration,
    /// Radians per frame.
    pub rotation_step: f64,
    pub fps: u32,
    pub pick_radius: f64,
    pub stars: usize,
    pub speech_command: Option<String>,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locations: "data/locations.json".to_string(),
            track_satellite: true,
            satellite_url: DEFAULT_ISS_URL.to_string(),
            satellite_interval: Duration::from_secs(5),
            rotation_step: 0.0002,
            fps: 30,
            pick_radius: 1.0,
            stars: 200,
            speech_command: None,
            log_file: PathBuf::from("globe.log"),
        }
    }
}

impl Config {
    /// Read `GLOBE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("GLOBE_LOCATIONS") {
            config.locations = v;
        }
        if let Some(v) = lookup("GLOBE_TRACK_ISS") {
            config.track_satellite = parse_bool("GLOBE_TRACK_ISS", &v)?;
        }
        if let Some(v) = lookup("GLOBE_ISS_URL") {
            config.satellite_url = v;
        }
        if let Some(v) = lookup("GLOBE_ISS_INTERVAL_SECS") {
            let secs: u64 = parse("GLOBE_ISS_INTERVAL_SECS", &v)?;
            if secs == 0 {
                return Err(invalid("GLOBE_ISS_INTERVAL_SECS", v, "must be at least 1"));
            }
            config.satellite_interval = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("GLOBE_ROTATION_STEP") {
            let step: f64 = parse("GLOBE_ROTATION_STEP", &v)?;
            if !step.is_finite() {
                return Err(invalid("GLOBE_ROTATION_STEP", v, "must be finite"));
            }
            config.rotation_step = step;
        }
        if let Some(v) = lookup("GLOBE_FPS") {
            let fps: u32 = parse("GLOBE_FPS", &v)?;
            if fps == 0 || fps > 240 {
                return Err(invalid("GLOBE_FPS", v, "must be between 1 and 240"));
            }
            config.fps = fps;
        }
        if let Some(v) = lookup("GLOBE_PICK_RADIUS") {
            let radius: f64 = parse("GLOBE_PICK_RADIUS", &v)?;
            if !(radius.is_finite() && radius > 0.0) {
                return Err(invalid("GLOBE_PICK_RADIUS", v, "must be positive"));
            }
            config.pick_radius = radius;
        }
        if let Some(v) = lookup("GLOBE_STARS") {
            config.stars = parse("GLOBE_STARS", &v)?;
        }
        if let Some(v) = lookup("GLOBE_SPEECH_CMD") {
            if !v.trim().is_empty() {
                config.speech_command = Some(v);
            }
        }
        if let Some(v) = lookup("GLOBE_LOG") {
            config.log_file = PathBuf::from(v);
        }

        Ok(config)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps))
    }
}

fn invalid(key: &'static str, value: String, reason: &'static str) -> ConfigError {
    ConfigError::Invalid { key, value, reason }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value.to_string(), "not a valid number"))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value.to_string(), "expected true or false")),
    }
}
