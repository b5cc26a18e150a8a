//! Flotilla configuration.
//!
//! Loaded from `~/.flotilla/config.toml`. Defaults apply when the file is
//! missing; an invalid file is an error.
//!
//! The two dispatch constants live here rather than in code: the coarse
//! proximity threshold and the single reference timezone both look like
//! values an operator will want to tune without a rebuild.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Flotilla configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// IANA name of the reference timezone used to extract calendar dates
    /// for the same-delivery-day rule and to stamp alerts. One fixed zone
    /// keeps a deadline near midnight from flipping days between
    /// differently-zoned clients.
    pub timezone: String,

    /// Admission threshold for origin/destination proximity, in decimal
    /// degrees of latitude and longitude. A coarse filter (0.1° ≈ 11 km at
    /// the equator), not a routing distance.
    pub proximity_epsilon_deg: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "America/Mexico_City".to_string(),
            proximity_epsilon_deg: 0.1,
        }
    }
}

impl Config {
    /// Load config from `~/.flotilla/config.toml`.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file
    /// is an error.
    pub fn load() -> Result<Self, String> {
        let path = Self::path().ok_or("could not determine home directory")?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if !config.proximity_epsilon_deg.is_finite() || config.proximity_epsilon_deg <= 0.0 {
            return Err(format!(
                "proximity-epsilon-deg must be a positive number of degrees in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.flotilla/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".flotilla").join("config.toml"))
    }
}
