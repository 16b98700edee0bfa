use crate::error::ConfigError;
use crate::lattice::Params;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub radius: i32,
    pub iterations: u64,
    pub beta: f64,
    pub gamma: f64,
    /// Carried for compatibility with older parameter sets; the update rule
    /// does not read it.
    pub alpha: f64,
    pub steps_per_frame: u32,
    pub frame_ms: u64,
    pub enable_color: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            radius: 40,
            iterations: 500,
            beta: 0.4,
            gamma: 0.001,
            alpha: 1.0,
            steps_per_frame: 5,
            frame_ms: 40,
            enable_color: true,
        }
    }
}

impl SimConfig {
    pub fn params(&self) -> Params {
        Params {
            beta: self.beta,
            gamma: self.gamma,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius < 0 {
            return Err(invalid("radius", format!("must be >= 0, got {}", self.radius)));
        }
        if !self.beta.is_finite() || !(0.0..1.0).contains(&self.beta) {
            return Err(invalid("beta", format!("must be in [0, 1), got {}", self.beta)));
        }
        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(invalid("gamma", format!("must be >= 0, got {}", self.gamma)));
        }
        if self.steps_per_frame == 0 {
            return Err(invalid("steps_per_frame", "must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

/// Default config location, e.g. `~/.config/snowflake/config.json` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "snowflake", "Snowflake")
        .map(|proj| proj.config_dir().join("config.json"))
}

/// Read a config file. A missing file yields the defaults; a present but
/// malformed file is an error.
pub fn load_config(path: &Path) -> Result<SimConfig, ConfigError> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SimConfig::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_str(&s).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn save_config_atomic(path: &Path, cfg: &SimConfig) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let data = serde_json::to_vec_pretty(cfg)?;
    write_atomic(path, &data)
}

/// Write through a sibling temp file and rename it over `path`.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
