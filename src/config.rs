use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::{GrammarError, Result};

/// What to do with issues reported by the coverage pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoverageMode {
    /// Skip the pass entirely
    Ignore,
    /// Log each issue and continue
    #[default]
    Warn,
    /// Refuse to generate from a grammar with issues
    Deny,
}

/// Settings for one generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// How many times to advance from the axiom
    pub generations: usize,
    /// Turn angle handed to the renderer; never interpreted here
    pub angle_degrees: u32,
    /// Seed for a reproducible run; entropy-seeded when absent
    pub seed: Option<u64>,
    pub coverage: CoverageMode,
    /// Tolerance for the coverage pass
    pub tolerance: f64,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            generations: 0,
            angle_degrees: 90,
            seed: None,
            coverage: CoverageMode::Warn,
            tolerance: crate::grammar::DEFAULT_TOLERANCE,
            log_level: "warn".to_string(),
        }
    }
}

impl RunConfig {
    /// Parse a JSON configuration document
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| GrammarError::Config(e.to_string()))
    }

    /// Load a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| GrammarError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Rotation angle in radians, as the renderer consumes it
    pub fn angle_radians(&self) -> f64 {
        f64::from(self.angle_degrees).to_radians()
    }
}
