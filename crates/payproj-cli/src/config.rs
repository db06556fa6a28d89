// CLI settings
// Loaded from payproj.toml (--config, else ./payproj.toml, else defaults)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use payproj_core::BusinessDaySequencer;
use payproj_render::{ExcelExporter, TextGridRenderer};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "payproj.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Amounts
    pub currency: String,

    // Calendar
    pub max_days: usize,
    pub lookahead_days: u32,
    pub max_extension_days: u32,

    // Export
    pub placeholder: String,
    pub sheet_title: String,
    pub logo: Option<PathBuf>,  // None = no branding
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "€".into(),
            max_days: 10,
            lookahead_days: 10,
            max_extension_days: 366,
            placeholder: "—".into(),
            sheet_title: "Payment projections".into(),
            logo: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load from `path`, or from `./payproj.toml` when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    debug!("no {DEFAULT_CONFIG_FILE}, using default settings");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn sequencer(&self) -> BusinessDaySequencer {
        BusinessDaySequencer::new()
            .lookahead_days(self.lookahead_days)
            .max_extension_days(self.max_extension_days)
    }

    pub fn exporter(&self) -> ExcelExporter {
        let mut exporter = ExcelExporter::new()
            .currency(&self.currency)
            .placeholder(&self.placeholder)
            .title(&self.sheet_title);
        if let Some(ref logo) = self.logo {
            exporter = exporter.logo(logo);
        }
        exporter
    }

    pub fn text_renderer(&self) -> TextGridRenderer {
        TextGridRenderer::new().placeholder(&self.placeholder)
    }
}
