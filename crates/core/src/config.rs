//! Application configuration.
//!
//! Values come from built-in defaults, then `~/.config/poolboard/config.toml`,
//! then `POOLBOARD_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{exclusion::FileOverrideStore, models::Program, resource::HeaderLayout};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "poolboard";
/// Prefix for environment overrides, e.g. `POOLBOARD_DATA_DIR`.
pub const ENV_PREFIX: &str = "POOLBOARD";

const DEFAULT_CONFIG: &str = r#"# poolboard configuration
#
# Relative sheet and exclusion paths resolve against data_dir.

# data_dir = "/srv/poolboard"
program_a_csv = "program-a.csv"
program_b_csv = "program-b.csv"
program_a_label = "Program A"
program_b_label = "Program B"
exclusions_file = "exclusions.json"

# One of "auto", "state-only", "state-and-visit-type".
header_layout = "auto"

# overrides_dir = "~/.local/share/poolboard/overrides"
# export_dir = "./exports"
"#;

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory for relative data paths.
    pub data_dir: PathBuf,
    /// Sheet for the first program.
    pub program_a_csv: PathBuf,
    /// Sheet for the second program.
    pub program_b_csv: PathBuf,
    /// Display label for the first program.
    pub program_a_label: String,
    /// Display label for the second program.
    pub program_b_label: String,
    /// Static exclusion document.
    pub exclusions_file: PathBuf,
    /// Directory holding the persisted override list.
    pub overrides_dir: PathBuf,
    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,
    /// Header layout used for both sheets.
    pub header_layout: HeaderLayout,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|dir| dir.join(CONFIG_DIR))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            export_dir: data_dir.join("exports"),
            data_dir,
            program_a_csv: PathBuf::from("program-a.csv"),
            program_b_csv: PathBuf::from("program-b.csv"),
            program_a_label: "Program A".to_string(),
            program_b_label: "Program B".to_string(),
            exclusions_file: PathBuf::from("exclusions.json"),
            overrides_dir: FileOverrideStore::default_root(),
            header_layout: HeaderLayout::Auto,
        }
    }
}

impl AppConfig {
    /// Default config file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    }

    /// Load from the default file and the environment.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let settings = Config::builder()
            .add_source(File::from(path.as_path()).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        let config: Self = settings
            .try_deserialize()
            .context("invalid configuration values")?;
        info!(data_dir = %config.data_dir.display(), "configuration loaded");
        Ok(config)
    }

    /// Load from a specific TOML file only.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Display label for a program.
    pub fn label(&self, program: Program) -> &str {
        match program {
            Program::ProgramA => &self.program_a_label,
            Program::ProgramB => &self.program_b_label,
        }
    }

    /// Resolved sheet path for a program.
    pub fn sheet_path(&self, program: Program) -> PathBuf {
        let path = match program {
            Program::ProgramA => &self.program_a_csv,
            Program::ProgramB => &self.program_b_csv,
        };
        self.resolve(path)
    }

    /// Resolved exclusion document path.
    pub fn exclusions_path(&self) -> PathBuf {
        self.resolve(&self.exclusions_file)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

/// Write a commented default config file when none exists. Returns its path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}
