//! Configuration file support for face-qc.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/face-qc/config.toml` (lowest priority)
//! - Project-local: `.face-qc.toml` (searched up directory tree)
//! - An explicit `--config FILE`
//! - CLI flags (highest priority, applied separately)
//!
//! Files are merged table by table before deserialization, so a later file
//! only overrides the keys it actually sets. Pipeline sections (`quality`,
//! `face`, `awb`, `lighting`, `orchestrator`) map onto
//! [`PipelineConfig`]; `general` and `output` hold CLI settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use face_qc_core::PipelineConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commands::check::{LandmarkSource, OutputFormat};

const APP_DIR: &str = "face-qc";
const PROJECT_FILE: &str = ".face-qc.toml";

/// General options.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Recurse into subdirectories by default.
    pub recursive: Option<bool>,
    /// Where face landmarks come from.
    pub landmarks: Option<LandmarkSource>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format.
    pub format: Option<OutputFormat>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
    /// Directory for white-balanced copies.
    pub corrected_dir: Option<PathBuf>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CliSections {
    general: GeneralConfig,
    output: OutputConfig,
}

/// Merged configuration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Output options.
    pub output: OutputConfig,
    /// Stage thresholds and orchestration.
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Loads and merges every configuration layer.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/face-qc/config.toml`
    /// 2. Project-local: `.face-qc.toml` (searched up from cwd)
    /// 3. `explicit`, if given
    ///
    /// Missing XDG and project files are skipped; a missing explicit file is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut table = toml::Table::new();
        for path in layer_paths(explicit)? {
            info!("Loading config: {}", path.display());
            merge_tables(&mut table, read_table(&path)?);
        }
        Self::from_table(table)
    }

    /// Builds the configuration from an already merged table.
    ///
    /// # Errors
    ///
    /// Returns an error if a value has the wrong type.
    pub fn from_table(table: toml::Table) -> Result<Self> {
        let sections: CliSections = toml::Value::Table(table.clone())
            .try_into()
            .context("Invalid [general] or [output] section")?;
        let pipeline: PipelineConfig = toml::Value::Table(table)
            .try_into()
            .context("Invalid pipeline configuration")?;
        Ok(Self {
            general: sections.general,
            output: sections.output,
            pipeline,
        })
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        let toml::Value::Table(mut table) = toml::Value::try_from(&self.pipeline)? else {
            anyhow::bail!("Pipeline configuration is not a table");
        };
        table.insert("general".into(), toml::Value::try_from(&self.general)?);
        table.insert("output".into(), toml::Value::try_from(&self.output)?);
        Ok(toml::to_string_pretty(&table)?)
    }
}

/// Files that contribute to the configuration, lowest priority first.
///
/// # Errors
///
/// Returns an error if `explicit` does not exist.
pub fn layer_paths(explicit: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    if let Some(xdg_path) = xdg_config_path() {
        if xdg_path.is_file() {
            paths.push(xdg_path);
        } else {
            debug!("XDG config not found: {}", xdg_path.display());
        }
    }
    if let Some(project_path) = find_project_config() {
        paths.push(project_path);
    }
    if let Some(path) = explicit {
        anyhow::ensure!(path.is_file(), "Config file not found: {}", path.display());
        paths.push(path.to_path_buf());
    }
    Ok(paths)
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.face-qc.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_FILE))
        .find(|path| path.is_file())
}

fn read_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Merges `other` into `base`; nested tables merge key by key, anything else
/// is replaced.
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn parse(text: &str) -> toml::Table {
        toml::from_str(text).expect("valid toml")
    }

    #[test]
    fn test_empty_table_gives_defaults() {
        let config = AppConfig::from_table(toml::Table::new()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.pipeline.validate().is_ok());
    }

    #[test]
    fn test_parse_cli_sections() {
        let config = AppConfig::from_table(parse(
            r"
[general]
recursive = true
landmarks = 'sidecar'

[output]
format = 'json'
pretty = true
corrected_dir = 'out'
",
        ))
        .unwrap();

        assert_eq!(config.general.recursive, Some(true));
        assert_eq!(config.general.landmarks, Some(LandmarkSource::Sidecar));
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert_eq!(config.output.pretty, Some(true));
        assert_eq!(config.output.corrected_dir, Some(PathBuf::from("out")));
        assert!(config.output.progress.is_none());
    }

    #[test]
    fn test_parse_pipeline_sections() {
        let config = AppConfig::from_table(parse(
            r"
[orchestrator]
min_overall_score = 70.0
skip_awb = true

[quality.sharpness]
rejected_below = 50.0
",
        ))
        .unwrap();

        assert_eq!(config.pipeline.orchestrator.min_overall_score, 70.0);
        assert!(config.pipeline.orchestrator.skip_awb);
        assert_eq!(config.pipeline.quality.sharpness.rejected_below, 50.0);
        assert_eq!(config.pipeline.quality.sharpness.warning_below, 120.0);
    }

    #[test]
    fn test_merge_overrides_only_set_keys() {
        let mut base = parse(
            r"
[output]
format = 'json'
pretty = true

[orchestrator.timeouts]
face_ms = 100
awb_ms = 200
",
        );
        merge_tables(
            &mut base,
            parse(
                r"
[output]
format = 'jsonl'

[orchestrator.timeouts]
awb_ms = 900
",
            ),
        );

        let config = AppConfig::from_table(base).unwrap();
        assert_eq!(config.output.format, Some(OutputFormat::Jsonl));
        assert_eq!(config.output.pretty, Some(true));
        assert_eq!(config.pipeline.orchestrator.timeouts.face_ms, 100);
        assert_eq!(config.pipeline.orchestrator.timeouts.awb_ms, 900);
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base = parse("[general]\nrecursive = false\n");
        merge_tables(&mut base, toml::Table::new());
        let config = AppConfig::from_table(base).unwrap();
        assert_eq!(config.general.recursive, Some(false));
    }

    #[test]
    fn test_invalid_field_type_is_an_error() {
        let err = AppConfig::from_table(parse("[orchestrator]\nskip_awb = 'yes'\n")).unwrap_err();
        assert!(err.to_string().contains("pipeline"));

        let err = AppConfig::from_table(parse("[output]\nformat = 'xml'\n")).unwrap_err();
        assert!(err.to_string().contains("[output]"));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = AppConfig::from_table(parse(
            r"
[unknown_section]
foo = 'bar'

[lighting]
not_a_field = 1
",
        ))
        .unwrap();
        assert_eq!(config.pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = AppConfig::default();
        config.general.recursive = Some(true);
        config.output.format = Some(OutputFormat::Json);
        config.pipeline.orchestrator.min_overall_score = 72.5;

        let text = config.to_toml().unwrap();
        assert!(text.contains("[orchestrator]"));
        assert!(text.contains("[general]"));

        let reparsed = AppConfig::from_table(parse(&text)).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_find_config_in_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(PROJECT_FILE), "").unwrap();

        assert_eq!(
            find_config_in_parents(&nested),
            Some(dir.path().join(PROJECT_FILE))
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = layer_paths(Some(Path::new("/no/such/face-qc.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
