//! Check command - run the photo pipeline over files and directories.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use face_qc_adapters::{corrected_path, load_detections, save_image, FsImageSource};
use face_qc_core::{
    AnalysisResult, ImageDimensions, ImageSource, LandmarkProvider, Pipeline, PipelineConfig,
    ProgressEvent, ProgressSink, ResultOutput, StaticLandmarkProvider, SyntheticLandmarkProvider,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Where face landmarks come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkSource {
    /// `<photo>.landmarks.json` written by an external detector
    #[default]
    Sidecar,
    /// A generated frontal face for every photo (demos only, nothing is measured)
    Synthetic,
}

/// Parse and validate a score (0-100).
fn parse_score(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0..=100"))
    }
}

/// Shared arguments for photo checks.
#[derive(Args, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckArgs {
    /// Files or directories to check
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Landmark source
    #[arg(long, value_enum)]
    pub landmarks: Option<LandmarkSource>,

    /// Write white-balanced copies into this directory
    #[arg(long, value_name = "DIR")]
    pub corrected_dir: Option<PathBuf>,

    /// Skip the capture quality stage
    #[arg(long)]
    pub skip_quality: bool,

    /// Skip the white balance stage
    #[arg(long)]
    pub skip_awb: bool,

    /// Skip the lighting stage
    #[arg(long)]
    pub skip_lighting: bool,

    /// Keep going after the quality stage rejects a photo
    #[arg(long)]
    pub continue_on_quality_failure: bool,

    /// Stop as soon as no usable face is found (missing or turned away)
    #[arg(long)]
    pub require_face: bool,

    /// Overall score a photo needs (0-100)
    #[arg(long, value_parser = parse_score)]
    pub min_score: Option<f64>,

    /// Time budget for every stage, in milliseconds
    #[arg(long, value_name = "MS")]
    pub stage_timeout_ms: Option<u64>,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Merged config (populated by `with_config`, not from CLI).
    #[arg(skip)]
    config: Option<AppConfig>,
}

impl CheckArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Built-in defaults
    /// 2. Config file values (XDG, project-local, `--config`)
    /// 3. CLI arguments (already set on self)
    #[must_use]
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        if !args.recursive {
            args.recursive = config.general.recursive.unwrap_or(false);
        }
        args.landmarks = args.landmarks.or(config.general.landmarks);

        args.format = args.format.or(config.output.format);
        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }
        if args.corrected_dir.is_none() {
            args.corrected_dir.clone_from(&config.output.corrected_dir);
        }

        args.config = Some(config.clone());
        args
    }

    /// Pipeline settings from config files with the CLI flags applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged settings are invalid.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut pipeline = self
            .config
            .as_ref()
            .map(|c| c.pipeline.clone())
            .unwrap_or_default();
        let orchestrator = &mut pipeline.orchestrator;
        orchestrator.skip_quality |= self.skip_quality;
        orchestrator.skip_awb |= self.skip_awb;
        orchestrator.skip_lighting |= self.skip_lighting;
        orchestrator.continue_on_quality_failure |= self.continue_on_quality_failure;
        if self.require_face {
            orchestrator.continue_on_face_failure = false;
        }
        if let Some(score) = self.min_score {
            orchestrator.min_overall_score = score;
        }
        if let Some(ms) = self.stage_timeout_ms {
            let t = &mut orchestrator.timeouts;
            t.quality_ms = ms;
            t.face_ms = ms;
            t.awb_ms = ms;
            t.lighting_ms = ms;
        }
        pipeline.validate().context("Invalid configuration")?;
        Ok(pipeline)
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Get landmark source with fallback to sidecar files.
    fn landmarks(&self) -> LandmarkSource {
        self.landmarks.unwrap_or_default()
    }
}

/// Result of running the check command.
#[derive(Debug)]
pub struct CheckResult {
    /// Number of photos that went through the pipeline.
    pub processed: usize,
    /// Of those, photos suitable for analysis.
    pub suitable: usize,
    /// Number of files that could not be loaded.
    pub skipped: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the check command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
///
/// # Errors
///
/// Returns an error if no paths are given, the configuration is invalid, or
/// output cannot be written.
pub fn run(args: &CheckArgs) -> Result<CheckResult> {
    info!("Running check command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let config = args.pipeline_config()?;

    let source = FsImageSource::new(args.paths.clone(), args.recursive);
    let total = source.count_hint();

    // Determine if we should show progress
    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(
        total.and_then(|t| u64::try_from(t).ok()),
        args.quiet,
        show_progress,
    );

    let output = JsonOutput::stdout(args.format(), args.pretty);

    process_images(&source, &config, &output, &progress_bar, args)
}

/// Runs every photo from `source` through a pipeline built from `config`.
fn process_images(
    source: &dyn ImageSource,
    config: &PipelineConfig,
    output: &dyn ResultOutput,
    progress: &dyn ProgressSink,
    args: &CheckArgs,
) -> Result<CheckResult> {
    let total = source.count_hint();
    let synthetic: Arc<dyn LandmarkProvider> = Arc::new(SyntheticLandmarkProvider::new());
    if args.landmarks() == LandmarkSource::Synthetic {
        warn!("Using synthetic landmarks: every photo gets a generated frontal face and face results are not measured");
    }
    let mut processed = 0usize;
    let mut suitable = 0usize;
    let mut skipped = 0usize;

    for (index, image_result) in source.images().enumerate() {
        let image = match image_result {
            Ok(img) => img,
            Err(e) => {
                // Note: error message contains the path via anyhow context
                progress.on_event(ProgressEvent::Skipped {
                    path: format!("image {index}"),
                    reason: format!("{e:#}"),
                });
                skipped += 1;
                continue;
            }
        };

        let path = image.path.clone();
        let provider = match args.landmarks() {
            LandmarkSource::Synthetic => Arc::clone(&synthetic),
            LandmarkSource::Sidecar => match sidecar_provider(Path::new(&path)) {
                Ok(provider) => provider,
                Err(e) => {
                    progress.on_event(ProgressEvent::Skipped {
                        path,
                        reason: format!("{e:#}"),
                    });
                    skipped += 1;
                    continue;
                }
            },
        };

        progress.on_event(ProgressEvent::Started {
            path: path.clone(),
            index,
            total,
        });

        let pipeline = Pipeline::new(config.clone(), provider);
        let result = pipeline.run(Arc::clone(&image.image));

        if let (Some(dir), Some(corrected)) = (&args.corrected_dir, &result.corrected_image) {
            let target = corrected_path(Path::new(&path), dir);
            match save_image(corrected, &target) {
                Ok(()) => debug!("Wrote corrected image {}", target.display()),
                Err(e) => warn!("Could not write corrected image for {path}: {e:#}"),
            }
        }

        if result.is_suitable_for_analysis {
            suitable += 1;
        }

        let analysis = AnalysisResult {
            path,
            timestamp: iso_timestamp(),
            dimensions: ImageDimensions::new(image.width, image.height),
            pipeline: result,
        };
        output.write(&analysis)?;
        progress.on_event(ProgressEvent::Completed {
            result: Box::new(analysis),
        });

        processed += 1;
    }

    output.flush()?;

    progress.on_event(ProgressEvent::Finished {
        processed,
        suitable,
        skipped,
    });
    info!(processed, suitable, skipped, "Check finished");

    let exit_code = if skipped > 0 {
        ExitCode::Error
    } else if suitable < processed {
        ExitCode::Rejected
    } else {
        ExitCode::Success
    };

    Ok(CheckResult {
        processed,
        suitable,
        skipped,
        exit_code,
    })
}

/// Landmarks for one photo from its sidecar; no sidecar means no face.
fn sidecar_provider(path: &Path) -> Result<Arc<dyn LandmarkProvider>> {
    let provider = match load_detections(path)? {
        Some(faces) => StaticLandmarkProvider::new(faces),
        None => {
            info!("No landmark sidecar for {}; treating as no face", path.display());
            StaticLandmarkProvider::empty()
        }
    };
    Ok(Arc::new(provider))
}

/// Generate ISO 8601 UTC timestamp (RFC 3339 format).
fn iso_timestamp() -> String {
    match time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339) {
        Ok(ts) => ts,
        Err(e) => {
            debug!("Timestamp format failed: {e}");
            String::from("1970-01-01T00:00:00Z")
        }
    }
}
