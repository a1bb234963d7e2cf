//! Command line arguments.
//!
//! Flags are layered over the optional `--config` file: anything given on the
//! command line wins.

use std::path::PathBuf;

use clap::Parser;
use lightprobe_graphics::{BackendType, PipelineType};

use crate::config::{DemoConfig, load_config};

/// Backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliBackend {
    /// Barrier and binding validation only; readbacks are zero.
    Dummy,
    /// CPU execution of every pass.
    Software,
}

impl From<CliBackend> for BackendType {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Dummy => BackendType::Dummy,
            CliBackend::Software => BackendType::Software,
        }
    }
}

/// Filter variant selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliPipeline {
    /// Compute downsample, graphics upsample.
    Hybrid,
    /// Graphics downsample and upsample.
    Graphics,
    /// Compute downsample, in-place compute upsample.
    Compute,
    /// Spherical-harmonics projection.
    Sh,
}

impl From<CliPipeline> for PipelineType {
    fn from(cli: CliPipeline) -> Self {
        match cli {
            CliPipeline::Hybrid => PipelineType::Hybrid,
            CliPipeline::Graphics => PipelineType::Graphics,
            CliPipeline::Compute => PipelineType::Compute,
            CliPipeline::Sh => PipelineType::Sh,
        }
    }
}

/// Light-probe irradiance demo arguments.
#[derive(Parser, Debug)]
#[command(
    name = "irradiance_demo",
    about = "Filter environment maps into irradiance cubes and SH coefficients",
    long_about = "Filters one or more cube-cross environment maps with the light-probe \
        pipelines for a number of frames, then writes the results.\n\n\
        EXAMPLES:\n\
          # Procedural sky, hybrid pipeline, write faces to ./out\n\
          ./irradiance_demo --output out --compare\n\
        \n\
          # Cross-fade two files and cycle variants every 10 frames\n\
          ./irradiance_demo --env a.hdr b.hdr --frames 40 --cycle-pipelines 10\n\
        \n\
          # SH projection of a single file\n\
          ./irradiance_demo --sh sky.hdr",
    version
)]
pub struct DemoArgs {
    /// Environment cube crosses (.hdr, .exr, .png) to cycle through.
    #[arg(long, num_args = 1.., conflicts_with = "sh")]
    pub env: Vec<PathBuf>,

    /// Project a single environment onto spherical harmonics.
    #[arg(long, value_name = "FILE")]
    pub sh: Option<PathBuf>,

    /// Filter variant to record.
    #[arg(long, value_enum)]
    pub pipeline: Option<CliPipeline>,

    /// Number of frames to run.
    #[arg(long)]
    pub frames: Option<u64>,

    /// Simulated seconds per frame.
    #[arg(long)]
    pub time_step: Option<f64>,

    /// Switch to the next variant every N frames.
    #[arg(long, value_name = "N")]
    pub cycle_pipelines: Option<u64>,

    /// Disable typed UAV loads (the compute variant falls back to hybrid).
    #[arg(long)]
    pub no_typed_uav: bool,

    /// Execution backend.
    #[arg(long, value_enum)]
    pub backend: Option<CliBackend>,

    /// Directory receiving the result faces as Radiance HDR files.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Report the RMS difference against a brute-force CPU convolution.
    #[arg(long)]
    pub compare: bool,

    /// TOML file with default settings.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Freeze time at zero.
    #[arg(long)]
    pub paused: bool,
}

impl DemoArgs {
    /// Load the config file, if any, and apply the command-line overrides.
    pub fn resolve(self) -> Result<DemoConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => DemoConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(self, config: &mut DemoConfig) {
        if !self.env.is_empty() {
            config.env = self.env;
        }
        if let Some(path) = self.sh {
            config.env = vec![path];
            config.pipeline = PipelineType::Sh.name().to_string();
        }
        if let Some(pipeline) = self.pipeline {
            config.pipeline = PipelineType::from(pipeline).name().to_string();
        }
        if let Some(frames) = self.frames {
            config.frames = frames;
        }
        if let Some(step) = self.time_step {
            config.time_step = step;
        }
        if let Some(every) = self.cycle_pipelines {
            config.cycle_pipelines = every;
        }
        if self.no_typed_uav {
            config.typed_uav = false;
        }
        if let Some(backend) = self.backend {
            config.backend = BackendType::from(backend).name().to_string();
        }
        if self.output.is_some() {
            config.output = self.output;
        }
        config.compare |= self.compare;
        config.paused |= self.paused;
    }
}
