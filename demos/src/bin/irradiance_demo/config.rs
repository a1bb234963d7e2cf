//! Demo settings loaded from an optional TOML file.

use std::path::{Path, PathBuf};

use lightprobe_graphics::{BackendType, PipelineType};
use serde::Deserialize;

/// Resolved demo settings.
///
/// Every field may be given in the TOML file; command-line flags override
/// the file.
///
/// ```toml
/// env = ["sky_a.hdr", "sky_b.hdr"]
/// pipeline = "compute"
/// frames = 120
/// backend = "software"
/// output = "out"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Environment cube crosses to cycle through.
    pub env: Vec<PathBuf>,
    /// Requested filter variant name.
    pub pipeline: String,
    /// Number of frames to record and submit.
    pub frames: u64,
    /// Simulated seconds per frame.
    pub time_step: f64,
    /// Advance to the next variant every this many frames (0 disables).
    pub cycle_pipelines: u64,
    /// Allow typed UAV loads.
    pub typed_uav: bool,
    /// Backend name.
    pub backend: String,
    /// Directory receiving the output faces.
    pub output: Option<PathBuf>,
    /// Report the RMS difference against the brute-force reference.
    pub compare: bool,
    /// Freeze time at zero.
    pub paused: bool,
    /// Spherical-harmonics order.
    pub sh_order: u32,
    /// Proxy face size used by the SH projection.
    pub proxy_size: u32,
    /// Seconds each environment stays on screen.
    pub cycle_period: f64,
    /// Face size of the procedural sky.
    pub sky_size: u32,
    /// Number of procedural skies to cross-fade.
    pub sky_count: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            env: Vec::new(),
            pipeline: PipelineType::default().name().to_string(),
            frames: 1,
            time_step: 1.0 / 60.0,
            cycle_pipelines: 0,
            typed_uav: true,
            backend: BackendType::Software.name().to_string(),
            output: None,
            compare: false,
            paused: false,
            sh_order: lightprobe_graphics::probe::DEFAULT_SH_ORDER,
            proxy_size: 64,
            cycle_period: lightprobe_graphics::probe::DEFAULT_CYCLE_PERIOD,
            sky_size: 32,
            sky_count: 2,
        }
    }
}

impl DemoConfig {
    /// Parsed [`DemoConfig::pipeline`].
    pub fn pipeline_type(&self) -> Result<PipelineType, String> {
        PipelineType::from_name(&self.pipeline)
            .ok_or_else(|| format!("unknown pipeline '{}'", self.pipeline))
    }

    /// Parsed [`DemoConfig::backend`].
    pub fn backend_type(&self) -> Result<BackendType, String> {
        BackendType::from_name(&self.backend)
            .ok_or_else(|| format!("unknown backend '{}'", self.backend))
    }
}

/// Load a demo config from a TOML file.
///
/// Returns `Err` with a human-readable message if the file cannot be read
/// or parsed.
pub fn load_config(path: &Path) -> Result<DemoConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    parse_config(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
}

fn parse_config(content: &str) -> Result<DemoConfig, toml::de::Error> {
    toml::from_str(content)
}
