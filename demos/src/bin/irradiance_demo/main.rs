//! # Irradiance Demo
//!
//! Headless driver for the light-probe filters:
//! - Loads cube-cross environment maps, or synthesizes a procedural sky
//! - Cross-fades the sources over time and records one filter variant per frame
//! - Optionally cycles through the variants every N frames
//! - Writes the irradiance and radiance faces as Radiance HDR files
//! - Prints SH coefficients and the error against a brute-force reference

mod args;
mod config;
mod output;

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use lightprobe_core::{frame_mark, profile_scope};
use lightprobe_demos::sky::sky_sequence;
use lightprobe_graphics::probe::FRAME_COUNT;
use lightprobe_graphics::{
    BackendType, Buffer, CommandList, DescriptorTableCache, GraphicsDevice, LightProbe,
    LightProbeDescriptor, PipelineType,
};

use crate::args::DemoArgs;
use crate::config::DemoConfig;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    lightprobe_graphics::init();

    if let Err(e) = DemoArgs::parse().resolve().map_err(Into::into).and_then(run) {
        log::error!("irradiance_demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: DemoConfig) -> Result<(), Box<dyn Error>> {
    let backend = config.backend_type()?;
    let mut pipeline_type = config.pipeline_type()?;
    let device = GraphicsDevice::new(backend);
    log::info!("Using {} ({})", device.name(), backend.name());

    let descriptor = LightProbeDescriptor::new()
        .with_label("demo")
        .with_sh_order(config.sh_order)
        .with_proxy_size(config.proxy_size)
        .with_cycle_period(config.cycle_period)
        .with_typed_uav(config.typed_uav);

    let mut tables = DescriptorTableCache::default();
    let mut probe = {
        let mut uploaders: Vec<Arc<Buffer>> = Vec::new();
        let mut cmd = CommandList::new("init");
        let probe = if config.env.is_empty() {
            log::info!(
                "No environment given, synthesizing {} sky(s) of {}x{}",
                config.sky_count,
                config.sky_size,
                config.sky_size
            );
            let skies = sky_sequence(config.sky_size, config.sky_count.max(1))?;
            LightProbe::init(&device, &mut cmd, &mut tables, &mut uploaders, &skies, descriptor)?
        } else {
            LightProbe::load(
                &device,
                &mut cmd,
                &mut tables,
                &mut uploaders,
                &config.env,
                descriptor,
            )?
        };
        device.submit(&cmd)?;
        // Staging buffers are released once the upload has executed.
        drop(uploaders);
        probe
    };

    let mut recorded = pipeline_type;
    for frame in 0..config.frames {
        profile_scope!("frame");
        let time = if config.paused {
            0.0
        } else {
            frame as f64 * config.time_step
        };
        let slot = (frame % FRAME_COUNT as u64) as usize;

        probe.update_frame(time, slot);
        let mut cmd = CommandList::new(format!("frame_{frame}"));
        recorded = probe.process(&mut cmd, slot, pipeline_type)?;
        device.submit(&cmd)?;
        frame_mark!();
        log::debug!("Frame {frame}: t={time:.3}s, {recorded}, {} commands", cmd.len());

        if config.cycle_pipelines > 0 && (frame + 1) % config.cycle_pipelines == 0 {
            pipeline_type = pipeline_type.next(probe.typed_uav());
            log::info!("Frame {}: switching to {pipeline_type}", frame + 1);
        }
    }

    if config.frames == 0 {
        log::warn!("No frames were run; nothing to report");
        return Ok(());
    }
    if backend == BackendType::Dummy {
        log::warn!("The dummy backend does not execute passes; results are zero");
    }
    report(&probe, &config, recorded)
}

fn report(
    probe: &LightProbe,
    config: &DemoConfig,
    recorded: PipelineType,
) -> Result<(), Box<dyn Error>> {
    let radiance = probe.read_radiance()?;

    if recorded.uses_pyramid() {
        let irradiance = probe.read_irradiance(0)?;
        if let Some(dir) = &config.output {
            output::write_cube(dir, "irradiance", &irradiance)?;
            output::write_cube(dir, "radiance", &radiance)?;
            log::info!("Wrote irradiance and radiance faces to '{}'", dir.display());
        }
        if config.compare {
            let rms = output::compare_with_reference(&radiance, &irradiance)?;
            log::info!("{recorded}: RMS difference against reference = {rms:.6}");
        }
    } else {
        let sh = probe.read_sh()?;
        println!("SH coefficients (order {}):\n{}", sh.order(), output::format_sh(&sh));
        let size = probe.irradiance().width();
        let irradiance = output::sh_irradiance_cube(&sh, size)?;
        if let Some(dir) = &config.output {
            output::write_cube(dir, "sh_irradiance", &irradiance)?;
            output::write_cube(dir, "radiance", &radiance)?;
            log::info!("Wrote SH irradiance and radiance faces to '{}'", dir.display());
        }
        if config.compare {
            let rms = output::compare_with_reference(&radiance, &irradiance)?;
            log::info!("{recorded}: RMS difference against reference = {rms:.6}");
        }
    }
    Ok(())
}
