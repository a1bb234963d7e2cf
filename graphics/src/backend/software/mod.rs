//! Software GPU backend.
//!
//! Executes submitted command lists on the CPU. Cube textures are stored as
//! one f32 [`CubeImage`] per mip level regardless of their nominal format, and
//! buffers as plain `f32` words. Every command is validated by the same
//! [`StateValidator`] as the dummy backend before it runs.

mod kernels;

use std::collections::HashMap;

use lightprobe_core::cube::{CUBE_FACE_COUNT, CubeFace};
use lightprobe_core::math::Rgba;
use lightprobe_core::sh::{MAX_SH_ORDER, term_count};
use lightprobe_core::texture::CubeImage;

use crate::command::{Command, CommandList};
use crate::descriptor::{Descriptor, DescriptorTable};
use crate::device::DeviceCapabilities;
use crate::error::GraphicsError;
use crate::pipeline::{
    BlendMode, CosineConstants, PassId, PipelineDescriptor, PipelineKind, RadianceConstants,
    ShConstants, TEXTURE_GROUP_SIZE,
};
use crate::resources::TextureView;
use crate::types::{BufferDescriptor, BufferId, PipelineId, TextureDescriptor, TextureId};

use super::{GpuBackend, StateValidator, check_pipeline_support};

/// Texels of a mip level a pass invocation set covers.
#[derive(Debug, Clone, Copy)]
struct Coverage {
    width: u32,
    height: u32,
    layers: u32,
}

/// CPU executing backend.
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    capabilities: DeviceCapabilities,
    validator: StateValidator,
    textures: HashMap<TextureId, Vec<CubeImage>>,
    buffers: HashMap<BufferId, Vec<f32>>,
}

impl SoftwareBackend {
    /// Create a new software backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report different capabilities.
    pub fn with_capabilities(mut self, capabilities: DeviceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    fn image(&self, view: &TextureView) -> Result<&CubeImage, GraphicsError> {
        self.textures
            .get(&view.texture)
            .and_then(|mips| mips.get(view.base_mip as usize))
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "texture {} mip {} is not allocated",
                    view.texture.raw(),
                    view.base_mip
                ))
            })
    }

    fn image_mut(&mut self, view: &TextureView) -> Result<&mut CubeImage, GraphicsError> {
        self.textures
            .get_mut(&view.texture)
            .and_then(|mips| mips.get_mut(view.base_mip as usize))
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "texture {} mip {} is not allocated",
                    view.texture.raw(),
                    view.base_mip
                ))
            })
    }

    fn buffer(&self, id: BufferId) -> Result<&Vec<f32>, GraphicsError> {
        self.buffers
            .get(&id)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("unknown buffer {}", id.raw())))
    }

    fn buffer_mut(&mut self, id: BufferId) -> Result<&mut Vec<f32>, GraphicsError> {
        self.buffers
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("unknown buffer {}", id.raw())))
    }

    fn execute(&mut self, command: &Command) -> Result<(), GraphicsError> {
        match command {
            Command::Barrier(_) => Ok(()),
            Command::CopyBufferToTexture {
                buffer,
                texture,
                mip,
            } => self.copy_buffer_to_texture(*buffer, *texture, *mip),
            Command::CopyTexture {
                src,
                src_mip,
                dst,
                dst_mip,
            } => {
                let image = self
                    .textures
                    .get(src)
                    .and_then(|mips| mips.get(*src_mip as usize))
                    .cloned()
                    .ok_or_else(|| {
                        GraphicsError::InvalidParameter(format!("unknown texture {}", src.raw()))
                    })?;
                let target = self
                    .textures
                    .get_mut(dst)
                    .and_then(|mips| mips.get_mut(*dst_mip as usize))
                    .ok_or_else(|| {
                        GraphicsError::InvalidParameter(format!("unknown texture {}", dst.raw()))
                    })?;
                *target = image;
                Ok(())
            }
            Command::Dispatch {
                pipeline,
                table,
                constants,
                groups,
            } => {
                let pass = self.pass_of(*pipeline)?;
                self.dispatch(pass, table, constants, *groups)
            }
            Command::Draw {
                pipeline,
                table,
                constants,
                instance_count,
                ..
            } => {
                let desc = self
                    .validator
                    .pipeline(*pipeline)
                    .cloned()
                    .ok_or_else(|| {
                        GraphicsError::InvalidParameter(format!(
                            "unknown pipeline {}",
                            pipeline.raw()
                        ))
                    })?;
                let blend = match desc.kind {
                    PipelineKind::Graphics { blend } => blend,
                    PipelineKind::Compute { .. } => BlendMode::Replace,
                };
                self.draw(desc.pass, blend, table, constants, *instance_count)
            }
        }
    }

    fn pass_of(&self, pipeline: PipelineId) -> Result<PassId, GraphicsError> {
        self.validator
            .pipeline(pipeline)
            .map(|desc| desc.pass)
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!("unknown pipeline {}", pipeline.raw()))
            })
    }

    fn copy_buffer_to_texture(
        &mut self,
        buffer: BufferId,
        texture: TextureId,
        mip: u32,
    ) -> Result<(), GraphicsError> {
        let (width, height) = {
            let image = self
                .textures
                .get(&texture)
                .and_then(|mips| mips.get(mip as usize))
                .ok_or_else(|| {
                    GraphicsError::InvalidParameter(format!("unknown texture {}", texture.raw()))
                })?;
            (image.width(), image.height())
        };
        let texels = (width * height * CUBE_FACE_COUNT) as usize;
        let words = self.buffer(buffer)?;
        if words.len() < texels * 4 {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {} holds {} words, upload needs {}",
                buffer.raw(),
                words.len(),
                texels * 4
            )));
        }
        let layers: &[Rgba] = bytemuck::cast_slice(&words[..texels * 4]);
        let image = CubeImage::from_layers(width, height, layers)?;
        if let Some(slot) = self
            .textures
            .get_mut(&texture)
            .and_then(|mips| mips.get_mut(mip as usize))
        {
            *slot = image;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        pass: PassId,
        table: &DescriptorTable,
        constants: &[u8],
        groups: [u32; 3],
    ) -> Result<(), GraphicsError> {
        match pass {
            PassId::Resample | PassId::UpsampleInPlace | PassId::UpsampleInPlaceFinal => {
                let target = texture_at(table, table.len() - 1)?;
                let extent = self.image(&target)?;
                let coverage = Coverage {
                    width: (groups[0] * TEXTURE_GROUP_SIZE).min(extent.width()),
                    height: (groups[1] * TEXTURE_GROUP_SIZE).min(extent.height()),
                    layers: groups[2].min(target.layer_count),
                };
                self.run_texture_pass(pass, BlendMode::Replace, table, constants, coverage)
            }
            PassId::ShTransform => self.sh_transform(table, constants, groups[0]),
            PassId::ShSum => self.sh_sum(table, constants, groups[0]),
            PassId::ShNormalize => self.sh_normalize(table, constants),
            PassId::GenerateRadiance
            | PassId::ResampleGraphics
            | PassId::UpsampleGraphics
            | PassId::UpsampleGraphicsFinal => Err(GraphicsError::InvalidParameter(format!(
                "'{}' cannot be dispatched",
                pass.label()
            ))),
        }
    }

    fn draw(
        &mut self,
        pass: PassId,
        blend: BlendMode,
        table: &DescriptorTable,
        constants: &[u8],
        instances: u32,
    ) -> Result<(), GraphicsError> {
        let target = render_target(table)?;
        let image = self.image(&target)?;
        let coverage = Coverage {
            width: image.width(),
            height: image.height(),
            layers: instances.min(target.layer_count),
        };
        self.run_texture_pass(pass, blend, table, constants, coverage)
    }

    /// Run a per-texel pass over `coverage` texels of the table's last view.
    fn run_texture_pass(
        &mut self,
        pass: PassId,
        blend: BlendMode,
        table: &DescriptorTable,
        constants: &[u8],
        coverage: Coverage,
    ) -> Result<(), GraphicsError> {
        let target = texture_at(table, table.len() - 1)?;
        let (width, height) = {
            let image = self.image(&target)?;
            (image.width(), image.height())
        };

        // Inputs are snapshotted; the target may alias an input in place.
        let inputs: Vec<CubeImage> = (0..table.len() - 1)
            .map(|i| texture_at(table, i).and_then(|view| self.image(&view).cloned()))
            .collect::<Result<_, _>>()?;
        let previous = self.image(&target)?.clone();

        let shade: Box<dyn Fn(CubeFace, u32, u32) -> (Rgba, f32) + '_> = match pass {
            PassId::GenerateRadiance => {
                let c: RadianceConstants = read_constants(constants)?;
                let [a, b] = two_inputs(&inputs, pass)?;
                Box::new(move |face, x, y| {
                    let (s, t) = kernels::texel_st(x, y, width, height);
                    (kernels::radiance_texel(a, b, c.blend, face, s, t), 1.0)
                })
            }
            PassId::Resample | PassId::ResampleGraphics => {
                let src = one_input(&inputs, pass)?;
                Box::new(move |face, x, y| (kernels::resample_texel(src, face, x, y), 1.0))
            }
            PassId::UpsampleGraphics => {
                let c: CosineConstants = read_constants(constants)?;
                let coarse = one_input(&inputs, pass)?;
                let alpha = kernels::upsample_alpha(c.map_size, c.level);
                Box::new(move |face, x, y| {
                    (
                        kernels::cosine_upsample_texel(coarse, face, x, y, width, height),
                        alpha,
                    )
                })
            }
            PassId::UpsampleInPlace => {
                let c: CosineConstants = read_constants(constants)?;
                let coarse = one_input(&inputs, pass)?;
                let detail = &previous;
                let alpha = kernels::upsample_alpha(c.map_size, c.level);
                Box::new(move |face, x, y| {
                    let up = kernels::cosine_upsample_texel(coarse, face, x, y, width, height);
                    let old = detail.texel(face, x, y);
                    (lightprobe_core::math::lerp_rgba(old, up, alpha), 1.0)
                })
            }
            PassId::UpsampleGraphicsFinal | PassId::UpsampleInPlaceFinal => {
                let c: CosineConstants = read_constants(constants)?;
                let [coarse, radiance] = two_inputs(&inputs, pass)?;
                let alpha = kernels::upsample_alpha(c.map_size, c.level);
                Box::new(move |face, x, y| {
                    let up = kernels::cosine_upsample_texel(coarse, face, x, y, width, height);
                    let (s, t) = kernels::texel_st(x, y, width, height);
                    let detail = radiance.sample_face(face, s, t);
                    (lightprobe_core::math::lerp_rgba(detail, up, alpha), 1.0)
                })
            }
            PassId::ShTransform | PassId::ShSum | PassId::ShNormalize => {
                return Err(GraphicsError::InvalidParameter(format!(
                    "'{}' is not a texture pass",
                    pass.label()
                )));
            }
        };

        let layer_range = target.base_layer..target.base_layer + coverage.layers;
        let mut output = previous.clone();
        for layer in layer_range {
            let face = CubeFace::from_index(layer as usize).ok_or_else(|| {
                GraphicsError::InvalidParameter(format!("layer {layer} is not a cube face"))
            })?;
            for y in 0..coverage.height {
                for x in 0..coverage.width {
                    let (color, alpha) = shade(face, x, y);
                    let value = match blend {
                        BlendMode::Replace => color,
                        BlendMode::StraightAlpha => {
                            lightprobe_core::math::lerp_rgba(previous.texel(face, x, y), color, alpha)
                        }
                    };
                    output.set_texel(face, x, y, value);
                }
            }
        }

        *self.image_mut(&target)? = output;
        Ok(())
    }

    fn sh_transform(
        &mut self,
        table: &DescriptorTable,
        constants: &[u8],
        groups: u32,
    ) -> Result<(), GraphicsError> {
        let c: ShConstants = read_constants(constants)?;
        let order = checked_order(c.order)?;
        let terms = term_count(order);
        let radiance = self.image(&texture_at(table, 0)?)?.clone();
        let (coeff_dst, weight_dst) = (buffer_at(table, 1)?, buffer_at(table, 2)?);

        let results: Vec<_> = (0..groups)
            .map(|group| kernels::sh_transform_group(&radiance, order, c.proxy_size, c.count, group))
            .collect();
        self.store_groups(coeff_dst, weight_dst, terms, results)
    }

    fn sh_sum(
        &mut self,
        table: &DescriptorTable,
        constants: &[u8],
        groups: u32,
    ) -> Result<(), GraphicsError> {
        let c: ShConstants = read_constants(constants)?;
        let terms = term_count(checked_order(c.order)?);
        let (coefficients, weights) = self.read_partials(table, terms, c.count)?;

        let results: Vec<_> = (0..groups)
            .map(|group| kernels::sh_sum_group(&coefficients, &weights, terms, c.count, group))
            .collect();
        self.store_groups(buffer_at(table, 2)?, buffer_at(table, 3)?, terms, results)
    }

    fn sh_normalize(&mut self, table: &DescriptorTable, constants: &[u8]) -> Result<(), GraphicsError> {
        let c: ShConstants = read_constants(constants)?;
        let terms = term_count(checked_order(c.order)?);
        let (coefficients, weights) = self.read_partials(table, terms, 1)?;

        let normalized = kernels::sh_normalize(&coefficients[..terms], weights[0]);
        self.store_groups(
            buffer_at(table, 2)?,
            buffer_at(table, 3)?,
            terms,
            vec![(normalized, weights[0])],
        )
    }

    /// Copy `count` partial entries from the table's two source buffers.
    fn read_partials(
        &self,
        table: &DescriptorTable,
        terms: usize,
        count: u32,
    ) -> Result<(Vec<[f32; 3]>, Vec<f32>), GraphicsError> {
        let count = count as usize;
        let coeff_words = self.buffer(buffer_at(table, 0)?)?;
        let weight_words = self.buffer(buffer_at(table, 1)?)?;
        if coeff_words.len() < count * terms * 3 || weight_words.len() < count {
            return Err(GraphicsError::InvalidParameter(format!(
                "SH source buffers hold fewer than {count} entries"
            )));
        }
        let coefficients: &[[f32; 3]] = bytemuck::cast_slice(&coeff_words[..count * terms * 3]);
        Ok((coefficients.to_vec(), weight_words[..count].to_vec()))
    }

    /// Write one result per group, group-major.
    fn store_groups(
        &mut self,
        coeff_dst: BufferId,
        weight_dst: BufferId,
        terms: usize,
        results: Vec<(Vec<[f32; 3]>, f32)>,
    ) -> Result<(), GraphicsError> {
        let needed = results.len() * terms * 3;
        let coeff = self.buffer_mut(coeff_dst)?;
        if coeff.len() < needed {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {} holds {} words, {needed} needed",
                coeff_dst.raw(),
                coeff.len()
            )));
        }
        for (group, (values, _)) in results.iter().enumerate() {
            for (k, value) in values.iter().enumerate() {
                let at = (group * terms + k) * 3;
                coeff[at..at + 3].copy_from_slice(value);
            }
        }

        let weights = self.buffer_mut(weight_dst)?;
        if weights.len() < results.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "buffer {} holds {} words, {} needed",
                weight_dst.raw(),
                weights.len(),
                results.len()
            )));
        }
        for (group, (_, weight)) in results.iter().enumerate() {
            weights[group] = *weight;
        }
        Ok(())
    }
}

impl GpuBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "Software"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_texture(
        &mut self,
        id: TextureId,
        descriptor: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        if !descriptor.is_cube() {
            return Err(GraphicsError::FeatureNotSupported(format!(
                "software backend stores cube textures only, got {} layers",
                descriptor.array_layers()
            )));
        }
        let mips = (0..descriptor.mip_level_count)
            .map(|level| {
                let extent = descriptor.size.mip_level(level);
                CubeImage::new(extent.width, extent.height)
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::trace!(
            "SoftwareBackend: allocated {:?} with {} levels",
            descriptor.label,
            mips.len()
        );
        self.validator.add_texture(id, descriptor);
        self.textures.insert(id, mips);
        Ok(())
    }

    fn create_buffer(
        &mut self,
        id: BufferId,
        descriptor: &BufferDescriptor,
    ) -> Result<(), GraphicsError> {
        self.validator.add_buffer(id, descriptor.size);
        self.buffers
            .insert(id, vec![0.0; (descriptor.size / 4) as usize]);
        Ok(())
    }

    fn create_pipeline(
        &mut self,
        id: PipelineId,
        descriptor: &PipelineDescriptor,
    ) -> Result<(), GraphicsError> {
        check_pipeline_support(&self.capabilities, descriptor)?;
        self.validator.add_pipeline(id, descriptor);
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        self.validator.remove_texture(id);
        self.textures.remove(&id);
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        self.validator.remove_buffer(id);
        self.buffers.remove(&id);
    }

    fn write_buffer(
        &mut self,
        id: BufferId,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        if offset % 4 != 0 || data.len() % 4 != 0 {
            return Err(GraphicsError::InvalidParameter(
                "software buffer writes must be 4-byte aligned".to_string(),
            ));
        }
        let words = self.buffer_mut(id)?;
        let start = (offset / 4) as usize;
        let end = start + data.len() / 4;
        if end > words.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "write past the end of buffer {}",
                id.raw()
            )));
        }
        for (word, bytes) in words[start..end].iter_mut().zip(data.chunks_exact(4)) {
            *word = bytemuck::pod_read_unaligned(bytes);
        }
        Ok(())
    }

    fn submit(&mut self, commands: &CommandList) -> Result<(), GraphicsError> {
        for command in commands.commands() {
            self.validator.validate(command)?;
            self.execute(command)?;
        }
        Ok(())
    }

    fn read_texture(&self, id: TextureId, mip: u32) -> Result<Vec<Rgba>, GraphicsError> {
        self.textures
            .get(&id)
            .and_then(|mips| mips.get(mip as usize))
            .map(CubeImage::to_layers)
            .ok_or_else(|| {
                GraphicsError::InvalidParameter(format!(
                    "texture {} mip {mip} is not allocated",
                    id.raw()
                ))
            })
    }

    fn read_buffer(&self, id: BufferId) -> Result<Vec<u8>, GraphicsError> {
        self.buffer(id)
            .map(|words| bytemuck::cast_slice::<f32, u8>(words).to_vec())
    }
}

fn read_constants<T: bytemuck::Pod>(bytes: &[u8]) -> Result<T, GraphicsError> {
    if bytes.len() != std::mem::size_of::<T>() {
        return Err(GraphicsError::InvalidParameter(format!(
            "expected {} constant bytes, got {}",
            std::mem::size_of::<T>(),
            bytes.len()
        )));
    }
    Ok(bytemuck::pod_read_unaligned(bytes))
}

fn checked_order(order: u32) -> Result<u32, GraphicsError> {
    if (1..=MAX_SH_ORDER).contains(&order) {
        Ok(order)
    } else {
        Err(GraphicsError::InvalidParameter(format!(
            "SH order {order} outside 1..={MAX_SH_ORDER}"
        )))
    }
}

fn texture_at(table: &DescriptorTable, index: usize) -> Result<TextureView, GraphicsError> {
    match table.get(index) {
        Some(Descriptor::Srv(view) | Descriptor::Uav(view) | Descriptor::Rtv(view)) => Ok(*view),
        _ => Err(GraphicsError::InvalidParameter(format!(
            "table '{}' has no texture view at {index}",
            table.label()
        ))),
    }
}

fn buffer_at(table: &DescriptorTable, index: usize) -> Result<BufferId, GraphicsError> {
    match table.get(index) {
        Some(Descriptor::BufferSrv(id) | Descriptor::BufferUav(id)) => Ok(*id),
        _ => Err(GraphicsError::InvalidParameter(format!(
            "table '{}' has no buffer view at {index}",
            table.label()
        ))),
    }
}

fn render_target(table: &DescriptorTable) -> Result<TextureView, GraphicsError> {
    table
        .entries()
        .iter()
        .find_map(|d| match d {
            Descriptor::Rtv(view) => Some(*view),
            _ => None,
        })
        .ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("table '{}' has no render target", table.label()))
        })
}

fn one_input(inputs: &[CubeImage], pass: PassId) -> Result<&CubeImage, GraphicsError> {
    match inputs {
        [src] => Ok(src),
        _ => Err(GraphicsError::InvalidParameter(format!(
            "'{}' expects one input, got {}",
            pass.label(),
            inputs.len()
        ))),
    }
}

fn two_inputs(inputs: &[CubeImage], pass: PassId) -> Result<[&CubeImage; 2], GraphicsError> {
    match inputs {
        [a, b] => Ok([a, b]),
        _ => Err(GraphicsError::InvalidParameter(format!(
            "'{}' expects two inputs, got {}",
            pass.label(),
            inputs.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barrier::{ResourceBarrier, ResourceState, Subresource};
    use crate::types::{BufferUsage, TextureFormat, TextureUsage};

    fn cube(size: u32, mips: u32) -> TextureDescriptor {
        TextureDescriptor::new_cube(
            size,
            size,
            TextureFormat::Rgba32Float,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        )
        .with_mip_levels(mips)
    }

    fn to_state(sub: Subresource, before: ResourceState, after: ResourceState) -> ResourceBarrier {
        ResourceBarrier {
            subresource: sub,
            before,
            after,
        }
    }

    #[test]
    fn test_rejects_non_cube_textures() {
        let mut backend = SoftwareBackend::new();
        let result = backend.create_texture(
            TextureId(1),
            &TextureDescriptor::new_2d(4, 4, TextureFormat::Rgba8Unorm, TextureUsage::COPY_DST),
        );
        assert!(matches!(result, Err(GraphicsError::FeatureNotSupported(_))));
    }

    #[test]
    fn test_upload_and_read_back() {
        let mut backend = SoftwareBackend::new();
        backend.create_texture(TextureId(1), &cube(2, 1)).unwrap();
        backend
            .create_buffer(
                BufferId(2),
                &BufferDescriptor::new(2 * 2 * 6 * 16, BufferUsage::COPY_SRC),
            )
            .unwrap();

        let source = CubeImage::from_fn(2, 2, |d| [d.x, d.y, d.z, 1.0]).unwrap();
        backend
            .write_buffer(BufferId(2), 0, &source.to_bytes())
            .unwrap();

        let mut cmd = CommandList::new("upload");
        let mut barriers = vec![to_state(
            Subresource::Buffer(BufferId(2)),
            ResourceState::Common,
            ResourceState::CopySource,
        )];
        barriers.extend((0..6).map(|layer| {
            to_state(
                Subresource::texture(TextureId(1), 0, layer),
                ResourceState::Common,
                ResourceState::CopyDest,
            )
        }));
        cmd.barrier(barriers);
        cmd.push(Command::CopyBufferToTexture {
            buffer: BufferId(2),
            texture: TextureId(1),
            mip: 0,
        });
        backend.submit(&cmd).unwrap();

        assert_eq!(
            backend.read_texture(TextureId(1), 0).unwrap(),
            source.to_layers()
        );
    }

    #[test]
    fn test_unaligned_write_rejected() {
        let mut backend = SoftwareBackend::new();
        backend
            .create_buffer(BufferId(1), &BufferDescriptor::new(16, BufferUsage::STORAGE))
            .unwrap();
        assert!(backend.write_buffer(BufferId(1), 2, &[0; 4]).is_err());
        backend
            .write_buffer(BufferId(1), 4, bytemuck::bytes_of(&1.5f32))
            .unwrap();
        let bytes = backend.read_buffer(BufferId(1)).unwrap();
        let value: f32 = bytemuck::pod_read_unaligned(&bytes[4..8]);
        assert_eq!(value, 1.5);
    }
}
