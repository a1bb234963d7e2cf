//! Pipelines of the light-probe passes.
//!
//! Every pass the probe can record has a [`PassId`]. A [`PipelineSet`] maps
//! pass ids to the pipelines created for them once at initialization; after
//! that it is only read. A pass without an entry is unavailable on the
//! device (for example the in-place upsample without typed UAV loads).
//!
//! # Pass overview
//!
//! | Pass | Kind | Reads | Writes |
//! |------|------|-------|--------|
//! | `GenerateRadiance` | graphics | two source cubes | radiance mip 0 |
//! | `Resample` / `ResampleGraphics` | compute / graphics | level `i` | level `i + 1` |
//! | `UpsampleGraphics` | graphics, alpha blend | level `j + 1` | level `j` |
//! | `UpsampleInPlace` | compute | level `j + 1`, level `j` | level `j` |
//! | `*Final` upsample | as above | level 1, radiance | level 0 |
//! | `ShTransform` | compute | radiance | per-group SH partial sums |
//! | `ShSum` | compute | partial sums | fewer partial sums |
//! | `ShNormalize` | compute | total sum | normalized coefficients |

mod constants;

use std::collections::HashMap;
use std::sync::Arc;

pub use constants::{CosineConstants, RadianceConstants, ResampleConstants, ShConstants};

use crate::types::{PipelineId, TextureFormat};

/// Threads per group of the 2D texture passes, per axis.
pub const TEXTURE_GROUP_SIZE: u32 = 8;

/// Threads per group of the SH passes.
pub const SH_GROUP_SIZE: u32 = 64;

/// Identifies one kind of pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PassId {
    /// Cross-fade two source cubes into the radiance cube.
    GenerateRadiance,
    /// Compute 2x box downsample.
    Resample,
    /// Graphics 2x box downsample.
    ResampleGraphics,
    /// Cosine upsample blended over the destination level.
    UpsampleGraphics,
    /// Cosine upsample into level 0, detail taken from the radiance cube.
    UpsampleGraphicsFinal,
    /// Cosine upsample through a typed UAV load of the destination level.
    UpsampleInPlace,
    /// In-place cosine upsample into level 0.
    UpsampleInPlaceFinal,
    /// Project the radiance cube onto SH, one partial sum per thread group.
    ShTransform,
    /// Reduce partial sums by one tree level.
    ShSum,
    /// Scale the total sum by `4π / Σ dω`.
    ShNormalize,
}

impl PassId {
    /// All passes in creation order.
    pub const ALL: [PassId; 10] = [
        PassId::GenerateRadiance,
        PassId::Resample,
        PassId::ResampleGraphics,
        PassId::UpsampleGraphics,
        PassId::UpsampleGraphicsFinal,
        PassId::UpsampleInPlace,
        PassId::UpsampleInPlaceFinal,
        PassId::ShTransform,
        PassId::ShSum,
        PassId::ShNormalize,
    ];

    /// Pipeline kind the pass runs with.
    pub fn kind(self) -> PipelineKind {
        match self {
            PassId::GenerateRadiance | PassId::ResampleGraphics | PassId::UpsampleGraphicsFinal => {
                PipelineKind::Graphics {
                    blend: BlendMode::Replace,
                }
            }
            PassId::UpsampleGraphics => PipelineKind::Graphics {
                blend: BlendMode::StraightAlpha,
            },
            PassId::Resample | PassId::UpsampleInPlace | PassId::UpsampleInPlaceFinal => {
                PipelineKind::Compute {
                    workgroup: [TEXTURE_GROUP_SIZE, TEXTURE_GROUP_SIZE, 1],
                }
            }
            PassId::ShTransform | PassId::ShSum | PassId::ShNormalize => PipelineKind::Compute {
                workgroup: [SH_GROUP_SIZE, 1, 1],
            },
        }
    }

    /// Returns true for passes that load their destination through a typed UAV.
    pub fn needs_typed_uav_load(self) -> bool {
        matches!(self, PassId::UpsampleInPlace | PassId::UpsampleInPlaceFinal)
    }

    /// Shader entry label.
    pub fn label(self) -> &'static str {
        match self {
            PassId::GenerateRadiance => "generate_radiance",
            PassId::Resample => "resample_cs",
            PassId::ResampleGraphics => "resample_ps",
            PassId::UpsampleGraphics => "cos_upsample_ps",
            PassId::UpsampleGraphicsFinal => "cos_upsample_final_ps",
            PassId::UpsampleInPlace => "cos_upsample_cs",
            PassId::UpsampleInPlaceFinal => "cos_upsample_final_cs",
            PassId::ShTransform => "sh_transform",
            PassId::ShSum => "sh_sum",
            PassId::ShNormalize => "sh_normalize",
        }
    }
}

/// Color blending of a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Output overwrites the target.
    Replace,
    /// `dst = src.rgb * src.a + dst.rgb * (1 - src.a)`.
    StraightAlpha,
}

/// Graphics or compute, with the state that matters to each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Full-screen triangle rasterized into an RTV.
    Graphics {
        /// Blend state.
        blend: BlendMode,
    },
    /// Compute shader.
    Compute {
        /// Threads per group.
        workgroup: [u32; 3],
    },
}

impl PipelineKind {
    /// Returns true for compute pipelines.
    pub fn is_compute(&self) -> bool {
        matches!(self, Self::Compute { .. })
    }
}

/// Descriptor for creating a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineDescriptor {
    /// Debug label.
    pub label: Option<String>,
    /// Pass implemented by the pipeline.
    pub pass: PassId,
    /// Pipeline kind.
    pub kind: PipelineKind,
    /// Format of the written texture, if any.
    pub format: Option<TextureFormat>,
}

impl PipelineDescriptor {
    /// Descriptor for `pass` with its default kind.
    pub fn new(pass: PassId) -> Self {
        Self {
            label: None,
            pass,
            kind: pass.kind(),
            format: None,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the format of the written texture.
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// A created pipeline.
#[derive(Debug)]
pub struct Pipeline {
    id: PipelineId,
    descriptor: PipelineDescriptor,
}

impl Pipeline {
    pub(crate) fn new(id: PipelineId, descriptor: PipelineDescriptor) -> Self {
        Self { id, descriptor }
    }

    /// Device-unique identifier.
    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// Pass implemented by the pipeline.
    pub fn pass(&self) -> PassId {
        self.descriptor.pass
    }

    /// Pipeline kind.
    pub fn kind(&self) -> PipelineKind {
        self.descriptor.kind
    }

    /// Creation descriptor.
    pub fn descriptor(&self) -> &PipelineDescriptor {
        &self.descriptor
    }
}

/// Pipelines indexed by pass.
#[derive(Debug, Default)]
pub struct PipelineSet {
    pipelines: HashMap<PassId, Arc<Pipeline>>,
}

impl PipelineSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pipeline, replacing any previous one for the same pass.
    pub fn insert(&mut self, pipeline: Arc<Pipeline>) {
        self.pipelines.insert(pipeline.pass(), pipeline);
    }

    /// Pipeline for `pass`, if it was created.
    pub fn get(&self, pass: PassId) -> Option<&Arc<Pipeline>> {
        self.pipelines.get(&pass)
    }

    /// Returns true if a pipeline exists for `pass`.
    pub fn contains(&self, pass: PassId) -> bool {
        self.pipelines.contains_key(&pass)
    }

    /// Pipeline for `pass`, or an error naming the missing pass.
    pub fn require(&self, pass: PassId) -> Result<&Arc<Pipeline>, crate::GraphicsError> {
        self.get(pass).ok_or_else(|| {
            crate::GraphicsError::Internal(format!("pipeline '{}' was not created", pass.label()))
        })
    }

    /// Number of pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
