//! Pipeline variant selection.

use std::fmt;

/// Which passes a frame records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineType {
    /// Compute downsample, graphics upsample.
    #[default]
    Hybrid,
    /// Graphics downsample, graphics upsample.
    Graphics,
    /// Compute downsample, in-place compute upsample.
    Compute,
    /// Spherical-harmonics projection instead of the mip pyramid.
    Sh,
}

impl PipelineType {
    /// Number of variants.
    pub const NUM: usize = 4;

    /// All variants in cycling order.
    pub const ALL: [PipelineType; Self::NUM] = [
        PipelineType::Hybrid,
        PipelineType::Graphics,
        PipelineType::Compute,
        PipelineType::Sh,
    ];

    fn index(self) -> usize {
        match self {
            Self::Hybrid => 0,
            Self::Graphics => 1,
            Self::Compute => 2,
            Self::Sh => 3,
        }
    }

    /// The variant that actually runs when `self` is requested.
    ///
    /// `Compute` needs the in-place upsample pipelines and falls back to
    /// `Hybrid` without them.
    pub fn resolve(self, has_in_place: bool) -> Self {
        match self {
            Self::Compute if !has_in_place => Self::Hybrid,
            other => other,
        }
    }

    /// Next variant when cycling, skipping `Compute` without typed UAV loads.
    pub fn next(self, typed_uav: bool) -> Self {
        let step = if self == Self::Graphics && !typed_uav {
            2
        } else {
            1
        };
        Self::ALL[(self.index() + step) % Self::NUM]
    }

    /// Lowercase name, as accepted by [`PipelineType::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Hybrid => "hybrid",
            Self::Graphics => "graphics",
            Self::Compute => "compute",
            Self::Sh => "sh",
        }
    }

    /// Parse a variant name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Returns true for the variants that run the mip pyramid.
    pub fn uses_pyramid(self) -> bool {
        self != Self::Sh
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
