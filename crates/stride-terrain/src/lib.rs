//! Terrain generator templates for stride.
//!
//! A [`TerrainGeneratorCfg`] describes a grid of `num_rows x num_cols`
//! tiles. Each tile is drawn from one of the named [`SubTerrainCfg`]s,
//! weighted by its proportion. With `curriculum` enabled, columns are
//! assigned to sub-terrains in proportion order and difficulty grows with
//! the row index.

pub mod presets;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stride_core::check;
use stride_core::error::ConfigError;

pub use presets::{gravel, rough};

// ---------------------------------------------------------------------------
// Sub-terrains
// ---------------------------------------------------------------------------

/// Shape parameters of one sub-terrain, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubTerrainKind {
    /// Flat ground.
    Plane,
    /// Height field with uniform random noise.
    RandomUniform {
        /// Min and max height of the noise (m).
        noise_range: (f32, f32),
        /// Height quantization of the noise (m).
        noise_step: f32,
        border_width: f32,
    },
    /// Pyramid rising toward a central platform.
    PyramidSlope {
        /// Slope range (rise over run) interpolated by difficulty.
        slope_range: (f32, f32),
        platform_width: f32,
        border_width: f32,
    },
    /// Pyramid sinking toward a central platform.
    InvertedPyramidSlope {
        slope_range: (f32, f32),
        platform_width: f32,
        border_width: f32,
    },
    /// Stairs climbing toward a central platform.
    PyramidStairs {
        step_height_range: (f32, f32),
        step_width: f32,
        platform_width: f32,
        border_width: f32,
    },
    /// Stairs descending toward a central platform.
    InvertedPyramidStairs {
        step_height_range: (f32, f32),
        step_width: f32,
        platform_width: f32,
        border_width: f32,
    },
}

impl SubTerrainKind {
    /// The `type` tag.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Plane => "plane",
            Self::RandomUniform { .. } => "random_uniform",
            Self::PyramidSlope { .. } => "pyramid_slope",
            Self::InvertedPyramidSlope { .. } => "inverted_pyramid_slope",
            Self::PyramidStairs { .. } => "pyramid_stairs",
            Self::InvertedPyramidStairs { .. } => "inverted_pyramid_stairs",
        }
    }
}

/// One weighted entry of a terrain generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTerrainCfg {
    /// Relative share of tiles. Normalized over all sub-terrains.
    pub proportion: f32,
    #[serde(flatten)]
    pub kind: SubTerrainKind,
}

impl SubTerrainCfg {
    pub const fn new(proportion: f32, kind: SubTerrainKind) -> Self {
        Self { proportion, kind }
    }

    pub const fn plane(proportion: f32) -> Self {
        Self::new(proportion, SubTerrainKind::Plane)
    }

    /// `field` is this entry's path, e.g. `sub_terrains.stairs`.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        check::non_negative(&format!("{field}.proportion"), self.proportion)?;
        match &self.kind {
            SubTerrainKind::Plane => Ok(()),
            SubTerrainKind::RandomUniform {
                noise_range,
                noise_step,
                border_width,
            } => {
                check::ordered_pair(&format!("{field}.noise_range"), *noise_range)?;
                check::positive(&format!("{field}.noise_step"), *noise_step)?;
                check::non_negative(&format!("{field}.border_width"), *border_width)
            }
            SubTerrainKind::PyramidSlope {
                slope_range,
                platform_width,
                border_width,
            }
            | SubTerrainKind::InvertedPyramidSlope {
                slope_range,
                platform_width,
                border_width,
            } => {
                check::ordered_pair(&format!("{field}.slope_range"), *slope_range)?;
                check::non_negative(&format!("{field}.slope_range"), slope_range.0)?;
                check::non_negative(&format!("{field}.platform_width"), *platform_width)?;
                check::non_negative(&format!("{field}.border_width"), *border_width)
            }
            SubTerrainKind::PyramidStairs {
                step_height_range,
                step_width,
                platform_width,
                border_width,
            }
            | SubTerrainKind::InvertedPyramidStairs {
                step_height_range,
                step_width,
                platform_width,
                border_width,
            } => {
                check::ordered_pair(&format!("{field}.step_height_range"), *step_height_range)?;
                check::non_negative(&format!("{field}.step_height_range"), step_height_range.0)?;
                check::positive(&format!("{field}.step_width"), *step_width)?;
                check::non_negative(&format!("{field}.platform_width"), *platform_width)?;
                check::non_negative(&format!("{field}.border_width"), *border_width)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TerrainGeneratorCfg
// ---------------------------------------------------------------------------

/// Grid of procedurally generated terrain tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainGeneratorCfg {
    /// Order tiles by difficulty along the rows.
    pub curriculum: bool,
    /// Tile size (m).
    pub size: (f32, f32),
    /// Flat border around the whole grid (m).
    pub border_width: f32,
    pub num_rows: u32,
    pub num_cols: u32,
    /// Height-field cell size (m).
    pub horizontal_scale: f32,
    /// Height-field height quantum (m).
    pub vertical_scale: f32,
    /// Slopes steeper than this are turned into vertical walls.
    pub slope_threshold: f32,
    pub use_cache: bool,
    /// Named entries, serialized in name order.
    pub sub_terrains: BTreeMap<String, SubTerrainCfg>,
}

impl TerrainGeneratorCfg {
    #[must_use]
    pub fn with_sub_terrain(mut self, name: impl Into<String>, sub: SubTerrainCfg) -> Self {
        self.sub_terrains.insert(name.into(), sub);
        self
    }

    /// Sum of all proportions.
    pub fn total_proportion(&self) -> f32 {
        self.sub_terrains.values().map(|s| s.proportion).sum()
    }

    /// `(name, share)` with shares summing to one. Empty when the total
    /// proportion is zero.
    pub fn normalized_proportions(&self) -> Vec<(&str, f32)> {
        let total = self.total_proportion();
        if total <= 0.0 {
            return Vec::new();
        }
        self.sub_terrains
            .iter()
            .map(|(name, s)| (name.as_str(), s.proportion / total))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check::positive("terrain_generator.size", self.size.0)?;
        check::positive("terrain_generator.size", self.size.1)?;
        check::non_negative("terrain_generator.border_width", self.border_width)?;
        check::positive("terrain_generator.num_rows", self.num_rows)?;
        check::positive("terrain_generator.num_cols", self.num_cols)?;
        check::positive("terrain_generator.horizontal_scale", self.horizontal_scale)?;
        check::positive("terrain_generator.vertical_scale", self.vertical_scale)?;
        check::non_negative("terrain_generator.slope_threshold", self.slope_threshold)?;
        if self.sub_terrains.is_empty() {
            return Err(ConfigError::MissingField(
                "terrain_generator.sub_terrains".into(),
            ));
        }
        for (name, sub) in &self.sub_terrains {
            sub.validate(&format!("terrain_generator.sub_terrains.{name}"))?;
        }
        if self.total_proportion() <= 0.0 {
            return Err(ConfigError::invalid(
                "terrain_generator.sub_terrains",
                "proportions sum to zero",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
