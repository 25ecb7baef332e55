//! Stock terrain generators.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{SubTerrainCfg, SubTerrainKind, TerrainGeneratorCfg};

fn base(curriculum: bool) -> TerrainGeneratorCfg {
    TerrainGeneratorCfg {
        curriculum,
        size: (8.0, 8.0),
        border_width: 20.0,
        num_rows: 10,
        num_cols: 20,
        horizontal_scale: 0.1,
        vertical_scale: 0.005,
        slope_threshold: 0.75,
        use_cache: false,
        sub_terrains: BTreeMap::new(),
    }
}

const fn random_rough(proportion: f32) -> SubTerrainCfg {
    SubTerrainCfg::new(
        proportion,
        SubTerrainKind::RandomUniform {
            noise_range: (-0.02, 0.04),
            noise_step: 0.02,
            border_width: 0.25,
        },
    )
}

/// Uniform gravel everywhere, no curriculum.
pub fn gravel() -> TerrainGeneratorCfg {
    debug!("building gravel terrain");
    base(false).with_sub_terrain("random_rough", random_rough(1.0))
}

fn slope(proportion: f32, inverted: bool) -> SubTerrainCfg {
    let (slope_range, platform_width, border_width) = ((0.0, 0.4), 2.0, 0.25);
    let kind = if inverted {
        SubTerrainKind::InvertedPyramidSlope {
            slope_range,
            platform_width,
            border_width,
        }
    } else {
        SubTerrainKind::PyramidSlope {
            slope_range,
            platform_width,
            border_width,
        }
    };
    SubTerrainCfg::new(proportion, kind)
}

fn stairs(proportion: f32, inverted: bool) -> SubTerrainCfg {
    let (step_height_range, step_width, platform_width, border_width) = ((0.0, 0.1), 0.3, 3.0, 1.0);
    let kind = if inverted {
        SubTerrainKind::InvertedPyramidStairs {
            step_height_range,
            step_width,
            platform_width,
            border_width,
        }
    } else {
        SubTerrainKind::PyramidStairs {
            step_height_range,
            step_width,
            platform_width,
            border_width,
        }
    };
    SubTerrainCfg::new(proportion, kind)
}

/// Mixed slopes, stairs and noise with a difficulty curriculum.
pub fn rough() -> TerrainGeneratorCfg {
    debug!("building rough terrain");
    base(true)
        .with_sub_terrain("flat", SubTerrainCfg::plane(0.2))
        .with_sub_terrain("random_rough", random_rough(0.2))
        .with_sub_terrain("hf_pyramid_slope", slope(0.1, false))
        .with_sub_terrain("hf_pyramid_slope_inv", slope(0.1, true))
        .with_sub_terrain("pyramid_stairs", stairs(0.2, false))
        .with_sub_terrain("pyramid_stairs_inv", stairs(0.2, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(gravel().validate().is_ok());
        assert!(rough().validate().is_ok());
    }

    #[test]
    fn gravel_is_single_random_field() {
        let cfg = gravel();
        assert!(!cfg.curriculum);
        assert_eq!(cfg.sub_terrains.len(), 1);
        assert_eq!(cfg.normalized_proportions(), vec![("random_rough", 1.0)]);
    }

    #[test]
    fn rough_proportions_sum_to_one() {
        let cfg = rough();
        assert!(cfg.curriculum);
        assert_eq!(cfg.sub_terrains.len(), 6);
        assert!((cfg.total_proportion() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn presets_survive_toml() {
        for cfg in [gravel(), rough()] {
            let text = toml::to_string(&cfg).unwrap();
            let back: TerrainGeneratorCfg = toml::from_str(&text).unwrap();
            assert_eq!(cfg, back);
        }
    }
}
