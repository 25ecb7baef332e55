// stride-core: errors, name selectors, sim config, diff and overrides for stride configs.

pub mod check;
pub mod config;
pub mod diff;
pub mod error;
pub mod overrides;
pub mod pattern;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::{PhysxCfg, SimCfg, load_toml, to_toml_string};
    pub use crate::diff::{FieldChange, diff};
    pub use crate::error::{ConfigError, OverrideError, StrideError};
    pub use crate::overrides::{Override, apply_overrides};
    pub use crate::pattern::{NameSelector, PatternMap, PatternValue, resolve_matching_names};
}
