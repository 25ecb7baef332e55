use thiserror::Error;

/// Top-level error type for stride.
#[derive(Debug, Error)]
pub enum StrideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Override error: {0}")]
    Override(#[from] OverrideError),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Unknown robot: {0}")]
    UnknownRobot(String),

    #[error("Task already registered: {0}")]
    DuplicateTask(String),
}

/// Construction-time configuration errors.
///
/// Field paths are dotted (`actuators.legs.stiffness`). Errors raised while
/// validating a named top-level config are wrapped in [`ConfigError::InConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern '{pattern}' in {field}: {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        source: regex::Error,
    },

    #[error("Pattern '{pattern}' in {field} matches no names")]
    UnresolvedPattern { field: String, pattern: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),

    #[error("{config}: {source}")]
    InConfig {
        config: String,
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attach the name of the top-level config. Already-wrapped errors keep
    /// their innermost name.
    #[must_use]
    pub fn in_config(self, config: &str) -> Self {
        match self {
            Self::InConfig { .. } => self,
            other => Self::InConfig {
                config: config.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Prepend `prefix` to the field path, for errors raised by a nested
    /// config (`actuators.legs` becomes `scene.robot.actuators.legs`).
    #[must_use]
    pub fn with_prefix(self, prefix: &str) -> Self {
        let join = |field: String| format!("{prefix}.{field}");
        match self {
            Self::InvalidPattern {
                field,
                pattern,
                source,
            } => Self::InvalidPattern {
                field: join(field),
                pattern,
                source,
            },
            Self::UnresolvedPattern { field, pattern } => Self::UnresolvedPattern {
                field: join(field),
                pattern,
            },
            Self::InvalidValue { field, message } => Self::InvalidValue {
                field: join(field),
                message,
            },
            Self::MissingField(field) => Self::MissingField(join(field)),
            other => other,
        }
    }

    /// Name of the config this error was raised for, if attached.
    pub fn config_name(&self) -> Option<&str> {
        match self {
            Self::InConfig { config, .. } => Some(config),
            _ => None,
        }
    }

    /// Dotted path of the offending field, if the error names one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidPattern { field, .. }
            | Self::UnresolvedPattern { field, .. }
            | Self::InvalidValue { field, .. }
            | Self::MissingField(field) => Some(field),
            Self::InConfig { source, .. } => source.field(),
            _ => None,
        }
    }
}

/// Errors from parsing or applying dotted-path overrides.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("Malformed override '{0}' (expected path=value)")]
    Malformed(String),

    #[error("Unknown config path: {0}")]
    UnknownPath(String),

    #[error("Cannot descend into non-table value at {0}")]
    NotATable(String),

    #[error("Override produced an invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
