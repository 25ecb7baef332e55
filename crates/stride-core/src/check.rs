//! Small numeric and presence checks shared by every `validate`.

use crate::error::ConfigError;

pub fn finite(field: &str, value: impl Into<f64>) -> Result<(), ConfigError> {
    let v = value.into();
    if v.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{v} is not finite")))
    }
}

pub fn non_negative(field: &str, value: impl Into<f64>) -> Result<(), ConfigError> {
    let v = value.into();
    finite(field, v)?;
    if v < 0.0 {
        return Err(ConfigError::invalid(field, format!("{v} (must be >= 0)")));
    }
    Ok(())
}

pub fn positive(field: &str, value: impl Into<f64>) -> Result<(), ConfigError> {
    let v = value.into();
    finite(field, v)?;
    if v <= 0.0 {
        return Err(ConfigError::invalid(field, format!("{v} (must be > 0)")));
    }
    Ok(())
}

/// `low <= value <= high`.
pub fn within(field: &str, value: impl Into<f64>, low: f64, high: f64) -> Result<(), ConfigError> {
    let v = value.into();
    finite(field, v)?;
    if v < low || v > high {
        return Err(ConfigError::invalid(
            field,
            format!("{v} (must be in [{low}, {high}])"),
        ));
    }
    Ok(())
}

/// A `(low, high)` pair of finite values with `low <= high`.
pub fn ordered_pair(field: &str, pair: (f32, f32)) -> Result<(), ConfigError> {
    finite(field, pair.0)?;
    finite(field, pair.1)?;
    if pair.0 > pair.1 {
        return Err(ConfigError::invalid(
            field,
            format!("low ({}) > high ({})", pair.0, pair.1),
        ));
    }
    Ok(())
}

pub fn non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_accepts_zero() {
        assert!(non_negative("x", 0.0_f32).is_ok());
        assert!(non_negative("x", -0.1_f32).is_err());
        assert!(non_negative("x", f32::INFINITY).is_err());
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(positive("x", 0.0_f32).is_err());
        assert!(positive("x", 1_u32).is_ok());
    }

    #[test]
    fn within_is_inclusive() {
        assert!(within("x", 1.0_f32, 0.0, 1.0).is_ok());
        assert!(within("x", 1.01_f32, 0.0, 1.0).is_err());
    }

    #[test]
    fn ordered_pair_allows_equal_bounds() {
        assert!(ordered_pair("x", (10.0, 10.0)).is_ok());
        let err = ordered_pair("push_robot.interval_range_s", (2.0, 1.0)).unwrap_err();
        assert_eq!(err.field(), Some("push_robot.interval_range_s"));
    }

    #[test]
    fn non_empty_reports_missing_field() {
        let err = non_empty("scene.height_scanner.prim_body_name", "  ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }
}
