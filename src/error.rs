use derive_more::Display;

use crate::types::Value;

pub type Result<T> = core::result::Result<T, BackdropError>;

/// Errors raised while building a scene variant.
///
/// Evaluation itself never fails: everything that could go wrong per pixel is
/// rejected here, at construction time.
#[derive(Debug, Display, Clone, PartialEq)]
#[display("{self:?}")]
pub enum BackdropError {
    /// A smooth combinator was configured with a blend radius that is not strictly positive.
    InvalidBlendRadius { context: &'static str, radius: Value },
    /// A shape or configuration constant is out of its allowed range.
    InvalidParameter { name: &'static str, value: Value },
    /// A resolution with a zero or non-finite dimension.
    InvalidResolution { width: Value, height: Value },
    /// A combinator or scene was given nothing to combine.
    EmptyScene,
    /// No preset with the given name exists.
    UnknownPreset(String),
}

impl std::error::Error for BackdropError {}

/// Returns [`BackdropError::InvalidParameter`] unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &'static str, value: Value) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(BackdropError::InvalidParameter { name, value })
    }
}

/// Returns [`BackdropError::InvalidParameter`] unless `value` is finite and not negative.
pub(crate) fn ensure_non_negative(name: &'static str, value: Value) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BackdropError::InvalidParameter { name, value })
    }
}

/// Returns [`BackdropError::InvalidParameter`] unless `value` is finite.
pub(crate) fn ensure_finite(name: &'static str, value: Value) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BackdropError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn should_accept_positive_and_reject_zero() {
        assert!(ensure_positive("k", 0.5).is_ok());
        assert_eq!(
            ensure_positive("k", 0.0),
            Err(BackdropError::InvalidParameter { name: "k", value: 0.0 })
        );
    }

    #[test]
    fn should_reject_non_finite_values() {
        assert!(ensure_finite("x", Value::NAN).is_err());
        assert!(ensure_non_negative("x", Value::INFINITY).is_err());
        assert!(ensure_non_negative("x", 0.0).is_ok());
    }

    #[test]
    fn should_display_variant_name() {
        let err = BackdropError::UnknownPreset("nope".to_string());
        assert_eq!(err.to_string(), "UnknownPreset(\"nope\")");
    }
}
