use thiserror::Error;

/// Errors raised by the binding, scale and projection pipeline.
///
/// Configuration variants are fatal and reported before any feature is bound.
/// Per-feature problems (no matching record, unreadable value) are not errors:
/// the feature is rendered with the unknown color instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChoroplethError {
    #[error("invalid domain [{min}, {max}]: {reason}")]
    InvalidDomain { min: f64, max: f64, reason: String },

    #[error("unknown color scheme `{0}`")]
    UnknownScheme(String),

    #[error("color palette must contain at least one color")]
    EmptyPalette,

    #[error("invalid value format `{0}`")]
    InvalidValueFormat(String),

    #[error("invalid color `{0}` (expected #rgb or #rrggbb)")]
    InvalidColor(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("projection failed for feature {feature}: {reason}")]
    Projection { feature: String, reason: String },
}

pub type Result<T, E = ChoroplethError> = std::result::Result<T, E>;
