//! Error types for palette extraction.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaletteError>;

#[derive(Debug, Error)]
pub enum PaletteError {
    /// The input bytes are empty, corrupt, or in a format the decoder can't read.
    #[error("unable to decode image{}", format_hint(.format))]
    Decode {
        format: Option<String>,
        #[source]
        source: Option<image::ImageError>,
    },

    #[error("invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Fewer distinct colors than requested clusters.
    #[error("image has {distinct} distinct colors, cannot form {requested} clusters")]
    InsufficientSamples { distinct: usize, requested: usize },

    #[error("invalid color: {value}")]
    InvalidColor { value: String },
}

fn format_hint(format: &Option<String>) -> String {
    match format {
        Some(f) => format!(" (detected format: {f})"),
        None => String::new(),
    }
}

impl PaletteError {
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    pub fn invalid_color(value: impl ToString) -> Self {
        Self::InvalidColor {
            value: value.to_string(),
        }
    }

    /// True when the caller can fix the request (smaller `num_colors`, valid
    /// parameters). Decode and color errors are not in this group.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PaletteError::InvalidParameter { .. } | PaletteError::InsufficientSamples { .. }
        )
    }
}
