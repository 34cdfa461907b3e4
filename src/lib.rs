//! Dominant color palettes from uploaded images.
//!
//! The pipeline is decode → area-resize to 150×150 → k-means in RGB → swatch
//! formatting. A browser page calls [`dominant_colors`] through wasm-bindgen;
//! native callers use [`extract_palette`] or [`extract_palette_with`].

use js_sys::{Array, Object, Reflect};
use tracing::debug;
use wasm_bindgen::prelude::*;

pub mod color;
pub mod config;
pub mod decode;
pub mod error;
pub mod extract;

pub use color::{Color, Contrast, format_channels_hex, format_hex, format_rgb, is_light_background, parse_hex};
pub use config::{InsufficientPolicy, PaletteConfig, PaletteOrder};
pub use decode::{PixelMatrix, decode_pixels};
pub use error::{PaletteError, Result};
pub use extract::{Palette, Swatch, extract_swatches};

/// Extract `num_colors` dominant colors from an encoded image using the
/// default configuration (fixed seed 0, ten restarts).
pub fn extract_palette(input: &[u8], num_colors: usize) -> Result<Vec<Color>> {
    let config = PaletteConfig::default().num_colors(num_colors);
    extract_palette_with(input, &config).map(|p| p.colors())
}

/// Full pipeline with an explicit configuration.
pub fn extract_palette_with(input: &[u8], config: &PaletteConfig) -> Result<Palette> {
    // Reject bad parameters before paying for a decode.
    config.validate()?;

    let matrix = decode_pixels(input, config)?;
    let palette = extract_swatches(&matrix.samples, config)?;
    debug!(
        format = ?matrix.format,
        colors = palette.len(),
        "extracted palette"
    );
    Ok(palette)
}

/// Extract a palette for the swatch page.
///
/// Returns an array of `{ hex, rgb, red, green, blue, lightText, population }`
/// objects, one per swatch, in palette order. `lightText` tells the page to
/// draw the labels in white.
#[wasm_bindgen(js_name = dominantColors)]
pub fn dominant_colors(
    input: Vec<u8>,
    num_colors: i32,
    seed: Option<u32>,
) -> std::result::Result<Array, JsValue> {
    let config = js_config(num_colors, seed).map_err(to_js)?;

    let palette = extract_palette_with(&input, &config).map_err(to_js)?;

    let out = Array::new();
    for swatch in palette.iter() {
        let c = swatch.color;
        let entry = Object::new();
        Reflect::set(&entry, &JsValue::from_str("hex"), &JsValue::from_str(&format_hex(c)))?;
        Reflect::set(&entry, &JsValue::from_str("rgb"), &JsValue::from_str(&format_rgb(c)))?;
        Reflect::set(&entry, &JsValue::from_str("red"), &JsValue::from(c.red))?;
        Reflect::set(&entry, &JsValue::from_str("green"), &JsValue::from(c.green))?;
        Reflect::set(&entry, &JsValue::from_str("blue"), &JsValue::from(c.blue))?;
        Reflect::set(
            &entry,
            &JsValue::from_str("lightText"),
            &JsValue::from_bool(config.contrast.use_light_text(c)),
        )?;
        Reflect::set(
            &entry,
            &JsValue::from_str("population"),
            &JsValue::from(swatch.population as u32),
        )?;
        out.push(&entry);
    }

    Ok(out)
}

/// Build the config for a JS call; JS numbers may be negative.
fn js_config(num_colors: i32, seed: Option<u32>) -> Result<PaletteConfig> {
    let n = usize::try_from(num_colors)
        .map_err(|_| PaletteError::invalid_parameter("num_colors", num_colors))?;

    let mut config = PaletteConfig::default().num_colors(n);
    if let Some(seed) = seed {
        config = config.seed(seed as u64);
    }
    config.validate()?;
    Ok(config)
}

fn to_js(e: PaletteError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_config_rejects_non_positive_counts() {
        for n in [0, -1, i32::MIN] {
            assert!(matches!(
                js_config(n, None),
                Err(PaletteError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn js_config_applies_seed() {
        let c = js_config(3, Some(9)).unwrap();
        assert_eq!(c.num_colors, 3);
        assert_eq!(c.seed, 9);
        assert_eq!(js_config(5, None).unwrap().seed, 0);
    }
}
