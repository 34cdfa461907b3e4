//! Decoding and normalisation of uploaded image bytes into a pixel matrix.

use image::{self, DynamicImage, GenericImageView, RgbImage};
use tracing::{debug, trace};

use crate::color::Color;
use crate::config::PaletteConfig;
use crate::error::{PaletteError, Result};

/// Flat, position-free color samples of the normalised working image.
#[derive(Clone, Debug)]
pub struct PixelMatrix {
    pub samples: Vec<Color>,
    /// Format sniffed from the input header, if any.
    pub format: Option<image::ImageFormat>,
    pub source_dimensions: (u32, u32),
}

/// Decode `input`, normalise it to RGB and area-resize it to the configured
/// target size, then flatten it row by row.
pub fn decode_pixels(input: &[u8], config: &PaletteConfig) -> Result<PixelMatrix> {
    let (img, format) = decode(input)?;
    let source_dimensions = img.dimensions();

    let rgb = img.to_rgb8();
    let resized = resize_area(&rgb, config.target_width, config.target_height);
    debug!(
        from = ?source_dimensions,
        to = ?resized.dimensions(),
        "resized working image"
    );

    let samples = resized.pixels().map(|p| Color::from(p.0)).collect();

    Ok(PixelMatrix {
        samples,
        format,
        source_dimensions,
    })
}

fn decode(input: &[u8]) -> Result<(DynamicImage, Option<image::ImageFormat>)> {
    if input.is_empty() {
        return Err(PaletteError::Decode {
            format: None,
            source: None,
        });
    }

    let format = image::guess_format(input).ok();
    trace!(?format, len = input.len(), "decoding upload");

    let img = image::load_from_memory(input).map_err(|e| PaletteError::Decode {
        format: format.map(|f| format!("{f:?}")),
        source: Some(e),
    })?;

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(PaletteError::Decode {
            format: format.map(|f| format!("{f:?}")),
            source: None,
        });
    }

    Ok((img, format))
}

// ------------------------------------------------------------
// Area-averaging resize
// ------------------------------------------------------------

/// Source pixels contributing to one output pixel, with normalised weights.
type Taps = Vec<(usize, f32)>;

/// For every output index, the source indices it covers and the fraction of
/// the output cell each one fills. Works for shrinking and enlarging alike.
fn area_taps(in_len: u32, out_len: u32) -> Vec<Taps> {
    let scale = in_len as f64 / out_len as f64;

    (0..out_len)
        .map(|o| {
            let start = o as f64 * scale;
            let end = (o as f64 + 1.0) * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(in_len);

            let mut taps: Taps = Vec::with_capacity((last - first) as usize);
            let mut total = 0.0;
            for src in first..last {
                let lo = start.max(src as f64);
                let hi = end.min(src as f64 + 1.0);
                let coverage = hi - lo;
                if coverage > 0.0 {
                    taps.push((src as usize, coverage as f32));
                    total += coverage;
                }
            }
            for tap in &mut taps {
                tap.1 = (tap.1 as f64 / total) as f32;
            }
            taps
        })
        .collect()
}

/// Resize so each output pixel is the coverage-weighted mean of the source
/// area it maps onto. Separable: a vertical pass, then a horizontal one.
pub fn resize_area(img: &RgbImage, out_w: u32, out_h: u32) -> RgbImage {
    let (in_w, in_h) = img.dimensions();

    // Fast path – no scaling required.
    if out_w == in_w && out_h == in_h {
        return img.clone();
    }

    let raw = img.as_raw();

    // --------------------------------------------------------
    // First pass: vertical reduction (in_w × out_h)
    // --------------------------------------------------------
    let rows = area_taps(in_h, out_h);
    let mut vertical: Vec<[f32; 3]> = vec![[0.0; 3]; (in_w * out_h) as usize];

    for (y_out, taps) in rows.iter().enumerate() {
        for x in 0..in_w as usize {
            let mut acc = [0.0f32; 3];
            for &(y, w) in taps {
                let idx = (y * in_w as usize + x) * 3;
                acc[0] += raw[idx] as f32 * w;
                acc[1] += raw[idx + 1] as f32 * w;
                acc[2] += raw[idx + 2] as f32 * w;
            }
            vertical[y_out * in_w as usize + x] = acc;
        }
    }

    // --------------------------------------------------------
    // Second pass: horizontal reduction (out_w × out_h)
    // --------------------------------------------------------
    let cols = area_taps(in_w, out_w);
    let mut out = RgbImage::new(out_w, out_h);

    for y_out in 0..out_h as usize {
        for (x_out, taps) in cols.iter().enumerate() {
            let mut acc = [0.0f32; 3];
            for &(x, w) in taps {
                let pix = vertical[y_out * in_w as usize + x];
                acc[0] += pix[0] * w;
                acc[1] += pix[1] * w;
                acc[2] += pix[2] * w;
            }
            out.put_pixel(
                x_out as u32,
                y_out as u32,
                image::Rgb([saturate(acc[0]), saturate(acc[1]), saturate(acc[2])]),
            );
        }
    }

    out
}

#[inline(always)]
fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn encode_png(img: RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn taps_cover_each_output_fully() {
        for (i, o) in [(300, 150), (150, 150), (7, 3), (1, 150), (3, 7)] {
            for taps in area_taps(i, o) {
                let sum: f32 = taps.iter().map(|t| t.1).sum();
                assert!((sum - 1.0).abs() < 1e-5, "{i}->{o}: {sum}");
                assert!(taps.iter().all(|&(src, _)| src < i as usize));
            }
        }
    }

    #[test]
    fn halving_averages_2x2_blocks() {
        let img = RgbImage::from_fn(4, 2, |x, _| if x % 2 == 0 { Rgb([0, 100, 200]) } else { Rgb([100, 200, 0]) });
        let out = resize_area(&img, 2, 1);
        assert_eq!(out.dimensions(), (2, 1));
        for p in out.pixels() {
            assert_eq!(p.0, [50, 150, 100]);
        }
    }

    #[test]
    fn fractional_coverage_is_weighted() {
        // 3 source columns into 2: output 0 = col0 + half col1.
        let img = RgbImage::from_fn(3, 1, |x, _| Rgb([[0, 0, 0], [90, 90, 90], [180, 180, 180]][x as usize]));
        let out = resize_area(&img, 2, 1);
        assert_eq!(out.get_pixel(0, 0).0, [30, 30, 30]);
        assert_eq!(out.get_pixel(1, 0).0, [150, 150, 150]);
    }

    #[test]
    fn enlarging_replicates_source() {
        let img = RgbImage::from_pixel(1, 1, Rgb([12, 34, 56]));
        let out = resize_area(&img, 150, 150);
        assert!(out.pixels().all(|p| p.0 == [12, 34, 56]));
    }

    #[test]
    fn decodes_to_target_size_in_rgb_order() {
        let bytes = encode_png(RgbImage::from_pixel(40, 20, Rgb([255, 10, 0])));
        let m = decode_pixels(&bytes, &PaletteConfig::default()).unwrap();
        assert_eq!(m.samples.len(), 150 * 150);
        assert_eq!(m.format, Some(ImageFormat::Png));
        assert_eq!(m.source_dimensions, (40, 20));
        assert!(m.samples.iter().all(|c| *c == Color::new(255, 10, 0)));
    }

    #[test]
    fn empty_and_garbage_fail_to_decode() {
        assert!(matches!(
            decode_pixels(&[], &PaletteConfig::default()),
            Err(PaletteError::Decode { format: None, .. })
        ));
        assert!(matches!(
            decode_pixels(b"definitely not an image", &PaletteConfig::default()),
            Err(PaletteError::Decode { .. })
        ));
    }

    #[test]
    fn truncated_png_reports_format() {
        let bytes = encode_png(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])));
        let err = decode_pixels(&bytes[..bytes.len() / 2], &PaletteConfig::default()).unwrap_err();
        match err {
            PaletteError::Decode { format, .. } => assert_eq!(format.as_deref(), Some("Png")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
