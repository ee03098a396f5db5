//! Decoding and fitting source images onto the cell grid.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;

use crate::error::{PlayError, Result};

/// Size of the drawable cell grid, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
///
/// Images smaller than the bounds are never enlarged. Whichever axis is the
/// tighter constraint is filled exactly and the other axis follows from the
/// same ratio, rounded down but kept at least one pixel.
pub fn fit_within(src_w: u32, src_h: u32, bounds: GridSize) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    let new_w = bounds.width.min(src_w) as u64;
    let new_h = bounds.height.min(src_h) as u64;
    let (sw, sh) = (src_w as u64, src_h as u64);

    // height ratio (new_h / sh) against width ratio (new_w / sw), cross-multiplied
    if new_h * sw < new_w * sh {
        let w = sw * new_h / sh;
        (w.clamp(1, new_w.max(1)) as u32, new_h as u32)
    } else {
        let h = sh * new_w / sw;
        (new_w as u32, h.clamp(1, new_h.max(1)) as u32)
    }
}

/// Opens and decodes one frame and rescales it into `bounds` with
/// nearest-neighbour sampling.
///
/// `index` only labels the error.
pub fn load_frame(path: &Path, index: usize, bounds: GridSize) -> Result<RgbImage> {
    let img = image::open(path).map_err(|source| PlayError::Decode {
        index,
        path: path.to_path_buf(),
        source,
    })?;

    let (w, h) = fit_within(img.width(), img.height(), bounds);
    if w == 0 || h == 0 {
        return Ok(RgbImage::new(0, 0));
    }
    if (w, h) == (img.width(), img.height()) {
        return Ok(img.to_rgb8());
    }
    Ok(img.resize_exact(w, h, FilterType::Nearest).to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use proptest::prelude::*;

    #[test]
    fn wide_source_is_bound_by_width() {
        assert_eq!(fit_within(1920, 1080, GridSize::new(80, 60)), (80, 45));
    }

    #[test]
    fn tall_source_is_bound_by_height() {
        assert_eq!(fit_within(1920, 1080, GridSize::new(80, 40)), (71, 40));
        assert_eq!(fit_within(100, 400, GridSize::new(80, 40)), (10, 40));
    }

    #[test]
    fn small_source_is_not_enlarged() {
        assert_eq!(fit_within(20, 10, GridSize::new(80, 40)), (20, 10));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_within(10_000, 1, GridSize::new(10, 10)), (10, 1));
        assert_eq!(fit_within(1, 10_000, GridSize::new(10, 10)), (1, 10));
    }

    #[test]
    fn load_frame_downscales_and_keeps_colour() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.png");
        RgbImage::from_pixel(8, 4, Rgb([255, 255, 255])).save(&path).unwrap();

        let img = load_frame(&path, 0, GridSize::new(4, 4)).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert!(img.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("7.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = load_frame(&path, 7, GridSize::new(4, 4)).unwrap_err();
        assert!(matches!(err, PlayError::Decode { index: 7, .. }));
    }

    proptest! {
        #[test]
        fn fit_stays_in_bounds_and_keeps_aspect(
            sw in 1u32..4000, sh in 1u32..4000, bw in 1u32..400, bh in 1u32..200,
        ) {
            let (w, h) = fit_within(sw, sh, GridSize::new(bw, bh));
            prop_assert!(w >= 1 && h >= 1);
            prop_assert!(w <= bw && h <= bh);
            prop_assert!(w <= sw && h <= sh);

            // The derived axis is within one cell of the exact proportion.
            let exact_h = w as f64 * sh as f64 / sw as f64;
            let exact_w = h as f64 * sw as f64 / sh as f64;
            prop_assert!((h as f64 - exact_h).abs() <= 1.0 || (w as f64 - exact_w).abs() <= 1.0);
        }
    }
}
