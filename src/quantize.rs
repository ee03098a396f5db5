//! Luminance quantization: pixels to one of five brightness buckets, and
//! buckets to the glyphs that draw them.

use image::{Rgb, RgbImage};

use crate::error::{PlayError, Result};

/// Number of luminance levels a cell can take.
pub const BUCKETS: usize = 5;

/// Brightest bucket index.
pub const MAX_BUCKET: u8 = (BUCKETS - 1) as u8;

/// Terminal columns taken by one logical pixel.
pub const GLYPH_COLUMNS: usize = 2;

const DEFAULT_GLYPHS: [&str; BUCKETS] = ["  ", "░░", "▒▒", "▓▓", "██"];

pub fn default_glyphs() -> Vec<String> {
    DEFAULT_GLYPHS.iter().map(|g| g.to_string()).collect()
}

/// Relative luminance of an 8-bit RGB pixel, normalized to `[0, 1]`.
pub fn luminance(px: Rgb<u8>) -> f64 {
    let r = px[0] as f64;
    let g = px[1] as f64;
    let b = px[2] as f64;
    (0.299 * r + 0.587 * g + 0.114 * b) / 255.0
}

/// Maps a normalized luminance to a bucket in `0..=MAX_BUCKET`.
pub fn bucket_for(luma: f64) -> u8 {
    let idx = (luma * BUCKETS as f64).floor();
    idx.clamp(0.0, MAX_BUCKET as f64) as u8
}

/// Ordered glyph table, darkest bucket first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphTable {
    glyphs: [String; BUCKETS],
}

impl GlyphTable {
    /// Builds a table from exactly five glyphs, each two characters wide.
    pub fn new(glyphs: &[String]) -> Result<Self> {
        if glyphs.len() != BUCKETS {
            return Err(PlayError::Config(format!(
                "glyph table needs exactly {} entries, got {}",
                BUCKETS,
                glyphs.len()
            )));
        }
        if let Some(bad) = glyphs.iter().find(|g| g.chars().count() != GLYPH_COLUMNS) {
            return Err(PlayError::Config(format!(
                "glyph {:?} must be exactly {} characters",
                bad, GLYPH_COLUMNS
            )));
        }
        let glyphs: [String; BUCKETS] = std::array::from_fn(|i| glyphs[i].clone());
        Ok(Self { glyphs })
    }

    pub fn glyph(&self, bucket: u8) -> &str {
        &self.glyphs[bucket.min(MAX_BUCKET) as usize]
    }
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self { glyphs: DEFAULT_GLYPHS.map(String::from) }
    }
}

/// Row-major grid of bucket indices, one per logical pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl BucketGrid {
    pub fn filled(width: usize, height: usize, bucket: u8) -> Self {
        Self { width, height, cells: vec![bucket; width * height] }
    }

    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let cells = rows.iter().flat_map(|r| r.iter().copied().take(width)).collect();
        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn rows(&self) -> Vec<Vec<u8>> {
        (0..self.height).map(|y| self.row(y).to_vec()).collect()
    }

    /// Bytes held by this grid, used for buffer accounting.
    pub fn byte_len(&self) -> usize {
        self.cells.len()
    }
}

/// Quantizes every pixel of a rescaled frame.
pub fn quantize(img: &RgbImage) -> BucketGrid {
    let (w, h) = img.dimensions();
    let cells = img.pixels().map(|px| bucket_for(luminance(*px))).collect();
    BucketGrid { width: w as usize, height: h as usize, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn black_and_white_hit_the_ends() {
        assert_eq!(bucket_for(luminance(Rgb([0, 0, 0]))), 0);
        assert_eq!(bucket_for(luminance(Rgb([255, 255, 255]))), MAX_BUCKET);
    }

    #[test]
    fn mid_gray_lands_in_the_middle() {
        assert_eq!(bucket_for(luminance(Rgb([128, 128, 128]))), 2);
    }

    #[test]
    fn green_weighs_more_than_blue() {
        assert!(luminance(Rgb([0, 200, 0])) > luminance(Rgb([0, 0, 200])));
    }

    #[test]
    fn glyph_table_rejects_wrong_shapes() {
        let four: Vec<String> = default_glyphs().into_iter().take(4).collect();
        assert!(matches!(GlyphTable::new(&four), Err(PlayError::Config(_))));

        let mut narrow = default_glyphs();
        narrow[2] = "#".into();
        assert!(matches!(GlyphTable::new(&narrow), Err(PlayError::Config(_))));
    }

    #[test]
    fn default_table_matches_default_glyphs() {
        assert_eq!(GlyphTable::new(&default_glyphs()).unwrap(), GlyphTable::default());
        assert_eq!(GlyphTable::default().glyph(0), "  ");
        assert_eq!(GlyphTable::default().glyph(4), "██");
    }

    #[test]
    fn quantize_keeps_image_shape() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([255, 255, 255]));
        let grid = quantize(&img);
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert_eq!(grid.rows(), vec![vec![0, 0, 0], vec![0, 0, 4]]);
    }

    proptest! {
        #[test]
        fn bucket_is_always_in_range(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let bucket = bucket_for(luminance(Rgb([r, g, b])));
            prop_assert!(bucket <= MAX_BUCKET);
        }

        #[test]
        fn brighter_gray_never_gets_a_darker_bucket(a in any::<u8>(), b in any::<u8>()) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(bucket_for(luminance(Rgb([lo; 3]))) <= bucket_for(luminance(Rgb([hi; 3]))));
        }
    }
}
