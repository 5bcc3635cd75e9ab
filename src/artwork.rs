//! Creature artwork: decoding and kitty graphics sequences

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{GenericImageView, ImageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ArtworkError;

/// Terminal cells are about twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 2.0;

/// Longest edge kept after decoding. Official artwork is 475px, far more than
/// a panel can show.
pub const MAX_EDGE: u32 = 192;

const CHUNK_SIZE: usize = 4096;

/// A decoded image, re-encoded as a base64 PNG ready for the terminal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Artwork {
    pub payload: String,
    pub width: u32,
    pub height: u32,
}

impl Artwork {
    /// Decode any format `image` understands and shrink it to [`MAX_EDGE`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ArtworkError> {
        let mut image = image::load_from_memory(bytes)?;
        if image.width() > MAX_EDGE || image.height() > MAX_EDGE {
            image = image.thumbnail(MAX_EDGE, MAX_EDGE);
        }
        let (width, height) = image.dimensions();
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(Self {
            payload: general_purpose::STANDARD.encode(&png),
            width,
            height,
        })
    }

    /// Largest cell box with the image's proportions inside `max_cols` x `max_rows`.
    pub fn fit(&self, max_cols: u16, max_rows: u16) -> (u16, u16) {
        if max_cols == 0 || max_rows == 0 || self.height == 0 {
            return (max_cols, max_rows);
        }
        let ratio = self.width as f32 / self.height as f32;
        let cols_for_max_rows = ratio * max_rows as f32 * CELL_ASPECT;
        if cols_for_max_rows <= max_cols as f32 {
            let cols = cols_for_max_rows.round().max(1.0) as u16;
            return (cols, max_rows);
        }
        let rows = (max_cols as f32 / (ratio * CELL_ASPECT)).round().max(1.0) as u16;
        (max_cols, rows.min(max_rows))
    }

    /// Kitty graphics protocol: transmit and display as image `id`, scaled to
    /// `cols` x `rows` cells at the cursor.
    pub fn kitty_sequence(&self, cols: u16, rows: u16, id: u32) -> String {
        let chunks: Vec<&[u8]> = self.payload.as_bytes().chunks(CHUNK_SIZE).collect();
        let last = chunks.len().saturating_sub(1);
        let mut out = String::with_capacity(self.payload.len() + chunks.len() * 16);

        for (index, chunk) in chunks.iter().enumerate() {
            let more = u8::from(index < last);
            let data = String::from_utf8_lossy(chunk);
            if index == 0 {
                out.push_str(&format!(
                    "\x1b_Gf=100,s={},v={},a=T,t=d,i={id},c={cols},r={rows},q=2,m={more};{data}\x1b\\",
                    self.width, self.height
                ));
            } else {
                out.push_str(&format!("\x1b_Gm={more};{data}\x1b\\"));
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([255, 203, 5, 255]),
    ));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}
