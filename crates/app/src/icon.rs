//! Tray icon artwork

use image::{Rgba, RgbaImage};

pub const ICON_SIZE: u32 = 16;

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);
const RECORD_DOT: Rgba<u8> = Rgba([220, 30, 30, 255]);

/// Red square on black
pub fn tray_icon_image(size: u32) -> RgbaImage {
    let inset = size / 4;
    RgbaImage::from_fn(size, size, |x, y| {
        let inside = (inset..size - inset).contains(&x) && (inset..size - inset).contains(&y);
        if inside {
            RECORD_DOT
        } else {
            BACKGROUND
        }
    })
}

/// Top-down BGRA rows, the layout `CreateIcon` expects for a 32bpp colour mask
pub fn to_bgra(image: &RgbaImage) -> Vec<u8> {
    image
        .pixels()
        .flat_map(|Rgba([r, g, b, a])| [*b, *g, *r, *a])
        .collect()
}

/// All-zero AND mask; rows padded to 16 bits
pub fn and_mask(size: u32) -> Vec<u8> {
    let row_bytes = size.div_ceil(16) * 2;
    vec![0; (row_bytes * size) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centre_is_red_and_corner_black() {
        let image = tray_icon_image(ICON_SIZE);
        assert_eq!(*image.get_pixel(8, 8), RECORD_DOT);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
        assert_eq!(*image.get_pixel(15, 15), BACKGROUND);
    }

    #[test]
    fn bgra_swaps_channels() {
        let image = tray_icon_image(ICON_SIZE);
        let bgra = to_bgra(&image);
        assert_eq!(bgra.len(), (ICON_SIZE * ICON_SIZE * 4) as usize);

        let centre = ((8 * ICON_SIZE + 8) * 4) as usize;
        assert_eq!(&bgra[centre..centre + 4], &[30, 30, 220, 255]);
    }

    #[test]
    fn and_mask_rows_are_word_aligned() {
        assert_eq!(and_mask(16).len(), 32);
        assert_eq!(and_mask(20).len(), 80);
    }
}
