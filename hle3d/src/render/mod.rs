//! This module contains the output buffers the rasterizers draw into and the
//! resolve step that turns them into displayable color.

pub mod color;
pub mod debug_rects;
pub mod frame_buffers;
pub mod target;

/// Width of the native screen in pixels, before upscaling.
pub const LCD_WIDTH: usize = 240;

/// Height of the native screen in pixels, before upscaling.
pub const LCD_HEIGHT: usize = 160;

/// Entries an 8bpp indexed buffer can reference.
pub const PALETTE_ENTRIES: usize = 256;

/// Where the background palette the mode 4 bitmap resolves through starts.
pub const BG_PALETTE_ADDRESS: u32 = 0x0500_0000;

/// Start of the first mode 4 frame in VRAM.
pub const MODE4_FRAME0_ADDRESS: u32 = 0x0600_0000;

/// Distance between the two mode 4 frames in VRAM.
pub const MODE4_FRAME_SIZE: u32 = 0xA000;

/// Display mode in which the background is an 8bpp indexed bitmap.
pub const MODE4: u16 = 4;

/// Logical scanline a pointer into one of the mode 4 frames points at.
#[must_use]
pub const fn mode4_row(vram_pointer: u32) -> u32 {
    (vram_pointer.wrapping_sub(MODE4_FRAME0_ADDRESS) % MODE4_FRAME_SIZE) / LCD_WIDTH as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn row_of_vram_pointer() {
        assert_eq!(mode4_row(0x0600_0000), 0);
        assert_eq!(mode4_row(0x0600_0000 + 240 * 37 + 12), 37);
        assert_eq!(mode4_row(0x0600_A000 + 240 * 159), 159);
    }
}
