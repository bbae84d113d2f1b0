use std::fmt::Display;

use super::{BG_PALETTE_ADDRESS, PALETTE_ENTRIES};
use crate::cpu::Cpu;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Splits a `0xRRGGBB` value.
    pub const fn from_rgb24(rgb: u32) -> Self {
        Self {
            red: (rgb >> 16) as u8,
            green: (rgb >> 8) as u8,
            blue: rgb as u8,
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.red, self.green, self.blue)
    }
}

/// Widens a BGR555 palette entry to 8 bits per channel, replicating the high
/// bits into the low ones so that 31 maps to 255.
#[must_use]
pub const fn expand_555(color: u16) -> [u8; 3] {
    // red   -> bits 0-4
    // green -> bits 5-9
    // blue  -> bits 10-14
    // bit 15 is unused
    const fn expand(c: u16) -> u8 {
        let c = (c & 0x1F) as u8;
        (c << 3) | (c >> 2)
    }

    [expand(color), expand(color >> 5), expand(color >> 10)]
}

impl From<u16> for Color {
    fn from(color: u16) -> Self {
        let [red, green, blue] = expand_555(color);
        Self { red, green, blue }
    }
}

/// The 256 background palette entries, already widened to 24 bits.
pub struct Palette([Color; PALETTE_ENTRIES]);

impl Palette {
    pub fn from_cpu(cpu: &dyn Cpu) -> Self {
        let mut colors = [Color::default(); PALETTE_ENTRIES];
        for (i, color) in colors.iter_mut().enumerate() {
            *color = cpu.read_half_word(BG_PALETTE_ADDRESS + (i as u32) * 2).into();
        }

        Self(colors)
    }

    pub const fn color(&self, index: u8) -> Color {
        self.0[index as usize]
    }
}
