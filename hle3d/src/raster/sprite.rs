use crate::{
    cpu::MemoryView,
    render::{LCD_HEIGHT, LCD_WIDTH, target::RenderTarget},
};

/// How texels are packed in sprite memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexelFormat {
    /// 4bpp, high nibble first.
    Nibbles,
    /// 8bpp.
    Bytes,
}

/// A sprite drawn 1:1 at a fixed position, every texel covering one
/// `scale × scale` block. Index 0 is transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSprite {
    /// Top left corner on screen, mirroring already applied.
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub mirror: bool,
    pub data: u32,
    pub format: TexelFormat,
    /// ORed into every non-transparent texel.
    pub palette_mask: u8,
}

impl FixedSprite {
    fn texel(&self, memory: &MemoryView<'_>, x: i64, y: i64) -> u8 {
        let w = i64::from(self.width);
        let column = if self.mirror { w - 1 - x } else { x };
        let offset = |index: i64| self.data.wrapping_add(index as u32);
        match self.format {
            TexelFormat::Nibbles => {
                let byte = memory.read_at(offset((y * w + column) >> 1));
                (byte >> if column & 1 == 1 { 0 } else { 4 }) & 0xF
            }
            TexelFormat::Bytes => memory.read_at(offset(y * w + column)),
        }
    }

    /// Texel range along one axis that lands on a screen of `screen` pixels.
    fn visible(origin: i32, extent: i32, screen: usize) -> std::ops::Range<i64> {
        let origin = i64::from(origin);
        (-origin).max(0)..i64::from(extent).min(screen as i64 - origin)
    }

    pub fn draw(&self, target: &mut RenderTarget<'_>, memory: &MemoryView<'_>) {
        let columns = Self::visible(self.x, self.width, LCD_WIDTH);
        for y in Self::visible(self.y, self.height, LCD_HEIGHT) {
            for x in columns.clone() {
                let index = self.texel(memory, x, y);
                if index != 0 {
                    let (sx, sy) = (i64::from(self.x) + x, i64::from(self.y) + y);
                    target.fill_block(sx as i32, sy as i32, index | self.palette_mask);
                }
            }
        }
    }
}

/// A texture stretched over a screen rectangle with nearest neighbour
/// sampling. Index 0 is transparent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaledSprite {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub u0: i32,
    pub v0: i32,
    pub u1: i32,
    pub v1: i32,
    pub data: u32,
    /// Bytes per texture row.
    pub stride: i32,
    pub format: TexelFormat,
    /// 4bpp palette bank, shifted into the high nibble of every texel.
    pub palette_bank: u8,
}

/// `from + (to - from) * step / steps`, exact for any 32-bit endpoints.
fn interpolate(from: i32, to: i32, step: i64, steps: i64) -> i64 {
    let delta = i128::from(to) - i128::from(from);
    i64::from(from) + (i128::from(step) * delta / i128::from(steps)) as i64
}

impl ScaledSprite {
    fn texel(&self, memory: &MemoryView<'_>, u: i64, v: i64) -> u8 {
        let row = v.wrapping_mul(i64::from(self.stride));
        match self.format {
            TexelFormat::Bytes => memory.read_at(self.data.wrapping_add(row.wrapping_add(u) as u32)),
            TexelFormat::Nibbles => {
                let byte = memory.read_at(self.data.wrapping_add(row.wrapping_add(u >> 1) as u32));
                let nibble = (byte >> if u & 1 == 1 { 0 } else { 4 }) & 0xF;
                if nibble == 0 { 0 } else { nibble | (self.palette_bank << 4) }
            }
        }
    }

    pub fn draw(&self, target: &mut RenderTarget<'_>, memory: &MemoryView<'_>) {
        let scale = target.scale() as i64;
        let (left, right) = (i64::from(self.left) * scale, i64::from(self.right) * scale);
        let (top, bottom) = (i64::from(self.top) * scale, i64::from(self.bottom) * scale);
        if right <= left || bottom <= top {
            return;
        }

        let rows = top.max(0)..bottom.min(target.height() as i64);
        let columns = left.max(0)..right.min(target.width() as i64);
        if rows.is_empty() || columns.is_empty() {
            tracing::trace!(left, top, right, bottom, "scaled sprite off screen");
            return;
        }

        for y in rows {
            let v = interpolate(self.v0, self.v1, y - top, bottom - top);
            for x in columns.clone() {
                let u = interpolate(self.u0, self.u1, x - left, right - left);
                let texel = self.texel(memory, u, v);
                if texel != 0 {
                    target.set_pixel(x as i32, y as i32, texel);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::SimpleCpu;
    use pretty_assertions::assert_eq;

    const DATA: u32 = 0x0800_0000;

    fn buffer(scale: usize) -> Vec<u8> {
        vec![0; LCD_WIDTH * LCD_HEIGHT * scale * scale]
    }

    fn sprite(format: TexelFormat, mirror: bool) -> FixedSprite {
        FixedSprite {
            x: 10,
            y: 20,
            width: 4,
            height: 1,
            mirror,
            data: DATA,
            format,
            palette_mask: 0,
        }
    }

    fn row(target: &RenderTarget<'_>, y: i32, xs: std::ops::Range<i32>) -> Vec<u8> {
        xs.map(|x| target.pixel(x, y).unwrap()).collect()
    }

    #[test]
    fn nibble_sprite_high_nibble_first() {
        let cpu = SimpleCpu::with_rom(vec![0x12, 0x30]);
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);

        sprite(TexelFormat::Nibbles, false).draw(&mut target, &MemoryView::new(&cpu, DATA));
        assert_eq!(row(&target, 20, 10..14), [1, 2, 3, 0]);
    }

    #[test]
    fn mirrored_nibble_sprite_reverses_the_row() {
        let cpu = SimpleCpu::with_rom(vec![0x12, 0x34]);
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);

        sprite(TexelFormat::Nibbles, true).draw(&mut target, &MemoryView::new(&cpu, DATA));
        assert_eq!(row(&target, 20, 10..14), [4, 3, 2, 1]);
    }

    #[test]
    fn byte_sprite_with_mask_and_scale() {
        let cpu = SimpleCpu::with_rom(vec![5, 0, 7, 8]);
        let mut pixels = buffer(2);
        let mut target = RenderTarget::new(&mut pixels, 2);

        let mut s = sprite(TexelFormat::Bytes, true);
        s.palette_mask = 0x10;
        s.draw(&mut target, &MemoryView::new(&cpu, DATA));

        assert_eq!(row(&target, 40, 20..28), [0x18, 0x18, 0x17, 0x17, 0, 0, 0x15, 0x15]);
        assert_eq!(row(&target, 41, 20..28), [0x18, 0x18, 0x17, 0x17, 0, 0, 0x15, 0x15]);
    }

    #[test]
    fn fixed_sprite_clips_at_screen_edge() {
        let cpu = SimpleCpu::with_rom(vec![1, 2, 3, 4]);
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);

        let mut s = sprite(TexelFormat::Bytes, false);
        s.x = 238;
        s.draw(&mut target, &MemoryView::new(&cpu, DATA));

        assert_eq!(row(&target, 20, 238..240), [1, 2]);
        assert_eq!(target.pixel(0, 21), Some(0));
    }

    #[test]
    fn scaled_sprite_stretches() {
        // 2x1 texture stretched over 4x2 pixels.
        let cpu = SimpleCpu::with_rom(vec![3, 9]);
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);

        let s = ScaledSprite {
            left: 0,
            top: 0,
            right: 4,
            bottom: 2,
            u0: 0,
            v0: 0,
            u1: 2,
            v1: 1,
            data: DATA,
            stride: 256,
            format: TexelFormat::Bytes,
            palette_bank: 0,
        };
        s.draw(&mut target, &MemoryView::new(&cpu, DATA));

        assert_eq!(row(&target, 0, 0..5), [3, 3, 9, 9, 0]);
        assert_eq!(row(&target, 1, 0..5), [3, 3, 9, 9, 0]);
    }

    #[test]
    fn scaled_nibble_sprite_applies_palette_bank() {
        let cpu = SimpleCpu::with_rom(vec![0x05, 0x60]);
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);

        let s = ScaledSprite {
            left: 0,
            top: 0,
            right: 4,
            bottom: 1,
            u0: 0,
            v0: 0,
            u1: 4,
            v1: 1,
            data: DATA,
            stride: 2,
            format: TexelFormat::Nibbles,
            palette_bank: 3,
        };
        s.draw(&mut target, &MemoryView::new(&cpu, DATA));

        assert_eq!(row(&target, 0, 0..4), [0, 0x35, 0x36, 0]);
    }

    #[test]
    fn empty_rectangle_draws_nothing() {
        let cpu = SimpleCpu::with_rom(vec![1; 16]);
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);

        let s = ScaledSprite {
            left: 5,
            top: 5,
            right: 5,
            bottom: 9,
            u0: 0,
            v0: 0,
            u1: 4,
            v1: 4,
            data: DATA,
            stride: 4,
            format: TexelFormat::Bytes,
            palette_bank: 0,
        };
        s.draw(&mut target, &MemoryView::new(&cpu, DATA));

        assert!(pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn extreme_scaled_sprite_is_clipped() {
        let cpu = SimpleCpu::with_rom(vec![6; 0x100]);
        let mut pixels = buffer(2);
        let mut target = RenderTarget::new(&mut pixels, 2);

        let s = ScaledSprite {
            left: 0,
            top: 0,
            right: i32::MAX,
            bottom: 1,
            u0: -1,
            v0: 0,
            u1: i32::MAX,
            v1: i32::MIN,
            data: DATA,
            stride: i32::MAX,
            format: TexelFormat::Bytes,
            palette_bank: 0,
        };
        s.draw(&mut target, &MemoryView::new(&cpu, DATA));

        // Only the first two output rows are covered. u starts at -1, outside
        // the texture, and reaches 0 two output pixels in.
        assert!(row(&target, 2, 0..480).iter().all(|&p| p == 0));
        assert_eq!(row(&target, 0, 0..3), [0, 0, 6]);
    }

    #[test]
    fn sprites_far_off_screen_draw_nothing() {
        let cpu = SimpleCpu::with_rom(vec![1; 0x100]);
        let mut pixels = buffer(3);
        let mut target = RenderTarget::new(&mut pixels, 3);
        let memory = MemoryView::new(&cpu, DATA);

        for (x, y) in [(i32::MAX, 0), (i32::MIN, 0), (0, i32::MAX - 2), (i32::MIN, i32::MIN)] {
            let mut s = sprite(TexelFormat::Nibbles, true);
            (s.x, s.y, s.width, s.height) = (x, y, 255, 255);
            s.draw(&mut target, &memory);
        }

        let inverted = ScaledSprite {
            left: i32::MAX,
            top: i32::MAX,
            right: i32::MIN,
            bottom: i32::MIN,
            u0: 0,
            v0: 0,
            u1: 1,
            v1: 1,
            data: DATA,
            stride: 1,
            format: TexelFormat::Nibbles,
            palette_bank: 0,
        };
        inverted.draw(&mut target, &memory);

        let beyond = ScaledSprite {
            left: 1 << 30,
            top: -(1 << 30),
            right: i32::MAX,
            bottom: -1,
            ..inverted
        };
        beyond.draw(&mut target, &memory);

        assert!(target.pixels().iter().all(|&p| p == 0));
    }
}
