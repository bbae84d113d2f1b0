use crate::{cpu::MemoryView, render::target::RenderTarget};

/// A scanline trapezoid as the V3D engine hands it to its fill routines.
///
/// Edges are 8.8 fixed point x positions with a signed 8.8 per-row delta,
/// both packed in one register as `x << 16 | delta`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trapezoid {
    /// First logical row.
    pub top: i32,
    /// Number of logical rows.
    pub height: i32,
    pub left: u16,
    pub left_delta: i16,
    pub right: u16,
    pub right_delta: i16,
}

/// Texture coordinates of a textured trapezoid: 8.8 u/v on both edges at the
/// first row, and their signed per-row deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapezoidUv {
    pub left_u: u16,
    pub left_v: u16,
    pub right_u: u16,
    pub right_v: u16,
    pub left_u_delta: i16,
    pub left_v_delta: i16,
    pub right_u_delta: i16,
    pub right_v_delta: i16,
}

impl TrapezoidUv {
    /// Unpacks the four words the engine keeps its uv state in, u in the high
    /// half and v in the low half of each.
    #[must_use]
    pub const fn from_words(left: u32, right: u32, left_delta: u32, right_delta: u32) -> Self {
        Self {
            left_u: (left >> 16) as u16,
            left_v: left as u16,
            right_u: (right >> 16) as u16,
            right_v: right as u16,
            left_u_delta: (left_delta >> 16) as i16,
            left_v_delta: left_delta as i16,
            right_u_delta: (right_delta >> 16) as i16,
            right_v_delta: right_delta as i16,
        }
    }
}

impl Trapezoid {
    #[must_use]
    pub const fn from_registers(top: i32, height: u32, left: u32, right: u32) -> Self {
        Self {
            top,
            height: height as i32,
            left: (left >> 16) as u16,
            left_delta: left as i16,
            right: (right >> 16) as u16,
            right_delta: right as i16,
        }
    }

    /// Calls `span` with `(output row, row index, left, right)` for every
    /// output row that lands on the target and overlaps it horizontally.
    /// Edges are left unclipped so texture steps keep their origin.
    fn for_each_span(
        &self,
        target: &mut RenderTarget<'_>,
        mut span: impl FnMut(&mut RenderTarget<'_>, i32, i64, i64, i64),
    ) {
        let scale = target.scale() as i64;
        let (width, height) = (target.width() as i64, target.height() as i64);

        let top = i64::from(self.top) * scale;
        let rows = (-top).max(0)..(i64::from(self.height) * scale).min(height - top);

        for y in rows {
            let left = (i64::from(self.left) * scale + i64::from(self.left_delta) * y) >> 8;
            let right = (i64::from(self.right) * scale + i64::from(self.right_delta) * y) >> 8;

            if right > left && right > 0 && left < width {
                span(target, (top + y) as i32, y, left, right);
            }
        }
    }

    pub fn fill_flat(&self, target: &mut RenderTarget<'_>, color: u8) {
        let width = target.width() as i64;
        self.for_each_span(target, |target, row, _, left, right| {
            target.fill_span(row, left.max(0) as i32, right.min(width) as i32, color);
        });
    }

    /// Fills with texels from a 256 texel wide 8bpp texture at `texture`.
    /// The uv deltas are per logical row, so they are divided down by the scale.
    pub fn fill_textured(
        &self,
        target: &mut RenderTarget<'_>,
        uv: &TrapezoidUv,
        texture: u32,
        memory: &MemoryView<'_>,
    ) {
        let scale = target.scale() as i64;
        let width = target.width() as i64;
        let along = |from: u16, delta: i16, y: i64| i64::from(from) + i64::from(delta) * y / scale;
        let lerp = |a: i64, b: i64, step: i64, steps: i64| {
            (i128::from(a) + i128::from(b - a) * i128::from(step) / i128::from(steps)) as u16
        };

        self.for_each_span(target, |target, row, y, left, right| {
            let u_left = along(uv.left_u, uv.left_u_delta, y);
            let u_right = along(uv.right_u, uv.right_u_delta, y);
            let v_left = along(uv.left_v, uv.left_v_delta, y);
            let v_right = along(uv.right_v, uv.right_v_delta, y);

            for x in left.max(0)..right.min(width) {
                let u = lerp(u_left, u_right, x - left, right - left);
                let v = lerp(v_left, v_right, x - left, right - left);

                let address = texture
                    .wrapping_add(u32::from(v & 0xFF00))
                    .wrapping_add(u32::from(u >> 8));
                target.set_pixel(x as i32, row, memory.read_at(address));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cpu::SimpleCpu,
        render::{LCD_HEIGHT, LCD_WIDTH},
    };
    use pretty_assertions::assert_eq;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn buffer(scale: usize) -> Vec<u8> {
        vec![0; LCD_WIDTH * LCD_HEIGHT * scale * scale]
    }

    fn upscale(pixels: &[u8], k: usize) -> Vec<u8> {
        let width = LCD_WIDTH * k;
        let mut out = vec![0; pixels.len() * k * k];
        for (i, p) in out.iter_mut().enumerate() {
            let (x, y) = (i % width, i / width);
            *p = pixels[(y / k) * LCD_WIDTH + x / k];
        }
        out
    }

    #[test]
    fn from_registers_unpacks_edges() {
        let t = Trapezoid::from_registers(4, 10, 0x0A00_FF80, 0x1400_0100);
        assert_eq!(t.left, 0x0A00);
        assert_eq!(t.left_delta, -128);
        assert_eq!(t.right, 0x1400);
        assert_eq!(t.right_delta, 256);
        assert_eq!(t.height, 10);
    }

    #[test]
    fn flat_rectangle() {
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);
        Trapezoid::from_registers(2, 3, 5 << 24, 9 << 24).fill_flat(&mut target, 7);

        for y in 0..LCD_HEIGHT as i32 {
            for x in 0..LCD_WIDTH as i32 {
                let inside = (5..9).contains(&x) && (2..5).contains(&y);
                assert_eq!(target.pixel(x, y), Some(if inside { 7 } else { 0 }));
            }
        }
    }

    #[test]
    fn flat_sloped_edges() {
        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);
        // Left edge moves right by half a pixel per row, right edge stays.
        Trapezoid::from_registers(0, 4, (10 << 24) | 0x80, 20 << 24).fill_flat(&mut target, 1);

        let row_len = |y: i32| (0..240).filter(|&x| target.pixel(x, y) == Some(1)).count();
        assert_eq!([row_len(0), row_len(1), row_len(2), row_len(3)], [10, 10, 9, 9]);
    }

    #[test]
    fn deterministic() {
        let mut rng = StdRng::seed_from_u64(0x3D);
        for _ in 0..32 {
            let t = Trapezoid {
                top: rng.gen_range(0..150),
                height: rng.gen_range(1..40),
                left: rng.gen_range(0..200 << 8),
                left_delta: rng.gen_range(-512..512),
                right: rng.gen_range(0..240 << 8),
                right_delta: rng.gen_range(-512..512),
            };

            let mut first = buffer(2);
            t.fill_flat(&mut RenderTarget::new(&mut first, 2), 3);
            let mut second = buffer(2);
            t.fill_flat(&mut RenderTarget::new(&mut second, 2), 3);

            assert_eq!(first, second);
        }
    }

    #[test]
    fn axis_aligned_scales_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..8 {
            let left: u16 = rng.gen_range(0..200);
            let width: u16 = rng.gen_range(1..40);
            let t = Trapezoid {
                top: rng.gen_range(0..120),
                height: rng.gen_range(1..40),
                left: left << 8,
                left_delta: 0,
                right: (left + width) << 8,
                right_delta: 0,
            };

            let mut small = buffer(1);
            t.fill_flat(&mut RenderTarget::new(&mut small, 1), 5);

            for k in 2..=3 {
                let mut big = buffer(k);
                t.fill_flat(&mut RenderTarget::new(&mut big, k), 5);
                assert_eq!(big, upscale(&small, k));
            }
        }
    }

    #[test]
    fn textured_samples_rows_of_256() {
        let mut cpu = SimpleCpu::new();
        let texture = 0x0800_0000;
        let mut image = vec![0; 0x200];
        for (i, texel) in image.iter_mut().enumerate() {
            *texel = i as u8;
        }
        image[0x100] = 0xAA;
        cpu.load(texture, &image);

        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);
        let t = Trapezoid::from_registers(0, 1, 0, 4 << 24);
        // u goes 0..4 texels across the span, v stays on row 0.
        let uv = TrapezoidUv::from_words(0, 4 << 24, 0, 0);
        t.fill_textured(&mut target, &uv, texture, &MemoryView::new(&cpu, texture));

        assert_eq!(&target.pixels()[0..5], &[0, 1, 2, 3, 0]);

        // v = 1.0 selects the second texture row.
        let uv = TrapezoidUv::from_words(0x100, (4 << 24) | 0x100, 0, 0);
        t.fill_textured(&mut target, &uv, texture, &MemoryView::new(&cpu, texture));
        assert_eq!(target.pixel(0, 0), Some(0xAA));
    }

    #[test]
    fn huge_row_counts_stop_at_the_target() {
        let mut pixels = buffer(2);
        let mut target = RenderTarget::new(&mut pixels, 2);
        // Left edge races right by 128 pixels per row, far past the target.
        Trapezoid::from_registers(0, 0x4000_0000, 0x7FFF, 240 << 24).fill_flat(&mut target, 4);

        assert!((0..480).all(|x| target.pixel(x, 0) == Some(4)));
        assert!((0..480).all(|x| target.pixel(x, 319) == Some(0)));

        let mut pixels = buffer(1);
        let mut target = RenderTarget::new(&mut pixels, 1);
        // Edges start together and only move apart the wrong way.
        Trapezoid::from_registers(0, 0x0010_0000, 0x7FFF, 0x8000).fill_flat(&mut target, 4);
        Trapezoid::from_registers(0, u32::MAX, 0, 240 << 24).fill_flat(&mut target, 4);
        assert!(pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn rows_far_above_the_target_are_skipped() {
        let mut pixels = buffer(3);
        let mut target = RenderTarget::new(&mut pixels, 3);
        let t = Trapezoid {
            top: i32::MIN,
            height: i32::MAX,
            left: 0,
            left_delta: i16::MIN,
            right: u16::MAX,
            right_delta: i16::MAX,
        };
        t.fill_flat(&mut target, 1);
        assert!(target.pixels().iter().all(|&p| p == 0));

        // Starts far above and ends on screen: only the visible rows are walked.
        let t = Trapezoid {
            top: -(1 << 20),
            height: (1 << 20) + 2,
            left: 0,
            left_delta: 0,
            right: 4 << 8,
            right_delta: 0,
        };
        t.fill_flat(&mut target, 1);
        assert!((0..6).all(|y| target.pixel(0, y) == Some(1)));
        assert_eq!(target.pixel(0, 6), Some(0));
    }

    #[test]
    fn textured_with_extreme_deltas_stays_in_bounds() {
        let cpu = SimpleCpu::new();
        let mut pixels = buffer(2);
        let mut target = RenderTarget::new(&mut pixels, 2);
        let t = Trapezoid::from_registers(0, 0x7FFF_FFFF, 0x0000_8000, 0xFFFF_7FFF);
        let uv = TrapezoidUv::from_words(u32::MAX, 0, 0x8000_8000, 0x7FFF_7FFF);

        t.fill_textured(&mut target, &uv, 0x0800_0000, &MemoryView::new(&cpu, 0x0800_0000));

        assert!(target.pixels().iter().all(|&p| p == 0));
    }
}
