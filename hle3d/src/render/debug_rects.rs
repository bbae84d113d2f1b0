use super::{LCD_HEIGHT, LCD_WIDTH, color::Color};

/// Outline drawn over the resolved frame, in unscaled screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebugRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub color: Color,
}

/// Rectangles queued while a frame is rasterized and drawn, in order, once it
/// is committed.
#[derive(Default, Debug)]
pub struct DebugRects(Vec<DebugRect>);

impl DebugRects {
    pub fn push(&mut self, rect: DebugRect) {
        self.0.push(rect);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outlines every queued rectangle into an RGBA8 buffer at `scale`.
    /// Right and bottom edges are inclusive.
    pub fn draw(&self, rgba: &mut [u8], scale: usize) {
        let width = (LCD_WIDTH * scale) as i64;
        let height = (LCD_HEIGHT * scale) as i64;
        let scale = scale as i64;

        for rect in &self.0 {
            if rect.width < 0 || rect.height < 0 {
                continue;
            }

            let (x, y) = (i64::from(rect.x), i64::from(rect.y));
            let left = x * scale;
            let right = (x + i64::from(rect.width)) * scale;
            let top = y * scale;
            let bottom = (y + i64::from(rect.height)) * scale;

            if right < 0 || left >= width || bottom < 0 || top >= height {
                continue;
            }

            let left = left.max(0);
            let right = right.min(width - 1);
            let top = top.max(0);
            let bottom = bottom.min(height - 1);

            let mut plot = |x: i64, y: i64| {
                let i = (y * width + x) as usize * 4;
                rgba[i..i + 4].copy_from_slice(&[rect.color.red, rect.color.green, rect.color.blue, 0xFF]);
            };

            for x in left..=right {
                plot(x, top);
                plot(x, bottom);
            }
            for y in top..=bottom {
                plot(left, y);
                plot(right, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rgba_at(rgba: &[u8], x: usize, y: usize, scale: usize) -> [u8; 4] {
        let i = (y * LCD_WIDTH * scale + x) * 4;
        rgba[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn outline_at_scale() {
        let mut rects = DebugRects::default();
        rects.push(DebugRect {
            x: 2,
            y: 3,
            width: 4,
            height: 2,
            color: Color::from_rgb24(0xFF_0000),
        });

        let scale = 2;
        let mut rgba = vec![0; LCD_WIDTH * LCD_HEIGHT * scale * scale * 4];
        rects.draw(&mut rgba, scale);

        let red = [0xFF, 0, 0, 0xFF];
        assert_eq!(rgba_at(&rgba, 4, 6, scale), red);
        assert_eq!(rgba_at(&rgba, 12, 6, scale), red);
        assert_eq!(rgba_at(&rgba, 4, 10, scale), red);
        assert_eq!(rgba_at(&rgba, 12, 10, scale), red);
        assert_eq!(rgba_at(&rgba, 8, 8, scale), [0; 4]);

        let lit = rgba.chunks(4).filter(|p| p[3] == 0xFF).count();
        // 9 columns on two rows, plus 3 inner rows on two columns.
        assert_eq!(lit, 9 * 2 + 3 * 2);
    }

    #[test]
    fn clamped_and_skipped() {
        let mut rects = DebugRects::default();
        rects.push(DebugRect {
            x: -10,
            y: -10,
            width: 5,
            height: 5,
            color: Color::from_rgb24(0x00_FF00),
        });
        rects.push(DebugRect {
            x: 235,
            y: 155,
            width: 20,
            height: 20,
            color: Color::from_rgb24(0x00_00FF),
        });

        let mut rgba = vec![0; LCD_WIDTH * LCD_HEIGHT * 4];
        rects.draw(&mut rgba, 1);

        assert_eq!(rgba_at(&rgba, 0, 0, 1), [0; 4]);
        assert_eq!(rgba_at(&rgba, 239, 159, 1), [0, 0, 0xFF, 0xFF]);
        assert_eq!(rgba_at(&rgba, 235, 155, 1), [0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn extreme_extents_do_not_overflow() {
        let mut rects = DebugRects::default();
        for (x, width) in [(i32::MAX, i32::MAX), (i32::MIN, i32::MAX), (0, i32::MIN)] {
            rects.push(DebugRect {
                x,
                y: 0,
                width,
                height: 1,
                color: Color::from_rgb24(0xFF_FFFF),
            });
        }

        let mut rgba = vec![0; LCD_WIDTH * LCD_HEIGHT * 4 * 4];
        rects.draw(&mut rgba, 2);

        // The widest one still ends one pixel left of the screen.
        assert!(rgba.iter().all(|&p| p == 0));
    }
}
