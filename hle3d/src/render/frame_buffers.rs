use super::{LCD_HEIGHT, LCD_WIDTH, color::Palette, debug_rects::DebugRects, target::RenderTarget};

/// The two mode 4 frames, kept both as palette indices and as resolved RGBA8.
///
/// Which of the two is "front" is decided by the game on every call.
pub struct FrameBuffers {
    scale: usize,
    indexed: [Vec<u8>; 2],
    color: [Vec<u8>; 2],
    active: [bool; 2],
}

impl FrameBuffers {
    #[must_use]
    pub fn new(scale: usize) -> Self {
        let scale = scale.max(1);
        let pixels = LCD_WIDTH * LCD_HEIGHT * scale * scale;

        Self {
            scale,
            indexed: [vec![0; pixels], vec![0; pixels]],
            color: [vec![0; pixels * 4], vec![0; pixels * 4]],
            active: [false; 2],
        }
    }

    #[must_use]
    pub const fn scale(&self) -> usize {
        self.scale
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        LCD_WIDTH * self.scale
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        LCD_HEIGHT * self.scale
    }

    /// Reallocates everything for a new scale. Returns `false` and keeps the
    /// contents untouched when the scale does not change.
    pub fn set_scale(&mut self, scale: usize) -> bool {
        if scale == self.scale {
            return false;
        }

        *self = Self::new(scale);
        true
    }

    #[must_use]
    pub fn indexed(&self, index: usize) -> &[u8] {
        &self.indexed[index]
    }

    #[must_use]
    pub fn color(&self, index: usize) -> &[u8] {
        &self.color[index]
    }

    pub fn target(&mut self, index: usize) -> RenderTarget<'_> {
        RenderTarget::new(&mut self.indexed[index], self.scale)
    }

    #[must_use]
    pub const fn is_active(&self, index: usize) -> bool {
        self.active[index]
    }

    pub const fn set_active(&mut self, index: usize, active: bool) {
        self.active[index] = active;
    }

    pub const fn deactivate_all(&mut self) {
        self.active = [false; 2];
    }

    /// Zeroes the indexed pixels of one buffer.
    pub fn clear(&mut self, index: usize) {
        self.indexed[index].fill(0);
    }

    /// Zeroes both buffer pairs and clears both active flags.
    pub fn reset(&mut self) {
        for i in 0..2 {
            self.indexed[i].fill(0);
            self.color[i].fill(0);
        }
        self.deactivate_all();
    }

    /// Resolves one indexed buffer through `palette` into its color buffer,
    /// then draws and drops the queued debug rectangles.
    ///
    /// Index 0 is left fully transparent.
    pub fn commit(&mut self, index: usize, palette: &Palette, debug_rects: &mut DebugRects) {
        let color = &mut self.color[index];
        color.fill(0);

        for (rgba, &pixel) in color.chunks_exact_mut(4).zip(self.indexed[index].iter()) {
            if pixel != 0 {
                let c = palette.color(pixel);
                rgba.copy_from_slice(&[c.red, c.green, c.blue, 0xFF]);
            }
        }

        debug_rects.draw(color, self.scale);
        debug_rects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cpu::{Cpu, SimpleCpu},
        render::{color::Color, debug_rects::DebugRect},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn sizes_follow_scale() {
        let buffers = FrameBuffers::new(3);
        assert_eq!(buffers.indexed(1).len(), 720 * 480);
        assert_eq!(buffers.color(0).len(), 720 * 480 * 4);
    }

    #[test]
    fn same_scale_keeps_contents() {
        let mut buffers = FrameBuffers::new(2);
        buffers.target(0).set_pixel(1, 1, 9);
        buffers.set_active(0, true);

        assert!(!buffers.set_scale(2));
        assert_eq!(buffers.target(0).pixel(1, 1), Some(9));
        assert!(buffers.is_active(0));

        assert!(buffers.set_scale(1));
        assert_eq!(buffers.indexed(0).len(), 240 * 160);
        assert!(buffers.indexed(0).iter().all(|&p| p == 0));
        assert!(!buffers.is_active(0));
    }

    #[test]
    fn commit_resolves_and_drains_rects() {
        let mut cpu = SimpleCpu::new();
        cpu.write_half_word(0x0500_0000 + 3 * 2, 0x001F);
        let palette = Palette::from_cpu(&cpu);

        let mut buffers = FrameBuffers::new(1);
        buffers.target(1).set_pixel(10, 0, 3);

        let mut rects = DebugRects::default();
        rects.push(DebugRect {
            x: 100,
            y: 100,
            width: 1,
            height: 1,
            color: Color::from_rgb24(0x00_FF00),
        });

        buffers.commit(1, &palette, &mut rects);

        let color = buffers.color(1);
        assert_eq!(&color[40..44], &[0xFF, 0, 0, 0xFF]);
        assert_eq!(&color[0..4], &[0, 0, 0, 0]);
        let at = (100 * 240 + 100) * 4;
        assert_eq!(&color[at..at + 4], &[0, 0xFF, 0, 0xFF]);
        assert!(rects.is_empty());
        assert!(buffers.color(0).iter().all(|&c| c == 0));
    }
}
