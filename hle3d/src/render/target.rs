use super::{LCD_HEIGHT, LCD_WIDTH};

/// Mutable view of one indexed buffer at the current render scale.
///
/// Every write is bounds-checked so hooks fed with unexpected data can at
/// worst draw garbage, never write outside the buffer.
pub struct RenderTarget<'a> {
    pixels: &'a mut [u8],
    scale: usize,
}

impl<'a> RenderTarget<'a> {
    pub fn new(pixels: &'a mut [u8], scale: usize) -> Self {
        debug_assert_eq!(pixels.len(), LCD_WIDTH * LCD_HEIGHT * scale * scale);
        Self { pixels, scale }
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

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        self.pixels
    }

    /// Pixel at output coordinates, `None` when outside the buffer.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.index_of(x, y).map(|i| self.pixels[i])
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, value: u8) {
        if let Some(i) = self.index_of(x, y) {
            self.pixels[i] = value;
        }
    }

    /// Fills `[left, right)` of row `y`, clipped to the buffer.
    pub fn fill_span(&mut self, y: i32, left: i32, right: i32, value: u8) {
        if let Some(span) = self.span_mut(y, left, right) {
            span.fill(value);
        }
    }

    /// Pixels `[left, right)` of row `y`, clipped to the buffer. `None` when nothing is left.
    pub fn span_mut(&mut self, y: i32, left: i32, right: i32) -> Option<&mut [u8]> {
        if y < 0 || y as usize >= self.height() {
            return None;
        }

        let width = self.width();
        let left = left.clamp(0, width as i32) as usize;
        let right = right.clamp(0, width as i32) as usize;
        if left >= right {
            return None;
        }

        let row = y as usize * width;
        Some(&mut self.pixels[row + left..row + right])
    }

    /// Writes `value` into the `scale × scale` block covering the logical
    /// (unscaled) pixel `(x, y)`.
    pub fn fill_block(&mut self, x: i32, y: i32, value: u8) {
        if x < 0 || y < 0 || x as usize >= LCD_WIDTH || y as usize >= LCD_HEIGHT {
            return;
        }

        let scale = self.scale as i32;
        for sy in 0..scale {
            self.fill_span(y * scale + sy, x * scale, (x + 1) * scale, value);
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Copies a native 240×160 frame in, replicating each source pixel into a
    /// `scale × scale` block.
    pub fn blit_upscaled(&mut self, source: &[u8]) {
        debug_assert_eq!(source.len(), LCD_WIDTH * LCD_HEIGHT);

        if self.scale == 1 {
            self.pixels.copy_from_slice(source);
            return;
        }

        let (scale, width) = (self.scale, self.width());
        for (y, row) in source.chunks_exact(LCD_WIDTH).enumerate() {
            let first = y * scale * width;
            let line = &mut self.pixels[first..first + width];
            for (block, &pixel) in line.chunks_exact_mut(scale).zip(row) {
                block.fill(pixel);
            }

            for sy in 1..scale {
                self.pixels.copy_within(first..first + width, first + sy * width);
            }
        }
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        let (width, height) = (self.width(), self.height());
        if x < 0 || y < 0 || x as usize >= width || y as usize >= height {
            return None;
        }

        Some(y as usize * width + x as usize)
    }
}
