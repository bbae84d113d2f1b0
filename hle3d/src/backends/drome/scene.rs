//! The render context both pipeline stages receive in r0.
//!
//! ```text
//! +0   i16[9]  camera rotation, 4.12
//! +20  i32[3]  camera position
//! +32  u16[4]  viewport x, y, width, height in pixels
//! +40  ptr     first scene object
//! +56  ptr     primitive stream
//! +60  ptr     draw buffer in VRAM
//! +64  ptr     texture table, one pointer per 64×64 8bpp texture
//! +96          sprite parameters, 8 bytes each
//! ```

use crate::{
    cpu::{Cpu, MemoryView},
    raster::{clipper::Viewport, triangle::Texture},
    render::MODE4_FRAME0_ADDRESS,
};

const CAMERA_POSITION: u32 = 20;
const VIEWPORT: u32 = 32;
const OBJECTS: u32 = 40;
const PRIMITIVE_STREAM: u32 = 56;
const DRAW_BUFFER: u32 = 60;
const TEXTURES: u32 = 64;
const SPRITES: u32 = 96;
const SPRITE_ENTRY_SIZE: u32 = 8;

/// Longest object list walked before it is considered corrupt.
const MAX_OBJECTS: usize = 1024;

pub const TEXTURE_SIZE: i32 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderContext {
    pub address: u32,
    pub stream: u32,
    pub draw_buffer: u32,
    pub textures: u32,
    /// Pixel rectangle, right and bottom exclusive.
    pub screen: (i32, i32, i32, i32),
}

impl RenderContext {
    pub fn read(cpu: &dyn Cpu, address: u32) -> Self {
        let half = |offset: u32| i32::from(cpu.read_half_word(address.wrapping_add(VIEWPORT + offset)));
        let (x, y) = (half(0), half(2));

        Self {
            address,
            stream: cpu.read_word(address.wrapping_add(PRIMITIVE_STREAM)),
            draw_buffer: cpu.read_word(address.wrapping_add(DRAW_BUFFER)),
            textures: cpu.read_word(address.wrapping_add(TEXTURES)),
            screen: (x, y, x + half(4), y + half(6)),
        }
    }

    /// Mode 4 frame the stream is drawn into.
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        if self.draw_buffer == MODE4_FRAME0_ADDRESS { 0 } else { 1 }
    }

    /// Clip rectangle in 1/8 pixels, running through the centers of the
    /// first and one past the last pixel.
    #[must_use]
    pub const fn clip_viewport(&self) -> Viewport {
        let (left, top, right, bottom) = self.screen;
        Viewport {
            left: left * 8 + 4,
            top: top * 8 + 4,
            right: right * 8 + 4,
            bottom: bottom * 8 + 4,
        }
    }

    #[must_use]
    pub const fn contains_pixel(&self, x: i32, y: i32) -> bool {
        let (left, top, right, bottom) = self.screen;
        x >= left && x < right && y >= top && y < bottom
    }

    #[must_use]
    pub const fn sprite(&self, index: u8) -> SpriteParams {
        SpriteParams {
            address: self
                .address
                .wrapping_add(SPRITES)
                .wrapping_add(index as u32 * SPRITE_ENTRY_SIZE),
        }
    }

    pub fn texture<'a>(&self, cpu: &'a dyn Cpu, index: u8) -> SceneTexture<'a> {
        let base = cpu.read_word(self.textures.wrapping_add(u32::from(index) * 4));
        SceneTexture {
            base,
            memory: MemoryView::new(cpu, base),
        }
    }

    #[must_use]
    pub const fn objects_pointer(&self) -> u32 {
        self.address.wrapping_add(OBJECTS)
    }
}

/// One entry of the sprite table: screen position and the visibility the
/// rasterizer reports back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteParams {
    pub address: u32,
}

impl SpriteParams {
    pub fn position(self, cpu: &dyn Cpu) -> (i32, i32) {
        let half = |offset: u32| i32::from(cpu.read_half_word(self.address.wrapping_add(offset)) as i16);
        (half(2), half(4))
    }

    pub fn set_status(self, cpu: &mut dyn Cpu, status: u16) {
        cpu.write_half_word(self.address.wrapping_add(6), status);
    }
}

/// 64×64 8bpp texture, repeating in both directions.
pub struct SceneTexture<'a> {
    base: u32,
    memory: MemoryView<'a>,
}

impl Texture for SceneTexture<'_> {
    fn texel(&self, u: i32, v: i32) -> u8 {
        let offset = (v & (TEXTURE_SIZE - 1)) * TEXTURE_SIZE + (u & (TEXTURE_SIZE - 1));
        self.memory.read_at(self.base.wrapping_add(offset as u32))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Camera {
    pub rotation: [[i16; 3]; 3],
    pub position: [i32; 3],
}

impl Camera {
    pub fn read(cpu: &dyn Cpu, context: u32) -> Self {
        Self {
            rotation: std::array::from_fn(|row| {
                std::array::from_fn(|col| {
                    cpu.read_half_word(context.wrapping_add(((row * 3 + col) * 2) as u32)) as i16
                })
            }),
            position: std::array::from_fn(|i| {
                cpu.read_word(context.wrapping_add(CAMERA_POSITION + 4 * i as u32)) as i32
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneObject {
    pub address: u32,
    pub model: u32,
    pub position: [i32; 3],
}

/// Walks the linked object list starting at `first`, stopping at a null link
/// or after [`MAX_OBJECTS`] entries.
pub fn objects(cpu: &dyn Cpu, first: u32) -> impl Iterator<Item = SceneObject> + '_ {
    std::iter::successors((first != 0).then_some(first), move |&address| {
        let next = cpu.read_word(address.wrapping_add(36));
        (next != 0).then_some(next)
    })
    .take(MAX_OBJECTS)
    .map(move |address| SceneObject {
        address,
        model: cpu.read_word(address.wrapping_add(20)),
        position: std::array::from_fn(|i| cpu.read_word(address.wrapping_add(24 + 4 * i as u32)) as i32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::SimpleCpu;
    use pretty_assertions::assert_eq;

    const CONTEXT: u32 = 0x0300_0800;

    #[test]
    fn viewport_and_frame() {
        let mut cpu = SimpleCpu::new();
        for (i, value) in [8u16, 16, 224, 128].into_iter().enumerate() {
            cpu.write_half_word(CONTEXT + 32 + 2 * i as u32, value);
        }
        cpu.write_word(CONTEXT + 60, 0x0600_A000);

        let context = RenderContext::read(&cpu, CONTEXT);
        assert_eq!(context.frame_index(), 1);
        assert_eq!(
            context.clip_viewport(),
            Viewport {
                left: 68,
                top: 132,
                right: 1860,
                bottom: 1156
            }
        );
        assert!(context.contains_pixel(8, 16));
        assert!(context.contains_pixel(231, 143));
        assert!(!context.contains_pixel(232, 100));
        assert!(!context.contains_pixel(7, 100));
    }

    #[test]
    fn texture_wraps() {
        let mut cpu = SimpleCpu::new();
        cpu.write_word(CONTEXT + 64, 0x0300_1000);
        cpu.write_word(0x0300_1000 + 4, 0x0200_0000);
        cpu.write_at(0x0200_0000 + 64 + 2, 5);

        let context = RenderContext::read(&cpu, CONTEXT);
        let texture = context.texture(&cpu, 1);
        assert_eq!(texture.texel(2, 1), 5);
        assert_eq!(texture.texel(66, -63), 5);
        assert_eq!(texture.texel(3, 1), 0);
    }

    #[test]
    fn object_list() {
        let mut cpu = SimpleCpu::new();
        cpu.write_word(0x0200_0000 + 36, 0x0200_0100);
        cpu.write_word(0x0200_0100 + 20, 0x0812_3456);
        cpu.write_word(0x0200_0100 + 28, (-5i32) as u32);

        let list: Vec<_> = objects(&cpu, 0x0200_0000).collect();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].model, 0x0812_3456);
        assert_eq!(list[1].position, [0, -5, 0]);
        assert_eq!(objects(&cpu, 0).count(), 0);

        // A list linking back to itself is cut off.
        cpu.write_word(0x0200_0100 + 36, 0x0200_0000);
        assert_eq!(objects(&cpu, 0x0200_0000).count(), MAX_OBJECTS);
    }

    #[test]
    fn camera() {
        let mut cpu = SimpleCpu::new();
        cpu.write_half_word(CONTEXT, 0x1000);
        cpu.write_half_word(CONTEXT + 16, 0xF000);
        cpu.write_word(CONTEXT + 24, 300);

        let camera = Camera::read(&cpu, CONTEXT);
        assert_eq!(camera.rotation[0][0], 0x1000);
        assert_eq!(camera.rotation[2][2], -0x1000);
        assert_eq!(camera.position, [0, 300, 0]);
    }
}
