//! Records of the Drome primitive stream.
//!
//! ```text
//! +0   u8   tag                (0 terminates the stream)
//! +1   u8   clip flags
//! +2   u16  next record, offset inside the current 64 KiB bank
//! +8   u8   sprite index       (occluders)
//! +11  u8   color or texture index
//! +12       vertices
//! ```
//!
//! Flat triangles pack each vertex in one word, `y << 16 | x`. Textured ones
//! use four half words per vertex: x, y, u, v. All of them in 1/8 units.

use crate::{
    cpu::Cpu,
    error::Error,
    raster::{clipper::ClipFlags, triangle::Vertex},
};

const CLIP_FLAGS: u32 = 1;
const NEXT: u32 = 2;
const SPRITE_INDEX: u32 = 8;
const MATERIAL: u32 = 11;
const VERTICES: u32 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveKind {
    FlatTriangle,
    StaticTexturedTriangle,
    AffineTriangle,
    ClippedFlatTriangle,
    ClippedStaticTexturedTriangle,
    ClippedAffineTriangle,
    SpriteOccluder,
}

impl TryFrom<u8> for PrimitiveKind {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(Self::FlatTriangle),
            2 => Ok(Self::StaticTexturedTriangle),
            3 => Ok(Self::AffineTriangle),
            4 => Ok(Self::ClippedFlatTriangle),
            5 => Ok(Self::ClippedStaticTexturedTriangle),
            6 => Ok(Self::ClippedAffineTriangle),
            7 => Ok(Self::SpriteOccluder),
            tag => Err(Error::UnknownPrimitive { tag }),
        }
    }
}

/// A record of the stream, read lazily from emulated memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Primitive {
    pub address: u32,
}

impl Primitive {
    pub fn tag(self, cpu: &dyn Cpu) -> u8 {
        cpu.read_at(self.address)
    }

    pub fn next(self, cpu: &dyn Cpu) -> Self {
        let offset = cpu.read_half_word(self.address.wrapping_add(NEXT));
        Self {
            address: (self.address & 0xFFFF_0000) | u32::from(offset),
        }
    }

    pub fn clip_flags(self, cpu: &dyn Cpu) -> ClipFlags {
        ClipFlags(cpu.read_at(self.address.wrapping_add(CLIP_FLAGS)) & ClipFlags::ALL.0)
    }

    pub fn sprite_index(self, cpu: &dyn Cpu) -> u8 {
        cpu.read_at(self.address.wrapping_add(SPRITE_INDEX))
    }

    /// Color index of flat triangles, texture index of textured ones.
    pub fn material(self, cpu: &dyn Cpu) -> u8 {
        cpu.read_at(self.address.wrapping_add(MATERIAL))
    }

    pub fn flat_vertices(self, cpu: &dyn Cpu) -> [Vertex; 3] {
        std::array::from_fn(|i| {
            let packed = cpu.read_word(self.address.wrapping_add(VERTICES + 4 * i as u32));
            Vertex::new(i32::from(packed as i16), i32::from((packed >> 16) as i16))
        })
    }

    pub fn textured_vertices(self, cpu: &dyn Cpu) -> [Vertex; 3] {
        std::array::from_fn(|i| {
            let vertex = self.address.wrapping_add(VERTICES + 8 * i as u32);
            let half = |offset: u32| i32::from(cpu.read_half_word(vertex.wrapping_add(offset)) as i16);
            Vertex::textured(half(0), half(2), half(4), half(6))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::SimpleCpu;
    use pretty_assertions::assert_eq;

    #[test]
    fn tags() {
        assert_eq!(PrimitiveKind::try_from(3), Ok(PrimitiveKind::AffineTriangle));
        assert_eq!(PrimitiveKind::try_from(7), Ok(PrimitiveKind::SpriteOccluder));
        assert_eq!(PrimitiveKind::try_from(8), Err(Error::UnknownPrimitive { tag: 8 }));
    }

    #[test]
    fn next_stays_in_bank() {
        let mut cpu = SimpleCpu::new();
        cpu.write_half_word(0x0201_FFF2, 0x0010);

        let next = Primitive { address: 0x0201_FFF0 }.next(&cpu);
        assert_eq!(next.address, 0x0201_0010);
    }

    #[test]
    fn decode_vertices() {
        let mut cpu = SimpleCpu::new();
        let base = 0x0200_0100;
        cpu.write_word(base + 12, 0xFFF8_0010);
        cpu.write_word(base + 16, 0x0020_0030);

        let flat = Primitive { address: base }.flat_vertices(&cpu);
        assert_eq!(flat[0], Vertex::new(16, -8));
        assert_eq!(flat[1], Vertex::new(48, 32));

        for (i, value) in [-4i16, 5, 6, 7].into_iter().enumerate() {
            cpu.write_half_word(base + 20 + 2 * i as u32, value as u16);
        }
        let textured = Primitive { address: base }.textured_vertices(&cpu);
        assert_eq!(textured[1], Vertex::textured(-4, 5, 6, 7));
    }
}
