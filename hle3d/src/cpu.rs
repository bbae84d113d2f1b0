//! The slice of the emulated machine a hook handler can see.
//!
//! Handlers recover the operands of the routine they replace from the CPU
//! registers at the breakpoint, then read the rest out of the address space:
//!
//! | Region         | Start         | Size     |
//! |----------------|---------------|----------|
//! | Work RAM       | `0x0200_0000` | 256 KiB  |
//! | Internal RAM   | `0x0300_0000` | 32 KiB   |
//! | Palette RAM    | `0x0500_0000` | 1 KiB    |
//! | VRAM           | `0x0600_0000` | 96 KiB   |
//! | Game Pak ROM   | `0x0800_0000` | 32 MiB   |

/// A memory region of the GBA address space, selected by the top byte of an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryRegion {
    WorkRam,
    InternalRam,
    Palette,
    Vram,
    Rom,
}

impl MemoryRegion {
    #[must_use]
    pub const fn from_address(address: u32) -> Option<Self> {
        match address >> 24 {
            0x02 => Some(Self::WorkRam),
            0x03 => Some(Self::InternalRam),
            0x05 => Some(Self::Palette),
            0x06 => Some(Self::Vram),
            0x08..=0x0D => Some(Self::Rom),
            _ => None,
        }
    }

    /// Byte offset of `address` inside this region's backing memory.
    #[must_use]
    pub const fn offset(self, address: u32) -> usize {
        match self {
            Self::Rom => (address & 0x01FF_FFFF) as usize,
            _ => (address & 0x00FF_FFFF) as usize,
        }
    }

    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::WorkRam => 0x4_0000,
            Self::InternalRam => 0x8000,
            Self::Palette => 0x400,
            Self::Vram => 0x1_8000,
            Self::Rom => 0x200_0000,
        }
    }
}

/// Register and memory access the host emulator provides at a breakpoint.
pub trait Cpu {
    /// General purpose register `reg` (0-15).
    fn register_at(&self, reg: usize) -> u32;

    fn read_at(&self, address: u32) -> u8;

    fn write_at(&mut self, address: u32, value: u8);

    fn read_half_word(&self, address: u32) -> u16 {
        u16::from_le_bytes([self.read_at(address), self.read_at(address.wrapping_add(1))])
    }

    fn read_word(&self, address: u32) -> u32 {
        u32::from_le_bytes([
            self.read_at(address),
            self.read_at(address.wrapping_add(1)),
            self.read_at(address.wrapping_add(2)),
            self.read_at(address.wrapping_add(3)),
        ])
    }

    fn write_half_word(&mut self, address: u32, value: u16) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_at(address.wrapping_add(i as u32), byte);
        }
    }

    fn write_word(&mut self, address: u32, value: u32) {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_at(address.wrapping_add(i as u32), byte);
        }
    }

    /// Raw backing memory of `region`, if the host can expose it.
    fn memory_region(&self, _region: MemoryRegion) -> Option<&[u8]> {
        None
    }
}

/// Byte reads that go straight to the backing slice of a region when the host
/// exposes it, and through [`Cpu::read_at`] otherwise.
///
/// Built once per rasterizer call, never kept across hooks.
pub struct MemoryView<'a> {
    cpu: &'a dyn Cpu,
    region: Option<(MemoryRegion, &'a [u8])>,
}

impl<'a> MemoryView<'a> {
    /// View over the region containing `address`.
    pub fn new(cpu: &'a dyn Cpu, address: u32) -> Self {
        let region = MemoryRegion::from_address(address)
            .and_then(|region| cpu.memory_region(region).map(|bytes| (region, bytes)));

        Self { cpu, region }
    }

    #[must_use]
    pub fn read_at(&self, address: u32) -> u8 {
        if let Some((region, bytes)) = self.region {
            if MemoryRegion::from_address(address) == Some(region) {
                if let Some(byte) = bytes.get(region.offset(address)) {
                    return *byte;
                }
            }
        }

        self.cpu.read_at(address)
    }
}

/// A flat, self-contained [`Cpu`]: sixteen registers plus enough memory to
/// hold every region a hook reads. Unmapped reads return zero and writes to
/// ROM or unmapped addresses are dropped.
pub struct SimpleCpu {
    registers: [u32; 16],
    work_ram: Vec<u8>,
    internal_ram: Vec<u8>,
    palette: Vec<u8>,
    vram: Vec<u8>,
    rom: Vec<u8>,
}

impl Default for SimpleCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleCpu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: [0; 16],
            work_ram: vec![0; MemoryRegion::WorkRam.size()],
            internal_ram: vec![0; MemoryRegion::InternalRam.size()],
            palette: vec![0; MemoryRegion::Palette.size()],
            vram: vec![0; MemoryRegion::Vram.size()],
            rom: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rom(rom: Vec<u8>) -> Self {
        Self { rom, ..Self::new() }
    }

    pub const fn set_register(&mut self, reg: usize, value: u32) {
        self.registers[reg] = value;
    }

    /// Copies `bytes` to `address`, ROM included.
    pub fn load(&mut self, address: u32, bytes: &[u8]) {
        let Some(region) = MemoryRegion::from_address(address) else {
            return;
        };

        let offset = region.offset(address);
        let memory = self.backing_mut(region);
        if region == MemoryRegion::Rom && memory.len() < offset + bytes.len() {
            memory.resize(offset + bytes.len(), 0);
        }

        if let Some(dest) = memory.get_mut(offset..offset + bytes.len()) {
            dest.copy_from_slice(bytes);
        }
    }

    const fn backing(&self, region: MemoryRegion) -> &Vec<u8> {
        match region {
            MemoryRegion::WorkRam => &self.work_ram,
            MemoryRegion::InternalRam => &self.internal_ram,
            MemoryRegion::Palette => &self.palette,
            MemoryRegion::Vram => &self.vram,
            MemoryRegion::Rom => &self.rom,
        }
    }

    const fn backing_mut(&mut self, region: MemoryRegion) -> &mut Vec<u8> {
        match region {
            MemoryRegion::WorkRam => &mut self.work_ram,
            MemoryRegion::InternalRam => &mut self.internal_ram,
            MemoryRegion::Palette => &mut self.palette,
            MemoryRegion::Vram => &mut self.vram,
            MemoryRegion::Rom => &mut self.rom,
        }
    }
}

impl Cpu for SimpleCpu {
    fn register_at(&self, reg: usize) -> u32 {
        self.registers[reg]
    }

    fn read_at(&self, address: u32) -> u8 {
        MemoryRegion::from_address(address)
            .and_then(|region| self.backing(region).get(region.offset(address)).copied())
            .unwrap_or(0)
    }

    fn write_at(&mut self, address: u32, value: u8) {
        match MemoryRegion::from_address(address) {
            Some(MemoryRegion::Rom) | None => {}
            Some(region) => {
                let offset = region.offset(address);
                if let Some(byte) = self.backing_mut(region).get_mut(offset) {
                    *byte = value;
                }
            }
        }
    }

    fn memory_region(&self, region: MemoryRegion) -> Option<&[u8]> {
        Some(self.backing(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn region_from_address() {
        assert_eq!(MemoryRegion::from_address(0x0203_DC1B), Some(MemoryRegion::WorkRam));
        assert_eq!(MemoryRegion::from_address(0x0300_4198), Some(MemoryRegion::InternalRam));
        assert_eq!(MemoryRegion::from_address(0x0885_F8F0), Some(MemoryRegion::Rom));
        assert_eq!(MemoryRegion::from_address(0x0400_0000), None);
        assert_eq!(MemoryRegion::Rom.offset(0x0885_F8F0), 0x0085_F8F0);
    }

    #[test]
    fn wide_accesses_are_little_endian() {
        let mut cpu = SimpleCpu::new();
        cpu.write_word(0x0300_0010, 0x1234_5678);

        assert_eq!(cpu.read_at(0x0300_0010), 0x78);
        assert_eq!(cpu.read_half_word(0x0300_0012), 0x1234);
        assert_eq!(cpu.read_word(0x0300_0010), 0x1234_5678);
    }

    #[test]
    fn rom_is_read_only() {
        let mut cpu = SimpleCpu::with_rom(vec![1, 2, 3, 4]);
        cpu.write_at(0x0800_0001, 0xFF);

        assert_eq!(cpu.read_word(0x0800_0000), 0x0403_0201);
        assert_eq!(cpu.read_at(0x0800_0010), 0);
    }

    #[test]
    fn load_grows_rom() {
        let mut cpu = SimpleCpu::new();
        cpu.load(0x0800_0100, &[9, 8]);

        assert_eq!(cpu.read_half_word(0x0800_0100), 0x0809);
    }

    #[test]
    fn memory_view_matches_bus_reads() {
        let mut cpu = SimpleCpu::new();
        cpu.load(0x0800_0000, &[5, 6, 7]);
        cpu.write_at(0x0200_0000, 42);

        let view = MemoryView::new(&cpu, 0x0800_0000);
        assert_eq!(view.read_at(0x0800_0002), 7);
        assert_eq!(view.read_at(0x0800_0003), 0);
        // Outside the viewed region falls back to the bus.
        assert_eq!(view.read_at(0x0200_0000), 42);
    }
}
