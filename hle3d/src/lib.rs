//! High-level emulation of the software 3D renderers of a few GBA titles.
//!
//! Instead of interpreting a game's rasterizer instruction by instruction,
//! the emulator traps on its entry points and lets a native backend draw the
//! same primitives into palette-indexed buffers at any integer upscale. The
//! resolved RGBA frames are then composited over the emulator's own 2D output.
//!
//! ```no_run
//! use hle3d::{Hle3d, Hle3dConfig, SimpleCpu};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rom = std::fs::read("game.gba")?;
//!     let mut hle = Hle3d::new(Hle3dConfig { scale: 2, ..Hle3dConfig::default() })?;
//!     hle.on_rom_loaded(&rom)?;
//!
//!     let mut cpu = SimpleCpu::with_rom(rom);
//!     // In the CPU loop, before executing the instruction at `pc`:
//!     let pc = 0x0300_4198;
//!     if hle.breakpoints().contains(&pc) {
//!         hle.on_breakpoint(&mut cpu, pc);
//!     }
//!     Ok(())
//! }
//! ```

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_sign_loss)]
#[allow(clippy::unreadable_literal)]
pub mod backends;

pub mod breakpoints;
pub mod config;

#[allow(clippy::cast_possible_truncation)] // GBA addresses are 32-bit
pub mod cpu;

pub mod dispatcher;
pub mod error;
pub mod raster;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_possible_wrap)]
#[allow(clippy::cast_sign_loss)]
pub mod render;

pub mod title;

pub use config::Hle3dConfig;
pub use cpu::{Cpu, MemoryRegion, SimpleCpu};
pub use dispatcher::Hle3d;
pub use error::Error;
pub use title::TitleId;
