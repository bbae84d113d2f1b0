//! Tony Hawk's Downhill Jam.
//!
//! The slopes are drawn as flat colored regions, one IWRAM routine filling
//! rows between two 17.15 fixed point edges.

use tracing::{debug, info, warn};

use super::{Backend, BackendContext};
use crate::{
    cpu::Cpu,
    render::{MODE4_FRAME0_ADDRESS, MODE4_FRAME_SIZE, mode4_row},
    title::TitleId,
};

const TITLES: [TitleId; 2] = [TitleId::from_code(b"BXSP"), TitleId::from_code(b"BXSE")];

const CLEAR_SCREEN: u32 = 0x0300_07A0;
const FLIP_BUFFERS: u32 = 0x0800_3536;
const FILL_COLORED_REGION: u32 = 0x0300_227C;

const EDGE_FRACTION_BITS: u32 = 15;

/// Mode 4 frame a VRAM pointer falls in.
const fn frame_of(vram_pointer: u32) -> usize {
    if vram_pointer < MODE4_FRAME0_ADDRESS + MODE4_FRAME_SIZE { 0 } else { 1 }
}

#[derive(Default)]
pub struct DownhillJamBackend {
    active: bool,
}

impl Backend for DownhillJamBackend {
    fn name(&self) -> &'static str {
        "downhill-jam"
    }

    fn identify(&self, title: TitleId) -> bool {
        TITLES.contains(&title)
    }

    fn init(&mut self, ctx: &mut BackendContext<'_>, title: TitleId) {
        info!(%title, "downhill jam backend active");
        for address in [CLEAR_SCREEN, FLIP_BUFFERS, FILL_COLORED_REGION] {
            ctx.breakpoints.add(address);
        }
        self.active = true;
    }

    fn deinit(&mut self) {
        self.active = false;
    }

    fn hook(&mut self, ctx: &mut BackendContext<'_>, cpu: &mut dyn Cpu, pc: u32) {
        if !self.active {
            warn!(pc = format_args!("{pc:#010X}"), "unhandled downhill jam hook");
            return;
        }

        match pc {
            CLEAR_SCREEN => {
                let index = frame_of(cpu.register_at(0));
                debug!(frame = index, "clear screen");
                ctx.frames.set_active(index, false);
                ctx.frames.clear(index);
            }
            FLIP_BUFFERS => ctx.flip(cpu, cpu.register_at(0) as u16),
            FILL_COLORED_REGION => fill_colored_region(ctx, cpu),
            _ => warn!(pc = format_args!("{pc:#010X}"), "unhandled downhill jam hook"),
        }
    }
}

/// r0/r1 left/right edge, r7/r8 their per-row deltas, r4 the color in its
/// second byte, r5 the VRAM pointer of the first row and r6 the row count.
fn fill_colored_region(ctx: &mut BackendContext<'_>, cpu: &dyn Cpu) {
    let destination = cpu.register_at(5);
    let index = frame_of(destination);
    ctx.frames.set_active(index, true);

    let mut target = ctx.frames.target(index);
    let scale = target.scale() as i32;
    let width = target.width() as i32;
    let top = mode4_row(destination) as i32 * scale;
    let height = cpu.register_at(6) as i32;
    let color = (cpu.register_at(4) >> 8) as u8;

    let mut left_edge = (cpu.register_at(0) as i32).wrapping_mul(scale);
    let mut right_edge = (cpu.register_at(1) as i32).wrapping_mul(scale);
    let (left_delta, right_delta) = (cpu.register_at(7) as i32, cpu.register_at(8) as i32);

    for y in 0..height.saturating_mul(scale) {
        let left = (left_edge >> EDGE_FRACTION_BITS).max(0);
        let right = (right_edge >> EDGE_FRACTION_BITS).min(width);
        if left < right {
            target.fill_span(top + y, left, right, color);
        }

        left_edge = left_edge.wrapping_add(left_delta);
        right_edge = right_edge.wrapping_add(right_delta);
    }
}
