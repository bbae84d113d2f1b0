//! Per-engine handlers for the routines a title's renderer is built from.
//!
//! A backend knows the entry points of one engine in every title it supports,
//! arms them as breakpoints on init and, when one is hit, decodes the
//! routine's operands out of registers and memory and draws the result into
//! the shared frame buffers.
//!
//! | Backend                       | Titles                                      |
//! |-------------------------------|---------------------------------------------|
//! | [`v3d::V3dBackend`]           | Asterix & Obelix XXL (+ 2 in 1), Driv3r     |
//! | [`drome::DromeBackend`]       | Drome Racers, Hot Wheels Stunt Track/2 Pack |
//! | [`downhill_jam::DownhillJamBackend`] | Tony Hawk's Downhill Jam             |

pub mod downhill_jam;
pub mod drome;
pub mod v3d;

use crate::{
    breakpoints::Breakpoints,
    config::Hle3dConfig,
    cpu::Cpu,
    render::{
        MODE4,
        color::{Color, Palette},
        debug_rects::{DebugRect, DebugRects},
        frame_buffers::FrameBuffers,
    },
    title::TitleId,
};

/// Everything of the dispatcher a backend may touch while it runs.
pub struct BackendContext<'a> {
    pub breakpoints: &'a mut Breakpoints,
    pub frames: &'a mut FrameBuffers,
    pub debug_rects: &'a mut DebugRects,
    pub config: &'a Hle3dConfig,
}

impl BackendContext<'_> {
    /// Resolves buffer `index` against the palette currently in palette RAM.
    pub fn commit_frame(&mut self, cpu: &dyn Cpu, index: usize) {
        let palette = Palette::from_cpu(cpu);
        self.frames.commit(index, &palette, self.debug_rects);
    }

    /// Handles a write of `display_control` to DISPCNT at the end of a frame.
    ///
    /// In mode 4 the frame select bit names the buffer about to be shown: it
    /// gets committed and the other one is no longer considered 3D. Any other
    /// mode shows no bitmap at all.
    pub fn flip(&mut self, cpu: &dyn Cpu, display_control: u16) {
        let mode = display_control & 0x7;
        if mode == MODE4 {
            let front = usize::from((display_control >> 4) & 1);
            tracing::debug!(front, "flip buffers");
            self.frames.set_active(1 - front, false);
            self.commit_frame(cpu, front);
        } else {
            tracing::debug!(mode, "flip buffers outside of mode 4");
            self.frames.deactivate_all();
        }
    }

    /// Queues an outline when debug drawing is enabled.
    pub fn debug_rect(&mut self, x: i32, y: i32, width: i32, height: i32, rgb: u32) {
        if self.config.debug_draw {
            self.debug_rects.push(DebugRect {
                x,
                y,
                width,
                height,
                color: Color::from_rgb24(rgb),
            });
        }
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Whether this backend supports `title`.
    fn identify(&self, title: TitleId) -> bool;

    /// Arms the breakpoints for `title`. Only called after `identify` accepted it.
    fn init(&mut self, ctx: &mut BackendContext<'_>, title: TitleId);

    fn deinit(&mut self);

    /// Handles a hit on one of the armed breakpoints.
    fn hook(&mut self, ctx: &mut BackendContext<'_>, cpu: &mut dyn Cpu, pc: u32);
}

/// One instance of every backend, in the order they are offered a title.
#[must_use]
pub fn all() -> Vec<Box<dyn Backend>> {
    vec![
        Box::new(v3d::V3dBackend::default()),
        Box::new(drome::DromeBackend::default()),
        Box::new(downhill_jam::DownhillJamBackend::default()),
    ]
}
