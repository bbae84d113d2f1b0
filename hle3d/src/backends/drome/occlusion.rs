use vecfixed::VecFixed;

use crate::render::target::RenderTarget;

/// Most sprites the engine tests against the 3D scene in one frame.
pub const OCCLUSION_STACK_CAPACITY: usize = 32;

/// What the game is told about a sprite once the frame is known, written as
/// a half word into its parameter entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum SpriteVisibility {
    /// Something was drawn over the hole: the sprite is behind the scene.
    Occluded = 0,
    /// The sprite position is outside the viewport.
    Outside = 1,
    /// The hole survived: draw the sprite on top of the scene.
    Visible = 2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Occluder {
    sprite: u8,
    x: i32,
    y: i32,
    saved: u8,
}

/// Holes punched into the frame at sprite positions, resolved once the whole
/// primitive stream has been drawn.
#[derive(Default)]
pub struct OcclusionStack(VecFixed<OCCLUSION_STACK_CAPACITY, Occluder>);

impl OcclusionStack {
    /// Zeroes the pixel at output coordinates `(x, y)` and remembers what was
    /// there. Returns the saved pixel, or `None` when nothing was punched.
    pub fn punch(&mut self, target: &mut RenderTarget<'_>, sprite: u8, x: i32, y: i32) -> Option<u8> {
        let saved = target.pixel(x, y)?;
        if self.0.push(Occluder { sprite, x, y, saved }).is_err() {
            tracing::warn!(sprite, capacity = OCCLUSION_STACK_CAPACITY, "occlusion stack full");
            return None;
        }

        target.set_pixel(x, y, 0);
        Some(saved)
    }

    /// Pops every hole, newest first. A hole nothing was drawn into gets its
    /// pixel back and the sprite is visible; otherwise the sprite is occluded.
    pub fn drain(&mut self, target: &mut RenderTarget<'_>, mut report: impl FnMut(u8, SpriteVisibility)) {
        while let Some(occluder) = self.0.pop() {
            if target.pixel(occluder.x, occluder.y) == Some(0) {
                target.set_pixel(occluder.x, occluder.y, occluder.saved);
                report(occluder.sprite, SpriteVisibility::Visible);
            } else {
                report(occluder.sprite, SpriteVisibility::Occluded);
            }
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
