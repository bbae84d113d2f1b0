//! The Drome engine (Drome Racers and the Hot Wheels games built on it).
//!
//! Both pipeline stages run from the same RAM trampoline, which jumps through
//! a function pointer: a single breakpoint on the trampoline plus a look at
//! the pointer tells the transform stage from the rasterizer.
//!
//! The rasterizer walks a linked stream of primitive records and draws every
//! one of them into the mode 4 buffer the game is about to show, then
//! resolves sprite occlusion and commits the frame. Depending on the
//! [`SuppressionPolicy`] the game's own stages are handed empty input so they
//! do no redundant work.

pub mod occlusion;
pub mod primitive;
pub mod scene;

use tracing::{debug, info, trace, warn};

use super::{Backend, BackendContext};
use crate::{
    config::SuppressionPolicy,
    cpu::Cpu,
    error::Error,
    raster::{
        clipper::{clip_triangle, triangle_fan},
        triangle::{fill_affine_triangle, fill_flat_triangle},
    },
    render::target::RenderTarget,
    title::TitleId,
};
use occlusion::{OcclusionStack, SpriteVisibility};
use primitive::{Primitive, PrimitiveKind};
use scene::{Camera, RenderContext, objects};

/// Longest primitive stream drawn before it is considered corrupt.
pub const MAX_PRIMITIVES: usize = 4096;

/// Only the rasterizer is replaced, and the game's own one is starved.
pub const DEFAULT_SUPPRESSION: SuppressionPolicy = SuppressionPolicy {
    hook_transform: false,
    disable_real_transform: false,
    disable_real_rasterizer: true,
};

#[derive(Debug)]
pub struct DromeProfile {
    pub name: &'static str,
    pub titles: &'static [TitleId],
    /// The RAM trampoline both stages are called through.
    pub ram_execution_point: u32,
    /// Word holding the stage the trampoline is about to run.
    pub active_function: u32,
    pub transform: u32,
    pub rasterize: u32,
    pub suppression: SuppressionPolicy,
}

pub static DROME_RACERS: DromeProfile = DromeProfile {
    name: "Drome Racers",
    titles: &[TitleId::from_code(b"AOEX"), TitleId::from_code(b"AOEE")],
    ram_execution_point: 0x0300_23D4,
    active_function: 0x0300_0E04,
    transform: 0x0806_4880,
    rasterize: 0x0800_0330,
    suppression: DEFAULT_SUPPRESSION,
};

pub static HOT_WHEELS_STUNT_TRACK: DromeProfile = DromeProfile {
    name: "Hot Wheels Stunt Track Challenge",
    titles: &[TitleId::from_code(b"BHEE")],
    ram_execution_point: 0x0300_243C,
    active_function: 0x0300_0DD8,
    transform: 0x080E_A350,
    rasterize: 0x0808_5E00,
    suppression: DEFAULT_SUPPRESSION,
};

/// The Stunt Track game of the 2 pack, 8 MiB further into the ROM.
pub static HOT_WHEELS_2_PACK: DromeProfile = DromeProfile {
    name: "Hot Wheels 2 Pack",
    titles: &[TitleId::from_code(b"BQJE")],
    ram_execution_point: 0x0300_2294,
    active_function: 0x0300_0DD8,
    transform: 0x088E_A350,
    rasterize: 0x0888_5E00,
    suppression: DEFAULT_SUPPRESSION,
};

pub static PROFILES: [&DromeProfile; 3] = [&DROME_RACERS, &HOT_WHEELS_STUNT_TRACK, &HOT_WHEELS_2_PACK];

#[derive(Clone, Copy, Debug)]
struct Active {
    profile: &'static DromeProfile,
    policy: SuppressionPolicy,
}

pub struct DromeBackend {
    profiles: &'static [&'static DromeProfile],
    active: Option<Active>,
    occluders: OcclusionStack,
}

impl Default for DromeBackend {
    fn default() -> Self {
        Self {
            profiles: &PROFILES,
            active: None,
            occluders: OcclusionStack::default(),
        }
    }
}

impl DromeBackend {
    fn profile_for(&self, title: TitleId) -> Option<&'static DromeProfile> {
        self.profiles.iter().copied().find(|p| p.titles.contains(&title))
    }

    fn rasterize(&mut self, ctx: &mut BackendContext<'_>, cpu: &mut dyn Cpu, policy: SuppressionPolicy) {
        let scene = RenderContext::read(cpu, cpu.register_at(0));
        let index = scene.frame_index();
        let first = Primitive { address: scene.stream };

        ctx.frames.clear(index);
        ctx.frames.set_active(index, first.tag(cpu) != 0);

        let mut target = ctx.frames.target(index);
        let mut primitive = first;
        let mut drawn = 0;
        loop {
            let tag = primitive.tag(cpu);
            if tag == 0 {
                break;
            }
            if drawn == MAX_PRIMITIVES {
                warn!(
                    stream = format_args!("{:#010X}", scene.stream),
                    "primitive stream does not terminate"
                );
                break;
            }
            drawn += 1;

            if let Err(error) = self.draw(&mut target, cpu, &scene, primitive, tag) {
                warn!(%error, address = format_args!("{:#010X}", primitive.address), "primitive skipped");
            }
            primitive = primitive.next(cpu);
        }

        debug!(primitives = drawn, frame = index, occluders = self.occluders.len(), "rasterized stream");

        if policy.disable_real_rasterizer {
            cpu.write_at(scene.stream, 0);
        }

        self.occluders.drain(&mut target, |sprite, visibility| {
            scene.sprite(sprite).set_status(cpu, visibility as u16);
        });

        ctx.commit_frame(cpu, index);
    }

    fn draw(
        &mut self,
        target: &mut RenderTarget<'_>,
        cpu: &mut dyn Cpu,
        scene: &RenderContext,
        primitive: Primitive,
        tag: u8,
    ) -> Result<(), Error> {
        let kind = PrimitiveKind::try_from(tag)?;
        trace!(?kind, address = format_args!("{:#010X}", primitive.address), "primitive");

        match kind {
            PrimitiveKind::FlatTriangle => {
                fill_flat_triangle(target, primitive.flat_vertices(cpu), primitive.material(cpu));
            }
            PrimitiveKind::ClippedFlatTriangle => {
                let color = primitive.material(cpu);
                let polygon = clip_triangle(
                    primitive.flat_vertices(cpu),
                    &scene.clip_viewport(),
                    primitive.clip_flags(cpu),
                );
                trace!(polygon = %polygon.join(" "), "clipped");
                for triangle in triangle_fan(&polygon) {
                    fill_flat_triangle(target, triangle, color);
                }
            }
            PrimitiveKind::AffineTriangle => {
                let texture = scene.texture(cpu, primitive.material(cpu));
                fill_affine_triangle(target, primitive.textured_vertices(cpu), &texture);
            }
            PrimitiveKind::ClippedAffineTriangle => {
                let texture = scene.texture(cpu, primitive.material(cpu));
                let polygon = clip_triangle(
                    primitive.textured_vertices(cpu),
                    &scene.clip_viewport(),
                    primitive.clip_flags(cpu),
                );
                for triangle in triangle_fan(&polygon) {
                    fill_affine_triangle(target, triangle, &texture);
                }
            }
            PrimitiveKind::StaticTexturedTriangle | PrimitiveKind::ClippedStaticTexturedTriangle => {
                trace!("static textured triangles are not rasterized");
            }
            PrimitiveKind::SpriteOccluder => self.punch_occluder(target, cpu, scene, primitive),
        }

        Ok(())
    }

    /// Punches a hole at the sprite's position if it is on screen, and
    /// reports the sprite outside otherwise.
    fn punch_occluder(
        &mut self,
        target: &mut RenderTarget<'_>,
        cpu: &mut dyn Cpu,
        scene: &RenderContext,
        primitive: Primitive,
    ) {
        let index = primitive.sprite_index(cpu);
        let sprite = scene.sprite(index);
        let (x, y) = sprite.position(cpu);

        let saved = if scene.contains_pixel(x, y) {
            let scale = target.scale() as i32;
            self.occluders.punch(target, index, x * scale, y * scale)
        } else {
            None
        };

        let status = saved.map_or(SpriteVisibility::Outside as u16, u16::from);
        sprite.set_status(cpu, status);
    }
}

/// Logs the scene the transform stage is about to process, and optionally
/// hides its object list from it.
fn transform(cpu: &mut dyn Cpu, policy: SuppressionPolicy) {
    let scene = RenderContext::read(cpu, cpu.register_at(0));
    let camera = Camera::read(cpu, scene.address);
    let first = cpu.read_word(scene.objects_pointer());

    let count = objects(cpu, first)
        .inspect(|object| {
            trace!(
                model = format_args!("{:#010X}", object.model),
                position = ?object.position,
                "scene object"
            );
        })
        .count();
    debug!(objects = count, camera = ?camera.position, "transform");

    if policy.disable_real_transform {
        cpu.write_word(scene.objects_pointer(), 0);
    }
}

impl Backend for DromeBackend {
    fn name(&self) -> &'static str {
        "drome"
    }

    fn identify(&self, title: TitleId) -> bool {
        self.profile_for(title).is_some()
    }

    fn init(&mut self, ctx: &mut BackendContext<'_>, title: TitleId) {
        let Some(profile) = self.profile_for(title) else {
            return;
        };

        let policy = ctx.config.suppression_for(title, profile.suppression);
        info!(game = profile.name, ?policy, "drome backend active");

        ctx.breakpoints.add(profile.ram_execution_point);
        self.active = Some(Active { profile, policy });
        self.occluders = OcclusionStack::default();
    }

    fn deinit(&mut self) {
        self.active = None;
        self.occluders = OcclusionStack::default();
    }

    fn hook(&mut self, ctx: &mut BackendContext<'_>, cpu: &mut dyn Cpu, pc: u32) {
        let Some(Active { profile, policy }) = self.active.filter(|a| a.profile.ram_execution_point == pc) else {
            warn!(pc = format_args!("{pc:#010X}"), "unhandled drome hook");
            return;
        };

        let function = cpu.read_word(profile.active_function);
        if function == profile.rasterize {
            self.rasterize(ctx, cpu, policy);
        } else if function == profile.transform {
            if policy.hook_transform {
                transform(cpu, policy);
            }
        } else {
            trace!(function = format_args!("{function:#010X}"), "not a pipeline stage");
        }
    }
}
