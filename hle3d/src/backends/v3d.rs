//! The V3D engine, shared by Asterix & Obelix XXL and Driv3r.
//!
//! The engine draws into the mode 4 back buffer with a handful of IWRAM
//! routines: clear, bitmap copy, flat and textured trapezoid fills, a few
//! sprite blitters and the DISPCNT write that flips buffers. Every title keeps
//! them at its own addresses, so a title is described by a [`V3dProfile`]
//! mapping those addresses to [`V3dRoutine`]s.

use tracing::{debug, info, trace, warn};

use super::{Backend, BackendContext};
use crate::{
    cpu::{Cpu, MemoryRegion, MemoryView},
    error::Error,
    raster::{
        sprite::{FixedSprite, ScaledSprite, TexelFormat},
        trapezoid::{Trapezoid, TrapezoidUv},
    },
    render::{LCD_HEIGHT, LCD_WIDTH, mode4_row},
    title::TitleId,
};

const PLAYER_SPRITE_DEBUG_COLOR: u32 = 0xFF_0000;
const NPC_SPRITE_DEBUG_COLOR: u32 = 0x00_FF00;
const SCALED_SPRITE_DEBUG_COLOR: u32 = 0x00_00FF;

/// Where a textured fill keeps its uv state between calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapezoidUvAddresses {
    pub left: u32,
    pub right: u32,
    pub left_delta: u32,
    pub right_delta: u32,
}

/// The routines a V3D title can have hooked, with the memory operands that
/// are not passed in registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum V3dRoutine {
    ClearScreen,
    /// Copies the bitmap `source` points to into the back buffer.
    CopyScreen { source: u32 },
    /// DISPCNT value in r2.
    FlipBuffers,
    ColoredTrapezoid { color: u32 },
    TexturedTrapezoid(TrapezoidUvAddresses),
    /// 4bpp sprite with `{ info, y, x }` at r11.
    AsterixPlayerSprite { palette_mask: u8 },
    /// Scaled 8bpp sprite over a 256 byte wide texture.
    AsterixEnvironmentSprite,
    /// Scaled 4bpp sprite with its own stride and palette bank.
    AsterixNpcSprite,
    /// Pause and menu screens drawn over the 3D view.
    AsterixMenuOverlay,
    /// Background scroll routines that rewrite the back buffer as a bitmap.
    AsterixScrollCopy,
    /// 8bpp sprite with `{ info, x, y }` at r11.
    Driv3rPlayerSprite,
    Driv3rScaledSprite,
}

/// A cartridge menu that has to run before the real game is known.
#[derive(Debug)]
pub struct GameSelector {
    /// Hit once the player picked a game, with the choice in r0.
    pub address: u32,
    /// The game selected by choice 0. Choices without a profile leave the
    /// backend passive.
    pub primary: &'static V3dProfile,
}

/// Every address the backend needs for one title.
#[derive(Debug)]
pub struct V3dProfile {
    pub name: &'static str,
    pub titles: &'static [TitleId],
    /// Byte that is non-zero while frame 1 is the front buffer.
    pub active_frame: u32,
    pub routines: &'static [(u32, V3dRoutine)],
    pub selector: Option<GameSelector>,
}

impl V3dProfile {
    fn routine_at(&self, pc: u32) -> Option<V3dRoutine> {
        self.routines
            .iter()
            .find(|(address, _)| *address == pc)
            .map(|&(_, routine)| routine)
    }
}

const fn asterix_routines(menu_overlay: u32) -> [(u32, V3dRoutine); 12] {
    [
        (0x0300_4198, V3dRoutine::ClearScreen),
        (0x0300_6834, V3dRoutine::CopyScreen { source: 0x0300_6A00 }),
        (0x0300_75B8, V3dRoutine::FlipBuffers),
        (0x0300_44E8, V3dRoutine::ColoredTrapezoid { color: 0x0300_4708 }),
        (
            0x0300_4940,
            V3dRoutine::TexturedTrapezoid(TrapezoidUvAddresses {
                left: 0x0300_4734,
                right: 0x0300_4738,
                left_delta: 0x0300_472C,
                right_delta: 0x0300_4730,
            }),
        ),
        (0x0300_5E0C, V3dRoutine::AsterixPlayerSprite { palette_mask: 0x00 }),
        (0x0300_5F98, V3dRoutine::AsterixPlayerSprite { palette_mask: 0x10 }),
        (0x0300_6144, V3dRoutine::AsterixEnvironmentSprite),
        (0x0300_6328, V3dRoutine::AsterixNpcSprite),
        (menu_overlay, V3dRoutine::AsterixMenuOverlay),
        (0x0300_68C4, V3dRoutine::AsterixScrollCopy),
        (0x0300_6934, V3dRoutine::AsterixScrollCopy),
    ]
}

static ASTERIX_XXL_ROUTINES: [(u32, V3dRoutine); 12] = asterix_routines(0x0805_C5F0);
static ASTERIX_XXL_2IN1_ROUTINES: [(u32, V3dRoutine); 12] = asterix_routines(0x0885_F8F0);

pub static ASTERIX_XXL: V3dProfile = V3dProfile {
    name: "Asterix & Obelix XXL",
    titles: &[TitleId::from_code(b"BLXP")],
    active_frame: 0x0203_DC1B,
    routines: &ASTERIX_XXL_ROUTINES,
    selector: None,
};

/// Asterix & Obelix XXL on the Asterix 2 in 1 cartridge. The game sits at a
/// different ROM offset, which only moves the menu overlay routine.
pub static ASTERIX_XXL_2IN1: V3dProfile = V3dProfile {
    name: "Asterix & Obelix XXL (2 in 1)",
    titles: &[TitleId::from_code(b"B2AP")],
    active_frame: 0x0203_DC1B,
    routines: &ASTERIX_XXL_2IN1_ROUTINES,
    selector: None,
};

pub static DRIV3R: V3dProfile = V3dProfile {
    name: "Driv3r",
    titles: &[TitleId::from_code(b"B3RP"), TitleId::from_code(b"B3RE")],
    active_frame: 0x0203_AB41,
    routines: &[
        (0x0300_4984, V3dRoutine::ClearScreen),
        (0x0300_4A98, V3dRoutine::CopyScreen { source: 0x0300_4B2C }),
        (0x0300_78C0, V3dRoutine::FlipBuffers),
        (0x0300_4CA8, V3dRoutine::ColoredTrapezoid { color: 0x0300_4ED8 }),
        (
            0x0300_5454,
            V3dRoutine::TexturedTrapezoid(TrapezoidUvAddresses {
                left: 0x0300_5B3C,
                right: 0x0300_5B40,
                left_delta: 0x0300_5B34,
                right_delta: 0x0300_5B38,
            }),
        ),
        (
            0x0300_5CCC,
            V3dRoutine::TexturedTrapezoid(TrapezoidUvAddresses {
                left: 0x0300_61DC,
                right: 0x0300_61E0,
                left_delta: 0x0300_61D4,
                right_delta: 0x0300_61D8,
            }),
        ),
        (0x0300_63D4, V3dRoutine::Driv3rPlayerSprite),
        (0x0300_61E4, V3dRoutine::Driv3rScaledSprite),
    ],
    selector: None,
};

pub static PROFILES: [&V3dProfile; 3] = [&ASTERIX_XXL, &ASTERIX_XXL_2IN1, &DRIV3R];

#[derive(Clone, Copy, Debug, Default)]
enum State {
    #[default]
    Inactive,
    /// Only the selector is armed.
    Unresolved(&'static GameSelector),
    Active(&'static V3dProfile),
}

pub struct V3dBackend {
    profiles: &'static [&'static V3dProfile],
    state: State,
}

impl Default for V3dBackend {
    fn default() -> Self {
        Self::with_profiles(&PROFILES)
    }
}

impl V3dBackend {
    #[must_use]
    pub const fn with_profiles(profiles: &'static [&'static V3dProfile]) -> Self {
        Self {
            profiles,
            state: State::Inactive,
        }
    }

    fn profile_for(&self, title: TitleId) -> Option<&'static V3dProfile> {
        self.profiles.iter().copied().find(|p| p.titles.contains(&title))
    }

    fn arm(&mut self, ctx: &mut BackendContext<'_>, profile: &'static V3dProfile) {
        if let Some(selector) = &profile.selector {
            info!(game = profile.name, "waiting for game selection");
            ctx.breakpoints.add(selector.address);
            self.state = State::Unresolved(selector);
            return;
        }

        info!(game = profile.name, routines = profile.routines.len(), "v3d backend active");
        for &(address, _) in profile.routines {
            ctx.breakpoints.add(address);
        }
        self.state = State::Active(profile);
    }

    fn select_game(&mut self, ctx: &mut BackendContext<'_>, cpu: &dyn Cpu, selector: &'static GameSelector) {
        let choice = cpu.register_at(0);
        if choice != 0 {
            info!(choice, "selected game is not supported, staying passive");
            return;
        }

        ctx.breakpoints.clear();
        self.arm(ctx, selector.primary);
    }
}

impl Backend for V3dBackend {
    fn name(&self) -> &'static str {
        "v3d"
    }

    fn identify(&self, title: TitleId) -> bool {
        self.profile_for(title).is_some()
    }

    fn init(&mut self, ctx: &mut BackendContext<'_>, title: TitleId) {
        if let Some(profile) = self.profile_for(title) {
            self.arm(ctx, profile);
        }
    }

    fn deinit(&mut self) {
        self.state = State::Inactive;
    }

    fn hook(&mut self, ctx: &mut BackendContext<'_>, cpu: &mut dyn Cpu, pc: u32) {
        match self.state {
            State::Unresolved(selector) if pc == selector.address => self.select_game(ctx, cpu, selector),
            State::Active(profile) => match profile.routine_at(pc) {
                Some(routine) => run(ctx, cpu, profile, routine),
                None => warn!(pc = format_args!("{pc:#010X}"), "unhandled v3d hook"),
            },
            State::Unresolved(_) | State::Inactive => {
                warn!(pc = format_args!("{pc:#010X}"), "unhandled v3d hook");
            }
        }
    }
}

fn run(ctx: &mut BackendContext<'_>, cpu: &dyn Cpu, profile: &V3dProfile, routine: V3dRoutine) {
    let front = usize::from(cpu.read_at(profile.active_frame) != 0);
    let back = 1 - front;
    trace!(?routine, front, "v3d routine");

    match routine {
        V3dRoutine::ClearScreen => {
            ctx.frames.set_active(back, false);
            ctx.frames.clear(back);
        }
        V3dRoutine::CopyScreen { source } => {
            ctx.frames.set_active(back, false);
            if let Err(error) = copy_screen(ctx, cpu, back, cpu.read_word(source)) {
                warn!(%error, "screen copy skipped");
            }
        }
        V3dRoutine::FlipBuffers => ctx.flip(cpu, cpu.register_at(2) as u16),
        V3dRoutine::ColoredTrapezoid { color } => {
            ctx.frames.set_active(back, true);
            let color = cpu.read_at(color);
            trapezoid_from_registers(cpu).fill_flat(&mut ctx.frames.target(back), color);
        }
        V3dRoutine::TexturedTrapezoid(uv) => {
            ctx.frames.set_active(back, true);
            let texture = cpu.register_at(11);
            let uv = TrapezoidUv::from_words(
                cpu.read_word(uv.left),
                cpu.read_word(uv.right),
                cpu.read_word(uv.left_delta),
                cpu.read_word(uv.right_delta),
            );
            let memory = MemoryView::new(cpu, texture);
            trapezoid_from_registers(cpu).fill_textured(&mut ctx.frames.target(back), &uv, texture, &memory);
        }
        V3dRoutine::AsterixPlayerSprite { palette_mask } => {
            let sprite = player_sprite(cpu, PlayerLayout::YFirst, TexelFormat::Nibbles, palette_mask);
            draw_fixed_sprite(ctx, cpu, back, &sprite);
        }
        V3dRoutine::Driv3rPlayerSprite => {
            let sprite = player_sprite(cpu, PlayerLayout::XFirst, TexelFormat::Bytes, 0);
            draw_fixed_sprite(ctx, cpu, back, &sprite);
        }
        V3dRoutine::AsterixEnvironmentSprite => {
            let sprite = asterix_environment_sprite(cpu);
            draw_scaled_sprite(ctx, cpu, back, &sprite, SCALED_SPRITE_DEBUG_COLOR);
        }
        V3dRoutine::AsterixNpcSprite => {
            let sprite = asterix_npc_sprite(cpu);
            draw_scaled_sprite(ctx, cpu, back, &sprite, NPC_SPRITE_DEBUG_COLOR);
        }
        V3dRoutine::Driv3rScaledSprite => {
            let sprite = driv3r_scaled_sprite(cpu);
            draw_scaled_sprite(ctx, cpu, back, &sprite, SCALED_SPRITE_DEBUG_COLOR);
        }
        V3dRoutine::AsterixMenuOverlay => ctx.frames.set_active(front, false),
        V3dRoutine::AsterixScrollCopy => ctx.frames.set_active(back, false),
    }
}

fn copy_screen(ctx: &mut BackendContext<'_>, cpu: &dyn Cpu, back: usize, source: u32) -> Result<(), Error> {
    let bitmap = screen_source(cpu, source)?;
    debug!(source = format_args!("{source:#010X}"), back, "copy screen");
    ctx.frames.target(back).blit_upscaled(bitmap);
    Ok(())
}

/// The 240×160 bitmap at `address`, which has to live in work or internal RAM.
fn screen_source(cpu: &dyn Cpu, address: u32) -> Result<&[u8], Error> {
    let len = LCD_WIDTH * LCD_HEIGHT;
    let region = MemoryRegion::from_address(address)
        .filter(|region| matches!(region, MemoryRegion::WorkRam | MemoryRegion::InternalRam))
        .ok_or(Error::UnsupportedRegion { address })?;
    let memory = cpu.memory_region(region).ok_or(Error::UnsupportedRegion { address })?;

    let offset = region.offset(address);
    memory
        .get(offset..offset + len)
        .ok_or(Error::CopySourceOutOfBounds { address, len })
}

/// r5 rows, r7/r8 right/left edges and r10 the VRAM pointer of the first row.
fn trapezoid_from_registers(cpu: &dyn Cpu) -> Trapezoid {
    Trapezoid::from_registers(
        mode4_row(cpu.register_at(10)) as i32,
        cpu.register_at(5),
        cpu.register_at(8),
        cpu.register_at(7),
    )
}

fn field(cpu: &dyn Cpu, base: u32, offset: u32) -> i32 {
    cpu.read_word(base.wrapping_add(offset)) as i32
}

#[derive(Clone, Copy)]
enum PlayerLayout {
    XFirst,
    YFirst,
}

/// Decodes the parameter block at r11: a pointer to the frame info with the
/// mirror flag in bit 31, then the base position.
///
/// The frame info holds `i8` x/y offsets, `u8` width/height and the texel
/// pointer at +4. Mirrored sprites are anchored on their right edge.
fn player_sprite(cpu: &dyn Cpu, layout: PlayerLayout, format: TexelFormat, palette_mask: u8) -> FixedSprite {
    let params = cpu.register_at(11);
    let info = cpu.read_word(params);
    let mirror = info & 0x8000_0000 != 0;
    let info = info & 0x7FFF_FFFF;

    let (base_x, base_y) = match layout {
        PlayerLayout::XFirst => (field(cpu, params, 4), field(cpu, params, 8)),
        PlayerLayout::YFirst => (field(cpu, params, 8), field(cpu, params, 4)),
    };

    let offset_x = i32::from(cpu.read_at(info) as i8);
    let offset_y = i32::from(cpu.read_at(info.wrapping_add(1)) as i8);
    let width = i32::from(cpu.read_at(info.wrapping_add(2)));
    let height = i32::from(cpu.read_at(info.wrapping_add(3)));

    FixedSprite {
        x: if mirror {
            base_x.wrapping_sub(offset_x).wrapping_sub(width)
        } else {
            base_x.wrapping_add(offset_x)
        },
        y: base_y.wrapping_add(offset_y),
        width,
        height,
        mirror,
        data: cpu.read_word(info.wrapping_add(4)),
        format,
        palette_mask,
    }
}

fn asterix_environment_sprite(cpu: &dyn Cpu) -> ScaledSprite {
    let params = cpu.register_at(11);
    ScaledSprite {
        data: field(cpu, params, 0) as u32,
        top: field(cpu, params, 4),
        left: field(cpu, params, 8),
        v0: field(cpu, params, 12),
        u0: field(cpu, params, 16),
        bottom: field(cpu, params, 20),
        right: field(cpu, params, 24),
        v1: field(cpu, params, 28),
        u1: field(cpu, params, 32),
        stride: 256,
        format: TexelFormat::Bytes,
        palette_bank: 0,
    }
}

fn asterix_npc_sprite(cpu: &dyn Cpu) -> ScaledSprite {
    let params = cpu.register_at(11);
    ScaledSprite {
        stride: field(cpu, params, 0),
        palette_bank: field(cpu, params, 4) as u8,
        data: field(cpu, params, 8) as u32,
        top: field(cpu, params, 12),
        left: field(cpu, params, 16),
        v0: field(cpu, params, 20),
        u0: field(cpu, params, 24),
        bottom: field(cpu, params, 28),
        right: field(cpu, params, 32),
        v1: field(cpu, params, 36),
        u1: field(cpu, params, 40),
        format: TexelFormat::Nibbles,
    }
}

fn driv3r_scaled_sprite(cpu: &dyn Cpu) -> ScaledSprite {
    let params = cpu.register_at(11);
    ScaledSprite {
        data: field(cpu, params, 0) as u32,
        left: field(cpu, params, 4),
        top: field(cpu, params, 8),
        u0: field(cpu, params, 12),
        v0: field(cpu, params, 16),
        right: field(cpu, params, 20),
        bottom: field(cpu, params, 24),
        u1: field(cpu, params, 28),
        v1: field(cpu, params, 32),
        stride: field(cpu, params, 36),
        format: TexelFormat::Bytes,
        palette_bank: 0,
    }
}

fn draw_fixed_sprite(ctx: &mut BackendContext<'_>, cpu: &dyn Cpu, back: usize, sprite: &FixedSprite) {
    ctx.frames.set_active(back, true);
    ctx.debug_rect(sprite.x, sprite.y, sprite.width, sprite.height, PLAYER_SPRITE_DEBUG_COLOR);

    let memory = MemoryView::new(cpu, sprite.data);
    sprite.draw(&mut ctx.frames.target(back), &memory);
}

fn draw_scaled_sprite(
    ctx: &mut BackendContext<'_>,
    cpu: &dyn Cpu,
    back: usize,
    sprite: &ScaledSprite,
    debug_color: u32,
) {
    ctx.frames.set_active(back, true);
    ctx.debug_rect(
        sprite.left,
        sprite.top,
        sprite.right.saturating_sub(sprite.left),
        sprite.bottom.saturating_sub(sprite.top),
        debug_color,
    );

    let memory = MemoryView::new(cpu, sprite.data);
    sprite.draw(&mut ctx.frames.target(back), &memory);
}
