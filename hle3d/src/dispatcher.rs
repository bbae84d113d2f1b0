use tracing::{debug, info};

use crate::{
    backends::{self, Backend, BackendContext},
    breakpoints::Breakpoints,
    config::Hle3dConfig,
    cpu::Cpu,
    error::Error,
    render::{color::Palette, debug_rects::DebugRects, frame_buffers::FrameBuffers},
    title::TitleId,
};

/// The entry point the emulator talks to: owns the output buffers, the armed
/// breakpoints and the backend serving the loaded title.
///
/// The CPU loop checks [`Hle3d::breakpoints`] before executing an
/// instruction and calls [`Hle3d::on_breakpoint`] on a match. The video side
/// composites [`Hle3d::color_buffer`] over the 2D layers while
/// [`Hle3d::is_buffer_active`] says it holds 3D content.
pub struct Hle3d {
    config: Hle3dConfig,
    backends: Vec<Box<dyn Backend>>,
    active_backend: Option<usize>,
    breakpoints: Breakpoints,
    frames: FrameBuffers,
    debug_rects: DebugRects,
}

impl Default for Hle3d {
    fn default() -> Self {
        Self::with_backends(Hle3dConfig::default(), backends::all())
    }
}

impl Hle3d {
    /// # Errors
    ///
    /// Fails when `config` does not validate.
    pub fn new(config: Hle3dConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::with_backends(config, backends::all()))
    }

    fn with_backends(config: Hle3dConfig, backends: Vec<Box<dyn Backend>>) -> Self {
        Self {
            frames: FrameBuffers::new(config.scale),
            config,
            backends,
            active_backend: None,
            breakpoints: Breakpoints::default(),
            debug_rects: DebugRects::default(),
        }
    }

    /// Hands `title` to the first backend supporting it. Returns `false` and
    /// stays passive when there is none.
    pub fn configure(&mut self, title: TitleId) -> bool {
        self.unconfigure();

        let Some(index) = self.backends.iter().position(|b| b.identify(title)) else {
            info!(%title, "no hle backend for title");
            return false;
        };

        let backend = &mut self.backends[index];
        info!(%title, backend = backend.name(), "configuring hle backend");

        let mut ctx = BackendContext {
            breakpoints: &mut self.breakpoints,
            frames: &mut self.frames,
            debug_rects: &mut self.debug_rects,
            config: &self.config,
        };
        backend.init(&mut ctx, title);
        self.active_backend = Some(index);

        true
    }

    /// Configures for the title in the header of `rom`.
    ///
    /// # Errors
    ///
    /// Fails when `rom` is too short to hold a header. The dispatcher is left
    /// unconfigured.
    pub fn on_rom_loaded(&mut self, rom: &[u8]) -> Result<bool, Error> {
        self.unconfigure();
        let title = TitleId::from_rom_header(rom)?;
        Ok(self.configure(title))
    }

    /// Drops the active backend along with everything it armed or drew.
    pub fn unconfigure(&mut self) {
        if let Some(index) = self.active_backend.take() {
            let backend = &mut self.backends[index];
            info!(backend = backend.name(), "unconfiguring hle backend");
            backend.deinit();
        }

        self.breakpoints.clear();
        self.debug_rects.clear();
        self.frames.reset();
    }

    /// Changes the upscale factor. Returns `false` and keeps the buffers when
    /// the scale does not change, otherwise every buffer starts over empty.
    ///
    /// # Errors
    ///
    /// Rejects a scale of zero.
    pub fn set_scale(&mut self, scale: usize) -> Result<bool, Error> {
        if scale == 0 {
            return Err(Error::InvalidScale(scale));
        }

        self.config.scale = scale;
        let changed = self.frames.set_scale(scale);
        if changed {
            debug!(scale, "render scale changed");
        }
        Ok(changed)
    }

    #[must_use]
    pub const fn scale(&self) -> usize {
        self.frames.scale()
    }

    #[must_use]
    pub const fn config(&self) -> &Hle3dConfig {
        &self.config
    }

    /// Runs the handler for `pc`. Addresses that are not armed, or hits while
    /// no backend is active, are ignored.
    pub fn on_breakpoint(&mut self, cpu: &mut dyn Cpu, pc: u32) {
        if !self.breakpoints.contains(pc) {
            return;
        }
        let Some(index) = self.active_backend else {
            return;
        };

        let mut ctx = BackendContext {
            breakpoints: &mut self.breakpoints,
            frames: &mut self.frames,
            debug_rects: &mut self.debug_rects,
            config: &self.config,
        };
        self.backends[index].hook(&mut ctx, cpu, pc);
    }

    /// Resolves buffer `index` through the current palette RAM.
    pub fn commit_frame(&mut self, cpu: &dyn Cpu, index: usize) {
        let palette = Palette::from_cpu(cpu);
        self.frames.commit(index, &palette, &mut self.debug_rects);
    }

    pub fn add_breakpoint(&mut self, address: u32) {
        self.breakpoints.add(address);
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    #[must_use]
    pub fn breakpoints(&self) -> &[u32] {
        self.breakpoints.as_slice()
    }

    #[must_use]
    pub fn active_backend_name(&self) -> Option<&'static str> {
        self.active_backend.map(|index| self.backends[index].name())
    }

    /// RGBA8 pixels of buffer `index`, `width() × height()` of them.
    #[must_use]
    pub fn color_buffer(&self, index: usize) -> &[u8] {
        self.frames.color(index)
    }

    #[must_use]
    pub fn indexed_buffer(&self, index: usize) -> &[u8] {
        self.frames.indexed(index)
    }

    #[must_use]
    pub const fn is_buffer_active(&self, index: usize) -> bool {
        self.frames.is_active(index)
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.frames.width()
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.frames.height()
    }
}
