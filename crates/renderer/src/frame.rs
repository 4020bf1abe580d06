//! Frame driver: owns the render state and turns host events into frames.
//!
//! ```text
//!   resize ─────┐
//!   pointer ────┼──▶ UniformState ──▶ tick(): clear ▸ bind ▸ uniforms ▸ viewport ▸ draw(3) ▸ present
//!   clock ──────┘
//!   next / previous / select ──▶ ProgramManager::switch_to ──▶ registry index
//! ```

use gallery::{RegistryError, ShaderRegistry, ShaderVariant};
use tracing::{debug, error, info};

use crate::backend::GraphicsBackend;
use crate::compile::FULLSCREEN_VERTEX_GLSL;
use crate::error::{FrameError, ProgramError, SwitchError};
use crate::program::ProgramManager;
use crate::runtime::BoxedClock;
use crate::types::{CLEAR_COLOR, FULLSCREEN_VERTEX_COUNT};

/// Values fed to the shader uniforms each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UniformState {
    /// Pointer position in pixels, top-left origin.
    pub mouse_position: [f32; 2],
    /// Displayed surface size in pixels.
    pub surface_size: [f32; 2],
    pub elapsed_time_ms: f64,
}

pub struct RendererState<B: GraphicsBackend> {
    backend: B,
    programs: ProgramManager<B>,
    registry: ShaderRegistry,
    uniforms: UniformState,
    clock: BoxedClock,
    backing: (u32, u32),
}

impl<B: GraphicsBackend> RendererState<B> {
    /// Compiles the vertex stage and the registry's active variant.
    ///
    /// Any failure here is fatal to the viewer; objects built so far are
    /// released before returning.
    pub fn new(
        mut backend: B,
        registry: ShaderRegistry,
        clock: BoxedClock,
    ) -> Result<Self, ProgramError> {
        let mut programs = ProgramManager::new(&mut backend, FULLSCREEN_VERTEX_GLSL)?;
        let index = registry.active_index();
        if let Err(err) = programs.switch_to(&mut backend, index, registry.current().source()) {
            error!(shader = registry.current().name(), "{err}");
            programs.release_all(&mut backend);
            return Err(err);
        }
        info!(shader = registry.current().name(), index, "initial shader ready");

        let backing = backend.backing_size();
        Ok(Self {
            backend,
            programs,
            registry,
            uniforms: UniformState {
                surface_size: [backing.0 as f32, backing.1 as f32],
                ..UniformState::default()
            },
            clock,
            backing,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &ShaderRegistry {
        &self.registry
    }

    pub fn uniforms(&self) -> &UniformState {
        &self.uniforms
    }

    /// The active shader variant.
    pub fn current(&self) -> &ShaderVariant {
        self.registry.current()
    }

    /// Records the displayed size, resizes the drawing buffer when the
    /// rounded size changed, then draws immediately.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), FrameError> {
        self.uniforms.surface_size = [width as f32, height as f32];
        let backing = (round_dimension(width), round_dimension(height));
        if backing != self.backing {
            debug!(width = backing.0, height = backing.1, "resizing drawing buffer");
            self.backend.set_backing_size(backing.0, backing.1);
            self.backing = backing;
        }
        self.tick()
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        self.uniforms.mouse_position = [x as f32, y as f32];
    }

    /// Draws one frame with the active program.
    ///
    /// A zero-area drawing buffer skips the draw entirely.
    pub fn tick(&mut self) -> Result<(), FrameError> {
        self.uniforms.elapsed_time_ms = self.clock.now_ms();
        let (width, height) = self.backing;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let Some(active) = self.programs.active() else {
            return Ok(());
        };

        self.backend.clear(CLEAR_COLOR)?;
        self.backend.use_program(active.program());
        let bindings = active.bindings();
        if let Some(location) = bindings.mouse_pos {
            self.backend
                .set_uniform_vec2(location, self.uniforms.mouse_position);
        }
        if let Some(location) = bindings.surface_size {
            self.backend
                .set_uniform_vec2(location, self.uniforms.surface_size);
        }
        if let Some(location) = bindings.time_ms {
            self.backend
                .set_uniform_f32(location, self.uniforms.elapsed_time_ms as f32);
        }
        self.backend.set_viewport(0, 0, width, height);
        self.backend.draw(FULLSCREEN_VERTEX_COUNT)?;
        self.backend.present()
    }

    pub fn next(&mut self) -> Result<(), SwitchError> {
        self.select(self.registry.next_index())
    }

    pub fn previous(&mut self) -> Result<(), SwitchError> {
        self.select(self.registry.previous_index())
    }

    pub fn select_named(&mut self, name: &str) -> Result<(), SwitchError> {
        let index = self
            .registry
            .position(name)
            .ok_or_else(|| RegistryError::UnknownShader(name.to_string()))?;
        self.select(index)
    }

    /// Switches to the variant at `index`.
    ///
    /// The registry index only moves once the new program is installed; on
    /// failure the error is logged and the previous program keeps rendering.
    /// Selecting the variant that is already active does nothing.
    pub fn select(&mut self, index: usize) -> Result<(), SwitchError> {
        let variant = self
            .registry
            .get(index)
            .ok_or(RegistryError::IndexOutOfRange {
                index,
                len: self.registry.len(),
            })?;
        if index == self.registry.active_index() && self.programs.active().is_some() {
            return Ok(());
        }

        match self
            .programs
            .switch_to(&mut self.backend, index, variant.source())
        {
            Ok(()) => {
                info!(shader = variant.name(), index, "switched shader");
                self.registry.set_active(index)?;
                Ok(())
            }
            Err(err) => {
                error!(
                    shader = variant.name(),
                    index,
                    "failed to switch shader; keeping the current one: {err}"
                );
                Err(err.into())
            }
        }
    }
}

impl<B: GraphicsBackend> Drop for RendererState<B> {
    fn drop(&mut self) {
        self.programs.release_all(&mut self.backend);
    }
}

fn round_dimension(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::FixedClock;
    use crate::testing::{Command, RecordingBackend, FAIL_COMPILE, FAIL_LINK};

    const FULL: &str = "uniform vec2 mouse_pos; uniform vec2 surface_size; uniform float time_ms;";

    fn registry(sources: &[(&str, &str)]) -> ShaderRegistry {
        sources
            .iter()
            .fold(ShaderRegistry::builder(), |builder, (name, source)| {
                builder.register(*name, *source)
            })
            .build()
            .unwrap()
    }

    fn state(
        backend: RecordingBackend,
        sources: &[(&str, &str)],
    ) -> RendererState<RecordingBackend> {
        RendererState::new(backend, registry(sources), Box::new(FixedClock::new(250.0))).unwrap()
    }

    #[test]
    fn tick_issues_the_frame_sequence() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL)]);
        state.pointer_moved(12.0, 34.0);
        state.tick().unwrap();

        let program = probe.bound_program().unwrap();
        assert_eq!(
            probe.commands(),
            vec![
                Command::Clear([0.0, 0.0, 0.0, 1.0]),
                Command::UseProgram(program),
                Command::Vec2("mouse_pos", [12.0, 34.0]),
                Command::Vec2("surface_size", [400.0, 300.0]),
                Command::Float("time_ms", 250.0),
                Command::Viewport(0, 0, 400, 300),
                Command::Draw(3),
                Command::Present,
            ]
        );
        assert_eq!(state.uniforms().elapsed_time_ms, 250.0);
    }

    #[test]
    fn resize_updates_backing_and_viewport() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL)]);

        state.resize(800.0, 600.0).unwrap();
        let commands = probe.take_commands();
        assert_eq!(commands[0], Command::SetBackingSize(800, 600));
        assert!(commands.contains(&Command::Viewport(0, 0, 800, 600)));
        assert!(commands.contains(&Command::Vec2("surface_size", [800.0, 600.0])));
    }

    #[test]
    fn repeated_resize_reconfigures_once_but_draws_twice() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL)]);

        state.resize(800.0, 600.0).unwrap();
        state.resize(800.0, 600.0).unwrap();
        let commands = probe.commands();
        let backing_changes = commands
            .iter()
            .filter(|command| matches!(command, Command::SetBackingSize(..)))
            .count();
        let draws = commands
            .iter()
            .filter(|command| matches!(command, Command::Draw(_)))
            .count();
        assert_eq!(backing_changes, 1);
        assert_eq!(draws, 2);
    }

    #[test]
    fn fractional_sizes_round_for_the_backing_only() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL)]);

        state.resize(640.4, 479.6).unwrap();
        assert!(probe.commands().contains(&Command::SetBackingSize(640, 480)));
        assert_eq!(state.uniforms().surface_size, [640.4, 479.6]);
    }

    #[test]
    fn zero_area_resize_skips_the_draw() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL)]);

        state.resize(0.0, 300.0).unwrap();
        let commands = probe.take_commands();
        assert_eq!(commands, vec![Command::SetBackingSize(0, 300)]);
        assert_eq!(state.uniforms().surface_size, [0.0, 300.0]);
    }

    #[test]
    fn next_and_previous_wrap_around() {
        let backend = RecordingBackend::new(400, 300);
        let mut state = state(backend, &[("A", FULL), ("B", FULL)]);

        state.next().unwrap();
        assert_eq!(state.current().name(), "B");
        state.next().unwrap();
        assert_eq!(state.current().name(), "A");
        state.previous().unwrap();
        assert_eq!(state.current().name(), "B");
    }

    #[test]
    fn single_variant_switches_are_no_ops() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("only", FULL)]);
        let program = probe.bound_program();

        state.next().unwrap();
        state.previous().unwrap();
        assert_eq!(state.current().name(), "only");
        assert_eq!(probe.live_programs(), 1);
        assert_eq!(probe.bound_program(), program);
    }

    #[test]
    fn failed_switch_keeps_index_and_program() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(
            backend,
            &[("A", FULL), ("broken", FAIL_COMPILE), ("unlinkable", FAIL_LINK)],
        );
        state.tick().unwrap();
        let before = probe.bound_program().unwrap();

        let err = state.next().unwrap_err();
        assert!(matches!(
            err,
            SwitchError::Program(ProgramError::Compile { .. })
        ));
        assert_eq!(state.registry().active_index(), 0);

        let err = state.select(2).unwrap_err();
        assert!(matches!(err, SwitchError::Program(ProgramError::Link { .. })));
        assert_eq!(state.current().name(), "A");

        probe.take_commands();
        state.tick().unwrap();
        assert!(probe.commands().contains(&Command::UseProgram(before)));
        assert!(!probe.was_released_program(before));
        assert_eq!(probe.live_programs(), 1);
        assert_eq!(probe.rejected_locations(), 0);
    }

    #[test]
    fn switch_rebinds_uniforms_to_the_new_program() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL), ("B", FULL)]);
        state.tick().unwrap();
        let first = probe.bound_program().unwrap();

        state.select_named("B").unwrap();
        state.tick().unwrap();
        let second = probe.bound_program().unwrap();
        assert_ne!(first, second);
        assert!(probe.was_released_program(first));
        assert_eq!(probe.rejected_locations(), 0);
    }

    #[test]
    fn unknown_selection_is_a_registry_error() {
        let backend = RecordingBackend::new(400, 300);
        let mut state = state(backend, &[("A", FULL)]);
        assert_eq!(
            state.select(5).unwrap_err(),
            SwitchError::Registry(RegistryError::IndexOutOfRange { index: 5, len: 1 })
        );
        assert_eq!(
            state.select_named("nope").unwrap_err(),
            SwitchError::Registry(RegistryError::UnknownShader("nope".into()))
        );
    }

    #[test]
    fn initial_failure_is_fatal_and_leaks_nothing() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let result = RendererState::new(
            backend,
            registry(&[("broken", FAIL_COMPILE)]),
            Box::new(FixedClock::new(0.0)),
        );
        assert!(matches!(result, Err(ProgramError::Compile { .. })));
        assert_eq!(probe.live_stages(), 0);
        assert_eq!(probe.live_programs(), 0);
    }

    #[test]
    fn frame_errors_propagate() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let mut state = state(backend, &[("A", FULL)]);
        probe.fail_next_clear(FrameError::Timeout);
        assert_eq!(state.tick().unwrap_err(), FrameError::Timeout);
        assert!(state.tick().is_ok());
    }

    #[test]
    fn dropping_the_state_releases_everything() {
        let backend = RecordingBackend::new(400, 300);
        let probe = backend.probe();
        let state = state(backend, &[("A", FULL), ("B", FULL)]);
        assert_eq!(probe.live_programs(), 1);
        drop(state);
        assert_eq!(probe.live_programs(), 0);
        assert_eq!(probe.live_stages(), 0);
    }
}
