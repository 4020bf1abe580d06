//! Shader program lifecycle: compile, link and hot-swap fragment programs.
//!
//! Every failure path releases the objects it created before returning, and
//! a switch builds the replacement completely before touching the program
//! that is currently rendering. A failed switch therefore leaves the active
//! program exactly as it was.

use tracing::debug;

use crate::backend::GraphicsBackend;
use crate::error::ProgramError;
use crate::types::{ShaderStage, UNIFORM_MOUSE_POS, UNIFORM_SURFACE_SIZE, UNIFORM_TIME_MS};

/// Creates and checks a shader stage; the stage is released if it fails.
pub fn compile<B: GraphicsBackend>(
    backend: &mut B,
    source: &str,
    stage: ShaderStage,
) -> Result<B::Stage, ProgramError> {
    let object = backend.create_stage(stage, source);
    match backend.stage_status(&object) {
        Ok(()) => Ok(object),
        Err(log) => {
            backend.release_stage(object);
            Err(ProgramError::Compile { stage, log })
        }
    }
}

/// Links two compiled stages; the program is released if linking fails.
///
/// The stages stay owned by the caller either way.
pub fn link<B: GraphicsBackend>(
    backend: &mut B,
    vertex: &B::Stage,
    fragment: &B::Stage,
) -> Result<B::Program, ProgramError> {
    let program = backend.create_program(vertex, fragment);
    match backend.program_status(&program) {
        Ok(()) => Ok(program),
        Err(log) => {
            backend.release_program(program);
            Err(ProgramError::Link { log })
        }
    }
}

/// Uniform locations resolved against one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBindings<L> {
    pub mouse_pos: Option<L>,
    pub surface_size: Option<L>,
    pub time_ms: Option<L>,
}

impl<L: Copy> UniformBindings<L> {
    fn resolve<B>(backend: &B, program: &B::Program) -> Self
    where
        B: GraphicsBackend<Location = L>,
    {
        let lookup = |name: &str| {
            let location = backend.uniform_location(program, name);
            if location.is_none() {
                debug!(uniform = name, "program does not use uniform");
            }
            location
        };
        Self {
            mouse_pos: lookup(UNIFORM_MOUSE_POS),
            surface_size: lookup(UNIFORM_SURFACE_SIZE),
            time_ms: lookup(UNIFORM_TIME_MS),
        }
    }
}

/// A linked program together with the fragment stage it owns.
pub struct CompiledProgram<B: GraphicsBackend> {
    program: B::Program,
    fragment: B::Stage,
    bindings: UniformBindings<B::Location>,
    variant: usize,
}

impl<B: GraphicsBackend> CompiledProgram<B> {
    pub fn program(&self) -> &B::Program {
        &self.program
    }

    pub fn bindings(&self) -> &UniformBindings<B::Location> {
        &self.bindings
    }

    /// Registry index of the variant this program was built from.
    pub fn variant(&self) -> usize {
        self.variant
    }
}

/// Owns the shared vertex stage and the single active program.
pub struct ProgramManager<B: GraphicsBackend> {
    vertex: Option<B::Stage>,
    active: Option<CompiledProgram<B>>,
}

impl<B: GraphicsBackend> ProgramManager<B> {
    /// Compiles the vertex stage every program links against.
    pub fn new(backend: &mut B, vertex_source: &str) -> Result<Self, ProgramError> {
        let vertex = compile(backend, vertex_source, ShaderStage::Vertex)?;
        debug!("compiled shared vertex stage");
        Ok(Self {
            vertex: Some(vertex),
            active: None,
        })
    }

    pub fn active(&self) -> Option<&CompiledProgram<B>> {
        self.active.as_ref()
    }

    /// Builds a program from `source` and makes it the active one.
    ///
    /// On error nothing installed changes and every partially built object
    /// has already been released.
    pub fn switch_to(
        &mut self,
        backend: &mut B,
        index: usize,
        source: &str,
    ) -> Result<(), ProgramError> {
        let Some(vertex) = self.vertex.as_ref() else {
            return Err(ProgramError::Link {
                log: "shared vertex stage has been released".into(),
            });
        };

        let fragment = compile(backend, source, ShaderStage::Fragment)?;
        let program = match link(backend, vertex, &fragment) {
            Ok(program) => program,
            Err(err) => {
                backend.release_stage(fragment);
                return Err(err);
            }
        };
        let bindings = UniformBindings::resolve(backend, &program);

        if let Some(previous) = self.active.take() {
            debug!(variant = previous.variant, "releasing previous program");
            backend.release_program(previous.program);
            backend.release_stage(previous.fragment);
        }

        self.active = Some(CompiledProgram {
            program,
            fragment,
            bindings,
            variant: index,
        });
        Ok(())
    }

    /// Releases the active program and the vertex stage.
    pub fn release_all(&mut self, backend: &mut B) {
        if let Some(active) = self.active.take() {
            backend.release_program(active.program);
            backend.release_stage(active.fragment);
        }
        if let Some(vertex) = self.vertex.take() {
            backend.release_stage(vertex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingBackend, FAIL_COMPILE, FAIL_LINK};

    const GOOD: &str = "void main() { outColor = vec4(time_ms); }";

    #[test]
    fn compile_failure_releases_the_stage_and_keeps_the_log() {
        let mut backend = RecordingBackend::new(400, 300);
        let err = compile(&mut backend, FAIL_COMPILE, ShaderStage::Fragment).unwrap_err();
        match err {
            ProgramError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(log, RecordingBackend::COMPILE_LOG);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.live_stages(), 0);
    }

    #[test]
    fn link_failure_releases_the_program_but_not_the_stages() {
        let mut backend = RecordingBackend::new(400, 300);
        let vertex = compile(&mut backend, "vertex", ShaderStage::Vertex).unwrap();
        let fragment = compile(&mut backend, FAIL_LINK, ShaderStage::Fragment).unwrap();
        let err = link(&mut backend, &vertex, &fragment).unwrap_err();
        assert!(matches!(err, ProgramError::Link { .. }));
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.live_stages(), 2);
    }

    #[test]
    fn switch_releases_the_previous_program() {
        let mut backend = RecordingBackend::new(400, 300);
        let mut manager = ProgramManager::new(&mut backend, "vertex").unwrap();
        manager.switch_to(&mut backend, 0, GOOD).unwrap();
        let first = manager.active().unwrap().program().id();

        manager.switch_to(&mut backend, 1, GOOD).unwrap();
        let active = manager.active().unwrap();
        assert_eq!(active.variant(), 1);
        assert_ne!(active.program().id(), first);
        assert!(backend.was_released_program(first));
        assert_eq!(backend.live_programs(), 1);
        // vertex plus the active fragment
        assert_eq!(backend.live_stages(), 2);
    }

    #[test]
    fn failed_switch_keeps_the_active_program() {
        let mut backend = RecordingBackend::new(400, 300);
        let mut manager = ProgramManager::new(&mut backend, "vertex").unwrap();
        manager.switch_to(&mut backend, 0, GOOD).unwrap();
        let before = manager.active().unwrap().program().id();

        assert!(manager.switch_to(&mut backend, 1, FAIL_COMPILE).is_err());
        assert!(manager.switch_to(&mut backend, 1, FAIL_LINK).is_err());

        let active = manager.active().unwrap();
        assert_eq!(active.program().id(), before);
        assert_eq!(active.variant(), 0);
        assert_eq!(backend.live_programs(), 1);
        assert_eq!(backend.live_stages(), 2);
    }

    #[test]
    fn unused_uniforms_resolve_to_none() {
        let mut backend = RecordingBackend::new(400, 300);
        let mut manager = ProgramManager::new(&mut backend, "vertex").unwrap();
        manager.switch_to(&mut backend, 0, GOOD).unwrap();
        let bindings = manager.active().unwrap().bindings();
        assert!(bindings.time_ms.is_some());
        assert!(bindings.mouse_pos.is_none());
        assert!(bindings.surface_size.is_none());
    }

    #[test]
    fn release_all_leaves_nothing_alive() {
        let mut backend = RecordingBackend::new(400, 300);
        let mut manager = ProgramManager::new(&mut backend, "vertex").unwrap();
        manager.switch_to(&mut backend, 0, GOOD).unwrap();
        manager.release_all(&mut backend);
        assert!(manager.active().is_none());
        assert_eq!(backend.live_stages(), 0);
        assert_eq!(backend.live_programs(), 0);

        let err = manager.switch_to(&mut backend, 0, GOOD).unwrap_err();
        assert!(matches!(err, ProgramError::Link { .. }));
        assert_eq!(backend.live_stages(), 0);
    }
}
