//! In-memory backend for exercising the lifecycle and frame driver without a GPU.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::backend::GraphicsBackend;
use crate::error::FrameError;
use crate::types::{ShaderStage, UNIFORM_MOUSE_POS, UNIFORM_SURFACE_SIZE, UNIFORM_TIME_MS};

/// Fragment source that fails to compile.
pub(crate) const FAIL_COMPILE: &str = "#error forced compile failure";
/// Fragment source that compiles but fails to link.
pub(crate) const FAIL_LINK: &str = "// link-fail\nvoid main() {}";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    SetBackingSize(u32, u32),
    Clear([f64; 4]),
    UseProgram(u32),
    Vec2(&'static str, [f32; 2]),
    Float(&'static str, f32),
    Viewport(u32, u32, u32, u32),
    Draw(u32),
    Present,
}

#[derive(Debug)]
pub(crate) struct RecordedStage {
    id: u32,
    source: String,
    failed: bool,
}

#[derive(Debug)]
pub(crate) struct RecordedProgram {
    id: u32,
    source: String,
    failed: bool,
}

impl RecordedProgram {
    pub(crate) fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordedLocation {
    program: u32,
    uniform: &'static str,
}

#[derive(Debug, Default)]
struct Recording {
    next_id: u32,
    live_stages: BTreeSet<u32>,
    live_programs: BTreeSet<u32>,
    released_programs: BTreeSet<u32>,
    bound: Option<u32>,
    backing: (u32, u32),
    commands: Vec<Command>,
    rejected_locations: usize,
    fail_next_clear: Option<FrameError>,
}

impl Recording {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Records every call and tracks which handles are still alive.
///
/// Clones share the same recording, so a test can keep a probe after moving
/// the backend into a [`crate::RendererState`].
#[derive(Debug, Clone)]
pub(crate) struct RecordingBackend {
    shared: Rc<RefCell<Recording>>,
}

impl RecordingBackend {
    pub(crate) const COMPILE_LOG: &'static str = "ERROR: 0:1: forced compile failure";
    pub(crate) const LINK_LOG: &'static str = "ERROR: forced link failure";

    pub(crate) fn new(width: u32, height: u32) -> Self {
        let recording = Recording {
            backing: (width, height),
            ..Recording::default()
        };
        Self {
            shared: Rc::new(RefCell::new(recording)),
        }
    }

    pub(crate) fn probe(&self) -> Self {
        self.clone()
    }

    pub(crate) fn live_stages(&self) -> usize {
        self.shared.borrow().live_stages.len()
    }

    pub(crate) fn live_programs(&self) -> usize {
        self.shared.borrow().live_programs.len()
    }

    pub(crate) fn was_released_program(&self, id: u32) -> bool {
        self.shared.borrow().released_programs.contains(&id)
    }

    pub(crate) fn bound_program(&self) -> Option<u32> {
        self.shared.borrow().bound
    }

    pub(crate) fn rejected_locations(&self) -> usize {
        self.shared.borrow().rejected_locations
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.shared.borrow().commands.clone()
    }

    pub(crate) fn take_commands(&self) -> Vec<Command> {
        std::mem::take(&mut self.shared.borrow_mut().commands)
    }

    pub(crate) fn fail_next_clear(&self, error: FrameError) {
        self.shared.borrow_mut().fail_next_clear = Some(error);
    }

    fn check_location(&self, location: RecordedLocation) -> bool {
        let mut recording = self.shared.borrow_mut();
        if recording.bound == Some(location.program) {
            true
        } else {
            recording.rejected_locations += 1;
            tracing::warn!(?location, "location belongs to a program that is not bound");
            false
        }
    }
}

impl GraphicsBackend for RecordingBackend {
    type Stage = RecordedStage;
    type Program = RecordedProgram;
    type Location = RecordedLocation;

    fn create_stage(&mut self, _stage: ShaderStage, source: &str) -> RecordedStage {
        let mut recording = self.shared.borrow_mut();
        let id = recording.allocate();
        recording.live_stages.insert(id);
        RecordedStage {
            id,
            source: source.to_string(),
            failed: source.contains("#error"),
        }
    }

    fn stage_status(&self, stage: &RecordedStage) -> Result<(), String> {
        if stage.failed {
            Err(Self::COMPILE_LOG.to_string())
        } else {
            Ok(())
        }
    }

    fn release_stage(&mut self, stage: RecordedStage) {
        let released = self.shared.borrow_mut().live_stages.remove(&stage.id);
        assert!(released, "stage {} released twice", stage.id);
    }

    fn create_program(&mut self, vertex: &RecordedStage, fragment: &RecordedStage) -> RecordedProgram {
        let mut recording = self.shared.borrow_mut();
        assert!(recording.live_stages.contains(&vertex.id), "vertex stage is dead");
        assert!(recording.live_stages.contains(&fragment.id), "fragment stage is dead");
        let id = recording.allocate();
        recording.live_programs.insert(id);
        RecordedProgram {
            id,
            source: fragment.source.clone(),
            failed: fragment.source.contains("link-fail"),
        }
    }

    fn program_status(&self, program: &RecordedProgram) -> Result<(), String> {
        if program.failed {
            Err(Self::LINK_LOG.to_string())
        } else {
            Ok(())
        }
    }

    fn release_program(&mut self, program: RecordedProgram) {
        let mut recording = self.shared.borrow_mut();
        let released = recording.live_programs.remove(&program.id);
        assert!(released, "program {} released twice", program.id);
        recording.released_programs.insert(program.id);
        if recording.bound == Some(program.id) {
            recording.bound = None;
        }
    }

    fn uniform_location(&self, program: &RecordedProgram, name: &str) -> Option<RecordedLocation> {
        let uniform = [UNIFORM_MOUSE_POS, UNIFORM_SURFACE_SIZE, UNIFORM_TIME_MS]
            .into_iter()
            .find(|candidate| *candidate == name)?;
        program.source.contains(uniform).then_some(RecordedLocation {
            program: program.id,
            uniform,
        })
    }

    fn backing_size(&self) -> (u32, u32) {
        self.shared.borrow().backing
    }

    fn set_backing_size(&mut self, width: u32, height: u32) {
        let mut recording = self.shared.borrow_mut();
        recording.backing = (width, height);
        recording.commands.push(Command::SetBackingSize(width, height));
    }

    fn clear(&mut self, color: [f64; 4]) -> Result<(), FrameError> {
        let mut recording = self.shared.borrow_mut();
        if let Some(error) = recording.fail_next_clear.take() {
            return Err(error);
        }
        recording.commands.push(Command::Clear(color));
        Ok(())
    }

    fn use_program(&mut self, program: &RecordedProgram) {
        let mut recording = self.shared.borrow_mut();
        assert!(recording.live_programs.contains(&program.id), "binding a released program");
        recording.bound = Some(program.id);
        recording.commands.push(Command::UseProgram(program.id));
    }

    fn set_uniform_vec2(&mut self, location: RecordedLocation, value: [f32; 2]) {
        if self.check_location(location) {
            self.shared
                .borrow_mut()
                .commands
                .push(Command::Vec2(location.uniform, value));
        }
    }

    fn set_uniform_f32(&mut self, location: RecordedLocation, value: f32) {
        if self.check_location(location) {
            self.shared
                .borrow_mut()
                .commands
                .push(Command::Float(location.uniform, value));
        }
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.shared
            .borrow_mut()
            .commands
            .push(Command::Viewport(x, y, width, height));
    }

    fn draw(&mut self, vertex_count: u32) -> Result<(), FrameError> {
        self.shared
            .borrow_mut()
            .commands
            .push(Command::Draw(vertex_count));
        Ok(())
    }

    fn present(&mut self) -> Result<(), FrameError> {
        self.shared.borrow_mut().commands.push(Command::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_locations_are_rejected() {
        let mut backend = RecordingBackend::new(10, 10);
        let vertex = backend.create_stage(ShaderStage::Vertex, "v");
        let fragment = backend.create_stage(ShaderStage::Fragment, "time_ms");
        let first = backend.create_program(&vertex, &fragment);
        let second = backend.create_program(&vertex, &fragment);
        let stale = backend.uniform_location(&first, UNIFORM_TIME_MS).unwrap();

        backend.use_program(&second);
        backend.set_uniform_f32(stale, 1.0);
        assert_eq!(backend.rejected_locations(), 1);
        assert!(!backend
            .commands()
            .iter()
            .any(|command| matches!(command, Command::Float(..))));
    }
}
