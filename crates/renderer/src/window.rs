use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use gallery::ShaderRegistry;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::backend::GraphicsBackend;
use crate::error::{FrameError, SwitchError};
use crate::frame::RendererState;
use crate::gpu::WgpuBackend;
use crate::runtime::{clock_for, TickSchedule};
use crate::types::RendererConfig;

/// What a key press asks the viewer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ViewerCommand {
    Next,
    Previous,
    Select(usize),
    Exit,
}

pub(crate) fn command_for_key(key: &Key) -> Option<ViewerCommand> {
    match key {
        Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::Space) => {
            Some(ViewerCommand::Next)
        }
        Key::Named(NamedKey::ArrowLeft) => Some(ViewerCommand::Previous),
        Key::Named(NamedKey::Escape) => Some(ViewerCommand::Exit),
        Key::Character(value) => match value.as_str() {
            "n" | "N" | " " => Some(ViewerCommand::Next),
            "p" | "P" => Some(ViewerCommand::Previous),
            digit => digit
                .parse::<usize>()
                .ok()
                .filter(|number| (1..=9).contains(number))
                .map(|number| ViewerCommand::Select(number - 1)),
        },
        _ => None,
    }
}

/// Applies a switching command to `state`; `Exit` is left to the event loop.
pub(crate) fn dispatch<B: GraphicsBackend>(
    state: &mut RendererState<B>,
    command: ViewerCommand,
) -> Result<(), SwitchError> {
    match command {
        ViewerCommand::Next => state.next(),
        ViewerCommand::Previous => state.previous(),
        ViewerCommand::Select(index) => state.select(index),
        ViewerCommand::Exit => Ok(()),
    }
}

/// Renderer state plus the window it draws into.
///
/// Field order matters: the state (and its surface) drops before the window.
struct Viewer {
    state: RendererState<WgpuBackend>,
    window: Window,
    config: RendererConfig,
    schedule: TickSchedule,
}

impl Viewer {
    fn refresh_title(&self) {
        self.window
            .set_title(&self.config.window_title(self.state.current().name()));
    }

    fn apply(&mut self, command: ViewerCommand) -> Result<(), SwitchError> {
        dispatch(&mut self.state, command)?;
        self.refresh_title();
        self.window.request_redraw();
        Ok(())
    }

    /// Returns false when the viewer cannot continue.
    fn handle_frame(&mut self, result: Result<(), FrameError>) -> bool {
        match result {
            Ok(()) => true,
            Err(FrameError::OutOfMemory) => {
                error!("surface out of memory; closing viewer");
                false
            }
            Err(FrameError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                true
            }
            Err(err) => {
                warn!("{err}; retrying next frame");
                true
            }
        }
    }
}

/// Opens the viewer window and drives the `winit` event loop until it closes.
pub(crate) fn run(config: RendererConfig, registry: ShaderRegistry) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialise event loop")?;
    let (width, height) = config.window_size;
    let window = WindowBuilder::new()
        .with_title(config.window_title(registry.current().name()))
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)
        .context("failed to create viewer window")?;

    let size = window.inner_size();
    let backend = WgpuBackend::new(&window, size, config.context).map_err(|err| {
        error!("{err}");
        anyhow!(err)
    })?;
    let state = RendererState::new(backend, registry, clock_for(config.still_time_ms))
        .context("failed to build the initial shader program")?;

    let mut viewer = Viewer {
        state,
        window,
        schedule: TickSchedule::new(config.tick_interval),
        config,
    };
    info!(
        shader = viewer.state.current().name(),
        shaders = viewer.state.registry().len(),
        width = size.width,
        height = size.height,
        "viewer ready"
    );

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == viewer.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::Resized(new_size) => {
                        let result = viewer
                            .state
                            .resize(f64::from(new_size.width), f64::from(new_size.height));
                        if !viewer.handle_frame(result) {
                            elwt.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        viewer.state.pointer_moved(position.x, position.y);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state != ElementState::Pressed || event.repeat {
                            return;
                        }
                        match command_for_key(&event.logical_key) {
                            Some(ViewerCommand::Exit) => elwt.exit(),
                            Some(command) => {
                                if let Err(err) = viewer.apply(command) {
                                    debug!(?command, "switch rejected: {err}");
                                }
                            }
                            None => {}
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let result = viewer.state.tick();
                        viewer.schedule.mark_ticked(Instant::now());
                        if !viewer.handle_frame(result) {
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                if viewer.schedule.ready(now) {
                    viewer.window.request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = viewer.schedule.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
