//! Windowed demo host.
//!
//! Opens a winit window, drives one particle system and one emitter with a
//! fixed-step [`FrameClock`] and draws through a [`GpuSurface`].
//!
//! | Key | Action |
//! |-----|--------|
//! | `Escape` | quit |
//! | `Enter` | add 100 particles at the emitter |
//! | `Up` / `Down` | raise / lower the emission rate |

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::error::RunError;
use crate::gpu::GpuSurface;
use crate::{Drift, EffectConfig, Emitter, FrameClock, Orbit, Scatter, SharedSystem, Texture};

pub const WINDOW_SIZE: u32 = 1000;

const BURST: usize = 100;
const RATE_STEP: f32 = 1.25;

pub struct App {
    window: Option<Arc<Window>>,
    surface: Option<GpuSurface>,
    system: SharedSystem<()>,
    emitter: Emitter<()>,
    clock: FrameClock,
    /// First fatal error, reported once the event loop returns.
    error: Option<RunError>,
}

impl App {
    pub fn new(config: &EffectConfig) -> Result<Self, RunError> {
        let center = Vec2::splat(WINDOW_SIZE as f32 * 0.5);

        let mut system = config.build_system::<()>(Texture::soft_dot(24))?;
        system.add_affector(Drift::new(Vec2::new(60.0, 60.0)));
        let system = Rc::new(RefCell::new(system));

        let mut emitter = config.build_emitter::<()>()?;
        // Configs without a position orbit around the window center.
        if emitter.state().position == Vec2::ZERO {
            emitter.state_mut().position = center + Vec2::new(150.0, 0.0);
        }
        emitter.add_modifier(Orbit::new(center, 0.02));
        emitter.add_modifier(Scatter::new(6.0));
        emitter.set_particle_system(Some(system.clone()));

        log::info!(
            "Running effect '{}' at {} particles/s",
            config.name,
            emitter.emission_rate()
        );

        Ok(Self {
            window: None,
            surface: None,
            system,
            emitter,
            clock: FrameClock::new(),
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Enter => {
                let at = self.emitter.state().position;
                let mut system = self.system.borrow_mut();
                for _ in 0..BURST {
                    system.add_at(at);
                }
            }
            KeyCode::ArrowUp | KeyCode::ArrowDown => {
                let rate = self.emitter.emission_rate();
                let rate = if key == KeyCode::ArrowUp {
                    rate * RATE_STEP
                } else {
                    rate / RATE_STEP
                };
                if self.emitter.set_emission_rate(rate).is_ok() {
                    log::info!("Emission rate {:.0} particles/s", rate);
                }
            }
            _ => {}
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let step = self.clock.step();
        for _ in 0..self.clock.tick() {
            self.system.borrow_mut().update(step);
            self.emitter.update(step);
        }

        let Some(surface) = &mut self.surface else {
            return;
        };
        match self.system.borrow_mut().render(surface) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => surface.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
            Err(e) => log::error!("Render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Motes")
            .with_inner_size(winit::dpi::PhysicalSize::new(WINDOW_SIZE, WINDOW_SIZE));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        match pollster::block_on(GpuSurface::new(window.clone())) {
            Ok(surface) => self.surface = Some(surface),
            Err(e) => return self.fail(event_loop, e.into()),
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(surface) = &mut self.surface {
                    surface.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.on_key(event_loop, key),
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open the demo window and run until it is closed.
pub fn run(config: &EffectConfig) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
