use std::sync::Arc;
use std::time::Instant;

use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::ar::{TrackingSession, WorldTrackingConfig};
use crate::gfx::{CameraController, DebugOptions, OrbitCamera, RenderEngine};
use crate::scene::{Scene, SceneDelegate};
use crate::stats::FrameStats;

/// The demo application: window plumbing around a tracking session, a scene,
/// and the render engine.
///
/// The session lifecycle follows window visibility: it starts when the app
/// is resumed and the window appears, and pauses when the app is suspended
/// or the window is occluded.
pub struct PlanarApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    session: TrackingSession,
    config: WorldTrackingConfig,
    delegate: Option<Box<dyn SceneDelegate>>,
    camera: OrbitCamera,
    controller: CameraController,
    debug_options: DebugOptions,
    stats: FrameStats,
    last_frame: Option<Instant>,
}

impl PlanarApp {
    /// Create a new application with the default demo environment.
    pub fn new() -> Self {
        Self::with_session(TrackingSession::default())
    }

    /// Create a new application over a custom tracking session.
    pub fn with_session(session: TrackingSession) -> Self {
        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let camera = OrbitCamera::new(4.0, 0.45, 0.6, Vector3::new(0.0, -0.6, -1.0), 1.0);
        let controller = CameraController::new(0.005, 0.1);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                scene: Scene::new(),
                session,
                config: WorldTrackingConfig::default(),
                delegate: None,
                camera,
                controller,
                debug_options: DebugOptions::ALL,
                stats: FrameStats::new(),
                last_frame: None,
            },
        }
    }

    /// Install the delegate that reacts to discovered surfaces. Without one,
    /// anchors are tracked but nothing is added to the scene.
    pub fn set_delegate(&mut self, delegate: impl SceneDelegate + 'static) {
        self.app_state.delegate = Some(Box::new(delegate));
    }

    /// Replace the tracking configuration used when the session starts.
    pub fn set_config(&mut self, config: WorldTrackingConfig) {
        self.app_state.config = config;
    }

    pub fn set_debug_options(&mut self, options: DebugOptions) {
        self.app_state.debug_options = options;
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl Default for PlanarApp {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    fn frame(&mut self) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        self.stats.begin_frame();

        let now = Instant::now();
        // Clamp dt so a stall doesn't fast-forward the detector.
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f32().min(0.1))
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        let events = self.session.step(dt);
        if let Some(delegate) = self.delegate.as_mut() {
            for event in &events {
                self.scene.apply(event, delegate.as_mut());
            }
        }

        self.camera.update_view_proj();
        render_engine.update(self.camera.uniform);
        render_engine.render_frame(
            &self.scene,
            self.session.feature_points(),
            self.debug_options,
        );

        if let Some(metrics) = self.stats.end_frame() {
            log::info!(
                "{:.0} fps ({:.2} ms avg, {:.2}..{:.2}), {} anchors, {} feature points",
                metrics.fps,
                metrics.frame_time_ms,
                metrics.min_frame_time_ms,
                metrics.max_frame_time_ms,
                self.scene.anchor_count(),
                self.session.feature_points().len()
            );
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Ok(window) = event_loop.create_window(
                WindowAttributes::default()
                    .with_title("planar - detecting planes")
                    .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
            ) {
                let window_handle = Arc::new(window);
                self.window = Some(window_handle.clone());

                let (width, height) = window_handle.inner_size().into();
                self.camera.resize_projection(width, height);

                let window_clone = window_handle.clone();
                let renderer = pollster::block_on(async move {
                    RenderEngine::new(window_clone, width, height).await
                });
                self.render_engine = Some(renderer);
            }
        }

        // The view is about to appear: start (or resume) tracking.
        self.session.run(self.config.clone());
        self.last_frame = None;
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // The view is going away: stop tracking until we come back.
        self.session.pause();
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Occluded(occluded) => {
                if occluded {
                    self.session.pause();
                } else {
                    self.session.run(self.config.clone());
                    self.last_frame = None;
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera.resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                window.request_redraw();
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        self.controller
            .process_events(&event, window, &mut self.camera);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
