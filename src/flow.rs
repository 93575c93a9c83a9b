//! Application event loop and scene listeners.
//!
//! The loop owns one [`Context`], one [`Scene`] and one [`Renderer`]. User
//! code plugs in through [`RenderEvents`] listeners that fill the scene once
//! and are then notified around every frame and for every input event.
//!
//! # User-facing types
//!
//! - [`RenderEvents`] is the listener trait (setup, begin/end frame, input)
//! - [`FrameClock`] carries frame timing into listeners and material hooks
//! - [`LoopState`] tracks where the loop is in its lifecycle
//! - [`run`] opens the window and drives everything until it closes
//!
//! # Lifecycle Flow
//!
//! 1. The window and GPU context are created, listeners run `setup_scene`
//! 2. Per-item GPU state is prepared
//! 3. Each redraw: tick the clock, `begin_frame`, camera update, draw, `end_frame`
//! 4. Escape or a close request terminates the loop and tears the scene down

use std::{fmt::Debug, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    context::{Context, InitContext},
    data_structures::scene::Scene,
    input::InputEvent,
    render::{RenderTarget, Renderer},
    settings::Settings,
};

/// Timing of the current frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    started: Instant,
    last: Instant,
    elapsed: Duration,
    delta: Duration,
    frame: u64,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            last: now,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
            frame: 0,
        }
    }

    /// Start a new frame at `now` and return the time since the previous one.
    pub fn tick(&mut self, now: Instant) -> Duration {
        self.delta = now.saturating_duration_since(self.last);
        self.elapsed = now.saturating_duration_since(self.started);
        self.last = now;
        self.frame += 1;
        self.delta
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Time since the loop started.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Time between the last two frames.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Initialized,
    Running,
    Terminated,
}

impl LoopState {
    /// Setup finished successfully.
    pub fn on_initialized(self) -> Self {
        match self {
            Self::Uninitialized => Self::Initialized,
            state => state,
        }
    }

    /// A frame is about to be drawn, or a close was requested.
    pub fn on_frame(self, should_close: bool) -> Self {
        match (self, should_close) {
            (Self::Uninitialized, _) => Self::Uninitialized,
            (Self::Terminated, _) | (_, true) => Self::Terminated,
            (Self::Initialized | Self::Running, false) => Self::Running,
        }
    }
}

pub type SetupFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>;

/// Listener notified by the loop.
///
/// All hooks but `begin_frame` have empty defaults.
pub trait RenderEvents {
    /// Populate the scene. Runs once, after the GPU context exists and before
    /// the first frame. An error aborts the application.
    fn setup_scene<'a>(
        &'a mut self,
        _ctx: &'a InitContext,
        _scene: &'a mut Scene,
    ) -> SetupFuture<'a> {
        Box::pin(async { Ok(()) })
    }

    /// Called before the camera is updated and the scene is drawn.
    fn begin_frame(&mut self, ctx: &mut Context, scene: &mut Scene, clock: &FrameClock);

    /// Called after the frame has been submitted.
    fn end_frame(&mut self, _ctx: &Context, _scene: &Scene, _clock: &FrameClock) {}

    /// Called for every input event, after the camera controller saw it.
    fn on_input(&mut self, _ctx: &mut Context, _scene: &mut Scene, _event: &InputEvent) {}
}

impl Debug for dyn RenderEvents + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RenderEvents")
    }
}

/// GPU context, scene and renderer once the window exists.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) ctx: Context,
    scene: Scene,
    renderer: Renderer,
}

impl AppState {
    async fn new(
        window: Arc<Window>,
        settings: Settings,
        listeners: &mut [Box<dyn RenderEvents>],
    ) -> anyhow::Result<Self> {
        let mut ctx = Context::new(window, settings).await?;
        let mut scene = Scene::new(ctx.settings.clear_colour);

        // The clone in into() only clones the internal handles of Device and Queue
        let init: InitContext = (&ctx).into();
        for listener in listeners.iter_mut() {
            listener.setup_scene(&init, &mut scene).await?;
        }
        // listeners may have placed the camera by hand
        ctx.camera.sync_rig();

        let mut renderer = Renderer::new(&ctx.device, ctx.config.format);
        renderer.prepare(&ctx.device, &mut scene, &ctx.camera.bind_group_layout)?;
        log::info!(
            "scene ready: {} items, {} geometries",
            scene.items().len(),
            scene.geometries().len()
        );
        Ok(Self {
            ctx,
            scene,
            renderer,
        })
    }

    fn draw(&mut self, clock: &FrameClock) -> Result<(), wgpu::CurrentSurfaceTexture> {
        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let target = RenderTarget {
            view: &view,
            depth: &self.ctx.depth_texture.view,
            width: self.ctx.config.width,
            height: self.ctx.config.height,
        };
        self.renderer.render(
            &self.ctx.device,
            &self.ctx.queue,
            &target,
            &mut self.scene,
            &mut self.ctx.camera,
            clock,
        );
        self.ctx.window.pre_present_notify();
        output.present();
        Ok(())
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    settings: Settings,
    state: Option<AppState>,
    listeners: Vec<Box<dyn RenderEvents>>,
    loop_state: LoopState,
    clock: FrameClock,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(settings: Settings, listeners: Vec<Box<dyn RenderEvents>>) -> anyhow::Result<Self> {
        Ok(Self {
            async_runtime: tokio::runtime::Runtime::new()?,
            settings,
            state: None,
            listeners,
            loop_state: LoopState::Uninitialized,
            clock: FrameClock::new(Instant::now()),
            error: None,
        })
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        self.loop_state = LoopState::Terminated;
        event_loop.exit();
    }

    fn dispatch_input(&mut self, event: &InputEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        if event.is_escape() {
            state.ctx.request_close();
        }
        state.ctx.camera.controller.process_input(event);
        self.listeners
            .iter_mut()
            .for_each(|listener| listener.on_input(&mut state.ctx, &mut state.scene, event));
    }

    fn redraw(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };
        let dt = self.clock.tick(Instant::now());
        self.listeners
            .iter_mut()
            .for_each(|listener| listener.begin_frame(&mut state.ctx, &mut state.scene, &self.clock));
        state.ctx.camera.update(dt);

        match state.draw(&self.clock) {
            Ok(()) => self
                .listeners
                .iter_mut()
                .for_each(|listener| listener.end_frame(&state.ctx, &state.scene, &self.clock)),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                let size = state.ctx.window.inner_size();
                state.ctx.resize(size.width, size.height);
            }
            Err(e) => log::error!("Unable to render {:?}", e),
        }
        state.ctx.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_settings = &self.settings.window;
        let window_attributes = Window::default_attributes()
            .with_title(window_settings.title.clone())
            .with_inner_size(LogicalSize::new(window_settings.width, window_settings.height))
            .with_resizable(window_settings.resizable);
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        let settings = self.settings.clone();
        let listeners = &mut self.listeners;
        let init_future = async move { AppState::new(window, settings, listeners).await };
        match self.async_runtime.block_on(init_future) {
            Ok(mut state) => {
                state.ctx.capture_cursor(self.settings.window.capture_cursor);
                self.loop_state = self.loop_state.on_initialized();
                log::info!("loop state: {:?}", self.loop_state);
                self.clock = FrameClock::new(Instant::now());
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.context("App initialization failed")),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(event) = InputEvent::from_device_event(&event) {
            self.dispatch_input(&event);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if self.state.is_none() {
            return;
        }
        if let Some(input) = InputEvent::from_window_event(&event) {
            self.dispatch_input(&input);
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(state) = &mut self.state {
                    state.ctx.request_close();
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let should_close = self
                    .state
                    .as_ref()
                    .is_some_and(|state| state.ctx.should_close());
                let next = self.loop_state.on_frame(should_close);
                if next != self.loop_state {
                    log::info!("loop state: {:?}", next);
                }
                self.loop_state = next;
                if self.loop_state == LoopState::Running {
                    self.redraw();
                }
            }
            _ => {}
        }

        if self.state.as_ref().is_some_and(|state| state.ctx.should_close()) {
            self.loop_state = self.loop_state.on_frame(true);
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.scene.teardown();
        }
        self.loop_state = LoopState::Terminated;
    }
}

/// Open the window described by `settings` and run `listeners` until it closes.
///
/// Errors from setup (a missing shader, an unreadable texture, no adapter)
/// end the loop and are returned here.
pub fn run(settings: Settings, listeners: Vec<Box<dyn RenderEvents>>) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(settings, listeners)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_tracks_delta_and_elapsed() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.elapsed(), Duration::ZERO);

        let dt = clock.tick(start + Duration::from_millis(16));
        assert_eq!(dt, Duration::from_millis(16));
        let dt = clock.tick(start + Duration::from_millis(40));
        assert_eq!(dt, Duration::from_millis(24));
        assert_eq!(clock.delta(), Duration::from_millis(24));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn clock_never_goes_backwards() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start + Duration::from_millis(10));
        assert_eq!(clock.tick(start), Duration::ZERO);
    }

    #[test]
    fn loop_state_transitions() {
        let state = LoopState::Uninitialized;
        assert_eq!(state.on_frame(false), LoopState::Uninitialized);

        let state = state.on_initialized();
        assert_eq!(state, LoopState::Initialized);
        let state = state.on_frame(false);
        assert_eq!(state, LoopState::Running);
        assert_eq!(state.on_frame(false), LoopState::Running);

        let state = state.on_frame(true);
        assert_eq!(state, LoopState::Terminated);
        assert_eq!(state.on_frame(false), LoopState::Terminated);
        assert_eq!(state.on_initialized(), LoopState::Terminated);
    }

    #[test]
    fn close_before_first_frame_terminates() {
        let state = LoopState::Uninitialized.on_initialized();
        assert_eq!(state.on_frame(true), LoopState::Terminated);
    }
}
