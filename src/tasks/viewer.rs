use std::num::NonZeroU32;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::RgbaImage;
use softbuffer::{Context as SoftContext, Surface};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    monitor::MonitorHandle,
    window::{Fullscreen, Window, WindowId},
};

use crate::config::Configuration;
use crate::error::Error;
use crate::events::KeyCommand;
use crate::processing::caption::CaptionStyle;
use crate::processing::{layout, load_composed};
use crate::slideshow::{Flow, Frame, Slideshow};

#[derive(Debug)]
enum ViewerEvent {
    Cancelled,
}

type WindowHandle = Arc<Window>;

/// Monitor the slideshow renders on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayTarget {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

impl DisplayTarget {
    fn from_monitor(index: usize, monitor: &MonitorHandle) -> Self {
        let size = monitor.size();
        let origin = monitor.position();
        Self {
            index,
            width: size.width.max(1),
            height: size.height.max(1),
            x: origin.x,
            y: origin.y,
        }
    }
}

/// Keys the slideshow reacts to; everything else is ignored.
pub fn key_command(code: KeyCode) -> Option<KeyCommand> {
    match code {
        KeyCode::Space => Some(KeyCommand::TogglePause),
        KeyCode::ArrowLeft => Some(KeyCommand::Previous),
        KeyCode::ArrowRight => Some(KeyCommand::Next),
        KeyCode::Escape | KeyCode::KeyQ => Some(KeyCommand::Quit),
        _ => None,
    }
}

struct DisplaySession {
    window: WindowHandle,
    _context: SoftContext<WindowHandle>,
    surface: Surface<WindowHandle, WindowHandle>,
    surface_width: u32,
    target: DisplayTarget,
}

/// Pixels that should be on screen, independent of any window.
#[derive(Default)]
struct Screen {
    /// Decoded and captioned image currently on screen, before letterboxing.
    composed: Option<RgbaImage>,
    /// Letterboxed frame for the current image, without the pause glyph.
    canvas: Option<RgbaImage>,
    /// Packed pixels of what should be on screen.
    frame: Vec<u32>,
    frame_width: u32,
    needs_present: bool,
    /// The frame is the plain blank canvas.
    blank: bool,
    /// The frame carries the pause glyph.
    glyph: bool,
}

impl Screen {
    fn render(&mut self, frame: Frame, target: DisplayTarget, captions: Option<&CaptionStyle>) {
        match frame {
            Frame::Hold => {}
            Frame::Blank => {
                if self.blank {
                    return;
                }
                self.composed = None;
                self.canvas = None;
                self.set_frame(layout::blank_canvas(target.width, target.height));
                self.blank = true;
                self.glyph = false;
            }
            Frame::Show(path) => {
                if self.load(&path, target, captions)
                    && let Some(canvas) = self.canvas.clone()
                {
                    self.set_frame(canvas);
                    self.blank = false;
                    self.glyph = false;
                }
            }
            Frame::Paused { reload } => {
                let reloaded = reload.is_some_and(|path| self.load(&path, target, captions));
                if self.glyph && !reloaded {
                    return;
                }
                let mut canvas = self
                    .canvas
                    .clone()
                    .unwrap_or_else(|| layout::blank_canvas(target.width, target.height));
                layout::draw_pause_glyph(&mut canvas);
                self.set_frame(canvas);
                self.blank = false;
                self.glyph = true;
            }
        }
    }

    /// Decode, caption and letterbox `path`. Failures keep the previous frame.
    fn load(
        &mut self,
        path: &Path,
        target: DisplayTarget,
        captions: Option<&CaptionStyle>,
    ) -> bool {
        let started = Instant::now();
        match load_composed(path, captions) {
            Ok(composed) => {
                self.canvas = Some(layout::letterbox(&composed, target.width, target.height));
                self.composed = Some(composed);
                debug!(
                    path = %path.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "image prepared"
                );
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable image");
                false
            }
        }
    }

    /// Re-letterbox the current image for a new target size.
    fn refit(&mut self, target: DisplayTarget, paused: bool) {
        let mut canvas = match self.composed.as_ref() {
            Some(composed) => {
                let canvas = layout::letterbox(composed, target.width, target.height);
                self.canvas = Some(canvas.clone());
                canvas
            }
            None => layout::blank_canvas(target.width, target.height),
        };
        if paused {
            layout::draw_pause_glyph(&mut canvas);
        }
        self.blank = self.composed.is_none() && !paused;
        self.glyph = paused;
        self.set_frame(canvas);
    }

    fn set_frame(&mut self, canvas: RgbaImage) {
        self.frame_width = canvas.width();
        self.frame = layout::pack_xrgb(&canvas);
        self.needs_present = true;
    }
}

struct ViewerApp {
    cfg: Configuration,
    cancel: CancellationToken,
    slideshow: Slideshow,
    captions: Option<CaptionStyle>,
    session: Option<DisplaySession>,
    screen: Screen,
    tick_interval: Duration,
    next_tick: Instant,
    startup_error: Option<Error>,
}

impl ViewerApp {
    fn new(
        cfg: Configuration,
        cancel: CancellationToken,
        slideshow: Slideshow,
        captions: Option<CaptionStyle>,
    ) -> Self {
        let tick_interval = cfg.tick_interval();
        Self {
            cfg,
            cancel,
            slideshow,
            captions,
            session: None,
            screen: Screen::default(),
            tick_interval,
            next_tick: Instant::now(),
            startup_error: None,
        }
    }

    fn select_monitor(&self, event_loop: &ActiveEventLoop) -> Option<(usize, MonitorHandle)> {
        let monitors: Vec<MonitorHandle> = event_loop.available_monitors().collect();
        for (index, monitor) in monitors.iter().enumerate() {
            let size = monitor.size();
            let origin = monitor.position();
            let name = monitor.name().unwrap_or_default();
            info!(
                index,
                name = %name,
                width = size.width,
                height = size.height,
                x = origin.x,
                y = origin.y,
                "monitor detected"
            );
        }
        if let Some(monitor) = monitors.get(self.cfg.screen_id) {
            return Some((self.cfg.screen_id, monitor.clone()));
        }
        warn!(
            screen_id = self.cfg.screen_id,
            available = monitors.len(),
            "configured screen not found; using primary monitor"
        );
        let primary = event_loop.primary_monitor().or_else(|| monitors.first().cloned())?;
        let index = monitors.iter().position(|m| *m == primary).unwrap_or(0);
        Some((index, primary))
    }

    fn ensure_session(&mut self, event_loop: &ActiveEventLoop) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        let monitor = self.select_monitor(event_loop);
        let mut attrs = Window::default_attributes()
            .with_title("Folder Slideshow")
            .with_decorations(false)
            .with_fullscreen(Some(Fullscreen::Borderless(
                monitor.as_ref().map(|(_, m)| m.clone()),
            )))
            .with_active(true);
        if let Some((_, m)) = monitor.as_ref() {
            attrs = attrs.with_position(m.position());
        }
        let window = event_loop
            .create_window(attrs)
            .map_err(|err| Error::Display(format!("failed to create window: {err}")))?;
        window.set_cursor_visible(false);
        let window = WindowHandle::new(window);

        let context = SoftContext::new(window.clone())
            .map_err(|err| Error::Display(format!("softbuffer context: {err}")))?;
        let surface = Surface::new(&context, window.clone())
            .map_err(|err| Error::Display(format!("softbuffer surface: {err}")))?;

        let target = match monitor.as_ref() {
            Some((index, m)) => DisplayTarget::from_monitor(*index, m),
            None => {
                let size = window.inner_size();
                DisplayTarget {
                    index: 0,
                    width: size.width.max(1),
                    height: size.height.max(1),
                    x: 0,
                    y: 0,
                }
            }
        };
        info!(
            index = target.index,
            width = target.width,
            height = target.height,
            x = target.x,
            y = target.y,
            "display target selected"
        );

        self.session = Some(DisplaySession {
            window,
            _context: context,
            surface,
            surface_width: 0,
            target,
        });
        self.screen.render(Frame::Blank, target, None);
        self.next_tick = Instant::now();
        Ok(())
    }

    fn target(&self) -> Option<DisplayTarget> {
        self.session.as_ref().map(|s| s.target)
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (Some(width), Some(height)) = (
            NonZeroU32::new(size.width.max(1)),
            NonZeroU32::new(size.height.max(1)),
        ) else {
            return;
        };
        if let Err(err) = session.surface.resize(width, height) {
            error!("softbuffer resize error: {err:?}");
            return;
        }
        session.surface_width = width.get();
        if (session.target.width, session.target.height) != (size.width, size.height) {
            debug!(
                width = size.width,
                height = size.height,
                "surface size differs from monitor; refitting"
            );
            session.target.width = width.get();
            session.target.height = height.get();
            let target = session.target;
            let paused = self.slideshow.playback().is_paused();
            self.screen.refit(target, paused);
        }
        self.screen.needs_present = true;
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        let Some(command) = key_command(code) else {
            return;
        };
        match self.slideshow.handle_key(command) {
            Flow::Quit => {
                info!("quit requested");
                event_loop.exit();
            }
            Flow::Continue => {
                // Run the next tick right away so the change is visible immediately.
                self.next_tick = Instant::now();
            }
        }
    }

    fn run_tick(&mut self) {
        let Some(target) = self.target() else {
            return;
        };
        let frame = self.slideshow.step();
        self.screen.render(frame, target, self.captions.as_ref());
    }

    fn present(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.surface_width == 0 {
            return;
        }
        match session.surface.buffer_mut() {
            Ok(mut buffer) => {
                layout::blit(
                    &self.screen.frame,
                    self.screen.frame_width,
                    &mut buffer,
                    session.surface_width,
                );
                if let Err(err) = buffer.present() {
                    error!("softbuffer present error: {err:?}");
                }
            }
            Err(err) => error!("softbuffer buffer access error: {err:?}"),
        }
    }
}

impl ApplicationHandler<ViewerEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.ensure_session(event_loop) {
            error!(error = %err, "failed to initialize display");
            self.startup_error = Some(err);
            event_loop.exit();
            return;
        }
        if let Some(session) = self.session.as_ref() {
            let size = session.window.inner_size();
            self.handle_resize(size);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                info!("viewer window closed");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && let PhysicalKey::Code(code) = event.physical_key
                {
                    self.handle_key(event_loop, code);
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::RedrawRequested => self.present(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_tick {
            self.run_tick();
            self.next_tick = now + self.tick_interval;
        }
        if std::mem::take(&mut self.screen.needs_present)
            && let Some(session) = self.session.as_ref()
        {
            session.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Cancelled => {
                info!("viewer received cancellation event");
                event_loop.exit();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Release the surface before the window it draws into.
        self.session = None;
        self.cancel.cancel();
    }
}

/// Run the slideshow window on the current (main) thread until quit.
pub fn run_windowed(
    slideshow: Slideshow,
    cfg: Configuration,
    captions: Option<CaptionStyle>,
    cancel: CancellationToken,
) -> Result<()> {
    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    let cancel_task = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(ViewerEvent::Cancelled);
        })
    };

    let mut app = ViewerApp::new(cfg, cancel, slideshow, captions);
    let run_result = event_loop.run_app(&mut app);
    cancel_task.abort();

    run_result.context("viewer event loop failed")?;
    match app.startup_error.take() {
        Some(err) => Err(anyhow::Error::new(err).context("display unavailable")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::tempdir;

    const TARGET: DisplayTarget = DisplayTarget {
        index: 0,
        width: 64,
        height: 48,
        x: 0,
        y: 0,
    };

    fn presented(screen: &mut Screen) -> bool {
        std::mem::take(&mut screen.needs_present)
    }

    #[test]
    fn blank_screen_is_drawn_once() {
        let mut screen = Screen::default();
        screen.render(Frame::Blank, TARGET, None);
        assert!(presented(&mut screen));
        assert_eq!(screen.frame.len(), 64 * 48);

        screen.render(Frame::Blank, TARGET, None);
        screen.render(Frame::Hold, TARGET, None);
        assert!(!presented(&mut screen));
    }

    #[test]
    fn paused_glyph_is_drawn_once_until_reload() {
        let tmp = tempdir().unwrap();
        let first = tmp.path().join("first.png");
        let second = tmp.path().join("second.png");
        RgbaImage::from_pixel(32, 24, Rgba([200, 0, 0, 255]))
            .save(&first)
            .unwrap();
        RgbaImage::from_pixel(32, 24, Rgba([0, 0, 200, 255]))
            .save(&second)
            .unwrap();

        let mut screen = Screen::default();
        screen.render(Frame::Show(first), TARGET, None);
        assert!(presented(&mut screen));
        assert!(!screen.blank);

        screen.render(Frame::Paused { reload: None }, TARGET, None);
        assert!(presented(&mut screen));
        screen.render(Frame::Paused { reload: None }, TARGET, None);
        assert!(!presented(&mut screen));

        screen.render(
            Frame::Paused {
                reload: Some(second),
            },
            TARGET,
            None,
        );
        assert!(presented(&mut screen));
        // centre pixel comes from the reloaded image
        let centre = (TARGET.height / 2 * TARGET.width + TARGET.width / 2) as usize;
        let px = screen.frame[centre];
        assert!(px & 0xFF > 150 && (px >> 16) & 0xFF < 50, "got {px:#08x}");

        // emptying the queue afterwards blanks the screen again
        screen.render(Frame::Blank, TARGET, None);
        assert!(presented(&mut screen));
        assert!(screen.frame.iter().all(|&px| px == 0));
    }

    #[test]
    fn unreadable_image_keeps_previous_frame() {
        let tmp = tempdir().unwrap();
        let broken = tmp.path().join("broken.jpg");
        std::fs::write(&broken, b"nope").unwrap();

        let mut screen = Screen::default();
        screen.render(Frame::Blank, TARGET, None);
        presented(&mut screen);
        screen.render(Frame::Show(broken), TARGET, None);
        assert!(!presented(&mut screen));
        assert!(screen.blank);
    }

    #[test]
    fn only_slideshow_keys_map_to_commands() {
        assert_eq!(key_command(KeyCode::Space), Some(KeyCommand::TogglePause));
        assert_eq!(key_command(KeyCode::ArrowLeft), Some(KeyCommand::Previous));
        assert_eq!(key_command(KeyCode::ArrowRight), Some(KeyCommand::Next));
        assert_eq!(key_command(KeyCode::Escape), Some(KeyCommand::Quit));
        assert_eq!(key_command(KeyCode::KeyQ), Some(KeyCommand::Quit));
        assert_eq!(key_command(KeyCode::ArrowUp), None);
        assert_eq!(key_command(KeyCode::Enter), None);
    }
}
