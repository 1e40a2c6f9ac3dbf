// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod input;
pub mod logging;
pub mod protocol;
pub mod render;
pub mod state;
pub mod validity;

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Pixels, SurfaceTexture};
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

pub use config::{Color, HighlightBounds, InstrumentConfig, Range, Retention};
pub use engine::Engine;
pub use error::{ConfigError, InstrumentError};
pub use field::{Field, FieldSet};
pub use input::spawn_line_reader;
pub use protocol::parse_line;
pub use render::raster::Canvas;
pub use render::{FrameRequest, Scene, Surface};

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// A single gauge window and the state it displays.
#[derive(Debug, Clone)]
pub struct Instrument {
    engine: Engine,
}

impl Instrument {
    pub fn new(config: InstrumentConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            engine: Engine::new(config)?,
        })
    }

    pub fn config(&self) -> &InstrumentConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Merge a set of field values, exactly like one input line.
    pub fn apply(&mut self, fields: &FieldSet) {
        self.engine.apply(fields);
    }

    /// Point the primary needle and the readout at `value`.
    /// Non-finite values are ignored.
    pub fn set_value(&mut self, value: f64) {
        self.apply(
            &FieldSet::new()
                .with(Field::Needle1, value)
                .with(Field::Readout, value),
        );
    }

    /// Open the window and animate toward the current target until closed.
    pub fn show(&mut self) -> Result<(), InstrumentError> {
        self.run_window(None)
    }

    /// Open the window and keep applying updates from `receiver`.
    pub fn show_with_updates(
        &mut self,
        receiver: Receiver<FieldSet>,
    ) -> Result<(), InstrumentError> {
        self.run_window(Some(receiver))
    }

    fn run_window(&mut self, receiver: Option<Receiver<FieldSet>>) -> Result<(), InstrumentError> {
        let config = self.engine.config().clone();
        let engine = &mut self.engine;
        let font = render::raster::resolve_font(config.font_path.as_deref());

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)?;
        let window = Arc::new(window);

        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let frame_duration = Duration::from_secs_f64(1.0 / config.max_framerate);
        let mut last_frame = Instant::now();
        info!(
            width = fb_width,
            height = fb_height,
            fps = config.max_framerate,
            "window open"
        );

        event_loop.run(|event, window_target| {
            window_target.set_control_flow(ControlFlow::WaitUntil(last_frame + frame_duration));
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        info!("window closed");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        if let Err(err) = pixels.resize_buffer(new_size.width, new_size.height) {
                            warn!(error = %err, "failed to resize frame buffer");
                        }
                        if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                            warn!(error = %err, "failed to resize surface");
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        engine.step(receiver.as_ref());
                        let request = engine.frame();

                        let mut canvas = Canvas::new(
                            pixels.frame_mut(),
                            fb_width,
                            fb_height,
                            font.as_ref(),
                            &config,
                        );
                        request.emit(&mut canvas);
                        if let Err(err) = pixels.render() {
                            warn!(error = %err, "render failed, closing");
                            window_target.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if last_frame.elapsed() >= frame_duration {
                        window.request_redraw();
                        last_frame = Instant::now();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_moves_primary_needle_and_readout() {
        let mut instrument = Instrument::new(InstrumentConfig::default()).unwrap();
        instrument.set_value(37.25);
        let target = instrument.engine().target();
        assert_eq!(target.get(Field::Needle1), Some(37.25));
        assert_eq!(target.get(Field::Readout), Some(37.25));
        assert_eq!(target.get(Field::Needle2), None);
    }

    #[test]
    fn apply_merges_like_an_input_line() {
        let mut instrument = Instrument::new(InstrumentConfig::default()).unwrap();
        instrument.apply(&parse_line("needle2=12 readout=3"));
        instrument.apply(&FieldSet::new().with(Field::Needle2, 14.0));
        let target = instrument.engine().target();
        assert_eq!(target.get(Field::Needle2), Some(14.0));
        assert_eq!(target.get(Field::Readout), Some(3.0));
    }

    #[test]
    fn non_finite_values_never_reach_the_target() {
        let mut instrument = Instrument::new(InstrumentConfig::default()).unwrap();
        instrument.set_value(12.0);
        instrument.set_value(f64::NAN);
        instrument.apply(&FieldSet::new().with(Field::Needle2, f64::INFINITY));
        let target = instrument.engine().target();
        assert_eq!(target.get(Field::Needle1), Some(12.0));
        assert_eq!(target.get(Field::Needle2), None);
    }

    #[test]
    fn invalid_config_never_reaches_a_window() {
        let config = InstrumentConfig::builder()
            .range(Range { min: 10.0, max: 0.0 })
            .build();
        assert_eq!(
            Instrument::new(config).unwrap_err(),
            ConfigError::InvalidRange { min: 10.0, max: 0.0 }
        );
    }
}
