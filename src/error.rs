use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration problems. These are the only fatal input errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid range: min ({min}) must be less than max ({max})")]
    InvalidRange { min: f64, max: f64 },

    #[error("range bounds must be finite, got {min}..{max}")]
    NonFiniteRange { min: f64, max: f64 },

    #[error("range {min}..{max} is too wide to represent its span")]
    RangeTooWide { min: f64, max: f64 },

    #[error("highlight bounds must be finite, got {lower}..{upper}")]
    NonFiniteHighlight { lower: f64, upper: f64 },

    #[error("convergence rate must be in (0, 1], got {0}")]
    InvalidConvergenceRate(f64),

    #[error("snap epsilon must be finite and greater than zero, got {0}")]
    InvalidSnapEpsilon(f64),

    #[error("frame rate must be finite and greater than zero, got {0}")]
    InvalidFramerate(f64),

    #[error("window size must be non-zero, got {width}x{height}")]
    InvalidWindowSize { width: usize, height: usize },
}

/// Errors raised while bringing up or running the window.
#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("pixel surface error: {0}")]
    Pixels(#[from] pixels::Error),

    #[error("failed to read font {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a usable TrueType/OpenType font")]
    FontParse(PathBuf),

    #[error("failed to spawn input thread: {0}")]
    InputThread(#[source] std::io::Error),
}
