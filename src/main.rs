use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use dialfeed::logging::init_tracing;
use dialfeed::{spawn_line_reader, HighlightBounds, Instrument, InstrumentConfig, Range, Retention};

/// Analog gauge driven by `key=value` lines on stdin.
#[derive(Parser, Debug)]
#[command(name = "dialfeed", version, about, long_about = None)]
struct Cli {
    /// Dial range
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    range: Option<Vec<f64>>,

    /// Window title
    #[arg(long, default_value = "Instrument")]
    title: String,

    /// Fixed highlight band; overrides highlight bounds in the input
    #[arg(long, num_args = 2, value_names = ["LOWER", "UPPER"], allow_negative_numbers = true)]
    highlight: Option<Vec<f64>>,

    /// Label for the primary needle
    #[arg(long)]
    label1: Option<String>,

    /// Label for the secondary needle
    #[arg(long)]
    label2: Option<String>,

    /// Curved caption under the dial
    #[arg(long)]
    caption: Option<String>,

    /// TrueType/OpenType font for dial text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Fraction of the remaining distance covered per frame
    #[arg(long, default_value_t = 0.1)]
    rate: f64,

    /// Snap distance as a fraction of the range span
    #[arg(long, default_value_t = 1e-5)]
    snap_epsilon: f64,

    /// Maximum frames per second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// What happens to fields a line leaves out
    #[arg(long, value_enum, default_value_t = RetentionArg::Persist)]
    retention: RetentionArg,

    /// Window edge length in logical pixels
    #[arg(long, default_value_t = 300)]
    size: usize,

    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RetentionArg {
    Persist,
    PerLine,
}

impl From<RetentionArg> for Retention {
    fn from(arg: RetentionArg) -> Self {
        match arg {
            RetentionArg::Persist => Retention::Persist,
            RetentionArg::PerLine => Retention::PerLine,
        }
    }
}

impl Cli {
    fn to_config(&self) -> InstrumentConfig {
        let range = match self.range.as_deref() {
            Some(&[min, max]) => Range { min, max },
            _ => Range::default(),
        };
        let highlight = match self.highlight.as_deref() {
            Some(&[lower, upper]) => Some(HighlightBounds::new(lower, upper)),
            _ => None,
        };

        InstrumentConfig::builder()
            .title(self.title.clone())
            .range(range)
            .maybe_highlight(highlight)
            .retention(self.retention.into())
            .convergence_rate(self.rate)
            .snap_epsilon(self.snap_epsilon)
            .max_framerate(self.fps)
            .window_width(self.size)
            .window_height(self.size)
            .maybe_needle1_label(self.label1.clone())
            .maybe_needle2_label(self.label2.clone())
            .maybe_caption(self.caption.clone())
            .maybe_font_path(self.font.clone())
            .build()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    let config = cli.to_config();
    let mut instrument = Instrument::new(config).context("invalid gauge configuration")?;
    let config = instrument.config();
    info!(
        title = %config.title,
        min = config.range.min,
        max = config.range.max,
        highlight = ?config.highlight,
        retention = ?config.retention,
        rate = config.convergence_rate,
        fps = config.max_framerate,
        "starting gauge"
    );

    let updates = spawn_line_reader(io::stdin()).context("failed to start input reader")?;
    instrument
        .show_with_updates(updates)
        .context("gauge window failed")?;
    Ok(())
}
