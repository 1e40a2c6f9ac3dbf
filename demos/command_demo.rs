use dialfeed::{Field, FieldSet, Instrument, InstrumentConfig};
use rand::Rng;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dialfeed::logging::init_tracing(false, false);

    let config = InstrumentConfig::builder()
        .minor_tick_length(15)
        .major_tick_length(15)
        .needle1_label("Primary".to_string())
        .needle2_label("Secondary".to_string())
        .caption("DEMO".to_string())
        .build();

    let mut instrument = Instrument::new(config)?;

    let (sender, receiver) = mpsc::channel();

    // Producer: random walk, occasionally leaving the dial so the warning shows
    thread::spawn(move || {
        let mut rng = rand::rng();
        loop {
            let update = FieldSet::new()
                .with(Field::Needle1, rng.random_range(-10.0..110.0))
                .with(Field::Needle2, rng.random_range(0.0..100.0))
                .with(Field::Readout, rng.random_range(0.0..100.0))
                .with(Field::HighlightLower, rng.random_range(10.0..40.0))
                .with(Field::HighlightUpper, rng.random_range(60.0..90.0));

            if sender.send(update).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(500));
        }
    });

    println!("Displaying gauge with random updates every 500 ms; close the window to exit");

    instrument.show_with_updates(receiver)?;
    Ok(())
}
