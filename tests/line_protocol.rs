use std::io::Cursor;
use std::thread;
use std::time::{Duration, Instant};

use dialfeed::render::TextSlot;
use dialfeed::{
    spawn_line_reader, Engine, Field, HighlightBounds, InstrumentConfig, Range, Retention, Scene,
};

/// Feed `input` through the reader thread and animate until the display settles.
fn run(config: InstrumentConfig, input: &str) -> Engine {
    let mut engine = Engine::new(config).unwrap();
    let updates = spawn_line_reader(Cursor::new(input.to_owned())).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !engine.input_closed() {
        assert!(Instant::now() < deadline, "reader never closed");
        engine.step(Some(&updates));
        thread::sleep(Duration::from_millis(1));
    }
    for _ in 0..2_000 {
        if engine.display().has_converged(engine.target()) {
            break;
        }
        engine.tick();
    }
    engine
}

fn scene_of(engine: &Engine) -> Scene {
    let mut scene = Scene::new();
    engine.frame().emit(&mut scene);
    scene
}

#[test]
fn mixed_stream_settles_on_the_merged_target() {
    let input = "\
needle1=10 needle2=20 readout=5
garbage
needle1=abc needle2=30

42.5
highlightlower=90 highlightupper=70
";
    let engine = run(InstrumentConfig::default(), input);
    let display = engine.display();
    assert_eq!(display.get(Field::Needle1), Some(42.5));
    assert_eq!(display.get(Field::Needle2), Some(30.0));
    assert_eq!(display.get(Field::Readout), Some(42.5));

    let scene = scene_of(&engine);
    assert_eq!(scene.needles().count(), 2);
    assert!(!scene.has_warning());
    let readout: Vec<_> = scene
        .texts()
        .filter(|t| t.slot == TextSlot::Readout)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(readout, ["42.500"]);
    assert_eq!(engine.assess().highlight, Some((70.0, 90.0)));
}

#[test]
fn forced_highlight_survives_input_bounds() {
    let config = InstrumentConfig::builder()
        .highlight(HighlightBounds::new(80.0, 100.0))
        .build();
    let engine = run(config, "highlightlower=1 highlightupper=2 needle1=50\n");
    assert_eq!(engine.target().get(Field::HighlightLower), Some(80.0));
    assert_eq!(engine.target().get(Field::HighlightUpper), Some(100.0));
    assert_eq!(engine.assess().highlight, Some((80.0, 100.0)));
}

#[test]
fn out_of_range_value_raises_the_warning() {
    let config = InstrumentConfig::builder()
        .range(Range { min: -50.0, max: 50.0 })
        .build();
    let engine = run(config.clone(), "needle2=75\n");
    let scene = scene_of(&engine);
    assert!(scene.has_warning());
    let needle = scene.needles().next().unwrap();
    assert_eq!(needle.field, Field::Needle2);
    assert_eq!(needle.color, config.alert_color);

    let at_limit = run(config, "needle2=50 readout=-50\n");
    assert!(!scene_of(&at_limit).has_warning());
}

#[test]
fn per_line_retention_hides_fields_left_out() {
    let config = InstrumentConfig::builder()
        .retention(Retention::PerLine)
        .build();
    let engine = run(config, "needle1=10 needle2=20\nneedle1=15\n");
    assert_eq!(engine.display().get(Field::Needle2), None);
    assert_eq!(scene_of(&engine).needles().count(), 1);
}

#[test]
fn empty_input_renders_a_bare_dial() {
    let engine = run(InstrumentConfig::default(), "");
    let scene = scene_of(&engine);
    assert_eq!(scene.needles().count(), 0);
    assert_eq!(scene.texts().count(), 0);
    assert!(!scene.has_warning());
    assert!(!scene.commands().is_empty());
}
