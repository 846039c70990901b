//! Integration tests: engines rendered through WAV files and the block feeder.

use patchwork_core::{
    Engine, Inputs, Message, Module, Outputs, Patch, Score, ScoreAction, ScoreEvent, ScorePlayer,
};
use patchwork_io::{BlockFeeder, read_wav, render, write_wav};
use serde_json::json;
use tempfile::NamedTempFile;

/// Constant level per outlet, changed with `{"level": x}`.
struct Level {
    level: f32,
    channels: usize,
}

impl Module for Level {
    fn inlet_count(&self) -> usize {
        0
    }

    fn outlet_count(&self) -> usize {
        self.channels
    }

    fn process(&mut self, _: Inputs<'_>, mut outputs: Outputs<'_>, _: u64) {
        for k in 0..self.channels {
            // Right channel at half the level.
            let scale = if k == 0 { 1.0 } else { 0.5 };
            outputs.get_mut(k).fill(self.level * scale);
        }
    }

    fn receive_message(&mut self, message: &Message) {
        if let Some(level) = message.get("level").and_then(Message::as_f64) {
            self.level = level as f32;
        }
    }
}

fn stereo_engine(level: f32) -> Engine {
    let mut patch = Patch::new(0, 2, 64, 1000.0);
    let source = patch
        .add("level", Box::new(Level { level, channels: 2 }))
        .unwrap();
    for k in 0..2 {
        let bridge = patch.outlet_bridge(k).unwrap();
        patch.connect(source, k, bridge, 0);
    }
    Engine::new("main", Box::new(patch), 64, 1000.0).unwrap()
}

fn level_at(on: f64, level: f64) -> ScoreEvent {
    ScoreEvent {
        on,
        action: ScoreAction::Send(vec![("level".parse().unwrap(), json!({ "level": level }))]),
    }
}

#[test]
fn normalized_render_survives_wav_round_trip() {
    let mut engine = stereo_engine(0.25);
    let mut rendered = render(&mut engine, None, 0.256).unwrap();
    assert_eq!(rendered.frames(), 256);

    rendered.normalize();
    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &rendered.samples, rendered.spec(24)).unwrap();

    let (samples, spec) = read_wav(file.path()).unwrap();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 1000);
    assert_eq!(spec.bits_per_sample, 24);
    assert_eq!(samples.len(), 512);
    for frame in samples.chunks(2) {
        assert!((frame[0] - 1.0).abs() < 1e-3);
        assert!((frame[1] - 0.5).abs() < 1e-3);
    }
}

#[test]
fn score_changes_render_at_block_boundary() {
    let mut engine = stereo_engine(0.0);
    let mut player = ScorePlayer::new(Score::new(vec![level_at(0.1, 1.0)]));
    let rendered = render(&mut engine, Some(&mut player), 0.192).unwrap();

    // Blocks start at 0, 64 and 128 ms; the 100 ms event lands at 128 ms.
    let left: Vec<f32> = rendered.samples.iter().step_by(2).copied().collect();
    assert!(left[..128].iter().all(|&s| s == 0.0));
    assert!(left[128..].iter().all(|&s| s == 1.0));
}

#[test]
fn feeder_plays_score_in_callback_order() {
    let engine = stereo_engine(0.0);
    let player = ScorePlayer::new(Score::new(vec![level_at(0.0, 0.5)]));
    let mut feeder = BlockFeeder::new(engine, Some(player));

    let mut buffer = vec![0.0; 100 * 2];
    feeder.fill(&mut buffer, 2);
    assert!(buffer.chunks(2).all(|frame| frame == [0.5, 0.25]));
    assert_eq!(feeder.engine().timestamp(), 128);
}
