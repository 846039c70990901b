//! Offline rendering of an engine into an interleaved buffer.

use patchwork_core::{Engine, ScorePlayer};
use tracing::info;

use crate::wav::WavSpec;
use crate::{Error, Result};

/// Interleaved samples produced by [`render`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Interleaved samples, `channels` per frame.
    pub samples: Vec<f32>,
    /// Channels per frame (1 or 2).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Rendered {
    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Scales the buffer so its peak is 1.0 and returns the gain applied.
    ///
    /// Silent buffers are left untouched (gain 1.0).
    pub fn normalize(&mut self) -> f32 {
        let peak = self.peak();
        if peak <= 0.0 || !peak.is_finite() {
            return 1.0;
        }
        let gain = 1.0 / peak;
        for sample in &mut self.samples {
            *sample *= gain;
        }
        gain
    }

    /// WAV spec for this buffer at the given bit depth.
    pub fn spec(&self, bits_per_sample: u16) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample,
        }
    }
}

/// Renders `seconds` of audio from `engine`.
///
/// The block count is `round(seconds * sample_rate / block_length)`. When a
/// score player is given, it fires its due events before every block.
pub fn render(
    engine: &mut Engine,
    player: Option<&mut ScorePlayer>,
    seconds: f64,
) -> Result<Rendered> {
    render_with_progress(engine, player, seconds, |_, _| {})
}

/// Like [`render`], calling `progress(done, total)` after each block.
pub fn render_with_progress<F>(
    engine: &mut Engine,
    mut player: Option<&mut ScorePlayer>,
    seconds: f64,
    mut progress: F,
) -> Result<Rendered>
where
    F: FnMut(usize, usize),
{
    let channels = engine.outlet_count();
    if !(1..=2).contains(&channels) {
        return Err(Error::UnsupportedChannels(channels));
    }

    let block_length = engine.block_length();
    let sample_rate = engine.sample_rate();
    let blocks = block_count(seconds, sample_rate, block_length);
    info!(
        blocks,
        block_length,
        channels,
        sample_rate,
        "rendering {seconds:.2}s"
    );

    let mut samples = Vec::with_capacity(blocks * block_length * channels);
    for block in 0..blocks {
        if let Some(player) = player.as_deref_mut() {
            player.play(engine);
        }
        engine.process_block();
        interleave(engine, channels, &mut samples);
        progress(block + 1, blocks);
    }

    let rendered = Rendered {
        samples,
        channels: channels as u16,
        sample_rate: sample_rate.round() as u32,
    };
    info!(
        frames = rendered.frames(),
        peak = rendered.peak(),
        "render finished"
    );
    Ok(rendered)
}

fn block_count(seconds: f64, sample_rate: f32, block_length: usize) -> usize {
    let blocks = seconds * f64::from(sample_rate) / block_length.max(1) as f64;
    if blocks.is_finite() && blocks > 0.0 {
        blocks.round() as usize
    } else {
        0
    }
}

fn interleave(engine: &Engine, channels: usize, samples: &mut Vec<f32>) {
    match channels {
        1 => samples.extend_from_slice(engine.outlet(0)),
        _ => {
            for (&left, &right) in engine.outlet(0).iter().zip(engine.outlet(1)) {
                samples.push(left);
                samples.push(right);
            }
        }
    }
}
