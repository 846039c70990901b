//! Offline rendering to a WAV file.

use super::Session;
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use patchwork_io::{render_with_progress, write_wav};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Script file (JSON or TOML)
    script: PathBuf,

    /// Output WAV file
    output: PathBuf,

    /// Length of the render in seconds
    #[arg(short, long, default_value_t = 10.0)]
    seconds: f64,

    /// Score file with timed messages
    #[arg(long, value_name = "FILE")]
    score: Option<PathBuf>,

    /// Write samples as rendered instead of scaling the peak to 1.0
    #[arg(long)]
    no_normalize: bool,

    /// Output bit depth (16, 24 or 32-bit float)
    #[arg(short, long, default_value_t = 32, value_parser = parse_bit_depth)]
    bit_depth: u16,
}

fn parse_bit_depth(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(bits @ (16 | 24 | 32)) => Ok(bits),
        _ => Err(format!("unsupported bit depth '{value}' (use 16, 24 or 32)")),
    }
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let Session {
        mut engine,
        mut player,
    } = Session::load(&args.script, args.score.as_deref())?;

    println!(
        "Rendering {} ({:.2}s at {} Hz)",
        args.script.display(),
        args.seconds,
        engine.sample_rate()
    );

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} blocks ({eta})")?
            .progress_chars("##-"),
    );

    let mut rendered =
        render_with_progress(&mut engine, player.as_mut(), args.seconds, |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        })?;
    pb.finish_and_clear();
    engine.release();

    if !args.no_normalize {
        let gain = rendered.normalize();
        tracing::info!(gain, "normalized");
    }

    write_wav(
        &args.output,
        &rendered.samples,
        rendered.spec(args.bit_depth),
    )
    .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} ({} frames, {} channel(s), {}-bit)",
        args.output.display(),
        rendered.frames(),
        rendered.channels,
        args.bit_depth
    );
    Ok(())
}
