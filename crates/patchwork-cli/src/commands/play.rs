//! Realtime playback on an output device.

use super::Session;
use clap::Args;
use patchwork_io::{AudioStream, BlockFeeder};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

#[derive(Args)]
pub struct PlayArgs {
    /// Script file (JSON or TOML)
    script: PathBuf,

    /// Score file with timed messages
    #[arg(long, value_name = "FILE")]
    score: Option<PathBuf>,

    /// Output device (index, name, or partial name)
    #[arg(short, long, value_name = "DEVICE")]
    output: Option<String>,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let Session { engine, player } = Session::load(&args.script, args.score.as_deref())?;

    let sample_rate = engine.sample_rate().round() as u32;
    let mut stream = AudioStream::new(args.output.as_deref(), sample_rate)?;
    let channels = usize::from(stream.channels());

    let running = stream.stop_handle();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        running.store(false, Ordering::SeqCst);
    })?;

    println!(
        "\nPlaying {} ({} Hz, {} channel(s))... Press Ctrl+C to stop.\n",
        args.script.display(),
        sample_rate,
        channels
    );

    let mut feeder = BlockFeeder::new(engine, player);
    stream.run_output(move |data: &mut [f32]| feeder.fill(data, channels))?;
    Ok(())
}
