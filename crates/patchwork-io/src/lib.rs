//! Audio output for patchwork engines.
//!
//! This crate drives an [`Engine`](patchwork_core::Engine) from outside the
//! graph:
//!
//! - **Offline rendering**: [`render`] pulls a fixed number of blocks into an
//!   interleaved [`Rendered`] buffer, optionally playing a score alongside
//! - **WAV files**: [`write_wav`] saves a buffer as float or integer PCM
//! - **Real-time output**: [`AudioStream`] runs a cpal output stream, and
//!   [`BlockFeeder`] adapts block-sized engine output to whatever buffer
//!   size and channel count the device asks for
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use patchwork_core::{Engine, Patch};
//! use patchwork_io::{WavSpec, render, write_wav};
//!
//! let patch = Patch::new(0, 2, 512, 44100.0);
//! let mut engine = Engine::new("main", Box::new(patch), 512, 44100.0)?;
//! let mut rendered = render(&mut engine, None, 2.0)?;
//! rendered.normalize();
//! write_wav("out.wav", &rendered.samples, rendered.spec(32))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod feeder;
mod render;
mod stream;
mod wav;

pub use feeder::BlockFeeder;
pub use render::{Rendered, render, render_with_progress};
pub use stream::{AudioStream, list_output_devices};
pub use wav::{WavSpec, read_wav, write_wav};

/// Error types for audio output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The root module has a channel count that cannot be rendered.
    #[error("Cannot render {0} channels (expected 1 or 2)")]
    UnsupportedChannels(usize),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio output operations.
pub type Result<T> = std::result::Result<T, Error>;
