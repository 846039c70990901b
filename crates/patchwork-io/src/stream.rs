//! Real-time audio output via cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::{Error, Result};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Names of every output device on the default host.
pub fn list_output_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    Ok(devices.filter_map(|d| device_name(&d).ok()).collect())
}

/// Output-only audio stream.
///
/// The stream keeps running until [`stop()`](Self::stop) is called or the
/// flag returned by [`stop_handle()`](Self::stop_handle) is cleared.
pub struct AudioStream {
    output_device: Device,
    config: cpal::StreamConfig,
    running: Arc<AtomicBool>,
    _output_stream: Option<Stream>,
}

impl AudioStream {
    /// Opens `output_device` (index, exact name or partial name; the default
    /// device when `None`) at `sample_rate`.
    pub fn new(output_device: Option<&str>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();
        let output_device = match output_device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };

        let channels = output_device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2);
        let config = cpal::StreamConfig {
            channels,
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        tracing::info!(
            device = %device_name(&output_device).unwrap_or_default(),
            channels,
            sample_rate,
            "opened output device"
        );

        Ok(Self {
            output_device,
            config,
            running: Arc::new(AtomicBool::new(true)),
            _output_stream: None,
        })
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Output channel count.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Flag that keeps the stream alive; store `false` to stop it.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Stops the stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the stream has not been stopped yet.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Plays the stream, calling `generate` for every interleaved device
    /// buffer. Blocks until the stream is stopped.
    pub fn run_output<F>(&mut self, mut generate: F) -> Result<()>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        let output_running = Arc::clone(&self.running);
        let output_stream = self
            .output_device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if output_running.load(Ordering::SeqCst) {
                        generate(data);
                    } else {
                        data.fill(0.0);
                    }
                },
                |err| tracing::error!("output stream error: {err}"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        self._output_stream = Some(output_stream);

        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
        self._output_stream = None;
        tracing::info!("output stream stopped");
        Ok(())
    }
}

fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<_> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<Option<String>> = devices.iter().map(|d| device_name(d).ok()).collect();
    let index = select_device(&names, name_or_index)?;
    devices
        .get(index)
        .cloned()
        .ok_or_else(|| Error::DeviceNotFound(name_or_index.to_string()))
}

/// Picks a device by index, exact name, or case-insensitive partial match.
fn select_device(names: &[Option<String>], name_or_index: &str) -> Result<usize> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                names.len()
            )))
        };
    }

    if let Some(index) = names
        .iter()
        .position(|name| name.as_deref() == Some(name_or_index))
    {
        return Ok(index);
    }

    let search_lower = name_or_index.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            name.as_ref()
                .is_some_and(|n| n.to_lowercase().contains(&search_lower))
        })
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            name_or_index
        ))),
        [index] => Ok(*index),
        [first, ..] => {
            tracing::warn!(
                "'{}' matches {} output devices, using the first",
                name_or_index,
                matches.len()
            );
            Ok(*first)
        }
    }
}
