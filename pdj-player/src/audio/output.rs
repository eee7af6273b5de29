//! Audio output using cpal
//!
//! The playback engine renders through the [`SampleSink`] trait so it has
//! no dependency on any particular output mechanism. [`CpalOutput`] is the
//! production sink: a lock-free ring buffer feeding a cpal device stream on
//! a dedicated thread. [`NullSink`] discards samples for headless operation
//! and tests.

use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Destination for rendered samples.
///
/// Implementations are shared between the engine's render task and the
/// consumer side, so all methods take `&self`.
pub trait SampleSink: Send + Sync {
    /// Sample rate pushed samples must be at
    fn sample_rate(&self) -> u32;

    /// Push interleaved stereo samples; returns the number of samples
    /// accepted. Zero means the sink is full and the caller should back
    /// off briefly.
    fn push(&self, samples: &[f32]) -> usize;

    /// Discard queued, not-yet-played samples
    fn clear(&self);
}

/// Sink that discards everything it is given.
///
/// Used when no audio device is available and by tests; playback timing is
/// wall-clock driven, so the transport behaves identically.
pub struct NullSink {
    sample_rate: u32,
    pushed: AtomicUsize,
}

impl NullSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            pushed: AtomicUsize::new(0),
        }
    }

    /// Total samples accepted since creation
    pub fn pushed_samples(&self) -> usize {
        self.pushed.load(Ordering::Relaxed)
    }
}

impl SampleSink for NullSink {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn push(&self, samples: &[f32]) -> usize {
        self.pushed.fetch_add(samples.len(), Ordering::Relaxed);
        samples.len()
    }

    fn clear(&self) {}
}

/// Audio device output behind a ring buffer.
///
/// The cpal stream lives on its own thread (streams are not `Send`); the
/// engine pushes into the producer side and the device callback drains the
/// consumer side, applying master volume per sample.
pub struct CpalOutput {
    producer: Mutex<HeapProd<f32>>,
    sample_rate: u32,
    flush: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalOutput {
    /// Open the output device (None = system default) and start the stream.
    ///
    /// `volume` is the shared master volume, applied in the device
    /// callback. Falls back to the default device when the requested one is
    /// missing.
    pub fn new(device_name: Option<String>, volume: Arc<Mutex<f32>>) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name.as_deref() {
            Some(name) => {
                let mut devices = host.output_devices().map_err(|e| {
                    Error::AudioOutput(format!("failed to enumerate devices: {}", e))
                })?;
                match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                    Some(dev) => {
                        info!("found requested audio device: {}", name);
                        dev
                    }
                    None => {
                        warn!("device '{}' not found, falling back to default", name);
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("no default output device".to_string()))?,
        };

        info!(
            "using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = Self::best_config(&device)?;
        let sample_rate = config.sample_rate.0;

        // One second of stereo headroom between renderer and callback
        let ring = HeapRb::<f32>::new(sample_rate as usize * 2);
        let (producer, consumer) = ring.split();

        let flush = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));

        let (init_tx, init_rx) = mpsc::channel::<std::result::Result<(), String>>();
        let thread = std::thread::spawn({
            let flush = Arc::clone(&flush);
            let shutdown = Arc::clone(&shutdown);
            move || {
                Self::stream_thread(device, config, consumer, volume, flush, shutdown, init_tx);
            }
        });

        match init_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::AudioOutput(e)),
            Err(_) => {
                return Err(Error::AudioOutput(
                    "audio thread exited during initialization".to_string(),
                ))
            }
        }

        Ok(Self {
            producer: Mutex::new(producer),
            sample_rate,
            flush,
            shutdown,
            thread: Some(thread),
        })
    }

    /// Pick a stereo f32 config, preferring the working 44.1kHz rate
    fn best_config(device: &cpal::Device) -> Result<StreamConfig> {
        let mut supported = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("failed to get device configs: {}", e)))?;

        let preferred = supported.find(|c| {
            c.channels() == 2
                && c.sample_format() == SampleFormat::F32
                && c.min_sample_rate().0 <= 44100
                && c.max_sample_rate().0 >= 44100
        });

        if let Some(config) = preferred {
            return Ok(config.with_sample_rate(cpal::SampleRate(44100)).config());
        }

        let default = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("failed to get default config: {}", e)))?;

        if default.sample_format() != SampleFormat::F32 || default.channels() != 2 {
            return Err(Error::AudioOutput(format!(
                "unsupported device format: {:?} {}ch",
                default.sample_format(),
                default.channels()
            )));
        }

        Ok(default.config())
    }

    /// Owns the cpal stream for its whole lifetime
    fn stream_thread(
        device: cpal::Device,
        config: StreamConfig,
        consumer: HeapCons<f32>,
        volume: Arc<Mutex<f32>>,
        flush: Arc<AtomicBool>,
        shutdown: Arc<AtomicBool>,
        init_tx: mpsc::Sender<std::result::Result<(), String>>,
    ) {
        let consumer = Mutex::new(consumer);

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                let mut cons = match consumer.lock() {
                    Ok(cons) => cons,
                    Err(_) => {
                        data.fill(0.0);
                        return;
                    }
                };

                if flush.swap(false, Ordering::AcqRel) {
                    while cons.try_pop().is_some() {}
                }

                let gain = volume.lock().map(|v| *v).unwrap_or(1.0);
                let popped = cons.pop_slice(data);
                for sample in &mut data[..popped] {
                    *sample *= gain;
                }
                // Underrun: pad with silence
                data[popped..].fill(0.0);
            },
            |e| warn!("audio stream error: {}", e),
            None,
        );

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                let _ = init_tx.send(Err(format!("failed to build stream: {}", e)));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = init_tx.send(Err(format!("failed to start stream: {}", e)));
            return;
        }

        let _ = init_tx.send(Ok(()));
        debug!("audio stream running at {} Hz", config.sample_rate.0);

        while !shutdown.load(Ordering::Acquire) {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        // Stream drops here, on the thread that built it
    }
}

impl SampleSink for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn push(&self, samples: &[f32]) -> usize {
        match self.producer.lock() {
            Ok(mut producer) => producer.push_slice(samples),
            Err(_) => 0,
        }
    }

    fn clear(&self) {
        self.flush.store(true, Ordering::Release);
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
