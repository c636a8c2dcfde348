use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cpal::{
    OutputCallbackInfo, Sample, SampleRate,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use rtrb::{Consumer, Producer, RingBuffer};
use transport::{clock::SampleClock, timecode::seconds_to_frame};

use crate::{
    buffer::SampleBuffer,
    output::{AudioOutput, OutputError, SoundingSource, resample::resample},
};

/// Requests sent from the control side to the render callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderCommand {
    Halt,
}

/// Plays buffers on the default output device.
///
/// The device is opened on the first `start` and released by `close` (or
/// drop). Every rendered frame advances the shared [`SampleClock`], which
/// the playback controller can use as its time source. A device that cannot
/// run at the buffer's rate gets a copy resampled to its own rate, and the
/// clock advance is scaled back to the clock's rate.
pub struct CpalOutput {
    device: Option<cpal::Device>,
    clock: SampleClock,
}

impl CpalOutput {
    pub fn new(clock: SampleClock) -> Self {
        Self {
            device: None,
            clock,
        }
    }

    pub fn clock(&self) -> &SampleClock {
        &self.clock
    }

    fn device(&mut self) -> Result<&cpal::Device, OutputError> {
        if self.device.is_none() {
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or(OutputError::DeviceNotFound)?;
            log::info!(
                "opened output device {}",
                device.name().unwrap_or_else(|_| "<unnamed>".to_owned())
            );
            self.device = Some(device);
        }
        self.device.as_ref().ok_or(OutputError::DeviceNotFound)
    }

    /// Prefers a device config running at the buffer's own rate so frames map 1:1.
    fn stream_config(
        device: &cpal::Device,
        sample_rate: u32,
    ) -> Result<cpal::SupportedStreamConfig, OutputError> {
        let matching = device
            .supported_output_configs()
            .map_err(|e| OutputError::StreamBuildFailed(e.to_string()))?
            .find(|range| {
                range.min_sample_rate().0 <= sample_rate && range.max_sample_rate().0 >= sample_rate
            })
            .map(|range| range.with_sample_rate(SampleRate(sample_rate)));

        match matching {
            Some(config) => Ok(config),
            None => {
                let config = device
                    .default_output_config()
                    .map_err(|e| OutputError::StreamBuildFailed(e.to_string()))?;
                log::warn!(
                    "device cannot run at {sample_rate} Hz, resampling to {} Hz",
                    config.sample_rate().0
                );
                Ok(config)
            }
        }
    }

    fn build_output_stream<T>(
        device: &cpal::Device,
        config: &cpal::SupportedStreamConfig,
        mut renderer: Renderer,
    ) -> Result<cpal::Stream, OutputError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let error_cb = move |err| {
            log::warn!("output stream error: {err}");
        };

        let data_cb = move |data: &mut [T], _: &OutputCallbackInfo| {
            renderer.render(data);
        };

        device
            .build_output_stream(&config.config(), data_cb, error_cb, None)
            .map_err(|e| OutputError::StreamBuildFailed(e.to_string()))
    }
}

impl AudioOutput for CpalOutput {
    fn start(
        &mut self,
        buffer: &SampleBuffer,
        offset_seconds: f64,
    ) -> Result<Box<dyn SoundingSource>, OutputError> {
        let clock = self.clock.clone();
        let device = self.device()?;
        let config = Self::stream_config(device, buffer.sample_rate())?;

        let device_rate = config.sample_rate().0;
        let buffer = resample(buffer, device_rate)?;

        let (producer, consumer) = RingBuffer::new(8);
        let mut renderer = Renderer::new(buffer, usize::from(config.channels()), consumer, clock);
        renderer.cursor = seconds_to_frame(offset_seconds, device_rate) as usize;
        let finished = Arc::clone(&renderer.finished);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_output_stream::<f32>(device, &config, renderer)?,
            cpal::SampleFormat::I16 => Self::build_output_stream::<i16>(device, &config, renderer)?,
            cpal::SampleFormat::U16 => Self::build_output_stream::<u16>(device, &config, renderer)?,
            format => {
                return Err(OutputError::StreamBuildFailed(format!(
                    "Unsupported sample format '{format}'"
                )));
            }
        };

        stream
            .play()
            .map_err(|e| OutputError::StreamStartFailed(e.to_string()))?;

        Ok(Box::new(CpalSource {
            stream: Some(stream),
            commands: producer,
            finished,
        }))
    }

    fn close(&mut self) {
        if self.device.take().is_some() {
            log::debug!("released output device");
        }
    }
}

impl Drop for CpalOutput {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle to one playing stream.
struct CpalSource {
    stream: Option<cpal::Stream>,
    commands: Producer<RenderCommand>,
    finished: Arc<AtomicBool>,
}

impl SoundingSource for CpalSource {
    fn stop(&mut self) -> Result<(), OutputError> {
        let Some(stream) = self.stream.take() else {
            return Err(OutputError::AlreadyStopped);
        };

        // Silence the callback first; dropping the stream then tears it down.
        let _ = self.commands.push(RenderCommand::Halt);
        let _ = stream.pause();
        drop(stream);

        if self.finished.load(Ordering::Acquire) {
            Err(OutputError::AlreadyStopped)
        } else {
            Ok(())
        }
    }
}

/// State owned by the render callback.
struct Renderer {
    buffer: SampleBuffer,
    cursor: usize,
    device_channels: usize,
    commands: Consumer<RenderCommand>,
    finished: Arc<AtomicBool>,
    clock: SampleClock,
    /// Clock frames per rendered frame.
    clock_ratio: f64,
    clock_remainder: f64,
    halted: bool,
}

impl Renderer {
    fn new(
        buffer: SampleBuffer,
        device_channels: usize,
        commands: Consumer<RenderCommand>,
        clock: SampleClock,
    ) -> Self {
        let clock_ratio = clock.sample_rate() / f64::from(buffer.sample_rate());
        Self {
            buffer,
            cursor: 0,
            device_channels,
            commands,
            finished: Arc::new(AtomicBool::new(false)),
            clock,
            clock_ratio,
            clock_remainder: 0.0,
            halted: false,
        }
    }

    fn render<T>(&mut self, data: &mut [T])
    where
        T: cpal::Sample + cpal::FromSample<f32>,
    {
        while let Ok(cmd) = self.commands.pop() {
            match cmd {
                RenderCommand::Halt => self.halted = true,
            }
        }

        let frame_count = data.len() / self.device_channels.max(1);
        for (i, frame) in data.chunks_mut(self.device_channels.max(1)).enumerate() {
            for (channel, sample) in frame.iter_mut().enumerate() {
                let value = if self.halted {
                    0.0
                } else {
                    self.source_sample(self.cursor + i, channel)
                };
                *sample = value.to_sample::<T>();
            }
        }

        if self.halted {
            return;
        }

        self.cursor += frame_count;
        // Keeps running past the end so the controller can observe the trim end.
        self.advance_clock(frame_count);
        if self.cursor >= self.buffer.frame_count() {
            self.finished.store(true, Ordering::Release);
        }
    }

    fn advance_clock(&mut self, rendered: usize) {
        let exact = (rendered as f64).mul_add(self.clock_ratio, self.clock_remainder);
        let whole = exact.floor();
        self.clock_remainder = exact - whole;
        self.clock.advance_by(whole as u64);
    }

    /// Mono sources feed every device channel; surplus device channels stay silent.
    fn source_sample(&self, frame: usize, device_channel: usize) -> f32 {
        let source_channel = if self.buffer.channel_count() == 1 {
            0
        } else {
            device_channel
        };
        self.buffer
            .channel(source_channel)
            .and_then(|c| c.get(frame))
            .copied()
            .unwrap_or(0.0)
    }
}
