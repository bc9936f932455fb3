use anyhow::{Context, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::f64::consts::TAU;
use std::sync::OnceLock;

/// Descriptor for the PCM stream handed to a sink: signed 8-bit mono.
#[derive(Clone, Copy, Debug)]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: u16,
}

impl PcmSpec {
    pub fn mono8(sample_rate: u32) -> Self {
        Self { sample_rate, bits_per_sample: 8, channels: 1 }
    }
}

pub trait AudioSink {
    /// Blocking write: returns only once the buffer has fully drained, so
    /// consecutive one-second waveforms cannot overlap.
    fn play(&mut self, spec: PcmSpec, samples: &[i8]) -> Result<()>;

    /// Fire-and-forget playback for the short click cue.
    fn play_cue(&mut self, spec: PcmSpec, samples: &[i8]) -> Result<()>;
}

/// The platform audio output device, via rodio.
pub struct DeviceSink {
    // Held so the device stream outlives the handle.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl DeviceSink {
    pub fn open(volume: f32) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("No audio output device available")?;
        Ok(Self { _stream: stream, handle, volume })
    }

    fn buffer(spec: PcmSpec, samples: &[i8]) -> SamplesBuffer<f32> {
        let scaled: Vec<f32> = samples.iter().map(|&s| s as f32 / 127.0).collect();
        SamplesBuffer::new(spec.channels, spec.sample_rate, scaled)
    }
}

impl AudioSink for DeviceSink {
    fn play(&mut self, spec: PcmSpec, samples: &[i8]) -> Result<()> {
        let sink = Sink::try_new(&self.handle).context("Failed to acquire audio sink")?;
        sink.set_volume(self.volume);
        sink.append(Self::buffer(spec, samples));
        sink.sleep_until_end();
        Ok(())
    }

    fn play_cue(&mut self, spec: PcmSpec, samples: &[i8]) -> Result<()> {
        let sink = Sink::try_new(&self.handle).context("Failed to acquire audio sink")?;
        sink.set_volume(self.volume);
        sink.append(Self::buffer(spec, samples));
        sink.detach();
        Ok(())
    }
}

const CLICK_FREQUENCY_HZ: f64 = 2_000.0;
const CLICK_DURATION: f64 = 0.03;
const CLICK_DECAY: f64 = 120.0;

static CLICK: OnceLock<Vec<i8>> = OnceLock::new();

/// The per-cycle click cue: a short decaying sine, synthesized once and
/// held read-only for the life of the process. The first caller's sample
/// rate fixes the clip; every session uses the configured rate, so they
/// agree in practice.
pub fn click_clip(sample_rate: f64) -> &'static [i8] {
    CLICK.get_or_init(|| {
        let total = (sample_rate * CLICK_DURATION).round() as usize;
        (0..total)
            .map(|i| {
                let t = i as f64 / sample_rate;
                let envelope = (-t * CLICK_DECAY).exp();
                ((TAU * CLICK_FREQUENCY_HZ * t).sin() * envelope * 100.0).round() as i8
            })
            .collect()
    })
}
