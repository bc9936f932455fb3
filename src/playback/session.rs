use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::sink::{click_clip, AudioSink, DeviceSink, PcmSpec};
use super::CycleError;
use crate::display::DisplaySink;
use crate::frame::{self, Fetch, FrameSource, ImageSource, LuminanceGrid, RawFrame, VideoSource};
use crate::media::MediaKind;
use crate::synth;

/// Builds the worker's audio sink. Called lazily inside the worker thread,
/// so a missing output device skips cycles instead of killing the session,
/// and the device handle never crosses threads.
pub type SinkFactory = Box<dyn FnMut() -> Result<Box<dyn AudioSink>> + Send>;

#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub sample_rate: f64,
    /// Fire the click cue once per sonification cycle.
    pub click: bool,
    /// Cadence between image-session cycles.
    pub tick: Duration,
    /// Idle wait while paused or when no frame is ready.
    pub idle_wait: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            sample_rate: synth::SAMPLE_RATE,
            click: true,
            tick: Duration::from_secs(1),
            idle_wait: Duration::from_millis(100),
        }
    }
}

/// One live media source with its worker. Sessions start paused.
///
/// The pause flag is the only state shared with the controlling thread;
/// the worker observes it at cycle boundaries only. Dropping the
/// cancellation sender wakes any idle wait, and `stop` joins the worker so
/// the audio device and frame source are fully released before it returns.
pub struct Session {
    paused: Arc<AtomicBool>,
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    pub fn spawn(
        kind: MediaKind,
        source: Box<dyn FrameSource>,
        sink_factory: SinkFactory,
        display: Arc<dyn DisplaySink>,
        options: SessionOptions,
    ) -> Self {
        let paused = Arc::new(AtomicBool::new(true));
        let (cancel_tx, cancel_rx) = bounded::<()>(0);
        let worker_paused = Arc::clone(&paused);

        let worker = thread::spawn(move || {
            let mut worker = Worker {
                source,
                sink_factory,
                sink: None,
                display,
                paused: worker_paused,
                cancel: cancel_rx,
                options,
            };
            match kind {
                MediaKind::Image => worker.run_image(),
                MediaKind::Video => worker.run_video(),
            }
            log::info!("playback worker exited");
        });

        Session {
            paused,
            cancel: Some(cancel_tx),
            worker: Some(worker),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Flip the pause flag; returns the new paused state.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    /// Cancel the worker and block until it has fully exited.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.cancel.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("playback worker panicked");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Classify reduction failures: a frame with no pixels is a source
/// problem; anything the reducer itself rejects is a stage failure.
fn reduce_stage(frame: &RawFrame) -> Result<LuminanceGrid, CycleError> {
    if frame.width == 0 || frame.height == 0 || frame.data.is_empty() {
        return Err(CycleError::SourceUnreadable(anyhow!("empty frame")));
    }
    frame::reduce(frame).map_err(CycleError::Stage)
}

struct Worker {
    source: Box<dyn FrameSource>,
    sink_factory: SinkFactory,
    sink: Option<Box<dyn AudioSink>>,
    display: Arc<dyn DisplaySink>,
    paused: Arc<AtomicBool>,
    cancel: Receiver<()>,
    options: SessionOptions,
}

impl Worker {
    /// Cancellable sleep; true when the session was cancelled.
    fn wait(&self, timeout: Duration) -> bool {
        !matches!(self.cancel.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }

    fn cancelled(&self) -> bool {
        !matches!(self.cancel.try_recv(), Err(TryRecvError::Empty))
    }

    fn run_image(&mut self) {
        // The source image is static, so the reduced grid is computed once
        // and reused every tick.
        let mut cache: Option<LuminanceGrid> = None;
        loop {
            if self.cancelled() {
                break;
            }
            if !self.paused.load(Ordering::SeqCst) {
                if let Err(err) = self.image_cycle(&mut cache) {
                    log::warn!("cycle skipped: {err}");
                }
            }
            if self.wait(self.options.tick) {
                break;
            }
        }
    }

    fn run_video(&mut self) {
        loop {
            if self.cancelled() {
                break;
            }
            if self.paused.load(Ordering::SeqCst) {
                if self.wait(self.options.idle_wait) {
                    break;
                }
                continue;
            }
            match self.source.fetch() {
                Ok(Fetch::Frame(frame)) => {
                    if let Err(err) = self.video_cycle(&frame) {
                        log::warn!("cycle skipped: {err}");
                    }
                }
                Ok(Fetch::Pending) => {
                    if self.wait(self.options.idle_wait) {
                        break;
                    }
                }
                Ok(Fetch::Eos) => {
                    log::info!("end of stream");
                    break;
                }
                Err(err) => {
                    log::error!("video decode failed: {err:#}");
                    break;
                }
            }
        }
    }

    fn image_cycle(&mut self, cache: &mut Option<LuminanceGrid>) -> Result<(), CycleError> {
        let grid = match cache {
            Some(grid) => grid,
            None => {
                let frame = match self.source.fetch().map_err(CycleError::SourceUnreadable)? {
                    Fetch::Frame(frame) => frame,
                    Fetch::Pending | Fetch::Eos => {
                        return Err(CycleError::SourceUnreadable(anyhow!(
                            "image source yielded no frame"
                        )))
                    }
                };
                let grid = reduce_stage(&frame)?;
                self.display.show_grid(&grid);
                cache.insert(grid)
            }
        };
        self.sonify(grid)
    }

    fn video_cycle(&mut self, frame: &RawFrame) -> Result<(), CycleError> {
        let grid = reduce_stage(frame)?;
        self.display.show_grid(&grid);
        self.sonify(&grid)
    }

    /// One sonification cycle: mix the grid into a one-second waveform,
    /// publish the frequency log, play it to full drain, then fire the cue.
    fn sonify(&mut self, grid: &LuminanceGrid) -> Result<(), CycleError> {
        let (waveform, frequencies) = synth::sequence(grid, self.options.sample_rate);
        self.display.show_frequencies(&frequencies);

        let spec = PcmSpec::mono8(self.options.sample_rate as u32);
        if self.sink.is_none() {
            let sink = (self.sink_factory)().map_err(CycleError::SinkUnavailable)?;
            self.sink = Some(sink);
        }
        if let Some(sink) = self.sink.as_mut() {
            match sink.play(spec, &waveform) {
                Ok(()) => {
                    if self.options.click {
                        // Cue failure must not affect the main cycle.
                        if let Err(err) = sink.play_cue(spec, click_clip(self.options.sample_rate)) {
                            log::debug!("click cue failed: {err:#}");
                        }
                    }
                }
                Err(err) => {
                    // Reacquire the device on the next cycle.
                    self.sink = None;
                    return Err(CycleError::SinkUnavailable(err));
                }
            }
        }
        Ok(())
    }
}

/// Owns the single active session; opening a new source stops and joins
/// the previous worker first, so two sessions never write to the audio
/// sink concurrently.
pub struct Player {
    session: Option<Session>,
    display: Arc<dyn DisplaySink>,
    volume: f32,
    options: SessionOptions,
}

impl Player {
    pub fn new(display: Arc<dyn DisplaySink>, volume: f32, options: SessionOptions) -> Self {
        Self { session: None, display, volume, options }
    }

    pub fn open(&mut self, path: &Path, kind: MediaKind) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.stop();
        }

        let source: Box<dyn FrameSource> = match kind {
            MediaKind::Image => Box::new(ImageSource::open(path)?),
            MediaKind::Video => Box::new(VideoSource::open(path)?),
        };

        let volume = self.volume;
        let factory: SinkFactory = Box::new(move || {
            DeviceSink::open(volume).map(|sink| Box::new(sink) as Box<dyn AudioSink>)
        });

        self.session = Some(Session::spawn(
            kind,
            source,
            factory,
            Arc::clone(&self.display),
            self.options,
        ));
        log::info!("Session started: {} ({:?})", path.display(), kind);
        Ok(())
    }

    /// New paused state, or None when no session is active.
    pub fn toggle_pause(&self) -> Option<bool> {
        self.session.as_ref().map(Session::toggle_pause)
    }

    pub fn is_paused(&self) -> bool {
        self.session.as_ref().map_or(true, Session::is_paused)
    }

    pub fn set_paused(&self, paused: bool) {
        if let Some(session) = &self.session {
            session.set_paused(paused);
        }
    }

    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }
}
