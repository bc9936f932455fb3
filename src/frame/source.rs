use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use super::RawFrame;

/// Outcome of asking a source for its next frame.
pub enum Fetch {
    Frame(RawFrame),
    /// No frame ready yet; the caller should idle-wait and retry.
    Pending,
    /// End of stream; the session is over.
    Eos,
}

pub trait FrameSource: Send {
    fn fetch(&mut self) -> Result<Fetch>;
}

/// A still image, decoded once; yields its frame a single time.
pub struct ImageSource {
    frame: Option<RawFrame>,
}

impl ImageSource {
    pub fn open(path: &Path) -> Result<Self> {
        let decoded = image::open(path)
            .with_context(|| format!("Failed to decode image: {}", path.display()))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        log::info!("Loaded image: {} ({}x{})", path.display(), width, height);
        Ok(Self {
            frame: Some(RawFrame {
                width,
                height,
                data: decoded.into_raw(),
            }),
        })
    }
}

impl FrameSource for ImageSource {
    fn fetch(&mut self) -> Result<Fetch> {
        Ok(match self.frame.take() {
            Some(frame) => Fetch::Frame(frame),
            None => Fetch::Eos,
        })
    }
}

/// Video frames read from an ffmpeg child process as raw rgb24.
pub struct VideoSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height",
            "-of", "json",
        ])
        .arg(path)
        .output()
        .context("Failed to run ffprobe. Is ffmpeg installed?")?;

    if !output.status.success() {
        bail!(
            "ffprobe failed for {}:\n{}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let probe: ProbeOutput =
        serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;
    let stream = probe
        .streams
        .iter()
        .find_map(|s| s.width.zip(s.height))
        .context("No video stream found")?;

    Ok(stream)
}

impl VideoSource {
    pub fn open(path: &Path) -> Result<Self> {
        let (width, height) = probe_dimensions(path)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        let stdout = child.stdout.take().context("ffmpeg stdout not available")?;

        log::info!("Video decoder started: {} ({}x{})", path.display(), width, height);

        Ok(Self { child, stdout, width, height })
    }
}

impl FrameSource for VideoSource {
    fn fetch(&mut self) -> Result<Fetch> {
        let mut data = vec![0u8; self.width as usize * self.height as usize * 3];
        match self.stdout.read_exact(&mut data) {
            Ok(()) => Ok(Fetch::Frame(RawFrame {
                width: self.width,
                height: self.height,
                data,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(Fetch::Eos),
            Err(e) => Err(e).context("Failed to read frame from ffmpeg"),
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_source_yields_frame_once() {
        let mut source = ImageSource {
            frame: Some(RawFrame { width: 2, height: 2, data: vec![0; 12] }),
        };
        assert!(matches!(source.fetch().unwrap(), Fetch::Frame(_)));
        assert!(matches!(source.fetch().unwrap(), Fetch::Eos));
    }

    #[test]
    fn probe_output_parses_ffprobe_json() {
        let json = r#"{"programs": [], "streams": [{"width": 1280, "height": 720}]}"#;
        let probe: ProbeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.streams[0].width, Some(1280));
        assert_eq!(probe.streams[0].height, Some(720));
    }
}
