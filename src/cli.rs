use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::media::MediaKind;

#[derive(Parser, Debug)]
#[command(name = "sonopix", about = "Plays images and video frames as sound")]
pub struct Cli {
    /// Input image (PNG, JPG, JPEG) or video (MP4, AVI, M4V) file
    pub input: Option<PathBuf>,

    /// Media kind; inferred from the file extension when omitted
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Output volume (0.0-1.0)
    #[arg(long, default_value_t = 1.0)]
    pub volume: f32,

    /// Start playing immediately instead of paused
    #[arg(long)]
    pub autoplay: bool,

    /// Disable the per-cycle click cue
    #[arg(long)]
    pub no_click: bool,

    /// Print the reduced 64x64 frame as ASCII each cycle
    #[arg(long)]
    pub show_grid: bool,

    /// Print the per-column frequency log each cycle
    #[arg(long)]
    pub show_frequencies: bool,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Image,
    Video,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => MediaKind::Image,
            KindArg::Video => MediaKind::Video,
        }
    }
}
