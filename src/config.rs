use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_click")]
    pub click: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub show_grid: bool,
    #[serde(default)]
    pub show_frequencies: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            volume: default_volume(),
            click: default_click(),
        }
    }
}

fn default_sample_rate() -> u32 { 44_100 }
fn default_volume() -> f32 { 1.0 }
fn default_click() -> bool { true }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
