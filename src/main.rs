mod cli;
mod config;
mod display;
mod frame;
mod media;
mod playback;
mod synth;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use cli::Cli;
use display::ConsoleDisplay;
use media::MediaKind;
use playback::{Player, SessionOptions};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();
    let mut sample_rate = 44_100u32;

    // Load config: explicit --config path, or auto-detect sonopix.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("sonopix.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("sonopix").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("sonopix").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            sample_rate = cfg.audio.sample_rate;
            if cli.volume == 1.0 {
                cli.volume = cfg.audio.volume;
            }
            if !cli.no_click {
                cli.no_click = !cfg.audio.click;
            }
            if !cli.show_grid {
                cli.show_grid = cfg.display.show_grid;
            }
            if !cli.show_frequencies {
                cli.show_frequencies = cfg.display.show_frequencies;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.as_ref().context("Input media file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let kind = match cli.kind {
        Some(arg) => MediaKind::from(arg),
        None => MediaKind::detect(input)
            .context("Cannot infer media kind from the file extension; pass --kind")?,
    };
    media::validate(input, kind)?;

    log::info!("sonopix - image and video sonifier");
    log::info!("Input: {} ({:?})", input.display(), kind);
    log::info!("Sample rate: {}Hz, volume: {:.2}", sample_rate, cli.volume);

    let options = SessionOptions {
        sample_rate: sample_rate as f64,
        click: !cli.no_click,
        ..Default::default()
    };
    let display = Arc::new(ConsoleDisplay::new(cli.show_grid, cli.show_frequencies));
    let mut player = Player::new(display, cli.volume, options);

    player.open(input, kind)?;
    if cli.autoplay {
        player.set_paused(false);
    }
    if player.is_paused() {
        println!("Session is paused; press p to play.");
    }

    println!("Commands: p = play/pause, o <path> = open file, q = quit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let command = line.trim();
        if command == "q" {
            break;
        } else if command == "p" {
            match player.toggle_pause() {
                Some(true) => println!("Paused."),
                Some(false) => println!("Playing."),
                None => println!("No active session."),
            }
        } else if let Some(rest) = command.strip_prefix("o ") {
            let path = PathBuf::from(rest.trim());
            if let Err(err) = open_file(&mut player, &path) {
                log::error!("Cannot open {}: {err:#}", path.display());
            }
        } else if !command.is_empty() {
            println!("Unknown command: {command}");
        }
    }

    player.stop();
    Ok(())
}

fn open_file(player: &mut Player, path: &PathBuf) -> Result<()> {
    let kind = MediaKind::detect(path)
        .context("Cannot infer media kind from the file extension")?;
    media::validate(path, kind)?;
    player.open(path, kind)?;
    println!("Opened {} ({:?}); press p to play.", path.display(), kind);
    Ok(())
}
