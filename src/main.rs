use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Duration;
use termreel::{Player, PlayerConfig, RenderMode};

fn load_config(explicit: Option<&PathBuf>) -> Result<Player> {
    if let Some(path) = explicit {
        return Player::from_config_file(path).with_context(|| format!("loading config {}", path.display()));
    }

    // Look for termreel.json in app support, current dir fallback, then built-in default
    let mut tried: Vec<PathBuf> = Vec::new();
    if let Some(mut d) = dirs::data_dir() {
        d.push("termreel");
        d.push("termreel.json");
        tried.push(d);
    }
    tried.push(PathBuf::from("termreel.json"));

    for p in &tried {
        if p.exists() {
            debug!("using config {}", p.display());
            return Player::from_config_file(p).with_context(|| format!("loading config {}", p.display()));
        }
    }

    Ok(Player::with_config(PlayerConfig::default())?)
}

#[derive(Parser, Debug)]
#[command(version, about = "Play a directory of image frames as block-character video in the terminal.")]
struct Args {
    /// Directory of numbered image frames (1.jpg, 2.jpg, ...)
    frames_dir: Option<PathBuf>,

    /// Audio file to play alongside the frames
    audio: Option<PathBuf>,

    /// Delay in milliseconds between starting audio and drawing the first frame
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// How many decoded frames may be buffered ahead of the screen
    #[arg(long)]
    bufsize: Option<usize>,

    /// Display rate in frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Clear and redraw the whole screen every frame instead of only changed cells
    #[arg(long, default_value_t = false)]
    full_redraw: bool,

    /// Seconds to wait for a frame before giving up (0 waits forever)
    #[arg(long)]
    stall_timeout: Option<u64>,

    /// Path to a termreel.json configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the frames.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    let (frames_dir, audio) = match (&args.frames_dir, &args.audio) {
        (Some(frames), Some(audio)) => (frames.clone(), audio.clone()),
        _ => {
            Args::command().print_help()?;
            return Ok(());
        }
    };

    let player = load_config(args.config.as_ref())?;

    let mut options = player.options().with_delay(Duration::from_millis(args.delay));
    if let Some(bufsize) = args.bufsize {
        options = options.with_bufsize(bufsize);
    }
    if let Some(fps) = args.fps {
        options = options.with_fps(fps);
    }
    if args.full_redraw {
        options = options.with_render_mode(RenderMode::Full);
    }
    if let Some(secs) = args.stall_timeout {
        options = options.with_stall_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }
    info!("playback options: {:?}", options);

    let summary = player
        .play(&frames_dir, &audio, &options)
        .with_context(|| format!("playing {}", frames_dir.display()))?;

    println!(
        "Played {} frames in {:.1}s ({:.1} fps, {} starved ticks)",
        summary.frames,
        summary.elapsed.as_secs_f64(),
        summary.effective_fps(),
        summary.starved_ticks
    );
    Ok(())
}
