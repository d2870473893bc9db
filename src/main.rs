//! ringmix test harness
//!
//! Loads one WAV file and plays it repeatedly on a schedule, either to the
//! default audio device (feature `streaming`) or offline into a WAV file.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use ringmix::{Mixer, MixerConfig, WavRenderer};
use tracing_subscriber::EnvFilter;

/// Pauses (seconds) between plays when no schedule is given
const DEFAULT_SCHEDULE: &str = "3,2,1,2,3,1,2";

#[derive(Parser, Debug)]
#[command(name = "ringmix", version, about = "Schedule overlapping plays of a WAV file")]
struct Args {
    /// WAV file to play (16-bit PCM matching the stream format)
    file: PathBuf,

    /// JSON mixer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Suggested output latency in seconds (overrides the config)
    #[arg(long)]
    latency: Option<f32>,

    /// Seconds to wait after each play, comma separated
    #[arg(long, value_delimiter = ',', default_value = DEFAULT_SCHEDULE)]
    schedule: Vec<f32>,

    /// Render offline into this WAV file instead of the audio device
    #[arg(long)]
    render: Option<PathBuf>,
}

fn load_config(args: &Args) -> anyhow::Result<MixerConfig> {
    let mut config = match &args.config {
        Some(path) => MixerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => MixerConfig::default(),
    };
    if let Some(latency) = args.latency {
        config.stream.suggested_latency = latency;
    }
    config.validate()?;
    Ok(config)
}

fn run_offline(args: &Args, config: MixerConfig, out: &Path) -> anyhow::Result<()> {
    let mixer = Mixer::new(config)?;
    let sound = mixer
        .load(&args.file)
        .with_context(|| format!("Failed to load '{}'", args.file.display()))?;

    let stream = config.stream;
    let mut renderer = WavRenderer::create(out, mixer.drain(), &stream)
        .with_context(|| format!("Failed to create '{}'", out.display()))?;

    for &pause in &args.schedule {
        mixer.play(sound)?;
        let frames = (pause.max(0.0) * stream.sample_rate as f32).round() as usize;
        renderer.render_frames(frames)?;
    }

    let frames = renderer.finalize()?;
    tracing::info!(
        output = %out.display(),
        seconds = frames as f32 / stream.sample_rate as f32,
        "render complete"
    );
    mixer.terminate();
    Ok(())
}

#[cfg(feature = "streaming")]
fn run_live(args: &Args, config: MixerConfig) -> anyhow::Result<()> {
    let mut mixer = Mixer::new(config)?;
    mixer
        .start(config.stream.suggested_latency)
        .context("Failed to open audio output")?;

    let sound = mixer
        .load(&args.file)
        .with_context(|| format!("Failed to load '{}'", args.file.display()))?;

    for &pause in &args.schedule {
        mixer.play(sound)?;
        tracing::info!(%sound, pause, "played");
        std::thread::sleep(std::time::Duration::from_secs_f32(pause.max(0.0)));
    }

    let stats = mixer.stats();
    tracing::info!(
        plays = stats.plays,
        periods = stats.drain.periods,
        late_samples = stats.late_samples,
        "playback statistics"
    );
    mixer.terminate();
    Ok(())
}

#[cfg(not(feature = "streaming"))]
fn run_live(_args: &Args, _config: MixerConfig) -> anyhow::Result<()> {
    bail!(
        "live playback requires the \"streaming\" feature. Rebuild with `--features streaming`, \
         or pass --render OUT.wav to render offline"
    )
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.schedule.iter().any(|s| !s.is_finite()) {
        bail!("schedule entries must be finite numbers of seconds");
    }
    let config = load_config(&args)?;

    match &args.render {
        Some(out) => run_offline(&args, config, out),
        None => run_live(&args, config),
    }
}
