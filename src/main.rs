use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tallyvox_core::{AppConfig, Speaker, SpeakerId};
use tallyvox_router::{KeywordSet, SinkConfig, VoiceSink};
use tallyvox_store::{CountStore, Scoreboard, SqliteCountStore};
use tallyvox_stt::{EngineRegistry, SpeechEngine};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tallyvox", about = "Per-speaker keyword tally over live voice audio")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current leaderboard from the persistent store
    Leaderboard,
    /// Push a WAV file through the pipeline as one speaker, then print the
    /// leaderboard
    Feed {
        /// Speaker identity to tag the audio with
        #[arg(long)]
        speaker: u64,

        /// Display name shown on the leaderboard
        #[arg(long, default_value = "wav")]
        name: String,

        /// Interleaved stereo 16-bit WAV at the configured source rate
        wav: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("failed to load config from {:?}", cli.config))?;

    let env_filter =
        EnvFilter::try_new(&config.general.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("tallyvox starting");

    let store = Arc::new(
        SqliteCountStore::new(config.store.path.clone())
            .with_context(|| format!("failed to open count store at {:?}", config.store.path))?,
    );
    let scoreboard = Arc::new(Scoreboard::new(Arc::clone(&store) as Arc<dyn CountStore>));
    scoreboard
        .preload()
        .context("failed to preload counts from store")?;

    match cli.command {
        Command::Leaderboard => print_ranking(&scoreboard),
        Command::Feed { speaker, name, wav } => {
            let engine = build_engine(&config)?;
            let keywords = Arc::new(KeywordSet::new(
                config.keywords.words.iter().map(String::as_str),
            ));
            let sink = VoiceSink::new(
                SinkConfig {
                    source_rate: config.audio.source_rate,
                    target_rate: config.audio.target_rate,
                    debounce: Duration::from_millis(config.pipeline.debounce_ms),
                    queue_capacity: config.pipeline.queue_capacity,
                    poll: Duration::from_millis(config.pipeline.poll_ms),
                },
                engine,
                keywords,
                Arc::clone(&scoreboard),
            )
            .context("failed to build voice sink")?;

            feed_wav(&sink, &config, SpeakerId(speaker), &name, &wav).await?;
            sink.session_ended();
            print_ranking(&scoreboard);
        }
    }

    Ok(())
}

fn build_engine(config: &AppConfig) -> Result<Arc<dyn SpeechEngine>> {
    let registry = EngineRegistry::new();
    let mut engine = registry
        .create(&config.stt.engine)
        .with_context(|| format!("unknown speech engine '{}'", config.stt.engine))?;

    let engine_config = match config.stt.engine.as_str() {
        "vosk" => match &config.stt.vosk {
            Some(vosk_cfg) => {
                toml::Value::try_from(vosk_cfg).context("failed to serialize vosk config")?
            }
            None => toml::Value::Table(Default::default()),
        },
        _ => toml::Value::Table(Default::default()),
    };
    engine
        .initialize(engine_config)
        .with_context(|| format!("failed to initialize engine '{}'", config.stt.engine))?;

    Ok(Arc::from(engine))
}

async fn feed_wav(
    sink: &VoiceSink,
    config: &AppConfig,
    id: SpeakerId,
    name: &str,
    path: &Path,
) -> Result<()> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("failed to open WAV {path:?}"))?;
    let spec = reader.spec();
    anyhow::ensure!(
        spec.channels == 2
            && spec.bits_per_sample == 16
            && spec.sample_format == hound::SampleFormat::Int
            && spec.sample_rate == config.audio.source_rate,
        "expected {} Hz stereo 16-bit PCM, got {} Hz, {} ch, {} bit",
        config.audio.source_rate,
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
    );

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<_, _>>()
        .context("failed to decode WAV samples")?;

    let speaker = Speaker {
        id,
        display_name: name.to_string(),
        bot: false,
    };

    // 20 ms of interleaved stereo per frame, dispatched at real-time pace the
    // way a live transport would deliver it.
    let samples_per_frame = (config.audio.source_rate as usize / 50) * 2;
    let mut sent = 0usize;
    for chunk in samples.chunks(samples_per_frame) {
        let mut pcm = Vec::with_capacity(chunk.len() * 2);
        for &sample in chunk {
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
        sink.dispatch(Some(&speaker), &pcm);
        sent += 1;
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tracing::info!(frames = sent, speaker = %id, "finished feeding WAV");

    // Let the worker catch up before teardown abandons its queue.
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}

fn print_ranking(scoreboard: &Scoreboard) {
    let ranking = scoreboard.ranking();
    if ranking.is_empty() {
        println!("no keywords counted yet");
        return;
    }
    for (position, entry) in ranking.iter().enumerate() {
        println!("#{} {} x{}", position + 1, entry.display_name, entry.total);
    }
}
