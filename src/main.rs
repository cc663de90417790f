use clap::{Parser, Subcommand};
use notesense::sensors::ChunkAnnotation;
use notesense::{waveform, CaptureService, Config, Pipeline};
use std::path::PathBuf;

/// Live Instrument and Note Detection
#[derive(Parser)]
#[command(name = "notesense")]
#[command(about = "Classify a recording into an instrument and a musical note")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream an audio file through the capture pipeline and print the report
    Analyze {
        /// Input audio file (WAV)
        input: PathBuf,

        /// Directory for persisted recordings and detection history
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Bytes per streamed chunk
        #[arg(long, default_value_t = 4096)]
        chunk_bytes: usize,

        /// Humidity annotation attached to every chunk
        #[arg(long, default_value_t = 0.0)]
        humidity: f64,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still overrides the flag-derived default
    let default_level = match &cli.command {
        Commands::Analyze { verbose: true, .. } => "debug",
        Commands::Analyze { quiet: true, .. } => "error",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            config,
            chunk_bytes,
            humidity,
            verbose: _,
            quiet,
        } => {
            // Load configuration
            let mut config = if let Some(config_path) = config {
                notesense::config::load_config(config_path)?
            } else {
                Config::default()
            };
            if let Some(dir) = output.clone() {
                config.storage.root = Some(dir);
            }

            let audio = config.audio.clone();
            let pipeline = Pipeline::new(config)?;
            let service = CaptureService::new(pipeline);

            if !quiet {
                println!("Processing {}...", input.display());
            }

            // Convert the input to the deployment capture format, then
            // replay it through the service the way the device streams it.
            let (samples, source_rate) = waveform::load_wav_file(&input)?;
            let resampled = waveform::resample(&samples, source_rate, audio.sample_rate);
            let payload = waveform::requantize(&resampled);

            if chunk_bytes == 0 {
                anyhow::bail!("--chunk-bytes must be nonzero");
            }

            let bytes_per_ms =
                audio.sample_rate as f64 * audio.sample_width as f64 * audio.channels as f64
                    / 1000.0;
            let mut sent = 0usize;
            for chunk in payload.chunks(chunk_bytes) {
                let annotation = ChunkAnnotation {
                    humidity: Some(humidity),
                    timestamp_ms: Some((sent as f64 / bytes_per_ms) as i64),
                };
                service.accept(chunk, annotation);
                sent += chunk.len();
            }

            let report = service.finalize().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if !quiet {
                if let Some(dir) = output {
                    println!("Results saved to {}", dir.display());
                }
            }
        }
        Commands::ValidateConfig { config } => {
            let config = notesense::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
