//! audio-client: command line front end for the audio service
//!
//! Usage:
//!   audio-client config                          - Show the server's audio config
//!   audio-client models | voices                 - List models or voices
//!   audio-client transcribe <file> [language]    - Batch transcription
//!   audio-client speak <text> <out> [voice] [model]
//!   audio-client stream <raw-audio> [chunk-bytes] - Real-time transcription

use std::time::Duration;

use anyhow::Context;
use audio_api::{AudioApiClient, SpeechRequest};
use audio_core::AudioConfig;
use audio_stream::{RealtimeTranscriptionStream, StreamCallbacks};
use tracing_subscriber::EnvFilter;

/// 100ms of 16 kHz, 16-bit mono PCM
const DEFAULT_CHUNK_BYTES: usize = 3200;

/// How long to keep listening for final results after the last chunk
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Config,
    Models,
    Voices,
    Transcribe {
        file: String,
        language: Option<String>,
    },
    Speak {
        text: String,
        out: String,
        voice: Option<String>,
        model: Option<String>,
    },
    Stream {
        file: String,
        chunk_bytes: usize,
    },
    Help,
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{}", message);
            print_help();
            std::process::exit(2);
        }
    };

    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("audio-client {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = AudioConfig::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    tracing::debug!("Audio API: {}", config.api.base_url);

    run(command, &config).await
}

async fn run(command: Command, config: &AudioConfig) -> anyhow::Result<()> {
    let client = || AudioApiClient::from_config(&config.api);

    match command {
        Command::Config => {
            let settings = client()?.get_config().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Models => {
            for model in client()?.models().await?.models {
                println!("{}\t{}", model.id, model.name.unwrap_or_default());
            }
        }
        Command::Voices => {
            for voice in client()?.voices().await?.voices {
                println!("{}\t{}", voice.id, voice.name.unwrap_or_default());
            }
        }
        Command::Transcribe { file, language } => {
            let audio = std::fs::read(&file).with_context(|| format!("Failed to read {}", file))?;
            let filename = std::path::Path::new(&file)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.clone());

            let result = client()?
                .transcribe(&audio, &filename, language.as_deref())
                .await?;
            println!("{}", result.text);
        }
        Command::Speak {
            text,
            out,
            voice,
            model,
        } => {
            let mut request = SpeechRequest::new(text);
            if let Some(voice) = voice {
                request = request.with_voice(voice);
            }
            if let Some(model) = model {
                request = request.with_model(model);
            }

            let speech = client()?.synthesize_speech(&request).await?;
            std::fs::write(&out, &speech.audio_data)
                .with_context(|| format!("Failed to write {}", out))?;
            println!("Wrote {} bytes ({}) to {}", speech.audio_data.len(), speech.content_type, out);
        }
        Command::Stream { file, chunk_bytes } => stream_file(config, &file, chunk_bytes).await?,
        Command::Help | Command::Version => {}
    }

    Ok(())
}

/// Stream a raw audio file in real-time sized chunks
async fn stream_file(config: &AudioConfig, file: &str, chunk_bytes: usize) -> anyhow::Result<()> {
    let audio = std::fs::read(file).with_context(|| format!("Failed to read {}", file))?;

    let callbacks = StreamCallbacks::new()
        .on_partial(|text| println!("... {}", text))
        .on_final(|text| println!(">>> {}", text))
        .on_error(|message| eprintln!("error: {}", message));

    let stream = RealtimeTranscriptionStream::from_config(config, callbacks)?;
    stream.connect().await?;
    tracing::info!("Streaming {} bytes in {}-byte chunks", audio.len(), chunk_bytes);

    let mut interval = tokio::time::interval(Duration::from_millis(100));
    for chunk in audio.chunks(chunk_bytes) {
        interval.tick().await;
        if !stream.is_connected() {
            tracing::warn!("Stream closed early");
            break;
        }
        stream.send_audio(chunk);
    }

    tokio::time::sleep(DRAIN_GRACE).await;
    stream.stop();

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut args = args.iter().map(String::as_str);
    let command = args.next().unwrap_or("--help");

    let mut required = |name: &str| {
        args.next()
            .map(str::to_string)
            .ok_or_else(|| format!("missing <{}> for `{}`", name, command))
    };

    let parsed = match command {
        "config" => Command::Config,
        "models" => Command::Models,
        "voices" => Command::Voices,
        "transcribe" => Command::Transcribe {
            file: required("file")?,
            language: required("language").ok(),
        },
        "speak" => Command::Speak {
            text: required("text")?,
            out: required("out-file")?,
            voice: required("voice").ok(),
            model: required("model").ok(),
        },
        "stream" => {
            let file = required("raw-audio-file")?;
            let chunk_bytes = match required("chunk-bytes").ok() {
                Some(value) => value
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| format!("invalid chunk size `{}`", value))?,
                None => DEFAULT_CHUNK_BYTES,
            };
            Command::Stream { file, chunk_bytes }
        }
        "--help" | "-h" | "help" => Command::Help,
        "--version" | "-v" => Command::Version,
        other => return Err(format!("unknown command `{}`", other)),
    };

    Ok(parsed)
}

fn print_help() {
    println!("audio-client - audio service client");
    println!();
    println!("Usage:");
    println!("  audio-client config                              Show the server's audio config");
    println!("  audio-client models                              List models");
    println!("  audio-client voices                              List voices");
    println!("  audio-client transcribe <file> [language]        Transcribe an audio file");
    println!("  audio-client speak <text> <out> [voice] [model]  Synthesize speech to a file");
    println!("  audio-client stream <raw-audio> [chunk-bytes]    Real-time transcription");
    println!("  audio-client --help                              Show this help message");
    println!("  audio-client --version                           Show version");
    println!();
    println!("Environment Variables:");
    println!("  AUDIO_API_BASE_URL   Audio API base URL (default: http://localhost:8080/api/v1/audio)");
    println!("  AUDIO_API_TOKEN      Bearer token for the audio API");
    println!("  SPEECH_API_KEY       Speech credential for real-time transcription (required for stream)");
    println!("  SPEECH_REGION        Speech region (required for stream)");
    println!("  SPEECH_LANGUAGE      Recognition language (default: nl-NL)");
}
