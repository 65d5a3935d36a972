use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use valet::voice::{Microphone, Speaker, TextToSpeech};
use valet::workflows;
use valet::{Assistant, Config};

/// Valet - Voice assistant with workflow dispatch and an LLM fallback
#[derive(Parser)]
#[command(name = "valet", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Trigger listening with Enter instead of the wake phrase
    #[arg(long, env = "VALET_KEYBOARD")]
    keyboard: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Text-only conversation on stdin/stdout
    Chat,
    /// Run a single utterance through the dispatcher and print the reply
    Test {
        /// Utterance to process
        text: String,
    },
    /// List registered workflows and their trigger examples
    Workflows,
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Good evening. All systems are operational, sir.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,valet=info",
        1 => "info,valet=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Chat => chat().await,
            Command::Test { text } => test_utterance(&text).await,
            Command::Workflows => list_workflows(),
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&text).await,
        };
    }

    let config = Config::load();
    let mut assistant = Assistant::from_config(&config)?;

    tracing::info!(
        keyboard = cli.keyboard,
        wake_phrases = ?config.voice.wake_words,
        "starting valet"
    );

    assistant.run_voice(&config, cli.keyboard).await?;
    Ok(())
}

/// Text-only conversation loop
async fn chat() -> anyhow::Result<()> {
    let config = Config::load();
    let mut assistant = Assistant::from_config(&config)?;

    println!("Chat mode. Type your request, or 'quit' to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "exit") {
            break;
        }

        let reply = assistant.process_input(input).await;
        println!("{reply}\n");
    }

    Ok(())
}

/// Run one utterance through the dispatcher
async fn test_utterance(text: &str) -> anyhow::Result<()> {
    let config = Config::load();
    let mut assistant = Assistant::from_config(&config)?;

    let entities = valet::extract_entities(text);
    println!("Utterance: {text}");
    println!("Entities:  {entities:?}");

    let reply = assistant.process_input(text).await;
    println!("Response:  {reply}");
    Ok(())
}

/// List registered workflows
fn list_workflows() -> anyhow::Result<()> {
    let manager = workflows::manager_from_env();
    println!("Registered workflows (scan order, last match wins):\n");
    println!("{}", manager.context_for_llm());
    Ok(())
}

/// Test microphone input with a level meter
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut mic = Microphone::open()?;
    mic.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = mic.drain();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0_f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    mic.stop();

    println!("\n---");
    println!("If the meter moved, your mic is working.");
    println!("If RMS stayed near 0, check your default input device.");
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let speaker = Speaker::open()?;

    let sample_rate = 24_000_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    speaker.play(&samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Synthesize and play a test phrase
async fn test_tts(text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let config = Config::load();
    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys)?;

    println!("Synthesizing speech...");
    let mp3 = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3.len());

    println!("Playing audio...");
    let speaker = Speaker::open()?;
    speaker.play_mp3(&mp3).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working.");
    Ok(())
}
