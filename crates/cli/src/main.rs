//! CLI tool for turning slide decks into narrated lecture videos.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lecture_agents::{
    ElevenLabsClient, GeminiClient, Narrator, SlideExtractor, TextGenerator, DEFAULT_ELEVENLABS_MODEL,
    DEFAULT_GEMINI_MODEL, DEFAULT_VOICE_ID,
};
use lecture_core::{Error, SlideContent};
use lecture_video::{create_slideshow, FfmpegRenderer, FfprobeProbe, RenderConfig, SlideshowOptions};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
const ELEVENLABS_KEY_VAR: &str = "ELEVENLABS_API_KEY";

/// Turn slide decks into narrated lecture videos.
#[derive(Parser, Debug)]
#[command(name = "lecturelens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract per-slide text and image summaries as JSON
    Extract(ExtractArgs),
    /// Extract a deck and synthesize one narration clip per slide
    Narrate(NarrateArgs),
    /// Combine slide images and narration clips into a video
    Assemble(AssembleArgs),
}

#[derive(Args, Debug)]
struct GeminiArgs {
    /// Gemini API key
    #[arg(long, env = GEMINI_KEY_VAR, hide_env_values = true)]
    gemini_api_key: Option<String>,

    /// Gemini model used for image summaries
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Input deck (.pptx or .pdf)
    deck: PathBuf,

    /// Do not summarize detected images
    #[arg(long)]
    no_summarize: bool,

    /// Write JSON to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    gemini: GeminiArgs,
}

#[derive(Args, Debug)]
struct NarrateArgs {
    /// Input deck (.pptx or .pdf)
    deck: PathBuf,

    /// Directory the narration clips are written to
    #[arg(short, long, default_value = "outputs")]
    dir: PathBuf,

    /// File name prefix of the narration clips
    #[arg(long, default_value = "script")]
    audio_prefix: String,

    /// Do not summarize detected images
    #[arg(long)]
    no_summarize: bool,

    #[command(flatten)]
    gemini: GeminiArgs,

    /// ElevenLabs API key
    #[arg(long, env = ELEVENLABS_KEY_VAR, hide_env_values = true)]
    elevenlabs_api_key: Option<String>,

    /// ElevenLabs voice id
    #[arg(long, default_value = DEFAULT_VOICE_ID)]
    voice: String,

    /// ElevenLabs model id
    #[arg(long, default_value = DEFAULT_ELEVENLABS_MODEL)]
    tts_model: String,
}

#[derive(Args, Debug)]
struct AssembleArgs {
    /// Working directory with slide images and narration clips
    #[arg(short, long, default_value = "outputs")]
    dir: PathBuf,

    /// Output video, relative to the working directory
    #[arg(short, long, default_value = "lecture_video.mp4")]
    output: PathBuf,

    /// File name prefix of the slide images
    #[arg(long, default_value = "slide")]
    image_prefix: String,

    /// File name prefix of the narration clips
    #[arg(long, default_value = "script")]
    audio_prefix: String,

    /// Output frame rate
    #[arg(long, default_value = "24")]
    fps: u32,

    /// Output width in pixels
    #[arg(long, default_value = "1920")]
    width: u32,

    /// Output height in pixels
    #[arg(long, default_value = "1080")]
    height: u32,

    /// ffmpeg video encoder
    #[arg(long, default_value = "libx264")]
    video_codec: String,

    /// ffmpeg audio encoder
    #[arg(long, default_value = "aac")]
    audio_codec: String,

    /// Encoder threads
    #[arg(long, default_value = "4")]
    threads: u32,

    /// Encoder preset (empty for the encoder default)
    #[arg(long, default_value = "medium")]
    preset: String,

    /// Output pixel format
    #[arg(long, default_value = "yuv420p")]
    pix_fmt: String,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// ffprobe executable
    #[arg(long, default_value = "ffprobe")]
    ffprobe: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Command::Extract(args) => run_extract(&args),
        Command::Narrate(args) => run_narrate(&args),
        Command::Assemble(args) => run_assemble(&args),
    }
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let summarize = !args.no_summarize;
    let gemini = gemini_client(&args.gemini, summarize)?;
    let slides = extract_slides(&args.deck, gemini.as_ref(), summarize)?;

    let json = serde_json::to_string_pretty(&slides).context("Failed to serialize slides")?;

    match &args.out {
        Some(path) => {
            write_output(path, &json)?;
            log::info!("Wrote {} slides to {}", slides.len(), path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn run_narrate(args: &NarrateArgs) -> Result<()> {
    let summarize = !args.no_summarize;
    // Both credentials are checked before the deck is touched.
    let api_key = require_credential(args.elevenlabs_api_key.as_deref(), ELEVENLABS_KEY_VAR)?;
    let gemini = gemini_client(&args.gemini, summarize)?;

    let speech = ElevenLabsClient::new(api_key)?
        .with_voice(&args.voice)
        .with_model(&args.tts_model);

    let slides = extract_slides(&args.deck, gemini.as_ref(), summarize)?;

    let report = Narrator::new(&speech)
        .with_audio_prefix(&args.audio_prefix)
        .narrate(&slides, &args.dir)
        .with_context(|| format!("Failed to narrate into {}", args.dir.display()))?;

    println!(
        "Narrated {} of {} slides into {}",
        report.written.len(),
        slides.len(),
        args.dir.display()
    );
    if !report.failed.is_empty() {
        log::warn!("Slides without narration: {:?}", report.failed);
    }

    Ok(())
}

fn run_assemble(args: &AssembleArgs) -> Result<()> {
    let render = RenderConfig {
        fps: args.fps,
        width: args.width,
        height: args.height,
        video_codec: args.video_codec.clone(),
        audio_codec: args.audio_codec.clone(),
        threads: args.threads,
        preset: args.preset.clone(),
        pixel_format: args.pix_fmt.clone(),
    };
    let options = SlideshowOptions::new(&args.dir)
        .with_output_file(&args.output)
        .with_prefixes(&args.image_prefix, &args.audio_prefix)
        .with_render(render);

    let probe = FfprobeProbe::new(&args.ffprobe);
    let renderer = FfmpegRenderer::new(&args.ffmpeg);

    let report = create_slideshow(&options, &probe, &renderer).context("Failed to create video")?;

    println!(
        "Video saved as {} ({} clips, {:.1}s)",
        report.output.display(),
        report.built,
        report.total_duration
    );
    for skipped in &report.skipped {
        println!(
            "  skipped slide {}: {} + {} ({})",
            skipped.index,
            skipped.image.display(),
            skipped.audio.display(),
            skipped.reason
        );
    }

    Ok(())
}

/// Build the Gemini client when summaries are wanted.
fn gemini_client(args: &GeminiArgs, summarize: bool) -> Result<Option<GeminiClient>> {
    if !summarize {
        return Ok(None);
    }
    let api_key = require_credential(args.gemini_api_key.as_deref(), GEMINI_KEY_VAR)?;
    let client = GeminiClient::new(api_key)?.with_model(&args.gemini_model);
    log::debug!("Using Gemini model {}", client.model());
    Ok(Some(client))
}

fn require_credential(value: Option<&str>, var: &'static str) -> Result<String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(v.to_string()),
        None => Err(Error::MissingCredential(var).into()),
    }
}

fn extract_slides(deck: &Path, gemini: Option<&GeminiClient>, summarize: bool) -> Result<Vec<SlideContent>> {
    let summarizer = gemini.map(|c| c as &dyn TextGenerator);
    let slides = SlideExtractor::new(summarizer)
        .extract(deck, summarize)
        .with_context(|| format!("Failed to extract {}", deck.display()))?;
    log::info!("Found {} slides", slides.len());
    Ok(slides)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
