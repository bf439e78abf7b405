//! Collaborators around the video core: deck extraction with image
//! summarization, Gemini text generation and ElevenLabs narration.

pub mod gemini;
pub mod narrator;
pub mod slides;
pub mod speech;

pub use gemini::{GeminiClient, TextGenerator, DEFAULT_GEMINI_MODEL};
pub use narrator::{NarrationReport, Narrator};
pub use slides::{extractor_for, SlideExtractor};
pub use speech::{ElevenLabsClient, SpeechSynthesizer, DEFAULT_ELEVENLABS_MODEL, DEFAULT_VOICE_ID};
