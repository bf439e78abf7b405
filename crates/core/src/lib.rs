//! Core domain types, file discovery, slide/audio pairing and narration
//! text normalization for lecture video generation.

pub mod error;
pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod pairing;
pub mod types;

pub use error::{Error, Result};
pub use extract::DocumentExtractor;
pub use matcher::{find_matching_files, natural_sort_key, NaturalKey};
pub use normalize::ScriptNormalizer;
pub use pairing::{pair_slides_with_audio, unpaired_files, SlideAudioPair};
pub use types::{Deck, DeckFormat, ExtractedSlide, MediaFile, MediaKind, SlideContent, SlideText};
