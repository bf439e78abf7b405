//! Positional pairing of slide images with narration clips.

use crate::types::{MediaFile, MediaKind};
use std::path::PathBuf;

/// One slide image bound to one narration clip by sorted position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideAudioPair {
    /// 1-based position in the final video.
    pub index: usize,
    pub image: MediaFile,
    pub audio: MediaFile,
}

impl SlideAudioPair {
    /// Whether the numbers embedded in both file names agree.
    pub fn ordinals_match(&self) -> bool {
        self.image.ordinal() == self.audio.ordinal()
    }
}

/// Which side has files without a partner, and how many.
pub fn unpaired_files(images: usize, audios: usize) -> Option<(MediaKind, usize)> {
    match images.cmp(&audios) {
        std::cmp::Ordering::Greater => Some((MediaKind::Image, images - audios)),
        std::cmp::Ordering::Less => Some((MediaKind::Audio, audios - images)),
        std::cmp::Ordering::Equal => None,
    }
}

/// Zip naturally sorted images and audios index-for-index.
///
/// Pair `i` is always `(images[i], audios[i])`; embedded numbers are not
/// compared. The result has `min(images.len(), audios.len())` entries and
/// surplus files on the longer side are dropped with a warning.
pub fn pair_slides_with_audio(images: &[PathBuf], audios: &[PathBuf]) -> Vec<SlideAudioPair> {
    if let Some((kind, unused)) = unpaired_files(images.len(), audios.len()) {
        let longer = match kind {
            MediaKind::Image => "slide images",
            MediaKind::Audio => "audio files",
        };
        log::warn!(
            "Found {} slide images but {} audio files; {} trailing {} will be left out of the video",
            images.len(),
            audios.len(),
            unused,
            longer
        );
    }

    let pairs: Vec<SlideAudioPair> = images
        .iter()
        .zip(audios)
        .enumerate()
        .map(|(i, (image, audio))| SlideAudioPair {
            index: i + 1,
            image: MediaFile::new(image.clone(), MediaKind::Image),
            audio: MediaFile::new(audio.clone(), MediaKind::Audio),
        })
        .collect();

    for pair in pairs.iter().filter(|p| !p.ordinals_match()) {
        log::debug!(
            "Pair {} binds {} to {} by position; their numbers differ",
            pair.index,
            pair.image.file_name(),
            pair.audio.file_name()
        );
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::Once;

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    /// Records log lines per test thread.
    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;
    static INIT_LOGGER: Once = Once::new();

    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(log::Level, String)>) {
        INIT_LOGGER.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
        });
        CAPTURED.with(|c| c.borrow_mut().clear());
        let result = f();
        (result, CAPTURED.with(|c| c.borrow_mut().drain(..).collect()))
    }

    fn warnings(logs: &[(log::Level, String)]) -> Vec<&str> {
        logs.iter()
            .filter(|(level, _)| *level == log::Level::Warn)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_pairs_truncate_to_shorter_side() {
        let images = paths(&["slide1.png", "slide2.png", "slide3.png"]);
        let audios = paths(&["script1.mp3", "script2.mp3"]);

        let pairs = pair_slides_with_audio(&images, &audios);

        assert_eq!(pairs.len(), 2);
        for (i, pair) in pairs.iter().enumerate() {
            assert_eq!(pair.index, i + 1);
            assert_eq!(pair.image.path, images[i]);
            assert_eq!(pair.audio.path, audios[i]);
        }
        assert!(pairs.iter().all(|p| p.image.path != images[2]));
    }

    #[test]
    fn test_count_mismatch_is_warned() {
        let images = paths(&["slide1.png", "slide2.png", "slide3.png"]);
        let audios = paths(&["script1.mp3", "script2.mp3"]);

        let (pairs, logs) = capture_logs(|| pair_slides_with_audio(&images, &audios));

        assert_eq!(pairs.len(), 2);
        let warned = warnings(&logs);
        assert_eq!(warned.len(), 1);
        assert!(warned[0].contains("3 slide images"));
        assert!(warned[0].contains("2 audio files"));
        assert!(warned[0].contains("1 trailing slide images"));
    }

    #[test]
    fn test_surplus_audio_is_warned() {
        let images = paths(&["slide1.png"]);
        let audios = paths(&["script1.mp3", "script2.mp3", "script3.mp3"]);

        let (_, logs) = capture_logs(|| pair_slides_with_audio(&images, &audios));

        let warned = warnings(&logs);
        assert_eq!(warned.len(), 1);
        assert!(warned[0].contains("2 trailing audio files"));
    }

    #[test]
    fn test_equal_counts_are_not_warned() {
        let images = paths(&["slide1.png", "slide2.png"]);
        let audios = paths(&["script1.mp3", "script2.mp3"]);

        let (_, logs) = capture_logs(|| pair_slides_with_audio(&images, &audios));

        assert!(warnings(&logs).is_empty());
    }

    #[test]
    fn test_pairs_bind_by_position_not_ordinal() {
        let images = paths(&["slide1.png", "slide5.png"]);
        let audios = paths(&["script2.mp3", "script3.mp3"]);

        let pairs = pair_slides_with_audio(&images, &audios);

        assert_eq!(pairs[0].audio.file_name(), "script2.mp3");
        assert_eq!(pairs[1].image.file_name(), "slide5.png");
        assert!(!pairs[0].ordinals_match());
    }

    #[test]
    fn test_pairs_empty_when_either_side_empty() {
        assert!(pair_slides_with_audio(&paths(&["slide1.png"]), &[]).is_empty());
        assert!(pair_slides_with_audio(&[], &paths(&["script1.mp3"])).is_empty());
    }

    #[test]
    fn test_unpaired_files() {
        assert_eq!(unpaired_files(3, 2), Some((MediaKind::Image, 1)));
        assert_eq!(unpaired_files(1, 4), Some((MediaKind::Audio, 3)));
        assert_eq!(unpaired_files(2, 2), None);
    }

    #[test]
    fn test_pairs_kinds() {
        let pairs = pair_slides_with_audio(&paths(&["slide1.png"]), &paths(&["script1.wav"]));
        assert_eq!(pairs[0].image.kind, MediaKind::Image);
        assert_eq!(pairs[0].audio.kind, MediaKind::Audio);
        assert!(pairs[0].ordinals_match());
    }
}
