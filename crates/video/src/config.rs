//! Render settings for the final video.

use lecture_core::{Error, Result};

/// Encoder settings shared by clip building and rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Output frame rate.
    pub fps: u32,
    /// Output width in pixels; must be even for yuv420p.
    pub width: u32,
    /// Output height in pixels; must be even for yuv420p.
    pub height: u32,
    pub video_codec: String,
    pub audio_codec: String,
    /// Encoder threads handed to ffmpeg.
    pub threads: u32,
    /// Speed/quality preset; empty to let the encoder decide.
    pub preset: String,
    /// Pixel format of the encoded stream.
    pub pixel_format: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fps: 24,
            width: 1920,
            height: 1080,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            threads: 4,
            preset: "medium".to_string(),
            // Plays in browsers and QuickTime
            pixel_format: "yuv420p".to_string(),
        }
    }
}

impl RenderConfig {
    /// Check the settings before any clip is built.
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(Error::InvalidConfig("fps must be greater than zero".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "resolution {}x{} has a zero dimension",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::InvalidConfig(format!(
                "resolution {}x{} must have even dimensions",
                self.width, self.height
            )));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be greater than zero".to_string()));
        }
        if self.video_codec.trim().is_empty() || self.audio_codec.trim().is_empty() {
            return Err(Error::InvalidConfig("codecs must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
