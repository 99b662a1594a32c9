//! Playback session
//!
//! One open video file plus its playback state. Owned exclusively by the
//! worker thread; every mutation goes through a command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::RgbImage;
use tracing::warn;

use crate::video::{DecodeError, VideoDecoder};

/// Lower bound of the speed multiplier.
pub const MIN_SPEED: f32 = 0.5;
/// Upper bound of the speed multiplier.
pub const MAX_SPEED: f32 = 2.0;
/// Speed multiplier applied to a freshly opened file.
pub const DEFAULT_SPEED: f32 = 1.0;

/// Clamp a speed multiplier to its bounded range.
pub fn clamp_speed(speed: f32) -> f32 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Delay between consecutive frames at the given rate and speed.
pub(crate) fn frame_interval(fps: f64, speed: f32) -> Duration {
    let fps = if fps > 0.0 { fps } else { 30.0 };
    Duration::from_secs_f64(1.0 / (fps * f64::from(clamp_speed(speed))))
}

/// Playback state for a single open file.
pub struct Session {
    decoder: VideoDecoder,
    path: PathBuf,
    /// Number of frames consumed; `0 <= position <= total_frames`
    position: u64,
    playing: bool,
    speed: f32,
}

impl Session {
    /// Open a video file, failing without side effects if it cannot be read.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let decoder = VideoDecoder::open(path)?;
        Ok(Self {
            decoder,
            path: path.to_path_buf(),
            position: 0,
            playing: false,
            speed: DEFAULT_SPEED,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_frames(&self) -> u64 {
        self.decoder.total_frames()
    }

    pub fn fps(&self) -> f64 {
        self.decoder.fps()
    }

    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start or resume playback. Resuming at the end of the stream restarts
    /// from frame 0.
    pub fn play(&mut self) {
        let total = self.total_frames();
        if total > 0 && self.position >= total {
            if let Err(e) = self.decoder.seek_to_frame(0) {
                warn!("rewind failed: {}", e);
            }
            self.position = 0;
        }
        self.playing = true;
    }

    /// Suspend playback; the loop observes the flag at its next iteration.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Halt playback, rewind to frame 0 and return it for display.
    pub fn stop(&mut self) -> Option<RgbImage> {
        self.playing = false;
        self.show_frame(0)
    }

    /// Reposition to the given frame index (clamped to the stream length)
    /// and return that frame for display, regardless of playing state.
    pub fn seek(&mut self, frame: u64) -> Option<RgbImage> {
        let total = self.total_frames();
        let target = if total > 0 { frame.min(total) } else { frame };
        self.show_frame(target)
    }

    /// Set the speed multiplier, clamped to [`MIN_SPEED`, `MAX_SPEED`].
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = clamp_speed(speed);
    }

    /// Decode the next frame and advance the position.
    ///
    /// Returns `None` when the stream is exhausted; the session leaves the
    /// playing state in that case.
    pub fn step(&mut self) -> Option<(RgbImage, u64)> {
        let total = self.total_frames();
        if total > 0 && self.position >= total {
            self.playing = false;
            return None;
        }

        match self.decoder.read_frame() {
            Some(image) => {
                self.position += 1;
                Some((image, self.position))
            }
            None => {
                self.playing = false;
                None
            }
        }
    }

    /// Delay to apply after the frame just decoded.
    pub fn frame_delay(&self) -> Duration {
        frame_interval(self.fps(), self.speed)
    }

    /// Decode the frame at `target` for display and leave the decode cursor
    /// at `target` so playback resumes there.
    fn show_frame(&mut self, target: u64) -> Option<RgbImage> {
        let total = self.total_frames();
        let shown = if total > 0 {
            target.min(total.saturating_sub(1))
        } else {
            target
        };

        let image = match self.decoder.seek_to_frame(shown) {
            Ok(()) => self.decoder.read_frame(),
            Err(e) => {
                warn!("seek to frame {} failed: {}", shown, e);
                None
            }
        };

        // Reading the preview consumed a frame; rewind to the target
        if let Err(e) = self.decoder.seek_to_frame(target) {
            warn!("seek to frame {} failed: {}", target, e);
        }

        self.position = target;
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_clamped_to_bounds() {
        assert_eq!(clamp_speed(0.1), MIN_SPEED);
        assert_eq!(clamp_speed(5.0), MAX_SPEED);
        assert_eq!(clamp_speed(1.3), 1.3);
    }

    #[test]
    fn frame_interval_scales_with_speed() {
        // 25fps at normal speed is 40ms per frame
        assert_eq!(frame_interval(25.0, 1.0), Duration::from_millis(40));
        // Doubling the speed halves the delay
        assert_eq!(frame_interval(25.0, 2.0), Duration::from_millis(20));
        // Half speed doubles it
        assert_eq!(frame_interval(25.0, 0.5), Duration::from_millis(80));
    }

    #[test]
    fn frame_interval_survives_unreported_rate() {
        let interval = frame_interval(0.0, 1.0);
        assert!(interval > Duration::ZERO);
        assert!(interval < Duration::from_secs(1));
    }

    #[test]
    fn open_missing_file_is_an_error() {
        assert!(Session::open(Path::new("no-such-clip.mp4")).is_err());
    }
}
