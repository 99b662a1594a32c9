//! UI-side playback state
//!
//! A replica of the observable session fields, updated only by events from
//! the playback worker. The worker owns the real state; this view exists so
//! widgets have something to bind to between events.

use std::path::PathBuf;

use crate::playback::PlayerEvent;

/// What the UI knows about the current session.
#[derive(Debug, Default)]
pub struct SessionView {
    pub path: Option<PathBuf>,
    pub total_frames: u64,
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    /// Number of frames consumed; `0 <= position <= total_frames`
    pub position: u64,
    /// Set optimistically by the buttons, cleared by `Finished`
    pub playing: bool,
}

impl SessionView {
    pub fn is_open(&self) -> bool {
        self.path.is_some()
    }

    /// Fold a worker event into the view.
    pub fn apply(&mut self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Opened {
                path,
                total_frames,
                fps,
                width,
                height,
            } => {
                self.path = Some(path.clone());
                self.total_frames = *total_frames;
                self.fps = *fps;
                self.width = *width;
                self.height = *height;
                self.position = 0;
                self.playing = false;
            }
            PlayerEvent::Frame { position, .. } => {
                self.position = *position;
            }
            PlayerEvent::Finished => {
                self.playing = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn opened(total_frames: u64) -> PlayerEvent {
        PlayerEvent::Opened {
            path: PathBuf::from("clip.mp4"),
            total_frames,
            fps: 25.0,
            width: 4,
            height: 4,
        }
    }

    fn frame(position: u64) -> PlayerEvent {
        PlayerEvent::Frame {
            image: RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])),
            position,
        }
    }

    #[test]
    fn opening_resets_the_view() {
        let mut view = SessionView::default();
        view.position = 42;
        view.playing = true;

        view.apply(&opened(100));

        assert!(view.is_open());
        assert_eq!(view.total_frames, 100);
        assert_eq!(view.position, 0);
        assert!(!view.playing);
    }

    #[test]
    fn position_follows_frames_and_never_exceeds_total() {
        let mut view = SessionView::default();
        view.apply(&opened(100));
        view.playing = true;

        let mut last = 0;
        for position in 1..=100 {
            view.apply(&frame(position));
            assert!(view.position >= last);
            assert!(view.position <= view.total_frames);
            last = view.position;
        }
    }

    #[test]
    fn seek_then_play_to_end_then_stop() {
        let mut view = SessionView::default();
        view.apply(&opened(100));

        // Seek to frame 50; the worker echoes the new position
        view.apply(&frame(50));
        assert_eq!(view.position, 50);

        // Play until the position passes the last frame
        view.playing = true;
        for position in 51..=100 {
            view.apply(&frame(position));
        }
        assert_eq!(view.position, 100);

        // The loop stops by itself at end of stream
        view.apply(&PlayerEvent::Finished);
        assert!(!view.playing);

        // Stop rewinds to frame 0
        view.apply(&frame(0));
        assert_eq!(view.position, 0);
    }

    #[test]
    fn failed_open_changes_nothing() {
        // A failed open publishes no event at all, so the view is whatever
        // it was before.
        let mut view = SessionView::default();
        view.apply(&opened(100));
        view.apply(&frame(30));

        assert_eq!(view.position, 30);
        assert_eq!(view.total_frames, 100);
    }
}
