//! Playback module
//!
//! Owns all playback state on a dedicated worker thread. The UI talks to it
//! exclusively over a command channel and observes it through an event
//! channel, so no session field is ever shared mutably across threads.

mod session;
mod worker;

use std::path::PathBuf;

use image::RgbImage;

pub use session::{clamp_speed, DEFAULT_SPEED, MAX_SPEED, MIN_SPEED};
pub use worker::{spawn, PlaybackHandle};

/// Control operation sent from the UI to the playback worker.
#[derive(Debug)]
pub enum PlayerCommand {
    /// Open a video file, replacing any current session
    Open(PathBuf),
    /// Start or resume playback
    Play,
    /// Suspend playback, keeping the position
    Pause,
    /// Halt playback and rewind to frame 0
    Stop,
    /// Reposition to the given frame index
    Seek(u64),
    /// Change the speed multiplier
    SetSpeed(f32),
    /// Exit the worker thread
    Shutdown,
}

/// State change published by the playback worker.
#[derive(Debug)]
pub enum PlayerEvent {
    /// A file was opened successfully
    Opened {
        path: PathBuf,
        total_frames: u64,
        fps: f64,
        width: u32,
        height: u32,
    },
    /// A frame is ready for display; `position` counts decoded frames
    Frame { image: RgbImage, position: u64 },
    /// Playback reached the end of the stream
    Finished,
}
