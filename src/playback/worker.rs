//! Playback worker
//!
//! A single long-lived thread runs the playback loop for the lifetime of
//! the application, so at most one loop is ever active per session.
//! While idle it blocks on the command channel; while playing it drains
//! pending commands between frames and paces decoding with a real sleep on
//! this thread, independent of the UI event queue.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use tracing::{debug, error, info, warn};

use super::session::Session;
use super::{PlayerCommand, PlayerEvent};

/// Handle kept by the UI: command sender, event receiver, join handle.
pub struct PlaybackHandle {
    commands: Sender<PlayerCommand>,
    events: Receiver<PlayerEvent>,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    /// Send a command to the worker.
    pub fn send(&self, command: PlayerCommand) {
        if self.commands.send(command).is_err() {
            warn!("playback worker is gone, command dropped");
        }
    }

    /// Iterate over the events published since the last poll.
    pub fn poll(&self) -> crossbeam_channel::TryIter<'_, PlayerEvent> {
        self.events.try_iter()
    }

    /// The event channel, for callers that want to block.
    #[cfg(test)]
    pub fn events(&self) -> &Receiver<PlayerEvent> {
        &self.events
    }

    /// Ask the worker to exit and wait for it.
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(PlayerCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn the playback worker. `notify` is invoked after every published
/// event so the UI can schedule a repaint.
pub fn spawn<F>(notify: F) -> PlaybackHandle
where
    F: Fn() + Send + 'static,
{
    let (command_tx, command_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();

    let thread = thread::spawn(move || run(command_rx, event_tx, notify));

    PlaybackHandle {
        commands: command_tx,
        events: event_rx,
        thread: Some(thread),
    }
}

fn run<F>(commands: Receiver<PlayerCommand>, events: Sender<PlayerEvent>, notify: F)
where
    F: Fn(),
{
    let mut session: Option<Session> = None;

    loop {
        let playing = session.as_ref().is_some_and(Session::is_playing);

        // Block while idle; poll between frames while playing
        let command = if playing {
            match commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => break,
            }
        } else {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            }
        };

        if let Some(command) = command {
            if matches!(command, PlayerCommand::Shutdown) {
                break;
            }
            handle_command(command, &mut session, &events, &notify);
            // Drain every queued command before decoding the next frame
            continue;
        }

        let Some(current) = session.as_mut() else {
            continue;
        };

        match current.step() {
            Some((image, position)) => {
                let delay = current.frame_delay();
                publish(&events, PlayerEvent::Frame { image, position }, &notify);
                thread::sleep(delay);
            }
            None => {
                debug!("end of stream at frame {}", current.position());
                publish(&events, PlayerEvent::Finished, &notify);
            }
        }
    }

    info!("playback worker exiting");
}

fn handle_command<F>(
    command: PlayerCommand,
    session: &mut Option<Session>,
    events: &Sender<PlayerEvent>,
    notify: &F,
) where
    F: Fn(),
{
    match command {
        PlayerCommand::Open(path) => match Session::open(&path) {
            Ok(mut opened) => {
                publish(
                    events,
                    PlayerEvent::Opened {
                        path: opened.path().to_path_buf(),
                        total_frames: opened.total_frames(),
                        fps: opened.fps(),
                        width: opened.width(),
                        height: opened.height(),
                    },
                    notify,
                );
                // Show frame 0 before playback starts
                if let Some(image) = opened.seek(0) {
                    publish(events, PlayerEvent::Frame { image, position: 0 }, notify);
                }
                // The previous session's file handle is released here
                *session = Some(opened);
            }
            Err(e) => {
                // Previous session state stays untouched
                error!("failed to open {}: {}", path.display(), e);
            }
        },
        PlayerCommand::Play => match session {
            Some(current) if current.is_playing() => debug!("play ignored: already playing"),
            Some(current) => current.play(),
            None => debug!("play ignored: no file open"),
        },
        PlayerCommand::Pause => {
            if let Some(current) = session {
                current.pause();
            }
        }
        PlayerCommand::Stop => {
            if let Some(current) = session {
                if let Some(image) = current.stop() {
                    publish(events, PlayerEvent::Frame { image, position: 0 }, notify);
                }
            }
        }
        PlayerCommand::Seek(frame) => match session {
            Some(current) => {
                if let Some(image) = current.seek(frame) {
                    let position = current.position();
                    publish(events, PlayerEvent::Frame { image, position }, notify);
                }
            }
            None => debug!("seek ignored: no file open"),
        },
        PlayerCommand::SetSpeed(speed) => {
            if let Some(current) = session {
                current.set_speed(speed);
            }
        }
        // Intercepted by the run loop before dispatch
        PlayerCommand::Shutdown => {}
    }
}

fn publish<F>(events: &Sender<PlayerEvent>, event: PlayerEvent, notify: &F)
where
    F: Fn(),
{
    let _ = events.send(event);
    notify();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn open_failure_publishes_nothing() {
        let handle = spawn(|| {});
        handle.send(PlayerCommand::Open(PathBuf::from("/nonexistent/clip.mp4")));
        // Without a session these are silently ignored
        handle.send(PlayerCommand::Play);
        handle.send(PlayerCommand::Seek(10));
        handle.send(PlayerCommand::SetSpeed(1.5));

        let result = handle.events().recv_timeout(Duration::from_millis(500));
        assert!(result.is_err(), "expected no event, got {:?}", result);
    }

    #[test]
    fn shutdown_joins_the_worker() {
        let mut handle = spawn(|| {});
        handle.shutdown();
        assert!(handle.thread.is_none());
    }
}
