//! Main player application
//!
//! Implements the egui App trait: pure glue between the widgets and the
//! playback worker.

use std::path::PathBuf;

use egui::{Color32, RichText};

use crate::playback::{self, PlaybackHandle, PlayerCommand, PlayerEvent, MAX_SPEED, MIN_SPEED};
use crate::render::FrameTexture;

use super::state::SessionView;

/// Main player application
pub struct PlayerApp {
    /// Handle to the playback worker
    playback: PlaybackHandle,
    /// UI-side view of the session
    view: SessionView,
    /// Speed slider value, forwarded to the worker on change
    speed: f32,
    /// Texture of the frame on screen
    frame_texture: FrameTexture,
}

impl PlayerApp {
    /// Create the application and spawn the playback worker.
    pub fn new(cc: &eframe::CreationContext<'_>, initial_file: Option<PathBuf>) -> Self {
        let repaint_ctx = cc.egui_ctx.clone();
        let playback = playback::spawn(move || repaint_ctx.request_repaint());

        let mut app = Self {
            playback,
            view: SessionView::default(),
            speed: playback::DEFAULT_SPEED,
            frame_texture: FrameTexture::new(),
        };

        if let Some(path) = initial_file {
            app.open_file(path);
        }

        app
    }

    /// Open a video file, carrying the current speed into the new session.
    fn open_file(&mut self, path: PathBuf) {
        self.playback.send(PlayerCommand::Open(path));
        self.playback.send(PlayerCommand::SetSpeed(self.speed));
    }

    /// Show the native file picker and open the chosen file.
    fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video Files", &["mp4", "avi", "mov", "mkv"])
            .pick_file()
        {
            self.open_file(path);
        }
    }

    /// Fold pending worker events into the view and the frame texture.
    fn drain_events(&mut self, ctx: &egui::Context) {
        for event in self.playback.poll() {
            if let PlayerEvent::Frame { ref image, .. } = event {
                self.frame_texture.set(ctx, image);
            }
            self.view.apply(&event);
        }
    }

    fn controls_ui(&mut self, ui: &mut egui::Ui) {
        // Seek bar across the full panel width
        ui.add_enabled_ui(self.view.is_open(), |ui| {
            ui.spacing_mut().slider_width = ui.available_width() - 16.0;
            let seek_bar = egui::Slider::new(&mut self.view.position, 0..=self.view.total_frames.max(1))
                .show_value(false)
                .trailing_fill(true);
            if ui.add(seek_bar).changed() {
                self.playback.send(PlayerCommand::Seek(self.view.position));
            }
        });

        ui.horizontal(|ui| {
            if ui.button("Open...").clicked() {
                self.open_dialog();
            }

            if self.view.playing {
                if ui.button("Pause").clicked() {
                    self.playback.send(PlayerCommand::Pause);
                    self.view.playing = false;
                }
            } else if ui.button("Play").clicked() && self.view.is_open() {
                self.playback.send(PlayerCommand::Play);
                self.view.playing = true;
            }

            if ui.button("Stop").clicked() {
                self.playback.send(PlayerCommand::Stop);
                self.view.playing = false;
            }

            ui.separator();

            ui.label("Speed");
            let speed_slider = egui::Slider::new(&mut self.speed, MIN_SPEED..=MAX_SPEED)
                .step_by(0.1)
                .fixed_decimals(1);
            if ui.add(speed_slider).changed() {
                self.playback.send(PlayerCommand::SetSpeed(self.speed));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let status = if self.view.is_open() {
                    format!(
                        "{} / {} @ {:.1}fps",
                        self.view.position, self.view.total_frames, self.view.fps
                    )
                } else {
                    "No file open".to_string()
                };
                ui.label(RichText::new(status).color(Color32::GRAY).small());
            });
        });
    }
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);

        // A file dropped onto the window opens like one from the picker
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|f| f.path.clone()));
        if let Some(path) = dropped {
            self.open_file(path);
        }

        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(6.0);
            self.controls_ui(ui);
            ui.add_space(6.0);
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let area = ui.available_rect_before_wrap();
                if self.frame_texture.has_frame() {
                    self.frame_texture.paint(ui, area);
                } else {
                    ui.centered_and_justified(|ui| {
                        ui.label(
                            RichText::new("Drop a video file here or use Open")
                                .color(Color32::GRAY)
                                .size(18.0),
                        );
                    });
                }
            });

        // Keep frames flowing while the worker is decoding
        if self.view.playing {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Joins the worker, which drops the decoder and its file handle
        self.playback.shutdown();
    }
}
