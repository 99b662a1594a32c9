//! Video decoder
//!
//! Wraps an FFmpeg demuxer/decoder pair and delivers frames as RGB images.

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{debug, error, info};

use ffmpeg_next as ffmpeg;
use ffmpeg::format::input;
use ffmpeg::format::Pixel;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::{Context as Scaler, Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::Rational;

/// Seek timestamps passed to libavformat are expressed in `AV_TIME_BASE`
/// units (microseconds).
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Frame rate assumed when the container does not report one.
const FALLBACK_FPS: f64 = 30.0;

/// Errors raised while opening or seeking a video file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("video file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("no video stream in {}", .0.display())]
    NoVideoStream(PathBuf),
    #[error("ffmpeg: {0}")]
    Ffmpeg(#[from] ffmpeg::Error),
}

/// Decoder for the video stream of a single file.
///
/// Frames are addressed by an integer index from 0 to `total_frames() - 1`.
pub struct VideoDecoder {
    /// FFmpeg format context
    input_ctx: ffmpeg::format::context::Input,
    /// Video stream index
    stream_index: usize,
    /// Video decoder
    decoder: ffmpeg::codec::decoder::Video,
    /// Scaler for RGB24 conversion
    scaler: Scaler,
    /// Time base of the video stream
    time_base: Rational,
    /// Native frame width
    width: u32,
    /// Native frame height
    height: u32,
    /// Native frame rate
    fps: f64,
    /// Total number of frames (estimated from duration when unreported)
    total_frames: u64,
    /// Frame decoded during a seek, delivered by the next `read_frame`
    pending: Option<VideoFrame>,
    /// Packet iterator state
    at_eof: bool,
}

impl VideoDecoder {
    /// Open a video file for decoding.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        if !path.exists() {
            return Err(DecodeError::NotFound(path.to_path_buf()));
        }

        // Safe to call multiple times
        ffmpeg::init()?;

        let input_ctx = input(&path)?;

        let video_stream = input_ctx
            .streams()
            .best(Type::Video)
            .ok_or_else(|| DecodeError::NoVideoStream(path.to_path_buf()))?;

        let stream_index = video_stream.index();
        let time_base = video_stream.time_base();

        let rate = video_stream.rate();
        let fps = if rate.1 != 0 {
            rate.0 as f64 / rate.1 as f64
        } else {
            FALLBACK_FPS
        };

        let total_frames = if video_stream.frames() > 0 {
            video_stream.frames() as u64
        } else {
            // Fall back to a duration-based estimate
            let duration = input_ctx.duration();
            if duration > 0 {
                (duration as f64 / AV_TIME_BASE * fps).round() as u64
            } else {
                0
            }
        };

        let context_decoder =
            ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        let decoder = context_decoder.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();

        info!(
            "Opened video: {}x{} @ {:.1}fps, {} frames, format: {:?}",
            width,
            height,
            fps,
            total_frames,
            decoder.format()
        );

        let scaler = Scaler::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )?;

        Ok(Self {
            input_ctx,
            stream_index,
            decoder,
            scaler,
            time_base,
            width,
            height,
            fps,
            total_frames,
            pending: None,
            at_eof: false,
        })
    }

    /// Read the next frame from the video.
    ///
    /// Returns `None` at end of stream or on decode failure.
    pub fn read_frame(&mut self) -> Option<RgbImage> {
        if let Some(frame) = self.pending.take() {
            return self.to_rgb_image(&frame);
        }
        let frame = self.next_raw()?;
        self.to_rgb_image(&frame)
    }

    /// Reposition the decode cursor so that the next `read_frame` delivers
    /// the given frame index.
    pub fn seek_to_frame(&mut self, frame: u64) -> Result<(), DecodeError> {
        self.pending = None;

        let timestamp = if self.fps > 0.0 {
            (frame as f64 / self.fps * AV_TIME_BASE) as i64
        } else {
            0
        };

        self.input_ctx.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.at_eof = false;

        // The seek lands on the keyframe at or before the target; decode
        // forward until the target frame is the next one delivered.
        while let Some(decoded) = self.next_raw() {
            if self.frame_index_of(&decoded) >= frame {
                self.pending = Some(decoded);
                break;
            }
        }

        debug!("seeked to frame {}", frame);
        Ok(())
    }

    /// Get the native frame rate.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Get the total number of frames.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Get the native frame width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the native frame height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Decode the next raw frame from the stream.
    fn next_raw(&mut self) -> Option<VideoFrame> {
        // Drain frames the decoder already buffered first
        let mut decoded = VideoFrame::empty();
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            return Some(decoded);
        }

        if self.at_eof {
            return None;
        }

        // Feed packets until a frame comes out
        loop {
            match self.input_ctx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != self.stream_index {
                        continue;
                    }

                    if self.decoder.send_packet(&packet).is_err() {
                        continue;
                    }

                    let mut decoded = VideoFrame::empty();
                    if self.decoder.receive_frame(&mut decoded).is_ok() {
                        return Some(decoded);
                    }
                }
                None => {
                    // End of stream, flush the decoder
                    self.at_eof = true;
                    let _ = self.decoder.send_eof();

                    let mut decoded = VideoFrame::empty();
                    if self.decoder.receive_frame(&mut decoded).is_ok() {
                        return Some(decoded);
                    }
                    return None;
                }
            }
        }
    }

    /// Frame index corresponding to a decoded frame's timestamp.
    fn frame_index_of(&self, frame: &VideoFrame) -> u64 {
        let pts = frame.pts().unwrap_or(0).max(0);
        let seconds = pts as f64 * f64::from(self.time_base);
        (seconds * self.fps).round() as u64
    }

    /// Convert a decoded frame to an RGB image.
    fn to_rgb_image(&mut self, decoded: &VideoFrame) -> Option<RgbImage> {
        let mut rgb_frame = VideoFrame::empty();

        if let Err(e) = self.scaler.run(decoded, &mut rgb_frame) {
            error!("Failed to scale frame: {}", e);
            return None;
        }

        let data = rgb_frame.data(0);
        let stride = rgb_frame.stride(0);
        let width = self.width as usize;
        let height = self.height as usize;

        // Rows are padded when the stride exceeds the pixel width
        if stride == width * 3 {
            RgbImage::from_raw(self.width, self.height, data[..width * height * 3].to_vec())
        } else {
            let mut pixels = Vec::with_capacity(width * height * 3);
            for row in data.chunks(stride).take(height) {
                pixels.extend_from_slice(&row[..width * 3]);
            }
            RgbImage::from_raw(self.width, self.height, pixels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_nonexistent_fails() {
        let result = VideoDecoder::open(Path::new("nonexistent.mp4"));
        assert!(matches!(result, Err(DecodeError::NotFound(_))));
    }

    #[test]
    fn decode_error_names_the_path() {
        let err = DecodeError::NotFound(PathBuf::from("clips/missing.mkv"));
        assert!(err.to_string().contains("missing.mkv"));
    }
}
