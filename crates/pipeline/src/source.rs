//! Video frame sources.
//!
//! A [`VideoOpener`] turns an uploaded file into a [`FrameSource`] that
//! yields only the frames selected by [`Sampling`]. Frame count and
//! duration are read once when the source is opened.

use std::path::Path;

use async_trait::async_trait;
use image::RgbImage;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;

use crate::error::PipelineError;
use crate::ffmpeg;

/// Frame rate assumed when the container does not report a usable one.
pub const FALLBACK_FPS: f64 = 30.0;

/// Default: analyze every second source frame.
pub const DEFAULT_FRAME_STRIDE: u64 = 2;

/// Default cap on decoded source frames (one minute at 30 fps).
pub const DEFAULT_MAX_FRAMES: u64 = 1800;

/// Which source frames reach the pose estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampling {
    /// Keep frames whose index is a multiple of this. Treated as 1 when 0.
    pub stride: u64,
    /// Stop after this many source frames.
    pub max_frames: u64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            stride: DEFAULT_FRAME_STRIDE,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl Sampling {
    pub fn keeps(&self, index: u64) -> bool {
        index % self.stride.max(1) == 0
    }

    /// Source frames that will be decoded for a video of `total` frames.
    pub fn decoded_frames(&self, total: u64) -> u64 {
        if total == 0 {
            self.max_frames
        } else {
            total.min(self.max_frames)
        }
    }
}

/// Properties of an opened video.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMeta {
    pub fps: f64,
    /// Total frames in the container; 0 when unknown.
    pub frame_count: u64,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoMeta {
    /// Build metadata, substituting [`FALLBACK_FPS`] for a missing rate.
    pub fn new(fps: f64, frame_count: u64, duration_secs: f64, width: u32, height: u32) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            FALLBACK_FPS
        };
        let duration_secs = if duration_secs > 0.0 {
            duration_secs
        } else {
            frame_count as f64 / fps
        };
        Self {
            fps,
            frame_count,
            duration_secs,
            width,
            height,
        }
    }
}

/// One frame selected for pose estimation.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    /// Index of the frame in the source video.
    pub index: u64,
    pub image: RgbImage,
}

#[async_trait]
pub trait FrameSource: Send {
    fn meta(&self) -> &VideoMeta;

    /// Next sampled frame, or `None` once the video (or the frame cap) is
    /// exhausted.
    async fn next_frame(&mut self) -> Result<Option<SampledFrame>, PipelineError>;
}

#[async_trait]
pub trait VideoOpener: Send + Sync {
    async fn open(
        &self,
        path: &Path,
        sampling: Sampling,
    ) -> Result<Box<dyn FrameSource>, PipelineError>;
}

// ---------------------------------------------------------------------------
// ffmpeg-backed source
// ---------------------------------------------------------------------------

/// Opens videos with `ffprobe` and decodes them through an `ffmpeg` pipe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

#[async_trait]
impl VideoOpener for FfmpegOpener {
    async fn open(
        &self,
        path: &Path,
        sampling: Sampling,
    ) -> Result<Box<dyn FrameSource>, PipelineError> {
        let probe = ffmpeg::probe_video(path).await?;
        let (width, height) = ffmpeg::parse_display_resolution(&probe);
        if width == 0 || height == 0 {
            return Err(PipelineError::Input(
                "Unable to open video file: no video stream found".into(),
            ));
        }

        let meta = VideoMeta::new(
            ffmpeg::parse_framerate(&probe),
            ffmpeg::parse_total_frames(&probe),
            ffmpeg::parse_duration(&probe),
            width,
            height,
        );
        tracing::debug!(
            width,
            height,
            rotation = ffmpeg::parse_rotation(&probe),
            fps = meta.fps,
            frames = meta.frame_count,
            duration = meta.duration_secs,
            "Opened video"
        );

        let mut child = ffmpeg::spawn_rgb_decoder(path, sampling.max_frames)?;
        let stdout = child.stdout.take().ok_or_else(|| {
            PipelineError::Input("ffmpeg decoder has no output pipe".into())
        })?;
        let stderr = ffmpeg::capture_stderr(&mut child);

        Ok(Box::new(FfmpegFrameSource {
            frame_bytes: width as usize * height as usize * 3,
            meta,
            sampling,
            child,
            stdout,
            stderr,
            next_index: 0,
            finished: false,
        }))
    }
}

/// Result of reading one raw frame from the decoder pipe.
#[derive(Debug, PartialEq)]
enum RawFrame {
    Full(Vec<u8>),
    /// Clean end of stream on a frame boundary.
    End,
    /// The stream stopped after this many bytes of a frame.
    Partial(usize),
}

async fn read_raw_frame<R>(reader: &mut R, frame_bytes: usize) -> std::io::Result<RawFrame>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; frame_bytes];
    let mut filled = 0;
    while filled < frame_bytes {
        match reader.read(&mut buf[filled..]).await? {
            0 if filled == 0 => return Ok(RawFrame::End),
            0 => return Ok(RawFrame::Partial(filled)),
            n => filled += n,
        }
    }
    Ok(RawFrame::Full(buf))
}

struct FfmpegFrameSource {
    meta: VideoMeta,
    sampling: Sampling,
    frame_bytes: usize,
    /// Killed on drop.
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    next_index: u64,
    finished: bool,
}

impl FfmpegFrameSource {
    /// Reap the decoder once its output ends. A failed exit means the
    /// frames seen so far are not the whole video.
    async fn finish(&mut self) -> Result<(), PipelineError> {
        self.finished = true;
        ffmpeg::check_exit(&mut self.child, self.stderr.take()).await?;
        Ok(())
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn meta(&self) -> &VideoMeta {
        &self.meta
    }

    async fn next_frame(&mut self) -> Result<Option<SampledFrame>, PipelineError> {
        if self.finished {
            return Ok(None);
        }
        while self.next_index < self.sampling.max_frames {
            let index = self.next_index;
            let raw = match read_raw_frame(&mut self.stdout, self.frame_bytes).await? {
                RawFrame::Full(raw) => raw,
                RawFrame::End => {
                    self.finish().await?;
                    return Ok(None);
                }
                RawFrame::Partial(got) => {
                    self.finish().await?;
                    return Err(PipelineError::Input(format!(
                        "Video stream ended inside frame {index} ({got} of {} bytes)",
                        self.frame_bytes
                    )));
                }
            };
            self.next_index += 1;
            if !self.sampling.keeps(index) {
                continue;
            }
            let image = RgbImage::from_raw(self.meta.width, self.meta.height, raw)
                .ok_or_else(|| PipelineError::Input(format!("Truncated frame {index}")))?;
            return Ok(Some(SampledFrame { index, image }));
        }
        Ok(None)
    }
}
