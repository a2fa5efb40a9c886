//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    /// Arguments placed before `-i`
    input_args: Vec<String>,
    /// Arguments placed after `-i`
    output_args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Seek position before the input is opened.
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn video_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:v").output_arg(bitrate)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Extract a single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-vframes").output_arg("1")
    }

    /// Build the full argument list. Always overwrites the output and
    /// routes machine-readable progress to stderr.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ];
        args.extend(self.input_args.clone());
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());
        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Snapshot of FFmpeg's `-progress` key/value stream.
#[derive(Debug, Clone, Default)]
pub struct EncodeProgress {
    /// Output timestamp in milliseconds
    pub out_time_ms: i64,
    /// Whether the encode reported `progress=end`
    pub is_complete: bool,
}

impl EncodeProgress {
    /// Percent complete given the input's total duration.
    pub fn percent(&self, total_duration_ms: i64) -> u8 {
        if total_duration_ms <= 0 {
            return 0;
        }
        let pct = (self.out_time_ms as f64 / total_duration_ms as f64) * 100.0;
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Runner for FFmpeg commands with progress reporting and an optional
/// wall-clock timeout.
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run a command, discarding progress.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run a command, invoking `on_progress` for each progress block the
    /// tool emits.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, on_progress: F) -> MediaResult<()>
    where
        F: Fn(EncodeProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("running ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut lines = BufReader::new(stderr).lines();

        // Progress lines and error output share stderr; keep the tail of
        // anything that is not a progress key for diagnostics.
        let reader = tokio::spawn(async move {
            let mut current = EncodeProgress::default();
            let mut raw_tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current) {
                    on_progress(progress);
                } else if !line.trim().is_empty() && !line.contains('=') {
                    if raw_tail.len() >= 32 {
                        raw_tail.remove(0);
                    }
                    raw_tail.push(line);
                }
            }

            raw_tail.join("\n")
        });

        let status = self.wait_for_exit(&mut child).await?;
        let stderr_tail = reader.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                (!stderr_tail.is_empty()).then_some(stderr_tail),
                status.code(),
            ))
        }
    }

    async fn wait_for_exit(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        match self.timeout_secs {
            Some(secs) => {
                let deadline = std::time::Duration::from_secs(secs);
                match tokio::time::timeout(deadline, child.wait()).await {
                    Ok(result) => Ok(result?),
                    Err(_) => {
                        warn!("ffmpeg timed out after {}s, killing process", secs);
                        let _ = child.kill().await;
                        Err(MediaError::Timeout(secs))
                    }
                }
            }
            None => Ok(child.wait().await?),
        }
    }
}

/// Parse one line of `-progress pipe:2` output. Returns a snapshot when
/// the line terminates a progress block.
fn parse_progress_line(line: &str, current: &mut EncodeProgress) -> Option<EncodeProgress> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        "out_time_us" | "out_time_ms" => {
            // both keys are microseconds in practice
            if let Ok(us) = value.parse::<i64>() {
                current.out_time_ms = us / 1000;
            }
            None
        }
        "progress" => {
            if value == "end" {
                current.is_complete = true;
            }
            Some(current.clone())
        }
        _ => None,
    }
}

/// Check that FFmpeg is installed.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check that FFprobe is installed.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_shape() {
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4")
            .video_filter("scale=1280:720")
            .video_codec("libx264")
            .video_bitrate("2800k")
            .audio_codec("aac");

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[i_pos + 1], "in.mp4");
        assert!(args.contains(&"scale=1280:720".to_string()));
        assert!(args.contains(&"-b:v".to_string()));
        assert!(args.contains(&"2800k".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp4");
    }

    #[test]
    fn seek_args_precede_input() {
        let args = FfmpegCommand::new("in.mp4", "thumb.jpg")
            .seek(5.0)
            .single_frame()
            .build_args();
        let ss_pos = args.iter().position(|a| a == "-ss").unwrap();
        let i_pos = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss_pos < i_pos);
        assert_eq!(args[ss_pos + 1], "5.000");
    }

    #[test]
    fn progress_parsing() {
        let mut current = EncodeProgress::default();

        assert!(parse_progress_line("out_time_us=5000000", &mut current).is_none());
        assert_eq!(current.out_time_ms, 5000);

        let snapshot = parse_progress_line("progress=continue", &mut current).unwrap();
        assert!(!snapshot.is_complete);

        let done = parse_progress_line("progress=end", &mut current).unwrap();
        assert!(done.is_complete);
    }

    #[test]
    fn percent_is_clamped() {
        let progress = EncodeProgress {
            out_time_ms: 5000,
            is_complete: false,
        };
        assert_eq!(progress.percent(10_000), 50);
        assert_eq!(progress.percent(4_000), 100);
        assert_eq!(progress.percent(0), 0);
    }
}
