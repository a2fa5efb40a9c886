//! FFprobe metadata extraction.

use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::adapter::MediaProbe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output shape.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe a file for duration, resolution, codec and container format.
pub async fn probe_file(path: impl AsRef<Path>) -> MediaResult<MediaProbe> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_probe_output(&output.stdout, path)
}

/// Parse raw probe JSON, applying the defaulting rules: missing duration
/// is `0.0`, missing codec/format are `"unknown"`, and a container with
/// no video stream is an error.
fn parse_probe_output(stdout: &[u8], path: &Path) -> MediaResult<MediaProbe> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::NoVideoStream(path.to_path_buf()))?;

    let duration_seconds = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let format = probe
        .format
        .format_name
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    let codec = video_stream
        .codec_name
        .clone()
        .unwrap_or_else(|| "unknown".to_string());

    Ok(MediaProbe {
        duration_seconds,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        codec,
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_probe_output() {
        let json = br#"{
            "format": {"duration": "12.480000", "format_name": "mov,mp4,m4a,3gp,3g2,mj2"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080}
            ]
        }"#;

        let probe = parse_probe_output(json, Path::new("a.mp4")).unwrap();
        assert_eq!(probe.duration_seconds, 12.48);
        assert_eq!(probe.resolution(), "1920x1080");
        assert_eq!(probe.codec, "h264");
        assert_eq!(probe.format, "mov,mp4,m4a,3gp,3g2,mj2");
    }

    #[test]
    fn applies_defaults_for_missing_fields() {
        let json = br#"{
            "format": {},
            "streams": [{"codec_type": "video"}]
        }"#;

        let probe = parse_probe_output(json, Path::new("a.mp4")).unwrap();
        assert_eq!(probe.duration_seconds, 0.0);
        assert_eq!(probe.codec, "unknown");
        assert_eq!(probe.format, "unknown");
        assert_eq!(probe.width, 0);
        assert_eq!(probe.height, 0);
    }

    #[test]
    fn rejects_audio_only_containers() {
        let json = br#"{
            "format": {"duration": "3.0", "format_name": "mp3"},
            "streams": [{"codec_type": "audio", "codec_name": "mp3"}]
        }"#;

        let err = parse_probe_output(json, Path::new("song.mp3")).unwrap_err();
        assert!(matches!(err, MediaError::NoVideoStream(_)));
    }
}
