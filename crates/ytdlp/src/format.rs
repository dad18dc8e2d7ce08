//! Format descriptors and the probe filtering policy.
//!
//! The tool reports dozens of raw formats per video; clients only ever see a
//! short, stable list: mp4 formats with both tracks at a fixed set of target
//! heights, de-duplicated by resolution, plus at most one audio-only option.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Video heights eligible for the probe response.
pub const DEFAULT_TARGET_HEIGHTS: [u32; 6] = [144, 240, 360, 480, 720, 1080];

/// Upper bound on descriptors returned by a single probe.
pub const MAX_FORMATS: usize = 8;

/// Containers eligible for the single audio-only slot.
const AUDIO_CONTAINERS: [&str; 2] = ["m4a", "webm"];

/// One raw format entry from the tool's JSON dump.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

impl RawFormat {
    /// The tool reports `"none"` for an absent track, not a missing field.
    fn has_video(&self) -> bool {
        matches!(self.vcodec.as_deref(), Some(codec) if codec != "none")
    }

    fn has_audio(&self) -> bool {
        matches!(self.acodec.as_deref(), Some(codec) if codec != "none")
    }
}

/// A selectable quality/container option surfaced to clients.
///
/// Produced fresh on every probe; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    pub ext: String,
    /// Resolution label such as `"720p"`, or `"audio only"`.
    pub resolution: String,
    /// Approximate size in bytes; zero when the tool does not report one.
    pub filesize: u64,
    pub format_note: String,
    pub has_video: bool,
    pub has_audio: bool,
}

/// Reduce the tool's raw format dump to the client-facing list.
///
/// Video candidates are restricted to `target_heights`, must be mp4 with
/// both a video and an audio track, and are de-duplicated by resolution
/// label with the first match winning. A single audio-only candidate (m4a
/// or webm, first encountered) is appended after the video entries. The
/// result is capped at [`MAX_FORMATS`].
pub fn filter_formats(formats: &[RawFormat], target_heights: &[u32]) -> Vec<FormatDescriptor> {
    let mut selected = Vec::new();
    let mut seen = HashSet::new();

    for format in formats {
        let Some(height) = format.height else {
            continue;
        };
        if !target_heights.contains(&height) {
            continue;
        }
        if format.ext.as_deref() != Some("mp4") || !format.has_video() || !format.has_audio() {
            continue;
        }
        let Some(format_id) = format.format_id.clone() else {
            continue;
        };
        let label = format!("{height}p");
        if !seen.insert(label.clone()) {
            continue;
        }
        selected.push(FormatDescriptor {
            format_id,
            ext: "mp4".to_string(),
            resolution: label,
            filesize: format.filesize.unwrap_or(0),
            format_note: "Fast (video+audio)".to_string(),
            has_video: true,
            has_audio: true,
        });
    }

    for format in formats {
        if format.has_video() || !format.has_audio() {
            continue;
        }
        let Some(ext) = format.ext.as_deref() else {
            continue;
        };
        if !AUDIO_CONTAINERS.contains(&ext) {
            continue;
        }
        let Some(format_id) = format.format_id.clone() else {
            continue;
        };
        selected.push(FormatDescriptor {
            format_id,
            ext: ext.to_string(),
            resolution: "audio only".to_string(),
            filesize: format.filesize.unwrap_or(0),
            format_note: "Audio only".to_string(),
            has_video: false,
            has_audio: true,
        });
        break;
    }

    selected.truncate(MAX_FORMATS);
    selected
}

/// Requested delivery container for a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Container passthrough of the probe-selected format.
    Mp4,
    /// Best m4a audio track.
    M4a,
    /// Best webm audio track.
    Webm,
    /// Best audio, transcoded to mp3 in a post-processing step.
    Mp3,
}

impl OutputKind {
    /// Tool-internal format selector for this output kind.
    pub fn selector(&self, format_id: &str) -> String {
        match self {
            Self::Mp4 => format!("{format_id}/best[ext=mp4]/best"),
            Self::M4a => "bestaudio[ext=m4a]/bestaudio".to_string(),
            Self::Webm => "bestaudio[ext=webm]/bestaudio".to_string(),
            Self::Mp3 => "bestaudio/best".to_string(),
        }
    }

    /// Whether the tool must run a transcode step after the transfer.
    pub fn needs_transcode(&self) -> bool {
        matches!(self, Self::Mp3)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::M4a => "m4a",
            Self::Webm => "webm",
            Self::Mp3 => "mp3",
        }
    }
}

impl std::str::FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mp4" => Ok(Self::Mp4),
            "m4a" => Ok(Self::M4a),
            "webm" => Ok(Self::Webm),
            "mp3" => Ok(Self::Mp3),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}

impl std::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
