//! Media domain types shared by the processor and its collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse classification of the track a processor is responsible for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MediaType {
    Video,
    Audio,
    /// Timed text delivered as media segments (e.g. fMP4 wrapped WebVTT/TTML).
    FragmentedText,
    /// Side-loaded or non-segmented text tracks.
    Text,
}

impl MediaType {
    /// Whether segments of this type share the media buffer timeline.
    pub fn is_segmented(self) -> bool {
        matches!(self, Self::Video | Self::Audio | Self::FragmentedText)
    }
}

/// Metadata identifying one selectable track.
///
/// Processors compare descriptors by identity (`Arc::ptr_eq`), never by
/// value, so two structurally equal descriptors are still distinct tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: Option<String>,
    /// Position of the adaptation set within its period.
    pub index: usize,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub codec: Option<String>,
    pub mime_type: Option<String>,
    pub lang: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Bandwidth of every representation, in bits per second.
    #[serde(default)]
    pub bitrate_list: Vec<u64>,
    pub representation_count: usize,
    pub is_text: bool,
}

impl MediaInfo {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            id: None,
            index: 0,
            media_type,
            codec: None,
            mime_type: None,
            lang: None,
            roles: Vec::new(),
            bitrate_list: Vec::new(),
            representation_count: 0,
            is_text: matches!(media_type, MediaType::FragmentedText | MediaType::Text),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_bitrates(mut self, bitrates: impl Into<Vec<u64>>) -> Self {
        self.bitrate_list = bitrates.into();
        self.representation_count = self.bitrate_list.len();
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Live/on-demand classification and timing basis of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestInfo {
    pub is_dynamic: bool,
    /// Seconds since epoch at which a live presentation became available.
    pub availability_start_time: Option<f64>,
    pub dvr_window_size: Option<Duration>,
    pub min_buffer_time: Option<Duration>,
    pub duration: Option<Duration>,
}

/// Period-level metadata of the stream owning a processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub id: String,
    pub index: usize,
    /// Presentation start of the period, in seconds.
    pub start: f64,
    pub duration: Option<f64>,
    pub manifest_info: ManifestInfo,
    pub is_last: bool,
}

impl StreamInfo {
    pub fn new(id: impl Into<String>, manifest_info: ManifestInfo) -> Self {
        Self {
            id: id.into(),
            index: 0,
            start: 0.0,
            duration: None,
            manifest_info,
            is_last: true,
        }
    }
}

/// Summary of one representation as resolved by the manifest adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentationInfo {
    pub id: Option<String>,
    pub quality: usize,
    pub bandwidth: u64,
    /// Nominal segment duration, in seconds.
    pub fragment_duration: Option<f64>,
    /// Presentation time offset of the representation, in seconds.
    pub mse_time_offset: f64,
    pub media_info: Arc<MediaInfo>,
}

/// A parsed manifest as handed around by the manifest model.
///
/// The processor only passes it through; the manifest adapter reads all
/// of its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Location the manifest was fetched from, the base for relative segment URLs
    pub url: Option<String>,
    /// Wall-clock load time in seconds, used by the adapter for live refreshes
    pub loaded_at: Option<f64>,
    pub document: serde_json::Value,
}

impl Manifest {
    pub fn new(document: serde_json::Value) -> Self {
        Self {
            document,
            ..Default::default()
        }
    }
}

/// Handle to the media source the buffers of a stream are attached to.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaSource {
    id: Uuid,
}

impl MediaSource {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for MediaSource {
    fn default() -> Self {
        Self::new()
    }
}

pub type MediaSourceHandle = Arc<MediaSource>;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to one append buffer created for a track.
#[derive(Debug)]
pub struct SourceBuffer {
    id: u64,
    media_type: MediaType,
    codec: Option<String>,
}

impl SourceBuffer {
    /// Allocates a buffer handle for `media_info`.
    pub fn for_media_info(media_info: &MediaInfo) -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            media_type: media_info.media_type,
            codec: media_info.codec.clone(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn codec(&self) -> Option<&str> {
        self.codec.as_deref()
    }
}

pub type SourceBufferHandle = Arc<SourceBuffer>;
