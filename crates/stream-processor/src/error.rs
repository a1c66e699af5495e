use crate::media::MediaType;
use crate::processor::ProcessorState;

#[derive(Debug, thiserror::Error)]
pub enum StreamProcessorError {
    #[error("`{operation}` called while the processor is {state}")]
    InvalidState {
        operation: &'static str,
        state: ProcessorState,
    },

    #[error("owning stream was dropped before the processor was reset")]
    OwnerDropped,

    #[error("no manifest loaded")]
    NoManifest,

    #[error("configuration error: {reason}")]
    Configuration { reason: String },
}

impl StreamProcessorError {
    pub fn invalid_state(operation: &'static str, state: ProcessorState) -> Self {
        Self::InvalidState { operation, state }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}

/// Runtime faults raised by collaborators and routed to the shared
/// [`ErrorHandler`](crate::collaborators::ErrorHandler).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaybackFault {
    #[error("{media_type} segment download failed for {url}: {reason}")]
    Download {
        media_type: MediaType,
        url: String,
        reason: String,
    },

    #[error("{media_type} append failed: {reason}")]
    Append { media_type: MediaType, reason: String },

    #[error("manifest error: {reason}")]
    Manifest { reason: String },

    #[error("media source error: {reason}")]
    MediaSource { reason: String },
}

impl PlaybackFault {
    pub fn download(media_type: MediaType, url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Download {
            media_type,
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn append(media_type: MediaType, reason: impl Into<String>) -> Self {
        Self::Append {
            media_type,
            reason: reason.into(),
        }
    }

    /// The media type the fault is attributable to, if any.
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::Download { media_type, .. } | Self::Append { media_type, .. } => Some(*media_type),
            Self::Manifest { .. } | Self::MediaSource { .. } => None,
        }
    }
}
