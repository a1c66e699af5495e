//! Construction of the collaborators a processor owns.

use std::sync::Arc;

use crate::collaborators::{
    ErrorHandler, FragmentLoader, ManifestAdapter, ManifestModel, MediaBufferController,
    ProcessorServices, RequestModifier, ScheduleController, TextController,
};
use crate::config::StreamProcessorConfig;
use crate::handle::ProcessorHandle;
use crate::media::{MediaInfo, MediaSourceHandle, MediaType, SourceBufferHandle};
use crate::metrics::ProcessorMetrics;

/// Which buffer controller variant a media type needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BufferKind {
    /// Full controller owning a media append buffer.
    Media,
    /// Text controller without append or eviction.
    Text,
}

impl BufferKind {
    pub fn for_media_type(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Video | MediaType::Audio | MediaType::FragmentedText => Self::Media,
            MediaType::Text => Self::Text,
        }
    }
}

/// The buffer controller variant owned by a processor.
pub enum BufferController {
    Media(Box<dyn MediaBufferController>),
    Text(Box<dyn TextController>),
}

impl BufferController {
    pub fn kind(&self) -> BufferKind {
        match self {
            Self::Media(_) => BufferKind::Media,
            Self::Text(_) => BufferKind::Text,
        }
    }

    pub fn initialize(
        &mut self,
        media_type: MediaType,
        media_source: MediaSourceHandle,
        processor: ProcessorHandle,
    ) {
        match self {
            Self::Media(c) => c.initialize(media_type, media_source, processor),
            Self::Text(c) => c.initialize(media_type, media_source, processor),
        }
    }

    pub fn buffer(&self) -> Option<SourceBufferHandle> {
        match self {
            Self::Media(c) => c.buffer(),
            Self::Text(c) => c.buffer(),
        }
    }

    pub fn set_buffer(&mut self, buffer: SourceBufferHandle) {
        match self {
            Self::Media(c) => c.set_buffer(buffer),
            Self::Text(c) => c.set_buffer(buffer),
        }
    }

    pub fn media_source(&self) -> Option<MediaSourceHandle> {
        match self {
            Self::Media(c) => c.media_source(),
            Self::Text(c) => c.media_source(),
        }
    }

    pub fn is_buffering_completed(&self) -> bool {
        match self {
            Self::Media(c) => c.is_buffering_completed(),
            Self::Text(c) => c.is_buffering_completed(),
        }
    }

    pub fn create_buffer(
        &mut self,
        media_info: Option<&Arc<MediaInfo>>,
    ) -> Option<SourceBufferHandle> {
        match self {
            Self::Media(c) => c.create_buffer(media_info),
            Self::Text(c) => c.create_buffer(media_info),
        }
    }

    pub fn reset(&mut self, errored: bool) {
        match self {
            Self::Media(c) => c.reset(errored),
            Self::Text(c) => c.reset(errored),
        }
    }
}

impl std::fmt::Debug for BufferController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BufferController").field(&self.kind()).finish()
    }
}

/// Shared dependencies handed to every constructed collaborator.
#[derive(Clone)]
pub struct CollaboratorContext {
    pub media_type: MediaType,
    pub config: Arc<StreamProcessorConfig>,
    pub manifest_model: Arc<dyn ManifestModel>,
    pub manifest_adapter: Arc<dyn ManifestAdapter>,
    pub metrics: Arc<ProcessorMetrics>,
    pub error_handler: Arc<dyn ErrorHandler>,
    pub request_modifier: Option<Arc<dyn RequestModifier>>,
}

impl CollaboratorContext {
    pub fn new(
        media_type: MediaType,
        config: Arc<StreamProcessorConfig>,
        services: &ProcessorServices,
        metrics: Arc<ProcessorMetrics>,
    ) -> Self {
        Self {
            media_type,
            config,
            manifest_model: Arc::clone(&services.manifest_model),
            manifest_adapter: Arc::clone(&services.manifest_adapter),
            metrics,
            error_handler: Arc::clone(&services.error_handler),
            request_modifier: services.request_modifier.clone(),
        }
    }
}

/// Builds the collaborators a processor owns.
///
/// Implementors provide one constructor per concrete collaborator; the
/// choice between the media and text buffer controllers is made by
/// [`create_buffer_controller`](Self::create_buffer_controller).
pub trait CollaboratorFactory: Send + Sync {
    fn create_schedule_controller(&self, ctx: &CollaboratorContext) -> Box<dyn ScheduleController>;

    fn create_fragment_loader(&self, ctx: &CollaboratorContext) -> Arc<dyn FragmentLoader>;

    fn create_media_buffer_controller(
        &self,
        ctx: &CollaboratorContext,
    ) -> Box<dyn MediaBufferController>;

    fn create_text_controller(&self, ctx: &CollaboratorContext) -> Box<dyn TextController>;

    fn create_buffer_controller(&self, ctx: &CollaboratorContext) -> BufferController {
        match BufferKind::for_media_type(ctx.media_type) {
            BufferKind::Media => BufferController::Media(self.create_media_buffer_controller(ctx)),
            BufferKind::Text => BufferController::Text(self.create_text_controller(ctx)),
        }
    }
}
