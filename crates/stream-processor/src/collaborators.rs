//! Contracts of the subsystems a stream processor wires together.
//!
//! Owned collaborators (buffer controllers, schedule controller) are
//! exclusive to one processor and mutated through `&mut self`. Shared
//! collaborators are handed to many processors and take `&self`; they are
//! expected to use interior mutability.

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::error::PlaybackFault;
use crate::handle::ProcessorHandle;
use crate::media::{
    Manifest, MediaInfo, MediaSourceHandle, MediaType, RepresentationInfo, SourceBufferHandle,
    StreamInfo,
};

/// Full buffer controller for tracks on the media buffer timeline.
pub trait MediaBufferController: Send {
    fn initialize(
        &mut self,
        media_type: MediaType,
        media_source: MediaSourceHandle,
        processor: ProcessorHandle,
    );

    fn buffer(&self) -> Option<SourceBufferHandle>;

    fn set_buffer(&mut self, buffer: SourceBufferHandle);

    fn media_source(&self) -> Option<MediaSourceHandle>;

    fn is_buffering_completed(&self) -> bool;

    /// Creates the append buffer for `media_info`. Returns `None` when the
    /// buffer could not be created; the failure is reported to the error
    /// handler by the controller.
    fn create_buffer(&mut self, media_info: Option<&Arc<MediaInfo>>)
    -> Option<SourceBufferHandle>;

    /// `errored` distinguishes teardown after a playback failure from a
    /// regular stop.
    fn reset(&mut self, errored: bool);
}

/// Lightweight controller for text tracks that never enter the media buffer
/// timeline. It has no append or eviction machinery.
pub trait TextController: Send {
    fn initialize(
        &mut self,
        media_type: MediaType,
        media_source: MediaSourceHandle,
        processor: ProcessorHandle,
    );

    fn buffer(&self) -> Option<SourceBufferHandle>;

    fn set_buffer(&mut self, buffer: SourceBufferHandle);

    fn media_source(&self) -> Option<MediaSourceHandle>;

    fn is_buffering_completed(&self) -> bool;

    fn create_buffer(&mut self, media_info: Option<&Arc<MediaInfo>>)
    -> Option<SourceBufferHandle>;

    fn reset(&mut self, errored: bool);
}

/// Decides when and which segment to request next.
#[cfg_attr(test, automock)]
pub trait ScheduleController: Send {
    fn initialize(&mut self, media_type: MediaType, processor: ProcessorHandle);

    /// Starting an already running scheduler must be a no-op.
    fn start(&mut self);

    /// Stopping a stopped scheduler must be a no-op.
    fn stop(&mut self);

    fn reset(&mut self);

    fn fragment_model(&self) -> Arc<dyn FragmentModel>;
}

/// Queue of segment requests issued by a schedule controller.
#[cfg_attr(test, automock)]
pub trait FragmentModel: Send + Sync {
    fn set_loader(&self, loader: Arc<dyn FragmentLoader>);

    /// Drops queued and in-flight requests.
    fn reset(&self);
}

/// Segment transport attached to a fragment model.
pub trait FragmentLoader: Send + Sync {}

#[cfg_attr(test, automock)]
pub trait RepresentationController: Send + Sync {
    fn initialize(&self, processor: ProcessorHandle);

    /// Whether a representation switch is still being resolved.
    fn is_updating(&self) -> bool;

    fn reset(&self);
}

/// Bitrate selection, shared across the processors of every media type.
#[cfg_attr(test, automock)]
pub trait AbrController: Send + Sync {
    fn initialize(&self, media_type: MediaType, processor: ProcessorHandle);
}

/// Maps playback time to segments within a track's timeline.
#[cfg_attr(test, automock)]
pub trait IndexHandler: Send + Sync {
    fn initialize(&self, processor: ProcessorHandle);

    fn set_current_time(&self, time: f64);

    fn reset(&self);
}

/// Bridge between the parsed manifest and the processors using it.
pub trait ManifestAdapter: Send + Sync {
    fn update_data(&self, manifest: &Manifest, processor: &ProcessorHandle);

    fn index_handler_time(&self, processor: &ProcessorHandle) -> f64;

    fn set_index_handler_time(&self, processor: &ProcessorHandle, time: f64);

    fn current_representation_info(
        &self,
        manifest: &Manifest,
        representation_controller: &dyn RepresentationController,
    ) -> Option<RepresentationInfo>;

    fn representation_info_for_quality(
        &self,
        manifest: &Manifest,
        representation_controller: &dyn RepresentationController,
        quality: usize,
    ) -> Option<RepresentationInfo>;
}

/// Holder of the most recently loaded manifest.
pub trait ManifestModel: Send + Sync {
    fn value(&self) -> Option<Arc<Manifest>>;
}

/// The stream (period) aggregate that creates processors.
pub trait StreamOwner: Send + Sync {
    fn stream_info(&self) -> Arc<StreamInfo>;
}

#[cfg_attr(test, automock)]
pub trait PlaybackClock: Send + Sync {
    /// Presentation time, in seconds, at which playback of `stream` begins.
    fn stream_start_time(&self, stream: &StreamInfo) -> f64;
}

/// Shared sink for runtime faults raised by collaborators.
#[cfg_attr(test, automock)]
pub trait ErrorHandler: Send + Sync {
    fn report(&self, fault: PlaybackFault);
}

/// Hook applied by fragment loaders to outgoing segment requests.
pub trait RequestModifier: Send + Sync {
    fn modify_url(&self, url: &str) -> String {
        url.to_owned()
    }
}

/// Player-wide event bus. Opaque to the processor.
pub trait EventController: Send + Sync {}

/// Stream-wide fragment bookkeeping. Opaque to the processor.
pub trait FragmentController: Send + Sync {}

/// Shared collaborators injected into every processor.
#[derive(Clone)]
pub struct ProcessorServices {
    pub representation_controller: Arc<dyn RepresentationController>,
    pub abr_controller: Arc<dyn AbrController>,
    pub manifest_adapter: Arc<dyn ManifestAdapter>,
    pub manifest_model: Arc<dyn ManifestModel>,
    pub index_handler: Arc<dyn IndexHandler>,
    pub clock: Arc<dyn PlaybackClock>,
    pub error_handler: Arc<dyn ErrorHandler>,
    pub request_modifier: Option<Arc<dyn RequestModifier>>,
}
