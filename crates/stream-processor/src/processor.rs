// Stream Processor: wires and drives the subsystems playing one media type of a stream.

use std::sync::{Arc, Weak};

use tracing::{debug, instrument, trace, warn};

use crate::collaborators::{
    AbrController, EventController, FragmentController, FragmentLoader, FragmentModel,
    IndexHandler, ManifestAdapter, ManifestModel, ProcessorServices,
    RepresentationController, ScheduleController, StreamOwner,
};
use crate::config::StreamProcessorConfig;
use crate::error::StreamProcessorError;
use crate::factory::{BufferController, CollaboratorContext, CollaboratorFactory};
use crate::handle::ProcessorHandle;
use crate::media::{
    Manifest, MediaInfo, MediaSourceHandle, MediaType, RepresentationInfo, SourceBufferHandle,
    StreamInfo,
};
use crate::metrics::ProcessorMetrics;
use crate::registry::{TrackRegistry, TrackSlot, TrackUpdate};

type Result<T> = std::result::Result<T, StreamProcessorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProcessorState {
    Uninitialized,
    Active,
    /// Terminal. A reset processor cannot be initialized again.
    Reset,
}

/// Dependencies waiting for `initialize`.
struct Pending {
    services: ProcessorServices,
    factory: Arc<dyn CollaboratorFactory>,
}

/// Everything a processor holds between `initialize` and `reset`.
struct ActiveState {
    media_type: MediaType,
    handle: ProcessorHandle,
    owner: Weak<dyn StreamOwner>,
    is_dynamic: bool,
    event_controller: Arc<dyn EventController>,
    fragment_controller: Arc<dyn FragmentController>,
    tracks: TrackRegistry,

    // owned
    buffer_controller: BufferController,
    schedule_controller: Box<dyn ScheduleController>,
    fragment_loader: Arc<dyn FragmentLoader>,

    // shared
    representation_controller: Arc<dyn RepresentationController>,
    abr_controller: Arc<dyn AbrController>,
    index_handler: Arc<dyn IndexHandler>,
    manifest_adapter: Arc<dyn ManifestAdapter>,
    manifest_model: Arc<dyn ManifestModel>,
}

enum Lifecycle {
    Uninitialized(Box<Pending>),
    Active(Box<ActiveState>),
    Reset,
}

impl Lifecycle {
    fn state(&self) -> ProcessorState {
        match self {
            Self::Uninitialized(_) => ProcessorState::Uninitialized,
            Self::Active(_) => ProcessorState::Active,
            Self::Reset => ProcessorState::Reset,
        }
    }
}

/// Coordinates representation tracking, segment scheduling and buffering
/// for one media type of one stream.
///
/// A processor is created by its owning stream, [`initialize`]d once,
/// toggled with [`start`]/[`stop`], and finally [`reset`]. Every operation
/// other than construction, [`state`] and [`metrics`] fails with
/// [`StreamProcessorError::InvalidState`] outside of the active phase.
///
/// [`initialize`]: Self::initialize
/// [`start`]: Self::start
/// [`stop`]: Self::stop
/// [`reset`]: Self::reset
/// [`state`]: Self::state
/// [`metrics`]: Self::metrics
pub struct StreamProcessor {
    config: Arc<StreamProcessorConfig>,
    metrics: Arc<ProcessorMetrics>,
    lifecycle: Lifecycle,
}

impl StreamProcessor {
    pub fn new(
        config: Arc<StreamProcessorConfig>,
        services: ProcessorServices,
        factory: Arc<dyn CollaboratorFactory>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: Arc::new(ProcessorMetrics::new()),
            lifecycle: Lifecycle::Uninitialized(Box::new(Pending { services, factory })),
        })
    }

    /// Builds and wires every collaborator for `media_type`.
    ///
    /// The wiring order is fixed: the index handler must know the processor
    /// before it is seeked, the buffer controller must exist before the
    /// representation controller is initialized, and the fragment model must
    /// have its loader before the scheduler can issue requests.
    #[instrument(skip_all, fields(media_type = %media_type), level = "debug")]
    pub fn initialize(
        &mut self,
        media_type: MediaType,
        fragment_controller: Arc<dyn FragmentController>,
        media_source: MediaSourceHandle,
        owner: &Arc<dyn StreamOwner>,
        event_controller: Arc<dyn EventController>,
    ) -> Result<()> {
        let pending = match std::mem::replace(&mut self.lifecycle, Lifecycle::Reset) {
            Lifecycle::Uninitialized(pending) => pending,
            other => {
                let state = other.state();
                self.lifecycle = other;
                return Err(StreamProcessorError::invalid_state("initialize", state));
            }
        };
        let Pending { services, factory } = *pending;

        // 1. Owner, type and the lifecycle handle
        let stream_info = owner.stream_info();
        let is_dynamic = stream_info.manifest_info.is_dynamic;
        let handle = ProcessorHandle::new(media_type, Arc::clone(&stream_info));
        trace!(generation = handle.generation(), is_dynamic, "Processor handle created");

        // 2. Shared representation controller
        let representation_controller = Arc::clone(&services.representation_controller);

        // 3-5. Owned collaborators
        let ctx = CollaboratorContext::new(
            media_type,
            Arc::clone(&self.config),
            &services,
            Arc::clone(&self.metrics),
        );
        let mut schedule_controller = factory.create_schedule_controller(&ctx);
        let fragment_loader = factory.create_fragment_loader(&ctx);
        let mut buffer_controller = factory.create_buffer_controller(&ctx);
        trace!(buffer_kind = %buffer_controller.kind(), "Collaborators constructed");

        // 6. Bitrate selection
        let abr_controller = Arc::clone(&services.abr_controller);
        abr_controller.initialize(media_type, handle.clone());

        // 7. Index handler, seeded with the stream start
        let index_handler = Arc::clone(&services.index_handler);
        index_handler.initialize(handle.clone());
        let start_time = services.clock.stream_start_time(&stream_info);
        index_handler.set_current_time(start_time);
        trace!(start_time, "Index handler seeded");

        // 8-9. Buffer and scheduling
        buffer_controller.initialize(media_type, media_source, handle.clone());
        schedule_controller.initialize(media_type, handle.clone());

        // 10. Attach the loader before any request can be issued
        schedule_controller
            .fragment_model()
            .set_loader(Arc::clone(&fragment_loader));

        // 11. Representation controller last, it may query buffering state
        representation_controller.initialize(handle.clone());

        debug!(
            stream_id = %stream_info.id,
            generation = handle.generation(),
            is_dynamic,
            "Stream processor initialized"
        );

        self.lifecycle = Lifecycle::Active(Box::new(ActiveState {
            media_type,
            handle,
            owner: Arc::downgrade(owner),
            is_dynamic,
            event_controller,
            fragment_controller,
            tracks: TrackRegistry::new(),
            buffer_controller,
            schedule_controller,
            fragment_loader,
            representation_controller,
            abr_controller,
            index_handler,
            manifest_adapter: Arc::clone(&services.manifest_adapter),
            manifest_model: Arc::clone(&services.manifest_model),
        }));
        Ok(())
    }

    pub fn state(&self) -> ProcessorState {
        self.lifecycle.state()
    }

    pub fn metrics(&self) -> &Arc<ProcessorMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &Arc<StreamProcessorConfig> {
        &self.config
    }

    /// Liveness handle of the current lifecycle.
    pub fn handle(&self) -> Result<&ProcessorHandle> {
        Ok(&self.active("handle")?.handle)
    }

    pub fn is_updating(&self) -> Result<bool> {
        Ok(self
            .active("is_updating")?
            .representation_controller
            .is_updating())
    }

    pub fn media_type(&self) -> Result<MediaType> {
        Ok(self.active("media_type")?.media_type)
    }

    pub fn abr_controller(&self) -> Result<&Arc<dyn AbrController>> {
        Ok(&self.active("abr_controller")?.abr_controller)
    }

    pub fn fragment_loader(&self) -> Result<&Arc<dyn FragmentLoader>> {
        Ok(&self.active("fragment_loader")?.fragment_loader)
    }

    pub fn buffer(&self) -> Result<Option<SourceBufferHandle>> {
        Ok(self.active("buffer")?.buffer_controller.buffer())
    }

    pub fn set_buffer(&mut self, buffer: SourceBufferHandle) -> Result<()> {
        self.active_mut("set_buffer")?
            .buffer_controller
            .set_buffer(buffer);
        Ok(())
    }

    pub fn fragment_model(&self) -> Result<Arc<dyn FragmentModel>> {
        Ok(self
            .active("fragment_model")?
            .schedule_controller
            .fragment_model())
    }

    /// Metadata of the owning stream, queried live from the owner.
    pub fn stream_info(&self) -> Result<Arc<StreamInfo>> {
        let owner = self
            .active("stream_info")?
            .owner
            .upgrade()
            .ok_or(StreamProcessorError::OwnerDropped)?;
        Ok(owner.stream_info())
    }

    /// Every distinct track descriptor offered to this processor.
    pub fn media_info_arr(&self) -> Result<&[TrackSlot]> {
        Ok(self.active("media_info_arr")?.tracks.known())
    }

    /// The currently selected track descriptor.
    pub fn media_info(&self) -> Result<Option<&Arc<MediaInfo>>> {
        Ok(self.active("media_info")?.tracks.current())
    }

    pub fn media_source(&self) -> Result<Option<MediaSourceHandle>> {
        Ok(self.active("media_source")?.buffer_controller.media_source())
    }

    pub fn schedule_controller(&self) -> Result<&dyn ScheduleController> {
        Ok(self
            .active("schedule_controller")?
            .schedule_controller
            .as_ref())
    }

    pub fn schedule_controller_mut(&mut self) -> Result<&mut dyn ScheduleController> {
        Ok(self
            .active_mut("schedule_controller_mut")?
            .schedule_controller
            .as_mut())
    }

    pub fn fragment_controller(&self) -> Result<&Arc<dyn FragmentController>> {
        Ok(&self.active("fragment_controller")?.fragment_controller)
    }

    pub fn event_controller(&self) -> Result<&Arc<dyn EventController>> {
        Ok(&self.active("event_controller")?.event_controller)
    }

    pub fn index_handler_time(&self) -> Result<f64> {
        let active = self.active("index_handler_time")?;
        Ok(active.manifest_adapter.index_handler_time(&active.handle))
    }

    pub fn set_index_handler_time(&self, time: f64) -> Result<()> {
        let active = self.active("set_index_handler_time")?;
        active
            .manifest_adapter
            .set_index_handler_time(&active.handle, time);
        Ok(())
    }

    pub fn current_representation_info(&self) -> Result<Option<RepresentationInfo>> {
        let active = self.active("current_representation_info")?;
        let manifest = active.current_manifest()?;
        Ok(active
            .manifest_adapter
            .current_representation_info(&manifest, active.representation_controller.as_ref()))
    }

    pub fn representation_info_for_quality(
        &self,
        quality: usize,
    ) -> Result<Option<RepresentationInfo>> {
        let active = self.active("representation_info_for_quality")?;
        let manifest = active.current_manifest()?;
        Ok(active.manifest_adapter.representation_info_for_quality(
            &manifest,
            active.representation_controller.as_ref(),
            quality,
        ))
    }

    pub fn is_buffering_completed(&self) -> Result<bool> {
        Ok(self
            .active("is_buffering_completed")?
            .buffer_controller
            .is_buffering_completed())
    }

    pub fn is_dynamic(&self) -> Result<bool> {
        Ok(self.active("is_dynamic")?.is_dynamic)
    }

    /// Offers a track descriptor to the processor.
    ///
    /// The descriptor becomes current only under
    /// [`accepts_as_current`](crate::registry::accepts_as_current), is
    /// recorded among the known descriptors either way, and the manifest is
    /// always forwarded to the adapter.
    pub fn update_media_info(
        &mut self,
        manifest: &Manifest,
        media_info: Option<Arc<MediaInfo>>,
    ) -> Result<TrackUpdate> {
        let metrics_enabled = self.config.metrics_enabled;
        let active = self.active_mut("update_media_info")?;

        let candidate_type = media_info.as_ref().map(|info| info.media_type);
        let outcome = active.tracks.update(media_info);
        if outcome.rejected_mismatch {
            debug!(
                media_type = %active.media_type,
                candidate = ?candidate_type,
                recorded = outcome.recorded,
                "Track descriptor of another media type not taken as current"
            );
        }

        active.manifest_adapter.update_data(manifest, &active.handle);

        if metrics_enabled {
            self.metrics.record_track_update(outcome.rejected_mismatch);
        }
        Ok(outcome)
    }

    /// Returns the track's append buffer, creating it from the current
    /// descriptor on first use.
    pub fn create_buffer(&mut self) -> Result<Option<SourceBufferHandle>> {
        let metrics_enabled = self.config.metrics_enabled;
        let active = self.active_mut("create_buffer")?;

        if let Some(buffer) = active.buffer_controller.buffer() {
            if metrics_enabled {
                self.metrics.record_buffer(false);
            }
            return Ok(Some(buffer));
        }

        let buffer = active
            .buffer_controller
            .create_buffer(active.tracks.current());
        match &buffer {
            Some(created) => {
                debug!(
                    media_type = %active.media_type,
                    buffer_id = created.id(),
                    "Source buffer created"
                );
                if metrics_enabled {
                    self.metrics.record_buffer(true);
                }
            }
            None => warn!(
                media_type = %active.media_type,
                "Buffer controller did not create a buffer"
            ),
        }
        Ok(buffer)
    }

    pub fn start(&mut self) -> Result<()> {
        self.active_mut("start")?.schedule_controller.start();
        if self.config.metrics_enabled {
            self.metrics.record_start();
        }
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.active_mut("stop")?.schedule_controller.stop();
        if self.config.metrics_enabled {
            self.metrics.record_stop();
        }
        Ok(())
    }

    /// Tears down every collaborator and leaves the processor terminal.
    ///
    /// The lifecycle handle is invalidated first so collaborators can drop
    /// completions racing with the teardown. `errored` is forwarded to the
    /// buffer controller.
    #[instrument(skip(self), level = "debug")]
    pub fn reset(&mut self, errored: bool) -> Result<()> {
        let mut active = match std::mem::replace(&mut self.lifecycle, Lifecycle::Reset) {
            Lifecycle::Active(active) => active,
            other => {
                let state = other.state();
                self.lifecycle = other;
                return Err(StreamProcessorError::invalid_state("reset", state));
            }
        };

        if errored {
            warn!(
                media_type = %active.media_type,
                generation = active.handle.generation(),
                "Resetting stream processor after failure"
            );
        } else {
            debug!(
                media_type = %active.media_type,
                generation = active.handle.generation(),
                "Resetting stream processor"
            );
        }

        active.handle.invalidate();

        active.schedule_controller.fragment_model().reset();
        active.index_handler.reset();
        active.buffer_controller.reset(errored);
        active.schedule_controller.reset();
        active.representation_controller.reset();
        active.tracks.clear();

        let media_type = active.media_type;
        // Drops owned collaborators and releases the shared ones.
        drop(active);

        if self.config.metrics_enabled {
            self.metrics.record_reset(errored);
            self.metrics.log_summary(Some(media_type));
        }
        Ok(())
    }

    fn active(&self, operation: &'static str) -> Result<&ActiveState> {
        match &self.lifecycle {
            Lifecycle::Active(active) => Ok(&**active),
            other => Err(StreamProcessorError::invalid_state(operation, other.state())),
        }
    }

    fn active_mut(&mut self, operation: &'static str) -> Result<&mut ActiveState> {
        match &mut self.lifecycle {
            Lifecycle::Active(active) => Ok(&mut **active),
            other => Err(StreamProcessorError::invalid_state(operation, other.state())),
        }
    }
}

impl ActiveState {
    fn current_manifest(&self) -> Result<Arc<Manifest>> {
        self.manifest_model
            .value()
            .ok_or(StreamProcessorError::NoManifest)
    }
}

impl Drop for StreamProcessor {
    fn drop(&mut self) {
        if let Lifecycle::Active(active) = &self.lifecycle {
            active.handle.invalidate();
        }
    }
}

impl std::fmt::Debug for StreamProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("StreamProcessor");
        s.field("state", &self.state());
        if let Lifecycle::Active(active) = &self.lifecycle {
            s.field("media_type", &active.media_type)
                .field("generation", &active.handle.generation())
                .field("is_dynamic", &active.is_dynamic)
                .field("buffer", &active.buffer_controller);
        }
        s.finish()
    }
}
