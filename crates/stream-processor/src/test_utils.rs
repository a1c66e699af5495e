//! Recording fakes for the processor's collaborators.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::collaborators::{
    EventController, FragmentController, FragmentLoader, FragmentModel, IndexHandler,
    ManifestAdapter, ManifestModel, MediaBufferController, MockAbrController, MockErrorHandler,
    MockPlaybackClock, ProcessorServices, RepresentationController, ScheduleController,
    StreamOwner, TextController,
};
use crate::config::StreamProcessorConfig;
use crate::factory::{CollaboratorContext, CollaboratorFactory};
use crate::handle::ProcessorHandle;
use crate::media::{
    Manifest, ManifestInfo, MediaInfo, MediaSource, MediaSourceHandle, MediaType,
    RepresentationInfo, SourceBuffer, SourceBufferHandle, StreamInfo,
};
use crate::metrics::ProcessorMetrics;
use crate::processor::StreamProcessor;

/// Initialize tracing for tests with appropriate settings
#[inline]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Ordered record of collaborator calls shared by all fakes of a harness.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

#[derive(Debug, Default)]
pub struct FakeRepresentation {
    log: CallLog,
    pub updating: Mutex<bool>,
    pub processor: Mutex<Option<ProcessorHandle>>,
}

impl RepresentationController for FakeRepresentation {
    fn initialize(&self, processor: ProcessorHandle) {
        self.log.push("representation.initialize");
        *self.processor.lock() = Some(processor);
    }

    fn is_updating(&self) -> bool {
        *self.updating.lock()
    }

    fn reset(&self) {
        self.log.push("representation.reset");
        *self.processor.lock() = None;
    }
}

#[derive(Debug, Default)]
pub struct FakeIndexHandler {
    log: CallLog,
    pub current_time: Mutex<Option<f64>>,
}

impl IndexHandler for FakeIndexHandler {
    fn initialize(&self, _processor: ProcessorHandle) {
        self.log.push("index.initialize");
    }

    fn set_current_time(&self, time: f64) {
        self.log.push("index.set_current_time");
        *self.current_time.lock() = Some(time);
    }

    fn reset(&self) {
        self.log.push("index.reset");
    }
}

#[derive(Debug, Default)]
pub struct FakeAdapter {
    log: CallLog,
    pub index_time: Mutex<f64>,
    pub updates: Mutex<Vec<u64>>,
}

impl FakeAdapter {
    fn representation(
        representation_controller: &dyn RepresentationController,
        quality: usize,
    ) -> Option<RepresentationInfo> {
        if representation_controller.is_updating() {
            return None;
        }
        let bitrates = vec![400_000, 1_200_000, 3_000_000];
        let bandwidth = *bitrates.get(quality)?;
        Some(RepresentationInfo {
            id: Some(format!("v{quality}")),
            quality,
            bandwidth,
            fragment_duration: Some(4.0),
            mse_time_offset: 0.0,
            media_info: MediaInfo::new(MediaType::Video)
                .with_bitrates(bitrates)
                .into_shared(),
        })
    }
}

impl ManifestAdapter for FakeAdapter {
    fn update_data(&self, _manifest: &Manifest, processor: &ProcessorHandle) {
        self.log.push("adapter.update_data");
        self.updates.lock().push(processor.generation());
    }

    fn index_handler_time(&self, _processor: &ProcessorHandle) -> f64 {
        *self.index_time.lock()
    }

    fn set_index_handler_time(&self, _processor: &ProcessorHandle, time: f64) {
        *self.index_time.lock() = time;
    }

    fn current_representation_info(
        &self,
        _manifest: &Manifest,
        representation_controller: &dyn RepresentationController,
    ) -> Option<RepresentationInfo> {
        Self::representation(representation_controller, 0)
    }

    fn representation_info_for_quality(
        &self,
        _manifest: &Manifest,
        representation_controller: &dyn RepresentationController,
        quality: usize,
    ) -> Option<RepresentationInfo> {
        Self::representation(representation_controller, quality)
    }
}

#[derive(Debug, Default)]
pub struct FakeManifestModel {
    pub manifest: Mutex<Option<Arc<Manifest>>>,
}

impl ManifestModel for FakeManifestModel {
    fn value(&self) -> Option<Arc<Manifest>> {
        self.manifest.lock().clone()
    }
}

/// Clock placing the playback start `offset` seconds into the stream.
pub fn offset_clock(offset: f64) -> MockPlaybackClock {
    let mut clock = MockPlaybackClock::new();
    clock
        .expect_stream_start_time()
        .returning(move |stream| stream.start + offset);
    clock
}

/// ABR controller accepting any registration and logging it.
pub fn logging_abr(log: CallLog) -> MockAbrController {
    let mut abr = MockAbrController::new();
    abr.expect_initialize()
        .returning(move |_, _| log.push("abr.initialize"));
    abr
}

/// Error handler accepting any fault.
pub fn lenient_error_handler() -> MockErrorHandler {
    let mut errors = MockErrorHandler::new();
    errors.expect_report().return_const(());
    errors
}

#[derive(Debug)]
pub struct FakeOwner {
    pub info: Mutex<Arc<StreamInfo>>,
}

impl StreamOwner for FakeOwner {
    fn stream_info(&self) -> Arc<StreamInfo> {
        self.info.lock().clone()
    }
}

#[derive(Debug, Default)]
pub struct NoopEvents;

impl EventController for NoopEvents {}

#[derive(Debug, Default)]
pub struct NoopFragmentController;

impl FragmentController for NoopFragmentController {}

#[derive(Debug, Default)]
pub struct FakeLoader;

impl FragmentLoader for FakeLoader {}

#[derive(Default)]
pub struct FakeFragmentModel {
    log: CallLog,
    pub loader: Mutex<Option<Arc<dyn FragmentLoader>>>,
}

impl FragmentModel for FakeFragmentModel {
    fn set_loader(&self, loader: Arc<dyn FragmentLoader>) {
        self.log.push("fragment_model.set_loader");
        *self.loader.lock() = Some(loader);
    }

    fn reset(&self) {
        self.log.push("fragment_model.reset");
        *self.loader.lock() = None;
    }
}

pub struct FakeSchedule {
    log: CallLog,
    model: Arc<FakeFragmentModel>,
    pub running: Arc<Mutex<bool>>,
}

impl ScheduleController for FakeSchedule {
    fn initialize(&mut self, _media_type: MediaType, _processor: ProcessorHandle) {
        self.log.push("schedule.initialize");
    }

    fn start(&mut self) {
        let mut running = self.running.lock();
        if !*running {
            self.log.push("schedule.start");
            *running = true;
        }
    }

    fn stop(&mut self) {
        let mut running = self.running.lock();
        if *running {
            self.log.push("schedule.stop");
            *running = false;
        }
    }

    fn reset(&mut self) {
        self.log.push("schedule.reset");
        *self.running.lock() = false;
    }

    fn fragment_model(&self) -> Arc<dyn FragmentModel> {
        self.model.clone()
    }
}

/// Buffer controller fake usable for both the media and the text variant.
pub struct FakeBuffer {
    log: CallLog,
    buffer: Option<SourceBufferHandle>,
    media_source: Option<MediaSourceHandle>,
    completed: Arc<Mutex<bool>>,
}

impl FakeBuffer {
    fn new(log: CallLog, completed: Arc<Mutex<bool>>) -> Self {
        Self {
            log,
            buffer: None,
            media_source: None,
            completed,
        }
    }

    fn create(&mut self, media_info: Option<&Arc<MediaInfo>>) -> Option<SourceBufferHandle> {
        self.log.push("buffer.create_buffer");
        let buffer = Arc::new(SourceBuffer::for_media_info(media_info?));
        self.buffer = Some(buffer.clone());
        Some(buffer)
    }
}

impl MediaBufferController for FakeBuffer {
    fn initialize(
        &mut self,
        _media_type: MediaType,
        media_source: MediaSourceHandle,
        _processor: ProcessorHandle,
    ) {
        self.log.push("buffer.initialize");
        self.media_source = Some(media_source);
    }

    fn buffer(&self) -> Option<SourceBufferHandle> {
        self.buffer.clone()
    }

    fn set_buffer(&mut self, buffer: SourceBufferHandle) {
        self.buffer = Some(buffer);
    }

    fn media_source(&self) -> Option<MediaSourceHandle> {
        self.media_source.clone()
    }

    fn is_buffering_completed(&self) -> bool {
        *self.completed.lock()
    }

    fn create_buffer(
        &mut self,
        media_info: Option<&Arc<MediaInfo>>,
    ) -> Option<SourceBufferHandle> {
        self.create(media_info)
    }

    fn reset(&mut self, errored: bool) {
        self.log.push(format!("buffer.reset(errored={errored})"));
        self.buffer = None;
    }
}

impl TextController for FakeBuffer {
    fn initialize(
        &mut self,
        _media_type: MediaType,
        media_source: MediaSourceHandle,
        _processor: ProcessorHandle,
    ) {
        self.log.push("text.initialize");
        self.media_source = Some(media_source);
    }

    fn buffer(&self) -> Option<SourceBufferHandle> {
        self.buffer.clone()
    }

    fn set_buffer(&mut self, buffer: SourceBufferHandle) {
        self.buffer = Some(buffer);
    }

    fn media_source(&self) -> Option<MediaSourceHandle> {
        self.media_source.clone()
    }

    fn is_buffering_completed(&self) -> bool {
        *self.completed.lock()
    }

    fn create_buffer(
        &mut self,
        media_info: Option<&Arc<MediaInfo>>,
    ) -> Option<SourceBufferHandle> {
        self.create(media_info)
    }

    fn reset(&mut self, errored: bool) {
        self.log.push(format!("text.reset(errored={errored})"));
        self.buffer = None;
    }
}

pub struct FakeFactory {
    log: CallLog,
    pub fragment_model: Arc<FakeFragmentModel>,
    pub running: Arc<Mutex<bool>>,
    pub buffering_completed: Arc<Mutex<bool>>,
    /// Config of the most recent context the factory was handed.
    pub last_config: Mutex<Option<Arc<StreamProcessorConfig>>>,
}

impl CollaboratorFactory for FakeFactory {
    fn create_schedule_controller(&self, ctx: &CollaboratorContext) -> Box<dyn ScheduleController> {
        self.log.push("schedule.new");
        *self.last_config.lock() = Some(Arc::clone(&ctx.config));
        Box::new(FakeSchedule {
            log: self.log.clone(),
            model: self.fragment_model.clone(),
            running: self.running.clone(),
        })
    }

    fn create_fragment_loader(&self, _ctx: &CollaboratorContext) -> Arc<dyn FragmentLoader> {
        self.log.push("loader.new");
        Arc::new(FakeLoader)
    }

    fn create_media_buffer_controller(
        &self,
        _ctx: &CollaboratorContext,
    ) -> Box<dyn MediaBufferController> {
        self.log.push("buffer.new:media");
        Box::new(FakeBuffer::new(
            self.log.clone(),
            self.buffering_completed.clone(),
        ))
    }

    fn create_text_controller(&self, _ctx: &CollaboratorContext) -> Box<dyn TextController> {
        self.log.push("buffer.new:text");
        Box::new(FakeBuffer::new(
            self.log.clone(),
            self.buffering_completed.clone(),
        ))
    }
}

/// A complete set of fakes sharing one [`CallLog`].
pub struct Harness {
    pub log: CallLog,
    pub representation: Arc<FakeRepresentation>,
    pub index: Arc<FakeIndexHandler>,
    pub adapter: Arc<FakeAdapter>,
    pub manifest_model: Arc<FakeManifestModel>,
    pub factory: Arc<FakeFactory>,
    pub owner: Arc<dyn StreamOwner>,
    pub fake_owner: Arc<FakeOwner>,
    pub media_source: MediaSourceHandle,
}

impl Harness {
    pub fn new(is_dynamic: bool) -> Self {
        let log = CallLog::default();
        let mut info = StreamInfo::new(
            "period-0",
            ManifestInfo {
                is_dynamic,
                ..Default::default()
            },
        );
        info.start = 10.0;
        let fake_owner = Arc::new(FakeOwner {
            info: Mutex::new(Arc::new(info)),
        });

        Self {
            representation: Arc::new(FakeRepresentation {
                log: log.clone(),
                ..Default::default()
            }),
            index: Arc::new(FakeIndexHandler {
                log: log.clone(),
                ..Default::default()
            }),
            adapter: Arc::new(FakeAdapter {
                log: log.clone(),
                ..Default::default()
            }),
            manifest_model: Arc::new(FakeManifestModel {
                manifest: Mutex::new(Some(Arc::new(Manifest::default()))),
            }),
            factory: Arc::new(FakeFactory {
                log: log.clone(),
                fragment_model: Arc::new(FakeFragmentModel {
                    log: log.clone(),
                    ..Default::default()
                }),
                running: Arc::new(Mutex::new(false)),
                buffering_completed: Arc::new(Mutex::new(true)),
                last_config: Mutex::new(None),
            }),
            owner: fake_owner.clone(),
            fake_owner,
            media_source: Arc::new(MediaSource::new()),
            log,
        }
    }

    /// Services backed by the harness fakes. Every call mints fresh mocks.
    pub fn services(&self) -> ProcessorServices {
        ProcessorServices {
            representation_controller: self.representation.clone(),
            abr_controller: Arc::new(logging_abr(self.log.clone())),
            manifest_adapter: self.adapter.clone(),
            manifest_model: self.manifest_model.clone(),
            index_handler: self.index.clone(),
            clock: Arc::new(offset_clock(0.5)),
            error_handler: Arc::new(lenient_error_handler()),
            request_modifier: None,
        }
    }

    pub fn context(&self, media_type: MediaType) -> CollaboratorContext {
        CollaboratorContext::new(
            media_type,
            Arc::new(StreamProcessorConfig::default()),
            &self.services(),
            Arc::new(ProcessorMetrics::new()),
        )
    }

    pub fn processor(&self) -> StreamProcessor {
        self.processor_with(self.services())
    }

    pub fn processor_with(&self, services: ProcessorServices) -> StreamProcessor {
        StreamProcessor::new(
            Arc::new(StreamProcessorConfig::default()),
            services,
            self.factory.clone(),
        )
        .unwrap()
    }

    pub fn initialized(&self, media_type: MediaType) -> StreamProcessor {
        let processor = self.processor();
        self.initialize(processor, media_type)
    }

    /// Runs `initialize` on `processor` with the harness owner and source.
    pub fn initialize(
        &self,
        mut processor: StreamProcessor,
        media_type: MediaType,
    ) -> StreamProcessor {
        processor
            .initialize(
                media_type,
                Arc::new(NoopFragmentController),
                self.media_source.clone(),
                &self.owner,
                Arc::new(NoopEvents),
            )
            .unwrap();
        processor
    }

    pub fn is_running(&self) -> bool {
        *self.factory.running.lock()
    }

    pub fn set_buffering_completed(&self, completed: bool) {
        *self.factory.buffering_completed.lock() = completed;
    }
}
