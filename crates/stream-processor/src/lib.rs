//! # Stream Processor
//!
//! Per-media-type coordinator of an adaptive segmented playback pipeline.
//!
//! A player creates one [`StreamProcessor`] for every media type (video,
//! audio, timed text) of the stream it is playing. The processor wires the
//! subsystems playing that media type together (representation tracking,
//! segment scheduling, buffering and bitrate selection) and tears them down
//! again in a fixed order.
//!
//! The subsystems themselves are collaborators supplied by the player
//! through the traits in [`collaborators`] and the [`CollaboratorFactory`].
//!
//! ## Component Overview
//!
//! - `processor`: lifecycle and accessor surface
//! - `registry`: selected and known track descriptors
//! - `factory`: buffer controller classification and construction
//! - `handle`: liveness token handed to collaborators
//!
//! ## License
//!
//! MIT License
//!
//! ## Authors
//!
//! - hua0512
//!

pub mod collaborators;
pub mod config;
pub mod error;
pub mod factory;
mod handle;
pub mod media;
mod metrics;
mod processor;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_utils;

pub use collaborators::ProcessorServices;
pub use config::{BufferConfig, RetryConfig, StreamProcessorConfig};
pub use error::{PlaybackFault, StreamProcessorError};
pub use factory::{BufferController, BufferKind, CollaboratorContext, CollaboratorFactory};
pub use handle::ProcessorHandle;
pub use media::{MediaInfo, MediaType, StreamInfo};
pub use metrics::{MetricsSnapshot, ProcessorMetrics};
pub use processor::{ProcessorState, StreamProcessor};
pub use registry::{TrackRegistry, TrackUpdate};
