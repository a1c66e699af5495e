use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use crate::media::MediaType;

/// Lifecycle counters for one stream processor.
///
/// All counters use atomic operations so collaborators holding the shared
/// instance can read them from other threads.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    // Track descriptor updates
    /// Total number of `update_media_info` calls
    pub track_updates_total: AtomicU64,
    /// Updates whose candidate was refused for a media type mismatch
    pub track_updates_rejected: AtomicU64,

    // Scheduling
    /// Number of `start` calls forwarded to the schedule controller
    pub schedule_starts: AtomicU64,
    /// Number of `stop` calls forwarded to the schedule controller
    pub schedule_stops: AtomicU64,

    // Buffers
    /// Buffers created through `create_buffer`
    pub buffers_created: AtomicU64,
    /// `create_buffer` calls answered with the existing buffer
    pub buffers_reused: AtomicU64,

    // Teardown
    /// Number of resets
    pub resets_total: AtomicU64,
    /// Resets triggered by a playback failure
    pub resets_errored: AtomicU64,
}

impl ProcessorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_track_update(&self, rejected: bool) {
        self.track_updates_total.fetch_add(1, Ordering::Relaxed);
        if rejected {
            self.track_updates_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_start(&self) {
        self.schedule_starts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stop(&self) {
        self.schedule_stops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffer(&self, created: bool) {
        if created {
            self.buffers_created.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffers_reused.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_reset(&self, errored: bool) {
        self.resets_total.fetch_add(1, Ordering::Relaxed);
        if errored {
            self.resets_errored.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            track_updates_total: self.track_updates_total.load(Ordering::Relaxed),
            track_updates_rejected: self.track_updates_rejected.load(Ordering::Relaxed),
            schedule_starts: self.schedule_starts.load(Ordering::Relaxed),
            schedule_stops: self.schedule_stops.load(Ordering::Relaxed),
            buffers_created: self.buffers_created.load(Ordering::Relaxed),
            buffers_reused: self.buffers_reused.load(Ordering::Relaxed),
            resets_total: self.resets_total.load(Ordering::Relaxed),
            resets_errored: self.resets_errored.load(Ordering::Relaxed),
        }
    }

    /// Log a summary of the counters, usually right before teardown.
    pub fn log_summary(&self, media_type: Option<MediaType>) {
        let s = self.snapshot();
        info!(
            media_type = ?media_type,
            track_updates = s.track_updates_total,
            track_updates_rejected = s.track_updates_rejected,
            starts = s.schedule_starts,
            stops = s.schedule_stops,
            buffers_created = s.buffers_created,
            buffers_reused = s.buffers_reused,
            resets = s.resets_total,
            errored_resets = s.resets_errored,
            "Stream processor metrics summary"
        );
    }
}

/// Point-in-time copy of [`ProcessorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub track_updates_total: u64,
    pub track_updates_rejected: u64,
    pub schedule_starts: u64,
    pub schedule_stops: u64,
    pub buffers_created: u64,
    pub buffers_reused: u64,
    pub resets_total: u64,
    pub resets_errored: u64,
}
