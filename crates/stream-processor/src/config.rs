//! Processor configuration.
//!
//! The processor validates the configuration and reads `metrics_enabled`.
//! Every other field is consumed by the collaborators it constructs,
//! which receive the shared instance through
//! [`CollaboratorContext::config`](crate::factory::CollaboratorContext::config).

use std::time::Duration;

use crate::error::StreamProcessorError;

// --- Buffer Configuration ---

/// Buffer targets handed to schedule and buffer controllers.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Buffer level the scheduler tries to maintain once playback is stable
    pub stable_buffer_time: Duration,
    /// Buffer level to maintain while playing the top quality of a long stream
    pub buffer_time_at_top_quality: Duration,
    /// Same as above, for content longer than `long_form_content_duration`
    pub buffer_time_at_top_quality_long_form: Duration,
    pub long_form_content_duration: Duration,
    /// Content behind the playhead kept before eviction
    pub buffer_to_keep: Duration,
    /// Interval between buffer pruning passes
    pub buffer_pruning_interval: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            stable_buffer_time: Duration::from_secs(12),
            buffer_time_at_top_quality: Duration::from_secs(30),
            buffer_time_at_top_quality_long_form: Duration::from_secs(60),
            long_form_content_duration: Duration::from_secs(600),
            buffer_to_keep: Duration::from_secs(30),
            buffer_pruning_interval: Duration::from_secs(30),
        }
    }
}

// --- Retry Configuration ---

/// Fragment request retry policy, read by fragment loaders.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub fragment_retry_attempts: u32,
    pub fragment_retry_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            fragment_retry_attempts: 3,
            fragment_retry_interval: Duration::from_millis(1000),
        }
    }
}

// --- Top-Level Configuration ---
#[derive(Debug, Clone)]
pub struct StreamProcessorConfig {
    pub buffer: BufferConfig,
    pub retry: RetryConfig,
    /// Replace already buffered segments when switching up in quality.
    /// Read by schedule controllers.
    pub fast_switch_enabled: bool,
    /// Record lifecycle counters in [`ProcessorMetrics`](crate::ProcessorMetrics)
    pub metrics_enabled: bool,
}

impl Default for StreamProcessorConfig {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            retry: RetryConfig::default(),
            fast_switch_enabled: false,
            metrics_enabled: true,
        }
    }
}

impl StreamProcessorConfig {
    pub fn validate(&self) -> Result<(), StreamProcessorError> {
        let buffer = &self.buffer;
        if buffer.stable_buffer_time.is_zero() {
            return Err(StreamProcessorError::configuration(
                "stable_buffer_time must be greater than zero",
            ));
        }
        if buffer.buffer_time_at_top_quality < buffer.stable_buffer_time {
            return Err(StreamProcessorError::configuration(format!(
                "buffer_time_at_top_quality ({:?}) is below stable_buffer_time ({:?})",
                buffer.buffer_time_at_top_quality, buffer.stable_buffer_time
            )));
        }
        if buffer.buffer_time_at_top_quality_long_form < buffer.buffer_time_at_top_quality {
            return Err(StreamProcessorError::configuration(
                "buffer_time_at_top_quality_long_form is below buffer_time_at_top_quality",
            ));
        }
        if buffer.buffer_pruning_interval.is_zero() {
            return Err(StreamProcessorError::configuration(
                "buffer_pruning_interval must be greater than zero",
            ));
        }
        if self.retry.fragment_retry_attempts > 0 && self.retry.fragment_retry_interval.is_zero() {
            return Err(StreamProcessorError::configuration(
                "fragment_retry_interval must be set when retries are enabled",
            ));
        }
        Ok(())
    }

    /// Target buffer level for the top quality of content lasting `duration`.
    ///
    /// Helper for schedule controllers deciding how far ahead to fetch.
    pub fn top_quality_buffer_target(&self, duration: Option<Duration>) -> Duration {
        match duration {
            Some(d) if d > self.buffer.long_form_content_duration => {
                self.buffer.buffer_time_at_top_quality_long_form
            }
            _ => self.buffer.buffer_time_at_top_quality,
        }
    }
}
