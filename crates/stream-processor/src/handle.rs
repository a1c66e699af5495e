//! Lifecycle handle given to collaborators in place of the processor itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::media::{MediaType, StreamInfo};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Identity and liveness of one processor lifecycle.
///
/// Collaborators keep a clone and check [`is_alive`](Self::is_alive) (or
/// await [`cancelled`](Self::cancelled)) before acting on asynchronous
/// completions. The handle is cancelled when the processor is reset or
/// dropped, so completions arriving later can be discarded.
#[derive(Debug, Clone)]
pub struct ProcessorHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    generation: u64,
    media_type: MediaType,
    stream_info: Arc<StreamInfo>,
    token: CancellationToken,
}

impl ProcessorHandle {
    pub(crate) fn new(media_type: MediaType, stream_info: Arc<StreamInfo>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
                media_type,
                stream_info,
                token: CancellationToken::new(),
            }),
        }
    }

    /// Process-wide unique number of this lifecycle.
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    pub fn media_type(&self) -> MediaType {
        self.inner.media_type
    }

    /// Stream metadata captured when the processor was initialized.
    pub fn stream_info(&self) -> &Arc<StreamInfo> {
        &self.inner.stream_info
    }

    pub fn is_dynamic(&self) -> bool {
        self.inner.stream_info.manifest_info.is_dynamic
    }

    pub fn is_alive(&self) -> bool {
        !self.inner.token.is_cancelled()
    }

    /// Resolves once the owning processor has been reset or dropped.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.inner.token.cancelled()
    }

    /// A child token for work that should stop with this lifecycle.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.token.child_token()
    }

    pub fn is_same_lifecycle(&self, other: &ProcessorHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn invalidate(&self) {
        self.inner.token.cancel();
    }
}
