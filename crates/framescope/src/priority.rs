//! Best-effort thread scheduling hint.

use thread_priority::{set_current_thread_priority, ThreadPriority};

/// Request elevated OS scheduling priority for the calling thread.
///
/// Reduces timer-read jitter on loaded machines. This is a hint:
/// elevation can fail without privileges, and failure is logged and
/// ignored, never propagated.
pub fn raise_thread_priority() {
    match set_current_thread_priority(ThreadPriority::Max) {
        Ok(()) => tracing::debug!("thread priority raised"),
        Err(e) => tracing::warn!("failed to raise thread priority: {e:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_failure_is_not_fatal() {
        // May or may not succeed depending on privileges; either way it
        // must return normally.
        raise_thread_priority();
    }
}
