//! Lifecycle events streamed from the engine to the RPC layer.

use serde::{Deserialize, Serialize};

use crate::controller::ThreadId;

/// An immutable record describing a lifecycle event.
///
/// Messages are value-typed and freely cloneable; ordering is defined only
/// by enqueue order on the [`crate::bus::MessageBus`], not by any embedded
/// timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    /// Keepalive / test message; carries no information.
    NoOp,
    /// A new thread controller was created for a previously unseen thread.
    ThreadStarted { thread_id: ThreadId },
    /// A controller suspended execution at a source location.
    ThreadSuspended {
        thread_id: ThreadId,
        file_path: String,
        line_number: u32,
    },
    /// A controller's thread has terminated.
    ThreadEnded { thread_id: ThreadId },
}
