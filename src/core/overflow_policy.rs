//! Overflow policies for the async dispatch buffer
//!
//! When the buffer of an async appender is full, the policy decides what
//! happens to the event being offered. The default never loses events: it
//! waits briefly for the dispatcher and then dispatches on the calling thread.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Wait used by the default policy before dispatching synchronously
pub const DEFAULT_BLOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Policy for handling a full dispatch buffer
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::OverflowPolicy;
/// use std::time::Duration;
///
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::BlockThenSync(Duration::from_millis(100)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait until the dispatcher frees a slot
    ///
    /// Warning: a stalled child appender stalls every producer.
    Block,

    /// Wait up to the timeout, then dispatch on the calling thread
    BlockThenSync(Duration),

    /// Dispatch on the calling thread immediately
    Sync,

    /// Evict the oldest queued event of the lowest severity if the incoming
    /// event is more severe, otherwise discard the incoming event
    DiscardLowest,

    /// Discard the incoming event
    DropIncoming,
}

impl Default for OverflowPolicy {
    fn default() -> Self {
        OverflowPolicy::BlockThenSync(DEFAULT_BLOCK_TIMEOUT)
    }
}

impl OverflowPolicy {
    /// Whether this policy may lose events
    pub fn is_lossy(&self) -> bool {
        matches!(self, OverflowPolicy::DiscardLowest | OverflowPolicy::DropIncoming)
    }

    /// Policy from its configuration name; `timeout` only applies to
    /// `block_then_sync`
    pub fn from_name(name: &str, timeout: Duration) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "block" => Some(OverflowPolicy::Block),
            "block_then_sync" => Some(OverflowPolicy::BlockThenSync(timeout)),
            "sync" => Some(OverflowPolicy::Sync),
            "discard_lowest" => Some(OverflowPolicy::DiscardLowest),
            "drop_incoming" => Some(OverflowPolicy::DropIncoming),
            _ => None,
        }
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OverflowPolicy::from_name(s, DEFAULT_BLOCK_TIMEOUT)
            .ok_or_else(|| format!("unknown overflow policy [{}]", s))
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockThenSync(d) => write!(f, "BlockThenSync({:?})", d),
            OverflowPolicy::Sync => write!(f, "Sync"),
            OverflowPolicy::DiscardLowest => write!(f, "DiscardLowest"),
            OverflowPolicy::DropIncoming => write!(f, "DropIncoming"),
        }
    }
}

/// Callback type for discard notifications
///
/// Called when events are discarded. The parameter is the total count of
/// discarded events so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
