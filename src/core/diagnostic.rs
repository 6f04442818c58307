//! Thread-scoped diagnostic contexts
//!
//! - [`Mdc`]: a per-thread key/value map
//! - [`Ndc`]: a per-thread stack of context strings
//!
//! Logging events copy both at construction time, so an event handed to
//! another thread (for example through the async appender) carries the
//! context of the thread that produced it.

use super::log_context::{FieldValue, LogContext};
use std::cell::RefCell;
use std::collections::BTreeMap;

thread_local! {
    static MDC: RefCell<BTreeMap<String, FieldValue>> = const { RefCell::new(BTreeMap::new()) };
    static NDC: RefCell<NdcStack> = const { RefCell::new(NdcStack { entries: Vec::new(), max_depth: None }) };
}

/// Mapped diagnostic context
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::core::Mdc;
///
/// let _guard = Mdc::scoped("request_id", "abc-123");
/// assert_eq!(Mdc::get("request_id").unwrap().to_string(), "abc-123");
/// ```
pub struct Mdc;

impl Mdc {
    pub fn put<K, V>(key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        MDC.with(|m| {
            m.borrow_mut().insert(key.into(), value.into());
        });
    }

    pub fn get(key: &str) -> Option<FieldValue> {
        MDC.with(|m| m.borrow().get(key).cloned())
    }

    pub fn remove(key: &str) -> Option<FieldValue> {
        MDC.with(|m| m.borrow_mut().remove(key))
    }

    pub fn clear() {
        MDC.with(|m| m.borrow_mut().clear());
    }

    pub fn is_empty() -> bool {
        MDC.with(|m| m.borrow().is_empty())
    }

    /// Copy of the current thread's map, `None` when empty.
    pub fn snapshot() -> Option<LogContext> {
        MDC.with(|m| {
            let map = m.borrow();
            if map.is_empty() {
                None
            } else {
                Some(
                    map.iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                )
            }
        })
    }

    /// Put a value and remove (or restore) it when the guard drops.
    #[must_use = "the value is removed when the guard is dropped"]
    pub fn scoped<K, V>(key: K, value: V) -> MdcGuard
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        let previous = MDC.with(|m| m.borrow_mut().insert(key.clone(), value.into()));
        MdcGuard { key, previous }
    }
}

/// RAII guard returned by [`Mdc::scoped`]
pub struct MdcGuard {
    key: String,
    previous: Option<FieldValue>,
}

impl Drop for MdcGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        MDC.with(|m| {
            let mut map = m.borrow_mut();
            match previous {
                Some(value) => {
                    map.insert(std::mem::take(&mut self.key), value);
                }
                None => {
                    map.remove(&self.key);
                }
            }
        });
    }
}

struct NdcStack {
    entries: Vec<String>,
    max_depth: Option<usize>,
}

/// Nested diagnostic context
pub struct Ndc;

impl Ndc {
    pub fn push(message: impl Into<String>) {
        NDC.with(|n| n.borrow_mut().entries.push(message.into()));
    }

    pub fn pop() -> Option<String> {
        NDC.with(|n| n.borrow_mut().entries.pop())
    }

    pub fn peek() -> Option<String> {
        NDC.with(|n| n.borrow().entries.last().cloned())
    }

    pub fn depth() -> usize {
        NDC.with(|n| n.borrow().entries.len())
    }

    /// Empty the stack and drop any depth limit.
    pub fn clear() {
        NDC.with(|n| {
            let mut stack = n.borrow_mut();
            stack.entries.clear();
            stack.max_depth = None;
        });
    }

    /// Truncate the stack to `max_depth` entries and keep it bounded on
    /// subsequent reads.
    pub fn set_max_depth(max_depth: usize) {
        NDC.with(|n| {
            let mut stack = n.borrow_mut();
            stack.entries.truncate(max_depth);
            stack.max_depth = Some(max_depth);
        });
    }

    /// The full context, entries separated by a single space. `None` when
    /// the stack is empty.
    pub fn get() -> Option<String> {
        NDC.with(|n| {
            let stack = n.borrow();
            let visible = match stack.max_depth {
                Some(max) => &stack.entries[..stack.entries.len().min(max)],
                None => &stack.entries[..],
            };
            if visible.is_empty() {
                None
            } else {
                Some(visible.join(" "))
            }
        })
    }

    /// Push and pop automatically when the guard drops.
    #[must_use = "the entry is popped when the guard is dropped"]
    pub fn scoped(message: impl Into<String>) -> NdcGuard {
        Ndc::push(message);
        NdcGuard { depth: Ndc::depth() }
    }
}

/// RAII guard returned by [`Ndc::scoped`]
pub struct NdcGuard {
    depth: usize,
}

impl Drop for NdcGuard {
    fn drop(&mut self) {
        NDC.with(|n| n.borrow_mut().entries.truncate(self.depth - 1));
    }
}
