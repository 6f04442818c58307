//! Appender contracts
//!
//! Two layers:
//!
//! - [`Append`] is a raw sink. It only knows how to write one event, given
//!   the layout configured on its owner.
//! - [`Appender`] is the managed unit attached to loggers. Its provided
//!   [`Appender::do_append`] runs the shared pipeline held in
//!   [`AppenderCore`]: re-entrancy guard, lifecycle state, threshold, filter
//!   chain, then the appender-specific `append` with panics and errors routed
//!   to the error handler.
//!
//! [`AppenderSkeleton`] turns any [`Append`] sink into an [`Appender`].
//! Composite appenders (async, hub) implement [`Appender`] directly and expose
//! their children through [`Appender::attached`].

use super::error::{LoggerError, Result};
use super::error_handler::{ErrorDisposition, ErrorHandler, OnlyOnceErrorHandler};
use super::event::LoggingEvent;
use super::filter::{Filter, FilterChain, FilterDecision};
use super::internal_log::{self, panic_message};
use super::layout::Layout;
use super::level::Level;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Raw output sink driven by an [`AppenderSkeleton`]
pub trait Append: Send {
    fn append(&mut self, event: &LoggingEvent, layout: Option<&dyn Layout>) -> Result<()>;

    /// Open resources and write the layout header
    fn activate(&mut self, _layout: Option<&dyn Layout>) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write the layout footer and release resources
    fn close(&mut self, _layout: Option<&dyn Layout>) -> Result<()> {
        Ok(())
    }

    fn requires_layout(&self) -> bool {
        false
    }
}

/// Managed appender attached to loggers
pub trait Appender: Send + Sync {
    fn core(&self) -> &AppenderCore;

    /// Appender-specific output. Only called by [`Appender::do_append`].
    fn append(&self, event: &LoggingEvent) -> Result<()>;

    /// Validate configuration and move to the active state
    fn activate_options(&self) -> Result<()>;

    /// Release resources. Terminal.
    fn close(&self);

    fn flush(&self) -> Result<()>;

    /// Children of a composite appender
    fn attached(&self) -> Option<&AppenderList> {
        None
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    /// Entry point used by loggers. Never panics and never returns an error.
    fn do_append(&self, event: &LoggingEvent) {
        self.do_append_outcome(event);
    }

    /// Same pipeline as [`Appender::do_append`], reporting what became of
    /// the event. Composites use it to notice children that keep failing.
    fn do_append_outcome(&self, event: &LoggingEvent) -> AppendOutcome {
        self.core().dispatch(event, |event| self.append(event))
    }
}

/// Result of running one event through the `do_append` pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Stopped by state, threshold, filters or re-entrancy
    Skipped,
    /// `append` returned an error or panicked; the error handler has it
    Failed,
}

impl AppendOutcome {
    pub fn is_failed(self) -> bool {
        self == AppendOutcome::Failed
    }
}

/// Lifecycle of an appender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AppenderState {
    Unconfigured = 0,
    Active = 1,
    /// Deactivated by its error handler; `activate_options` revives it
    Inactive = 2,
    Closed = 3,
}

impl AppenderState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => AppenderState::Active,
            2 => AppenderState::Inactive,
            3 => AppenderState::Closed,
            _ => AppenderState::Unconfigured,
        }
    }
}

thread_local! {
    static APPENDING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks one appender as executing on the current thread
struct ReentrancyGuard {
    key: usize,
}

impl ReentrancyGuard {
    fn enter(key: usize) -> Option<Self> {
        APPENDING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                None
            } else {
                stack.push(key);
                Some(Self { key })
            }
        })
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        APPENDING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|k| *k == self.key) {
                stack.remove(pos);
            }
        });
    }
}

/// State shared by every appender implementation
pub struct AppenderCore {
    name: String,
    layout: RwLock<Option<Arc<dyn Layout>>>,
    threshold: RwLock<Level>,
    filters: RwLock<FilterChain>,
    state: AtomicU8,
    error_handler: RwLock<Arc<dyn ErrorHandler>>,
}

impl AppenderCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: RwLock::new(None),
            threshold: RwLock::new(Level::ALL),
            filters: RwLock::new(FilterChain::new()),
            state: AtomicU8::new(AppenderState::Unconfigured as u8),
            error_handler: RwLock::new(Arc::new(OnlyOnceErrorHandler::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> Option<Arc<dyn Layout>> {
        self.layout.read().clone()
    }

    pub fn set_layout(&self, layout: Option<Arc<dyn Layout>>) {
        *self.layout.write() = layout;
    }

    pub fn threshold(&self) -> Level {
        self.threshold.read().clone()
    }

    pub fn set_threshold(&self, threshold: Level) {
        *self.threshold.write() = threshold;
    }

    pub fn is_as_severe_as_threshold(&self, level: &Level) -> bool {
        level.is_as_severe_as(&self.threshold.read())
    }

    pub fn add_filter(&self, filter: Arc<dyn Filter>) {
        self.filters.write().add(filter);
    }

    pub fn clear_filters(&self) {
        self.filters.write().clear();
    }

    pub fn filter_count(&self) -> usize {
        self.filters.read().len()
    }

    pub fn error_handler(&self) -> Arc<dyn ErrorHandler> {
        Arc::clone(&self.error_handler.read())
    }

    pub fn set_error_handler(&self, handler: Arc<dyn ErrorHandler>) {
        *self.error_handler.write() = handler;
    }

    pub fn state(&self) -> AppenderState {
        AppenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state() == AppenderState::Active
    }

    pub fn is_closed(&self) -> bool {
        self.state() == AppenderState::Closed
    }

    /// Move to `Active`. Fails once closed.
    pub fn mark_active(&self) -> Result<()> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == AppenderState::Closed as u8 {
                return Err(LoggerError::appender_closed(&self.name));
            }
            match self.state.compare_exchange(
                current,
                AppenderState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    /// Move from `Active` to `Inactive`
    pub fn deactivate(&self) {
        let _ = self.state.compare_exchange(
            AppenderState::Active as u8,
            AppenderState::Inactive as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Move to `Closed`. Returns `false` when it was already closed.
    pub fn mark_closed(&self) -> bool {
        self.state.swap(AppenderState::Closed as u8, Ordering::AcqRel) != AppenderState::Closed as u8
    }

    /// Route a failure to the error handler and apply its disposition
    pub fn handle_error(&self, error: &LoggerError, event: Option<&LoggingEvent>) {
        let handler = self.error_handler();
        if handler.error(&self.name, error, event) == ErrorDisposition::Deactivate {
            self.deactivate();
        }
    }

    /// The shared `do_append` pipeline
    ///
    /// Appends to a closed or inactive appender are reported to the error
    /// handler every time; its flood control decides what gets printed.
    pub fn dispatch<F>(&self, event: &LoggingEvent, append: F) -> AppendOutcome
    where
        F: FnOnce(&LoggingEvent) -> Result<()>,
    {
        let Some(_guard) = ReentrancyGuard::enter(self as *const Self as usize) else {
            return AppendOutcome::Skipped;
        };

        match self.state() {
            AppenderState::Active => {}
            AppenderState::Closed => {
                self.handle_error(&LoggerError::appender_closed(&self.name), Some(event));
                return AppendOutcome::Skipped;
            }
            AppenderState::Unconfigured | AppenderState::Inactive => {
                self.handle_error(&LoggerError::appender_inactive(&self.name), Some(event));
                return AppendOutcome::Skipped;
            }
        }

        if !self.is_as_severe_as_threshold(event.level()) {
            return AppendOutcome::Skipped;
        }

        // Filters are user code too, so they run inside the unwind boundary
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if self.filters.read().decide(event) == FilterDecision::Deny {
                return Ok(AppendOutcome::Skipped);
            }
            append(event).map(|()| AppendOutcome::Appended)
        }));

        let error = match outcome {
            Ok(Ok(appended)) => return appended,
            Ok(Err(e)) => e,
            Err(payload) => LoggerError::appender_panicked(&self.name, panic_message(&*payload)),
        };
        self.handle_error(&error, Some(event));
        AppendOutcome::Failed
    }
}

impl fmt::Debug for AppenderCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderCore")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("threshold", &self.threshold.read().name())
            .field("filters", &self.filter_count())
            .field("has_layout", &self.layout.read().is_some())
            .finish()
    }
}

/// Format an event and, when the layout leaves it out, the error snapshot
///
/// Every line ends with `\n`.
pub fn render_event(event: &LoggingEvent, layout: &dyn Layout) -> String {
    let mut text = layout.format(event);
    text.push('\n');
    if layout.ignores_throwable() {
        if let Some(throwable) = event.throwable() {
            for line in throwable.lines() {
                text.push('\t');
                text.push_str(line);
                text.push('\n');
            }
        }
    }
    text
}

/// Generic managed appender over a raw sink
///
/// ```
/// use rust_logger_hierarchy::prelude::*;
///
/// let (sink, handle) = MemorySink::new(100);
/// let appender = AppenderSkeleton::new("memory", sink)
///     .with_threshold(Level::INFO)
///     .activated()
///     .unwrap();
///
/// appender.do_append(&LoggingEvent::new("app", Level::DEBUG, "dropped"));
/// appender.do_append(&LoggingEvent::new("app", Level::WARN, "kept"));
/// assert_eq!(handle.messages(), vec!["kept".to_string()]);
/// ```
pub struct AppenderSkeleton<A: Append> {
    core: AppenderCore,
    sink: Mutex<A>,
}

impl<A: Append> AppenderSkeleton<A> {
    pub fn new(name: impl Into<String>, sink: A) -> Self {
        Self {
            core: AppenderCore::new(name),
            sink: Mutex::new(sink),
        }
    }

    #[must_use]
    pub fn with_layout(self, layout: impl Layout + 'static) -> Self {
        self.core.set_layout(Some(Arc::new(layout)));
        self
    }

    #[must_use]
    pub fn with_shared_layout(self, layout: Arc<dyn Layout>) -> Self {
        self.core.set_layout(Some(layout));
        self
    }

    #[must_use]
    pub fn with_threshold(self, threshold: Level) -> Self {
        self.core.set_threshold(threshold);
        self
    }

    #[must_use]
    pub fn with_filter(self, filter: impl Filter + 'static) -> Self {
        self.core.add_filter(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn with_error_handler(self, handler: impl ErrorHandler + 'static) -> Self {
        self.core.set_error_handler(Arc::new(handler));
        self
    }

    /// Activate and wrap for attaching to loggers
    pub fn activated(self) -> Result<Arc<Self>> {
        self.activate_sink()?;
        Ok(Arc::new(self))
    }

    /// Exclusive access to the sink
    pub fn sink(&self) -> MutexGuard<'_, A> {
        self.sink.lock()
    }

    fn activate_sink(&self) -> Result<()> {
        if self.core.is_closed() {
            return Err(LoggerError::appender_closed(self.core.name()));
        }
        if self.core.is_active() {
            return Ok(());
        }
        let layout = self.core.layout();
        let mut sink = self.sink.lock();
        if sink.requires_layout() && layout.is_none() {
            return Err(LoggerError::missing_layout(self.core.name()));
        }
        sink.activate(layout.as_deref())?;
        self.core.mark_active()
    }

    fn close_sink(&self) {
        if !self.core.mark_closed() {
            return;
        }
        let layout = self.core.layout();
        let result = self.sink.lock().close(layout.as_deref());
        if let Err(e) = result {
            self.core.handle_error(&e, None);
        }
    }
}

impl<A: Append> Appender for AppenderSkeleton<A> {
    fn core(&self) -> &AppenderCore {
        &self.core
    }

    fn append(&self, event: &LoggingEvent) -> Result<()> {
        let mut sink = self.sink.lock();
        // close() may have won the race for the sink lock
        if self.core.is_closed() {
            return Err(LoggerError::appender_closed(self.core.name()));
        }
        let layout = self.core.layout();
        sink.append(event, layout.as_deref())
    }

    fn activate_options(&self) -> Result<()> {
        self.activate_sink()
    }

    fn close(&self) {
        self.close_sink();
    }

    fn flush(&self) -> Result<()> {
        if self.core.is_closed() {
            return Ok(());
        }
        self.sink.lock().flush()
    }
}

impl<A: Append> Drop for AppenderSkeleton<A> {
    fn drop(&mut self) {
        if !self.core.is_closed() {
            internal_log::debug(format_args!(
                "Closing appender [{}] on drop",
                self.core.name()
            ));
            self.close_sink();
        }
    }
}

impl<A: Append> fmt::Debug for AppenderSkeleton<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderSkeleton")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

fn same_appender(a: &Arc<dyn Appender>, b: &Arc<dyn Appender>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Ordered set of appenders attached to a logger or a composite appender
///
/// Iteration works on a snapshot, so appenders can be added or removed while
/// other threads are dispatching.
pub struct AppenderList {
    appenders: RwLock<Arc<[Arc<dyn Appender>]>>,
}

impl Default for AppenderList {
    fn default() -> Self {
        Self::new()
    }
}

impl AppenderList {
    pub fn new() -> Self {
        Self {
            appenders: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Attach at the end. Returns `false` if already attached.
    pub fn add(&self, appender: Arc<dyn Appender>) -> bool {
        let mut guard = self.appenders.write();
        if guard.iter().any(|a| same_appender(a, &appender)) {
            return false;
        }
        let mut next: Vec<_> = guard.iter().cloned().collect();
        next.push(appender);
        *guard = Arc::from(next);
        true
    }

    /// Detach without closing
    pub fn remove(&self, appender: &Arc<dyn Appender>) -> bool {
        let mut guard = self.appenders.write();
        let before = guard.len();
        let next: Vec<_> = guard
            .iter()
            .filter(|a| !same_appender(a, appender))
            .cloned()
            .collect();
        let removed = next.len() != before;
        *guard = Arc::from(next);
        removed
    }

    /// Detach the first appender with this name, without closing it
    pub fn remove_by_name(&self, name: &str) -> Option<Arc<dyn Appender>> {
        let mut guard = self.appenders.write();
        let pos = guard.iter().position(|a| a.name() == name)?;
        let mut next: Vec<_> = guard.iter().cloned().collect();
        let removed = next.remove(pos);
        *guard = Arc::from(next);
        Some(removed)
    }

    /// Detach and close every appender
    pub fn remove_all(&self) -> Vec<Arc<dyn Appender>> {
        let removed = std::mem::replace(&mut *self.appenders.write(), Arc::from(Vec::new()));
        for appender in removed.iter() {
            appender.close();
        }
        removed.to_vec()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Appender>> {
        self.appenders
            .read()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    /// Snapshot in attachment order
    pub fn all(&self) -> Arc<[Arc<dyn Appender>]> {
        Arc::clone(&self.appenders.read())
    }

    pub fn is_attached(&self, appender: &Arc<dyn Appender>) -> bool {
        self.appenders
            .read()
            .iter()
            .any(|a| same_appender(a, appender))
    }

    pub fn len(&self) -> usize {
        self.appenders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.appenders.read().is_empty()
    }

    /// Call `do_append` on every appender in order. Returns how many were
    /// called.
    pub fn append_loop(&self, event: &LoggingEvent) -> usize {
        let snapshot = self.all();
        for appender in snapshot.iter() {
            appender.do_append(event);
        }
        snapshot.len()
    }

    /// Like [`AppenderList::append_loop`], but returns how many appenders
    /// failed on the event
    pub fn append_loop_failures(&self, event: &LoggingEvent) -> usize {
        self.all()
            .iter()
            .filter(|appender| appender.do_append_outcome(event).is_failed())
            .count()
    }
}

impl fmt::Debug for AppenderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.all().iter().map(|a| a.name().to_string()).collect();
        f.debug_struct("AppenderList").field("appenders", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error_handler::{DeactivatingErrorHandler, FloodControlErrorHandler};
    use crate::core::filter::{DenyAllFilter, LevelMatchFilter};
    use crate::core::layout::SimpleLayout;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSink {
        count: Arc<AtomicUsize>,
        fail: bool,
        panic: bool,
        closed: bool,
    }

    impl Append for CountingSink {
        fn append(&mut self, _event: &LoggingEvent, _layout: Option<&dyn Layout>) -> Result<()> {
            if self.panic {
                panic!("sink exploded");
            }
            if self.fail {
                return Err(LoggerError::writer("sink failed"));
            }
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self, _layout: Option<&dyn Layout>) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    fn counting(name: &str) -> (AppenderSkeleton<CountingSink>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = CountingSink {
            count: Arc::clone(&count),
            ..Default::default()
        };
        (AppenderSkeleton::new(name, sink), count)
    }

    fn event(level: Level) -> LoggingEvent {
        LoggingEvent::new("test", level, "message")
    }

    #[test]
    fn test_unconfigured_appender_drops() {
        let (appender, count) = counting("c");
        appender.do_append(&event(Level::INFO));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(appender.core().state(), AppenderState::Unconfigured);
    }

    #[test]
    fn test_active_appender_appends() {
        let (appender, count) = counting("c");
        let appender = appender.activated().unwrap();
        appender.do_append(&event(Level::INFO));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_appender_is_noop() {
        let (appender, count) = counting("c");
        let appender = appender.activated().unwrap();
        appender.close();
        appender.do_append(&event(Level::INFO));
        appender.close();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(appender.sink().closed);
        assert!(appender.activate_options().is_err());
    }

    #[test]
    fn test_every_append_after_close_reaches_error_handler() {
        let (appender, count) = counting("c");
        let appender = appender.activated().unwrap();
        let handler = Arc::new(FloodControlErrorHandler::new(1));
        appender.core().set_error_handler(handler.clone());
        appender.close();

        for _ in 0..3 {
            assert_eq!(appender.do_append_outcome(&event(Level::INFO)), AppendOutcome::Skipped);
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(handler.error_count(), 3);
        assert_eq!(handler.suppressed_count(), 2);
    }

    #[test]
    fn test_outcome_reports_failures() {
        let (appender, _count) = counting("c");
        let appender = appender.with_threshold(Level::WARN).activated().unwrap();
        assert_eq!(appender.do_append_outcome(&event(Level::ERROR)), AppendOutcome::Appended);
        assert_eq!(appender.do_append_outcome(&event(Level::INFO)), AppendOutcome::Skipped);

        appender.sink().fail = true;
        assert_eq!(appender.do_append_outcome(&event(Level::ERROR)), AppendOutcome::Failed);
        appender.sink().fail = false;
        appender.sink().panic = true;
        assert_eq!(appender.do_append_outcome(&event(Level::ERROR)), AppendOutcome::Failed);
        assert_eq!(appender.core().error_handler().error_count(), 2);
    }

    #[test]
    fn test_threshold_and_filters() {
        let (appender, count) = counting("c");
        let appender = appender
            .with_threshold(Level::WARN)
            .with_filter(LevelMatchFilter::new(Level::ERROR).accept_on_match(false))
            .activated()
            .unwrap();

        appender.do_append(&event(Level::INFO));
        appender.do_append(&event(Level::ERROR));
        appender.do_append(&event(Level::WARN));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        appender.core().add_filter(Arc::new(DenyAllFilter));
        appender.do_append(&event(Level::WARN));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_is_contained() {
        let sink = CountingSink {
            panic: true,
            ..Default::default()
        };
        let appender = AppenderSkeleton::new("p", sink).activated().unwrap();
        appender.do_append(&event(Level::ERROR));
        assert_eq!(appender.core().error_handler().error_count(), 1);
        assert!(appender.core().is_active());
    }

    #[test]
    fn test_error_handler_can_deactivate() {
        let sink = CountingSink {
            fail: true,
            ..Default::default()
        };
        let appender = AppenderSkeleton::new("f", sink)
            .with_error_handler(DeactivatingErrorHandler::new(2))
            .activated()
            .unwrap();

        appender.do_append(&event(Level::ERROR));
        assert!(appender.core().is_active());
        appender.do_append(&event(Level::ERROR));
        assert_eq!(appender.core().state(), AppenderState::Inactive);

        // Dropped without reaching the sink, but still reported
        assert_eq!(appender.do_append_outcome(&event(Level::ERROR)), AppendOutcome::Skipped);
        assert_eq!(appender.core().error_handler().error_count(), 3);
        assert_eq!(appender.core().state(), AppenderState::Inactive);

        appender.sink().fail = false;
        appender.activate_options().unwrap();
        assert!(appender.core().is_active());
    }

    #[test]
    fn test_missing_layout() {
        struct NeedsLayout;
        impl Append for NeedsLayout {
            fn append(&mut self, _: &LoggingEvent, _: Option<&dyn Layout>) -> Result<()> {
                Ok(())
            }
            fn requires_layout(&self) -> bool {
                true
            }
        }

        let err = AppenderSkeleton::new("x", NeedsLayout).activated().unwrap_err();
        assert!(matches!(err, LoggerError::MissingLayout { .. }));
        assert!(AppenderSkeleton::new("x", NeedsLayout)
            .with_layout(SimpleLayout)
            .activated()
            .is_ok());
    }

    #[test]
    fn test_reentrant_call_is_skipped() {
        let count = Arc::new(AtomicUsize::new(0));
        let core = AppenderCore::new("r");
        core.mark_active().unwrap();

        let inner = Arc::clone(&count);
        core.dispatch(&event(Level::INFO), |e| {
            inner.fetch_add(1, Ordering::SeqCst);
            core.dispatch(e, |_| {
                inner.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_appender_list_order_and_dedup() {
        let list = AppenderList::new();
        let (a, _) = counting("a");
        let (b, _) = counting("b");
        let a: Arc<dyn Appender> = a.activated().unwrap();
        let b: Arc<dyn Appender> = b.activated().unwrap();

        assert!(list.add(Arc::clone(&a)));
        assert!(list.add(Arc::clone(&b)));
        assert!(!list.add(Arc::clone(&a)));

        let names: Vec<_> = list.all().iter().map(|x| x.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(list.is_attached(&b));

        assert!(list.remove_by_name("a").is_some());
        assert_eq!(list.len(), 1);
        assert!(!a.core().is_closed());

        list.remove_all();
        assert!(list.is_empty());
        assert!(b.core().is_closed());
    }

    #[test]
    fn test_append_loop_counts_failing_children() {
        let list = AppenderList::new();
        let (ok, ok_count) = counting("ok");
        let broken = AppenderSkeleton::new(
            "broken",
            CountingSink {
                panic: true,
                ..Default::default()
            },
        );
        list.add(ok.activated().unwrap());
        list.add(broken.activated().unwrap());

        assert_eq!(list.append_loop_failures(&event(Level::INFO)), 1);
        assert_eq!(list.append_loop_failures(&event(Level::INFO)), 1);
        assert_eq!(ok_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_render_event_appends_throwable_lines() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let event = LoggingEvent::new("x", Level::ERROR, "failed").with_error(&err);
        assert_eq!(render_event(&event, &SimpleLayout), "ERROR - failed\n\tboom\n");
    }
}
