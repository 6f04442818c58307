//! Asynchronous dispatch appender
//!
//! Wraps child appenders behind a bounded FIFO buffer drained by one
//! dedicated dispatcher thread, so log calls return without waiting for slow
//! outputs.
//!
//! Ordering: the dispatcher drains the buffer in batches while holding the
//! dispatch lock. A producer falling back to synchronous dispatch takes the
//! same lock and first drains whatever is still queued, so events reach the
//! children in the order they were accepted.
//!
//! Shutdown: producers already inside `append` when `close` starts still get
//! their event to the children. A producer blocked on a full buffer switches
//! to synchronous dispatch, and `close` waits for such producers before it
//! closes the children.

use crate::core::appender::{Appender, AppenderCore, AppenderList};
use crate::core::error::{LoggerError, Result};
use crate::core::event::LoggingEvent;
use crate::core::internal_log::{self, panic_message};
use crate::core::level::Level;
use crate::core::metrics::DispatchMetrics;
use crate::core::overflow_policy::{OverflowCallback, OverflowPolicy};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

/// Default number of buffered events
pub const DEFAULT_BUFFER_SIZE: usize = 128;

/// Events in a row on which a child failed before falling back to
/// synchronous dispatch
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Bound on how long `flush` waits for the dispatcher
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on how long `close` waits for the dispatcher thread to exit
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

enum Task {
    Event(LoggingEvent),
    /// Acknowledged once everything queued before it has been dispatched
    Flush(Sender<()>),
}

#[derive(Default)]
struct Queue {
    tasks: VecDeque<Task>,
    /// Event tasks only; flush markers do not use capacity
    events: usize,
    closed: bool,
}

struct Shared {
    name: String,
    children: AppenderList,
    queue: Mutex<Queue>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
    dispatch_lock: Mutex<()>,
    /// Held shared by producers while they hand over an event, exclusively by
    /// `close` before it closes the children
    producers: RwLock<()>,
    metrics: DispatchMetrics,
    degraded: AtomicBool,
    consecutive_failures: AtomicU32,
    max_consecutive_failures: u32,
    dispatcher: OnceLock<ThreadId>,
    policy: OverflowPolicy,
    on_discard: Option<OverflowCallback>,
}

impl Shared {
    fn on_dispatcher_thread(&self) -> bool {
        self.dispatcher.get() == Some(&thread::current().id())
    }

    fn run_dispatcher(&self) {
        internal_log::debug(format_args!("Dispatcher for [{}] started", self.name));
        loop {
            {
                let mut queue = self.queue.lock();
                while queue.tasks.is_empty() && !queue.closed {
                    self.not_empty.wait(&mut queue);
                }
                if queue.tasks.is_empty() {
                    break;
                }
            }
            let _dispatching = self.dispatch_lock.lock();
            let batch = self.take_all();
            self.run(batch);
        }
        internal_log::debug(format_args!("Dispatcher for [{}] stopped", self.name));
    }

    /// Empty the buffer and wake blocked producers
    fn take_all(&self) -> VecDeque<Task> {
        let mut queue = self.queue.lock();
        queue.events = 0;
        let tasks = std::mem::take(&mut queue.tasks);
        drop(queue);
        self.not_full.notify_all();
        tasks
    }

    fn run(&self, tasks: VecDeque<Task>) {
        for task in tasks {
            match task {
                Task::Event(event) => self.dispatch(&event),
                Task::Flush(ack) => {
                    self.flush_children();
                    let _ = ack.send(());
                }
            }
        }
    }

    /// Hand one event to every child
    ///
    /// The event counts as failed when a child reports a failed append or a
    /// panic escapes a child that bypasses the shared pipeline.
    fn dispatch(&self, event: &LoggingEvent) {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.children.append_loop_failures(event)));
        let failed = match outcome {
            Ok(failures) => failures > 0,
            Err(payload) => {
                internal_log::error(LoggerError::appender_panicked(
                    &self.name,
                    panic_message(&*payload),
                ));
                true
            }
        };
        if !failed {
            self.metrics.record_dispatched();
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return;
        }

        self.metrics.record_dispatch_failure();
        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= self.max_consecutive_failures && !self.degraded.swap(true, Ordering::AcqRel) {
            internal_log::warn(format_args!(
                "Async appender [{}] switched to synchronous dispatch after {} consecutive failures",
                self.name, failures
            ));
        }
    }

    fn flush_children(&self) {
        for child in self.children.all().iter() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| child.flush()));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => child.core().handle_error(&e, None),
                Err(payload) => internal_log::error(LoggerError::appender_panicked(
                    child.name(),
                    panic_message(&*payload),
                )),
            }
        }
    }

    /// Dispatch on the calling thread after everything already queued
    fn dispatch_sync(&self, event: &LoggingEvent) {
        self.metrics.record_sync_fallback();
        let _dispatching = self.dispatch_lock.lock();
        let pending = self.take_all();
        self.run(pending);
        self.dispatch(event);
    }

    fn discard(&self) {
        let previous = self.metrics.record_discarded();
        if let Some(callback) = &self.on_discard {
            callback(previous + 1);
        }
    }

    fn push(&self, queue: &mut Queue, event: &LoggingEvent) {
        queue.tasks.push_back(Task::Event(event.clone()));
        queue.events += 1;
        self.metrics.record_accepted();
        self.not_empty.notify_one();
    }

    /// Oldest queued event with the lowest rank
    fn lowest_queued(queue: &Queue) -> Option<(usize, i32)> {
        let mut lowest: Option<(usize, i32)> = None;
        for (index, task) in queue.tasks.iter().enumerate() {
            if let Task::Event(queued) = task {
                let rank = queued.level().rank();
                match lowest {
                    Some((_, lowest_rank)) if lowest_rank <= rank => {}
                    _ => lowest = Some((index, rank)),
                }
            }
        }
        lowest
    }

    fn offer(&self, event: &LoggingEvent) -> Result<()> {
        let mut queue = self.queue.lock();
        if queue.closed {
            return Err(LoggerError::appender_closed(&self.name));
        }
        if queue.events < self.capacity {
            self.push(&mut queue, event);
            return Ok(());
        }

        self.metrics.record_queue_full();
        match &self.policy {
            OverflowPolicy::Block => {
                self.metrics.record_block();
                loop {
                    self.not_full.wait(&mut queue);
                    if queue.closed {
                        drop(queue);
                        self.dispatch_sync(event);
                        return Ok(());
                    }
                    if queue.events < self.capacity {
                        self.push(&mut queue, event);
                        return Ok(());
                    }
                }
            }
            OverflowPolicy::BlockThenSync(timeout) => {
                self.metrics.record_block();
                let deadline = Instant::now() + *timeout;
                loop {
                    let timed_out = self.not_full.wait_until(&mut queue, deadline).timed_out();
                    if queue.closed || timed_out {
                        break;
                    }
                    if queue.events < self.capacity {
                        self.push(&mut queue, event);
                        return Ok(());
                    }
                }
                drop(queue);
                self.dispatch_sync(event);
                Ok(())
            }
            OverflowPolicy::Sync => {
                drop(queue);
                self.dispatch_sync(event);
                Ok(())
            }
            OverflowPolicy::DiscardLowest => {
                match Self::lowest_queued(&queue) {
                    Some((index, rank)) if event.level().rank() > rank => {
                        queue.tasks.remove(index);
                        queue.tasks.push_back(Task::Event(event.clone()));
                        self.metrics.record_accepted();
                        self.not_empty.notify_one();
                    }
                    _ => {}
                }
                drop(queue);
                self.discard();
                Ok(())
            }
            OverflowPolicy::DropIncoming => {
                drop(queue);
                self.discard();
                Ok(())
            }
        }
    }
}

/// Appender that forwards events to its children from a background thread
///
/// # Example
///
/// ```
/// use rust_logger_hierarchy::prelude::*;
/// use rust_logger_hierarchy::appenders::AsyncAppender;
///
/// let (memory, handle) = MemoryAppender::memory("memory", 100);
/// let async_appender = AsyncAppender::builder("async")
///     .buffer_size(64)
///     .overflow(OverflowPolicy::Sync)
///     .build();
/// async_appender.add_appender(memory.activated().unwrap());
/// let async_appender = async_appender.activated().unwrap();
///
/// let hierarchy = Hierarchy::new();
/// hierarchy.root_logger().add_appender(async_appender.clone());
/// hierarchy.get_logger("app").info("queued");
///
/// async_appender.flush().unwrap();
/// assert_eq!(handle.messages(), vec!["queued".to_string()]);
/// ```
pub struct AsyncAppender {
    core: AppenderCore,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
    flush_timeout: Duration,
    shutdown_timeout: Duration,
}

impl AsyncAppender {
    /// Appender with the default buffer size and overflow policy
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    pub fn builder(name: impl Into<String>) -> AsyncAppenderBuilder {
        AsyncAppenderBuilder::new(name)
    }

    /// Attach a child. Children are expected to be active already.
    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        if !self.shared.children.add(appender) {
            internal_log::debug(format_args!(
                "Appender already attached to [{}]",
                self.core.name()
            ));
        }
    }

    pub fn remove_appender(&self, appender: &Arc<dyn Appender>) -> bool {
        self.shared.children.remove(appender)
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.shared.metrics
    }

    pub fn buffer_size(&self) -> usize {
        self.shared.capacity
    }

    pub fn overflow_policy(&self) -> &OverflowPolicy {
        &self.shared.policy
    }

    /// Whether dispatch permanently moved to the calling threads
    pub fn is_degraded(&self) -> bool {
        self.shared.degraded.load(Ordering::Acquire)
    }

    /// Events waiting in the buffer
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().events
    }

    /// Activate and wrap for attaching to loggers
    pub fn activated(self) -> Result<Arc<Self>> {
        self.activate_options()?;
        Ok(Arc::new(self))
    }

    fn join_dispatcher(&self, handle: JoinHandle<()>) {
        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if handle.join().is_err() {
                    internal_log::error(format_args!(
                        "Dispatcher thread of [{}] panicked",
                        self.core.name()
                    ));
                }
                return;
            }
            if start.elapsed() >= self.shutdown_timeout {
                internal_log::warn(format_args!(
                    "Dispatcher of [{}] did not finish within {:?}, draining on the closing thread",
                    self.core.name(),
                    self.shutdown_timeout
                ));
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Appender for AsyncAppender {
    fn core(&self) -> &AppenderCore {
        &self.core
    }

    fn append(&self, event: &LoggingEvent) -> Result<()> {
        let shared = &self.shared;

        // The dispatcher already holds the dispatch lock
        if shared.on_dispatcher_thread() {
            shared.dispatch(event);
            return Ok(());
        }
        let _producing = shared.producers.read_recursive();
        if shared.degraded.load(Ordering::Acquire) || shared.dispatcher.get().is_none() {
            shared.dispatch_sync(event);
            return Ok(());
        }
        shared.offer(event)
    }

    fn activate_options(&self) -> Result<()> {
        if self.core.is_closed() {
            return Err(LoggerError::appender_closed(self.core.name()));
        }
        let mut handle = self.handle.lock();
        if handle.is_none() {
            let shared = Arc::clone(&self.shared);
            let spawned = thread::Builder::new()
                .name(format!("async-appender-{}", self.core.name()))
                .spawn(move || shared.run_dispatcher())
                .map_err(|e| {
                    LoggerError::io_operation("spawning dispatcher", self.core.name(), e)
                })?;
            let _ = self.shared.dispatcher.set(spawned.thread().id());
            *handle = Some(spawned);
        }
        drop(handle);
        self.core.mark_active()
    }

    /// Stop accepting, drain what was accepted, then close the children
    fn close(&self) {
        if !self.core.mark_closed() {
            return;
        }
        internal_log::debug(format_args!("Closing async appender [{}]", self.core.name()));

        self.shared.queue.lock().closed = true;
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();

        let on_dispatcher = self.shared.on_dispatcher_thread();
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if !on_dispatcher {
                self.join_dispatcher(handle);
            }
        }

        if on_dispatcher {
            let leftovers = self.shared.take_all();
            self.shared.run(leftovers);
        } else {
            let _dispatching = self.shared.dispatch_lock.lock();
            let leftovers = self.shared.take_all();
            self.shared.run(leftovers);
        }

        if self.shared.producers.try_write_for(self.shutdown_timeout).is_none() {
            internal_log::warn(format_args!(
                "Producers of [{}] still dispatching after {:?}, closing children anyway",
                self.core.name(),
                self.shutdown_timeout
            ));
        }

        for child in self.shared.children.all().iter() {
            child.close();
        }
    }

    /// Wait until everything queued so far reached the children
    fn flush(&self) -> Result<()> {
        if self.core.is_closed() {
            return Ok(());
        }
        let shared = &self.shared;
        if shared.on_dispatcher_thread() {
            shared.flush_children();
            return Ok(());
        }
        if shared.degraded.load(Ordering::Acquire) || shared.dispatcher.get().is_none() {
            let _dispatching = shared.dispatch_lock.lock();
            let pending = shared.take_all();
            shared.run(pending);
            shared.flush_children();
            return Ok(());
        }

        let (ack, done) = bounded(1);
        {
            let mut queue = shared.queue.lock();
            if queue.closed {
                return Ok(());
            }
            queue.tasks.push_back(Task::Flush(ack));
        }
        shared.not_empty.notify_one();

        match done.recv_timeout(self.flush_timeout) {
            Ok(()) => Ok(()),
            Err(RecvTimeoutError::Timeout) => Err(LoggerError::timeout(
                format!("flushing async appender [{}]", self.core.name()),
                self.flush_timeout,
            )),
            Err(RecvTimeoutError::Disconnected) => Err(LoggerError::ChannelReceiveError),
        }
    }

    fn attached(&self) -> Option<&AppenderList> {
        Some(&self.shared.children)
    }
}

impl Drop for AsyncAppender {
    fn drop(&mut self) {
        if !self.core.is_closed() {
            self.close();
        }
    }
}

impl fmt::Debug for AsyncAppender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncAppender")
            .field("core", &self.core)
            .field("children", &self.shared.children)
            .field("buffer_size", &self.shared.capacity)
            .field("policy", &self.shared.policy)
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

/// Builder for [`AsyncAppender`]
#[must_use]
pub struct AsyncAppenderBuilder {
    name: String,
    buffer_size: usize,
    overflow: OverflowPolicy,
    max_consecutive_failures: u32,
    flush_timeout: Duration,
    shutdown_timeout: Duration,
    threshold: Level,
    on_discard: Option<OverflowCallback>,
}

impl AsyncAppenderBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            overflow: OverflowPolicy::default(),
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            threshold: Level::ALL,
            on_discard: None,
        }
    }

    /// Buffer capacity in events, at least one
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = max.max(1);
        self
    }

    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn threshold(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    /// Called with the running discard count each time an event is lost
    pub fn on_discard(mut self, callback: OverflowCallback) -> Self {
        self.on_discard = Some(callback);
        self
    }

    pub fn build(self) -> AsyncAppender {
        let core = AppenderCore::new(self.name.clone());
        core.set_threshold(self.threshold);
        AsyncAppender {
            core,
            shared: Arc::new(Shared {
                name: self.name,
                children: AppenderList::new(),
                queue: Mutex::new(Queue::default()),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity: self.buffer_size,
                dispatch_lock: Mutex::new(()),
                producers: RwLock::new(()),
                metrics: DispatchMetrics::new(),
                degraded: AtomicBool::new(false),
                consecutive_failures: AtomicU32::new(0),
                max_consecutive_failures: self.max_consecutive_failures,
                dispatcher: OnceLock::new(),
                policy: self.overflow,
                on_discard: self.on_discard,
            }),
            handle: Mutex::new(None),
            flush_timeout: self.flush_timeout,
            shutdown_timeout: self.shutdown_timeout,
        }
    }
}
