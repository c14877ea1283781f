//! Serialization of overlapping applies
//!
//! At most one apply is in flight. Later applies wait in FIFO order and
//! each diffs against the structure its predecessor committed. Completion
//! callbacks are run from the drain loop, never while the view is locked.
//!
//! A panic in a completion, the engine or the view unwinds to the caller
//! of `apply` but does not wedge the queue: the drain flag and the
//! in-flight slot are both released on unwind.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, ThreadId};
use std::time::Instant;

use diffable_core_types::RequestId;

use crate::data_source::{elapsed_ms, lock, read, write};
use crate::diff::{render_summary, DiffEngine};
use crate::errors::{ExError, ExErrorKind};
use crate::identifier::Identifiable;
use crate::patch::{self, BatchCompletion, ListView, PatchOutcome};
use crate::snapshot::Snapshot;
use crate::{log_op_end, log_op_error, log_op_start};

/// Callback fired once per `apply`, after its batch committed
pub type ApplyCompletion = Box<dyn FnOnce() + Send + 'static>;

pub(crate) struct PendingApply<S: Identifiable, I: Identifiable> {
    pub(crate) request_id: RequestId,
    pub(crate) snapshot: Snapshot<S, I>,
    pub(crate) animate: bool,
    pub(crate) completion: Option<ApplyCompletion>,
}

pub(crate) struct ApplyQueue<S: Identifiable, I: Identifiable> {
    pending: VecDeque<PendingApply<S, I>>,
    finished: VecDeque<ApplyCompletion>,
    in_flight: bool,
    draining: bool,
    /// Thread currently inside `with_view`, if any
    view_holder: Option<ThreadId>,
}

impl<S: Identifiable, I: Identifiable> Default for ApplyQueue<S, I> {
    fn default() -> Self {
        Self {
            pending: VecDeque::new(),
            finished: VecDeque::new(),
            in_flight: false,
            draining: false,
            view_holder: None,
        }
    }
}

impl<S: Identifiable, I: Identifiable> ApplyQueue<S, I> {
    /// Applies not yet completed (queued plus in flight)
    pub(crate) fn outstanding(&self) -> usize {
        self.pending.len() + usize::from(self.in_flight)
    }

    fn held_by_current_thread(&self) -> bool {
        self.view_holder == Some(thread::current().id())
    }
}

enum Step<S: Identifiable, I: Identifiable> {
    Finish(ApplyCompletion),
    Run(PendingApply<S, I>),
}

/// Clears `draining` if the drain loop unwinds
struct DrainGuard<'a, S: Identifiable, I: Identifiable> {
    queue: &'a Mutex<ApplyQueue<S, I>>,
}

impl<S: Identifiable, I: Identifiable> Drop for DrainGuard<'_, S, I> {
    fn drop(&mut self) {
        if thread::panicking() {
            lock(self.queue).draining = false;
        }
    }
}

/// Marks the calling thread as holding the view until dropped
pub(crate) struct ViewHold<'a, S: Identifiable, I: Identifiable> {
    queue: &'a Mutex<ApplyQueue<S, I>>,
}

impl<'a, S: Identifiable, I: Identifiable> ViewHold<'a, S, I> {
    pub(crate) fn new(queue: &'a Mutex<ApplyQueue<S, I>>) -> Self {
        lock(queue).view_holder = Some(thread::current().id());
        Self { queue }
    }
}

impl<S: Identifiable, I: Identifiable> Drop for ViewHold<'_, S, I> {
    fn drop(&mut self) {
        lock(self.queue).view_holder = None;
    }
}

/// State shared between the data source and in-flight batch completions
pub(crate) struct Shared<S: Identifiable, I: Identifiable, V> {
    pub(crate) live: Arc<RwLock<Snapshot<S, I>>>,
    pub(crate) view: Mutex<V>,
    pub(crate) engine: Arc<dyn DiffEngine<S, I>>,
    pub(crate) queue: Mutex<ApplyQueue<S, I>>,
}

/// The in-flight slot of one apply
///
/// Settled by the batch completion. Dropped unsettled (the run unwound,
/// or the view discarded the completion) it releases the slot anyway and
/// logs the apply as abandoned; the application's completion is not run.
struct InFlight<S, I, V>
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
    V: ListView + Send + 'static,
{
    shared: Arc<Shared<S, I, V>>,
    request_id: RequestId,
    start: Instant,
    settled: bool,
}

impl<S, I, V> InFlight<S, I, V>
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
    V: ListView + Send + 'static,
{
    fn settle(mut self, done: ApplyCompletion) {
        self.settled = true;
        Shared::finish(&self.shared, done);
    }
}

impl<S, I, V> Drop for InFlight<S, I, V>
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
    V: ListView + Send + 'static,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let err = ExError::new(ExErrorKind::Internal)
            .with_op("apply_snapshot")
            .with_request_id(self.request_id.clone())
            .with_message("apply abandoned before its batch completed");
        log_op_error!(
            "apply_snapshot",
            err,
            duration_ms = elapsed_ms(self.start)
        );
        let resume = {
            let mut queue = lock(&self.shared.queue);
            queue.in_flight = false;
            !queue.draining && !thread::panicking()
        };
        if resume {
            Shared::drain(&self.shared);
        }
    }
}

impl<S, I, V> Shared<S, I, V>
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
    V: ListView + Send + 'static,
{
    pub(crate) fn enqueue(shared: &Arc<Self>, job: PendingApply<S, I>) {
        let outstanding = {
            let mut queue = lock(&shared.queue);
            queue.pending.push_back(job);
            queue.outstanding()
        };
        tracing::debug!(outstanding, "apply queued");
        Self::drain(shared);
    }

    /// Run finished callbacks and queued applies until an apply is left in
    /// flight (its completion resumes draining) or nothing is left.
    ///
    /// A no-op on the thread inside `with_view`; that call drains once it
    /// has released the view.
    pub(crate) fn drain(shared: &Arc<Self>) {
        {
            let mut queue = lock(&shared.queue);
            if queue.draining || queue.held_by_current_thread() {
                return;
            }
            queue.draining = true;
        }
        let _guard = DrainGuard {
            queue: &shared.queue,
        };

        loop {
            let step = {
                let mut queue = lock(&shared.queue);
                if let Some(done) = queue.finished.pop_front() {
                    Step::Finish(done)
                } else if queue.in_flight {
                    queue.draining = false;
                    return;
                } else if let Some(job) = queue.pending.pop_front() {
                    queue.in_flight = true;
                    Step::Run(job)
                } else {
                    queue.draining = false;
                    return;
                }
            };

            match step {
                Step::Finish(done) => done(),
                Step::Run(job) => Self::run(shared, job),
            }
        }
    }

    /// Diff `job` against the live snapshot and hand the patch to the view.
    fn run(shared: &Arc<Self>, job: PendingApply<S, I>) {
        let PendingApply {
            request_id,
            snapshot: mut next,
            animate,
            completion,
        } = job;

        log_op_start!(
            "apply_snapshot",
            request_id = request_id.as_str(),
            animate = animate,
            engine = shared.engine.name()
        );
        let start = Instant::now();
        let in_flight = InFlight {
            shared: Arc::clone(shared),
            request_id: request_id.clone(),
            start,
            settled: false,
        };

        let current = read(&shared.live).clone();
        let changeset = shared.engine.diff(&current, &next);
        let change_count = changeset.change_count();
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                request_id = request_id.as_str(),
                summary = %render_summary(&changeset),
                "changeset"
            );
        }

        next.clear_reload_marks();
        let section_count = next.number_of_sections();
        let item_count = next.number_of_items();
        let live = Arc::clone(&shared.live);
        let commit = move || {
            *write(&live) = next;
        };

        let mut view = lock(&shared.view);
        let outcome = PatchOutcome::plan(&changeset, &*view);

        let batch_done: BatchCompletion = Box::new(move || {
            let finish: ApplyCompletion = Box::new(move || {
                log_op_end!(
                    "apply_snapshot",
                    duration_ms = elapsed_ms(start),
                    request_id = request_id.as_str(),
                    patch_outcome = outcome.as_str(),
                    change_count = change_count,
                    section_count = section_count,
                    item_count = item_count
                );
                if let Some(completion) = completion {
                    completion();
                }
            });
            in_flight.settle(finish);
        });

        patch::apply(&changeset, &mut *view, animate, commit, batch_done);
    }

    /// Called from the view's completion: record the callback, release the
    /// in-flight slot, and resume draining unless a drain loop is active.
    fn finish(shared: &Arc<Self>, done: ApplyCompletion) {
        let resume = {
            let mut queue = lock(&shared.queue);
            queue.in_flight = false;
            queue.finished.push_back(done);
            !queue.draining
        };
        if resume {
            Self::drain(shared);
        }
    }
}
