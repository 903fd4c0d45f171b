//! Per-form status state machine.
//!
//! ```text
//!           submit              Ok
//!   Idle ───────────► Submitting ──► Success ──(dismiss_after)──► Idle + close
//!    ▲                    │
//!    │ open()             │ Err
//!    │                    ▼
//!    └──── close() ◄──── Error ──── submit ───► Submitting
//! ```
//!
//! Transitions are queued under the state lock and delivered in that order,
//! so the last status a subscriber sees is always the stored one.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use nms_client::ApiError;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::action::FormAction;
use crate::status::{FormPhase, FormStatus};

/// Delay between a successful submit and the form closing itself.
pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_millis(1500);

/// Invoked when the form closes itself after a success.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

type StatusHandler = Arc<dyn Fn(&FormStatus) + Send + Sync>;

/// Handle returned by [`FormController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Optional knobs for a [`FormController`].
#[derive(Clone)]
pub struct FormOptions {
    pub dismiss_after: Duration,
    pub on_close: Option<CloseHandler>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            dismiss_after: DEFAULT_DISMISS_AFTER,
            on_close: None,
        }
    }
}

impl FormOptions {
    pub fn dismiss_after(mut self, delay: Duration) -> Self {
        self.dismiss_after = delay;
        self
    }

    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(handler));
        self
    }
}

struct State {
    status: FormStatus,
    open: bool,
    /// Set while an operation runs, whatever close/open did to the phase.
    in_flight: bool,
    /// Bumped on every close/open; completions from an older epoch are dropped.
    epoch: u64,
    dismiss: Option<AbortHandle>,
    /// Transitions not yet delivered to subscribers.
    outbox: VecDeque<FormStatus>,
    /// A caller is currently draining `outbox`.
    draining: bool,
}

impl State {
    fn set(&mut self, status: FormStatus) {
        self.status = status.clone();
        self.outbox.push_back(status);
    }
}

struct Shared {
    action: FormAction,
    state: Mutex<State>,
    handlers: RwLock<Vec<(SubscriptionId, StatusHandler)>>,
    next_id: AtomicU64,
    on_close: Option<CloseHandler>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver queued transitions. Only one caller drains at a time; anyone
    /// else (including a handler re-entering the controller) just queues.
    fn flush(&self) {
        loop {
            let batch: Vec<FormStatus> = {
                let mut state = self.lock();
                if state.draining || state.outbox.is_empty() {
                    return;
                }
                state.draining = true;
                state.outbox.drain(..).collect()
            };
            for status in &batch {
                self.publish(status);
            }
            let mut state = self.lock();
            state.draining = false;
            if state.outbox.is_empty() {
                return;
            }
        }
    }

    /// Never called with the state lock held.
    fn publish(&self, status: &FormStatus) {
        info!(
            resource = %self.action.resource,
            verb = %self.action.verb,
            phase = ?status.phase,
            message = %status.message,
            "form status"
        );
        let handlers: Vec<StatusHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(status);
        }
    }

    fn auto_close(&self, epoch: u64) {
        {
            let mut state = self.lock();
            if state.epoch != epoch || !state.open {
                return;
            }
            state.open = false;
            state.epoch += 1;
            state.dismiss = None;
            state.set(FormStatus::idle());
        }
        if let Some(on_close) = &self.on_close {
            on_close();
        }
        self.flush();
    }
}

/// Marks a running submit. Dropped early, the submit was cancelled: the
/// form leaves Submitting instead of staying stuck there.
struct InFlight<'a> {
    shared: &'a Shared,
    epoch: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        {
            let mut state = self.shared.lock();
            state.in_flight = false;
            if state.epoch != self.epoch || state.status.phase != FormPhase::Submitting {
                return;
            }
            debug!("submit cancelled before completion");
            state.set(FormStatus::idle());
        }
        self.shared.flush();
    }
}

/// Drives one form's submit lifecycle and publishes each transition.
///
/// At most one operation is in flight per controller: `submit` is refused
/// while another one runs (even across `close()`/`open()`) and while the
/// form shows Success. The auto-dismiss after Success runs as a spawned
/// task that `close()`, `open()` and `Drop` abort.
pub struct FormController {
    dismiss_after: Duration,
    shared: Arc<Shared>,
}

impl FormController {
    pub fn new(action: FormAction) -> Self {
        Self::with_options(action, FormOptions::default())
    }

    pub fn with_options(action: FormAction, options: FormOptions) -> Self {
        Self {
            dismiss_after: options.dismiss_after,
            shared: Arc::new(Shared {
                action,
                state: Mutex::new(State {
                    status: FormStatus::idle(),
                    open: true,
                    in_flight: false,
                    epoch: 0,
                    dismiss: None,
                    outbox: VecDeque::new(),
                    draining: false,
                }),
                handlers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                on_close: options.on_close,
            }),
        }
    }

    pub fn action(&self) -> FormAction {
        self.shared.action
    }

    pub fn status(&self) -> FormStatus {
        self.shared.lock().status.clone()
    }

    pub fn is_open(&self) -> bool {
        self.shared.lock().open
    }

    /// Whether an operation started by `submit` is still running.
    pub fn is_busy(&self) -> bool {
        self.shared.lock().in_flight
    }

    /// Register a status handler. It runs synchronously on every transition.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&FormStatus) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.shared
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sid, _)| *sid != id);
    }

    /// Run `op` under the status machine.
    ///
    /// Returns `None` without calling `op` when the form is closed, another
    /// operation is still running, or the form is showing Success. Dropping
    /// the returned future before it finishes resets the form to Idle.
    pub async fn submit<F, Fut, T>(&self, op: F) -> Option<Result<T, ApiError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let action = self.shared.action;
        let epoch = {
            let mut state = self.shared.lock();
            if !state.open || state.in_flight || !state.status.phase.accepts_submit() {
                debug!(
                    phase = ?state.status.phase,
                    open = state.open,
                    in_flight = state.in_flight,
                    "submit ignored"
                );
                return None;
            }
            state.in_flight = true;
            state.set(FormStatus::submitting(action.progress_message()));
            state.epoch
        };
        let mut guard = InFlight {
            shared: &self.shared,
            epoch,
            settled: false,
        };
        self.shared.flush();

        let result = op().await;
        guard.settled = true;

        let next = match &result {
            Ok(_) => FormStatus::success(action.success_message()),
            Err(e) => FormStatus::error(action.failure_message(e)),
        };
        {
            let mut state = self.shared.lock();
            state.in_flight = false;
            if state.epoch != epoch {
                debug!("form closed while submitting, result dropped");
                return Some(result);
            }
            let succeeded = next.phase == FormPhase::Success;
            state.set(next);
            if succeeded {
                self.schedule_dismiss(&mut state, epoch);
            }
        }
        self.shared.flush();
        Some(result)
    }

    /// Close the form now. Cancels a pending auto-dismiss.
    pub fn close(&self) {
        {
            let mut state = self.shared.lock();
            if let Some(timer) = state.dismiss.take() {
                timer.abort();
            }
            if !state.open {
                return;
            }
            state.open = false;
            state.epoch += 1;
            state.set(FormStatus::idle());
        }
        self.shared.flush();
    }

    /// Reopen the form with a fresh Idle status.
    pub fn open(&self) {
        {
            let mut state = self.shared.lock();
            if let Some(timer) = state.dismiss.take() {
                timer.abort();
            }
            state.open = true;
            state.epoch += 1;
            state.set(FormStatus::idle());
        }
        self.shared.flush();
    }

    fn schedule_dismiss(&self, state: &mut State, epoch: u64) {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        let delay = self.dismiss_after;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = shared.upgrade() {
                shared.auto_close(epoch);
            }
        });
        if let Some(old) = state.dismiss.replace(task.abort_handle()) {
            old.abort();
        }
    }
}

impl Drop for FormController {
    fn drop(&mut self) {
        if let Some(timer) = self.shared.lock().dismiss.take() {
            timer.abort();
        }
    }
}
