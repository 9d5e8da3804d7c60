// State management module
//
// StateManager wraps InstallerState with thread-safe access using
// Arc<RwLock<T>> and emits change events for front ends.

use crate::models::{InstallPhase, InstallerState, OperationKind, OperationOutcome};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Receives progress from running operations.
///
/// The installer reports through this seam instead of a global; the default
/// implementation is [`StateManager`].
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink: Send + Sync {
    fn phase_changed(&self, kind: OperationKind, phase: InstallPhase);

    fn progress(&self, kind: OperationKind, done: usize, total: usize);

    fn message(&self, kind: OperationKind, text: &str);

    fn finished(&self, kind: OperationKind, outcome: &OperationOutcome);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn phase_changed(&self, _kind: OperationKind, _phase: InstallPhase) {}

    fn progress(&self, _kind: OperationKind, _done: usize, _total: usize) {}

    fn message(&self, _kind: OperationKind, _text: &str) {}

    fn finished(&self, _kind: OperationKind, _outcome: &OperationOutcome) {}
}

/// Change events emitted when state is modified
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// An operation moved to a new phase
    PhaseChanged {
        kind: OperationKind,
        phase: InstallPhase,
    },

    /// Extraction progress
    ProgressUpdated { current: usize, total: usize },

    /// Current operation text has changed
    OperationChanged { operation: String },

    /// An operation reached its final outcome
    OperationFinished {
        kind: OperationKind,
        outcome: OperationOutcome,
    },

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// - Provides thread-safe access to [`InstallerState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Use [`read()`](Self::read) and [`snapshot()`](Self::snapshot) for queries
/// and [`update()`](Self::update) for mutations.
pub struct StateManager {
    state: Arc<RwLock<InstallerState>>,
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with a broadcast buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(InstallerState::default())),
            state_tx,
        }
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> InstallerState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let busy = state_manager.read(|state| state.is_busy());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&InstallerState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Captures the old state, applies `update_fn`, diffs, and broadcasts
    /// one event per detected change.
    ///
    /// # Returns
    /// The events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut InstallerState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);
        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn detect_changes(&self, old: &InstallerState, new: &InstallerState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        for kind in OperationKind::ALL {
            let phase = new.phase(kind);
            if old.phase(kind) != phase {
                changes.push(StateChange::PhaseChanged { kind, phase });
            }
        }

        if old.progress != new.progress || old.total != new.total {
            changes.push(StateChange::ProgressUpdated {
                current: new.progress,
                total: new.total,
            });
        }

        if old.current_operation != new.current_operation {
            changes.push(StateChange::OperationChanged {
                operation: new.current_operation.clone(),
            });
        }

        changes
    }

    /// Move `kind` to `phase`. Entering `Staging` clears progress.
    pub fn set_phase(&self, kind: OperationKind, phase: InstallPhase) -> Vec<StateChange> {
        self.update(|state| {
            if phase == InstallPhase::Staging {
                state.progress = 0;
                state.total = 0;
            }
            state.phases.insert(kind, phase);
        })
    }

    pub fn update_progress(&self, current: usize, total: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.progress = current;
            state.total = total;
        })
    }

    pub fn set_operation(&self, operation: impl Into<String>) -> Vec<StateChange> {
        let operation = operation.into();
        self.update(|state| state.current_operation = operation)
    }

    /// Record the final outcome of an operation.
    ///
    /// Always emits [`StateChange::OperationFinished`], even when the outcome
    /// equals the previous one.
    pub fn finish_operation(
        &self,
        kind: OperationKind,
        outcome: OperationOutcome,
    ) -> Vec<StateChange> {
        let mut changes = self.update(|state| {
            state.last_outcomes.insert(kind, outcome.clone());
            state.current_operation.clear();
        });

        let finished = StateChange::OperationFinished { kind, outcome };
        let _ = self.state_tx.send(finished.clone());
        changes.push(finished);

        changes
    }

    /// Reset all state
    pub fn reset(&self) -> Vec<StateChange> {
        let mut changes = self.update(InstallerState::reset);

        let reset_event = StateChange::StateReset;
        let _ = self.state_tx.send(reset_event.clone());
        changes.push(reset_event);

        changes
    }
}

impl ProgressSink for StateManager {
    fn phase_changed(&self, kind: OperationKind, phase: InstallPhase) {
        self.set_phase(kind, phase);
    }

    fn progress(&self, _kind: OperationKind, done: usize, total: usize) {
        self.update_progress(done, total);
    }

    fn message(&self, _kind: OperationKind, text: &str) {
        self.set_operation(text);
    }

    fn finished(&self, kind: OperationKind, outcome: &OperationOutcome) {
        self.finish_operation(kind, outcome.clone());
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
