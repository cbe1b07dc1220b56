//! Connection state machine
//!
//! Tracks the single current [`ConnectionState`] of a card session and
//! broadcasts every transition to registered [`Monitor`]s. The state and the
//! monitor set live under one mutex so a transition and its notifications
//! happen atomically.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

/// Current state of the connection between a session and the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Bluetooth is not enabled on the host
    BluetoothDisabled,

    /// The host has not been paired with the card
    CardNotPaired,

    /// The session is attempting to connect
    Connecting,

    /// The session is connected
    Connected,

    /// The session is transferring data to or from the card
    Transferring,

    /// The session is disconnecting
    Disconnecting,

    /// The session is disconnected
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A handler for connection state changes
pub trait Monitor: Send + Sync {
    /// Called with the new state on every transition
    fn on_state_changed(&self, state: ConnectionState);
}

/// Shared connection state tracker
///
/// Thread-safe and cheap to clone (`Arc` internally). The session owns the
/// transitions; monitors observe them.
#[derive(Clone)]
pub struct ConnectionTracker {
    inner: Arc<parking_lot::Mutex<TrackerInner>>,
}

struct TrackerInner {
    state: ConnectionState,
    monitors: Vec<Arc<dyn Monitor>>,
}

impl ConnectionTracker {
    /// Create a tracker in the `Disconnected` state
    pub fn new() -> Self {
        Self {
            inner: Arc::new(parking_lot::Mutex::new(TrackerInner {
                state: ConnectionState::Disconnected,
                monitors: Vec::new(),
            })),
        }
    }

    /// Get the current state
    pub fn state(&self) -> ConnectionState {
        self.inner.lock().state
    }

    /// Transition to a new state and notify all monitors.
    ///
    /// A transition to the current state is a no-op: monitors receive no
    /// duplicate notification.
    pub fn set_state(&self, state: ConnectionState) {
        let mut inner = self.inner.lock();
        if inner.state == state {
            return;
        }

        debug!("Connection state: {} -> {}", inner.state, state);
        inner.state = state;

        for monitor in &inner.monitors {
            monitor.on_state_changed(state);
        }
    }

    /// Register a monitor. Registering the same monitor twice is a no-op.
    pub fn add_monitor(&self, monitor: Arc<dyn Monitor>) {
        let mut inner = self.inner.lock();
        if !inner.monitors.iter().any(|m| Arc::ptr_eq(m, &monitor)) {
            inner.monitors.push(monitor);
        }
    }

    /// Remove a previously registered monitor
    pub fn remove_monitor(&self, monitor: &Arc<dyn Monitor>) {
        let mut inner = self.inner.lock();
        inner.monitors.retain(|m| !Arc::ptr_eq(m, monitor));
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ConnectionTracker")
            .field("state", &inner.state)
            .field("monitors", &inner.monitors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct RecordingMonitor {
        seen: Mutex<Vec<ConnectionState>>,
    }

    impl RecordingMonitor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<ConnectionState> {
            self.seen.lock().clone()
        }
    }

    impl Monitor for RecordingMonitor {
        fn on_state_changed(&self, state: ConnectionState) {
            self.seen.lock().push(state);
        }
    }

    #[test]
    fn test_initial_state() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_transitions_notify_monitors() {
        let tracker = ConnectionTracker::new();
        let monitor = RecordingMonitor::new();
        tracker.add_monitor(monitor.clone());

        tracker.set_state(ConnectionState::Connecting);
        tracker.set_state(ConnectionState::Connected);

        assert_eq!(tracker.state(), ConnectionState::Connected);
        assert_eq!(
            monitor.seen(),
            vec![ConnectionState::Connecting, ConnectionState::Connected]
        );
    }

    #[test]
    fn test_duplicate_state_is_not_notified() {
        let tracker = ConnectionTracker::new();
        let monitor = RecordingMonitor::new();
        tracker.add_monitor(monitor.clone());

        tracker.set_state(ConnectionState::Connected);
        tracker.set_state(ConnectionState::Connected);

        assert_eq!(monitor.seen(), vec![ConnectionState::Connected]);
    }

    #[test]
    fn test_add_monitor_deduplicates() {
        let tracker = ConnectionTracker::new();
        let monitor = RecordingMonitor::new();
        tracker.add_monitor(monitor.clone());
        tracker.add_monitor(monitor.clone());

        tracker.set_state(ConnectionState::Connecting);

        assert_eq!(monitor.seen().len(), 1);
    }

    #[test]
    fn test_remove_monitor() {
        let tracker = ConnectionTracker::new();
        let monitor = RecordingMonitor::new();
        tracker.add_monitor(monitor.clone());
        tracker.remove_monitor(&(monitor.clone() as Arc<dyn Monitor>));

        tracker.set_state(ConnectionState::Connecting);

        assert!(monitor.seen().is_empty());
    }

    #[test]
    fn test_tracker_clone_shares_state() {
        let tracker = ConnectionTracker::new();
        let clone = tracker.clone();

        tracker.set_state(ConnectionState::Connected);
        assert_eq!(clone.state(), ConnectionState::Connected);
    }
}
