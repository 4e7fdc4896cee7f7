//! Transient, auto-dismissing feedback messages
//!
//! Every notification runs its own clock: it slides in, holds, slides out, and
//! is then removed. Nothing here can fail; showing feedback never gets in the
//! way of a mutation.

use std::time::{Duration, Instant};
use tracing::debug;

/// Default time from insertion until the exit transition starts
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// Default length of the entrance and exit transitions
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

impl Severity {
    /// Background colour used by the HTML renderer
    pub fn color(self) -> &'static str {
        match self {
            Severity::Success => "#2ed573",
            Severity::Error => "#ff4757",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// Where a notification is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Visible,
    Exiting,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub shown_at: Instant,
}

impl Notification {
    pub fn phase(&self, now: Instant, duration: Duration, transition: Duration) -> Phase {
        let elapsed = now.saturating_duration_since(self.shown_at);
        if elapsed < transition.min(duration) {
            Phase::Entering
        } else if elapsed < duration {
            Phase::Visible
        } else if elapsed < duration + transition {
            Phase::Exiting
        } else {
            Phase::Removed
        }
    }
}

/// A notification paired with its phase at the time of a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveNotification {
    pub message: String,
    pub severity: Severity,
    pub phase: Phase,
}

/// Independent, independently timed notifications; no queue, no coalescing
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    next_id: u64,
    duration: Duration,
    transition: Duration,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION, DEFAULT_TRANSITION)
    }
}

impl NotificationCenter {
    pub fn new(duration: Duration, transition: Duration) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            duration,
            transition,
        }
    }

    /// Show a message starting at `now`
    pub fn show(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let message = message.into();
        debug!(id, severity = severity.as_str(), %message, "notification shown");
        self.items.push(Notification {
            id,
            message,
            severity,
            shown_at: now,
        });
        id
    }

    /// Drop every notification whose exit transition has finished
    pub fn tick(&mut self, now: Instant) -> usize {
        let (duration, transition) = (self.duration, self.transition);
        let before = self.items.len();
        self.items
            .retain(|n| n.phase(now, duration, transition) != Phase::Removed);
        let removed = before - self.items.len();
        if removed > 0 {
            debug!(removed, "notifications dismissed");
        }
        removed
    }

    /// Notifications still on screen at `now`, oldest first
    pub fn live(&self, now: Instant) -> Vec<LiveNotification> {
        self.items
            .iter()
            .map(|n| LiveNotification {
                message: n.message.clone(),
                severity: n.severity,
                phase: n.phase(now, self.duration, self.transition),
            })
            .filter(|n| n.phase != Phase::Removed)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_lifecycle_phases() {
        let start = Instant::now();
        let n = Notification {
            id: 1,
            message: "hi".to_string(),
            severity: Severity::Success,
            shown_at: start,
        };

        let phase = |t| n.phase(start + ms(t), DEFAULT_DURATION, DEFAULT_TRANSITION);
        assert_eq!(phase(0), Phase::Entering);
        assert_eq!(phase(299), Phase::Entering);
        assert_eq!(phase(300), Phase::Visible);
        assert_eq!(phase(2999), Phase::Visible);
        assert_eq!(phase(3000), Phase::Exiting);
        assert_eq!(phase(3299), Phase::Exiting);
        assert_eq!(phase(3300), Phase::Removed);
    }

    #[test]
    fn test_phase_before_shown_is_entering() {
        let start = Instant::now();
        let n = Notification {
            id: 1,
            message: "hi".to_string(),
            severity: Severity::Error,
            shown_at: start + ms(500),
        };
        assert_eq!(n.phase(start, DEFAULT_DURATION, DEFAULT_TRANSITION), Phase::Entering);
    }

    #[test]
    fn test_notifications_coexist_and_expire_independently() {
        let start = Instant::now();
        let mut center = NotificationCenter::default();
        center.show("first", Severity::Success, start);
        center.show("second", Severity::Error, start + ms(1000));
        assert_eq!(center.len(), 2);

        assert_eq!(center.tick(start + ms(3300)), 1);
        let live = center.live(start + ms(3300));
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].message, "second");
        assert_eq!(live[0].phase, Phase::Visible);

        assert_eq!(center.tick(start + ms(4300)), 1);
        assert!(center.is_empty());
    }

    #[test]
    fn test_identical_messages_are_not_coalesced() {
        let now = Instant::now();
        let mut center = NotificationCenter::default();
        let a = center.show("Task deleted", Severity::Success, now);
        let b = center.show("Task deleted", Severity::Success, now);
        assert_ne!(a, b);
        assert_eq!(center.live(now).len(), 2);
    }

    #[test]
    fn test_live_hides_expired_before_tick() {
        let now = Instant::now();
        let mut center = NotificationCenter::new(ms(100), ms(10));
        center.show("quick", Severity::Success, now);
        assert!(center.live(now + ms(200)).is_empty());
        assert_eq!(center.len(), 1);
    }

    #[test]
    fn test_severity_colors() {
        assert_eq!(Severity::Success.color(), "#2ed573");
        assert_eq!(Severity::Error.color(), "#ff4757");
    }
}
