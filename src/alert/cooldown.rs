//! Per-kind alert cooldown.

use super::AlertKind;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Remembers when each alert kind last fired.
///
/// Acquisition is atomic per kind: two concurrent callers cannot both pass
/// the gate for the same kind within one cooldown window.
#[derive(Debug, Default)]
pub struct CooldownGate {
    last_fired: DashMap<AlertKind, Instant>,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true and records `now` when `kind` may fire; false while it
    /// is still cooling down.
    pub fn try_acquire(&self, kind: AlertKind, now: Instant, cooldown: Duration) -> bool {
        match self.last_fired.entry(kind) {
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) < cooldown {
                    false
                } else {
                    entry.insert(now);
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Backdates every kind so the next acquisition passes.
    pub fn force_expire_all(&self, now: Instant, cooldown: Duration) {
        let backdate = cooldown.saturating_add(Duration::from_secs(1));
        for kind in AlertKind::ALL {
            match now.checked_sub(backdate) {
                Some(expired) => {
                    self.last_fired.insert(kind, expired);
                }
                None => {
                    self.last_fired.remove(&kind);
                }
            }
        }
    }

    pub fn last_fired(&self, kind: AlertKind) -> Option<Instant> {
        self.last_fired.get(&kind).map(|entry| *entry.value())
    }

    /// Time left before `kind` may fire again, if it is cooling down.
    pub fn remaining(&self, kind: AlertKind, now: Instant, cooldown: Duration) -> Option<Duration> {
        let last = self.last_fired(kind)?;
        let elapsed = now.saturating_duration_since(last);
        cooldown.checked_sub(elapsed).filter(|left| !left.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(300);

    #[test]
    fn test_first_alert_passes() {
        let gate = CooldownGate::new();
        assert!(gate.try_acquire(AlertKind::CpuHigh, Instant::now(), COOLDOWN));
    }

    #[test]
    fn test_kinds_are_independent() {
        let gate = CooldownGate::new();
        let now = Instant::now();
        assert!(gate.try_acquire(AlertKind::CpuHigh, now, COOLDOWN));
        assert!(gate.try_acquire(AlertKind::RamHigh, now, COOLDOWN));
        assert!(gate.try_acquire(AlertKind::SystemCritical, now, COOLDOWN));
        assert!(!gate.try_acquire(AlertKind::CpuHigh, now, COOLDOWN));
    }

    #[test]
    fn test_remaining() {
        let gate = CooldownGate::new();
        let t0 = Instant::now();
        assert_eq!(gate.remaining(AlertKind::DiskHigh, t0, COOLDOWN), None);
        gate.try_acquire(AlertKind::DiskHigh, t0, COOLDOWN);
        assert_eq!(
            gate.remaining(AlertKind::DiskHigh, t0 + Duration::from_secs(100), COOLDOWN),
            Some(Duration::from_secs(200))
        );
        assert_eq!(
            gate.remaining(AlertKind::DiskHigh, t0 + COOLDOWN, COOLDOWN),
            None
        );
    }
}
