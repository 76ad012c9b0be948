// ── Revalidation policy ──
//
// When a query goes back to the server on its own: on a timer, when the
// user returns to the app, or when the network comes back.

use std::time::Duration;

/// Fetches on mount are skipped if a success landed this recently.
pub const DEFAULT_DEDUPE_INTERVAL: Duration = Duration::from_secs(2);

/// Trigger lists poll at this rate.
pub const TRIGGERS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Something outside the query that may warrant a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RevalidateEvent {
    /// The app regained focus.
    Focus,
    /// Network connectivity came back.
    Reconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalidationPolicy {
    /// Poll while subscribed. `None` or a zero duration disables polling.
    pub refresh_interval: Option<Duration>,
    pub on_focus: bool,
    pub on_reconnect: bool,
    pub dedupe_interval: Duration,
}

impl RevalidationPolicy {
    /// Poll every `every`, and also revalidate on focus and reconnect.
    pub fn polling(every: Duration) -> Self {
        Self {
            refresh_interval: Some(every),
            on_focus: true,
            on_reconnect: true,
            dedupe_interval: DEFAULT_DEDUPE_INTERVAL,
        }
    }

    /// No polling and no focus revalidation; reconnects still refetch.
    pub fn on_reconnect_only() -> Self {
        Self {
            refresh_interval: None,
            on_focus: false,
            on_reconnect: true,
            dedupe_interval: DEFAULT_DEDUPE_INTERVAL,
        }
    }

    /// Only explicit revalidation. Used for one-shot CLI reads.
    pub fn manual() -> Self {
        Self {
            refresh_interval: None,
            on_focus: false,
            on_reconnect: false,
            dedupe_interval: DEFAULT_DEDUPE_INTERVAL,
        }
    }

    pub fn with_refresh_interval(mut self, every: Option<Duration>) -> Self {
        self.refresh_interval = every;
        self
    }

    pub fn with_focus(mut self, on_focus: bool) -> Self {
        self.on_focus = on_focus;
        self
    }

    pub fn with_dedupe_interval(mut self, dedupe: Duration) -> Self {
        self.dedupe_interval = dedupe;
        self
    }

    /// The effective polling period, if any.
    pub fn poll_period(&self) -> Option<Duration> {
        self.refresh_interval.filter(|d| !d.is_zero())
    }

    pub fn revalidates_on(&self, event: RevalidateEvent) -> bool {
        match event {
            RevalidateEvent::Focus => self.on_focus,
            RevalidateEvent::Reconnect => self.on_reconnect,
        }
    }
}

impl Default for RevalidationPolicy {
    fn default() -> Self {
        Self {
            refresh_interval: None,
            on_focus: true,
            on_reconnect: true,
            dedupe_interval: DEFAULT_DEDUPE_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_resource_needs() {
        let triggers = RevalidationPolicy::polling(TRIGGERS_POLL_INTERVAL);
        assert_eq!(triggers.poll_period(), Some(Duration::from_secs(5)));
        assert!(triggers.revalidates_on(RevalidateEvent::Focus));
        assert!(triggers.revalidates_on(RevalidateEvent::Reconnect));

        let effects = RevalidationPolicy::on_reconnect_only();
        assert_eq!(effects.poll_period(), None);
        assert!(!effects.revalidates_on(RevalidateEvent::Focus));
        assert!(effects.revalidates_on(RevalidateEvent::Reconnect));
    }

    #[test]
    fn zero_interval_disables_polling() {
        let policy = RevalidationPolicy::polling(Duration::ZERO);
        assert_eq!(policy.poll_period(), None);
    }
}
