use time::{OffsetDateTime, UtcOffset};

/// Source of "now" for the tracker. The returned value carries the local
/// offset so calendar-day comparisons happen in local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock with the offset captured once at startup.
///
/// `UtcOffset::current_local_offset` is unreliable once worker threads exist,
/// so it is resolved before the runtime starts and falls back to UTC.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn detect() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "local offset unavailable; using UTC");
            UtcOffset::UTC
        });
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// Clock pinned to a settable instant, for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn system_clock_reports_in_configured_offset() {
        let clock = SystemClock::new(offset!(+5:30));
        assert_eq!(clock.now().offset(), offset!(+5:30));
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let clock = FixedClock::new(datetime!(2024-03-01 08:00 +1));
        clock.set(datetime!(2024-03-02 08:00 +1));
        assert_eq!(clock.now(), datetime!(2024-03-02 08:00 +1));
    }
}
