use serde::Serialize;

/// Counters for one streaming session.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    pub chunk_changes: u64,
    pub fetches_issued: u64,
    pub fetches_applied: u64,
    /// Completions dropped because a newer chunk change superseded them.
    pub stale_discarded: u64,
    pub fetches_failed: u64,
    pub wells_applied: u64,
}

impl StreamStats {
    /// Fetches issued but not yet resolved one way or another.
    pub fn in_flight(&self) -> u64 {
        self.fetches_issued
            .saturating_sub(self.fetches_applied + self.stale_discarded + self.fetches_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::StreamStats;

    #[test]
    fn in_flight_accounts_for_every_outcome() {
        let stats = StreamStats {
            fetches_issued: 5,
            fetches_applied: 2,
            stale_discarded: 1,
            fetches_failed: 1,
            ..StreamStats::default()
        };
        assert_eq!(stats.in_flight(), 1);
    }
}
