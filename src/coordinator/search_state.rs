use crate::model::StaleResponsePolicy;

/// Query, results and request bookkeeping for one search domain.
#[derive(Debug, Clone)]
pub struct SearchState<T> {
    pub query: String,
    /// A search has run since startup (or since the district context last changed).
    pub attempted: bool,
    /// Ordered exactly as the lookup returned them.
    pub results: Vec<T>,
    /// Message from the most recent failed lookup; cleared by the next success.
    pub last_error: Option<String>,
    pending: u32,
    latest_generation: u64,
}

impl<T> Default for SearchState<T> {
    fn default() -> Self {
        Self {
            query: String::new(),
            attempted: false,
            results: Vec::new(),
            last_error: None,
            pending: 0,
            latest_generation: 0,
        }
    }
}

impl<T> SearchState<T> {
    pub fn in_flight(&self) -> bool {
        self.pending > 0
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// Register a new request and return its generation, or `None` for a blank query.
    pub(super) fn begin(&mut self) -> Option<u64> {
        if self.query.trim().is_empty() {
            return None;
        }
        self.attempted = true;
        self.pending += 1;
        self.latest_generation += 1;
        Some(self.latest_generation)
    }

    /// Retire a request. Returns whether its outcome should be applied.
    pub(super) fn finish(&mut self, generation: u64, policy: StaleResponsePolicy) -> bool {
        self.pending = self.pending.saturating_sub(1);
        match policy {
            StaleResponsePolicy::Discard => generation == self.latest_generation,
            StaleResponsePolicy::LastResolvedWins => true,
        }
    }

    pub(super) fn replace_results(&mut self, results: Vec<T>) {
        self.results = results;
        self.last_error = None;
    }
}
