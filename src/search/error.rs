/// Errors from resuming or finalizing a [Search](crate::Search).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Graph changed while the search was suspended (generation {expected} -> {found})")]
    StaleGraph { expected: u64, found: u64 },
}
