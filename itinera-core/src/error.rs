use thiserror::Error;

/// Failures while optimising a single day.
///
/// The optimiser recovers from each of these by keeping the day as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    /// Stops, activities and matrix disagree on the day's size.
    #[error("expected {expected} entries, found {actual}")]
    DimensionMismatch {
        /// Number of activities in the day.
        expected: usize,
        /// Size of the mismatching input.
        actual: usize,
    },

    /// An order is not a permutation of the day's activity indices.
    #[error("order {order:?} is not a permutation of 0..{len}")]
    InvalidPermutation {
        /// Offending order.
        order: Vec<usize>,
        /// Number of activities in the day.
        len: usize,
    },

    /// The task optimising the day panicked or was cancelled.
    #[error("day optimisation task failed: {message}")]
    TaskFailed {
        /// Description of the failure.
        message: String,
    },
}
