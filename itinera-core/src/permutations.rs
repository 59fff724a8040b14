//! Iterative permutation generation using Heap's algorithm.

/// Yields every ordering of `0..n` exactly once.
///
/// Each step performs a single swap, so the generator needs `O(n)` memory
/// regardless of how many orderings it produces. The identity ordering is
/// always yielded first; for `n == 0` it is the only (empty) ordering.
///
/// # Examples
/// ```
/// use itinera_core::Permutations;
///
/// let all: Vec<Vec<usize>> = Permutations::new(3).collect();
/// assert_eq!(all.len(), 6);
/// assert_eq!(all.first(), Some(&vec![0, 1, 2]));
/// ```
#[derive(Debug, Clone)]
pub struct Permutations {
    current: Vec<usize>,
    counters: Vec<usize>,
    position: usize,
    started: bool,
}

impl Permutations {
    /// Prepare to enumerate the orderings of `0..n`.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            current: (0..n).collect(),
            counters: vec![0; n],
            position: 1,
            started: false,
        }
    }

    fn advance(&mut self) -> bool {
        let n = self.current.len();
        while self.position < n {
            let i = self.position;
            let Some(counter) = self.counters.get(i).copied() else {
                return false;
            };
            if counter < i {
                let j = if i.is_multiple_of(2) { 0 } else { counter };
                self.current.swap(j, i);
                if let Some(slot) = self.counters.get_mut(i) {
                    *slot += 1;
                }
                self.position = 1;
                return true;
            }
            if let Some(slot) = self.counters.get_mut(i) {
                *slot = 0;
            }
            self.position += 1;
        }
        false
    }
}

impl Iterator for Permutations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(self.current.clone());
        }
        self.advance().then(|| self.current.clone())
    }
}

/// Number of orderings of `n` items, saturating at `u64::MAX`.
#[must_use]
pub fn factorial(n: usize) -> u64 {
    (2..=n).fold(1_u64, |acc, k| {
        acc.saturating_mul(u64::try_from(k).unwrap_or(u64::MAX))
    })
}
