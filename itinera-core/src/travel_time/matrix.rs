//! Square travel-cost matrix over the stops of one day.

use std::time::Duration;

use super::error::TravelTimeError;

/// Duration and distance of one directed leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TravelCost {
    /// Travel time.
    pub duration: Duration,
    /// Travel distance in metres.
    pub distance_meters: u64,
}

impl TravelCost {
    /// Cost of staying put.
    pub const ZERO: Self = Self::new(Duration::ZERO, 0);

    /// Cost assumed when nothing better is known: 600 s and 500 m.
    pub const FALLBACK: Self = Self::new(Duration::from_secs(600), 500);

    /// Construct a cost.
    #[must_use]
    pub const fn new(duration: Duration, distance_meters: u64) -> Self {
        Self {
            duration,
            distance_meters,
        }
    }

    /// Construct a cost from whole seconds and metres.
    #[must_use]
    pub const fn from_secs(seconds: u64, distance_meters: u64) -> Self {
        Self::new(Duration::from_secs(seconds), distance_meters)
    }
}

/// Pairwise travel costs. `get(i, j)` is the cost from stop `i` to stop `j`.
///
/// Cells may be missing when a provider could not route a pair. The diagonal
/// is always [`TravelCost::ZERO`]. The matrix is not assumed symmetric.
///
/// # Examples
/// ```
/// use itinera_core::{TravelCost, TravelTimeMatrix};
///
/// let matrix = TravelTimeMatrix::uniform(3, TravelCost::FALLBACK);
/// assert_eq!(matrix.get(0, 0), Some(TravelCost::ZERO));
/// assert_eq!(matrix.get(0, 2), Some(TravelCost::FALLBACK));
/// assert_eq!(matrix.get(0, 3), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TravelTimeMatrix {
    size: usize,
    cells: Vec<Option<TravelCost>>,
}

impl TravelTimeMatrix {
    /// Build a matrix from rows, forcing a zero diagonal.
    ///
    /// # Errors
    ///
    /// Returns [`TravelTimeError::DimensionMismatch`] when a row length does
    /// not equal the row count.
    pub fn from_rows(rows: Vec<Vec<Option<TravelCost>>>) -> Result<Self, TravelTimeError> {
        let size = rows.len();
        let mut cells = Vec::with_capacity(size * size);
        for (from, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(TravelTimeError::DimensionMismatch {
                    expected: size,
                    actual: row.len(),
                });
            }
            cells.extend(
                row.into_iter()
                    .enumerate()
                    .map(|(to, cell)| if from == to { Some(TravelCost::ZERO) } else { cell }),
            );
        }
        Ok(Self { size, cells })
    }

    /// Build a matrix where every off-diagonal leg costs `cost`.
    #[must_use]
    pub fn uniform(size: usize, cost: TravelCost) -> Self {
        Self::from_fn(size, |_, _| Some(cost))
    }

    /// Build a matrix from a cell function; the diagonal is always zero.
    pub fn from_fn<F>(size: usize, mut cell: F) -> Self
    where
        F: FnMut(usize, usize) -> Option<TravelCost>,
    {
        let cells = (0..size)
            .flat_map(|from| (0..size).map(move |to| (from, to)))
            .map(|(from, to)| {
                if from == to {
                    Some(TravelCost::ZERO)
                } else {
                    cell(from, to)
                }
            })
            .collect();
        Self { size, cells }
    }

    /// Number of stops covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Whether the matrix covers no stops.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Cost from `from` to `to`; `None` when out of range or unpriced.
    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> Option<TravelCost> {
        if from >= self.size || to >= self.size {
            return None;
        }
        self.cells.get(from * self.size + to).copied().flatten()
    }

    /// Cost from `from` to `to`, or `fallback` when unpriced.
    #[must_use]
    pub fn cost_or(&self, from: usize, to: usize, fallback: TravelCost) -> TravelCost {
        self.get(from, to).unwrap_or(fallback)
    }

    /// Count of off-diagonal cells with no price.
    #[must_use]
    pub fn missing_cells(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    /// Replace every unpriced cell with `fallback`.
    #[must_use]
    pub fn filled(mut self, fallback: TravelCost) -> Self {
        for cell in &mut self.cells {
            if cell.is_none() {
                *cell = Some(fallback);
            }
        }
        self
    }

    /// Whether `get(i, j) == get(j, i)` for every pair.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|from| (from..self.size).all(|to| self.get(from, to) == self.get(to, from)))
    }
}
