//! Workload partition planning.
//!
//! Splits `total` items into rounds of `workers` items each, where the last
//! round carries the remainder. Nothing here spawns anything; callers own
//! execution and use the plan to decide how many items each round claims.
//!
//! ```
//! use sieve_audit::partition::plan;
//!
//! let plan = plan(10, 3).unwrap();
//! assert_eq!(plan.iterations(), 4);
//! assert_eq!(plan.assignments().collect::<Vec<_>>(), vec![3, 3, 3, 1]);
//! ```

use std::ops::Range;

use sieve_core::{Result, SieveError};

/// Precomputed split of `total` items over `workers` concurrent consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadPlan {
    total: usize,
    workers: usize,
    iterations: usize,
}

/// Plan how `total` items are split across `workers`.
///
/// `iterations = ceil(total / workers)`; zero items gives zero iterations.
pub fn plan(total: usize, workers: usize) -> Result<WorkloadPlan> {
    check_workers(workers)?;
    Ok(WorkloadPlan {
        total,
        workers,
        iterations: total.div_ceil(workers),
    })
}

/// [`plan`] over the length of a collection.
pub fn plan_for<T>(items: &[T], workers: usize) -> Result<WorkloadPlan> {
    plan(items.len(), workers)
}

/// Number of items claimed in round `current` of `iterations`.
///
/// Every round claims `workers` items except the last, which claims
/// `total % workers` when that is non-zero.
pub fn assigned_count(
    current: usize,
    iterations: usize,
    total: usize,
    workers: usize,
) -> Result<usize> {
    check_workers(workers)?;
    if current >= iterations {
        return Err(SieveError::InvalidArgument(format!(
            "iteration {} out of range 0..{}",
            current, iterations
        )));
    }
    let remainder = total % workers;
    if current == iterations - 1 && remainder != 0 {
        Ok(remainder)
    } else {
        Ok(workers)
    }
}

fn check_workers(workers: usize) -> Result<()> {
    if workers == 0 {
        return Err(SieveError::InvalidArgument(
            "number of workers must be > 0".to_string(),
        ));
    }
    Ok(())
}

impl WorkloadPlan {
    /// Total items.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items per full round.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of rounds.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Items claimed in round `current`, or `None` past the last round.
    #[must_use]
    pub fn assigned(&self, current: usize) -> Option<usize> {
        assigned_count(current, self.iterations, self.total, self.workers).ok()
    }

    /// Items claimed by each round, in order.
    pub fn assignments(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.iterations).filter_map(move |i| self.assigned(i))
    }

    /// Index ranges into the dataset, one per round.
    pub fn chunks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.assignments().scan(0usize, |start, count| {
            let range = *start..*start + count;
            *start += count;
            Some(range)
        })
    }
}
