//! Collective reductions across the processes (or in-process subdomains) sharing a grid.
use std::iter::FromIterator;

/// The collective operations needed by the assemblers.
///
/// Only the objective requires a collective operation: a global sum of per-process partial
/// energies. Implementations must be blocking, i.e. every rank must have contributed before any
/// rank observes the result.
pub trait Communicator: Sync {
    fn num_ranks(&self) -> usize;

    fn rank(&self) -> usize;

    /// Sums `local` over all ranks and returns the total on every rank.
    fn all_reduce_sum(&self, local: f64) -> f64;
}

/// A communicator for a single process that owns the entire grid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn num_ranks(&self) -> usize {
        1
    }

    fn rank(&self) -> usize {
        0
    }

    fn all_reduce_sum(&self, local: f64) -> f64 {
        local
    }
}

/// Compensated (Neumaier) summation.
///
/// The rounding error of each addition is carried separately, so the result does not depend
/// noticeably on how the terms are grouped, e.g. how the grid was partitioned.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }

    /// Combines two partial sums.
    pub fn merge(mut self, other: CompensatedSum) -> Self {
        self.add(other.sum);
        self.compensation += other.compensation;
        self
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

impl Extend<f64> for CompensatedSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x);
        }
    }
}

impl FromIterator<f64> for CompensatedSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = Self::new();
        sum.extend(iter);
        sum
    }
}
