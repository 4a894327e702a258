//! Even distribution of operations across a batch.

use drill_common::{DrillError, Operation};
use rand::Rng;

/// Hands out operations so that use counts never differ by more than one
#[derive(Debug, Clone)]
pub struct OperationSchedule {
    operations: Vec<Operation>,
    counts: Vec<usize>,
}

impl OperationSchedule {
    pub fn new(operations: Vec<Operation>) -> Result<Self, DrillError> {
        if operations.is_empty() {
            return Err(DrillError::InvalidOperation(
                "no operations selected".to_string(),
            ));
        }
        let counts = vec![0; operations.len()];
        Ok(Self { operations, counts })
    }

    /// Pick uniformly among the least-used operations
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Operation {
        let least = self.counts.iter().copied().min().unwrap_or(0);
        let candidates: Vec<usize> = self
            .counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == least)
            .map(|(idx, _)| idx)
            .collect();

        let idx = candidates[rng.random_range(0..candidates.len())];
        self.counts[idx] += 1;
        self.operations[idx]
    }

    /// Current use count per operation
    pub fn counts(&self) -> impl Iterator<Item = (Operation, usize)> + '_ {
        self.operations.iter().copied().zip(self.counts.iter().copied())
    }
}
