use std::collections::{HashSet, VecDeque};

use crate::step::{Step, StepId};

/// Graph structure for traversal and analysis.
#[derive(Debug, Clone)]
pub struct Graph {
  /// step index -> steps it can hand over to.
  successors: Vec<Vec<StepId>>,
}

impl Graph {
  /// Build a graph from locked steps.
  pub fn new(steps: &[Step]) -> Self {
    Self {
      successors: steps.iter().map(Step::successors).collect(),
    }
  }

  pub fn successors(&self, id: StepId) -> &[StepId] {
    self
      .successors
      .get(id.0)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Steps reachable from `start`, including `start`.
  pub fn reachable_from(&self, start: StepId) -> HashSet<StepId> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
      for next in self.successors(current) {
        if seen.insert(*next) {
          queue.push_back(*next);
        }
      }
    }

    seen
  }

  /// Steps that cannot be reached from `start`, in index order.
  pub fn unreachable_from(&self, start: StepId) -> Vec<StepId> {
    let reachable = self.reachable_from(start);
    (0..self.successors.len())
      .map(StepId)
      .filter(|id| !reachable.contains(id))
      .collect()
  }

  /// Steps with no successor.
  pub fn terminal_steps(&self) -> Vec<StepId> {
    self
      .successors
      .iter()
      .enumerate()
      .filter(|(_, out)| out.is_empty())
      .map(|(index, _)| StepId(index))
      .collect()
  }
}
