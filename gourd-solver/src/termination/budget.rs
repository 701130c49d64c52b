use super::TerminationCondition;

/// Stops the search after a fixed number of decisions.
#[derive(Debug, Copy, Clone)]
pub struct DecisionBudget {
    budget: u64,
    num_decisions: u64,
}

impl DecisionBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            num_decisions: 0,
        }
    }
}

impl TerminationCondition for DecisionBudget {
    fn should_stop(&mut self) -> bool {
        self.num_decisions >= self.budget
    }

    fn decision_has_been_made(&mut self) {
        self.num_decisions += 1;
    }
}

/// Stops a local-search run after a fixed number of considered neighbours.
#[derive(Debug, Copy, Clone)]
pub struct NeighbourBudget {
    budget: u64,
    num_neighbours: u64,
}

impl NeighbourBudget {
    pub fn new(budget: u64) -> Self {
        Self {
            budget,
            num_neighbours: 0,
        }
    }
}

impl TerminationCondition for NeighbourBudget {
    fn should_stop(&mut self) -> bool {
        self.num_neighbours >= self.budget
    }

    fn neighbour_has_been_considered(&mut self) {
        self.num_neighbours += 1;
    }
}
