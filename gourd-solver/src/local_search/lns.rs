//! Large-neighbourhood-search fragment generation: operators which deactivate a subset of the
//! tracked variables per neighbour, signalling "free for re-optimisation downstream".

use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

use crate::engine::IntVar;
use crate::local_search::VarOperator;
use crate::local_search::VarOperatorCore;

/// Chooses which variable indices form the next fragment. Selection must be deterministic given
/// the synchronised solution and the selector's own state, to keep search reproducible.
pub trait FragmentSelector {
    /// Called once per synchronisation.
    fn init_fragments(&mut self, num_vars: usize);

    /// Appends the indices of the next fragment; returns `false` when no more fragments exist for
    /// this synchronised solution.
    fn next_fragment(&mut self, fragment: &mut Vec<usize>, num_vars: usize) -> bool;
}

/// The LNS operator base: each neighbour deactivates one fragment in the candidate.
#[derive(Debug)]
pub struct BaseLns<S> {
    core: VarOperatorCore,
    selector: S,
    fragment: Vec<usize>,
}

impl<S: FragmentSelector> BaseLns<S> {
    pub fn new(vars: Vec<IntVar>, selector: S) -> Self {
        BaseLns {
            core: VarOperatorCore::new(vars),
            selector,
            fragment: Vec::new(),
        }
    }

    /// The indices freed by the current neighbour.
    pub fn fragment(&self) -> &[usize] {
        &self.fragment
    }
}

impl<S: FragmentSelector> VarOperator for BaseLns<S> {
    fn name(&self) -> &str {
        "Lns"
    }

    fn core(&self) -> &VarOperatorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut VarOperatorCore {
        &mut self.core
    }

    fn on_start(&mut self) {
        self.selector.init_fragments(self.core.size());
    }

    fn make_one_neighbour(&mut self) -> bool {
        self.fragment.clear();
        if !self
            .selector
            .next_fragment(&mut self.fragment, self.core.size())
        {
            return false;
        }
        for &index in &self.fragment {
            self.core.deactivate(index);
        }
        true
    }

    fn has_fragments(&self) -> bool {
        true
    }
}

/// Slides a window of consecutive indices over the variables.
#[derive(Debug)]
pub struct SimpleLns {
    number_of_variables: usize,
    index: usize,
}

impl SimpleLns {
    pub fn new(number_of_variables: usize) -> Self {
        assert!(number_of_variables > 0);
        SimpleLns {
            number_of_variables,
            index: 0,
        }
    }
}

impl FragmentSelector for SimpleLns {
    fn init_fragments(&mut self, _num_vars: usize) {
        self.index = 0;
    }

    fn next_fragment(&mut self, fragment: &mut Vec<usize>, num_vars: usize) -> bool {
        if self.index >= num_vars {
            return false;
        }
        for offset in 0..self.number_of_variables {
            let index = self.index + offset;
            if index < num_vars {
                fragment.push(index);
            }
        }
        self.index += 1;
        true
    }
}

/// Frees a fixed number of variables drawn from a seeded generator; never exhausts by itself, the
/// enumeration is bounded by the caller's termination condition.
#[derive(Debug)]
pub struct RandomLns {
    rng: SmallRng,
    number_of_variables: usize,
}

impl RandomLns {
    pub fn new(number_of_variables: usize, seed: u64) -> Self {
        assert!(number_of_variables > 0);
        RandomLns {
            rng: SmallRng::seed_from_u64(seed),
            number_of_variables,
        }
    }
}

impl FragmentSelector for RandomLns {
    fn init_fragments(&mut self, _num_vars: usize) {}

    fn next_fragment(&mut self, fragment: &mut Vec<usize>, num_vars: usize) -> bool {
        if num_vars == 0 {
            return false;
        }
        for _ in 0..self.number_of_variables {
            fragment.push(self.rng.gen_range(0..num_vars));
        }
        true
    }
}

/// A window-LNS operator over the given variables.
pub fn simple_lns(vars: Vec<IntVar>, number_of_variables: usize) -> BaseLns<SimpleLns> {
    BaseLns::new(vars, SimpleLns::new(number_of_variables))
}

/// A seeded random-fragment LNS operator over the given variables.
pub fn random_lns(vars: Vec<IntVar>, number_of_variables: usize, seed: u64) -> BaseLns<RandomLns> {
    BaseLns::new(vars, RandomLns::new(number_of_variables, seed))
}
