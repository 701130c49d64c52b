//! The classic path neighbourhoods, expressed as [`PathMove`] strategies. Each factory picks the
//! compile-time instantiation from whether companion path variables are supplied.

use crate::engine::IntVar;
use crate::local_search::path::PathCore;
use crate::local_search::path::PathMove;
use crate::local_search::path::PathOperator;
use crate::local_search::path::PathOperatorParams;
use crate::local_search::LocalSearchOperator;

fn make_path_operator<M>(
    nexts: Vec<IntVar>,
    paths: Vec<IntVar>,
    params: PathOperatorParams,
    mover: M,
) -> Box<dyn LocalSearchOperator>
where
    M: PathMove<true> + PathMove<false> + 'static,
{
    if paths.is_empty() {
        Box::new(PathOperator::<M, true>::new(nexts, paths, params, mover))
    } else {
        Box::new(PathOperator::<M, false>::new(nexts, paths, params, mover))
    }
}

/// Reverses a sub-chain of one path: the classic 2-opt move.
#[derive(Debug, Default)]
pub struct TwoOptMove;

impl<const P: bool> PathMove<P> for TwoOptMove {
    fn name(&self) -> &str {
        "TwoOpt"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let before = core.base_node(0);
        let last = core.base_node(1);
        if before == last || core.is_path_end(before) || core.is_path_end(last) {
            return false;
        }
        let after = core.next(last);
        core.reverse_chain(before, after).is_some()
    }

    fn on_same_path_as_previous_base(&self, base_index: usize) -> bool {
        base_index == 1
    }

    fn base_node_restart_position(&self, core: &PathCore<P>, _base_index: usize) -> i64 {
        core.base_node(0)
    }
}

pub fn two_opt(nexts: Vec<IntVar>, paths: Vec<IntVar>) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(2),
        TwoOptMove,
    )
}

/// Moves a fixed-length chain after another node, possibly on another path.
#[derive(Debug)]
pub struct RelocateMove {
    chain_length: usize,
}

impl<const P: bool> PathMove<P> for RelocateMove {
    fn name(&self) -> &str {
        "Relocate"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let before_chain = core.base_node(0);
        let destination = core.base_node(1);
        if core.is_path_end(before_chain) || core.is_path_end(destination) {
            return false;
        }
        let mut chain_end = before_chain;
        for _ in 0..self.chain_length {
            chain_end = core.next(chain_end);
            if core.is_path_end(chain_end) {
                return false;
            }
        }
        core.move_chain(before_chain, chain_end, destination)
    }
}

pub fn relocate(
    nexts: Vec<IntVar>,
    paths: Vec<IntVar>,
    chain_length: usize,
) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(2),
        RelocateMove { chain_length },
    )
}

/// Swaps the successors of the two base nodes.
#[derive(Debug, Default)]
pub struct ExchangeMove;

impl<const P: bool> PathMove<P> for ExchangeMove {
    fn name(&self) -> &str {
        "Exchange"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let base0 = core.base_node(0);
        let base1 = core.base_node(1);
        if core.is_path_end(base0) || core.is_path_end(base1) {
            return false;
        }
        let node0 = core.next(base0);
        let node1 = core.next(base1);
        if core.is_path_end(node0) || core.is_path_end(node1) {
            return false;
        }
        core.swap_nodes(node0, node1)
    }
}

pub fn exchange(nexts: Vec<IntVar>, paths: Vec<IntVar>) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(2),
        ExchangeMove,
    )
}

/// Exchanges the tails of two different paths.
#[derive(Debug, Default)]
pub struct CrossMove;

impl<const P: bool> PathMove<P> for CrossMove {
    fn name(&self) -> &str {
        "Cross"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let base0 = core.base_node(0);
        let base1 = core.base_node(1);
        if core.is_path_end(base0) || core.is_path_end(base1) {
            return false;
        }
        if core.start_node(0) == core.start_node(1) {
            return false;
        }
        let tail0 = core.next(base0);
        let tail1 = core.next(base1);
        if core.is_path_end(tail0) && core.is_path_end(tail1) {
            return false;
        }

        let path0 = core.path(base0);
        let path1 = core.path(base1);
        core.set_next(base0, tail1, path0);
        core.set_next(base1, tail0, path1);

        // The moved tails change paths; rewrite their path variables.
        let mut node = tail1;
        while !core.is_path_end(node) {
            let next = core.next(node);
            core.set_next(node, next, path0);
            node = next;
        }
        let mut node = tail0;
        while !core.is_path_end(node) {
            let next = core.next(node);
            core.set_next(node, next, path1);
            node = next;
        }
        true
    }
}

pub fn cross(nexts: Vec<IntVar>, paths: Vec<IntVar>) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(2),
        CrossMove,
    )
}

/// Inserts an inactive node after the base node; the inactive nodes are iterated as the innermost
/// dimension.
#[derive(Debug, Default)]
pub struct MakeActiveMove {
    inactive: Option<i64>,
}

impl<const P: bool> PathMove<P> for MakeActiveMove {
    fn name(&self) -> &str {
        "MakeActive"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let Some(node) = self.inactive else {
            return false;
        };
        let destination = core.base_node(0);
        if core.is_path_end(destination) {
            return false;
        }
        core.make_active(node, destination)
    }

    fn advance_auxiliary(&mut self, core: &PathCore<P>) -> bool {
        let start = self.inactive.unwrap_or(-1);
        match core.next_inactive_after(start) {
            Some(node) => {
                self.inactive = Some(node);
                true
            }
            None => false,
        }
    }

    fn reset_auxiliary(&mut self, _core: &PathCore<P>) {
        self.inactive = None;
    }
}

pub fn make_active(nexts: Vec<IntVar>, paths: Vec<IntVar>) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(1),
        MakeActiveMove::default(),
    )
}

/// Deactivates the chain between the two base nodes; the freed nodes self-loop.
#[derive(Debug, Default)]
pub struct MakeChainInactiveMove;

impl<const P: bool> PathMove<P> for MakeChainInactiveMove {
    fn name(&self) -> &str {
        "MakeChainInactive"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let before_chain = core.base_node(0);
        let chain_end = core.base_node(1);
        if core.is_path_end(before_chain) || core.is_path_end(chain_end) {
            return false;
        }
        core.make_chain_inactive(before_chain, chain_end)
    }

    fn on_same_path_as_previous_base(&self, base_index: usize) -> bool {
        base_index == 1
    }

    fn base_node_restart_position(&self, core: &PathCore<P>, _base_index: usize) -> i64 {
        core.base_node(0)
    }
}

pub fn make_chain_inactive(
    nexts: Vec<IntVar>,
    paths: Vec<IntVar>,
) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(2),
        MakeChainInactiveMove,
    )
}

/// Replaces the successor of the base node by an inactive node.
#[derive(Debug, Default)]
pub struct SwapActiveMove {
    inactive: Option<i64>,
}

impl<const P: bool> PathMove<P> for SwapActiveMove {
    fn name(&self) -> &str {
        "SwapActive"
    }

    fn make_neighbour(&mut self, core: &mut PathCore<P>) -> bool {
        let Some(inactive) = self.inactive else {
            return false;
        };
        let base = core.base_node(0);
        if core.is_path_end(base) {
            return false;
        }
        let active = core.next(base);
        if core.is_path_end(active) {
            return false;
        }
        core.swap_active_and_inactive(active, inactive)
    }

    fn advance_auxiliary(&mut self, core: &PathCore<P>) -> bool {
        let start = self.inactive.unwrap_or(-1);
        match core.next_inactive_after(start) {
            Some(node) => {
                self.inactive = Some(node);
                true
            }
            None => false,
        }
    }

    fn reset_auxiliary(&mut self, _core: &PathCore<P>) {
        self.inactive = None;
    }
}

pub fn swap_active(nexts: Vec<IntVar>, paths: Vec<IntVar>) -> Box<dyn LocalSearchOperator> {
    make_path_operator(
        nexts,
        paths,
        PathOperatorParams::with_base_nodes(1),
        SwapActiveMove::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;
    use crate::local_search::Assignment;

    /// Two paths over six nodes: `0 → 1 → 2 → 6` and `3 → 4 → 5 → 7`; values 6 and 7 are path
    /// ends.
    fn two_paths() -> (Vec<IntVar>, Assignment) {
        let vars: Vec<IntVar> = (0..6).map(IntVar::create_from_index).collect();
        let mut assignment = Assignment::default();
        let nexts = [1, 2, 6, 4, 5, 7];
        for (var, &next) in vars.iter().zip(nexts.iter()) {
            assignment.add(*var, next);
        }
        (vars, assignment)
    }

    /// The same two paths with companion path variables (ids 6..11).
    fn two_paths_with_path_vars() -> (Vec<IntVar>, Vec<IntVar>, Assignment) {
        let (nexts, mut assignment) = two_paths();
        let paths: Vec<IntVar> = (6..12).map(IntVar::create_from_index).collect();
        let path_of = [0, 0, 0, 1, 1, 1];
        for (var, &path) in paths.iter().zip(path_of.iter()) {
            assignment.add(*var, path);
        }
        (nexts, paths, assignment)
    }

    fn drain(operator: &mut dyn LocalSearchOperator, assignment: &Assignment) -> Vec<Assignment> {
        operator.start(assignment);
        let mut neighbours = Vec::new();
        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();
        while operator.make_next_neighbour(&mut delta, &mut deltadelta) {
            neighbours.push(delta.clone());
            assert!(
                neighbours.len() <= 1000,
                "neighbourhood enumeration does not terminate"
            );
        }
        neighbours
    }

    #[test]
    fn two_opt_enumerates_the_expected_reversals_and_terminates() {
        let (vars, assignment) = two_paths();
        let mut operator = two_opt(vars.clone(), vec![]);

        let neighbours = drain(operator.as_mut(), &assignment);

        // On a three-node directed path only the reversal of the last two nodes changes
        // anything, so each path contributes exactly one neighbour.
        assert_eq!(2, neighbours.len());

        let first = &neighbours[0];
        assert_eq!(2, first.value(vars[0]));
        assert_eq!(6, first.value(vars[1]));
        assert_eq!(1, first.value(vars[2]));

        let second = &neighbours[1];
        assert_eq!(5, second.value(vars[3]));
        assert_eq!(7, second.value(vars[4]));
        assert_eq!(4, second.value(vars[5]));
    }

    #[test]
    fn two_opt_deltas_only_contain_changed_variables() {
        let (vars, assignment) = two_paths();
        let mut operator = two_opt(vars.clone(), vec![]);

        for delta in drain(operator.as_mut(), &assignment) {
            for element in delta.iter() {
                assert_ne!(
                    element.value,
                    assignment.value(element.var),
                    "spurious unchanged entry in the delta"
                );
            }
        }
    }

    #[test]
    fn relocate_moves_a_node_across_paths_and_updates_path_variables() {
        let (nexts, paths, assignment) = two_paths_with_path_vars();
        let mut operator = relocate(nexts.clone(), paths.clone(), 1);
        operator.start(&assignment);

        let mut delta = Assignment::default();
        let mut deltadelta = Assignment::default();

        // Find a neighbour which moves node 1 (the successor of node 0) after node 3.
        let mut found = false;
        while operator.make_next_neighbour(&mut delta, &mut deltadelta) {
            if delta.contains(nexts[0]) && delta.value(nexts[0]) == 2 && delta.contains(nexts[3]) {
                found = true;
                break;
            }
        }
        assert!(found, "expected the move relocating node 1 after node 3");

        assert_eq!(1, delta.value(nexts[3]));
        assert_eq!(4, delta.value(nexts[1]));
        assert_eq!(1, delta.value(paths[1]), "node 1 must take its new path id");
    }

    #[test]
    fn exchange_swaps_successors_between_paths() {
        let (vars, assignment) = two_paths();
        let mut operator = exchange(vars.clone(), vec![]);

        let neighbours = drain(operator.as_mut(), &assignment);
        assert!(!neighbours.is_empty());

        // Every exchange neighbour keeps the committed solution's node set.
        let moved = neighbours
            .iter()
            .any(|delta| delta.contains(vars[0]) && delta.value(vars[0]) == 4);
        assert!(moved, "expected a neighbour swapping nodes 1 and 4");
    }

    #[test]
    fn cross_exchanges_path_tails() {
        let (vars, assignment) = two_paths();
        let mut operator = cross(vars.clone(), vec![]);

        let neighbours = drain(operator.as_mut(), &assignment);
        let tail_swap = neighbours
            .iter()
            .any(|delta| {
                delta.contains(vars[0])
                    && delta.value(vars[0]) == 4
                    && delta.contains(vars[3])
                    && delta.value(vars[3]) == 1
            });
        assert!(tail_swap, "expected the tails after 0 and 3 to be swapped");
    }

    #[test]
    fn make_active_inserts_an_inactive_node_everywhere() {
        let (vars, mut assignment) = two_paths();
        // Node 2 becomes inactive: 0 → 1 → 6 and 2 self-loops.
        assignment.set_value(vars[1], 6);
        assignment.set_value(vars[2], 2);

        let mut operator = make_active(vars.clone(), vec![]);
        let neighbours = drain(operator.as_mut(), &assignment);

        // Node 2 can be inserted after each of the five active nodes.
        assert_eq!(5, neighbours.len());
        for delta in &neighbours {
            assert!(delta.contains(vars[2]));
            assert_ne!(2, delta.value(vars[2]), "node 2 must stop self-looping");
        }
    }

    #[test]
    fn swap_active_replaces_an_active_node() {
        let (vars, mut assignment) = two_paths();
        assignment.set_value(vars[1], 6);
        assignment.set_value(vars[2], 2);

        let mut operator = swap_active(vars.clone(), vec![]);
        let neighbours = drain(operator.as_mut(), &assignment);

        let replacement = neighbours.iter().any(|delta| {
            delta.contains(vars[0]) && delta.value(vars[0]) == 2 && delta.value(vars[1]) == 1
        });
        assert!(replacement, "expected node 2 to replace node 1 after node 0");
    }

    #[test]
    fn make_chain_inactive_frees_chain_nodes() {
        let (vars, assignment) = two_paths();
        let mut operator = make_chain_inactive(vars.clone(), vec![]);

        let neighbours = drain(operator.as_mut(), &assignment);
        let single = neighbours.iter().any(|delta| {
            delta.contains(vars[1]) && delta.value(vars[1]) == 1 && delta.value(vars[0]) == 2
        });
        assert!(single, "expected the removal of node 1 alone");
    }
}
