use crate::engine::IntVar;
use crate::gourd_assert_simple;
use crate::local_search::VarOperator;
use crate::local_search::VarOperatorCore;

/// No-path marker written into companion path variables of inactive nodes.
pub const NO_PATH: i64 = -1;

/// Behaviour toggles of a [`PathOperator`], passed explicitly instead of living in global state.
#[derive(Debug, Clone, Copy)]
pub struct PathOperatorParams {
    pub number_of_base_nodes: usize,
    /// Skip path combinations proven locally optimal until one of their paths changes.
    pub skip_locally_optimal_paths: bool,
    /// Whether a cursor may rest on a path end node.
    pub accept_path_end_base: bool,
}

impl PathOperatorParams {
    pub fn with_base_nodes(number_of_base_nodes: usize) -> Self {
        PathOperatorParams {
            number_of_base_nodes,
            skip_locally_optimal_paths: true,
            accept_path_end_base: false,
        }
    }
}

/// The move strategy of a [`PathOperator`]: builds one neighbour at the current cursor positions
/// and configures how the cursors iterate.
pub trait PathMove<const IGNORE_PATH_VARS: bool> {
    fn name(&self) -> &str;

    /// Builds one neighbour by mutating the candidate through the core's chain primitives.
    /// Returning `false` rejects the current positions without producing a neighbour.
    fn make_neighbour(&mut self, core: &mut PathCore<IGNORE_PATH_VARS>) -> bool;

    /// Pins cursor `base_index` to the path of cursor `base_index - 1`.
    fn on_same_path_as_previous_base(&self, _base_index: usize) -> bool {
        false
    }

    /// Where a pinned cursor is repositioned when an outer cursor advances.
    fn base_node_restart_position(
        &self,
        core: &PathCore<IGNORE_PATH_VARS>,
        base_index: usize,
    ) -> i64 {
        core.start_node(base_index)
    }

    /// Whether cursor `base_index` also iterates the alternative set of its node.
    fn consider_alternatives(&self, _base_index: usize) -> bool {
        false
    }

    /// Whether cursors return to their path starts on every synchronisation, instead of resuming
    /// from their previous positions.
    fn restart_at_path_start_on_synchronise(&self) -> bool {
        false
    }

    /// An innermost auxiliary iterator (e.g. over inactive nodes), advanced before any cursor
    /// moves. Returns `true` while it has a fresh position.
    fn advance_auxiliary(&mut self, _core: &PathCore<IGNORE_PATH_VARS>) -> bool {
        false
    }

    fn reset_auxiliary(&mut self, _core: &PathCore<IGNORE_PATH_VARS>) {}
}

/// The symmetric path-pair activity matrix behind `skip_locally_optimal_paths`: a pair is
/// deactivated once its neighbourhood has been fully explored, and reactivated whenever either
/// path's structure changes. Quadratic in the number of paths.
#[derive(Debug, Default)]
struct ActivePaths {
    num_paths: usize,
    to_reset: bool,
    active_pairs: Vec<bool>,
}

impl ActivePaths {
    fn initialize(&mut self, num_paths: usize) {
        if num_paths != self.num_paths {
            self.num_paths = num_paths;
            self.to_reset = true;
        }
    }

    fn ensure(&mut self) {
        if self.to_reset {
            self.active_pairs = vec![true; self.num_paths * self.num_paths];
            self.to_reset = false;
        }
    }

    fn is_path_pair_active(&self, p: usize, q: usize) -> bool {
        self.to_reset || self.active_pairs[p * self.num_paths + q]
    }

    fn deactivate_path_pair(&mut self, p: usize, q: usize) {
        self.ensure();
        self.active_pairs[p * self.num_paths + q] = false;
        self.active_pairs[q * self.num_paths + p] = false;
    }

    fn activate_path(&mut self, p: usize) {
        if self.to_reset {
            return;
        }
        for q in 0..self.num_paths {
            self.active_pairs[p * self.num_paths + q] = true;
            self.active_pairs[q * self.num_paths + p] = true;
        }
    }
}

/// The iteration state and chain primitives shared by all path moves.
///
/// Paths are given by "next" variables over nodes `[0, number_of_nexts)`; a value at or beyond
/// `number_of_nexts` is a path end, and an inactive node points at itself. When
/// `IGNORE_PATH_VARS` is false a companion array of path variables (one per node) is tracked and
/// kept consistent by every chain primitive.
#[derive(Debug)]
pub struct PathCore<const IGNORE_PATH_VARS: bool> {
    pub(crate) vars: VarOperatorCore,
    number_of_nexts: usize,
    params: PathOperatorParams,
    same_path_as_previous: Vec<bool>,
    path_basis: Vec<usize>,
    base_nodes: Vec<i64>,
    end_nodes: Vec<i64>,
    base_paths: Vec<usize>,
    base_alternatives: Vec<usize>,
    base_sibling_alternatives: Vec<usize>,
    path_starts: Vec<i64>,
    /// Committed path index per node, or [`NO_PATH`] for inactive nodes.
    node_path: Vec<i64>,
    alternative_sets: Vec<Vec<i64>>,
    /// Alternative-set index per node, or -1.
    alternative_of: Vec<i64>,
    just_started: bool,
    first_start: bool,
    next_base_to_increment: usize,
    active_paths: ActivePaths,
}

impl<const IGNORE_PATH_VARS: bool> PathCore<IGNORE_PATH_VARS> {
    fn new(
        nexts: Vec<IntVar>,
        paths: Vec<IntVar>,
        params: PathOperatorParams,
        same_path_as_previous: Vec<bool>,
    ) -> Self {
        let number_of_nexts = nexts.len();
        if IGNORE_PATH_VARS {
            gourd_assert_simple!(paths.is_empty());
        } else {
            gourd_assert_simple!(paths.len() == number_of_nexts);
        }

        let mut vars = nexts;
        vars.extend(paths);

        let num_base = params.number_of_base_nodes;
        let path_basis = (0..num_base)
            .filter(|&i| i == 0 || !same_path_as_previous[i])
            .collect();

        PathCore {
            vars: VarOperatorCore::with_inversible(vars, number_of_nexts),
            number_of_nexts,
            params,
            same_path_as_previous,
            path_basis,
            base_nodes: vec![0; num_base],
            end_nodes: vec![0; num_base],
            base_paths: vec![0; num_base],
            base_alternatives: vec![0; num_base],
            base_sibling_alternatives: vec![0; num_base],
            path_starts: Vec::new(),
            node_path: vec![NO_PATH; number_of_nexts],
            alternative_sets: Vec::new(),
            alternative_of: vec![-1; number_of_nexts],
            just_started: false,
            first_start: true,
            next_base_to_increment: num_base,
            active_paths: ActivePaths::default(),
        }
    }

    fn set_alternative_sets(&mut self, sets: Vec<Vec<i64>>) {
        self.alternative_of = vec![-1; self.number_of_nexts];
        for (set_index, set) in sets.iter().enumerate() {
            for &node in set {
                gourd_assert_simple!((node as usize) < self.number_of_nexts);
                self.alternative_of[node as usize] = set_index as i64;
            }
        }
        self.alternative_sets = sets;
    }

    pub fn number_of_nexts(&self) -> usize {
        self.number_of_nexts
    }

    pub fn number_of_base_nodes(&self) -> usize {
        self.params.number_of_base_nodes
    }

    pub fn number_of_paths(&self) -> usize {
        self.path_starts.len()
    }

    pub fn base_node(&self, base_index: usize) -> i64 {
        self.base_nodes[base_index]
    }

    /// The alternative sibling currently selected for the cursor's node, or the node itself when
    /// it belongs to no alternative set.
    pub fn base_alternative_node(&self, base_index: usize) -> i64 {
        let node = self.base_nodes[base_index];
        if node < 0 || node as usize >= self.number_of_nexts {
            return node;
        }
        let set = self.alternative_of[node as usize];
        if set < 0 {
            return node;
        }
        self.alternative_sets[set as usize][self.base_alternatives[base_index]]
    }

    pub fn base_sibling_alternative(&self, base_index: usize) -> usize {
        self.base_sibling_alternatives[base_index]
    }

    /// The start node of the path cursor `base_index` is on.
    pub fn start_node(&self, base_index: usize) -> i64 {
        self.path_starts[self.base_paths[base_index]]
    }

    pub fn is_path_end(&self, node: i64) -> bool {
        node >= self.number_of_nexts as i64
    }

    /// The candidate successor of the node.
    pub fn next(&self, node: i64) -> i64 {
        gourd_assert_simple!(node >= 0 && !self.is_path_end(node));
        self.vars.value(node as usize)
    }

    /// The committed successor of the node.
    pub fn old_next(&self, node: i64) -> i64 {
        gourd_assert_simple!(node >= 0 && !self.is_path_end(node));
        self.vars.old_value(node as usize)
    }

    /// The successor of the node at the last synchronisation.
    pub fn prev_next(&self, node: i64) -> i64 {
        gourd_assert_simple!(node >= 0 && !self.is_path_end(node));
        self.vars.prev_value(node as usize)
    }

    /// The candidate predecessor of the node, through the inverse map.
    pub fn prev(&self, node: i64) -> Option<i64> {
        self.vars.index_of_value(node).map(|index| index as i64)
    }

    /// Inactive nodes self-loop in the candidate.
    pub fn is_inactive(&self, node: i64) -> bool {
        !self.is_path_end(node) && self.next(node) == node
    }

    /// Inactive nodes self-loop in the committed state.
    pub fn was_inactive(&self, node: i64) -> bool {
        !self.is_path_end(node) && self.old_next(node) == node
    }

    /// The smallest node index after `start` which is inactive in the committed state.
    pub fn next_inactive_after(&self, start: i64) -> Option<i64> {
        let begin = (start + 1).max(0) as usize;
        (begin..self.number_of_nexts)
            .map(|node| node as i64)
            .find(|&node| self.was_inactive(node))
    }

    /// The candidate path variable of the node; [`NO_PATH`] when path variables are untracked or
    /// the node is a path end.
    pub fn path(&self, node: i64) -> i64 {
        if IGNORE_PATH_VARS || node < 0 || self.is_path_end(node) {
            return NO_PATH;
        }
        self.vars.value(self.number_of_nexts + node as usize)
    }

    /// The committed path index the node is on, or [`NO_PATH`] for inactive nodes.
    pub fn committed_path_of_node(&self, node: i64) -> i64 {
        if node < 0 || self.is_path_end(node) {
            return NO_PATH;
        }
        self.node_path[node as usize]
    }

    /// Relinks `from` to `to`, and records the path of `from` when path variables are tracked.
    pub fn set_next(&mut self, from: i64, to: i64, path: i64) {
        gourd_assert_simple!(from >= 0 && !self.is_path_end(from));
        self.vars.set_value(from as usize, to);
        if !IGNORE_PATH_VARS {
            self.vars.set_value(self.number_of_nexts + from as usize, path);
        }
    }

    /// Guards against cycles: walks the chain after `before_chain` looking for `chain_end`,
    /// bounding the traversal by the number of next variables, and rejects the chain when
    /// `exclude` appears on it. Pass a negative `exclude` to disable that check.
    pub fn check_chain_validity(&self, before_chain: i64, chain_end: i64, exclude: i64) -> bool {
        if before_chain < 0 || self.is_path_end(before_chain) || before_chain == chain_end {
            return false;
        }
        if chain_end == exclude {
            return false;
        }
        let mut current = self.next(before_chain);
        let mut hops = 0;
        while current != chain_end {
            if current == exclude || self.is_path_end(current) || current < 0 {
                return false;
            }
            current = self.next(current);
            hops += 1;
            if hops > self.number_of_nexts {
                return false;
            }
        }
        true
    }

    /// Relocates the closed sub-chain `(before_chain → … → chain_end]` to directly follow
    /// `destination`, preserving the internal chain order. Invalid when the destination lies
    /// inside the chain or the chain is malformed.
    pub fn move_chain(&mut self, before_chain: i64, chain_end: i64, destination: i64) -> bool {
        if destination == before_chain || destination == chain_end {
            return false;
        }
        if destination < 0 || self.is_path_end(destination) || self.is_path_end(chain_end) {
            return false;
        }
        if !self.check_chain_validity(before_chain, chain_end, destination) {
            return false;
        }

        let chain_start = self.next(before_chain);
        let after_chain = self.next(chain_end);
        let before_path = self.path(before_chain);
        let destination_path = self.path(destination);
        let old_destination_next = self.next(destination);

        self.set_next(before_chain, after_chain, before_path);

        let mut position = destination;
        let mut current = chain_start;
        loop {
            let next = self.next(current);
            self.set_next(position, current, destination_path);
            if current == chain_end {
                break;
            }
            position = current;
            current = next;
        }
        self.set_next(chain_end, old_destination_next, destination_path);
        true
    }

    /// Reverses the open sub-chain strictly between `before_chain` and `after_chain`. Returns the
    /// new immediate successor of `before_chain`, or `None` when the chain is empty or invalid.
    pub fn reverse_chain(&mut self, before_chain: i64, after_chain: i64) -> Option<i64> {
        if !self.check_chain_validity(before_chain, after_chain, -1) {
            return None;
        }
        let path = self.path(before_chain);
        let mut current = self.next(before_chain);
        if current == after_chain {
            return None;
        }
        let mut current_next = self.next(current);
        self.set_next(current, after_chain, path);
        while current_next != after_chain {
            let next = self.next(current_next);
            self.set_next(current_next, current, path);
            current = current_next;
            current_next = next;
        }
        self.set_next(before_chain, current, path);
        Some(current)
    }

    /// Swaps two active nodes across or within paths.
    pub fn swap_nodes(&mut self, node1: i64, node2: i64) -> bool {
        if node1 == node2
            || node1 < 0
            || node2 < 0
            || self.is_path_end(node1)
            || self.is_path_end(node2)
            || self.is_inactive(node1)
            || self.is_inactive(node2)
        {
            return false;
        }
        let Some(prev1) = self.prev(node1) else {
            return false;
        };
        let Some(prev2) = self.prev(node2) else {
            return false;
        };

        let path1 = self.path(prev1);
        let path2 = self.path(prev2);
        let next1 = self.next(node1);
        let next2 = self.next(node2);

        if next1 == node2 {
            self.set_next(prev1, node2, path1);
            self.set_next(node2, node1, path1);
            self.set_next(node1, next2, path1);
        } else if next2 == node1 {
            self.set_next(prev2, node1, path2);
            self.set_next(node1, node2, path2);
            self.set_next(node2, next1, path2);
        } else {
            self.set_next(prev1, node2, path1);
            self.set_next(node2, next1, path1);
            self.set_next(prev2, node1, path2);
            self.set_next(node1, next2, path2);
        }
        true
    }

    /// Inserts the inactive node directly after `destination`.
    pub fn make_active(&mut self, node: i64, destination: i64) -> bool {
        if node < 0
            || destination < 0
            || self.is_path_end(node)
            || self.is_path_end(destination)
            || !self.is_inactive(node)
            || self.is_inactive(destination)
        {
            return false;
        }
        let path = self.path(destination);
        let destination_next = self.next(destination);
        self.set_next(destination, node, path);
        self.set_next(node, destination_next, path);
        true
    }

    /// Removes the closed sub-chain `(before_chain → … → chain_end]` from its path; the removed
    /// nodes self-loop.
    pub fn make_chain_inactive(&mut self, before_chain: i64, chain_end: i64) -> bool {
        if self.is_path_end(chain_end) || !self.check_chain_validity(before_chain, chain_end, -1) {
            return false;
        }
        let path = self.path(before_chain);
        let after_chain = self.next(chain_end);

        let mut nodes = Vec::new();
        let mut current = self.next(before_chain);
        loop {
            nodes.push(current);
            if current == chain_end {
                break;
            }
            current = self.next(current);
        }

        self.set_next(before_chain, after_chain, path);
        for node in nodes {
            self.set_next(node, node, NO_PATH);
        }
        true
    }

    /// Replaces the active node by the inactive one in place.
    pub fn swap_active_and_inactive(&mut self, active: i64, inactive: i64) -> bool {
        if active == inactive
            || active < 0
            || self.is_path_end(active)
            || self.is_inactive(active)
            || !self.is_inactive(inactive)
        {
            return false;
        }
        let Some(prev) = self.prev(active) else {
            return false;
        };
        let path = self.path(prev);
        let next = self.next(active);
        self.set_next(prev, inactive, path);
        self.set_next(inactive, next, path);
        self.set_next(active, active, NO_PATH);
        true
    }

    /// Deactivates the closed sub-chain `(before_chain → … → chain_end]` and threads the given
    /// inactive nodes in its place, in order.
    pub fn swap_active_and_inactive_chains(
        &mut self,
        before_chain: i64,
        chain_end: i64,
        inactive: &[i64],
    ) -> bool {
        if !self.make_chain_inactive(before_chain, chain_end) {
            return false;
        }
        let mut destination = before_chain;
        for &node in inactive {
            if !self.make_active(node, destination) {
                return false;
            }
            destination = node;
        }
        true
    }

    fn differs_from_frontier(&self) -> bool {
        self.base_nodes != self.end_nodes
    }

    fn advance_alternative(&mut self, base_index: usize) -> bool {
        let node = self.base_nodes[base_index];
        if node < 0 || node as usize >= self.number_of_nexts {
            return false;
        }
        let set = self.alternative_of[node as usize];
        if set < 0 {
            return false;
        }
        let set_len = self.alternative_sets[set as usize].len();
        if self.base_alternatives[base_index] + 1 < set_len {
            self.base_alternatives[base_index] += 1;
            return true;
        }
        self.base_alternatives[base_index] = 0;
        false
    }

    fn is_current_combination_active(&self) -> bool {
        if self.path_basis.len() == 1 {
            let p = self.base_paths[self.path_basis[0]];
            return self.active_paths.is_path_pair_active(p, p);
        }
        for (i, &a) in self.path_basis.iter().enumerate() {
            for &b in &self.path_basis[i + 1..] {
                if !self
                    .active_paths
                    .is_path_pair_active(self.base_paths[a], self.base_paths[b])
                {
                    return false;
                }
            }
        }
        true
    }

    fn deactivate_current_combination(&mut self) {
        let PathCore {
            path_basis,
            base_paths,
            active_paths,
            ..
        } = self;
        if path_basis.len() == 1 {
            let p = base_paths[path_basis[0]];
            active_paths.deactivate_path_pair(p, p);
            return;
        }
        for (i, &a) in path_basis.iter().enumerate() {
            for &b in &path_basis[i + 1..] {
                active_paths.deactivate_path_pair(base_paths[a], base_paths[b]);
            }
        }
    }

    /// Recomputes path structure from the committed nexts and repositions the cursors, keeping
    /// previous positions where they are still valid.
    fn on_synchronise(&mut self, restart_at_path_start: bool) {
        let n = self.number_of_nexts;

        let mut has_prev = vec![false; n];
        for node in 0..n {
            let next = self.vars.old_value(node);
            if next >= 0 && (next as usize) < n && next != node as i64 {
                has_prev[next as usize] = true;
            }
        }
        self.path_starts = (0..n)
            .filter(|&node| !has_prev[node] && self.vars.old_value(node) != node as i64)
            .map(|node| node as i64)
            .collect();

        // Committed path index per node.
        self.node_path = vec![NO_PATH; n];
        for (path, &start) in self.path_starts.iter().enumerate() {
            let mut current = start;
            let mut hops = 0;
            while !self.is_path_end(current) && hops <= n {
                self.node_path[current as usize] = path as i64;
                current = self.old_next(current);
                hops += 1;
            }
        }

        let num_paths = self.path_starts.len();
        self.active_paths.initialize(num_paths);
        if !self.first_start && self.params.skip_locally_optimal_paths {
            let changed: Vec<usize> = self
                .vars
                .synchronised_changes()
                .iter()
                .copied()
                .filter(|&index| index < n)
                .collect();
            for index in changed {
                let path = self.node_path[index];
                if path != NO_PATH {
                    self.active_paths.activate_path(path as usize);
                }
            }
        }

        if num_paths == 0 {
            self.just_started = true;
            return;
        }

        let num_base = self.params.number_of_base_nodes;
        if self.first_start || restart_at_path_start {
            for i in 0..num_base {
                self.base_paths[i] = if i > 0 && self.same_path_as_previous[i] {
                    self.base_paths[i - 1]
                } else {
                    0
                };
                self.base_nodes[i] = self.path_starts[self.base_paths[i]];
            }
            self.first_start = false;
        } else {
            for i in 0..num_base {
                let node = self.base_nodes[i];
                let path = self.committed_path_of_node(node);
                if path == NO_PATH {
                    self.base_paths[i] = self.base_paths[i].min(num_paths - 1);
                    self.base_nodes[i] = self.path_starts[self.base_paths[i]];
                } else {
                    self.base_paths[i] = path as usize;
                }
            }
            for i in 1..num_base {
                if self.same_path_as_previous[i] && self.base_paths[i] != self.base_paths[i - 1] {
                    self.base_paths[i] = self.base_paths[i - 1];
                    self.base_nodes[i] = self.path_starts[self.base_paths[i]];
                }
            }
        }

        for i in 0..num_base {
            self.base_alternatives[i] = 0;
            self.base_sibling_alternatives[i] = 0;
        }
        self.end_nodes.clone_from(&self.base_nodes);
        self.next_base_to_increment = num_base;
        self.just_started = true;
    }
}

/// A routing-style neighbourhood enumerator: an odometer of base-node cursors over the paths of a
/// synchronised solution, parameterised by a [`PathMove`] strategy.
#[derive(Debug)]
pub struct PathOperator<M, const IGNORE_PATH_VARS: bool> {
    core: PathCore<IGNORE_PATH_VARS>,
    mover: M,
}

impl<M: PathMove<IGNORE_PATH_VARS>, const IGNORE_PATH_VARS: bool>
    PathOperator<M, IGNORE_PATH_VARS>
{
    /// `paths` must be empty when `IGNORE_PATH_VARS`, and parallel to `nexts` otherwise.
    pub fn new(
        nexts: Vec<IntVar>,
        paths: Vec<IntVar>,
        params: PathOperatorParams,
        mover: M,
    ) -> Self {
        let same_path_as_previous = (0..params.number_of_base_nodes)
            .map(|i| i > 0 && mover.on_same_path_as_previous_base(i))
            .collect();
        PathOperator {
            core: PathCore::new(nexts, paths, params, same_path_as_previous),
            mover,
        }
    }

    /// Declares sibling value sets for nodes (e.g. pickup alternatives); cursors with
    /// `consider_alternatives` iterate them as their innermost dimension.
    pub fn with_alternative_sets(mut self, sets: Vec<Vec<i64>>) -> Self {
        self.core.set_alternative_sets(sets);
        self
    }

    fn increment_position(&mut self) -> bool {
        let num_base = self.core.params.number_of_base_nodes;

        if self.core.just_started {
            self.core.just_started = false;
            return !self.core.path_starts.is_empty();
        }
        if self.core.path_starts.is_empty() {
            return false;
        }

        // The move's auxiliary iterator is the innermost dimension.
        if self.mover.advance_auxiliary(&self.core) {
            return true;
        }
        self.mover.reset_auxiliary(&self.core);

        let limit = self.core.next_base_to_increment.min(num_base);
        self.core.next_base_to_increment = num_base;

        // Odometer increment with carry; a cursor which exhausts its path is reset to its
        // restart position. When every cursor wraps, the positions are back at the path starts,
        // which still continues the scan unless the recorded frontier has been reached (the scan
        // may have started mid-path after a resynchronisation).
        let mut advanced_at = None;
        let mut i = limit as isize - 1;
        while i >= 0 {
            let base_index = i as usize;
            if self.advance_cursor(base_index) {
                advanced_at = Some(base_index);
                break;
            }
            i -= 1;
        }

        // Cursors inside the incremented one restart relative to the positions outside it; on a
        // full wrap the outermost cursor has already restarted itself.
        let first_inner = match advanced_at {
            Some(base_index) => base_index + 1,
            None => 1,
        };
        for inner in first_inner..num_base {
            self.reset_cursor(inner);
        }

        if self.core.differs_from_frontier() {
            return true;
        }
        self.advance_paths()
    }

    fn advance_cursor(&mut self, base_index: usize) -> bool {
        if self.mover.consider_alternatives(base_index)
            && self.core.advance_alternative(base_index)
        {
            return true;
        }

        let node = self.core.base_nodes[base_index];
        if !self.core.is_path_end(node) {
            let next = self.core.old_next(node);
            self.core.base_nodes[base_index] = next;
            self.core.base_alternatives[base_index] = 0;
            self.core.base_sibling_alternatives[base_index] = 0;
            if !self.core.is_path_end(next) || self.core.params.accept_path_end_base {
                return true;
            }
        }

        self.reset_cursor(base_index);
        false
    }

    fn reset_cursor(&mut self, base_index: usize) {
        self.core.base_alternatives[base_index] = 0;
        self.core.base_sibling_alternatives[base_index] = 0;
        if base_index > 0 && self.core.same_path_as_previous[base_index] {
            self.core.base_paths[base_index] = self.core.base_paths[base_index - 1];
            let node = self.mover.base_node_restart_position(&self.core, base_index);
            self.core.base_nodes[base_index] = node;
        } else {
            self.core.base_nodes[base_index] = self.core.start_node(base_index);
        }
    }

    /// Advances the cursors to the next combination of paths, skipping combinations marked
    /// locally optimal. Returns `false` when the combination space is exhausted.
    fn advance_paths(&mut self) -> bool {
        let core = &mut self.core;
        let num_paths = core.path_starts.len();
        let num_base = core.params.number_of_base_nodes;
        if num_paths == 0 {
            return false;
        }

        loop {
            if core.params.skip_locally_optimal_paths {
                core.deactivate_current_combination();
            }

            let mut advanced = false;
            for basis_index in (0..core.path_basis.len()).rev() {
                let cursor = core.path_basis[basis_index];
                if core.base_paths[cursor] + 1 < num_paths {
                    core.base_paths[cursor] += 1;
                    for &inner in &core.path_basis[basis_index + 1..] {
                        core.base_paths[inner] = 0;
                    }
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                return false;
            }

            for i in 1..num_base {
                if core.same_path_as_previous[i] {
                    core.base_paths[i] = core.base_paths[i - 1];
                }
            }

            if core.params.skip_locally_optimal_paths && !core.is_current_combination_active() {
                continue;
            }

            for i in 0..num_base {
                core.base_nodes[i] = core.start_node(i);
                core.base_alternatives[i] = 0;
                core.base_sibling_alternatives[i] = 0;
            }
            core.end_nodes.clone_from(&core.base_nodes);
            return true;
        }
    }
}

impl<M: PathMove<IGNORE_PATH_VARS>, const IGNORE_PATH_VARS: bool> VarOperator
    for PathOperator<M, IGNORE_PATH_VARS>
{
    fn name(&self) -> &str {
        self.mover.name()
    }

    fn core(&self) -> &VarOperatorCore {
        &self.core.vars
    }

    fn core_mut(&mut self) -> &mut VarOperatorCore {
        &mut self.core.vars
    }

    fn on_start(&mut self) {
        let restart = self.mover.restart_at_path_start_on_synchronise();
        self.core.on_synchronise(restart);
        self.mover.reset_auxiliary(&self.core);
    }

    fn make_one_neighbour(&mut self) -> bool {
        while self.increment_position() {
            self.core.vars.revert_changes(true, false);
            if self.mover.make_neighbour(&mut self.core) {
                return true;
            }
        }
        false
    }

    fn skip_unchanged(&self, _index: usize) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::StorageKey;
    use crate::local_search::Assignment;
    use crate::local_search::LocalSearchOperator;

    struct NullMove;

    impl<const P: bool> PathMove<P> for NullMove {
        fn name(&self) -> &str {
            "Null"
        }

        fn make_neighbour(&mut self, _core: &mut PathCore<P>) -> bool {
            false
        }
    }

    /// A synchronised operator over one path `0 → 1 → 2 → 3 → 4 → 5` where value 5 is the path
    /// end.
    fn single_path() -> PathOperator<NullMove, true> {
        path_over(&[1, 2, 3, 4, 5])
    }

    fn path_over(nexts: &[i64]) -> PathOperator<NullMove, true> {
        let vars: Vec<crate::engine::IntVar> = (0..nexts.len())
            .map(crate::engine::IntVar::create_from_index)
            .collect();
        let mut assignment = Assignment::default();
        for (var, &next) in vars.iter().zip(nexts) {
            assignment.add(*var, next);
        }
        let mut operator = PathOperator::new(
            vars,
            vec![],
            PathOperatorParams::with_base_nodes(1),
            NullMove,
        );
        operator.start(&assignment);
        operator
    }

    fn nexts_of(core: &PathCore<true>) -> Vec<i64> {
        (0..core.number_of_nexts())
            .map(|node| core.next(node as i64))
            .collect()
    }

    #[test]
    fn move_chain_relinks_and_preserves_the_internal_order() {
        let mut operator = single_path();
        let core = &mut operator.core;

        assert!(core.move_chain(0, 2, 3));

        // The destination's old successor follows the chain end, the before-node's successor is
        // the chain end's old successor, and the chain order 1 → 2 is preserved.
        assert_eq!(vec![3, 2, 4, 1, 5], nexts_of(core));
    }

    #[test]
    fn move_chain_rejects_a_destination_inside_the_chain() {
        let mut operator = single_path();
        let core = &mut operator.core;

        let before = nexts_of(core);
        assert!(!core.move_chain(0, 2, 1));
        assert!(!core.move_chain(0, 2, 2));
        assert_eq!(before, nexts_of(core));
    }

    #[test]
    fn reverse_chain_inverts_exactly_the_open_subchain() {
        let mut operator = single_path();
        let core = &mut operator.core;

        let chain_last = core.reverse_chain(0, 4);
        assert_eq!(Some(3), chain_last);

        // 0 → 3 → 2 → 1 → 4 → 5; node 4 is untouched.
        assert_eq!(vec![3, 4, 1, 2, 5], nexts_of(core));
    }

    #[test]
    fn reversing_an_empty_chain_is_a_no_op() {
        let mut operator = single_path();
        let core = &mut operator.core;

        assert_eq!(None, core.reverse_chain(0, 1));
        assert_eq!(vec![1, 2, 3, 4, 5], nexts_of(core));
    }

    #[test]
    fn chain_validity_bounds_traversal_on_cyclic_state() {
        let mut operator = single_path();
        let core = &mut operator.core;

        // Corrupt the candidate into a cycle 0 → 1 → 2 → 0.
        core.set_next(2, 0, NO_PATH);
        assert!(!core.check_chain_validity(0, 4, -1));
        assert!(!core.move_chain(0, 4, 3));
    }

    #[test]
    fn swap_nodes_handles_adjacent_and_distant_nodes() {
        let mut operator = single_path();
        let core = &mut operator.core;

        assert!(core.swap_nodes(1, 2));
        assert_eq!(vec![2, 3, 1, 4, 5], nexts_of(core));

        let mut operator = single_path();
        let core = &mut operator.core;
        assert!(core.swap_nodes(1, 4));
        assert_eq!(vec![4, 5, 3, 1, 2], nexts_of(core));
    }

    #[test]
    fn inactive_nodes_self_loop_through_chain_deactivation_and_activation() {
        let mut operator = single_path();
        let core = &mut operator.core;

        assert!(core.make_chain_inactive(0, 2));
        assert!(core.is_inactive(1));
        assert!(core.is_inactive(2));
        assert_eq!(vec![3, 1, 2, 4, 5], nexts_of(core));

        assert!(core.make_active(1, 3));
        assert_eq!(vec![3, 4, 2, 1, 5], nexts_of(core));
        assert!(!core.is_inactive(1));
    }

    #[test]
    fn swapping_chains_threads_the_inactive_nodes_in_order() {
        let mut operator = path_over(&[1, 2, 3, 4, 5, 6, 7]);
        let core = &mut operator.core;

        // Deactivate 5 and 6 first so they can be threaded back in.
        assert!(core.make_chain_inactive(4, 6));

        // Replace the chain (0 → .. 2] by the inactive nodes 5, 6.
        assert!(core.swap_active_and_inactive_chains(0, 2, &[5, 6]));
        assert!(core.is_inactive(1));
        assert!(core.is_inactive(2));
        assert_eq!(5, core.next(0));
        assert_eq!(6, core.next(5));
        assert_eq!(3, core.next(6));
    }
}
