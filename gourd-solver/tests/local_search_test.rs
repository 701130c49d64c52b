use gourd_solver::constraints::LinearLessOrEqual;
use gourd_solver::local_search::increment_value;
use gourd_solver::local_search::random_lns;
use gourd_solver::local_search::two_opt;
use gourd_solver::local_search::Assignment;
use gourd_solver::local_search::LocalSearchFilterManager;
use gourd_solver::local_search::LocalSearchOperator;
use gourd_solver::local_search::LocalSearchRunner;
use gourd_solver::local_search::SumObjectiveFilter;
use gourd_solver::termination::Indefinite;
use gourd_solver::termination::NeighbourBudget;
use gourd_solver::IntVar;
use gourd_solver::Solver;

#[test]
fn hill_climbing_improves_an_initial_solution_to_the_bound() {
    let mut solver = Solver::default();
    let vars: Vec<IntVar> = (0..3).map(|_| solver.new_bounded_integer(0, 10)).collect();
    let _ = solver
        .add_constraint(LinearLessOrEqual::new(vars.clone(), 7))
        .expect("satisfiable at the root");

    // Depth-first search yields the all-minimum solution.
    let mut solution = solver.satisfy(&mut Indefinite).expect("satisfiable");
    assert!(vars.iter().all(|&var| solution.value(var) == 0));

    // Climb by unit increments while the total stays within the linear bound.
    let mut operator = increment_value(vars.clone());
    let mut filters = LocalSearchFilterManager::new(vec![Box::new(
        SumObjectiveFilter::unweighted(vars.clone()),
    )]);

    let runner = LocalSearchRunner::new(0, 7);
    let stats = runner.improve(
        &mut operator,
        &mut filters,
        &mut solution,
        &mut Indefinite,
    );

    assert_eq!(7, stats.neighbours_accepted);
    let total: i64 = vars.iter().map(|&var| solution.value(var)).sum();
    assert_eq!(7, total);
}

/// Walks every path of a routing assignment and checks that the next pointers form disjoint
/// simple paths with self-looping inactive nodes.
fn assert_well_formed_paths(assignment: &Assignment, nexts: &[IntVar]) {
    let n = nexts.len() as i64;
    let mut visited = vec![false; nexts.len()];

    let mut has_prev = vec![false; nexts.len()];
    for &var in nexts {
        let next = assignment.value(var);
        if next >= 0 && next < n && next != var.id() as i64 {
            assert!(!has_prev[next as usize], "two nodes share a successor");
            has_prev[next as usize] = true;
        }
    }

    for start in 0..nexts.len() {
        let self_loop = assignment.value(nexts[start]) == start as i64;
        if has_prev[start] || self_loop {
            continue;
        }
        let mut node = start as i64;
        let mut hops = 0;
        while node < n {
            assert!(!visited[node as usize], "node visited twice");
            visited[node as usize] = true;
            node = assignment.value(nexts[node as usize]);
            hops += 1;
            assert!(hops <= nexts.len(), "cycle in the next pointers");
        }
    }

    for (node, &var) in nexts.iter().enumerate() {
        let self_loop = assignment.value(var) == node as i64;
        assert!(
            visited[node] || self_loop,
            "active node {node} is unreachable from every path start"
        );
    }
}

#[test]
fn accepted_two_opt_moves_keep_the_paths_well_formed() {
    let mut solver = Solver::default();
    let nexts: Vec<IntVar> = (0..6).map(|_| solver.new_bounded_integer(0, 7)).collect();

    let mut assignment = Assignment::default();
    for (var, next) in nexts.iter().zip([1, 2, 6, 4, 5, 7]) {
        assignment.add(*var, next);
    }

    let mut operator = two_opt(nexts.clone(), vec![]);
    // No filters: every neighbour is accepted until the budget triggers.
    let mut filters = LocalSearchFilterManager::new(vec![]);

    let runner = LocalSearchRunner::new(i64::MIN, i64::MAX);
    let mut budget = NeighbourBudget::new(5);
    let stats = runner.improve(&mut *operator, &mut filters, &mut assignment, &mut budget);

    assert!(stats.neighbours_considered <= 5);
    assert_well_formed_paths(&assignment, &nexts);
}

#[test]
fn lns_fragments_are_deactivated_for_downstream_repair() {
    let vars: Vec<IntVar> = {
        let mut solver = Solver::default();
        (0..6).map(|_| solver.new_bounded_integer(0, 9)).collect()
    };

    let mut assignment = Assignment::default();
    for (i, &var) in vars.iter().enumerate() {
        assignment.add(var, i as i64);
    }

    let mut operator = random_lns(vars.clone(), 2, 7);
    operator.start(&assignment);

    let mut delta = Assignment::default();
    let mut deltadelta = Assignment::default();

    assert!(operator.has_fragments());
    for _ in 0..4 {
        assert!(operator.make_next_neighbour(&mut delta, &mut deltadelta));
        assert!(!delta.is_empty());
        for element in delta.iter() {
            assert!(!element.active, "fragments must deactivate their variables");
            // The values themselves are untouched; a downstream repair heuristic fills them.
            assert_eq!(assignment.value(element.var), element.value);
        }
    }
}
