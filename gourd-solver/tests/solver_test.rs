use std::cell::RefCell;
use std::rc::Rc;

use gourd_solver::constraints::Constraint;
use gourd_solver::constraints::LocalId;
use gourd_solver::constraints::PostContext;
use gourd_solver::constraints::SumEquality;
use gourd_solver::model::ModelVisitor;
use gourd_solver::termination::Indefinite;
use gourd_solver::ConstraintOperationError;
use gourd_solver::DemonId;
use gourd_solver::DemonPriority;
use gourd_solver::IntVar;
use gourd_solver::PropagationEngine;
use gourd_solver::PropagationStatus;
use gourd_solver::Solver;

/// A constraint which records which of its demons ran, in order.
struct RecordingConstraint {
    var: IntVar,
    normal_label: &'static str,
    delayed_label: &'static str,
    /// Register the delayed demon before the normal one when set, to vary the enqueue order.
    delayed_first: bool,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Constraint for RecordingConstraint {
    fn name(&self) -> &str {
        "Recording"
    }

    fn post(&mut self, context: &mut PostContext<'_>) {
        if self.delayed_first {
            let delayed = context.register_demon(LocalId::from(1), DemonPriority::Delayed);
            context.when_range(self.var, delayed);
            let normal = context.register_demon(LocalId::from(0), DemonPriority::Normal);
            context.when_range(self.var, normal);
        } else {
            let normal = context.register_demon(LocalId::from(0), DemonPriority::Normal);
            context.when_range(self.var, normal);
            let delayed = context.register_demon(LocalId::from(1), DemonPriority::Delayed);
            context.when_range(self.var, delayed);
        }
    }

    fn initial_propagate(&mut self, _engine: &mut PropagationEngine) -> PropagationStatus {
        Ok(())
    }

    fn run_demon(&mut self, demon: LocalId, _engine: &mut PropagationEngine) -> PropagationStatus {
        self.log.borrow_mut().push(if demon.unpack() == 0 {
            self.normal_label
        } else {
            self.delayed_label
        });
        Ok(())
    }

    fn accept(&self, _visitor: &mut dyn ModelVisitor) {}
}

/// A constraint whose single demon inhibits itself after its first run.
struct SelfInhibitingConstraint {
    var: IntVar,
    demon: Option<DemonId>,
    runs: Rc<RefCell<u32>>,
}

impl Constraint for SelfInhibitingConstraint {
    fn name(&self) -> &str {
        "SelfInhibiting"
    }

    fn post(&mut self, context: &mut PostContext<'_>) {
        let demon = context.register_demon(LocalId::from(0), DemonPriority::Normal);
        context.when_range(self.var, demon);
        self.demon = Some(demon);
    }

    fn initial_propagate(&mut self, _engine: &mut PropagationEngine) -> PropagationStatus {
        Ok(())
    }

    fn run_demon(&mut self, _demon: LocalId, engine: &mut PropagationEngine) -> PropagationStatus {
        *self.runs.borrow_mut() += 1;
        engine.inhibit(self.demon.expect("posted"));
        Ok(())
    }

    fn accept(&self, _visitor: &mut dyn ModelVisitor) {}
}

#[test]
fn normal_demons_run_before_delayed_demons_for_all_enqueue_orders() {
    for delayed_first in [false, true] {
        let mut solver = Solver::default();
        let x = solver.new_bounded_integer(0, 10);
        let log = Rc::new(RefCell::new(Vec::new()));

        let _ = solver
            .add_constraint(RecordingConstraint {
                var: x,
                normal_label: "a-normal",
                delayed_label: "a-delayed",
                delayed_first,
                log: Rc::clone(&log),
            })
            .expect("no propagation yet");
        let _ = solver
            .add_constraint(RecordingConstraint {
                var: x,
                normal_label: "b-normal",
                delayed_label: "b-delayed",
                delayed_first,
                log: Rc::clone(&log),
            })
            .expect("no propagation yet");

        solver.assign(x, 4).expect("assignment is feasible");

        assert_eq!(
            vec!["a-normal", "b-normal", "a-delayed", "b-delayed"],
            *log.borrow(),
            "delayed_first={delayed_first}"
        );
    }
}

#[test]
fn an_inhibited_demon_is_reinstated_by_backtracking() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 10);
    let runs = Rc::new(RefCell::new(0));

    let _ = solver
        .add_constraint(SelfInhibitingConstraint {
            var: x,
            demon: None,
            runs: Rc::clone(&runs),
        })
        .expect("no propagation yet");

    let root = solver.checkpoint();
    let _ = solver.new_checkpoint();

    solver.engine_mut().set_min(x, 1).expect("feasible");
    solver.propagate().expect("no conflict");
    assert_eq!(1, *runs.borrow());

    // The demon is inhibited for the rest of the branch.
    solver.engine_mut().set_min(x, 2).expect("feasible");
    solver.propagate().expect("no conflict");
    assert_eq!(1, *runs.borrow());

    // Backtracking past the inhibit point reinstates it.
    solver.backtrack_to(root);
    solver.engine_mut().set_min(x, 3).expect("feasible");
    solver.propagate().expect("no conflict");
    assert_eq!(2, *runs.borrow());
}

#[test]
fn sum_propagation_tightens_terms_and_assignments_force_the_rest() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 5);
    let y = solver.new_bounded_integer(0, 5);
    let z = solver.new_bounded_integer(0, 5);
    let s = solver.new_bounded_integer(0, 3);

    let _ = solver
        .add_constraint(SumEquality::new(vec![x, y, z], s))
        .expect("satisfiable at the root");

    // One fixpoint tightens each term to [0, 3] from the sum's upper bound.
    for var in [x, y, z] {
        assert_eq!(0, solver.lower_bound(var));
        assert_eq!(3, solver.upper_bound(var));
    }

    // Posting x = 3 forces y and z to 0.
    solver.assign(x, 3).expect("still satisfiable");
    assert_eq!((0, 0), (solver.lower_bound(y), solver.upper_bound(y)));
    assert_eq!((0, 0), (solver.lower_bound(z), solver.upper_bound(z)));
    assert_eq!(3, solver.value(s));
}

#[test]
fn failure_unwinds_to_the_choice_point_like_ordinary_backtracking() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 5);
    let y = solver.new_bounded_integer(0, 5);
    let s = solver.new_bounded_integer(0, 4);

    let _ = solver
        .add_constraint(SumEquality::new(vec![x, y], s))
        .expect("satisfiable at the root");

    let root = solver.checkpoint();
    let _ = solver.new_checkpoint();

    // x = 4 and y = 3 overload the sum.
    solver.assign(x, 4).expect("x alone fits");
    assert!(solver.assign(y, 3).is_err());

    solver.backtrack_to(root);
    assert_eq!((0, 4), (solver.lower_bound(x), solver.upper_bound(x)));
    assert_eq!((0, 4), (solver.lower_bound(y), solver.upper_bound(y)));
}

#[test]
fn an_infeasible_root_poisons_the_solver() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(4, 5);
    let y = solver.new_bounded_integer(4, 5);
    let s = solver.new_bounded_integer(0, 3);

    let result = solver.add_constraint(SumEquality::new(vec![x, y], s));
    assert_eq!(Err(ConstraintOperationError::InfeasibleConstraint), result);

    let z = solver.new_bounded_integer(0, 1);
    let result = solver.add_constraint(SumEquality::new(vec![z], z));
    assert_eq!(Err(ConstraintOperationError::InfeasibleState), result);
}

#[test]
fn depth_first_search_finds_a_solution_respecting_the_sum() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 5);
    let y = solver.new_bounded_integer(0, 5);
    let z = solver.new_bounded_integer(0, 5);
    let s = solver.new_bounded_integer(2, 3);

    let _ = solver
        .add_constraint(SumEquality::new(vec![x, y, z], s))
        .expect("satisfiable at the root");

    let solution = solver.satisfy(&mut Indefinite).expect("satisfiable");
    let sum = solution.value(x) + solution.value(y) + solution.value(z);
    assert_eq!(sum, solution.value(s));
    assert!((2..=3).contains(&sum));
}

/// Replays the visitor callback sequence into a flat trace.
#[derive(Default)]
struct TraceVisitor {
    trace: Vec<String>,
}

impl ModelVisitor for TraceVisitor {
    fn begin_visit_constraint(&mut self, type_name: &str) {
        self.trace.push(format!("begin {type_name}"));
    }

    fn end_visit_constraint(&mut self, type_name: &str) {
        self.trace.push(format!("end {type_name}"));
    }

    fn visit_integer_argument(&mut self, key: &str, value: i64) {
        self.trace.push(format!("int {key}={value}"));
    }

    fn visit_integer_variable_argument(&mut self, key: &str, var: IntVar) {
        self.trace.push(format!("var {key}={}", var.id()));
    }

    fn visit_integer_variable_array_argument(&mut self, key: &str, vars: &[IntVar]) {
        let ids: Vec<String> = vars.iter().map(|v| v.id().to_string()).collect();
        self.trace.push(format!("vars {key}=[{}]", ids.join(",")));
    }
}

#[test]
fn the_visitor_sequence_reconstructs_the_constraint() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 5);
    let y = solver.new_bounded_integer(0, 5);
    let s = solver.new_bounded_integer(0, 9);

    let id = solver
        .add_constraint(SumEquality::new(vec![x, y], s))
        .expect("satisfiable at the root");

    let mut visitor = TraceVisitor::default();
    solver.constraint(id).accept(&mut visitor);

    assert_eq!(
        vec![
            "begin SumEqual".to_owned(),
            format!("vars vars=[{},{}]", x.id(), y.id()),
            format!("var target={}", s.id()),
            "end SumEqual".to_owned(),
        ],
        visitor.trace
    );

    assert_eq!(vec![x, y, s], solver.collect_decision_variables());
    assert!(solver.constraint(id).downcast_ref::<SumEquality>().is_some());
}

/// A precedence over two interval variables: `before` must end before `after` starts.
struct Precedence {
    before: gourd_solver::IntervalVar,
    after: gourd_solver::IntervalVar,
}

impl Constraint for Precedence {
    fn name(&self) -> &str {
        "Precedence"
    }

    fn post(&mut self, context: &mut PostContext<'_>) {
        let demon = context.register_demon(LocalId::from(0), DemonPriority::Normal);
        context.when_interval_changed(self.before, demon);
        context.when_interval_changed(self.after, demon);
    }

    fn initial_propagate(&mut self, engine: &mut PropagationEngine) -> PropagationStatus {
        let earliest_after = engine.domains().end_min(self.before);
        engine
            .domains_mut()
            .set_interval_start_min(self.after, earliest_after)?;
        let latest_before = engine.domains().start_max(self.after);
        engine
            .domains_mut()
            .set_interval_end_max(self.before, latest_before)
    }

    fn accept(&self, _visitor: &mut dyn ModelVisitor) {}
}

#[test]
fn interval_demons_follow_precedence_updates() {
    let mut solver = Solver::default();
    let before = solver.new_interval(0, 10, 3, 3, false);
    let after = solver.new_interval(0, 10, 2, 2, false);

    let _ = solver
        .add_constraint(Precedence { before, after })
        .expect("satisfiable at the root");

    assert_eq!(3, solver.engine().domains().start_min(after));

    // Pushing the first task back re-triggers the precedence demon.
    solver
        .engine_mut()
        .domains_mut()
        .set_interval_start_min(before, 5)
        .expect("feasible");
    solver.propagate().expect("no conflict");
    assert_eq!(8, solver.engine().domains().start_min(after));
}

/// Counts how often a sequence variable's ranking changes.
struct SequenceWatcher {
    sequence: gourd_solver::SequenceVar,
    runs: Rc<RefCell<u32>>,
}

impl Constraint for SequenceWatcher {
    fn name(&self) -> &str {
        "SequenceWatcher"
    }

    fn post(&mut self, context: &mut PostContext<'_>) {
        let demon = context.register_demon(LocalId::from(0), DemonPriority::Normal);
        context.when_sequence_changed(self.sequence, demon);
    }

    fn initial_propagate(&mut self, _engine: &mut PropagationEngine) -> PropagationStatus {
        Ok(())
    }

    fn run_demon(&mut self, _demon: LocalId, _engine: &mut PropagationEngine) -> PropagationStatus {
        *self.runs.borrow_mut() += 1;
        Ok(())
    }

    fn accept(&self, _visitor: &mut dyn ModelVisitor) {}
}

#[test]
fn ranking_a_sequence_schedules_its_watchers() {
    let mut solver = Solver::default();
    let intervals = (0..3).map(|_| solver.new_interval(0, 10, 1, 1, true)).collect();
    let sequence = solver.new_sequence(intervals);
    let runs = Rc::new(RefCell::new(0));

    let _ = solver
        .add_constraint(SequenceWatcher {
            sequence,
            runs: Rc::clone(&runs),
        })
        .expect("no propagation yet");

    solver
        .engine_mut()
        .domains_mut()
        .rank_first(sequence, 1)
        .expect("rankable");
    solver.propagate().expect("no conflict");
    assert_eq!(1, *runs.borrow());

    solver
        .engine_mut()
        .domains_mut()
        .rank_not_first(sequence, 0)
        .expect("a candidate remains");
    solver.propagate().expect("no conflict");
    assert_eq!(2, *runs.borrow());
}

#[test]
fn an_exhausted_decision_budget_aborts_the_search_cleanly() {
    let mut solver = Solver::default();
    let x = solver.new_bounded_integer(0, 5);
    let y = solver.new_bounded_integer(0, 5);
    let s = solver.new_bounded_integer(2, 3);

    let _ = solver
        .add_constraint(SumEquality::new(vec![x, y], s))
        .expect("satisfiable at the root");

    let mut budget = gourd_solver::termination::DecisionBudget::new(0);
    assert!(solver.satisfy(&mut budget).is_none());

    // The abort is clean: the solver is back at the root and a later search succeeds.
    assert_eq!(0, solver.checkpoint());
    assert!(solver.satisfy(&mut Indefinite).is_some());
}
