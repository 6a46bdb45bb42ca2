use std::collections::BTreeMap;

use maplit::btreemap;
use quickcheck::{Arbitrary, Gen};
use satilp::branch::Naive;
use satilp::ilp::{BackendError, ConstraintSystem, Feasibility, IlpSolver};
use satilp::{Error, Formula, Operand, Operator};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn single_variable_is_forced_true() {
    init();
    let f = Formula::or_all(vec![Operand::Var("a")]).unwrap();
    let solution = f.solve_with(&mut Naive).unwrap();
    assert_eq!(solution, btreemap! {"a" => true});
}

#[test]
fn negated_variable_is_forced_false() {
    init();
    let f = Formula::not("a");
    let solution = f.solve_with(&mut Naive).unwrap();
    assert_eq!(solution, btreemap! {"a" => false});
}

#[test]
fn conjunction_forces_both_true() {
    init();
    let f = Formula::and("a", "b");
    let solution = f.solve_with(&mut Naive).unwrap();
    assert_eq!(solution, btreemap! {"a" => true, "b" => true});
}

#[test]
fn disjunction_finds_some_witness() {
    init();
    let f = Formula::or("a", "b");
    let solution = f.solve_with(&mut Naive).unwrap();
    assert!(solution.values().any(|&v| v));
    assert_eq!(f.eval(&solution), Ok(true));
}

#[test]
fn nested_and_or_finds_some_witness() {
    init();
    let f = Formula::or(Formula::and("a", "b"), "c");
    let solution = f.solve_with(&mut Naive).unwrap();
    assert_eq!(f.eval(&solution), Ok(true));
}

#[test]
fn complex_nested_expression() {
    init();
    // !((a & b) | !c) forces c and rules out a & b.
    let f: Formula<&str> = Formula::not(Formula::or(Formula::and("a", "b"), Formula::not("c")));
    let solution = f.solve_with(&mut Naive).unwrap();
    assert!(!(solution["a"] && solution["b"]));
    assert!(solution["c"]);
    assert_eq!(f.eval(&solution), Ok(true));
}

#[test]
fn contradiction_is_unsatisfiable() {
    init();
    let f = Formula::and("a", Formula::not("a"));
    assert_eq!(f.solve_with(&mut Naive), Err(Error::Unsatisfiable));
}

struct OfflineBackend;

impl IlpSolver for OfflineBackend {
    fn solve(&mut self, _system: &ConstraintSystem) -> Result<Feasibility, BackendError> {
        Err(BackendError("backend offline".into()))
    }
}

#[test]
fn backend_failure_is_not_unsatisfiable() {
    init();
    let f = Formula::and("a", "b");
    assert_eq!(
        f.solve_with(&mut OfflineBackend),
        Err(Error::Backend(BackendError("backend offline".into())))
    );
}

// Formulas over variables 0..4, so an exhaustive truth-table check over 16
// environments stays cheap.
#[derive(Clone, Debug)]
struct SmallFormula(Formula<u8>);

fn arbitrary_formula(g: &mut Gen, depth: usize) -> Formula<u8> {
    let operator = *g
        .choose(&[Operator::And, Operator::Or, Operator::Not])
        .unwrap();
    let arity = if operator == Operator::Not { 1 } else { 2 };
    let operands = (0..arity)
        .map(|_| {
            if depth == 0 || bool::arbitrary(g) {
                Operand::Var(u8::arbitrary(g) % 4)
            } else {
                Operand::Node(arbitrary_formula(g, depth - 1))
            }
        })
        .collect();
    Formula::new(operator, operands).unwrap()
}

impl Arbitrary for SmallFormula {
    fn arbitrary(g: &mut Gen) -> Self {
        SmallFormula(arbitrary_formula(g, 3))
    }
}

fn all_envs() -> impl Iterator<Item = BTreeMap<u8, bool>> {
    (0..16u8).map(|bits| (0..4).map(|v| (v, bits & (1 << v) != 0)).collect())
}

fn roundtrip_prop(f: SmallFormula) -> bool {
    let SmallFormula(f) = f;
    match f.solve_with(&mut Naive) {
        // Soundness: a returned assignment must actually satisfy f.
        Ok(solution) => f.eval(&solution) == Ok(true),
        // Completeness: an unsat verdict means no environment satisfies f.
        Err(Error::Unsatisfiable) => all_envs().all(|env| f.eval(&env) == Ok(false)),
        Err(_) => false,
    }
}

#[test]
fn roundtrip_soundness_and_completeness() {
    init();
    quickcheck::quickcheck(roundtrip_prop as fn(SmallFormula) -> bool);
}

fn satisfiable_formulas_solve_prop(f: SmallFormula, bits: u8) -> bool {
    let SmallFormula(f) = f;
    let env: BTreeMap<u8, bool> = (0..4).map(|v| (v, bits & (1 << v) != 0)).collect();
    if f.eval(&env) != Ok(true) {
        return true;
    }
    f.solve_with(&mut Naive).is_ok()
}

#[test]
fn satisfiable_formulas_solve() {
    init();
    quickcheck::quickcheck(satisfiable_formulas_solve_prop as fn(SmallFormula, u8) -> bool);
}
