//! A naive depth-first feasibility search over binary variables.
//!
//! Variables are tried in index order, 0 before 1, and a branch is abandoned
//! as soon as interval bounds show some constraint can no longer be met.
//! This is basically a naive implementation, and hence, rather inefficient;
//! it exists so the encoder can be exercised without an external MIP
//! backend, and any real backend can be dropped in behind [`IlpSolver`].

use log::{debug, trace};

use crate::ilp::{BackendError, Constraint, ConstraintSystem, Feasibility, IlpSolver, Relation};

#[derive(Copy, Clone, Debug, Default)]
pub struct Naive;

impl IlpSolver for Naive {
    fn solve(&mut self, system: &ConstraintSystem) -> Result<Feasibility, BackendError> {
        debug!(
            "-> solve: {} vars, {} constraints",
            system.num_vars(),
            system.constraints().len()
        );
        let mut values = vec![None; system.num_vars()];
        let verdict = if search(system, &mut values, 0) {
            Feasibility::Feasible(values.into_iter().map(|v| v == Some(true)).collect())
        } else {
            Feasibility::Infeasible
        };
        debug!("<- solve: {:?}", verdict);
        Ok(verdict)
    }
}

fn search(system: &ConstraintSystem, values: &mut Vec<Option<bool>>, idx: usize) -> bool {
    if !system.constraints().iter().all(|c| admissible(c, values)) {
        trace!("pruned at depth {}: {:?}", idx, values);
        return false;
    }
    if idx == values.len() {
        return true;
    }
    for value in [false, true] {
        values[idx] = Some(value);
        if search(system, values, idx + 1) {
            return true;
        }
    }
    values[idx] = None;
    false
}

// Whether the constraint can still be satisfied by some completion of the
// partial assignment: sum each unassigned term into whichever bound its
// coefficient's sign moves.
fn admissible(constraint: &Constraint, values: &[Option<bool>]) -> bool {
    let mut lo = 0i64;
    let mut hi = 0i64;
    for &(coeff, var) in &constraint.terms {
        match values[var.index()] {
            Some(true) => {
                lo += coeff;
                hi += coeff;
            }
            Some(false) => {}
            None => {
                if coeff > 0 {
                    hi += coeff;
                } else {
                    lo += coeff;
                }
            }
        }
    }
    match constraint.relation {
        Relation::Le => lo <= constraint.rhs,
        Relation::Ge => hi >= constraint.rhs,
        Relation::Eq => lo <= constraint.rhs && hi >= constraint.rhs,
    }
}
