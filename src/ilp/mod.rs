//! Reduction from a formula tree to a system of linear constraints over
//! binary decision variables.
//!
//! Every distinct variable name gets one decision variable (however many
//! times it occurs), and every internal node gets a fresh auxiliary variable
//! tied to its operands with an exact, big-M-free encoding of two-valued
//! logic:
//!
//! * `NOT(a)`:      `aux + a = 1`
//! * `OR(v1..vn)`:  `aux >= vi` for each i, `aux <= v1 + .. + vn`
//! * `AND(v1..vn)`: `aux <= vi` for each i, `aux >= v1 + .. + vn - (n - 1)`
//!
//! The root's auxiliary variable is pinned to 1, so the system is feasible
//! exactly when the formula is satisfiable, and any feasible point restricted
//! to the original variables is a satisfying assignment.

use std::collections::BTreeMap;

use log::trace;
use thiserror::Error;

use crate::{Formula, Operand, Operator};

/// A binary decision variable (domain {0, 1}) in a [`ConstraintSystem`].
#[derive(Copy, Clone, Debug, Default, PartialOrd, Ord, PartialEq, Eq)]
pub struct Var(usize);

impl Var {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

/// One linear constraint `sum(coeff * var) REL rhs`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    pub terms: Vec<(i64, Var)>,
    pub relation: Relation,
    pub rhs: i64,
}

impl Constraint {
    pub fn le(terms: Vec<(i64, Var)>, rhs: i64) -> Self {
        Constraint {
            terms,
            relation: Relation::Le,
            rhs,
        }
    }

    pub fn ge(terms: Vec<(i64, Var)>, rhs: i64) -> Self {
        Constraint {
            terms,
            relation: Relation::Ge,
            rhs,
        }
    }

    pub fn eq(terms: Vec<(i64, Var)>, rhs: i64) -> Self {
        Constraint {
            terms,
            relation: Relation::Eq,
            rhs,
        }
    }
}

/// A feasibility problem over binary variables. Built once per encoding,
/// handed to an [`IlpSolver`], then discarded.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSystem {
    num_vars: usize,
    constraints: Vec<Constraint>,
}

impl ConstraintSystem {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn new_var(&mut self) -> Var {
        let var = Var(self.num_vars);
        self.num_vars += 1;
        var
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// The encoder's output: the system, the original-variable map used to
/// decode a model back into an assignment, and the root auxiliary variable.
#[derive(Clone, Debug)]
pub struct Encoding<V> {
    pub system: ConstraintSystem,
    pub vars: BTreeMap<V, Var>,
    pub root: Var,
}

/// Backend verdict: a value per decision variable, or proof there is none.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Feasibility {
    Feasible(Vec<bool>),
    Infeasible,
}

/// A transport or process failure in a backend, distinct from infeasibility.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("ilp backend: {0}")]
pub struct BackendError(pub String);

/// The external solving collaborator. Implementations accept binary
/// variables and linear constraints and report a feasible point or
/// infeasibility; [`crate::branch::Naive`] is the in-tree one.
pub trait IlpSolver {
    fn solve(&mut self, system: &ConstraintSystem) -> Result<Feasibility, BackendError>;
}

struct Encoder<V> {
    system: ConstraintSystem,
    vars: BTreeMap<V, Var>,
}

impl<V: Ord + Clone> Encoder<V> {
    fn var_for(&mut self, name: &V) -> Var {
        if let Some(&var) = self.vars.get(name) {
            return var;
        }
        let var = self.system.new_var();
        self.vars.insert(name.clone(), var);
        var
    }

    fn encode(&mut self, node: &Formula<V>) -> Var {
        let values: Vec<Var> = node
            .operands()
            .iter()
            .map(|operand| match operand {
                Operand::Var(v) => self.var_for(v),
                Operand::Node(f) => self.encode(f),
            })
            .collect();

        let aux = self.system.new_var();
        trace!("encode {:?} -> {:?} over {:?}", node.operator(), aux, values);
        match node.operator() {
            Operator::Not => {
                self.system
                    .push(Constraint::eq(vec![(1, aux), (1, values[0])], 1));
            }
            Operator::Or => {
                for &v in &values {
                    self.system.push(Constraint::ge(vec![(1, aux), (-1, v)], 0));
                }
                let mut terms = vec![(1, aux)];
                terms.extend(values.iter().map(|&v| (-1, v)));
                self.system.push(Constraint::le(terms, 0));
            }
            Operator::And => {
                for &v in &values {
                    self.system.push(Constraint::le(vec![(1, aux), (-1, v)], 0));
                }
                let mut terms = vec![(1, aux)];
                terms.extend(values.iter().map(|&v| (-1, v)));
                self.system.push(Constraint::ge(terms, 1 - values.len() as i64));
            }
        }
        aux
    }
}

impl<V: Ord + Clone> Formula<V> {
    /// Lowers the formula into a constraint system. Total over constructed
    /// formulas; a single post-order traversal, re-entrant, no global state.
    pub fn to_ilp(&self) -> Encoding<V> {
        let mut encoder = Encoder {
            system: ConstraintSystem::new(),
            vars: BTreeMap::new(),
        };
        let root = encoder.encode(self);
        encoder.system.push(Constraint::eq(vec![(1, root)], 1));
        Encoding {
            system: encoder.system,
            vars: encoder.vars,
            root,
        }
    }
}
