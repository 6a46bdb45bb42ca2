//! Propositional formulas as owned trees, with two independent readings of
//! the same tree: direct boolean evaluation against an [`Assignment`], and a
//! reduction to a 0/1 integer-linear-program whose feasible points are
//! exactly the satisfying assignments (see [`ilp`]).

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use log::debug;
use thiserror::Error;

pub mod branch;
pub mod ilp;

use ilp::{BackendError, Feasibility, IlpSolver};

/// A truth-value binding for each variable, keyed by variable name.
pub type Assignment<V> = BTreeMap<V, bool>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error<V: fmt::Debug> {
    #[error("malformed formula: {0}")]
    MalformedFormula(&'static str),
    #[error("unbound variable: {0:?}")]
    UnboundVariable(V),
    #[error("no satisfying assignment")]
    Unsatisfiable,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Copy, Clone, Debug, PartialOrd, Ord, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    Not,
}

/// One position under a [`Formula`] node: either a variable name or a
/// nested subformula. Each operand is exclusively owned by its parent.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub enum Operand<V> {
    Var(V),
    Node(Formula<V>),
}

/// An operator applied to a non-empty operand list. `Not` has exactly one
/// operand; both invariants are enforced at construction and the fields are
/// immutable afterwards.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq)]
pub struct Formula<V> {
    operator: Operator,
    operands: Vec<Operand<V>>,
}

impl<V> From<V> for Operand<V> {
    fn from(var: V) -> Self {
        Operand::Var(var)
    }
}

impl<V> From<Formula<V>> for Operand<V> {
    fn from(node: Formula<V>) -> Self {
        Operand::Node(node)
    }
}

impl<V> Formula<V> {
    /// Checked construction. Rejects an empty operand list, and `Not`
    /// applied to anything but a single operand.
    pub fn new(operator: Operator, operands: Vec<Operand<V>>) -> Result<Self, Error<V>>
    where
        V: fmt::Debug,
    {
        if operands.is_empty() {
            return Err(Error::MalformedFormula("operand list is empty"));
        }
        if operator == Operator::Not && operands.len() != 1 {
            return Err(Error::MalformedFormula("NOT takes exactly one operand"));
        }
        Ok(Formula { operator, operands })
    }

    pub fn not(operand: impl Into<Operand<V>>) -> Self {
        Formula {
            operator: Operator::Not,
            operands: vec![operand.into()],
        }
    }

    pub fn and(left: impl Into<Operand<V>>, right: impl Into<Operand<V>>) -> Self {
        Formula {
            operator: Operator::And,
            operands: vec![left.into(), right.into()],
        }
    }

    pub fn or(left: impl Into<Operand<V>>, right: impl Into<Operand<V>>) -> Self {
        Formula {
            operator: Operator::Or,
            operands: vec![left.into(), right.into()],
        }
    }

    /// N-ary conjunction; empty input is malformed.
    pub fn and_all(operands: Vec<Operand<V>>) -> Result<Self, Error<V>>
    where
        V: fmt::Debug,
    {
        Self::new(Operator::And, operands)
    }

    /// N-ary disjunction; empty input is malformed.
    pub fn or_all(operands: Vec<Operand<V>>) -> Result<Self, Error<V>>
    where
        V: fmt::Debug,
    {
        Self::new(Operator::Or, operands)
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> &[Operand<V>] {
        &self.operands
    }
}

impl<V: Ord + Clone + fmt::Debug> Formula<V> {
    /// Evaluates the tree under `env`. A variable absent from `env` is an
    /// error; no default value is substituted.
    pub fn eval(&self, env: &Assignment<V>) -> Result<bool, Error<V>> {
        let mut values = Vec::with_capacity(self.operands.len());
        for operand in &self.operands {
            values.push(match operand {
                Operand::Var(v) => *env.get(v).ok_or_else(|| Error::UnboundVariable(v.clone()))?,
                Operand::Node(f) => f.eval(env)?,
            });
        }
        Ok(match self.operator {
            Operator::Not => !values[0],
            Operator::And => values.iter().all(|&v| v),
            Operator::Or => values.iter().any(|&v| v),
        })
    }

    /// Encodes the formula, hands the system to `solver`, and decodes the
    /// model back into an [`Assignment`] over the formula's own variables
    /// (auxiliary subformula variables are not exposed). Infeasibility maps
    /// to [`Error::Unsatisfiable`]; backend failures surface unchanged.
    pub fn solve_with<S: IlpSolver>(&self, solver: &mut S) -> Result<Assignment<V>, Error<V>> {
        let encoding = self.to_ilp();
        debug!(
            "solving: {} vars ({} original), {} constraints",
            encoding.system.num_vars(),
            encoding.vars.len(),
            encoding.system.constraints().len()
        );
        match solver.solve(&encoding.system)? {
            Feasibility::Feasible(model) => Ok(encoding
                .vars
                .iter()
                .map(|(name, var)| (name.clone(), model[var.index()]))
                .collect()),
            Feasibility::Infeasible => Err(Error::Unsatisfiable),
        }
    }
}

impl<V> BitAnd for Formula<V> {
    type Output = Self;
    fn bitand(self, other: Self) -> Self {
        Formula::and(self, other)
    }
}

impl<V> BitOr for Formula<V> {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        Formula::or(self, other)
    }
}

impl<V> Not for Formula<V> {
    type Output = Self;
    fn not(self) -> Self {
        Formula {
            operator: Operator::Not,
            operands: vec![Operand::Node(self)],
        }
    }
}

impl<V: fmt::Display> fmt::Display for Operand<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Var(v) => write!(f, "{}", v),
            Operand::Node(n) => write!(f, "{}", n),
        }
    }
}

impl<V: fmt::Display> fmt::Display for Formula<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.operator {
            Operator::Not => write!(f, "!{}", self.operands[0]),
            Operator::And | Operator::Or => {
                let sep = if self.operator == Operator::And {
                    " & "
                } else {
                    " | "
                };
                write!(f, "(")?;
                for (i, operand) in self.operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", operand)?;
                }
                write!(f, ")")
            }
        }
    }
}
