/*!
This module implements the placement legality check: an ordered, extensible
set of predicates that must all accept a candidate placement.
*/

use std::fmt;

use crate::{Coord, Piece, Shape};

/// Type of underlying predicates at the heart of a [`PlacementRule`].
///
/// Arguments are the candidate pivot, the candidate shape, the obstacle
/// coordinates the placement must avoid (the candidate's own current cells
/// are excluded by the caller), and the field size. Rules are pure: they read
/// their arguments and nothing else.
pub type RuleFn = dyn Fn(Coord, &Shape, &[Coord], Coord) -> bool + Send + Sync;

/// A named predicate that admits or vetoes a candidate placement.
pub struct PlacementRule {
    /// Identifies the rule in diagnostics.
    pub descriptor: String,
    /// The function object consulted for every candidate placement.
    pub rule_fn: Box<RuleFn>,
}

impl PlacementRule {
    /// Wraps a predicate under a descriptor.
    pub fn new(
        descriptor: impl Into<String>,
        rule_fn: impl Fn(Coord, &Shape, &[Coord], Coord) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            rule_fn: Box::new(rule_fn),
        }
    }

    /// Whether this rule accepts the candidate placement.
    pub fn admits(&self, pivot: Coord, shape: &Shape, obstacles: &[Coord], field_size: Coord) -> bool {
        (self.rule_fn)(pivot, shape, obstacles, field_size)
    }
}

impl fmt::Debug for PlacementRule {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("PlacementRule")
            .field("descriptor", &self.descriptor)
            .field("rule_fn", &std::any::type_name_of_val(&self.rule_fn))
            .finish()
    }
}

/// The wall-and-floor rule: every resulting coordinate must satisfy
/// `0 <= x <= width - 1` and `y <= height - 1`.
///
/// There is no lower bound on `y`; pieces may occupy rows above the visible
/// field.
pub fn boundary_rule() -> PlacementRule {
    PlacementRule::new("boundary", |pivot, shape, _obstacles, (width, height)| {
        Piece::project(pivot, shape)
            .iter()
            .all(|&(x, y)| 0 <= x && x <= width - 1 && y <= height - 1)
    })
}

/// The collision rule: no resulting coordinate may coincide with an obstacle.
pub fn overlap_rule() -> PlacementRule {
    PlacementRule::new("overlap", |pivot, shape, obstacles, _field_size| {
        Piece::project(pivot, shape)
            .iter()
            .all(|coordinate| !obstacles.contains(coordinate))
    })
}

/// An ordered, extensible set of [`PlacementRule`]s; a candidate placement is
/// legal iff every rule admits it.
///
/// Order is registration order. It cannot change the verdict, since all rules
/// must pass, but it is preserved so evaluation stays deterministic.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<PlacementRule>,
}

impl RuleSet {
    /// The two standard rules, boundary before overlap.
    pub fn standard() -> Self {
        Self {
            rules: vec![boundary_rule(), overlap_rule()],
        }
    }

    /// Appends a rule behind the ones already registered.
    pub fn register(&mut self, rule: PlacementRule) {
        self.rules.push(rule);
    }

    /// Whether every registered rule accepts the candidate placement.
    pub fn admits(&self, pivot: Coord, shape: &Shape, obstacles: &[Coord], field_size: Coord) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.admits(pivot, shape, obstacles, field_size))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
