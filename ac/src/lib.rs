//! Access-control tree secret sharing (spec §4.5): `AND` / `OR` /
//! `THRESHOLD` gates over party identifiers, with plain and
//! in-the-exponent reconstruction, Lagrange interpolation, and
//! active-quorum additive re-expression.

pub mod lagrange;
pub mod tree;

pub use tree::{share, AcError, Node, Shares};
