// operon/src/core/signature.rs

//! Component signatures: how many positional params a component consumes and
//! whether it accepts the keyed context.
//!
//! Signatures drive the params-distribution algebra: Parallel and Split slice
//! the input params by child arity, Fanout and Either fold arities with max,
//! and Chain adopts the signature of its first param-consuming child.

use std::fmt;

/// Number of positional params a component consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  /// Consumes exactly this many params (extras are truncated away).
  Fixed(usize),
  /// Consumes all remaining params.
  Unbounded,
}

impl Arity {
  /// How many of `available` params this arity takes from a distribution.
  pub fn take(&self, available: usize) -> usize {
    match self {
      Arity::Fixed(n) => (*n).min(available),
      Arity::Unbounded => available,
    }
  }

  /// Arity addition, saturating to `Unbounded`. Used by Parallel/Split.
  pub fn sum(self, other: Arity) -> Arity {
    match (self, other) {
      (Arity::Fixed(a), Arity::Fixed(b)) => Arity::Fixed(a + b),
      _ => Arity::Unbounded,
    }
  }

  /// Arity maximum, saturating to `Unbounded`. Used by Either.
  pub fn max(self, other: Arity) -> Arity {
    match (self, other) {
      (Arity::Fixed(a), Arity::Fixed(b)) => Arity::Fixed(a.max(b)),
      _ => Arity::Unbounded,
    }
  }
}

impl fmt::Display for Arity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Arity::Fixed(n) => write!(f, "{}", n),
      Arity::Unbounded => write!(f, "*"),
    }
  }
}

/// A component's calling convention: `(arity, accepts_context)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
  pub arity: Arity,
  pub accepts_context: bool,
}

impl Signature {
  pub const fn new(arity: Arity, accepts_context: bool) -> Self {
    Self {
      arity,
      accepts_context,
    }
  }

  /// `(n, accepts_context)` with a fixed arity.
  pub const fn fixed(arity: usize, accepts_context: bool) -> Self {
    Self::new(Arity::Fixed(arity), accepts_context)
  }

  /// `(0, true)`: consumes no params, reads the context.
  pub const fn context_only() -> Self {
    Self::fixed(0, true)
  }

  /// `(*, true)`: consumes all remaining params.
  pub const fn unbounded() -> Self {
    Self::new(Arity::Unbounded, true)
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({}, {})", self.arity, self.accepts_context)
  }
}
