//! Match predicates and filtered iteration over pieces.
//!
//! Traits whose effect depends on other pieces ("everything of type X
//! within range") and session-wide operations ("send this key to every
//! matching piece") enumerate pieces through this module, so visibility
//! rules are applied the same way everywhere.
//!
//! ## Key Components
//!
//! - [`PropertySource`]: anything that answers property lookups
//! - [`PieceFilter`]: a stateless boolean predicate over a piece
//! - [`Visible`]: the default "not hidden from this observer" filter
//! - [`PieceIter`]: lazy, single-pass, filtered iteration
//! - [`PropertyExpression`]: textual predicates (`Type = Tank && Level > 2`)
//!
//! ## Example
//!
//! ```
//! use rust_tabletop::core::{EntityId, Location};
//! use rust_tabletop::filter::{PieceIter, PropertyExpression};
//! use rust_tabletop::traits::Piece;
//!
//! let pieces: Vec<Piece> = (0..4u64)
//!     .map(|i| {
//!         Piece::basic(EntityId(i), "Unit", Location::new("board", i as i32, 0))
//!             .with_property("Strength", i as i64)
//!     })
//!     .collect();
//!
//! let strong = PropertyExpression::parse("Strength >= 2").unwrap();
//! let ids: Vec<u64> = PieceIter::new(pieces.iter(), strong)
//!     .map(|p| p.id().raw())
//!     .collect();
//! assert_eq!(ids, vec![2, 3]);
//! ```

mod expression;
mod iterator;

pub use expression::{ExpressionError, PropertyExpression, MAX_NESTING};
pub use iterator::PieceIter;

use crate::core::property::names;
use crate::core::{PlayerId, PropertyValue};

/// Something that answers property lookups.
pub trait PropertySource {
    /// Look up a property without any observer restrictions.
    fn property(&self, name: &str) -> Option<PropertyValue>;

    /// Look up a property as seen by `observer`.
    fn property_as(&self, name: &str, observer: PlayerId) -> Option<PropertyValue>;
}

/// A boolean predicate over a piece.
///
/// Filters are stateless: accepting the same piece twice gives the same
/// answer.
pub trait PieceFilter<P: ?Sized> {
    /// Does `piece` pass the filter?
    fn accept(&self, piece: &P) -> bool;
}

impl<P: ?Sized, F> PieceFilter<P> for F
where
    F: Fn(&P) -> bool,
{
    fn accept(&self, piece: &P) -> bool {
        self(piece)
    }
}

/// Accepts everything. Used when no predicate is given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl<P: ?Sized> PieceFilter<P> for AcceptAll {
    fn accept(&self, _piece: &P) -> bool {
        true
    }
}

/// Rejects pieces that are invisible to `observer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visible {
    pub observer: PlayerId,
}

impl Visible {
    /// Create a visibility filter for `observer`.
    #[must_use]
    pub const fn to(observer: PlayerId) -> Self {
        Self { observer }
    }
}

impl<P: PropertySource + ?Sized> PieceFilter<P> for Visible {
    fn accept(&self, piece: &P) -> bool {
        !piece
            .property_as(names::INVISIBLE_TO_ME, self.observer)
            .is_some_and(|v| v.is_truthy())
    }
}

/// Accepts pieces that pass both filters.
#[derive(Clone, Debug)]
pub struct Both<A, B>(pub A, pub B);

impl<P: ?Sized, A: PieceFilter<P>, B: PieceFilter<P>> PieceFilter<P> for Both<A, B> {
    fn accept(&self, piece: &P) -> bool {
        self.0.accept(piece) && self.1.accept(piece)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        hidden_from: Option<PlayerId>,
        kind: &'static str,
    }

    impl PropertySource for Sample {
        fn property(&self, name: &str) -> Option<PropertyValue> {
            (name == "Type").then(|| self.kind.into())
        }

        fn property_as(&self, name: &str, observer: PlayerId) -> Option<PropertyValue> {
            if name == names::INVISIBLE_TO_ME {
                return Some((self.hidden_from == Some(observer)).into());
            }
            self.property(name)
        }
    }

    #[test]
    fn test_visible_filter() {
        let shown = Sample { hidden_from: None, kind: "A" };
        let hidden = Sample { hidden_from: Some(PlayerId::new(1)), kind: "A" };

        let viewer = Visible::to(PlayerId::new(1));
        assert!(viewer.accept(&shown));
        assert!(!viewer.accept(&hidden));
        assert!(Visible::to(PlayerId::new(0)).accept(&hidden));
    }

    #[test]
    fn test_closure_and_combinators() {
        let a = Sample { hidden_from: None, kind: "A" };
        let b = Sample { hidden_from: None, kind: "B" };

        let is_a = |p: &Sample| p.kind == "A";
        assert!(is_a.accept(&a));
        assert!(!is_a.accept(&b));

        let both = Both(is_a, Visible::to(PlayerId::new(0)));
        assert!(both.accept(&a));
        assert!(AcceptAll.accept(&b));
    }
}
