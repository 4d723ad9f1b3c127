//! Lazy filtered iteration.

use crate::core::PlayerId;

use super::{AcceptAll, PieceFilter, PropertySource, Visible};

/// A forward-only, single-pass sequence of pieces that pass a filter.
///
/// `has_next` may be called any number of times without consuming
/// anything: the first call pulls source items until one matches and
/// holds it until `next_piece` hands it out.
pub struct PieceIter<'a, P: ?Sized, I, F> {
    source: I,
    filter: F,
    pending: Option<&'a P>,
}

impl<'a, P, I> PieceIter<'a, P, I, AcceptAll>
where
    P: ?Sized,
    I: Iterator<Item = &'a P>,
{
    /// Iterate over every piece in `source`.
    pub fn all(source: I) -> Self {
        Self::new(source, AcceptAll)
    }
}

impl<'a, P, I> PieceIter<'a, P, I, Visible>
where
    P: PropertySource + ?Sized,
    I: Iterator<Item = &'a P>,
{
    /// Iterate over pieces `observer` can see.
    pub fn visible(source: I, observer: PlayerId) -> Self {
        Self::new(source, Visible::to(observer))
    }
}

impl<'a, P, I, F> PieceIter<'a, P, I, F>
where
    P: ?Sized,
    I: Iterator<Item = &'a P>,
    F: PieceFilter<P>,
{
    /// Iterate over pieces in `source` accepted by `filter`.
    pub fn new(source: I, filter: F) -> Self {
        Self {
            source,
            filter,
            pending: None,
        }
    }

    /// Is there another matching piece?
    ///
    /// Idempotent: repeated calls without `next_piece` don't skip anything.
    pub fn has_next(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        for piece in self.source.by_ref() {
            if self.filter.accept(piece) {
                self.pending = Some(piece);
                return true;
            }
        }
        false
    }

    /// Take the next matching piece, or `None` when exhausted.
    pub fn next_piece(&mut self) -> Option<&'a P> {
        if self.has_next() {
            self.pending.take()
        } else {
            None
        }
    }
}

impl<'a, P, I, F> Iterator for PieceIter<'a, P, I, F>
where
    P: ?Sized,
    I: Iterator<Item = &'a P>,
    F: PieceFilter<P>,
{
    type Item = &'a P;

    fn next(&mut self) -> Option<&'a P> {
        self.next_piece()
    }
}
