//! Filtered iteration over real game state.

use rust_tabletop::core::{EntityId, GameState, Location, PlayerId};
use rust_tabletop::filter::{Both, PieceIter, PropertyExpression, Visible};
use rust_tabletop::traits::{AreaOfEffect, Hideable, Piece};

fn board(pieces: Vec<Piece>) -> GameState {
    let mut state = GameState::new();
    for piece in pieces {
        state.insert_piece(piece, None).unwrap();
    }
    state
}

fn unit(id: u64, x: i32, y: i32) -> Piece {
    Piece::basic(EntityId(id), format!("u{}", id), Location::new("board", x, y))
        .with_property("Index", id as i64)
}

/// Ten pieces, filter on even index: exactly five come out, in order.
#[test]
fn test_even_pieces_in_order() {
    let state = board((0..10).map(|i| unit(i, 0, 0)).collect());
    let even = |p: &Piece| p.property("Index").and_then(|v| v.as_int()).is_some_and(|i| i % 2 == 0);

    let mut iter = PieceIter::new(state.pieces(), even);
    let mut seen = Vec::new();
    while iter.has_next() {
        assert!(iter.has_next());
        seen.push(iter.next_piece().unwrap().id().raw());
    }
    assert_eq!(seen, vec![0, 2, 4, 6, 8]);
    assert!(!iter.has_next());
    assert!(iter.next_piece().is_none());
}

/// Hidden pieces drop out for everyone but the hider.
#[test]
fn test_visibility_combines_with_expressions() {
    let hider = PlayerId::new(1);
    let state = board(vec![
        unit(0, 0, 0).with_property("Type", "Tank"),
        unit(1, 0, 0)
            .with_property("Type", "Tank")
            .decorate(Hideable::new(None).hidden_by(hider)),
        unit(2, 0, 0).with_property("Type", "Infantry"),
    ]);
    let tanks = PropertyExpression::parse("Type = Tank").unwrap();

    let ids = |observer: PlayerId| -> Vec<u64> {
        PieceIter::new(state.pieces(), Both(Visible::to(observer), tanks.clone()))
            .map(|p| p.id().raw())
            .collect()
    };
    assert_eq!(ids(PlayerId::new(0)), vec![0]);
    assert_eq!(ids(hider), vec![0, 1]);
}

/// An area reaches pieces within its radius in the same zone only.
#[test]
fn test_area_of_effect_reach() {
    let center = unit(0, 5, 5).decorate(AreaOfEffect::new(2).with_filter("Index > 1").unwrap());
    let state = board(vec![
        center.clone(),
        unit(1, 5, 6),
        unit(2, 6, 6),
        unit(3, 7, 7),
        unit(4, 5, 7),
        unit(5, 5, 5).with_location(Location::new("reserve", 5, 5)),
        unit(6, 4, 5).decorate(Hideable::new(None).hidden_by(PlayerId::new(3))),
    ]);
    let area = center.find_trait::<AreaOfEffect>().unwrap();

    let reached: Vec<u64> = area
        .affected(&center, &state, PlayerId::new(0))
        .iter()
        .map(|p| p.id().raw())
        .collect();
    // 1 fails the filter, 3 is out of range, 5 is elsewhere, 6 is hidden.
    assert_eq!(reached, vec![2, 4]);

    let for_hider: Vec<u64> = area
        .affected(&center, &state, PlayerId::new(3))
        .iter()
        .map(|p| p.id().raw())
        .collect();
    assert_eq!(for_hider, vec![2, 4, 6]);
}
