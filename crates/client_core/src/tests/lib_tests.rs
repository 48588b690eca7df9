use super::*;
use storage::{seed_if_empty, Storage};

#[tokio::test]
async fn load_deck_returns_store_cards_in_name_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    seed_if_empty(&storage).await.expect("seed");

    let deck = load_deck(&storage).await.expect("deck");
    assert_eq!(deck.len(), 78);
    assert!(deck
        .windows(2)
        .all(|pair| pair[0].name <= pair[1].name));
}

#[tokio::test]
async fn seeded_deck_supports_every_spread() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    seed_if_empty(&storage).await.expect("seed");
    let deck = load_deck(&storage).await.expect("deck");

    for kind in shared::spread::SpreadKind::ALL {
        let spread = draw_spread(&deck, &kind.layout()).expect("draw");
        assert_eq!(spread.cards.len(), kind.positions().len());
    }
}
