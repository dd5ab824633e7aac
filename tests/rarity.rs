mod common;

use catchbot::models::item::{Rarity, RarityWeights};
use catchbot::services::pick_from;
use common::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;

const SAMPLES: usize = 100_000;

#[tokio::test]
async fn tier_frequencies_follow_the_weights() {
    let h = harness(game_settings());
    add_item(&h.registry, "Pen Pen", Rarity::Common).await;
    add_item(&h.registry, "Misato", Rarity::Common).await;
    add_item(&h.registry, "Rei", Rarity::Rare).await;
    add_item(&h.registry, "Asuka", Rarity::Epic).await;
    add_item(&h.registry, "Kaworu", Rarity::Legendary).await;
    let items = h.registry.services.catalog.all().await.unwrap();

    let weights = RarityWeights::default();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut counts: HashMap<Rarity, usize> = HashMap::new();
    for _ in 0..SAMPLES {
        let item = pick_from(&items, &weights, &mut rng).unwrap();
        *counts.entry(item.rarity).or_default() += 1;
    }

    for rarity in Rarity::ALL {
        let expected = weights.weight(rarity) as f64 / weights.total() as f64;
        let observed = counts.get(&rarity).copied().unwrap_or(0) as f64 / SAMPLES as f64;
        assert!(
            (observed - expected).abs() <= 0.02,
            "{rarity}: expected {expected:.3}, observed {observed:.3}"
        );
    }
}

#[tokio::test]
async fn items_within_a_tier_are_uniform() {
    let h = harness(game_settings());
    add_item(&h.registry, "Pen Pen", Rarity::Common).await;
    add_item(&h.registry, "Misato", Rarity::Common).await;
    let items = h.registry.services.catalog.all().await.unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let pen_pen = (0..10_000)
        .filter(|_| pick_from(&items, &RarityWeights::default(), &mut rng).unwrap().name == "Pen Pen")
        .count();
    assert!((4_500..=5_500).contains(&pen_pen), "Pen Pen drawn {pen_pen} times");
}

#[tokio::test]
async fn pick_weighted_on_empty_catalog_fails() {
    let h = harness(game_settings());
    let err = h.registry.services.catalog.pick_weighted().await.unwrap_err();
    assert!(matches!(err, catchbot::error::DomainError::EmptyCatalog));
}
