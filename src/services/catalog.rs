use crate::config::SettingsHandle;
use crate::db::error::DbError;
use crate::db::repo::CatalogRepo;
use crate::error::{AppResult, DomainError};
use crate::models::item::{Item, NewItem, Rarity, RarityWeights};
use crate::models::types::ItemId;
use crate::util::retry::RetryPolicy;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use std::sync::Arc;

/// Words at least this long tolerate one typo when guessing.
const FUZZY_MIN_LEN: usize = 6;

pub struct CatalogService {
    repo: Arc<dyn CatalogRepo>,
    settings: SettingsHandle,
    retry: RetryPolicy,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepo>, settings: SettingsHandle, retry: RetryPolicy) -> Self {
        Self { repo, settings, retry }
    }

    pub async fn all(&self) -> AppResult<Vec<Item>> {
        let items = self.retry.run("catalog.all", || self.repo.all()).await?;
        Ok(items)
    }

    pub async fn get(&self, item_id: ItemId) -> AppResult<Item> {
        self.retry
            .run("catalog.get", || self.repo.get(item_id))
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("item {item_id}")))
    }

    pub async fn count(&self) -> AppResult<i64> {
        Ok(self.retry.run("catalog.count", || self.repo.count()).await?)
    }

    /// Loads the catalog and draws one item using the configured rarity weights.
    pub async fn pick_weighted(&self) -> AppResult<Item> {
        let items = self.all().await?;
        let weights = self.settings.snapshot().rarity_weights;
        let item = pick_from(&items, &weights, &mut rand::rng())?;
        Ok(item.clone())
    }

    /// Catalog item matching `text`, if any.
    pub async fn find_by_name(&self, text: &str) -> AppResult<Option<Item>> {
        let items = self.all().await?;
        Ok(resolve_by_name(text, &items).cloned())
    }

    pub async fn upload(&self, new_item: NewItem) -> AppResult<Item> {
        new_item.validate()?;
        let item = new_item.into_item();
        let (name, series) = (item.name.clone(), item.series.clone());

        match self.repo.insert(item).await {
            Ok(item) => {
                tracing::info!(item = %item.id, name = %item.name, rarity = %item.rarity, "catalog item added");
                Ok(item)
            }
            Err(DbError::UniqueViolation) => Err(DomainError::Duplicate(format!("{name} ({series})"))),
            Err(e) => Err(e.into()),
        }
    }
}

/// Picks a tier by weight among the tiers that have items, then an item
/// uniformly inside that tier.
pub fn pick_from<'a, R: Rng>(items: &'a [Item], weights: &RarityWeights, rng: &mut R) -> AppResult<&'a Item> {
    if items.is_empty() {
        return Err(DomainError::EmptyCatalog);
    }

    let tiers: Vec<(Rarity, Vec<&Item>)> = Rarity::ALL
        .iter()
        .map(|r| (*r, items.iter().filter(|i| i.rarity == *r).collect::<Vec<_>>()))
        .filter(|(_, members)| !members.is_empty())
        .collect();

    let tier_weights: Vec<u32> = tiers.iter().map(|(r, _)| weights.weight(*r)).collect();
    if tier_weights.iter().all(|w| *w == 0) {
        return Ok(&items[rng.random_range(0..items.len())]);
    }

    let dist = WeightedIndex::new(&tier_weights)
        .map_err(|e| DomainError::InternalError(format!("rarity weights: {e}")))?;
    let (_, members) = &tiers[dist.sample(rng)];
    Ok(members[rng.random_range(0..members.len())])
}

/// Lowercase, punctuation to spaces, collapsed whitespace.
pub fn normalize_name(s: &str) -> String {
    let mapped: String = s
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First candidate whose name matches `text`. Tried in order: the full name,
/// any single word of the name, then the same with one typo allowed for
/// longer words.
pub fn resolve_by_name<'a>(text: &str, candidates: &'a [Item]) -> Option<&'a Item> {
    let guess = normalize_name(text);
    if guess.is_empty() {
        return None;
    }

    let names: Vec<String> = candidates.iter().map(|c| normalize_name(&c.name)).collect();

    if let Some(idx) = names.iter().position(|n| *n == guess) {
        return Some(&candidates[idx]);
    }

    if let Some(idx) = names.iter().position(|n| n.split(' ').any(|w| w == guess)) {
        return Some(&candidates[idx]);
    }

    if guess.chars().count() < FUZZY_MIN_LEN {
        return None;
    }
    names
        .iter()
        .position(|n| {
            close_enough(n, &guess) || n.split(' ').any(|w| w.chars().count() >= FUZZY_MIN_LEN && close_enough(w, &guess))
        })
        .map(|idx| &candidates[idx])
}

fn close_enough(a: &str, b: &str) -> bool {
    edit_distance(a, b) <= 1
}

/// Levenshtein distance over chars
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > 1 {
        return 2;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn item(name: &str, rarity: Rarity) -> Item {
        NewItem {
            name: name.into(),
            series: "Evangelion".into(),
            rarity,
            media: "file-id".into(),
        }
        .into_item()
    }

    #[test]
    fn normalizes_case_and_punctuation() {
        assert_eq!(normalize_name("  Asuka   LANGLEY!! "), "asuka langley");
        assert_eq!(normalize_name("Soryu-Asuka"), "soryu asuka");
        assert_eq!(normalize_name("..."), "");
    }

    #[test]
    fn matches_full_name_and_single_words() {
        let items = vec![item("Asuka Langley", Rarity::Epic)];
        assert!(resolve_by_name("asuka langley", &items).is_some());
        assert!(resolve_by_name("ASUKA", &items).is_some());
        assert!(resolve_by_name("langley.", &items).is_some());
        assert!(resolve_by_name("rei", &items).is_none());
        assert!(resolve_by_name("", &items).is_none());
    }

    #[test]
    fn tolerates_one_typo_in_long_words() {
        let items = vec![item("Asuka Langley", Rarity::Epic)];
        assert!(resolve_by_name("langly", &items).is_some());
        // short words must be exact
        assert!(resolve_by_name("asika", &items).is_none());
        assert!(resolve_by_name("lengly", &items).is_none());
    }

    #[test]
    fn exact_match_wins_over_word_match() {
        let items = vec![item("Rei Ayanami", Rarity::Rare), item("Rei", Rarity::Common)];
        let hit = resolve_by_name("rei", &items).unwrap();
        assert_eq!(hit.name, "Rei");
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let res = pick_from(&[], &RarityWeights::default(), &mut rng);
        assert!(matches!(res, Err(DomainError::EmptyCatalog)));
    }

    #[test]
    fn only_populated_tiers_are_drawn() {
        let items = vec![item("Pen Pen", Rarity::Common), item("Kaworu", Rarity::Legendary)];
        let mut rng = StdRng::seed_from_u64(7);
        let mut legendary = 0;
        for _ in 0..6_300 {
            if pick_from(&items, &RarityWeights::default(), &mut rng).unwrap().rarity == Rarity::Legendary {
                legendary += 1;
            }
        }
        // 3 / (60 + 3) of the draws
        assert!((200..=400).contains(&legendary), "legendary drawn {legendary} times");
    }

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let items = vec![item("Kaworu", Rarity::Legendary)];
        let weights = RarityWeights {
            common: 10,
            rare: 5,
            epic: 1,
            legendary: 0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(pick_from(&items, &weights, &mut rng).unwrap().name, "Kaworu");
    }
}
