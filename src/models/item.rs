use crate::error::{AppResult, DomainError};
use crate::models::types::ItemId;
use postgres_types::private::BytesMut;
use postgres_types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::str::FromStr;

/// Rarity tier of a catalog item. Ordering is meaningful: Common is the
/// lowest tier, Legendary the highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = DomainError;

    /// Accepts the tier name or its 1-based number (`/upload` historically took numbers).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "common" => Ok(Rarity::Common),
            "2" | "rare" => Ok(Rarity::Rare),
            "3" | "epic" => Ok(Rarity::Epic),
            "4" | "legendary" => Ok(Rarity::Legendary),
            other => Err(DomainError::Validation {
                field: "rarity",
                message: format!("unknown rarity '{other}'"),
            }),
        }
    }
}

impl ToSql for Rarity {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        self.as_str().to_sql(ty, out)
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }

    to_sql_checked!();
}

impl FromSql<'_> for Rarity {
    fn from_sql(ty: &Type, raw: &[u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let s = String::from_sql(ty, raw)?;
        s.parse::<Rarity>().map_err(|e| e.to_string().into())
    }

    fn accepts(ty: &Type) -> bool {
        ty == &Type::TEXT
    }
}

/// Relative spawn weight per rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityWeights {
    pub common: u32,
    pub rare: u32,
    pub epic: u32,
    pub legendary: u32,
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: 60,
            rare: 25,
            epic: 12,
            legendary: 3,
        }
    }
}

impl RarityWeights {
    pub fn weight(&self, rarity: Rarity) -> u32 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }

    pub fn total(&self) -> u32 {
        Rarity::ALL.iter().map(|r| self.weight(*r)).sum()
    }

    /// Every higher tier must be strictly rarer than the one below it.
    pub fn validate(&self) -> Result<(), String> {
        for pair in Rarity::ALL.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            if self.weight(higher) >= self.weight(lower) {
                return Err(format!(
                    "weight for {higher} ({}) must be lower than weight for {lower} ({})",
                    self.weight(higher),
                    self.weight(lower)
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Catalog ID
    pub id: ItemId,
    /// Display name (e.g. "Asuka Langley")
    pub name: String,
    /// Series the character comes from
    pub series: String,
    pub rarity: Rarity,
    /// URL or platform file reference of the image
    pub media: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Catalog entry as submitted by an admin, before it has an id.
#[derive(Debug, Clone, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub series: String,
    pub rarity: Rarity,
    pub media: String,
}

impl NewItem {
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "name",
                message: "name cannot be empty".into(),
            });
        }
        if self.name.chars().count() > 128 {
            return Err(DomainError::Validation {
                field: "name",
                message: "name is longer than 128 characters".into(),
            });
        }
        if self.series.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "series",
                message: "series cannot be empty".into(),
            });
        }
        if self.media.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "media",
                message: "media reference cannot be empty".into(),
            });
        }
        Ok(())
    }

    /// Turns the submission into a catalog item. Names are stored with
    /// underscores replaced by spaces, since chat commands can't carry spaces
    /// inside a single argument.
    pub fn into_item(self) -> Item {
        Item {
            id: ItemId::new(),
            name: self.name.trim().replace('_', " "),
            series: self.series.trim().replace('_', " "),
            rarity: self.rarity,
            media: self.media.trim().to_string(),
            created_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rarity_is_ordered() {
        assert!(Rarity::Common < Rarity::Rare);
        assert!(Rarity::Rare < Rarity::Epic);
        assert!(Rarity::Epic < Rarity::Legendary);
    }

    #[test]
    fn rarity_parses_names_and_numbers() {
        assert_eq!("Legendary".parse::<Rarity>().unwrap(), Rarity::Legendary);
        assert_eq!(" 2 ".parse::<Rarity>().unwrap(), Rarity::Rare);
        assert!("mythic".parse::<Rarity>().is_err());
    }

    #[test]
    fn default_weights_are_strictly_decreasing() {
        let w = RarityWeights::default();
        assert!(w.validate().is_ok());
        assert_eq!(w.total(), 100);
    }

    #[test]
    fn flat_weights_are_rejected() {
        let w = RarityWeights {
            common: 10,
            rare: 10,
            epic: 5,
            legendary: 1,
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn new_item_validation() {
        let mut item = NewItem {
            name: "Asuka_Langley".into(),
            series: "Evangelion".into(),
            rarity: Rarity::Common,
            media: "https://files.example/asuka.jpg".into(),
        };
        assert!(item.validate().is_ok());
        assert_eq!(item.clone().into_item().name, "Asuka Langley");

        item.name = "   ".into();
        assert!(matches!(item.validate(), Err(DomainError::Validation { field: "name", .. })));
    }
}
