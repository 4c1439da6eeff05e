//! Canonical enum types shared by the catalog, the store and the view-models.

use serde::{Deserialize, Serialize};

/// Theme of a category. Stored as its `SCREAMING_SNAKE_CASE` name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryType {
    Countries,
    Capitals,
    Flags,
    Animals,
    Birds,
    Fruits,
    Vegetables,
    Food,
    Sports,
    Movies,
    Music,
    Science,
    History,
    Geography,
    Professions,
    Colors,
    HumanBody,
    Space,
    Technology,
    Brands,
    Cities,
    Landmarks,
    Mythology,
    Literature,
    Daily,
    Vip,
}

impl CategoryType {
    pub const ALL: [CategoryType; 26] = [
        Self::Countries,
        Self::Capitals,
        Self::Flags,
        Self::Animals,
        Self::Birds,
        Self::Fruits,
        Self::Vegetables,
        Self::Food,
        Self::Sports,
        Self::Movies,
        Self::Music,
        Self::Science,
        Self::History,
        Self::Geography,
        Self::Professions,
        Self::Colors,
        Self::HumanBody,
        Self::Space,
        Self::Technology,
        Self::Brands,
        Self::Cities,
        Self::Landmarks,
        Self::Mythology,
        Self::Literature,
        Self::Daily,
        Self::Vip,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Countries => "COUNTRIES",
            Self::Capitals => "CAPITALS",
            Self::Flags => "FLAGS",
            Self::Animals => "ANIMALS",
            Self::Birds => "BIRDS",
            Self::Fruits => "FRUITS",
            Self::Vegetables => "VEGETABLES",
            Self::Food => "FOOD",
            Self::Sports => "SPORTS",
            Self::Movies => "MOVIES",
            Self::Music => "MUSIC",
            Self::Science => "SCIENCE",
            Self::History => "HISTORY",
            Self::Geography => "GEOGRAPHY",
            Self::Professions => "PROFESSIONS",
            Self::Colors => "COLORS",
            Self::HumanBody => "HUMAN_BODY",
            Self::Space => "SPACE",
            Self::Technology => "TECHNOLOGY",
            Self::Brands => "BRANDS",
            Self::Cities => "CITIES",
            Self::Landmarks => "LANDMARKS",
            Self::Mythology => "MYTHOLOGY",
            Self::Literature => "LITERATURE",
            Self::Daily => "DAILY",
            Self::Vip => "VIP",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// Currency or gift granted by a daily reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    Coins,
    Stars,
    VipPoints,
    SpecialGift,
}

impl RewardType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coins => "COINS",
            Self::Stars => "STARS",
            Self::VipPoints => "VIP_POINTS",
            Self::SpecialGift => "SPECIAL_GIFT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "COINS" => Some(Self::Coins),
            "STARS" => Some(Self::Stars),
            "VIP_POINTS" => Some(Self::VipPoints),
            "SPECIAL_GIFT" => Some(Self::SpecialGift),
            _ => None,
        }
    }

    /// Wallet currency a reward of this type is credited to.
    /// Special gifts pay out in coins.
    pub fn currency(self) -> Currency {
        match self {
            Self::Coins | Self::SpecialGift => Currency::Coins,
            Self::Stars => Currency::Stars,
            Self::VipPoints => Currency::VipPoints,
        }
    }
}

/// The three wallet currencies held in `PlayerProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Coins,
    Stars,
    VipPoints,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Coins => "coins",
            Self::Stars => "stars",
            Self::VipPoints => "VIP points",
        };
        f.write_str(s)
    }
}

/// Paid hint variants. Both currently remove up to [`HINT_LETTERS_REMOVED`]
/// incorrect letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintKind {
    RemoveRandomLetters,
    RemoveTwoLetters,
}

pub const HINT_LETTERS_REMOVED: usize = 2;

impl HintKind {
    pub fn letters_removed(self) -> usize {
        match self {
            Self::RemoveRandomLetters | Self::RemoveTwoLetters => HINT_LETTERS_REMOVED,
        }
    }
}
