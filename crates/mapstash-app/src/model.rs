// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "台北")]
    Taipei,
    #[serde(rename = "新北")]
    NewTaipei,
    #[serde(rename = "桃園")]
    Taoyuan,
    #[serde(rename = "台中")]
    Taichung,
    #[serde(rename = "彰化")]
    Changhua,
    #[serde(rename = "台南")]
    Tainan,
    #[serde(rename = "高雄")]
    Kaohsiung,
}

impl City {
    pub const ALL: [Self; 7] = [
        Self::Taipei,
        Self::NewTaipei,
        Self::Taoyuan,
        Self::Taichung,
        Self::Changhua,
        Self::Tainan,
        Self::Kaohsiung,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Taipei => "台北",
            Self::NewTaipei => "新北",
            Self::Taoyuan => "桃園",
            Self::Taichung => "台中",
            Self::Changhua => "彰化",
            Self::Tainan => "台南",
            Self::Kaohsiung => "高雄",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "台北" => Some(Self::Taipei),
            "新北" => Some(Self::NewTaipei),
            "桃園" => Some(Self::Taoyuan),
            "台中" => Some(Self::Taichung),
            "彰化" => Some(Self::Changhua),
            "台南" => Some(Self::Tainan),
            "高雄" => Some(Self::Kaohsiung),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    #[default]
    All,
    North,
    Central,
    South,
}

impl Region {
    pub const ALL: [Self; 4] = [Self::All, Self::North, Self::Central, Self::South];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::North => "north",
            Self::Central => "central",
            Self::South => "south",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "全部",
            Self::North => "北部",
            Self::Central => "中部",
            Self::South => "南部",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL.into_iter().find(|region| {
            region.as_str().eq_ignore_ascii_case(trimmed) || region.label() == trimmed
        })
    }

    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|region| *region == self)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Newest,
    Oldest,
    NorthToSouth,
}

impl SortMode {
    pub const ALL: [Self; 3] = [Self::Newest, Self::Oldest, Self::NorthToSouth];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::NorthToSouth => "north_to_south",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "newest first",
            Self::Oldest => "oldest first",
            Self::NorthToSouth => "north to south",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest" => Some(Self::Newest),
            "oldest" => Some(Self::Oldest),
            "north_to_south" | "northtosouth" | "north-to-south" => Some(Self::NorthToSouth),
            _ => None,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Newest => Self::Oldest,
            Self::Oldest => Self::NorthToSouth,
            Self::NorthToSouth => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Rice,
    Noodle,
    Dessert,
    Hotpot,
    Other,
    Unlisted(String),
}

impl FoodKind {
    pub fn code(&self) -> &str {
        match self {
            Self::Rice => "rice",
            Self::Noodle => "noodle",
            Self::Dessert => "dessert",
            Self::Hotpot => "hotpot",
            Self::Other => "other",
            Self::Unlisted(code) => code,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" => None,
            "rice" => Some(Self::Rice),
            "noodle" => Some(Self::Noodle),
            "dessert" => Some(Self::Dessert),
            "hotpot" => Some(Self::Hotpot),
            "other" => Some(Self::Other),
            code => Some(Self::Unlisted(code.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food(Option<FoodKind>),
    Drinks,
    Cafe,
    Attraction,
    Unlisted(String),
}

impl Category {
    pub fn code(&self) -> &str {
        match self {
            Self::Food(_) => "food",
            Self::Drinks => "drinks",
            Self::Cafe => "cafe",
            Self::Attraction => "attraction",
            Self::Unlisted(code) => code,
        }
    }

    pub fn food_kind(&self) -> Option<&FoodKind> {
        match self {
            Self::Food(kind) => kind.as_ref(),
            _ => None,
        }
    }

    pub fn sub_code(&self) -> Option<&str> {
        self.food_kind().map(FoodKind::code)
    }

    // A sub-category next to anything but food is dropped.
    pub fn from_codes(category: &str, sub_category: &str) -> Option<Self> {
        let category = category.trim();
        let sub_category = sub_category.trim();
        let parsed = match category {
            "" => None,
            "food" => Some(Self::Food(FoodKind::parse(sub_category))),
            "drinks" => Some(Self::Drinks),
            "cafe" => Some(Self::Cafe),
            "attraction" => Some(Self::Attraction),
            code => Some(Self::Unlisted(code.to_owned())),
        };
        if !sub_category.is_empty() && !matches!(parsed, Some(Self::Food(_))) {
            tracing::debug!(
                category,
                sub_category,
                "dropping sub-category stored outside the food category"
            );
        }
        parsed
    }

    pub fn label(&self) -> &str {
        crate::catalog::category_label(self.code())
    }

    pub fn sub_label(&self) -> Option<&str> {
        self.sub_code().map(crate::catalog::category_label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: Option<String>,
    pub address: Option<String>,
    pub url: String,
    pub category: Option<Category>,
    pub city: Option<City>,
    pub note: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Item {
    pub fn created_seconds(&self) -> i64 {
        self.created_at
            .map(OffsetDateTime::unix_timestamp)
            .unwrap_or(0)
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.address.as_deref().unwrap_or("(unnamed)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: Option<String>,
    pub address: Option<String>,
    pub url: String,
    pub category: Option<Category>,
    pub city: City,
    pub note: Option<String>,
    pub created_at: OffsetDateTime,
}

impl NewItem {
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            address: self.address,
            url: self.url,
            category: self.category,
            city: Some(self.city),
            note: self.note,
            created_at: Some(self.created_at),
        }
    }
}
