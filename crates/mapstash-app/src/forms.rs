// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use time::OffsetDateTime;

use crate::{Category, City, NewItem};

const KNOWN_CATEGORIES: [&str; 4] = ["food", "drinks", "cafe", "attraction"];
const KNOWN_FOOD_KINDS: [&str; 5] = ["rice", "noodle", "dessert", "hotpot", "other"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFormInput {
    pub url: String,
    pub name: String,
    pub address: String,
    pub category: String,
    pub sub_category: String,
    pub city: String,
    pub note: String,
}

impl ItemFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("url is required -- paste the reel or post link and retry");
        }
        let city = self.city.trim();
        if city.is_empty() {
            bail!("city is required -- choose one of {}", city_choices());
        }
        if City::parse(city).is_none() {
            bail!("unknown city {city:?} -- choose one of {}", city_choices());
        }
        if self.name.trim().is_empty() && self.address.trim().is_empty() {
            bail!("name or address is required -- enter at least one and retry");
        }

        let category = self.category.trim();
        let sub_category = self.sub_category.trim();
        if !category.is_empty() && !KNOWN_CATEGORIES.contains(&category) {
            bail!(
                "unknown category {category:?} -- choose one of {}",
                KNOWN_CATEGORIES.join(", ")
            );
        }
        if !sub_category.is_empty() {
            if category != "food" {
                bail!("sub-category only applies to food -- clear it or pick the food category");
            }
            if !KNOWN_FOOD_KINDS.contains(&sub_category) {
                bail!(
                    "unknown sub-category {sub_category:?} -- choose one of {}",
                    KNOWN_FOOD_KINDS.join(", ")
                );
            }
        }
        Ok(())
    }

    pub fn into_new_item(self, now: OffsetDateTime) -> Result<NewItem> {
        self.validate()?;
        let Some(city) = City::parse(&self.city) else {
            bail!("unknown city {:?} -- choose one of {}", self.city, city_choices());
        };
        Ok(NewItem {
            category: Category::from_codes(&self.category, &self.sub_category),
            name: non_blank(self.name),
            address: non_blank(self.address),
            url: self.url.trim().to_owned(),
            city,
            note: non_blank(self.note),
            created_at: now,
        })
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn city_choices() -> String {
    City::ALL
        .iter()
        .map(|city| city.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
