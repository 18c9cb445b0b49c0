// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{City, Region};

pub const NORTH_TO_SOUTH: [City; 7] = [
    City::Taipei,
    City::NewTaipei,
    City::Taoyuan,
    City::Taichung,
    City::Changhua,
    City::Tainan,
    City::Kaohsiung,
];

const NORTH_CITIES: [City; 3] = [City::Taipei, City::NewTaipei, City::Taoyuan];
const CENTRAL_CITIES: [City; 2] = [City::Taichung, City::Changhua];
const SOUTH_CITIES: [City; 2] = [City::Tainan, City::Kaohsiung];

const CATEGORY_LABELS: [(&str, &str); 9] = [
    ("food", "食物"),
    ("drinks", "飲料"),
    ("cafe", "咖啡廳"),
    ("attraction", "景點"),
    ("rice", "米食"),
    ("noodle", "麵食"),
    ("dessert", "甜點"),
    ("hotpot", "火鍋"),
    ("other", "其他"),
];

// `All` yields an empty slice, read as no restriction.
pub fn cities_of(region: Region) -> &'static [City] {
    match region {
        Region::All => &[],
        Region::North => &NORTH_CITIES,
        Region::Central => &CENTRAL_CITIES,
        Region::South => &SOUTH_CITIES,
    }
}

pub fn sort_index_of(city: Option<City>) -> i32 {
    city.and_then(|city| NORTH_TO_SOUTH.iter().position(|known| *known == city))
        .map_or(-1, |index| index as i32)
}

pub fn category_label(code: &str) -> &str {
    CATEGORY_LABELS
        .iter()
        .find(|(known, _)| *known == code)
        .map_or(code, |(_, label)| *label)
}
