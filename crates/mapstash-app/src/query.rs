// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::catalog::{cities_of, sort_index_of};
use crate::model::{City, Item, Region, SortMode};
use crate::state::ListViewState;

// `needle` must already be lowercase.
pub fn text_matches(item: &Item, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    let category_label = item.category.as_ref().map(|category| category.label());
    let sub_label = item.category.as_ref().and_then(|category| category.sub_label());

    [
        item.name.as_deref(),
        item.address.as_deref(),
        item.note.as_deref(),
        category_label,
        sub_label,
    ]
    .into_iter()
    .map(|field| field.unwrap_or(""))
    .any(|field| field.to_lowercase().contains(needle))
}

pub fn region_matches(item: &Item, region: Region) -> bool {
    if region == Region::All {
        return true;
    }
    item.city
        .is_some_and(|city| cities_of(region).contains(&city))
}

pub fn city_matches(item: &Item, selected: &BTreeSet<City>) -> bool {
    if selected.is_empty() {
        return true;
    }
    item.city.is_some_and(|city| selected.contains(&city))
}

pub fn matches_view(item: &Item, view: &ListViewState) -> bool {
    let needle = view.search_text.to_lowercase();
    matches_with_needle(item, view, &needle)
}

fn matches_with_needle(item: &Item, view: &ListViewState, needle: &str) -> bool {
    text_matches(item, needle)
        && region_matches(item, view.region)
        && city_matches(item, &view.selected_cities)
}

pub fn compare_items(left: &Item, right: &Item, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Newest => right.created_seconds().cmp(&left.created_seconds()),
        SortMode::Oldest => left.created_seconds().cmp(&right.created_seconds()),
        // Absent cities index at -1 and therefore lead.
        SortMode::NorthToSouth => sort_index_of(left.city).cmp(&sort_index_of(right.city)),
    }
}

pub fn visible_items<'a>(items: &'a [Item], view: &ListViewState) -> Vec<&'a Item> {
    let needle = view.search_text.to_lowercase();
    let mut visible = items
        .iter()
        .filter(|item| matches_with_needle(item, view, &needle))
        .collect::<Vec<_>>();
    visible.sort_by(|left, right| compare_items(left, right, view.sort_mode));
    visible
}
