// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use url::Url;

use crate::Item;

pub const MAP_SEARCH_ENDPOINT: &str = "https://maps.google.com/";

pub fn place_link(item: &Item) -> Result<Url> {
    search_link(&[item.name.as_deref(), item.address.as_deref()])
}

pub fn place_link_with_city(item: &Item) -> Result<Url> {
    search_link(&[
        item.name.as_deref(),
        item.address.as_deref(),
        item.city.map(|city| city.as_str()),
    ])
}

pub fn address_link(item: &Item) -> Result<Option<Url>> {
    match item.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => search_link(&[Some(address)]).map(Some),
        _ => Ok(None),
    }
}

fn search_link(parts: &[Option<&str>]) -> Result<Url> {
    let query = parts
        .iter()
        .flatten()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Url::parse_with_params(MAP_SEARCH_ENDPOINT, [("q", query.as_str())])
        .with_context(|| format!("build map link for {query:?}"))
}
