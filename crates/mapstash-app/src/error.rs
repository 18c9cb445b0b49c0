// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::ids::ItemId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[error("load saved places failed -- check the database and reload")]
pub struct LoadError {
    #[source]
    source: BoxError,
}

impl LoadError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

// Nothing was removed locally when this is returned.
#[derive(Debug, Error)]
#[error("delete {id} failed -- try again later")]
pub struct DeleteError {
    id: ItemId,
    #[source]
    source: BoxError,
}

impl DeleteError {
    pub fn new(id: ItemId, source: impl Into<BoxError>) -> Self {
        Self {
            id,
            source: source.into(),
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }
}
