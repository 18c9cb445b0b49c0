// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod catalog;
pub mod error;
pub mod forms;
pub mod ids;
pub mod maplink;
pub mod model;
pub mod query;
pub mod state;
pub mod store;

pub use catalog::*;
pub use error::*;
pub use forms::*;
pub use ids::*;
pub use maplink::*;
pub use model::*;
pub use query::*;
pub use state::*;
pub use store::*;
