// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod calendar;
pub mod clipboard;
pub mod ids;
pub mod model;
pub mod state;
pub mod stats;
pub mod validate;

pub use ids::*;
pub use model::*;
pub use state::*;
