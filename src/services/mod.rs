//! Service layer: orchestration over domain types and container sources.

pub mod checker;
