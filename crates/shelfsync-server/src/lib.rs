//! ShelfSync HTTP surface: router, handlers, and shared state.

pub mod routes;
pub mod state;
