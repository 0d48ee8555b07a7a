//! Persistent category definitions and recorded assignments.

mod model;
mod repository;

pub use model::Assignment;
pub use repository::CategoryRepository;
