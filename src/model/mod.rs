pub mod generation;
pub mod query;
pub mod result;
pub mod store;
