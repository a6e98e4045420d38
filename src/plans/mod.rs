//! Insurance plans and the catalog they are loaded from.

mod catalog;
mod types;


pub use catalog::Catalog;
pub use types::{CostSharing, Plan};
