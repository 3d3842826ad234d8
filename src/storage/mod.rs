mod repository;
mod seed;

pub use repository::*;
pub use seed::{DEFAULT_ADMIN_PIN, SCHEMA_VERSION, seed_products};
