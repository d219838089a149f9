pub mod catalog;
pub mod settings;

pub use catalog::{builtin_catalog, load_catalog, validate_catalog};
pub use settings::{BackendAuth, Settings};
