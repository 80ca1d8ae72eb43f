// Models module for data structures
pub mod catalog;
pub mod module_config;
pub mod module_state;
pub mod package_reference;
pub mod platform;
pub mod process_data;
pub mod recipe;
pub mod version;
