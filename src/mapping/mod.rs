pub mod fields;
pub mod loader;
pub mod report;
