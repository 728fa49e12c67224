pub mod error;
pub mod group;
pub mod hierarchy;
pub mod options;
pub mod reconcile;
pub mod types;
