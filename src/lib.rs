pub mod config;
pub mod fetch;
pub mod format;
pub mod mbta;
pub mod model;
pub mod output;
pub mod reconcile;
pub mod report;
pub mod server;
