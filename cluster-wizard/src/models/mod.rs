pub mod cluster;
pub mod connection;
pub mod context;
pub mod files;
pub mod test_results;
