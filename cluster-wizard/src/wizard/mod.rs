// Headless wizard engine: step view-models, navigation and display transforms.

pub mod browse;
pub mod form;
pub mod navigator;
pub mod render;
pub mod requests;
pub mod schema;
pub mod steps;
