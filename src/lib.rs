pub mod app;
pub mod config;
pub mod due;
pub mod error;
pub mod model;
pub mod priority;
pub mod store;
pub mod view;
