pub mod config;
pub mod credentials;
pub mod geo;
pub mod grid;
pub mod live;
pub mod metrics;
pub mod output;
pub mod scoring;
pub mod traffic;
