// Library for tests to access modules

pub mod app_stats;
pub mod config;
pub mod docker_repo;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod models;
pub mod monitor;
pub mod routes;
pub mod sampler;
pub mod sysinfo_repo;
pub mod version;
