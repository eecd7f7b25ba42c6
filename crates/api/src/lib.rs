//! Gateway proxy: session cookie in, authenticated upstream call out,
//! normalised envelope back.

pub mod app;
pub mod config;
pub mod context;
pub mod credentials;
pub mod middleware;
pub mod operations;
pub mod proxy;
pub mod upstream;

pub use app::build_app;
pub use config::GatewayConfig;
