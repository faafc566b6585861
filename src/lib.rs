pub mod config;
pub mod format;
pub mod http;
pub mod lifecycle;
pub mod logging;
pub mod params;
pub mod system;
