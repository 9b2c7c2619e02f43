//! Application lifecycle
//!
//! - `lifetime`: startup wiring and graceful shutdown
//! - `server`: HTTP server mode

pub mod lifetime;
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use server::run_server;
