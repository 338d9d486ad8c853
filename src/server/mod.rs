pub mod config;
mod gateway;
mod http_layers;
pub mod server;
pub mod state;
mod websocket;

pub use config::ServerConfig;
pub use gateway::SESSION_ID_HEADER;
pub use http_layers::*;
pub use server::{make_app, run_server};
