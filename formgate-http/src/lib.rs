pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{AppState, build_router};
