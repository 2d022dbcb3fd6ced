pub mod api;
pub mod config;
pub mod error;
mod main_lib;
pub mod rate_limit;
pub mod scheduler;
pub mod task_queue;

pub use main_lib::{build_state, init_tracing, start_fetching, AppState, FetchRuntime};
