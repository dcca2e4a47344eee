pub mod config;
pub mod filter;
pub mod history;
pub mod task;

pub use config::*;
pub use filter::*;
pub use history::*;
pub use task::*;
