pub mod filter;
pub mod mutate;
pub mod review;
pub mod sweep;
pub mod undo;
