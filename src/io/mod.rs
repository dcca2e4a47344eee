pub mod config_io;
pub mod line_store;
pub mod notes_io;
pub mod usage;
