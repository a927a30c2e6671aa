pub mod buffer;
pub mod commands;
pub mod queue;
pub mod wrapper;
