pub mod errors;
pub mod models;
pub mod namespace_index;
pub mod subscribe_windows;
