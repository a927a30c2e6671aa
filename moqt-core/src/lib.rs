mod modules;
pub use modules::errors;
pub use modules::models;
pub use modules::namespace_index;
pub use modules::subscribe_windows;
