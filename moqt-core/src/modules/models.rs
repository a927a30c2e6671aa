pub mod location;
pub mod object;
pub mod range;
pub mod session_parameters;
pub mod subscriptions;
pub mod tracks;
