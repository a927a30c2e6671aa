pub mod bitrate;
pub mod config;
pub mod fetch;
pub mod live_relay_queue;
pub mod logging;
pub mod outgoing_queue;
pub mod probe;
pub mod relay;
pub mod session;
pub mod track_source;
pub mod transport;
