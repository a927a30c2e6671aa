mod modules;

pub use modules::bitrate::BitrateAdjuster;
pub use modules::config::RelayConfig;
pub use modules::fetch::{FetchEngine, ObjectStore};
pub use modules::live_relay_queue::buffer::FetchSlice;
pub use modules::live_relay_queue::wrapper::LiveRelayQueueWrapper;
pub use modules::logging::init_logging;
pub use modules::outgoing_queue::{
    object_forwarder, OutgoingQueue, OutgoingQueueHandle, QueueEntry,
};
pub use modules::probe::{CapacityEstimate, ProbeManager};
pub use modules::relay::RelayInstance;
pub use modules::session::{SessionContext, SessionRegistry};
pub use modules::track_source::{run_track_source, LocalTrackSource, TrackSource, UpstreamRelaySource};
pub use modules::transport::{CloseReason, OutputChannel, ProbePath, StreamKey};
