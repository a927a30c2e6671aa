use crate::modules::transport::ProbePath;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Outcome of one padding probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityEstimate {
    /// The probe was delivered; the path sustained this rate.
    Delivered { bits_per_second: u64 },
    /// The probe was not confirmed within the timeout, which is read as
    /// congestion on the path.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbeState {
    Idle,
    Probing,
    Measuring,
}

/// Periodically sends padding data down a path and turns the delivery
/// time into capacity estimates. One manager per probed path.
pub struct ProbeManager<P: ProbePath> {
    path: P,
    probe_size: usize,
    interval: Duration,
    timeout: Duration,
    state: ProbeState,
    estimates: mpsc::Sender<CapacityEstimate>,
}

impl<P: ProbePath> ProbeManager<P> {
    pub fn new(
        path: P,
        probe_size: usize,
        interval: Duration,
        timeout: Duration,
        estimates: mpsc::Sender<CapacityEstimate>,
    ) -> Self {
        Self {
            path,
            probe_size,
            interval,
            timeout,
            state: ProbeState::Idle,
            estimates,
        }
    }

    /// Probes on every interval tick until the estimate receiver is
    /// dropped.
    pub async fn run(mut self) {
        tracing::trace!("probe_manager start");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let estimate = self.probe_once().await;
            if self.estimates.send(estimate).await.is_err() {
                break;
            }
        }

        tracing::trace!("probe_manager end");
    }

    /// At most one probe is in flight: a new one is never started before
    /// the previous probe resolved or timed out.
    async fn probe_once(&mut self) -> CapacityEstimate {
        self.state = ProbeState::Probing;
        tracing::trace!("probe state: {:?}", self.state);
        let started = Instant::now();

        let delivery =
            tokio::time::timeout(self.timeout, self.path.deliver_probe(self.probe_size)).await;

        self.state = ProbeState::Measuring;
        tracing::trace!("probe state: {:?}", self.state);
        let estimate = match delivery {
            Ok(Ok(())) => {
                let elapsed = started.elapsed().as_secs_f64().max(1e-6);
                let bits = (self.probe_size as f64) * 8.0;
                CapacityEstimate::Delivered {
                    bits_per_second: (bits / elapsed) as u64,
                }
            }
            // A failed path reads the same as a congested one
            Ok(Err(_)) | Err(_) => CapacityEstimate::TimedOut,
        };

        self.state = ProbeState::Idle;
        estimate
    }
}

#[cfg(test)]
mod success {
    use crate::modules::{
        probe::{CapacityEstimate, ProbeManager},
        transport::ProbePath,
    };
    use async_trait::async_trait;
    use moqt_core::errors::RelayError;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct InstantPath;

    #[async_trait]
    impl ProbePath for InstantPath {
        async fn deliver_probe(&mut self, _len: usize) -> Result<(), RelayError> {
            Ok(())
        }
    }

    struct StalledPath;

    #[async_trait]
    impl ProbePath for StalledPath {
        async fn deliver_probe(&mut self, _len: usize) -> Result<(), RelayError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    struct BrokenPath;

    #[async_trait]
    impl ProbePath for BrokenPath {
        async fn deliver_probe(&mut self, _len: usize) -> Result<(), RelayError> {
            Err(RelayError::TransportUnavailable)
        }
    }

    #[tokio::test]
    async fn delivered_probe_produces_estimate() {
        let (tx, mut rx) = mpsc::channel(4);
        let manager = ProbeManager::new(
            InstantPath,
            64 * 1024,
            Duration::from_millis(1),
            Duration::from_millis(100),
            tx,
        );
        tokio::spawn(manager.run());

        let estimate = rx.recv().await.unwrap();
        assert!(matches!(estimate, CapacityEstimate::Delivered { .. }));
    }

    #[tokio::test]
    async fn stalled_probe_times_out() {
        let (tx, mut rx) = mpsc::channel(4);
        let manager = ProbeManager::new(
            StalledPath,
            64 * 1024,
            Duration::from_millis(1),
            Duration::from_millis(10),
            tx,
        );
        tokio::spawn(manager.run());

        let estimate = rx.recv().await.unwrap();
        assert_eq!(estimate, CapacityEstimate::TimedOut);
    }

    #[tokio::test]
    async fn path_failure_reads_as_timeout() {
        let (tx, mut rx) = mpsc::channel(4);
        let manager = ProbeManager::new(
            BrokenPath,
            64 * 1024,
            Duration::from_millis(1),
            Duration::from_millis(100),
            tx,
        );
        tokio::spawn(manager.run());

        let estimate = rx.recv().await.unwrap();
        assert_eq!(estimate, CapacityEstimate::TimedOut);
    }

    #[tokio::test]
    async fn run_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        let manager = ProbeManager::new(
            InstantPath,
            1024,
            Duration::from_millis(1),
            Duration::from_millis(100),
            tx,
        );
        let handle = tokio::spawn(manager.run());

        drop(rx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
