use crate::modules::{config::RelayConfig, probe::CapacityEstimate};
use tokio::sync::{mpsc, watch};

/// Maps capacity estimates to a target forwarding bitrate.
///
/// Increases are gradual: at most `ramp_fraction` of the current target
/// per estimate, and never beyond what a probe actually demonstrated.
/// Decreases are prompt, either straight to the measured rate or
/// multiplicatively on a timeout.
#[derive(Debug, Clone)]
pub struct BitrateAdjuster {
    target: u64,
    min: u64,
    max: u64,
    ramp_fraction: f64,
    decrease_factor: f64,
}

impl BitrateAdjuster {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            target: config
                .initial_bitrate
                .clamp(config.min_bitrate, config.max_bitrate),
            min: config.min_bitrate,
            max: config.max_bitrate,
            ramp_fraction: config.bitrate_ramp_fraction,
            decrease_factor: config.bitrate_decrease_factor,
        }
    }

    pub fn target_bitrate(&self) -> u64 {
        self.target
    }

    /// Folds one estimate into the target and returns the new target.
    pub fn on_estimate(&mut self, estimate: CapacityEstimate) -> u64 {
        match estimate {
            CapacityEstimate::TimedOut => {
                let decreased = (self.target as f64 * self.decrease_factor) as u64;
                self.target = decreased.max(self.min);
            }
            CapacityEstimate::Delivered { bits_per_second } => {
                if bits_per_second < self.target {
                    self.target = bits_per_second.max(self.min);
                } else {
                    let step = (self.target as f64 * self.ramp_fraction) as u64;
                    self.target = (self.target + step).min(bits_per_second).min(self.max);
                }
            }
        }

        self.target
    }

    /// Consumes estimates until the channel closes, publishing each new
    /// target on the watch channel.
    pub async fn run(
        mut self,
        mut estimates: mpsc::Receiver<CapacityEstimate>,
        targets: watch::Sender<u64>,
    ) {
        tracing::trace!("bitrate_adjuster start");

        while let Some(estimate) = estimates.recv().await {
            let target = self.on_estimate(estimate);
            tracing::debug!("bitrate target updated: {}", target);
            if targets.send(target).is_err() {
                break;
            }
        }

        tracing::trace!("bitrate_adjuster end");
    }
}

#[cfg(test)]
mod success {
    use crate::modules::{
        bitrate::BitrateAdjuster, config::RelayConfig, probe::CapacityEstimate,
    };
    use tokio::sync::{mpsc, watch};

    fn adjuster() -> BitrateAdjuster {
        let mut config = RelayConfig::new();
        config.initial_bitrate = 1_000_000;
        config.min_bitrate = 100_000;
        config.max_bitrate = 10_000_000;
        config.bitrate_ramp_fraction = 0.1;
        config.bitrate_decrease_factor = 0.5;
        BitrateAdjuster::new(&config)
    }

    #[test]
    fn timeout_decreases_multiplicatively() {
        let mut adjuster = adjuster();

        assert_eq!(adjuster.on_estimate(CapacityEstimate::TimedOut), 500_000);
        assert_eq!(adjuster.on_estimate(CapacityEstimate::TimedOut), 250_000);
    }

    #[test]
    fn timeout_decrease_clamps_to_min() {
        let mut adjuster = adjuster();

        for _ in 0..20 {
            adjuster.on_estimate(CapacityEstimate::TimedOut);
        }

        assert_eq!(adjuster.target_bitrate(), 100_000);
    }

    #[test]
    fn increase_is_ramp_limited() {
        let mut adjuster = adjuster();

        let target = adjuster.on_estimate(CapacityEstimate::Delivered {
            bits_per_second: 8_000_000,
        });

        // One step of 10%, not a jump to the measured capacity
        assert_eq!(target, 1_100_000);
    }

    #[test]
    fn increase_never_exceeds_measurement() {
        let mut adjuster = adjuster();

        let target = adjuster.on_estimate(CapacityEstimate::Delivered {
            bits_per_second: 1_050_000,
        });

        assert_eq!(target, 1_050_000);
    }

    #[test]
    fn increase_clamps_to_max() {
        let mut adjuster = adjuster();

        for _ in 0..100 {
            adjuster.on_estimate(CapacityEstimate::Delivered {
                bits_per_second: u64::MAX,
            });
        }

        assert_eq!(adjuster.target_bitrate(), 10_000_000);
    }

    #[test]
    fn low_measurement_decreases_promptly() {
        let mut adjuster = adjuster();

        let target = adjuster.on_estimate(CapacityEstimate::Delivered {
            bits_per_second: 400_000,
        });

        assert_eq!(target, 400_000);
    }

    #[test]
    fn low_measurement_clamps_to_min() {
        let mut adjuster = adjuster();

        let target = adjuster.on_estimate(CapacityEstimate::Delivered {
            bits_per_second: 10,
        });

        assert_eq!(target, 100_000);
    }

    #[tokio::test]
    async fn run_publishes_targets() {
        let (estimate_tx, estimate_rx) = mpsc::channel(4);
        let (target_tx, mut target_rx) = watch::channel(0);
        tokio::spawn(adjuster().run(estimate_rx, target_tx));

        estimate_tx
            .send(CapacityEstimate::TimedOut)
            .await
            .unwrap();

        target_rx.changed().await.unwrap();
        assert_eq!(*target_rx.borrow(), 500_000);
    }
}
