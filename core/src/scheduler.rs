//! Duty-cycle scheduler
//!
//! One wake cycle:
//!
//! 1. Power the radio on
//! 2. Load the retained record and pick a join plan
//! 3. Drive the retry/escalation policy until connected or abandoned
//! 4. When connected: retain the joined access point, read the sensors,
//!    publish, tear the link down
//! 5. Power the radio off and deep sleep for a fixed duration
//!
//! The retained record is written only after a connection is confirmed, and
//! before anything else can fail, so an interrupted cycle still leaves an
//! accurate fast-join seed. No error leaves the cycle: every failure ends up
//! in the [`CycleReport`].

use core::time::Duration;

use embedded_hal_async::delay::DelayNs;
use plant_node_hal::{
    DeepSleep, NetworkJoin, RetentionMemory, SensorReading, SensorSource, TelemetryPublisher,
};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::policy::{self, AttemptState};
use crate::store::PersistentStore;
use crate::strategy::{self, JoinPlan};
use crate::telemetry;

/// How a wake cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Every message was handed to the broker session
    Published,
    /// Connected, but the broker session or a publish failed
    PublishFailed,
    /// No connection before the abandon threshold
    Abandoned,
}

/// Summary of one wake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Join plan chosen from the retained record
    pub plan: JoinPlan,
    /// How the cycle ended
    pub outcome: CycleOutcome,
    /// Ticks counted by the retry policy
    pub retries: u32,
    /// Whether a fresh record was written to retention memory
    pub stored: bool,
}

/// Wake-cycle controller
///
/// Owns every collaborator for the lifetime of a cycle. Nothing else holds
/// state across a sleep except the retention memory behind the store.
pub struct DutyCycle<M, N, S, P, D, Z> {
    store: PersistentStore<M>,
    network: N,
    sensors: S,
    publisher: P,
    delay: D,
    sleeper: Z,
    config: NodeConfig,
}

impl<M, N, S, P, D, Z> DutyCycle<M, N, S, P, D, Z>
where
    M: RetentionMemory,
    N: NetworkJoin,
    S: SensorSource,
    P: TelemetryPublisher,
    D: DelayNs,
    Z: DeepSleep,
{
    /// Create a controller from its collaborators
    ///
    /// # Errors
    ///
    /// Returns `NodeError::InvalidConfig` if `config` does not validate.
    pub fn new(
        store: PersistentStore<M>,
        network: N,
        sensors: S,
        publisher: P,
        delay: D,
        sleeper: Z,
        config: NodeConfig,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        Ok(Self {
            store,
            network,
            sensors,
            publisher,
            delay,
            sleeper,
            config,
        })
    }

    /// Run one full wake cycle, then sleep
    ///
    /// On hardware the sleep does not return.
    pub async fn wake(&mut self) -> CycleReport {
        let report = self.run_cycle().await;
        self.sleep().await;
        report
    }

    /// Run steps 1 to 4 of a wake cycle
    pub async fn run_cycle(&mut self) -> CycleReport {
        info!("wake cycle start");
        self.network.power_on().await;

        let plan = strategy::decide(self.store.load());
        let attempt = policy::connect(&mut self.network, &mut self.delay, plan, &self.config).await;
        let retries = attempt.retry_count();

        if attempt.state() != AttemptState::Connected {
            warn!("cycle abandoned, skipping publish");
            return CycleReport {
                plan,
                outcome: CycleOutcome::Abandoned,
                retries,
                stored: false,
            };
        }

        let stored = self.retain_access_point();

        let reading = self.sensors.read().await;
        debug!("sensor reading: {}", reading);

        let outcome = match self.publish(&reading).await {
            Ok(()) => CycleOutcome::Published,
            Err(e) => {
                warn!("publish step failed: {}", e);
                CycleOutcome::PublishFailed
            }
        };

        self.network.teardown().await;
        info!("wake cycle done: {}", outcome);

        CycleReport {
            plan,
            outcome,
            retries,
            stored,
        }
    }

    /// Power the radio off and enter deep sleep for the configured duration
    pub async fn sleep(&mut self) {
        self.network.power_off().await;
        info!("sleeping for {=u64} s", self.config.sleep_secs);
        self.sleeper.deep_sleep(Duration::from_secs(self.config.sleep_secs));
    }

    /// Retention store
    pub fn store_mut(&mut self) -> &mut PersistentStore<M> {
        &mut self.store
    }

    /// Network backend
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Telemetry backend
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Sleep backend
    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Active configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn retain_access_point(&mut self) -> bool {
        let Some(access_point) = self.network.current_access_point() else {
            warn!("joined access point unknown, retained record not updated");
            return false;
        };

        match self.store.store(access_point.channel, access_point.bssid) {
            Ok(_) => true,
            Err(e) => {
                error!("failed to retain {}: {}", access_point, e);
                false
            }
        }
    }

    async fn publish(&mut self, reading: &SensorReading) -> Result<(), NodeError> {
        let messages = telemetry::messages(&self.config.telemetry, reading).map_err(|e| {
            error!("telemetry formatting failed: {}", e);
            NodeError::PublishFailed
        })?;

        self.open_session().await?;

        let mut result = Ok(());
        for (topic, payload) in &messages {
            if self
                .publisher
                .publish(topic.as_str(), payload.as_bytes())
                .await
                .is_err()
            {
                warn!("publish to {} failed", topic.as_str());
                result = Err(NodeError::PublishFailed);
                break;
            }
            debug!("published {} <- {}", topic.as_str(), payload.as_str());
        }

        if self.publisher.close().await.is_err() {
            warn!("broker session close failed");
        }

        result
    }

    async fn open_session(&mut self) -> Result<(), NodeError> {
        let attempts = self.config.publish_connect_attempts;
        for attempt in 1..=attempts {
            if self.publisher.open().await.is_ok() {
                return Ok(());
            }
            warn!("broker connect attempt {=u8}/{=u8} failed", attempt, attempts);
            if attempt < attempts {
                self.delay.delay_ms(self.config.publish_retry_delay_ms).await;
            }
        }
        Err(NodeError::PublishFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_node_hal::{AccessPoint, LinkStatus};

    struct Ram([u8; 16]);

    impl RetentionMemory for Ram {
        type Error = ();

        fn read_block(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), ()> {
            buf.copy_from_slice(self.0.get(offset..offset + buf.len()).ok_or(())?);
            Ok(())
        }

        fn write_block(&mut self, offset: usize, data: &[u8]) -> Result<(), ()> {
            self.0
                .get_mut(offset..offset + data.len())
                .ok_or(())?
                .copy_from_slice(data);
            Ok(())
        }

        fn capacity(&self) -> usize {
            self.0.len()
        }
    }

    struct InstantRadio;

    impl NetworkJoin for InstantRadio {
        async fn power_on(&mut self) {}
        async fn power_off(&mut self) {}
        async fn join_fast(&mut self, _access_point: AccessPoint) {}
        async fn join_full(&mut self) {}
        async fn status(&mut self) -> LinkStatus {
            LinkStatus::Connected
        }
        async fn teardown(&mut self) {}
        fn current_access_point(&mut self) -> Option<AccessPoint> {
            Some(AccessPoint::new(1, [0x11; 6]))
        }
    }

    struct FixedSensors;

    impl SensorSource for FixedSensors {
        async fn read(&mut self) -> SensorReading {
            SensorReading {
                lux: 1.0,
                humidity: 2.0,
                temperature: 3.0,
                soil_moisture: 4,
            }
        }
    }

    struct CountingPublisher {
        published: usize,
    }

    impl TelemetryPublisher for CountingPublisher {
        type Error = ();

        async fn open(&mut self) -> Result<(), ()> {
            Ok(())
        }

        async fn publish(&mut self, _topic: &str, _payload: &[u8]) -> Result<(), ()> {
            self.published += 1;
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    struct SleepCounter(u32);

    impl DeepSleep for SleepCounter {
        fn deep_sleep(&mut self, _duration: Duration) {
            self.0 += 1;
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = NodeConfig {
            poll_interval_ms: 0,
            ..NodeConfig::default()
        };
        let result = DutyCycle::new(
            PersistentStore::new(Ram([0; 16])),
            InstantRadio,
            FixedSensors,
            CountingPublisher { published: 0 },
            NoDelay,
            SleepCounter(0),
            config,
        );
        assert!(matches!(result, Err(NodeError::InvalidConfig)));
    }

    #[test]
    fn test_wake_publishes_and_sleeps() {
        let mut node = DutyCycle::new(
            PersistentStore::new(Ram([0; 16])),
            InstantRadio,
            FixedSensors,
            CountingPublisher { published: 0 },
            NoDelay,
            SleepCounter(0),
            NodeConfig::default(),
        )
        .unwrap();

        let report = embassy_futures::block_on(node.wake());

        assert_eq!(report.plan, JoinPlan::FullJoin);
        assert_eq!(report.outcome, CycleOutcome::Published);
        assert_eq!(report.retries, 0);
        assert!(report.stored);
        assert_eq!(node.publisher().published, telemetry::MESSAGES_PER_CYCLE);
        assert_eq!(node.sleeper().0, 1);

        // Second wake starts from the record written by the first
        let report = embassy_futures::block_on(node.run_cycle());
        assert!(report.plan.is_fast());
    }
}
