//! Retry/escalation policy
//!
//! One wake cycle polls the link once per tick. Two thresholds bound the
//! wait:
//!
//! - `fast_path_abandon`: a fast join that has not connected by then is
//!   presumed stale; the radio is reset and a full join is issued.
//! - `cycle_abandon`: the cycle gives up, tears the radio down and sleeps.
//!
//! Both count from the start of the cycle. The tick counter is **not** reset
//! on fallback, so the total time spent waiting is bounded by
//! `cycle_abandon` ticks whichever path is taken.
//!
//! [`ConnectionAttempt`] is the pure state machine; [`connect`] drives it
//! against a [`NetworkJoin`] backend.

use embedded_hal_async::delay::DelayNs;
use plant_node_hal::{LinkStatus, NetworkJoin};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::strategy::JoinPlan;

/// Default tick count before a fast join falls back to a full join
pub const DEFAULT_FAST_PATH_ABANDON: u32 = 100;

/// Default tick count before the cycle is abandoned
pub const DEFAULT_CYCLE_ABANDON: u32 = 300;

/// Escalation thresholds, in ticks from the start of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thresholds {
    fast_path_abandon: u32,
    cycle_abandon: u32,
}

impl Thresholds {
    /// Create validated thresholds
    ///
    /// # Errors
    ///
    /// Returns `NodeError::InvalidConfig` unless
    /// `0 < fast_path_abandon < cycle_abandon`.
    pub const fn new(fast_path_abandon: u32, cycle_abandon: u32) -> Result<Self, NodeError> {
        if fast_path_abandon == 0 || fast_path_abandon >= cycle_abandon {
            return Err(NodeError::InvalidConfig);
        }
        Ok(Self {
            fast_path_abandon,
            cycle_abandon,
        })
    }

    /// Tick count at which a fast join falls back to a full join
    pub const fn fast_path_abandon(&self) -> u32 {
        self.fast_path_abandon
    }

    /// Tick count at which the cycle is abandoned
    pub const fn cycle_abandon(&self) -> u32 {
        self.cycle_abandon
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            fast_path_abandon: DEFAULT_FAST_PATH_ABANDON,
            cycle_abandon: DEFAULT_CYCLE_ABANDON,
        }
    }
}

/// Connection attempt state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttemptState {
    /// Waiting on a fast join
    AwaitingFast,
    /// Waiting on a full join
    AwaitingFull,
    /// Link is up (terminal)
    Connected,
    /// Gave up for this cycle (terminal)
    Abandoned,
}

impl AttemptState {
    /// Check if no further transition can happen this cycle
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Connected | Self::Abandoned)
    }
}

/// Action the driver must take after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Sleep one poll interval and sample again
    Wait,
    /// Reset the radio and issue a full join
    FallBackToFull,
    /// Link is up
    Connected,
    /// Tear the radio down and end the cycle
    Abandon,
}

/// Retry/escalation state machine for one wake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionAttempt {
    state: AttemptState,
    retry_count: u32,
    thresholds: Thresholds,
}

impl ConnectionAttempt {
    /// Start an attempt in `initial` state with no ticks counted
    pub const fn new(initial: AttemptState, thresholds: Thresholds) -> Self {
        Self {
            state: initial,
            retry_count: 0,
            thresholds,
        }
    }

    /// Current state
    pub const fn state(&self) -> AttemptState {
        self.state
    }

    /// Ticks counted since the start of the cycle
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Feed one link status sample into the state machine
    ///
    /// A connected sample ends the attempt. Otherwise the tick counter is
    /// advanced and checked against the abandon threshold first, then the
    /// fallback threshold. Terminal states ignore further samples.
    pub fn observe(&mut self, status: LinkStatus) -> Step {
        match self.state {
            AttemptState::Connected => return Step::Connected,
            AttemptState::Abandoned => return Step::Abandon,
            AttemptState::AwaitingFast | AttemptState::AwaitingFull => {}
        }

        if status.is_connected() {
            self.state = AttemptState::Connected;
            return Step::Connected;
        }

        self.retry_count = self.retry_count.saturating_add(1);

        if self.retry_count >= self.thresholds.cycle_abandon {
            self.state = AttemptState::Abandoned;
            Step::Abandon
        } else if self.state == AttemptState::AwaitingFast
            && self.retry_count >= self.thresholds.fast_path_abandon
        {
            self.state = AttemptState::AwaitingFull;
            Step::FallBackToFull
        } else {
            Step::Wait
        }
    }
}

/// Drive one connection attempt to a terminal state
///
/// Issues the join for `plan`, then samples the link once per poll interval
/// until it connects or the cycle is abandoned. On fallback the radio is
/// reset (teardown, power off, power on) before the full join. On abandon the
/// radio is torn down and powered off before returning.
///
/// # Arguments
///
/// * `network` - Radio join primitives
/// * `delay` - Async delay used for the poll interval and settle pauses
/// * `plan` - Join plan chosen from the retained record
/// * `config` - Poll interval, thresholds and settle times
///
/// # Returns
///
/// The attempt in state `Connected` or `Abandoned`, with the tick count.
pub async fn connect<N, D>(
    network: &mut N,
    delay: &mut D,
    plan: JoinPlan,
    config: &NodeConfig,
) -> ConnectionAttempt
where
    N: NetworkJoin,
    D: DelayNs,
{
    let mut attempt = ConnectionAttempt::new(plan.initial_state(), config.thresholds);
    plan.issue(network).await;

    loop {
        let status = network.status().await;
        match attempt.observe(status) {
            Step::Connected => {
                info!("connected after {=u32} ticks", attempt.retry_count());
                return attempt;
            }
            Step::Wait => {}
            Step::FallBackToFull => {
                warn!(
                    "fast join timed out after {=u32} ticks, falling back to full join",
                    attempt.retry_count()
                );
                reset_radio(network, delay, config.reset_settle_ms).await;
                JoinPlan::FullJoin.issue(network).await;
            }
            Step::Abandon => {
                warn!(
                    "no connection after {=u32} ticks: {}",
                    attempt.retry_count(),
                    NodeError::ConnectionTimeout
                );
                network.teardown().await;
                delay.delay_ms(config.abandon_settle_ms).await;
                network.power_off().await;
                return attempt;
            }
        }
        delay.delay_ms(config.poll_interval_ms).await;
    }
}

async fn reset_radio<N: NetworkJoin, D: DelayNs>(network: &mut N, delay: &mut D, settle_ms: u32) {
    network.teardown().await;
    delay.delay_ms(settle_ms).await;
    network.power_off().await;
    delay.delay_ms(settle_ms).await;
    network.power_on().await;
    delay.delay_ms(settle_ms).await;
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use embassy_futures::block_on;
    use plant_node_hal::AccessPoint;
    use std::vec::Vec;

    fn thresholds() -> Thresholds {
        Thresholds::new(100, 300).unwrap()
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::new(100, 300).is_ok());
        assert_eq!(Thresholds::new(0, 300), Err(NodeError::InvalidConfig));
        assert_eq!(Thresholds::new(300, 300), Err(NodeError::InvalidConfig));
        assert_eq!(Thresholds::new(301, 300), Err(NodeError::InvalidConfig));
    }

    #[test]
    fn test_connected_sample_ends_attempt() {
        let mut attempt = ConnectionAttempt::new(AttemptState::AwaitingFull, thresholds());
        assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::Wait);
        assert_eq!(attempt.observe(LinkStatus::Connected), Step::Connected);
        assert_eq!(attempt.state(), AttemptState::Connected);
        assert_eq!(attempt.retry_count(), 1);
    }

    #[test]
    fn test_fast_path_fallback_at_threshold() {
        let mut attempt = ConnectionAttempt::new(AttemptState::AwaitingFast, thresholds());
        for _ in 0..99 {
            assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::Wait);
        }
        assert_eq!(attempt.retry_count(), 99);
        assert_eq!(attempt.state(), AttemptState::AwaitingFast);

        assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::FallBackToFull);
        assert_eq!(attempt.state(), AttemptState::AwaitingFull);
        assert_eq!(attempt.retry_count(), 100);
    }

    #[test]
    fn test_retry_count_survives_fallback() {
        let mut attempt = ConnectionAttempt::new(AttemptState::AwaitingFast, thresholds());
        let mut fallbacks = 0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            match attempt.observe(LinkStatus::Disconnected) {
                Step::FallBackToFull => fallbacks += 1,
                Step::Abandon => break,
                Step::Wait => {}
                Step::Connected => panic!("never connected"),
            }
        }
        assert_eq!(fallbacks, 1);
        assert_eq!(ticks, 300);
        assert_eq!(attempt.state(), AttemptState::Abandoned);
    }

    #[test]
    fn test_full_join_does_not_fall_back() {
        let mut attempt = ConnectionAttempt::new(AttemptState::AwaitingFull, thresholds());
        for _ in 0..299 {
            assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::Wait);
        }
        assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::Abandon);
        assert_eq!(attempt.retry_count(), 300);
    }

    #[test]
    fn test_terminal_states_ignore_samples() {
        let mut attempt = ConnectionAttempt::new(AttemptState::AwaitingFull, thresholds());
        attempt.observe(LinkStatus::Connected);
        assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::Connected);
        assert_eq!(attempt.retry_count(), 0);

        let tight = Thresholds::new(1, 2).unwrap();
        let mut attempt = ConnectionAttempt::new(AttemptState::AwaitingFull, tight);
        attempt.observe(LinkStatus::Disconnected);
        assert_eq!(attempt.observe(LinkStatus::Disconnected), Step::Abandon);
        assert_eq!(attempt.observe(LinkStatus::Connected), Step::Abandon);
        assert_eq!(attempt.state(), AttemptState::Abandoned);
        assert!(attempt.state().is_terminal());
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        PowerOn,
        PowerOff,
        JoinFast,
        JoinFull,
        Teardown,
    }

    struct ScriptedRadio {
        calls: Vec<Call>,
        samples: u32,
        connect_on_sample: Option<u32>,
    }

    impl NetworkJoin for ScriptedRadio {
        async fn power_on(&mut self) {
            self.calls.push(Call::PowerOn);
        }

        async fn power_off(&mut self) {
            self.calls.push(Call::PowerOff);
        }

        async fn join_fast(&mut self, _access_point: AccessPoint) {
            self.calls.push(Call::JoinFast);
        }

        async fn join_full(&mut self) {
            self.calls.push(Call::JoinFull);
        }

        async fn status(&mut self) -> LinkStatus {
            self.samples += 1;
            match self.connect_on_sample {
                Some(n) if self.samples >= n => LinkStatus::Connected,
                _ => LinkStatus::Disconnected,
            }
        }

        async fn teardown(&mut self) {
            self.calls.push(Call::Teardown);
        }

        fn current_access_point(&mut self) -> Option<AccessPoint> {
            None
        }
    }

    struct CountingDelay {
        total_ms: u64,
    }

    impl DelayNs for CountingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_ms += u64::from(ns) / 1_000_000;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.total_ms += u64::from(ms);
        }
    }

    fn fast_plan() -> JoinPlan {
        JoinPlan::FastJoin {
            access_point: AccessPoint::new(6, [0xaa; 6]),
        }
    }

    #[test]
    fn test_connect_fast_join_success() {
        let mut radio = ScriptedRadio {
            calls: Vec::new(),
            samples: 0,
            connect_on_sample: Some(3),
        };
        let mut delay = CountingDelay { total_ms: 0 };
        let config = NodeConfig::default();

        let attempt = block_on(connect(&mut radio, &mut delay, fast_plan(), &config));

        assert_eq!(attempt.state(), AttemptState::Connected);
        assert_eq!(attempt.retry_count(), 2);
        assert_eq!(radio.calls, [Call::JoinFast]);
        assert_eq!(delay.total_ms, 2 * 50);
    }

    #[test]
    fn test_connect_falls_back_then_connects() {
        let mut radio = ScriptedRadio {
            calls: Vec::new(),
            samples: 0,
            connect_on_sample: Some(150),
        };
        let mut delay = CountingDelay { total_ms: 0 };
        let config = NodeConfig::default();

        let attempt = block_on(connect(&mut radio, &mut delay, fast_plan(), &config));

        assert_eq!(attempt.state(), AttemptState::Connected);
        assert_eq!(attempt.retry_count(), 149);
        assert_eq!(
            radio.calls,
            [
                Call::JoinFast,
                Call::Teardown,
                Call::PowerOff,
                Call::PowerOn,
                Call::JoinFull
            ]
        );
        assert_eq!(delay.total_ms, 149 * 50 + 3 * 10);
    }

    #[test]
    fn test_connect_abandons_unreachable_network() {
        let mut radio = ScriptedRadio {
            calls: Vec::new(),
            samples: 0,
            connect_on_sample: None,
        };
        let mut delay = CountingDelay { total_ms: 0 };
        let config = NodeConfig::default();

        let attempt = block_on(connect(&mut radio, &mut delay, JoinPlan::FullJoin, &config));

        assert_eq!(attempt.state(), AttemptState::Abandoned);
        assert_eq!(attempt.retry_count(), 300);
        assert_eq!(radio.samples, 300);
        assert_eq!(radio.calls, [Call::JoinFull, Call::Teardown, Call::PowerOff]);
        assert_eq!(delay.total_ms, 299 * 50 + 1);
    }
}
