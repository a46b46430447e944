//! Reconnect strategy
//!
//! A valid retained record means the channel and BSSID of the last join are
//! probably still right, so association can skip the scan. Anything else
//! goes through full discovery. Staleness is corrected by the fallback in
//! [`policy`](crate::policy).

use plant_node_hal::{AccessPoint, NetworkJoin};

use crate::policy::AttemptState;
use crate::record::PersistentRecord;

/// How the radio should associate this wake cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinPlan {
    /// Associate directly on the cached access point
    FastJoin {
        /// Channel and BSSID from the retained record
        access_point: AccessPoint,
    },
    /// Scan and associate by credentials
    FullJoin,
}

impl JoinPlan {
    /// Check if this plan skips discovery
    pub const fn is_fast(&self) -> bool {
        matches!(self, Self::FastJoin { .. })
    }

    /// State the retry policy starts in for this plan
    pub const fn initial_state(&self) -> AttemptState {
        match self {
            Self::FastJoin { .. } => AttemptState::AwaitingFast,
            Self::FullJoin => AttemptState::AwaitingFull,
        }
    }

    /// Issue the join primitive matching this plan
    pub async fn issue<N: NetworkJoin>(&self, network: &mut N) {
        match *self {
            Self::FastJoin { access_point } => {
                info!("fast join on {}", access_point);
                network.join_fast(access_point).await;
            }
            Self::FullJoin => {
                info!("full join");
                network.join_full().await;
            }
        }
    }
}

/// Choose the join plan for a (possibly absent) retained record
pub fn decide(record: Option<PersistentRecord>) -> JoinPlan {
    match record {
        Some(record) => {
            info!("retained record good");
            JoinPlan::FastJoin {
                access_point: record.access_point(),
            }
        }
        None => {
            info!("retained record bad");
            JoinPlan::FullJoin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record_selects_fast_join() {
        let record = PersistentRecord::seal(6, [1, 2, 3, 4, 5, 6]);
        let plan = decide(Some(record));
        assert_eq!(
            plan,
            JoinPlan::FastJoin {
                access_point: AccessPoint::new(6, [1, 2, 3, 4, 5, 6])
            }
        );
        assert!(plan.is_fast());
        assert_eq!(plan.initial_state(), AttemptState::AwaitingFast);
    }

    #[test]
    fn test_missing_record_selects_full_join() {
        let plan = decide(None);
        assert_eq!(plan, JoinPlan::FullJoin);
        assert!(!plan.is_fast());
        assert_eq!(plan.initial_state(), AttemptState::AwaitingFull);
    }
}
