//! Weak subjectivity period computation.
//!
//! The period is the number of epochs a node may be offline and still
//! safely sync from a trusted checkpoint. It grows with the validator set
//! size and shrinks as the per-epoch churn allowance grows.

use super::config::WeakSubjectivityConfig;
use shared_types::Epoch;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WeakSubjectivityError {
    #[error("no active validators")]
    NoActiveValidators,

    #[error("validator churn limit is zero")]
    ZeroChurn,

    #[error("balance top-up limit is zero")]
    ZeroTopUps,

    #[error("computed weak subjectivity period is zero")]
    ZeroPeriod,

    #[error("weak subjectivity period {0} does not fit in an epoch number")]
    PeriodOverflow(u128),
}

/// Weak subjectivity period, in epochs, for a validator set.
///
/// `total_active_balance` is in Gwei.
pub fn compute_period(
    active_validator_count: u64,
    total_active_balance: u64,
    slots_per_epoch: u64,
    cfg: &WeakSubjectivityConfig,
) -> Result<u64, WeakSubjectivityError> {
    let mut wsp = u128::from(cfg.min_validator_withdrawability_delay);

    let n = u128::from(active_validator_count);
    if n == 0 {
        return Err(WeakSubjectivityError::NoActiveValidators);
    }

    // Average and maximum effective balance, whole ETH
    let gwei_per_eth = u128::from(cfg.gwei_per_eth.max(1));
    let t = u128::from(total_active_balance) / n / gwei_per_eth;
    let cap = u128::from(cfg.max_effective_balance) / gwei_per_eth;

    let churn = u128::from(
        cfg.min_per_epoch_churn_limit
            .max(active_validator_count / cfg.churn_limit_quotient.max(1)),
    );
    let top_ups = u128::from(slots_per_epoch) * u128::from(cfg.max_deposits);
    let decay = u128::from(cfg.safety_decay);

    if churn == 0 {
        return Err(WeakSubjectivityError::ZeroChurn);
    }
    if top_ups == 0 {
        return Err(WeakSubjectivityError::ZeroTopUps);
    }

    if cap * (200 + 3 * decay) < t * (200 + 12 * decay) {
        let churn_epochs =
            n * (t * (200 + 12 * decay) - cap * (200 + 3 * decay)) / (600 * churn * (2 * t + cap));
        let top_up_epochs = n * (200 + 3 * decay) / (600 * top_ups);
        wsp += churn_epochs.max(top_up_epochs);
    } else if cap > t {
        wsp += 3 * n * decay * t / (200 * top_ups * (cap - t));
    }

    u64::try_from(wsp).map_err(|_| WeakSubjectivityError::PeriodOverflow(wsp))
}

/// Start epoch of the weak subjectivity period containing the finalized epoch.
pub fn latest_ws_epoch(finalized_epoch: Epoch, period: u64) -> Result<Epoch, WeakSubjectivityError> {
    if period == 0 {
        return Err(WeakSubjectivityError::ZeroPeriod);
    }
    Ok(finalized_epoch - finalized_epoch % period)
}
