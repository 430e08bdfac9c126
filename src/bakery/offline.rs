//! Catch-up for time spent away from the game.

use super::state::{ProgressionModel, AUTO_BAKER_INCOME};

/// Offline income is capped at one week.
pub const MAX_OFFLINE_SECONDS: f64 = 7.0 * 24.0 * 3600.0;

/// What the player earned while away.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OfflineReport {
    pub money_gained: f64,
    pub items_baked: u64,
}

impl OfflineReport {
    pub fn is_empty(&self) -> bool {
        self.money_gained <= 0.0 && self.items_baked == 0
    }
}

/// Flat per-second rate credited while offline, derived from the model
/// rather than the cached `money_per_second`.
pub fn offline_income_rate(model: &ProgressionModel) -> f64 {
    model.passive_income()
}

/// Credit `seconds_elapsed` of absence as one lump sum.
///
/// Income uses `min(seconds_elapsed, max_offline_seconds)`. The baked-items
/// estimate uses the uncapped time. Nothing is simulated per
/// second: milestones and unlocks are not replayed. Non-positive or
/// non-finite input returns an empty report without touching the model.
pub fn apply_offline_progress(
    model: &mut ProgressionModel,
    seconds_elapsed: f64,
    max_offline_seconds: f64,
) -> OfflineReport {
    if !seconds_elapsed.is_finite() || seconds_elapsed <= 0.0 {
        return OfflineReport::default();
    }

    let capped = seconds_elapsed.min(max_offline_seconds);
    let money_gained = (offline_income_rate(model) * capped).floor();

    let auto_baker_income = model.auto_baker_income();
    let items_baked = (auto_baker_income * seconds_elapsed / AUTO_BAKER_INCOME).floor() as u64;

    if money_gained > 0.0 {
        model.earn(money_gained);
    }
    model.total_baked += items_baked;

    if money_gained > 0.0 || items_baked > 0 {
        log::info!(
            "offline for {:.0}s (credited {:.0}s): +{} money, {} items baked",
            seconds_elapsed,
            capped,
            money_gained,
            items_baked
        );
    }

    OfflineReport {
        money_gained,
        items_baked,
    }
}
