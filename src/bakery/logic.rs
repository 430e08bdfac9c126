//! Bakery economy rules and the per-second tick: pure functions over
//! `ProgressionModel`, fully testable.

use super::state::{
    auto_baker_cost_at, milestone_rule, MilestoneMetric, ProgressionModel, UpgradeKind,
    COST_GROWTH, MILESTONE_BONUS,
};

/// What one tick credited, delivered to tick listeners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub income_this_tick: f64,
    pub total_money: f64,
}

/// Advance one fixed one-second tick.
///
/// Only the cached `money_per_second` reaches the wallet. Recipe passive
/// production is also added to each recipe's `total_production`, but that is
/// bookkeeping: the same income is already part of `money_per_second`.
pub fn tick(model: &mut ProgressionModel) -> TickReport {
    let income = model.money_per_second;
    model.earn(income);

    for recipe in model.recipes.values_mut() {
        let passive = recipe.passive_income();
        if passive > 0.0 {
            recipe.total_production += passive;
        }
    }
    model.total_play_time += 1.0;

    TickReport {
        income_this_tick: income,
        total_money: model.money,
    }
}

/// Manual bake. Returns false (and changes nothing) for unknown or locked recipes.
pub fn bake(model: &mut ProgressionModel, recipe_id: &str) -> bool {
    let produced = match model.recipes.get_mut(recipe_id) {
        Some(recipe) if recipe.unlocked => {
            recipe.bake_count += 1;
            recipe.total_production += recipe.current_production;
            recipe.current_production
        }
        _ => return false,
    };

    model.earn(produced);
    model.total_baked += 1;
    check_milestones(model);
    true
}

/// Unlock a recipe. Unknown ids and already-unlocked recipes are left alone.
pub fn unlock_recipe(model: &mut ProgressionModel, recipe_id: &str) {
    if let Some(recipe) = model.recipes.get_mut(recipe_id) {
        if !recipe.unlocked {
            recipe.unlocked = true;
            log::info!("recipe unlocked: {}", recipe.name);
        }
    }
}

/// Make an unlocked recipe the one the bake button uses.
pub fn select_recipe(model: &mut ProgressionModel, recipe_id: &str) -> bool {
    match model.recipes.get(recipe_id) {
        Some(recipe) if recipe.unlocked => {
            model.current_recipe = recipe_id.to_string();
            true
        }
        _ => false,
    }
}

/// Buy the next level of an upgrade.
///
/// A production upgrade resets every recipe's `current_production` to
/// `ceil(base_production * bonus^level)` using the upgrade's level, for all
/// recipes alike. Whatever a recipe's own level had set is overwritten.
pub fn purchase_upgrade(model: &mut ProgressionModel, upgrade_id: &str) -> bool {
    let (kind, bonus, level) = {
        let upgrade = match model.upgrades.get_mut(upgrade_id) {
            Some(u) => u,
            None => return false,
        };
        if upgrade.is_maxed() {
            return false;
        }
        let cost = upgrade.current_cost;
        if model.money < cost {
            return false;
        }
        model.money -= cost;
        upgrade.level += 1;
        upgrade.current_cost = upgrade.cost_at_level(upgrade.level);
        log::debug!("upgrade {} -> level {}", upgrade.name, upgrade.level);
        (upgrade.kind, upgrade.bonus, upgrade.level)
    };

    match kind {
        UpgradeKind::Production => {
            let multiplier = bonus.powi(level as i32);
            for recipe in model.recipes.values_mut() {
                recipe.current_production = (recipe.base_production * multiplier).ceil();
            }
        }
        // No formula consumes these yet.
        UpgradeKind::Capacity | UpgradeKind::Reputation => {}
    }
    true
}

/// Level up a single unlocked recipe.
pub fn upgrade_recipe(model: &mut ProgressionModel, recipe_id: &str) -> bool {
    let recipe = match model.recipes.get_mut(recipe_id) {
        Some(r) if r.unlocked => r,
        _ => return false,
    };
    if model.money < recipe.upgrade_cost {
        return false;
    }

    model.money -= recipe.upgrade_cost;
    recipe.level += 1;
    recipe.current_production = recipe.production_at_level(recipe.level);
    recipe.upgrade_cost = (recipe.upgrade_cost * COST_GROWTH).ceil();
    true
}

/// Hire one auto-baker.
///
/// Does not touch `money_per_second`; call [`recalculate_money_per_second`] after.
pub fn hire_auto_baker(model: &mut ProgressionModel) -> bool {
    if model.money < model.auto_baker_cost {
        return false;
    }

    model.money -= model.auto_baker_cost;
    model.auto_bakers += 1;
    model.auto_baker_level += 1;
    // Closed form from the level, not compounded from the stored cost.
    model.auto_baker_cost = auto_baker_cost_at(model.auto_baker_level);
    true
}

/// Recompute the cached passive rate:
/// `auto_bakers * 5 + Σ current_production * level * 0.1` over unlocked, leveled recipes.
pub fn recalculate_money_per_second(model: &mut ProgressionModel) {
    model.money_per_second = model.passive_income();
}

/// Complete every milestone whose threshold is met, paying its bonus once.
pub fn check_milestones(model: &mut ProgressionModel) {
    let ids: Vec<String> = model
        .milestones
        .values()
        .filter(|m| !m.completed)
        .map(|m| m.id.clone())
        .collect();

    for id in ids {
        let Some((metric, default_threshold)) = milestone_rule(&id) else {
            continue;
        };
        let Some(milestone) = model.milestones.get_mut(&id) else {
            continue;
        };
        let threshold = milestone.requirement.unwrap_or(default_threshold);
        let value = match metric {
            MilestoneMetric::TotalBaked => model.total_baked as f64,
            MilestoneMetric::TotalMoneyEarned => model.total_money_earned,
        };
        if value >= threshold {
            milestone.completed = true;
            model.money += MILESTONE_BONUS;
            model.total_money_earned += MILESTONE_BONUS;
            log::info!("milestone completed: {} (+{})", id, MILESTONE_BONUS);
        }
    }
}

/// Throw away all progress. Callers gate this behind player confirmation.
pub fn reset_to_defaults(model: &mut ProgressionModel, now_ms: f64) {
    *model = ProgressionModel::new(now_ms);
    log::info!("progress reset to defaults");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> ProgressionModel {
        ProgressionModel::new(0.0)
    }

    #[test]
    fn first_bake_pays_production_and_milestone_bonus() {
        let mut model = fresh();
        assert!(bake(&mut model, "cookie"));
        assert_eq!(model.total_baked, 1);
        assert!(model.milestones["firstBake"].completed);
        // 11 from the cookie + 50 milestone bonus
        assert_eq!(model.money, 61.0);
        assert_eq!(model.total_money_earned, 61.0);
        assert_eq!(model.recipes["cookie"].bake_count, 1);
        assert_eq!(model.recipes["cookie"].total_production, 11.0);
    }

    #[test]
    fn milestone_bonus_paid_once() {
        let mut model = fresh();
        bake(&mut model, "cookie");
        bake(&mut model, "cookie");
        assert_eq!(model.money, 61.0 + 11.0);
    }

    #[test]
    fn bake_locked_recipe_fails_without_mutation() {
        let mut model = fresh();
        model.money = 5.0;
        let before = model.clone();
        assert!(!bake(&mut model, "cake"));
        assert_eq!(model, before);
    }

    #[test]
    fn bake_unknown_recipe_fails() {
        let mut model = fresh();
        assert!(!bake(&mut model, "croissant"));
        assert_eq!(model.total_baked, 0);
    }

    #[test]
    fn unlock_is_idempotent_and_ignores_unknown() {
        let mut model = fresh();
        unlock_recipe(&mut model, "cake");
        unlock_recipe(&mut model, "cake");
        assert!(model.recipes["cake"].unlocked);
        let before = model.clone();
        unlock_recipe(&mut model, "croissant");
        assert_eq!(model, before);
    }

    #[test]
    fn unlocked_recipe_can_be_baked() {
        let mut model = fresh();
        unlock_recipe(&mut model, "cupcake");
        assert!(bake(&mut model, "cupcake"));
        assert_eq!(model.recipes["cupcake"].bake_count, 1);
    }

    #[test]
    fn select_recipe_requires_unlock() {
        let mut model = fresh();
        assert!(!select_recipe(&mut model, "pie"));
        assert_eq!(model.current_recipe, "cookie");
        unlock_recipe(&mut model, "pie");
        assert!(select_recipe(&mut model, "pie"));
        assert_eq!(model.current_recipe, "pie");
    }

    #[test]
    fn better_oven_from_exactly_enough_money() {
        let mut model = fresh();
        model.money = 100.0;
        assert!(purchase_upgrade(&mut model, "betterOven"));
        assert_eq!(model.money, 0.0);
        let oven = &model.upgrades["betterOven"];
        assert_eq!(oven.level, 1);
        assert_eq!(oven.current_cost, (100.0 * 1.1_f64).ceil());
        for recipe in model.recipes.values() {
            assert_eq!(
                recipe.current_production,
                (recipe.base_production * 1.05).ceil(),
                "{}",
                recipe.id
            );
        }
        assert_eq!(model.recipes["cookie"].current_production, 12.0);
    }

    #[test]
    fn purchase_upgrade_unaffordable_fails() {
        let mut model = fresh();
        model.money = 99.0;
        let before = model.clone();
        assert!(!purchase_upgrade(&mut model, "betterOven"));
        assert_eq!(model, before);
    }

    #[test]
    fn purchase_upgrade_stops_at_max_level() {
        let mut model = fresh();
        model.money = 1e12;
        for _ in 0..10 {
            assert!(purchase_upgrade(&mut model, "betterOven"));
        }
        let money = model.money;
        assert!(!purchase_upgrade(&mut model, "betterOven"));
        assert_eq!(model.upgrades["betterOven"].level, 10);
        assert_eq!(model.money, money);
    }

    #[test]
    fn inert_upgrade_kinds_change_no_production() {
        let mut model = fresh();
        model.money = 10_000.0;
        let productions: Vec<f64> = model.recipes.values().map(|r| r.current_production).collect();
        assert!(purchase_upgrade(&mut model, "biggerKitchen"));
        assert!(purchase_upgrade(&mut model, "localFame"));
        let after: Vec<f64> = model.recipes.values().map(|r| r.current_production).collect();
        assert_eq!(productions, after);
        assert_eq!(model.money, 10_000.0 - 500.0 - 1_000.0);
    }

    #[test]
    fn purchase_unknown_upgrade_fails() {
        let mut model = fresh();
        model.money = 1e9;
        assert!(!purchase_upgrade(&mut model, "goldenWhisk"));
        assert_eq!(model.money, 1e9);
    }

    #[test]
    fn upgrade_recipe_levels_and_inflates_cost() {
        let mut model = fresh();
        model.money = 50.0;
        assert!(upgrade_recipe(&mut model, "cookie"));
        let cookie = &model.recipes["cookie"];
        assert_eq!(model.money, 0.0);
        assert_eq!(cookie.level, 1);
        assert_eq!(cookie.current_production, (11.0 * 1.2_f64).ceil());
        assert_eq!(cookie.upgrade_cost, 58.0); // ceil(57.5)
    }

    #[test]
    fn upgrade_recipe_locked_or_unaffordable_fails() {
        let mut model = fresh();
        model.money = 1e6;
        assert!(!upgrade_recipe(&mut model, "cake"));
        model.money = 49.0;
        assert!(!upgrade_recipe(&mut model, "cookie"));
        assert_eq!(model.recipes["cookie"].level, 0);
    }

    #[test]
    fn recipe_upgrade_then_oven_last_writer_wins() {
        let mut model = fresh();
        model.money = 1_000.0;
        upgrade_recipe(&mut model, "cookie");
        upgrade_recipe(&mut model, "cookie");
        assert_eq!(model.recipes["cookie"].current_production, (11.0 * 1.44_f64).ceil());
        purchase_upgrade(&mut model, "betterOven");
        assert_eq!(model.recipes["cookie"].current_production, 12.0);
        // and back again
        upgrade_recipe(&mut model, "cookie");
        assert_eq!(
            model.recipes["cookie"].current_production,
            (11.0 * 1.2_f64.powi(3)).ceil()
        );
    }

    #[test]
    fn hire_auto_baker_from_fifty() {
        let mut model = fresh();
        model.money = 50.0;
        assert!(hire_auto_baker(&mut model));
        assert_eq!(model.money, 0.0);
        assert_eq!(model.auto_bakers, 1);
        assert_eq!(model.auto_baker_level, 1);
        assert_eq!(model.auto_baker_cost, 58.0);
        // not recalculated automatically
        assert_eq!(model.money_per_second, 0.0);
        recalculate_money_per_second(&mut model);
        assert_eq!(model.money_per_second, 5.0);
    }

    #[test]
    fn hire_auto_baker_unaffordable() {
        let mut model = fresh();
        model.money = 49.99;
        assert!(!hire_auto_baker(&mut model));
        assert_eq!(model.auto_bakers, 0);
        assert_eq!(model.money, 49.99);
    }

    #[test]
    fn money_per_second_formula() {
        let mut model = fresh();
        model.auto_bakers = 3;
        model.money = 1_000.0;
        upgrade_recipe(&mut model, "cookie");
        recalculate_money_per_second(&mut model);
        let cookie = &model.recipes["cookie"];
        let expected = 15.0 + cookie.current_production * 0.1;
        assert!((model.money_per_second - expected).abs() < 1e-9);
    }

    #[test]
    fn tick_credits_only_cached_rate() {
        let mut model = fresh();
        model.money = 1_000.0;
        upgrade_recipe(&mut model, "cookie"); // 14 production, level 1
        model.auto_bakers = 2;
        recalculate_money_per_second(&mut model);
        let rate = model.money_per_second;
        let money = model.money;
        let tracked = model.recipes["cookie"].total_production;

        let report = tick(&mut model);

        assert!((report.income_this_tick - rate).abs() < 1e-9);
        assert!((model.money - (money + rate)).abs() < 1e-9);
        assert_eq!(report.total_money, model.money);
        // bookkeeping grew by the recipe's passive share, money did not grow twice
        assert!((model.recipes["cookie"].total_production - (tracked + 1.4)).abs() < 1e-9);
        assert_eq!(model.total_play_time, 1.0);
    }

    #[test]
    fn tick_does_not_recalculate() {
        let mut model = fresh();
        model.auto_bakers = 4; // rate never recalculated
        let report = tick(&mut model);
        assert_eq!(report.income_this_tick, 0.0);
        assert_eq!(model.money, 0.0);
    }

    #[test]
    fn hundred_bakes_and_thousand_money() {
        let mut model = fresh();
        for _ in 0..100 {
            bake(&mut model, "cookie");
        }
        assert!(model.milestones["hundredBakes"].completed);
        assert!(model.milestones["thousandMoney"].completed);
        // 100 * 11 + 3 bonuses
        assert_eq!(model.total_money_earned, 1_100.0 + 150.0);
    }

    #[test]
    fn completed_milestone_never_reverts() {
        let mut model = fresh();
        bake(&mut model, "cookie");
        model.total_baked = 0; // pathological, but the flag must stay
        check_milestones(&mut model);
        assert!(model.milestones["firstBake"].completed);
    }

    #[test]
    fn custom_requirement_overrides_default_threshold() {
        let mut model = fresh();
        model.milestones.get_mut("firstBake").unwrap().requirement = Some(3.0);
        bake(&mut model, "cookie");
        bake(&mut model, "cookie");
        assert!(!model.milestones["firstBake"].completed);
        bake(&mut model, "cookie");
        assert!(model.milestones["firstBake"].completed);
    }

    #[test]
    fn reset_restores_fresh_game() {
        let mut model = fresh();
        model.money = 1e6;
        hire_auto_baker(&mut model);
        reset_to_defaults(&mut model, 42.0);
        assert_eq!(model, ProgressionModel::new(42.0));
    }
}
