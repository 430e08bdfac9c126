//! Bakery game state definitions.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Income per second contributed by each hired auto-baker.
pub const AUTO_BAKER_INCOME: f64 = 5.0;
/// Price of the first auto-baker.
pub const AUTO_BAKER_BASE_COST: f64 = 50.0;
/// Cost growth per hire, for both auto-bakers and recipe upgrades.
pub const COST_GROWTH: f64 = 1.15;
/// Production growth per recipe level.
pub const RECIPE_LEVEL_GROWTH: f64 = 1.2;
/// Cost growth per upgrade level.
pub const UPGRADE_COST_GROWTH: f64 = 1.1;
/// Share of a leveled recipe's production earned passively, per level.
pub const RECIPE_PASSIVE_SHARE: f64 = 0.1;
/// Money granted (once) when a milestone completes.
pub const MILESTONE_BONUS: f64 = 50.0;

/// Price of the next auto-baker once `level` have been hired: `ceil(50 * 1.15^level)`.
pub fn auto_baker_cost_at(level: u32) -> f64 {
    (AUTO_BAKER_BASE_COST * COST_GROWTH.powi(level as i32)).ceil()
}

/// Something the player can bake.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub base_production: f64,
    /// Money credited per bake.
    pub current_production: f64,
    pub unlocked: bool,
    pub level: u32,
    pub bake_count: u64,
    /// Lifetime production, manual plus passive bookkeeping.
    pub total_production: f64,
    pub upgrade_cost: f64,
}

impl Recipe {
    pub fn new(id: &str, name: &str, icon: &str, base_production: f64, upgrade_cost: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            base_production,
            current_production: base_production.ceil(),
            unlocked: false,
            level: 0,
            bake_count: 0,
            total_production: 0.0,
            upgrade_cost,
        }
    }

    /// `ceil(base * 1.2^level)`
    pub fn production_at_level(&self, level: u32) -> f64 {
        (self.base_production * RECIPE_LEVEL_GROWTH.powi(level as i32)).ceil()
    }

    /// Passive income this recipe feeds into money-per-second.
    /// Zero while locked or still at level 0.
    pub fn passive_income(&self) -> f64 {
        if self.unlocked && self.level > 0 {
            self.current_production * self.level as f64 * RECIPE_PASSIVE_SHARE
        } else {
            0.0
        }
    }
}

/// Which part of the bakery an upgrade improves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Production,
    /// Declared but not yet consumed by any formula.
    Capacity,
    /// Declared but not yet consumed by any formula.
    Reputation,
}

/// A purchasable, levelled bakery upgrade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub max_level: u32,
    pub base_cost: f64,
    pub current_cost: f64,
    /// Multiplier per level, always > 1.
    pub bonus: f64,
    #[serde(rename = "type")]
    pub kind: UpgradeKind,
}

impl Upgrade {
    pub fn new(
        id: &str,
        name: &str,
        kind: UpgradeKind,
        base_cost: f64,
        bonus: f64,
        max_level: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: 0,
            max_level,
            base_cost,
            current_cost: base_cost.ceil(),
            bonus,
            kind,
        }
    }

    /// `ceil(base_cost * 1.1^level)`
    pub fn cost_at_level(&self, level: u32) -> f64 {
        (self.base_cost * UPGRADE_COST_GROWTH.powi(level as i32)).ceil()
    }

    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }
}

/// A one-way achievement flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<f64>,
}

/// What a milestone threshold is compared against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MilestoneMetric {
    TotalBaked,
    TotalMoneyEarned,
}

/// Fixed milestone table: (id, metric, default threshold).
pub const MILESTONE_RULES: &[(&str, MilestoneMetric, f64)] = &[
    ("firstBake", MilestoneMetric::TotalBaked, 1.0),
    ("hundredBakes", MilestoneMetric::TotalBaked, 100.0),
    ("thousandMoney", MilestoneMetric::TotalMoneyEarned, 1_000.0),
];

/// Metric and default threshold for a milestone id, if the id is known.
pub fn milestone_rule(id: &str) -> Option<(MilestoneMetric, f64)> {
    MILESTONE_RULES
        .iter()
        .find(|(rule_id, _, _)| *rule_id == id)
        .map(|(_, metric, threshold)| (*metric, *threshold))
}

/// The authoritative game state.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressionModel {
    pub money: f64,
    /// Never decreases.
    pub total_money_earned: f64,
    /// Cached passive rate; only `logic::recalculate_money_per_second` writes it.
    pub money_per_second: f64,
    /// Never decreases.
    pub total_baked: u64,
    pub current_recipe: String,
    pub recipes: BTreeMap<String, Recipe>,
    pub auto_bakers: u32,
    pub auto_baker_level: u32,
    pub auto_baker_cost: f64,
    pub upgrades: BTreeMap<String, Upgrade>,
    pub reputation: f64,
    pub customers_served: u64,
    pub customer_satisfaction: f64,
    pub level: u32,
    pub experience: f64,
    pub milestones: BTreeMap<String, Milestone>,
    /// Epoch ms of the last successful save (0 = never).
    pub last_save_time: f64,
    /// Epoch ms of the last tick the session ran.
    pub last_play_time: f64,
    /// Seconds of active play, one per tick.
    pub total_play_time: f64,
    pub game_start_time: f64,
}

impl ProgressionModel {
    /// Fresh game started at `now_ms`.
    pub fn new(now_ms: f64) -> Self {
        Self {
            money: 0.0,
            total_money_earned: 0.0,
            money_per_second: 0.0,
            total_baked: 0,
            current_recipe: "cookie".into(),
            recipes: create_recipes(),
            auto_bakers: 0,
            auto_baker_level: 0,
            auto_baker_cost: AUTO_BAKER_BASE_COST,
            upgrades: create_upgrades(),
            reputation: 0.0,
            customers_served: 0,
            customer_satisfaction: 100.0,
            level: 1,
            experience: 0.0,
            milestones: create_milestones(),
            last_save_time: 0.0,
            last_play_time: now_ms,
            total_play_time: 0.0,
            game_start_time: now_ms,
        }
    }

    /// Flat passive income: auto-bakers plus every unlocked, leveled recipe.
    pub fn passive_income(&self) -> f64 {
        self.auto_baker_income() + self.recipe_passive_income()
    }

    pub fn auto_baker_income(&self) -> f64 {
        self.auto_bakers as f64 * AUTO_BAKER_INCOME
    }

    pub fn recipe_passive_income(&self) -> f64 {
        self.recipes.values().map(Recipe::passive_income).sum()
    }

    /// Credit earned money to both the wallet and the lifetime total.
    pub fn earn(&mut self, amount: f64) {
        self.money += amount;
        self.total_money_earned += amount;
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        self.money >= cost
    }

    /// Read-only summary for the stats panel.
    pub fn stats(&self) -> Stats {
        Stats {
            money: self.money,
            total_money_earned: self.total_money_earned,
            money_per_second: self.money_per_second,
            total_baked: self.total_baked,
            auto_bakers: self.auto_bakers,
            auto_baker_cost: self.auto_baker_cost,
            recipes_unlocked: self.recipes.values().filter(|r| r.unlocked).count(),
            recipes_total: self.recipes.len(),
            milestones_completed: self.milestones.values().filter(|m| m.completed).count(),
            milestones_total: self.milestones.len(),
            reputation: self.reputation,
            level: self.level,
            total_play_time: self.total_play_time,
        }
    }
}

/// Snapshot returned by `getStats`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub money: f64,
    pub total_money_earned: f64,
    pub money_per_second: f64,
    pub total_baked: u64,
    pub auto_bakers: u32,
    pub auto_baker_cost: f64,
    pub recipes_unlocked: usize,
    pub recipes_total: usize,
    pub milestones_completed: usize,
    pub milestones_total: usize,
    pub reputation: f64,
    pub level: u32,
    pub total_play_time: f64,
}

fn create_recipes() -> BTreeMap<String, Recipe> {
    let mut cookie = Recipe::new("cookie", "Cookie", "🍪", 11.0, 50.0);
    cookie.unlocked = true;
    [
        cookie,
        Recipe::new("cupcake", "Cupcake", "🧁", 25.0, 150.0),
        Recipe::new("bread", "Bread", "🍞", 60.0, 400.0),
        Recipe::new("cake", "Cake", "🎂", 150.0, 1_000.0),
        Recipe::new("pie", "Pie", "🥧", 400.0, 3_000.0),
    ]
    .into_iter()
    .map(|r| (r.id.clone(), r))
    .collect()
}

fn create_upgrades() -> BTreeMap<String, Upgrade> {
    [
        Upgrade::new("betterOven", "Better Oven", UpgradeKind::Production, 100.0, 1.05, 10),
        Upgrade::new("biggerKitchen", "Bigger Kitchen", UpgradeKind::Capacity, 500.0, 1.1, 5),
        Upgrade::new("localFame", "Local Fame", UpgradeKind::Reputation, 1_000.0, 1.1, 5),
    ]
    .into_iter()
    .map(|u| (u.id.clone(), u))
    .collect()
}

fn create_milestones() -> BTreeMap<String, Milestone> {
    MILESTONE_RULES
        .iter()
        .map(|(id, _, threshold)| {
            (
                id.to_string(),
                Milestone {
                    id: id.to_string(),
                    completed: false,
                    requirement: Some(*threshold),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_model_defaults() {
        let model = ProgressionModel::new(1_000.0);
        assert_eq!(model.money, 0.0);
        assert_eq!(model.total_baked, 0);
        assert_eq!(model.auto_baker_cost, 50.0);
        assert_eq!(model.current_recipe, "cookie");
        assert_eq!(model.game_start_time, 1_000.0);
        assert_eq!(model.recipes.len(), 5);
        assert_eq!(model.upgrades.len(), 3);
        assert_eq!(model.milestones.len(), 3);
    }

    #[test]
    fn only_cookie_starts_unlocked() {
        let model = ProgressionModel::new(0.0);
        let unlocked: Vec<&str> = model
            .recipes
            .values()
            .filter(|r| r.unlocked)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(unlocked, vec!["cookie"]);
    }

    #[test]
    fn recipe_production_curve() {
        let recipe = Recipe::new("x", "X", "?", 10.0, 10.0);
        assert_eq!(recipe.production_at_level(0), 10.0);
        assert_eq!(recipe.production_at_level(1), 12.0);
        assert_eq!(recipe.production_at_level(2), 15.0); // 14.4 -> 15
    }

    #[test]
    fn upgrade_cost_curve() {
        let upgrade = Upgrade::new("u", "U", UpgradeKind::Production, 100.0, 1.05, 10);
        assert_eq!(upgrade.current_cost, 100.0);
        assert_eq!(upgrade.cost_at_level(1), 111.0); // 110.00000000000001 -> 111
        assert_eq!(upgrade.cost_at_level(2), 122.0); // 121.00000000000001 -> 122
    }

    #[test]
    fn passive_income_ignores_locked_and_unleveled() {
        let mut model = ProgressionModel::new(0.0);
        model.auto_bakers = 2;
        assert_eq!(model.passive_income(), 10.0);

        // Leveled but locked: still nothing
        let cake = model.recipes.get_mut("cake").unwrap();
        cake.level = 3;
        assert_eq!(model.passive_income(), 10.0);

        let cookie = model.recipes.get_mut("cookie").unwrap();
        cookie.level = 1;
        cookie.current_production = 14.0;
        assert!((model.passive_income() - 11.4).abs() < 1e-9);
    }

    #[test]
    fn milestone_rules_lookup() {
        assert_eq!(
            milestone_rule("hundredBakes"),
            Some((MilestoneMetric::TotalBaked, 100.0))
        );
        assert_eq!(milestone_rule("nope"), None);
    }

    #[test]
    fn stats_counts() {
        let mut model = ProgressionModel::new(0.0);
        model.milestones.get_mut("firstBake").unwrap().completed = true;
        let stats = model.stats();
        assert_eq!(stats.recipes_unlocked, 1);
        assert_eq!(stats.recipes_total, 5);
        assert_eq!(stats.milestones_completed, 1);
        assert_eq!(stats.milestones_total, 3);
    }

    #[test]
    fn upgrade_kind_serializes_lowercase_under_type() {
        let upgrade = Upgrade::new("u", "U", UpgradeKind::Capacity, 1.0, 1.1, 1);
        let json = serde_json::to_value(&upgrade).unwrap();
        assert_eq!(json["type"], "capacity");
        assert_eq!(json["maxLevel"], 1);
    }
}
