//! Bakery session: the idle-progression engine the UI layer drives.
pub mod logic;
pub mod offline;
pub mod save;
mod simulator;
pub mod state;

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::storage::KeyValueStore;
use crate::time::{Clock, IntervalTimer, TickClock};

use logic::TickReport;
use offline::OfflineReport;
use save::{restore_state, SaveGateway};
use state::{ProgressionModel, Stats};

/// Callback invoked once per tick with `{income_this_tick, total_money}`.
pub type TickListener = Box<dyn FnMut(&TickReport)>;

/// A session shared between host callbacks (timer, input, teardown).
pub type SharedBakery<S, C> = Rc<RefCell<Bakery<S, C>>>;

/// What one `advance` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AdvanceReport {
    pub ticks: u32,
    pub income: f64,
    pub saved: bool,
}

/// One running game: the model plus its persistence slot and timers.
///
/// All mutation goes through `&mut self`, so operations never interleave.
/// Every economy operation that can change passive income recalculates
/// `money_per_second` before returning.
pub struct Bakery<S, C> {
    model: ProgressionModel,
    gateway: SaveGateway<S, C>,
    config: EngineConfig,
    tick_clock: TickClock,
    autosave: IntervalTimer,
    fallback_save: IntervalTimer,
    listeners: Vec<TickListener>,
    offline_report: OfflineReport,
}

impl<S: KeyValueStore, C: Clock> Bakery<S, C> {
    /// Load the saved game (or start fresh) and credit time spent offline.
    pub fn initialize(store: S, clock: C, config: EngineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("invalid engine config ({}), using defaults", e);
                EngineConfig::default()
            }
        };

        let gateway = SaveGateway::new(store, clock, &config);
        let now = gateway.now_ms();

        let mut model = ProgressionModel::new(now);
        let saved = gateway.load();
        restore_state(&mut model, saved.as_ref());
        logic::recalculate_money_per_second(&mut model);

        let offline_report = if saved.is_some() {
            offline::apply_offline_progress(
                &mut model,
                gateway.time_since_last_save(),
                config.max_offline_seconds,
            )
        } else {
            log::info!("no save found, starting a new bakery");
            OfflineReport::default()
        };
        model.last_play_time = now;

        let mut tick_clock = TickClock::new(config.tick_interval_ms, config.max_catch_up_ms);
        tick_clock.update(now);

        Self {
            model,
            gateway,
            autosave: IntervalTimer::new(config.autosave_interval_secs),
            fallback_save: IntervalTimer::new(config.fallback_save_interval_secs),
            config,
            tick_clock,
            listeners: Vec::new(),
            offline_report,
        }
    }

    pub fn into_shared(self) -> SharedBakery<S, C> {
        Rc::new(RefCell::new(self))
    }

    // ── Economy ─────────────────────────────────────────────────

    pub fn bake(&mut self, recipe_id: &str) -> bool {
        logic::bake(&mut self.model, recipe_id)
    }

    /// Bake whatever recipe is currently selected.
    pub fn bake_current(&mut self) -> bool {
        let recipe_id = self.model.current_recipe.clone();
        self.bake(&recipe_id)
    }

    pub fn unlock_recipe(&mut self, recipe_id: &str) {
        logic::unlock_recipe(&mut self.model, recipe_id);
        logic::recalculate_money_per_second(&mut self.model);
    }

    pub fn select_recipe(&mut self, recipe_id: &str) -> bool {
        logic::select_recipe(&mut self.model, recipe_id)
    }

    pub fn purchase_upgrade(&mut self, upgrade_id: &str) -> bool {
        let ok = logic::purchase_upgrade(&mut self.model, upgrade_id);
        if ok {
            logic::recalculate_money_per_second(&mut self.model);
        }
        ok
    }

    pub fn upgrade_recipe(&mut self, recipe_id: &str) -> bool {
        let ok = logic::upgrade_recipe(&mut self.model, recipe_id);
        if ok {
            logic::recalculate_money_per_second(&mut self.model);
        }
        ok
    }

    pub fn hire_auto_baker(&mut self) -> bool {
        let ok = logic::hire_auto_baker(&mut self.model);
        if ok {
            logic::recalculate_money_per_second(&mut self.model);
        }
        ok
    }

    pub fn recalculate_money_per_second(&mut self) {
        logic::recalculate_money_per_second(&mut self.model);
    }

    pub fn stats(&self) -> Stats {
        self.model.stats()
    }

    // ── Time ────────────────────────────────────────────────────

    /// Register a callback run after every tick.
    pub fn on_tick(&mut self, listener: impl FnMut(&TickReport) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Feed the current wall-clock time. Runs every whole tick that has
    /// elapsed, notifies listeners, and saves when an autosave timer fires.
    pub fn advance(&mut self, now_ms: f64) -> AdvanceReport {
        let ticks = self.tick_clock.update(now_ms);
        if ticks == 0 {
            return AdvanceReport::default();
        }

        let secs_per_tick = self.config.tick_interval_ms / 1000.0;
        let mut income = 0.0;
        let mut save_due = false;
        for _ in 0..ticks {
            let report = logic::tick(&mut self.model);
            income += report.income_this_tick;
            for listener in &mut self.listeners {
                listener(&report);
            }
            // Both timers advance every tick.
            save_due |= self.autosave.advance(secs_per_tick);
            save_due |= self.fallback_save.advance(secs_per_tick);
        }
        self.model.last_play_time = now_ms;

        let saved = save_due && self.save();
        AdvanceReport {
            ticks,
            income,
            saved,
        }
    }

    /// Best-effort save when the host is shutting down (tab close, process exit).
    pub fn teardown(&mut self) -> bool {
        self.save()
    }

    /// What was credited for the time away when this session started.
    pub fn offline_report(&self) -> OfflineReport {
        self.offline_report
    }

    // ── Persistence ─────────────────────────────────────────────

    pub fn save(&mut self) -> bool {
        self.gateway.save(&mut self.model)
    }

    /// Re-read the slot and merge it onto the current model.
    /// Returns false when there was nothing loadable.
    pub fn load(&mut self) -> bool {
        match self.gateway.load() {
            Some(state) => {
                restore_state(&mut self.model, Some(&state));
                logic::recalculate_money_per_second(&mut self.model);
                true
            }
            None => false,
        }
    }

    pub fn export_save(&self) -> Option<String> {
        self.gateway.export_save()
    }

    /// Store an exported save and switch this session over to it.
    /// The current game is only replaced once the stored slot reads back.
    pub fn import_save(&mut self, text: &str) -> bool {
        if !self.gateway.import_save(text) {
            return false;
        }
        let Some(state) = self.gateway.load() else {
            log::warn!("imported save could not be read back, keeping the current game");
            return false;
        };
        self.model = ProgressionModel::new(self.gateway.now_ms());
        restore_state(&mut self.model, Some(&state));
        logic::recalculate_money_per_second(&mut self.model);
        true
    }

    pub fn clear_save(&mut self) -> bool {
        self.gateway.clear_save()
    }

    /// Wipe the slot and start over. Unconditional: the UI asks for confirmation first.
    pub fn reset(&mut self) -> bool {
        let cleared = self.gateway.clear_save();
        logic::reset_to_defaults(&mut self.model, self.gateway.now_ms());
        logic::recalculate_money_per_second(&mut self.model);
        self.autosave.reset();
        self.fallback_save.reset();
        self.offline_report = OfflineReport::default();
        cleared
    }

    pub fn time_since_last_save(&self) -> f64 {
        self.gateway.time_since_last_save()
    }

    // ── Handles ─────────────────────────────────────────────────

    pub fn model(&self) -> &ProgressionModel {
        &self.model
    }

    /// Direct access for debugging tools and test harnesses.
    pub fn model_mut(&mut self) -> &mut ProgressionModel {
        &mut self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.gateway.store()
    }
}

#[cfg(target_arch = "wasm32")]
impl Bakery<Box<dyn KeyValueStore>, crate::time::SystemClock> {
    /// Session backed by `localStorage`; runs unsaved if storage is unavailable.
    pub fn in_browser(config: EngineConfig) -> Self {
        crate::logging::init();
        let store: Box<dyn KeyValueStore> = match crate::storage::WebStorage::local() {
            Some(storage) => Box::new(storage),
            None => {
                log::warn!("localStorage unavailable, progress will not be saved");
                Box::new(crate::storage::NullStore)
            }
        };
        Self::initialize(store, crate::time::SystemClock, config)
    }
}
