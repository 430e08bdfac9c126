//! Bakery セーブ/ロード機能。
//!
//! ## バージョニング方針
//!
//! - セーブは単一スロット (`EngineConfig::storage_key`) への上書き。最後の書き込みが勝つ。
//! - 並行してバージョンマーカー (`EngineConfig::version_key`) も書く。
//! - 読み込み時にバージョンが `save_version` と異なっても、警告を出してそのまま読み込む
//!   （マイグレーション処理は持たない）。
//! - `state` の各フィールドは省略可能。存在するフィールドだけがモデルを上書きする
//!   （浅いマージ）。旧バージョンのセーブに無いフィールドは現在値のまま残る。
//!
//! 失敗はすべてこの境界で捕捉してログに出し、`false` / `None` に変換する。
//! 呼び出し側は「デフォルトで続行」として扱えばよい。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{auto_baker_cost_at, Milestone, ProgressionModel, Recipe, Upgrade};
use crate::config::EngineConfig;
use crate::storage::{KeyValueStore, StoreError};
use crate::time::Clock;

/// セーブ処理内部のエラー。公開 API では bool / Option に変換される。
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("save record must be a JSON object")]
    NotAnObject,
    #[error("save record is missing `{0}`")]
    MissingField(&'static str),
    #[error("save record has an unreadable `state`: {0}")]
    BadState(serde_json::Error),
}

/// スロットに書かれるレコード。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// 保存時刻 (epoch ms)。
    pub timestamp: f64,
    pub state: SavedState,
}

/// ProgressionModel のスナップショット。キーはブラウザ版と同じ camelCase。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_money_earned: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_baked: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_recipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes: Option<BTreeMap<String, Recipe>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_bakers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_baker_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_baker_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrades: Option<BTreeMap<String, Upgrade>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers_served: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_satisfaction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestones: Option<BTreeMap<String, Milestone>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_save_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_play_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_play_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_start_time: Option<f64>,
}

impl SavedState {
    /// モデルの全フィールドを抜き出す。
    pub fn from_model(model: &ProgressionModel) -> Self {
        Self {
            money: Some(model.money),
            total_money_earned: Some(model.total_money_earned),
            money_per_second: Some(model.money_per_second),
            total_baked: Some(model.total_baked),
            current_recipe: Some(model.current_recipe.clone()),
            recipes: Some(model.recipes.clone()),
            auto_bakers: Some(model.auto_bakers),
            auto_baker_level: Some(model.auto_baker_level),
            auto_baker_cost: Some(model.auto_baker_cost),
            upgrades: Some(model.upgrades.clone()),
            reputation: Some(model.reputation),
            customers_served: Some(model.customers_served),
            customer_satisfaction: Some(model.customer_satisfaction),
            level: Some(model.level),
            experience: Some(model.experience),
            milestones: Some(model.milestones.clone()),
            last_save_time: Some(model.last_save_time),
            last_play_time: Some(model.last_play_time),
            total_play_time: Some(model.total_play_time),
            game_start_time: Some(model.game_start_time),
        }
    }

    /// 存在するフィールドでモデルを上書きする（浅いマージ）。
    /// マップ（recipes 等）は丸ごと置き換わる。
    pub fn apply_to(&self, model: &mut ProgressionModel) {
        let saved = self;
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(value) = &saved.$field {
                        model.$field = value.clone();
                    }
                )*
            };
        }
        merge!(
            money,
            total_money_earned,
            money_per_second,
            total_baked,
            current_recipe,
            recipes,
            auto_bakers,
            auto_baker_level,
            auto_baker_cost,
            upgrades,
            reputation,
            customers_served,
            customer_satisfaction,
            level,
            experience,
            milestones,
            last_save_time,
            last_play_time,
            total_play_time,
            game_start_time,
        );

        // autoBakerLevel が無い古いセーブでは雇用数をレベルとみなす。
        // そうしないと次の雇用でコストが初期値付近に戻ってしまう。
        if saved.auto_baker_level.is_none() {
            if let Some(hired) = saved.auto_bakers {
                model.auto_baker_level = hired;
                if saved.auto_baker_cost.is_none() {
                    model.auto_baker_cost = auto_baker_cost_at(hired);
                }
            }
        }
    }
}

/// セーブデータをモデルに復元する。`None` なら何もしない。
pub fn restore_state(model: &mut ProgressionModel, state: Option<&SavedState>) {
    if let Some(state) = state {
        state.apply_to(model);
    }
}

/// 最終セーブ時刻だけを読むための軽量ビュー。他のフィールドは無視する。
#[derive(Deserialize)]
struct SaveStamp {
    #[serde(default)]
    timestamp: Option<f64>,
    #[serde(default)]
    state: Option<StampState>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StampState {
    #[serde(default)]
    last_save_time: Option<f64>,
}

/// スロットから読み出したレコード。`version` は欠けていても読み込みを続ける。
struct DecodedRecord {
    version: Option<u32>,
    has_timestamp: bool,
    state: SavedState,
}

/// レコードを寛容に解釈する。捨てるのは `state` が無い・読めない場合だけ。
/// `load` と `import_save` の両方がこれを通るので、インポートできた文字列は必ず読み込める。
fn decode_record(text: &str) -> Result<DecodedRecord, SaveError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let object = value.as_object().ok_or(SaveError::NotAnObject)?;
    let state = object
        .get("state")
        .ok_or(SaveError::MissingField("state"))?;
    let state = SavedState::deserialize(state).map_err(SaveError::BadState)?;
    Ok(DecodedRecord {
        version: object.get("version").and_then(read_version),
        has_timestamp: object.get("timestamp").is_some_and(|t| t.is_number()),
        state,
    })
}

/// `1`、`1.0`、`"1"` をどれもバージョン 1 として読む。
fn read_version(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0 && *v >= 0.0).map(|v| v as u64))
            .and_then(|v| u32::try_from(v).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// インポート文字列の検証。`load` が読めるレコードで、数値の `timestamp` を持つこと。
fn validate_import(text: &str) -> Result<(), SaveError> {
    let record = decode_record(text)?;
    if !record.has_timestamp {
        return Err(SaveError::MissingField("timestamp"));
    }
    Ok(())
}

/// 単一スロットへの永続化ゲートウェイ。
pub struct SaveGateway<S, C> {
    store: S,
    clock: C,
    storage_key: String,
    version_key: String,
    version: u32,
}

impl<S: KeyValueStore, C: Clock> SaveGateway<S, C> {
    pub fn new(store: S, clock: C, config: &EngineConfig) -> Self {
        Self {
            store,
            clock,
            storage_key: config.storage_key.clone(),
            version_key: config.version_key.clone(),
            version: config.save_version,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// `last_save_time` を現在時刻にしてからスロットに書き込む。
    /// 失敗時は `last_save_time` を元に戻し、ログを出して false を返す。
    /// スロットは最後に書くので、失敗時にスロットだけ新しくなることはない。
    pub fn save(&mut self, model: &mut ProgressionModel) -> bool {
        let now = self.clock.now_ms();
        let previous = model.last_save_time;
        model.last_save_time = now;

        match self.write_record(model, now) {
            Ok(()) => {
                log::debug!("saved at {}", now);
                true
            }
            Err(e) => {
                model.last_save_time = previous;
                log::warn!("save failed: {}", e);
                false
            }
        }
    }

    fn write_record(&mut self, model: &ProgressionModel, now: f64) -> Result<(), SaveError> {
        let record = SaveData {
            version: self.version,
            timestamp: now,
            state: SavedState::from_model(model),
        };
        let json = serde_json::to_string(&record)?;
        self.store
            .set(&self.version_key, &self.version.to_string())?;
        self.store.set(&self.storage_key, &json)?;
        Ok(())
    }

    /// スロットを読み込む。無い・壊れている場合は None（新規ゲームになる）。
    /// バージョン不一致（欠落を含む）は警告のみで読み込みを続ける。
    pub fn load(&self) -> Option<SavedState> {
        let json = self.read_slot()?;
        let record = match decode_record(&json) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("save data could not be parsed, starting fresh: {}", e);
                return None;
            }
        };

        if record.version != Some(self.version) {
            log::warn!(
                "save version mismatch (saved={:?}, current={}), loading anyway",
                record.version,
                self.version
            );
        }
        Some(record.state)
    }

    fn read_slot(&self) -> Option<String> {
        match self.store.get(&self.storage_key) {
            Ok(slot) => slot,
            Err(e) => {
                log::warn!("could not read save slot: {}", e);
                None
            }
        }
    }

    /// スロットの生の JSON 文字列。空なら None。
    pub fn export_save(&self) -> Option<String> {
        self.read_slot()
    }

    /// 検証を通った文字列だけをそのままスロットに書く。
    /// 検証に失敗した場合、既存のスロットには触れない。
    pub fn import_save(&mut self, text: &str) -> bool {
        if let Err(e) = validate_import(text) {
            log::warn!("import rejected: {}", e);
            return false;
        }
        match self.store.set(&self.storage_key, text) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("import could not be stored: {}", e);
                false
            }
        }
    }

    /// スロットとバージョンマーカーを削除する。
    pub fn clear_save(&mut self) -> bool {
        let result = self
            .store
            .remove(&self.storage_key)
            .and_then(|()| self.store.remove(&self.version_key));
        match result {
            Ok(()) => true,
            Err(e) => {
                log::warn!("could not clear save: {}", e);
                false
            }
        }
    }

    /// 最終セーブからの経過秒数。セーブが無い・読めない場合は 0。
    pub fn time_since_last_save(&self) -> f64 {
        let Some(json) = self.read_slot() else {
            return 0.0;
        };
        let stamp: SaveStamp = match serde_json::from_str(&json) {
            Ok(s) => s,
            Err(_) => return 0.0,
        };
        let last = stamp
            .state
            .and_then(|s| s.last_save_time)
            .filter(|t| *t > 0.0)
            .or(stamp.timestamp)
            .unwrap_or(0.0);
        if last <= 0.0 {
            return 0.0;
        }
        ((self.clock.now_ms() - last) / 1000.0).max(0.0)
    }
}
