//! # Simulation モジュール
//!
//! ドローン分隊シミュレーションのティック駆動エンジンを提供します。
//!
//! このモジュールは、固定ティック（公称60Hz）でワールドステップを繰り返し呼び出し、
//! シナリオに記述されたクリック操作を所定のティックで適用します。
//! 経過時間はすべてティック数で数え、壁時計には依存しません。
//!
//! ## 主要機能
//!
//! - **シミュレーションループ管理**: 指定ティック数までのステップ実行
//! - **操作スクリプトの再生**: シールド・ウェイポイントのクリック操作を所定ティックで適用
//! - **進行状況の監視**: 生存数と戦闘統計の定期ログ
//!
//! ## 各ティックの処理順序
//!
//! 1. **操作適用**: このティックに予定されたクリック操作
//! 2. **ワールドステップ**: 除去 → ドローン更新 → 弾更新 → ピング更新
//!
//! ## 使用例
//!
//! ```no_run
//! use dronesim::scenario::ScenarioConfig;
//! use dronesim::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/skirmish.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1);
//! engine.initialize()?;
//! engine.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::VecDeque;

use tracing::{debug, info, trace};

use crate::commands::dispatch_click;
use crate::models::{Faction, IAgent, Vector2D, TICKS_PER_SECOND};
use crate::scenario::{CommandConfig, ScenarioConfig};
use crate::world::{BattleStats, World, WorldSnapshot};

/// シミュレーション結果の概要
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub player_survivors: usize,
    pub enemy_survivors: usize,
    pub stats: BattleStats,
}

pub struct SimulationEngine {
    pub max_ticks: u64,
    pub world: World,
    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
    pending_commands: VecDeque<CommandConfig>,
    /// どちらかの陣営が全滅したら終了する
    pub stop_on_elimination: bool,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let world = World::new(
            scenario.world.width,
            scenario.world.height,
            scenario.squads.drones_per_squad as usize,
            scenario.formation_mode(),
            scenario.sim.seed,
        );

        Self {
            max_ticks: scenario.sim.ticks,
            world,
            scenario_config: scenario,
            verbose_level,
            pending_commands: VecDeque::new(),
            stop_on_elimination: false,
        }
    }

    pub fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.scenario_config.validate()?;

        self.world = World::from_scenario(&self.scenario_config);

        let mut commands = self.scenario_config.commands.clone();
        commands.sort_by_key(|c| c.tick);
        self.pending_commands = commands.into();

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  味方ドローン: {}機", self.world.live_count(Faction::Player));
            info!("  敵ドローン: {}機", self.world.live_count(Faction::Enemy));
            info!("  操作スクリプト: {}件", self.pending_commands.len());
        }

        if self.verbose_level > 1 {
            for drone in self.world.roster.iter() {
                debug!(
                    "ドローン初期化: {} (分隊: {}, 位置: {:.0}, {:.0})",
                    drone.get_id(), drone.squad_id, drone.position.x, drone.position.y
                );
            }
        }

        Ok(())
    }

    pub fn run(&mut self) -> Result<SimulationSummary, Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 ===");

        let progress_interval = self.scenario_config.sim.progress_interval;

        while self.world.tick_count < self.max_ticks {
            self.step();

            if self.verbose_level > 2 {
                trace!("ティック: {} (弾: {}発)", self.world.tick_count, self.world.projectiles.len());
            }

            if self.verbose_level > 0 && self.world.tick_count.checked_rem(progress_interval) == Some(0) {
                let progress = (self.world.tick_count as f64 / self.max_ticks as f64) * 100.0;
                info!(
                    "進行状況: {:.1}% ({}/{}ティック) 味方: {}機 敵: {}機",
                    progress,
                    self.world.tick_count,
                    self.max_ticks,
                    self.world.live_count(Faction::Player),
                    self.world.live_count(Faction::Enemy)
                );
            }

            if self.stop_on_elimination {
                if let Some(eliminated) = self.eliminated_faction() {
                    info!(
                        eliminated = ?eliminated,
                        winner = ?eliminated.opposing(),
                        tick = self.world.tick_count,
                        "FACTION_ELIMINATED: 一方の陣営が全滅しました"
                    );
                    break;
                }
            }
        }

        let summary = self.summary();

        info!("=== シミュレーション完了 ===");
        info!(
            "経過: {}ティック ({:.1}秒)",
            summary.ticks,
            summary.ticks as f64 / TICKS_PER_SECOND as f64
        );
        info!("生存: 味方 {}機 / 敵 {}機", summary.player_survivors, summary.enemy_survivors);

        Ok(summary)
    }

    /// 1ティック分の処理
    pub fn step(&mut self) {
        self.apply_due_commands();
        self.world.step();
    }

    fn apply_due_commands(&mut self) {
        let tick = self.world.tick_count;
        while self.pending_commands.front().is_some_and(|c| c.tick <= tick) {
            let Some(command) = self.pending_commands.pop_front() else {
                break;
            };
            let accepted = dispatch_click(&mut self.world, command.kind, Vector2D::new(command.x, command.y));
            debug!(
                tick,
                kind = ?command.kind,
                click_x = command.x,
                click_y = command.y,
                accepted,
                "COMMAND_APPLIED: 操作スクリプトを適用しました"
            );
        }
    }

    /// 全滅した陣営（生存機がいない側）
    ///
    /// 初期状態でどちらかの陣営がいないシナリオでは、その陣営は全滅とはみなしません。
    fn eliminated_faction(&self) -> Option<Faction> {
        let squads = &self.scenario_config.squads;
        if squads.player_squads > 0 && self.world.is_faction_eliminated(Faction::Player) {
            return Some(Faction::Player);
        }
        if squads.enemy_squads > 0 && self.world.is_faction_eliminated(Faction::Enemy) {
            return Some(Faction::Enemy);
        }
        None
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            ticks: self.world.tick_count,
            player_survivors: self.world.live_count(Faction::Player),
            enemy_survivors: self.world.live_count(Faction::Enemy),
            stats: self.world.stats.clone(),
        }
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.world.snapshot()
    }

    /// 戦闘統計を表示
    pub fn print_report(&self) {
        let summary = self.summary();
        let stats = &summary.stats;

        println!("=== 戦闘結果 ===");
        println!(
            "経過: {}ティック ({:.1}秒)",
            summary.ticks,
            summary.ticks as f64 / TICKS_PER_SECOND as f64
        );
        println!("味方生存: {}機 (損失: {}機)", summary.player_survivors, stats.player_losses);
        println!("敵生存: {}機 (損失: {}機)", summary.enemy_survivors, stats.enemy_losses);
        println!();
        println!("=== 戦闘統計 ===");
        println!("発射数: {}発", stats.shots_fired);
        println!("命中数: {}発 (シールド無効化: {}発)", stats.hits, stats.blocked_hits);
        println!("目標消失: {}発", stats.projectiles_lost);
        let accuracy = if stats.shots_fired > 0 {
            (stats.hits + stats.blocked_hits) as f64 / stats.shots_fired as f64 * 100.0
        } else {
            0.0
        };
        println!("到達率: {:.1}%", accuracy);
        println!("回復量: {:.1}", stats.health_restored);
        println!("シールド発動: {}回", stats.shields_activated);
        println!("ウェイポイント設定: {}回", stats.waypoints_set);
        println!("状態遷移: {}回", stats.state_transitions);
    }
}
