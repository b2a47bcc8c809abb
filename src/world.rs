//! # World モジュール
//!
//! ドローン・弾・ピングの3つのコレクションを所有するワールド集約と、
//! 1ティック分のワールドステップを提供します。
//!
//! ## ワールドステップの処理順序
//!
//! 1. **除去**: 撃破済みドローン、非アクティブな弾・ピングを除去
//! 2. **ドローン更新**: ロスター順に1機ずつ更新し、その場で結果を書き戻す
//! 3. **弾更新**: 追尾・命中判定（このティックに発射された弾も含む）
//! 4. **ピング更新**: 半径の拡大と消滅
//!
//! ドローンは順番に更新されるため、後から更新されるドローンは同じティック内で
//! 先に更新されたドローンの新しい状態（位置・速度・回復後の体力）を参照します。

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::commands::Command;
use crate::models::{
    drone::HEAL_AMOUNT, AgentId, AiState, Drone, Faction, FormationMode, ICombatant, Ping,
    Projectile, ProjectileEndReason, Roster, TickContext, TickOutcome, Vector2D,
};
use crate::scenario::ScenarioConfig;

/// シールドの持続時間（ティック）
pub const SHIELD_DURATION_TICKS: u32 = 180;
/// リーダーのシールド再使用待ち時間（ティック）
pub const SHIELD_COOLDOWN_TICKS: u32 = 600;
/// 初期配置時の散らばり
const SPAWN_JITTER: i32 = 20;
/// 敵リーダーのウェイポイントの散らばり
const ENEMY_WAYPOINT_SPREAD: i32 = 150;

/// 戦闘統計
#[derive(Debug, Clone, Default, Serialize)]
pub struct BattleStats {
    pub shots_fired: u32,
    pub hits: u32,
    pub blocked_hits: u32,
    pub projectiles_lost: u32,
    pub player_losses: u32,
    pub enemy_losses: u32,
    pub health_restored: f64,
    pub shields_activated: u32,
    pub waypoints_set: u32,
    pub state_transitions: u32,
}

/// 描画側に渡すドローンの状態
#[derive(Debug, Clone, Serialize)]
pub struct DroneSnapshot {
    pub id: AgentId,
    pub label: String,
    pub position: Vector2D,
    pub faction: Faction,
    pub squad_id: u32,
    pub is_leader: bool,
    pub is_medic: bool,
    pub health_ratio: f64,
    pub state: AiState,
    pub shielded: bool,
}

/// 描画側に渡すピングの状態
#[derive(Debug, Clone, Serialize)]
pub struct PingSnapshot {
    pub position: Vector2D,
    pub radius: f64,
}

/// 描画側に渡すワールド全体の状態
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub drones: Vec<DroneSnapshot>,
    pub projectiles: Vec<Vector2D>,
    pub pings: Vec<PingSnapshot>,
}

/// ワールド集約
pub struct World {
    pub width: f64,
    pub height: f64,
    /// 隊形計算に使う公称分隊サイズ
    pub squad_size: usize,
    pub formation: FormationMode,
    pub roster: Roster,
    pub projectiles: Vec<Projectile>,
    pub pings: Vec<Ping>,
    pub tick_count: u64,
    pub stats: BattleStats,
    firing_range: f64,
    detection_range: f64,
    next_agent_id: u32,
    rng: StdRng,
}

impl World {
    pub fn new(width: f64, height: f64, squad_size: usize, formation: FormationMode, seed: u64) -> Self {
        Self {
            width,
            height,
            squad_size,
            formation,
            roster: Roster::new(),
            projectiles: Vec::new(),
            pings: Vec::new(),
            tick_count: 0,
            stats: BattleStats::default(),
            firing_range: crate::models::drone::DEFAULT_FIRING_RANGE,
            detection_range: crate::models::drone::DEFAULT_DETECTION_RANGE,
            next_agent_id: 1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// シナリオ設定からワールドを構築し、味方・敵の分隊を配置します
    pub fn from_scenario(config: &ScenarioConfig) -> Self {
        let formation = config.formation_mode();
        if config.squads.formation.parse::<FormationMode>().is_err() {
            warn!(
                formation = %config.squads.formation,
                "FORMATION_UNKNOWN: 不明な隊形のため隊形オフセットなしで実行します"
            );
        }

        let mut world = Self::new(
            config.world.width,
            config.world.height,
            config.squads.drones_per_squad as usize,
            formation,
            config.sim.seed,
        );
        world.firing_range = config.drone_defaults.firing_range;
        world.detection_range = config.drone_defaults.detection_range;

        world.populate_player_squads(config.squads.player_squads, config.squads.drones_per_squad);
        world.populate_enemy_squads(
            config.squads.enemy_squads,
            config.squads.drones_per_enemy_squad,
            config.squads.enemy_start_squad_id,
        );

        info!(
            player_drones = world.live_count(Faction::Player),
            enemy_drones = world.live_count(Faction::Enemy),
            formation = ?world.formation,
            "WORLD_INITIALIZED: ワールドを初期化しました"
        );

        world
    }

    /// ドローンを1機生成してロスターに追加
    ///
    /// 初期速度は各成分 [-1, 1) の一様乱数です。
    pub fn spawn(
        &mut self,
        position: Vector2D,
        squad_id: u32,
        is_leader: bool,
        index_in_squad: usize,
        is_enemy: bool,
    ) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;

        let mut drone = Drone::new(
            id,
            position.wrap(self.width, self.height),
            squad_id,
            is_leader,
            index_in_squad,
            is_enemy,
        );
        drone.set_ranges(self.firing_range, self.detection_range);
        drone.velocity = Vector2D::new(self.rng.gen_range(-1.0..1.0), self.rng.gen_range(-1.0..1.0));
        self.roster.push(drone);
        id
    }

    fn jitter(&mut self, center: Vector2D, spread: i32) -> Vector2D {
        Vector2D::new(
            center.x + self.rng.gen_range(-spread..=spread) as f64,
            center.y + self.rng.gen_range(-spread..=spread) as f64,
        )
    }

    fn populate_player_squads(&mut self, squads: u32, drones_per_squad: u32) {
        for squad_id in 0..squads {
            let column_x = squad_id as f64 * 300.0;
            let start = Vector2D::new(150.0 + column_x, self.height / 2.0);

            let leader_id = self.spawn(start, squad_id, true, 0, false);
            let waypoints = [
                Vector2D::new(100.0 + column_x, 150.0).wrap(self.width, self.height),
                Vector2D::new(100.0 + column_x, self.height - 150.0).wrap(self.width, self.height),
            ];
            if let Some(leader) = self.roster.get_mut(leader_id) {
                leader.label = format!("L{}", squad_id + 1);
                leader.waypoints.extend(waypoints);
            }

            for index in 0..drones_per_squad.saturating_sub(1) as usize {
                let position = self.jitter(start, SPAWN_JITTER);
                let id = self.spawn(position, squad_id, false, index, false);
                if let Some(follower) = self.roster.get_mut(id) {
                    follower.leader = Some(leader_id);
                }
            }
        }
    }

    fn populate_enemy_squads(&mut self, squads: u32, drones_per_squad: u32, start_squad_id: u32) {
        for i in 0..squads {
            let Some(squad_id) = start_squad_id.checked_add(i) else {
                warn!(
                    start_squad_id,
                    remaining = squads - i,
                    "SQUAD_ID_OVERFLOW: 敵分隊IDが範囲外のため残りの分隊を配置しません"
                );
                break;
            };
            let start = Vector2D::new(
                self.rng.gen_range(self.width / 4.0..=self.width * 3.0 / 4.0).floor(),
                self.rng.gen_range(self.height / 4.0..=self.height * 3.0 / 4.0).floor(),
            );

            let leader_id = self.spawn(start, squad_id, true, 0, true);
            let outbound = self.jitter(start, ENEMY_WAYPOINT_SPREAD);
            let inbound = start - (self.jitter(start, ENEMY_WAYPOINT_SPREAD) - start);
            let (width, height) = (self.width, self.height);
            if let Some(leader) = self.roster.get_mut(leader_id) {
                leader.label = format!("EL{}", i + 1);
                leader.waypoints.push(outbound.wrap(width, height));
                leader.waypoints.push(inbound.wrap(width, height));
            }

            for j in 0..drones_per_squad.saturating_sub(1) as usize {
                let position = self.jitter(start, SPAWN_JITTER);
                let id = self.spawn(position, squad_id, false, j, true);
                if let Some(follower) = self.roster.get_mut(id) {
                    follower.label = format!("EF{}-{}", i + 1, j + 1);
                    follower.leader = Some(leader_id);
                }
            }
        }
    }

    /// 1ティック分のワールドステップ
    pub fn step(&mut self) {
        self.prune();
        self.update_drones();
        self.update_projectiles();
        self.update_pings();
        self.tick_count += 1;
    }

    /// 撃破済みドローンと非アクティブな弾・ピングを除去
    fn prune(&mut self) {
        for drone in self.roster.prune_dead() {
            match drone.faction() {
                Faction::Player => self.stats.player_losses += 1,
                Faction::Enemy => self.stats.enemy_losses += 1,
            }
            info!(
                drone = %drone.label,
                agent_id = %drone.id,
                faction = ?drone.faction(),
                squad_id = drone.squad_id,
                position_x = drone.position.x,
                position_y = drone.position.y,
                tick = self.tick_count,
                "DRONE_DESTROYED: ドローンが撃破されました"
            );
        }

        self.projectiles.retain(|p| p.active);
        self.pings.retain(|p| p.active);
    }

    fn update_drones(&mut self) {
        for position in 0..self.roster.len() {
            let Some(current) = self.roster.at(position) else {
                continue;
            };
            if !current.is_alive() {
                continue;
            }

            let mut drone = current.clone();
            let outcome = {
                let ctx = TickContext {
                    roster: &self.roster,
                    squad_size: self.squad_size,
                    formation: self.formation,
                    world_width: self.width,
                    world_height: self.height,
                };
                drone.update(&ctx, &mut self.rng)
            };
            self.roster.replace_at(position, drone);
            self.apply_outcome(outcome);
        }
    }

    /// ドローン更新の副作用（発射・回復）を適用
    fn apply_outcome(&mut self, outcome: TickOutcome) {
        if let Some(projectile) = outcome.projectile {
            self.stats.shots_fired += 1;
            self.projectiles.push(projectile);
        }

        for ally_id in outcome.heal_targets {
            if let Some(ally) = self.roster.get_mut(ally_id) {
                self.stats.health_restored += ally.heal(HEAL_AMOUNT);
            }
        }

        if outcome.transition.is_some() {
            self.stats.state_transitions += 1;
        }
    }

    fn update_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            let target = self.roster.get_mut(projectile.target);
            match projectile.update(target) {
                Some(ProjectileEndReason::Hit) => self.stats.hits += 1,
                Some(ProjectileEndReason::Blocked) => self.stats.blocked_hits += 1,
                Some(ProjectileEndReason::TargetLost) => self.stats.projectiles_lost += 1,
                None => {}
            }
        }
    }

    fn update_pings(&mut self) {
        for ping in &mut self.pings {
            ping.update();
        }
    }

    /// 味方リーダーが分隊にシールドを展開
    ///
    /// 敵リーダー・フォロワー・クールダウン中のリーダーでは何もしません。
    /// フォロワーがいなくてもリーダーのクールダウンは開始されます。
    ///
    /// # 戻り値
    ///
    /// シールドが展開された場合はtrue
    pub fn activate_shield(&mut self, leader_id: AgentId) -> bool {
        let Some(leader) = self.roster.get_alive(leader_id) else {
            return false;
        };
        if !leader.is_leader || leader.is_enemy || leader.shield_timer > 0 {
            debug!(
                leader = %leader.label,
                shield_timer = leader.shield_timer,
                "SHIELD_REJECTED: シールドを展開できません"
            );
            return false;
        }
        let squad_id = leader.squad_id;
        let label = leader.label.clone();

        let mut shielded_count = 0;
        for drone in self.roster.iter_mut() {
            if drone.is_alive() && drone.squad_id == squad_id && !drone.is_leader && !drone.is_enemy {
                drone.shielded = true;
                drone.shield_timer = SHIELD_DURATION_TICKS;
                shielded_count += 1;
            }
        }

        if let Some(leader) = self.roster.get_mut(leader_id) {
            leader.shield_timer = SHIELD_COOLDOWN_TICKS;
        }
        self.stats.shields_activated += 1;

        info!(
            leader = %label,
            squad_id,
            shielded_count,
            tick = self.tick_count,
            "SHIELD_ACTIVATED: 分隊にシールドを展開しました"
        );
        true
    }

    /// リーダーのウェイポイントを1点に置き換え、巡回状態に戻す
    pub fn set_waypoint(&mut self, leader_id: AgentId, point: Vector2D) -> bool {
        let point = point.wrap(self.width, self.height);
        let Some(leader) = self.roster.get_mut(leader_id) else {
            return false;
        };
        if !leader.is_alive() || !leader.is_leader {
            return false;
        }

        leader.waypoints = vec![point];
        leader.current_waypoint = 0;
        leader.state = AiState::Patrol;
        leader.target_enemy = None;
        self.stats.waypoints_set += 1;

        info!(
            leader = %leader.label,
            waypoint_x = point.x,
            waypoint_y = point.y,
            tick = self.tick_count,
            "WAYPOINT_SET: ウェイポイントを設定しました"
        );
        true
    }

    /// 操作コマンドを適用
    pub fn apply_command(&mut self, command: &Command) -> bool {
        match *command {
            Command::ActivateShield { leader } => self.activate_shield(leader),
            Command::SetWaypoint { leader, point } => self.set_waypoint(leader, point),
        }
    }

    pub fn spawn_ping(&mut self, position: Vector2D) {
        self.pings.push(Ping::new(position));
    }

    /// 陣営ごとの生存数
    pub fn live_count(&self, faction: Faction) -> usize {
        self.roster.alive().filter(|d| d.faction() == faction).count()
    }

    /// 相手陣営が全滅しているかどうか
    pub fn is_faction_eliminated(&self, faction: Faction) -> bool {
        self.live_count(faction) == 0
    }

    /// 描画用スナップショット
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick_count,
            drones: self
                .roster
                .alive()
                .map(|d| DroneSnapshot {
                    id: d.id,
                    label: d.label.clone(),
                    position: d.position,
                    faction: d.faction(),
                    squad_id: d.squad_id,
                    is_leader: d.is_leader,
                    is_medic: d.is_medic(),
                    health_ratio: d.health_ratio(),
                    state: d.state,
                    shielded: d.shielded,
                })
                .collect(),
            projectiles: self.projectiles.iter().filter(|p| p.active).map(|p| p.position).collect(),
            pings: self
                .pings
                .iter()
                .filter(|p| p.active)
                .map(|p| PingSnapshot { position: p.position, radius: p.radius })
                .collect(),
        }
    }
}
