use rand::Rng;
use tracing::{debug, trace};

use crate::models::{
    common::{AgentId, Faction, Vector2D, AVOID_RADIUS, MAX_HEALTH, MAX_SPEED, NEIGHBOR_RADIUS},
    formation::{formation_offset, FormationMode},
    projectile::Projectile,
    roster::Roster,
    traits::{IAgent, ICombatant, IMovable},
};

/// 既定の射程
pub const DEFAULT_FIRING_RANGE: f64 = 200.0;
/// 既定の探知距離
pub const DEFAULT_DETECTION_RANGE: f64 = 300.0;
/// 射撃間隔（ティック）
pub const FIRE_COOLDOWN_TICKS: u32 = 60;
/// 退避に移行する体力閾値
pub const EVADE_HEALTH_THRESHOLD: f64 = 30.0;
/// 退避時の脅威探索倍率（探知距離に対する）
pub const EVADE_RANGE_FACTOR: f64 = 1.5;
/// ウェイポイント到達判定距離
pub const WAYPOINT_ARRIVAL_RADIUS: f64 = 10.0;
/// 衛生兵の回復範囲
pub const HEAL_RANGE: f64 = 60.0;
/// 1ティックあたりの回復量
pub const HEAL_AMOUNT: f64 = 0.2;

const WAYPOINT_GAIN: f64 = 0.05;
const FORMATION_GAIN: f64 = 0.04;
const PURSUIT_GAIN: f64 = 0.05;
const HOLD_DAMPING: f64 = 0.9;
const FLEE_GAIN: f64 = 0.1;
const COHESION_GAIN: f64 = 0.01;
const ALIGNMENT_GAIN: f64 = 0.05;
const SEPARATION_GAIN: f64 = 0.05;

/// AI状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum AiState {
    /// 巡回（リーダーはウェイポイント、フォロワーは隊形維持）
    Patrol,
    /// 交戦（ターゲットへ接近・射撃）
    Engage,
    /// 退避（最寄りの脅威から離脱）
    Evade,
}

/// 1ティックの更新に必要な周辺情報
///
/// ロスターは更新中のドローン自身の古い状態も含むため、自身はIDで除外します。
pub struct TickContext<'a> {
    pub roster: &'a Roster,
    /// 隊形計算に使う公称分隊サイズ
    pub squad_size: usize,
    pub formation: FormationMode,
    pub world_width: f64,
    pub world_height: f64,
}

/// 1ティックの更新結果（ワールドが適用する副作用）
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// 発射した弾
    pub projectile: Option<Projectile>,
    /// 回復対象の味方
    pub heal_targets: Vec<AgentId>,
    /// 状態遷移（遷移前, 遷移後）
    pub transition: Option<(AiState, AiState)>,
}

/// ドローン（ボイド）エージェント
///
/// 群れ行動の上に状態機械を重ねた自律エージェントです。
/// 他エージェントへの参照はすべて `AgentId` で保持し、ロスターから解決します。
#[derive(Debug, Clone)]
pub struct Drone {
    pub id: AgentId,
    /// 表示用ラベル（L1, F2, EL1, EF1-2 など）
    pub label: String,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub squad_id: u32,
    pub is_leader: bool,
    pub is_enemy: bool,
    /// 分隊内インデックス（隊形スロットと衛生兵判定に使用）
    pub index_in_squad: usize,
    /// 分隊リーダー（リーダー自身、またはリーダー撃破後はNone）
    pub leader: Option<AgentId>,
    pub health: f64,
    pub shielded: bool,
    /// フォロワーはシールド残り時間、リーダーはシールド再使用までの時間
    pub shield_timer: u32,
    pub projectile_cooldown: u32,
    pub state: AiState,
    /// 交戦中のターゲット（Engage中のみ有効）
    pub target_enemy: Option<AgentId>,
    pub waypoints: Vec<Vector2D>,
    pub current_waypoint: usize,
    pub firing_range: f64,
    pub detection_range: f64,
}

impl Drone {
    /// 新しいドローンを作成します
    ///
    /// # 引数
    ///
    /// * `id` - 安定識別子
    /// * `position` - 初期位置
    /// * `squad_id` - 分隊ID
    /// * `is_leader` - 分隊リーダーかどうか
    /// * `index_in_squad` - 分隊内インデックス
    /// * `is_enemy` - 敵陣営かどうか
    pub fn new(
        id: AgentId,
        position: Vector2D,
        squad_id: u32,
        is_leader: bool,
        index_in_squad: usize,
        is_enemy: bool,
    ) -> Self {
        let label = if is_leader {
            format!("L{}", index_in_squad + 1)
        } else {
            format!("F{}", index_in_squad + 1)
        };

        Self {
            id,
            label,
            position,
            velocity: Vector2D::zero(),
            squad_id,
            is_leader,
            is_enemy,
            index_in_squad,
            leader: None,
            health: MAX_HEALTH,
            shielded: false,
            shield_timer: 0,
            projectile_cooldown: 0,
            state: AiState::Patrol,
            target_enemy: None,
            waypoints: Vec::new(),
            current_waypoint: 0,
            firing_range: DEFAULT_FIRING_RANGE,
            detection_range: DEFAULT_DETECTION_RANGE,
        }
    }

    /// 射程・探知距離を設定
    pub fn set_ranges(&mut self, firing_range: f64, detection_range: f64) {
        self.firing_range = firing_range;
        self.detection_range = detection_range;
    }

    pub fn add_waypoint(&mut self, waypoint: Vector2D) {
        self.waypoints.push(waypoint);
    }

    pub fn faction(&self) -> Faction {
        Faction::from_is_enemy(self.is_enemy)
    }

    /// 衛生兵かどうか（味方分隊のインデックス0のフォロワー）
    pub fn is_medic(&self) -> bool {
        self.index_in_squad == 0 && !self.is_leader && !self.is_enemy
    }

    pub fn health_ratio(&self) -> f64 {
        (self.health / MAX_HEALTH).clamp(0.0, 1.0)
    }

    /// 1ティック分の更新
    ///
    /// 処理順序: タイマー更新 → 状態別行動 → 群れ行動 → 速度制限 → 位置積分と折り返し → 回復対象の探索。
    /// 撃破済みのドローンは何もしません。
    pub fn update<R: Rng>(&mut self, ctx: &TickContext<'_>, rng: &mut R) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if !self.is_alive() {
            return outcome;
        }

        self.tick_timers();

        let previous_state = self.state;
        let next_state = match self.state {
            AiState::Patrol => self.handle_patrol(ctx),
            AiState::Engage => {
                let (next, projectile) = self.handle_engage(ctx);
                outcome.projectile = projectile;
                next
            }
            AiState::Evade => self.handle_evade(ctx, rng),
        };

        if next_state != previous_state {
            debug!(
                drone = %self.label,
                agent_id = %self.id,
                previous_state = ?previous_state,
                current_state = ?next_state,
                health = self.health,
                target = ?self.target_enemy,
                "STATE_TRANSITION: ドローンのAI状態が切り替わりました"
            );
            outcome.transition = Some((previous_state, next_state));
        }
        self.state = next_state;

        self.apply_flocking(ctx);

        self.velocity = self.velocity.clamp_magnitude(MAX_SPEED);
        self.position = (self.position + self.velocity).wrap(ctx.world_width, ctx.world_height);

        if self.is_medic() {
            outcome.heal_targets = self.find_heal_targets(ctx);
        }

        outcome
    }

    fn tick_timers(&mut self) {
        if self.projectile_cooldown > 0 {
            self.projectile_cooldown -= 1;
        }
        if self.shield_timer > 0 {
            self.shield_timer -= 1;
        }
        if self.shielded && self.shield_timer == 0 {
            self.shielded = false;
            trace!(drone = %self.label, "SHIELD_EXPIRED: シールドが解除されました");
        }
    }

    /// 巡回行動
    pub fn handle_patrol(&mut self, ctx: &TickContext<'_>) -> AiState {
        if self.is_leader {
            if let Some(&waypoint) = self.waypoints.get(self.current_waypoint) {
                if self.position.distance(&waypoint) < WAYPOINT_ARRIVAL_RADIUS {
                    self.current_waypoint = (self.current_waypoint + 1) % self.waypoints.len();
                } else {
                    self.velocity += (waypoint - self.position) * WAYPOINT_GAIN;
                }
            }
        } else {
            match self.leader.and_then(|id| ctx.roster.get_alive(id)) {
                Some(leader) => {
                    let offset = formation_offset(self.index_in_squad, ctx.formation, ctx.squad_size);
                    let slot = leader.position + offset;
                    self.velocity += (slot - self.position) * FORMATION_GAIN;
                }
                None => {
                    if self.leader.take().is_some() {
                        debug!(
                            drone = %self.label,
                            squad_id = self.squad_id,
                            "LEADER_LOST: リーダーを失い単独行動に移行します"
                        );
                    }
                }
            }
        }

        match self.nearest_enemy_in_range(ctx.roster, self.detection_range) {
            Some(enemy) => {
                self.target_enemy = Some(enemy);
                AiState::Engage
            }
            None => AiState::Patrol,
        }
    }

    /// 交戦行動
    ///
    /// 次の状態と、このティックで発射した弾を返します。
    pub fn handle_engage(&mut self, ctx: &TickContext<'_>) -> (AiState, Option<Projectile>) {
        let mut next = AiState::Engage;
        let mut projectile = None;

        match self.target_enemy.and_then(|id| ctx.roster.get_alive(id)) {
            Some(target) => {
                let target_position = target.position;
                let target_distance = self.position.distance(&target_position);

                if target_distance > self.firing_range * 0.8 {
                    self.velocity += (target_position - self.position) * PURSUIT_GAIN;
                } else {
                    self.velocity *= HOLD_DAMPING;
                }

                if self.projectile_cooldown == 0 && target_distance <= self.firing_range {
                    projectile = Some(Projectile::new(self.position, self.id, target.id));
                    self.projectile_cooldown = FIRE_COOLDOWN_TICKS;
                    trace!(
                        drone = %self.label,
                        target = %target.label,
                        distance = target_distance,
                        "PROJECTILE_FIRED: 弾を発射しました"
                    );
                }
            }
            None => {
                self.target_enemy = None;
                next = AiState::Patrol;
            }
        }

        if !self.is_enemy && self.health < EVADE_HEALTH_THRESHOLD {
            self.target_enemy = None;
            next = AiState::Evade;
        }

        (next, projectile)
    }

    /// 退避行動
    pub fn handle_evade<R: Rng>(&mut self, ctx: &TickContext<'_>, rng: &mut R) -> AiState {
        let threat_range = self.detection_range * EVADE_RANGE_FACTOR;
        let threat = self
            .nearest_enemy_in_range(ctx.roster, threat_range)
            .and_then(|id| ctx.roster.get(id))
            .map(|d| d.position);

        match threat {
            Some(threat_position) => {
                self.velocity += (self.position - threat_position) * FLEE_GAIN;

                let min_speed = MAX_SPEED / 2.0;
                let speed = self.velocity.magnitude();
                if speed < min_speed {
                    self.velocity = if speed > 0.0 {
                        self.velocity * (min_speed / speed)
                    } else {
                        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                        Vector2D::new(angle.cos(), angle.sin()) * min_speed
                    };
                }
                AiState::Evade
            }
            // 回復待ちの専用状態は持たず、体力に関わらず巡回へ戻る
            None => AiState::Patrol,
        }
    }

    /// 探知距離内で最も近い敵陣営の生存ドローン
    ///
    /// 等距離の候補はロスター順で先に現れたものを選びます。
    pub fn nearest_enemy_in_range(&self, roster: &Roster, range: f64) -> Option<AgentId> {
        let mut nearest: Option<(AgentId, f64)> = None;
        for other in roster.alive() {
            if other.is_enemy == self.is_enemy {
                continue;
            }
            let d = self.position.distance(&other.position);
            if d >= range {
                continue;
            }
            if nearest.is_none_or(|(_, best)| d < best) {
                nearest = Some((other.id, d));
            }
        }
        nearest.map(|(id, _)| id)
    }

    /// 群れ行動（結合・整列・分離）
    ///
    /// 陣営を区別せず、近傍半径内の全生存ドローンを対象とします。
    pub fn apply_flocking(&mut self, ctx: &TickContext<'_>) {
        let neighbors: Vec<&Drone> = ctx
            .roster
            .alive()
            .filter(|d| d.id != self.id && self.position.distance(&d.position) < NEIGHBOR_RADIUS)
            .collect();

        if neighbors.is_empty() {
            return;
        }

        let count = neighbors.len() as f64;
        let mut position_sum = Vector2D::zero();
        let mut velocity_sum = Vector2D::zero();
        for neighbor in &neighbors {
            position_sum += neighbor.position;
            velocity_sum += neighbor.velocity;
        }

        // 結合
        let center = position_sum * (1.0 / count);
        self.velocity += (center - self.position) * COHESION_GAIN;

        // 整列
        let average_velocity = velocity_sum * (1.0 / count);
        self.velocity += (average_velocity - self.velocity) * ALIGNMENT_GAIN;

        // 分離
        for neighbor in &neighbors {
            if self.position.distance(&neighbor.position) < AVOID_RADIUS {
                self.velocity += (self.position - neighbor.position) * SEPARATION_GAIN;
            }
        }
    }

    /// 回復対象の味方（同陣営・同分隊・回復範囲内・体力が最大未満）
    pub fn find_heal_targets(&self, ctx: &TickContext<'_>) -> Vec<AgentId> {
        ctx.roster
            .alive()
            .filter(|ally| {
                ally.id != self.id
                    && ally.squad_id == self.squad_id
                    && ally.is_enemy == self.is_enemy
                    && ally.health < MAX_HEALTH
                    && self.position.distance(&ally.position) < HEAL_RANGE
            })
            .map(|ally| ally.id)
            .collect()
    }
}

impl IAgent for Drone {
    fn get_id(&self) -> String {
        format!("{}:{}", self.id, self.label)
    }

    fn is_active(&self) -> bool {
        self.is_alive()
    }
}

impl IMovable for Drone {
    fn get_position(&self) -> Vector2D {
        self.position
    }
}

impl ICombatant for Drone {
    fn agent_id(&self) -> AgentId {
        self.id
    }

    fn get_health(&self) -> f64 {
        self.health
    }

    fn is_shielded(&self) -> bool {
        self.shielded
    }

    fn take_damage(&mut self, damage: f64) -> bool {
        if self.shielded || !self.is_alive() {
            return false;
        }
        self.health = (self.health - damage).max(0.0);
        true
    }

    fn heal(&mut self, amount: f64) -> f64 {
        if !self.is_alive() {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(MAX_HEALTH);
        self.health - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::{WORLD_HEIGHT, WORLD_WIDTH};
    use rand::{rngs::StdRng, SeedableRng};

    fn ctx(roster: &Roster) -> TickContext<'_> {
        TickContext {
            roster,
            squad_size: 6,
            formation: FormationMode::V,
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn player(id: u32, x: f64, y: f64) -> Drone {
        Drone::new(AgentId(id), Vector2D::new(x, y), 0, false, id as usize, false)
    }

    fn enemy(id: u32, x: f64, y: f64) -> Drone {
        Drone::new(AgentId(id), Vector2D::new(x, y), 100, false, 1, true)
    }

    fn roster_of(drones: &[Drone]) -> Roster {
        let mut roster = Roster::new();
        for d in drones {
            roster.push(d.clone());
        }
        roster
    }

    #[test]
    fn test_dead_drone_does_nothing() {
        let mut drone = player(1, 100.0, 100.0);
        drone.health = 0.0;
        drone.velocity = Vector2D::new(1.0, 0.0);
        drone.projectile_cooldown = 5;
        let roster = roster_of(&[drone.clone()]);

        let outcome = drone.update(&ctx(&roster), &mut rng());
        assert_eq!(drone.position, Vector2D::new(100.0, 100.0));
        assert_eq!(drone.projectile_cooldown, 5);
        assert!(outcome.projectile.is_none());
    }

    #[test]
    fn test_speed_is_capped_and_position_wraps() {
        let mut drone = player(1, 999.5, 0.5);
        drone.velocity = Vector2D::new(30.0, -40.0);
        let roster = roster_of(&[drone.clone()]);

        drone.update(&ctx(&roster), &mut rng());
        assert!(drone.velocity.magnitude() <= MAX_SPEED + 1e-9);
        assert!(drone.position.x >= 0.0 && drone.position.x < WORLD_WIDTH);
        assert!(drone.position.y >= 0.0 && drone.position.y < WORLD_HEIGHT);
        // 右端・上端を越えて反対側に出る
        assert!(drone.position.x < 10.0);
        assert!(drone.position.y > WORLD_HEIGHT - 10.0);
    }

    #[test]
    fn test_shield_expires_when_timer_runs_out() {
        let mut drone = player(1, 100.0, 100.0);
        drone.shielded = true;
        drone.shield_timer = 1;
        let roster = roster_of(&[drone.clone()]);

        drone.update(&ctx(&roster), &mut rng());
        assert_eq!(drone.shield_timer, 0);
        assert!(!drone.shielded);
    }

    #[test]
    fn test_patrol_acquires_nearest_enemy() {
        let mut drone = player(1, 100.0, 100.0);
        let far = enemy(2, 300.0, 100.0);
        let near = enemy(3, 100.0, 250.0);
        let out_of_range = enemy(4, 500.0, 500.0);
        let roster = roster_of(&[drone.clone(), far, near, out_of_range]);

        let next = drone.handle_patrol(&ctx(&roster));
        assert_eq!(next, AiState::Engage);
        assert_eq!(drone.target_enemy, Some(AgentId(3)));
    }

    #[test]
    fn test_patrol_tie_break_is_roster_order() {
        let drone = player(1, 100.0, 100.0);
        let first = enemy(5, 200.0, 100.0);
        let second = enemy(2, 0.0, 100.0);
        let roster = roster_of(&[drone.clone(), first, second]);

        for _ in 0..3 {
            assert_eq!(drone.nearest_enemy_in_range(&roster, 300.0), Some(AgentId(5)));
        }
    }

    #[test]
    fn test_patrol_ignores_dead_and_allied_drones() {
        let mut drone = player(1, 100.0, 100.0);
        let ally = player(2, 110.0, 100.0);
        let mut dead = enemy(3, 120.0, 100.0);
        dead.health = 0.0;
        let roster = roster_of(&[drone.clone(), ally, dead]);

        assert_eq!(drone.handle_patrol(&ctx(&roster)), AiState::Patrol);
        assert_eq!(drone.target_enemy, None);
    }

    #[test]
    fn test_leader_advances_waypoint_cyclically() {
        let mut leader = Drone::new(AgentId(1), Vector2D::new(100.0, 100.0), 0, true, 0, false);
        leader.add_waypoint(Vector2D::new(105.0, 100.0));
        leader.add_waypoint(Vector2D::new(100.0, 400.0));
        let roster = roster_of(&[leader.clone()]);

        leader.handle_patrol(&ctx(&roster));
        assert_eq!(leader.current_waypoint, 1);
        assert_eq!(leader.velocity, Vector2D::zero());

        leader.handle_patrol(&ctx(&roster));
        assert_eq!(leader.current_waypoint, 1);
        assert!((leader.velocity.y - 15.0).abs() < 1e-9);

        leader.position = Vector2D::new(100.0, 395.0);
        leader.handle_patrol(&ctx(&roster));
        assert_eq!(leader.current_waypoint, 0);
    }

    #[test]
    fn test_follower_steers_to_formation_slot() {
        let leader = Drone::new(AgentId(1), Vector2D::new(500.0, 300.0), 0, true, 0, false);
        let mut follower = Drone::new(AgentId(2), Vector2D::new(500.0, 300.0), 0, false, 0, false);
        follower.leader = Some(AgentId(1));
        let roster = roster_of(&[leader, follower.clone()]);

        follower.handle_patrol(&ctx(&roster));
        // スロット (-30, 30) へゲイン0.04で操舵
        assert!((follower.velocity.x + 1.2).abs() < 1e-9);
        assert!((follower.velocity.y - 1.2).abs() < 1e-9);
        assert_eq!(follower.leader, Some(AgentId(1)));
    }

    #[test]
    fn test_follower_drops_dead_leader() {
        let mut leader = Drone::new(AgentId(1), Vector2D::new(500.0, 300.0), 0, true, 0, false);
        leader.health = 0.0;
        let mut follower = Drone::new(AgentId(2), Vector2D::new(510.0, 300.0), 0, false, 1, false);
        follower.leader = Some(AgentId(1));
        let roster = roster_of(&[leader, follower.clone()]);

        follower.handle_patrol(&ctx(&roster));
        assert_eq!(follower.leader, None);
        assert_eq!(follower.velocity, Vector2D::zero());
    }

    #[test]
    fn test_engage_fires_and_resets_cooldown() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Engage;
        drone.target_enemy = Some(AgentId(2));
        drone.velocity = Vector2D::new(1.0, 0.0);
        let target = enemy(2, 200.0, 100.0);
        let roster = roster_of(&[drone.clone(), target]);

        let (next, projectile) = drone.handle_engage(&ctx(&roster));
        assert_eq!(next, AiState::Engage);
        let projectile = projectile.expect("射程内で発射されるはず");
        assert_eq!(projectile.target, AgentId(2));
        assert_eq!(projectile.owner, AgentId(1));
        assert_eq!(drone.projectile_cooldown, FIRE_COOLDOWN_TICKS);
        // 射程の8割以内なので減速
        assert!((drone.velocity.x - 0.9).abs() < 1e-9);

        let (_, second) = drone.handle_engage(&ctx(&roster));
        assert!(second.is_none());
    }

    #[test]
    fn test_engage_closes_distance_without_firing_out_of_range() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Engage;
        drone.target_enemy = Some(AgentId(2));
        let target = enemy(2, 350.0, 100.0);
        let roster = roster_of(&[drone.clone(), target]);

        let (next, projectile) = drone.handle_engage(&ctx(&roster));
        assert_eq!(next, AiState::Engage);
        assert!(projectile.is_none());
        assert!((drone.velocity.x - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_engage_returns_to_patrol_when_target_gone() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Engage;
        drone.target_enemy = Some(AgentId(42));
        let roster = roster_of(&[drone.clone()]);

        let (next, projectile) = drone.handle_engage(&ctx(&roster));
        assert_eq!(next, AiState::Patrol);
        assert!(projectile.is_none());
        assert_eq!(drone.target_enemy, None);
    }

    #[test]
    fn test_low_health_player_evades_but_still_fires_this_tick() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Engage;
        drone.target_enemy = Some(AgentId(2));
        drone.health = 20.0;
        let target = enemy(2, 150.0, 100.0);
        let roster = roster_of(&[drone.clone(), target]);

        let (next, projectile) = drone.handle_engage(&ctx(&roster));
        assert_eq!(next, AiState::Evade);
        assert!(projectile.is_some());
    }

    #[test]
    fn test_low_health_enemy_never_evades() {
        let mut drone = enemy(1, 100.0, 100.0);
        drone.state = AiState::Engage;
        drone.target_enemy = Some(AgentId(2));
        drone.health = 10.0;
        let target = player(2, 150.0, 100.0);
        let roster = roster_of(&[drone.clone(), target]);

        let (next, _) = drone.handle_engage(&ctx(&roster));
        assert_eq!(next, AiState::Engage);
    }

    #[test]
    fn test_evade_flees_nearest_threat() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Evade;
        drone.health = 20.0;
        let threat = enemy(2, 90.0, 100.0);
        let roster = roster_of(&[drone.clone(), threat]);

        let next = drone.handle_evade(&ctx(&roster), &mut rng());
        assert_eq!(next, AiState::Evade);
        assert!(drone.velocity.x > 0.0);
        assert!(drone.velocity.magnitude() >= MAX_SPEED / 2.0 - 1e-9);
    }

    #[test]
    fn test_evade_enforces_minimum_speed() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Evade;
        // 脅威から離れる力が小さくなる位置に置く（0.1 * 3 = 0.3 < 1.0）
        let threat = enemy(2, 97.0, 100.0);
        let roster = roster_of(&[drone.clone(), threat]);

        drone.handle_evade(&ctx(&roster), &mut rng());
        assert!((drone.velocity.magnitude() - MAX_SPEED / 2.0).abs() < 1e-9);
        assert!(drone.velocity.x > 0.0);
    }

    #[test]
    fn test_evade_random_direction_when_velocity_is_zero() {
        let mut drone = player(1, 100.0, 100.0);
        drone.state = AiState::Evade;
        // 脅威と同一位置なら逃避ベクトルはゼロ
        let threat = enemy(2, 100.0, 100.0);
        let roster = roster_of(&[drone.clone(), threat]);

        drone.handle_evade(&ctx(&roster), &mut rng());
        assert!((drone.velocity.magnitude() - MAX_SPEED / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_evade_returns_to_patrol_without_threats() {
        for health in [80.0, 20.0] {
            let mut drone = player(1, 100.0, 100.0);
            drone.state = AiState::Evade;
            drone.health = health;
            let distant = enemy(2, 600.0, 100.0);
            let roster = roster_of(&[drone.clone(), distant]);

            assert_eq!(drone.handle_evade(&ctx(&roster), &mut rng()), AiState::Patrol);
        }
    }

    #[test]
    fn test_flocking_separation_pushes_apart() {
        let mut drone = player(1, 100.0, 100.0);
        let neighbor = enemy(2, 110.0, 100.0);
        let roster = roster_of(&[drone.clone(), neighbor]);

        drone.apply_flocking(&ctx(&roster));
        // 結合 +0.1, 整列 -0.005, 分離 -0.5
        assert!((drone.velocity.x + 0.405).abs() < 1e-9);
        assert!(drone.velocity.y.abs() < 1e-9);
    }

    #[test]
    fn test_flocking_alignment_matches_neighbors() {
        let mut drone = player(1, 100.0, 100.0);
        let mut neighbor = player(2, 100.0, 140.0);
        neighbor.velocity = Vector2D::new(2.0, 0.0);
        let roster = roster_of(&[drone.clone(), neighbor]);

        drone.apply_flocking(&ctx(&roster));
        assert!((drone.velocity.x - 0.1).abs() < 1e-9);
        assert!((drone.velocity.y - 0.4 * 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_medic_finds_wounded_squadmates_only() {
        let medic = Drone::new(AgentId(1), Vector2D::new(100.0, 100.0), 0, false, 0, false);
        assert!(medic.is_medic());

        let mut wounded = player(2, 120.0, 100.0);
        wounded.health = 50.0;
        let healthy = player(3, 110.0, 100.0);
        let mut other_squad = Drone::new(AgentId(4), Vector2D::new(105.0, 100.0), 1, false, 2, false);
        other_squad.health = 10.0;
        let mut too_far = player(5, 200.0, 100.0);
        too_far.health = 10.0;
        let roster = roster_of(&[medic.clone(), wounded, healthy, other_squad, too_far]);

        assert_eq!(medic.find_heal_targets(&ctx(&roster)), vec![AgentId(2)]);
    }

    #[test]
    fn test_medic_role_rules() {
        assert!(!Drone::new(AgentId(1), Vector2D::zero(), 0, true, 0, false).is_medic());
        assert!(!Drone::new(AgentId(2), Vector2D::zero(), 100, false, 0, true).is_medic());
        assert!(!Drone::new(AgentId(3), Vector2D::zero(), 0, false, 1, false).is_medic());
    }

    #[test]
    fn test_heal_and_damage_clamp() {
        let mut drone = player(1, 0.0, 0.0);
        drone.health = 99.9;
        let healed = drone.heal(HEAL_AMOUNT);
        assert_eq!(drone.health, MAX_HEALTH);
        assert!((healed - 0.1).abs() < 1e-9);

        drone.health = 3.0;
        assert!(drone.take_damage(5.0));
        assert_eq!(drone.health, 0.0);
        assert!(!drone.is_alive());
        assert_eq!(drone.heal(HEAL_AMOUNT), 0.0);
    }
}
