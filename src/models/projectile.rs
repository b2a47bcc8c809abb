use crate::models::{
    common::{AgentId, Vector2D, AGENT_RADIUS},
    traits::{IAgent, ICombatant, IMovable},
};
use tracing::{debug, info};

/// 弾速（ユニット/ティック）
pub const PROJECTILE_SPEED: f64 = 5.0;
/// 1発あたりのダメージ
pub const PROJECTILE_DAMAGE: f64 = 5.0;

/// 弾の終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileEndReason {
    /// 命中してダメージを与えた
    Hit,
    /// 命中したがシールドで無効化された
    Blocked,
    /// 命中前にターゲットが撃破・除去された
    TargetLost,
}

/// 追尾弾
///
/// 毎ティック、ターゲットの現在位置へ向けて速度を再計算する（弾道ではなく追尾）。
/// 一度非アクティブになった弾は二度とアクティブに戻りません。
#[derive(Debug, Clone)]
pub struct Projectile {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub speed: f64,
    pub damage: f64,
    /// 発射したドローン
    pub owner: AgentId,
    /// ターゲット（非所有の参照）
    pub target: AgentId,
    pub active: bool,
    pub end_reason: Option<ProjectileEndReason>,
    /// 飛翔ティック数
    pub flight_ticks: u32,
}

impl Projectile {
    pub fn new(position: Vector2D, owner: AgentId, target: AgentId) -> Self {
        Self {
            position,
            velocity: Vector2D::zero(),
            speed: PROJECTILE_SPEED,
            damage: PROJECTILE_DAMAGE,
            owner,
            target,
            active: true,
            end_reason: None,
            flight_ticks: 0,
        }
    }

    /// 1ティック分の追尾・命中処理
    ///
    /// # 引数
    ///
    /// * `target` - ターゲットのエージェント（ロスターから除去済みの場合はNone）
    ///
    /// # 戻り値
    ///
    /// このティックで非アクティブになった場合はその理由
    pub fn update<T: ICombatant + IMovable>(&mut self, target: Option<&mut T>) -> Option<ProjectileEndReason> {
        if !self.active {
            return None;
        }

        let target = match target {
            Some(t) if t.is_alive() => t,
            _ => {
                self.deactivate(ProjectileEndReason::TargetLost);
                debug!(
                    owner = %self.owner,
                    target = %self.target,
                    flight_ticks = self.flight_ticks,
                    "PROJECTILE_TARGET_LOST: ターゲット消失により弾が消滅しました"
                );
                return self.end_reason;
            }
        };

        // ターゲットの現在位置へ再照準
        let target_position = target.get_position();
        self.velocity = (target_position - self.position).normalize() * self.speed;
        self.position += self.velocity;
        self.flight_ticks += 1;

        if self.position.distance(&target_position) < AGENT_RADIUS {
            let shielded = target.is_shielded();
            let damaged = target.take_damage(self.damage);
            let reason = if damaged {
                ProjectileEndReason::Hit
            } else {
                ProjectileEndReason::Blocked
            };
            self.deactivate(reason);

            info!(
                owner = %self.owner,
                target = %target.agent_id(),
                hit_position_x = self.position.x,
                hit_position_y = self.position.y,
                shielded,
                damaged,
                target_health = target.get_health(),
                flight_ticks = self.flight_ticks,
                "PROJECTILE_HIT: 弾がターゲットに到達しました"
            );
        }

        if self.active { None } else { self.end_reason }
    }

    fn deactivate(&mut self, reason: ProjectileEndReason) {
        self.active = false;
        self.end_reason = Some(reason);
    }
}

impl IAgent for Projectile {
    fn get_id(&self) -> String {
        format!("{}->{}", self.owner, self.target)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
