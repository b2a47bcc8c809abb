use serde::Serialize;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub};

/// ワールドの既定幅（ユニット）
pub const WORLD_WIDTH: f64 = 1000.0;
/// ワールドの既定高さ（ユニット）
pub const WORLD_HEIGHT: f64 = 700.0;
/// ドローンの当たり判定半径
pub const AGENT_RADIUS: f64 = 6.0;
/// 1ティックあたりの最大速度
pub const MAX_SPEED: f64 = 2.0;
/// 群れ行動の近傍半径
pub const NEIGHBOR_RADIUS: f64 = 50.0;
/// 分離行動の回避半径
pub const AVOID_RADIUS: f64 = 20.0;
/// 最大体力
pub const MAX_HEALTH: f64 = 100.0;
/// 公称ティックレート（Hz）
pub const TICKS_PER_SECOND: u64 = 60;

/// 2次元ベクトル（位置・速度の両方に使用）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector2D {
    pub x: f64,
    pub y: f64,
}

impl Vector2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// ベクトルの長さ
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// 2点間のユークリッド距離
    pub fn distance(&self, other: &Vector2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// 単位ベクトル化（長さ0の場合はゼロベクトル）
    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self::new(self.x / mag, self.y / mag)
        } else {
            Self::zero()
        }
    }

    /// 長さ制限（最大長を超える場合のみ一様縮小）
    pub fn clamp_magnitude(&self, max_length: f64) -> Self {
        let mag = self.magnitude();
        if mag > max_length {
            let factor = max_length / mag;
            Self::new(self.x * factor, self.y * factor)
        } else {
            *self
        }
    }

    /// トーラス状ワールドへの折り返し
    ///
    /// 結果は常に `[0, width) × [0, height)` に収まります。
    pub fn wrap(&self, width: f64, height: f64) -> Self {
        Self::new(wrap_coordinate(self.x, width), wrap_coordinate(self.y, height))
    }
}

impl Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl MulAssign<f64> for Vector2D {
    fn mul_assign(&mut self, scalar: f64) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

/// 1軸の折り返し
///
/// `rem_euclid` は負の微小値で `size` そのものを返すことがあるため、その場合は0に丸めます。
pub fn wrap_coordinate(value: f64, size: f64) -> f64 {
    let wrapped = value.rem_euclid(size);
    if wrapped >= size { 0.0 } else { wrapped }
}

/// エージェントの安定識別子
///
/// ロスター内のインデックスではなく生成時に払い出される番号で、
/// 撃破後に参照されても「不在」として解決されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D{:03}", self.0)
    }
}

/// 陣営
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    pub fn from_is_enemy(is_enemy: bool) -> Self {
        if is_enemy { Faction::Enemy } else { Faction::Player }
    }

    pub fn opposing(&self) -> Self {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Vector2D::new(0.0, 0.0);
        let b = Vector2D::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.magnitude(), 5.0);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vector2D::zero().normalize(), Vector2D::zero());
        let unit = Vector2D::new(10.0, 0.0).normalize();
        assert_eq!(unit, Vector2D::new(1.0, 0.0));
    }

    #[test]
    fn test_clamp_magnitude() {
        let v = Vector2D::new(6.0, 8.0).clamp_magnitude(MAX_SPEED);
        assert!((v.magnitude() - MAX_SPEED).abs() < 1e-9);
        assert!((v.x - 1.2).abs() < 1e-9);

        let slow = Vector2D::new(0.5, 0.5);
        assert_eq!(slow.clamp_magnitude(MAX_SPEED), slow);
    }

    #[test]
    fn test_wrap() {
        let p = Vector2D::new(1003.0, -5.0).wrap(WORLD_WIDTH, WORLD_HEIGHT);
        assert!((p.x - 3.0).abs() < 1e-9);
        assert!((p.y - 695.0).abs() < 1e-9);

        let edge = Vector2D::new(WORLD_WIDTH, WORLD_HEIGHT).wrap(WORLD_WIDTH, WORLD_HEIGHT);
        assert_eq!(edge, Vector2D::zero());

        let tiny = wrap_coordinate(-1e-20, WORLD_WIDTH);
        assert!(tiny >= 0.0 && tiny < WORLD_WIDTH);
    }

    #[test]
    fn test_faction_opposing() {
        assert_eq!(Faction::Player.opposing(), Faction::Enemy);
        assert_eq!(Faction::from_is_enemy(true), Faction::Enemy);
    }
}
