use crate::models::{
    common::Vector2D,
    traits::IAgent,
};

/// ピングの最大半径
pub const PING_MAX_RADIUS: f64 = 100.0;
/// 1ティックあたりの半径拡大量
pub const PING_GROWTH: f64 = 3.0;

/// シールド発動を示す表示用マーカー
///
/// 半径が最大に達した次のティックで非アクティブになります。
#[derive(Debug, Clone)]
pub struct Ping {
    pub position: Vector2D,
    pub radius: f64,
    pub max_radius: f64,
    pub active: bool,
}

impl Ping {
    pub fn new(position: Vector2D) -> Self {
        Self {
            position,
            radius: 0.0,
            max_radius: PING_MAX_RADIUS,
            active: true,
        }
    }

    pub fn update(&mut self) {
        if !self.active {
            return;
        }
        if self.radius < self.max_radius {
            self.radius += PING_GROWTH;
        } else {
            self.active = false;
        }
    }
}

impl IAgent for Ping {
    fn get_id(&self) -> String {
        format!("PING({:.0},{:.0})", self.position.x, self.position.y)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
