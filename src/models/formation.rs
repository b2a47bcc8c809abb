use std::str::FromStr;

use crate::models::common::Vector2D;

/// V字隊形の間隔
pub const V_SPACING: f64 = 30.0;
/// 円形隊形の半径
pub const CIRCLE_RADIUS: f64 = 60.0;

/// 分隊の隊形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormationMode {
    /// V字隊形（左右交互に層を重ねる）
    V,
    /// リーダーを中心とした円形隊形
    Circle,
    /// 隊形なし（オフセットは常にゼロ）
    Free,
}

impl FromStr for FormationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "V" => Ok(FormationMode::V),
            "CIRCLE" => Ok(FormationMode::Circle),
            "FREE" | "NONE" => Ok(FormationMode::Free),
            _ => Err(format!("無効な隊形: {}. 利用可能: V, CIRCLE, FREE", s)),
        }
    }
}

impl FormationMode {
    /// 文字列から隊形を解析（不明な値はFreeとして扱う）
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(FormationMode::Free)
    }
}

/// リーダーから見たフォロワーの隊形オフセットを計算
///
/// # 引数
///
/// * `index` - 分隊内インデックス
/// * `mode` - 隊形
/// * `squad_size` - 公称分隊サイズ（円形隊形の角度分割に使用）
///
/// # 戻り値
///
/// リーダー位置に加算するオフセット
pub fn formation_offset(index: usize, mode: FormationMode, squad_size: usize) -> Vector2D {
    match mode {
        FormationMode::V => {
            // layer = ceil((index + 1) / 2)
            let layer = (index / 2 + 1) as f64;
            let side = if index % 2 == 0 { -1.0 } else { 1.0 };
            Vector2D::new(side * V_SPACING * layer, V_SPACING * layer)
        }
        FormationMode::Circle => {
            if squad_size == 0 {
                return Vector2D::zero();
            }
            let angle = 2.0 * std::f64::consts::PI * index as f64 / squad_size as f64;
            Vector2D::new(angle.cos() * CIRCLE_RADIUS, angle.sin() * CIRCLE_RADIUS)
        }
        FormationMode::Free => Vector2D::zero(),
    }
}
