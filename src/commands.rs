//! # Commands モジュール
//!
//! 入力デバイス側の協調者として、画面上の「クリック位置」をワールドへの操作に変換します。
//!
//! ワールド側が受け付ける操作は次の2つのみです。
//!
//! - `ActivateShield(leader)`: リーダーが分隊にシールドを展開
//! - `SetWaypoint(leader, point)`: リーダーのウェイポイントを1点に置き換え
//!
//! どのリーダーを対象にするか（クリック位置に最も近いリーダーの選定）はこのモジュールの責務です。

use tracing::debug;

use crate::models::{AgentId, Roster, Vector2D, AGENT_RADIUS};
use crate::scenario::CommandKind;
use crate::world::World;

/// シールドのクリック判定半径
pub const CLICK_RADIUS: f64 = AGENT_RADIUS * 2.0;

/// ワールドへの操作
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    ActivateShield { leader: AgentId },
    SetWaypoint { leader: AgentId, point: Vector2D },
}

/// 指定位置に最も近い味方リーダーを探す
///
/// # 引数
///
/// * `roster` - ドローンのロスター
/// * `point` - クリック位置
/// * `max_distance` - 判定半径（Noneなら距離無制限）
pub fn nearest_player_leader(roster: &Roster, point: Vector2D, max_distance: Option<f64>) -> Option<AgentId> {
    let mut nearest: Option<(AgentId, f64)> = None;
    for drone in roster.alive() {
        if !drone.is_leader || drone.is_enemy {
            continue;
        }
        let d = drone.position.distance(&point);
        if max_distance.is_some_and(|max| d >= max) {
            continue;
        }
        if nearest.is_none_or(|(_, best)| d < best) {
            nearest = Some((drone.id, d));
        }
    }
    nearest.map(|(id, _)| id)
}

/// クリック操作を操作コマンドに変換
pub fn resolve_click(roster: &Roster, kind: CommandKind, point: Vector2D) -> Option<Command> {
    match kind {
        CommandKind::Shield => {
            nearest_player_leader(roster, point, Some(CLICK_RADIUS)).map(|leader| Command::ActivateShield { leader })
        }
        CommandKind::Waypoint => {
            nearest_player_leader(roster, point, None).map(|leader| Command::SetWaypoint { leader, point })
        }
    }
}

/// クリック操作を解決してワールドに適用
///
/// シールドのクリックがリーダーに当たった場合は、発動の成否に関わらずリーダー位置にピングを出します。
///
/// # 戻り値
///
/// コマンドが受理された場合はtrue
pub fn dispatch_click(world: &mut World, kind: CommandKind, point: Vector2D) -> bool {
    let Some(command) = resolve_click(&world.roster, kind, point) else {
        debug!(
            kind = ?kind,
            click_x = point.x,
            click_y = point.y,
            "COMMAND_MISSED: 対象となるリーダーが見つかりません"
        );
        return false;
    };

    if let Command::ActivateShield { leader } = command {
        if let Some(position) = world.roster.get_alive(leader).map(|d| d.position) {
            world.spawn_ping(position);
        }
    }

    world.apply_command(&command)
}
