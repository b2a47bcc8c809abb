// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エージェントの基本インターフェース（trait）定義
pub mod traits;

// 隊形計算
pub mod formation;

// 各エージェントモデルの実装
pub mod drone;
pub mod projectile;
pub mod ping;

// ドローンの索引付きストア
pub mod roster;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use formation::{formation_offset, FormationMode};
pub use drone::{AiState, Drone, TickContext, TickOutcome};
pub use projectile::{Projectile, ProjectileEndReason};
pub use ping::Ping;
pub use roster::Roster;
