use crate::models::common::{AgentId, Vector2D};

/// シミュレーション上の全エンティティが実装する基本インターフェース
pub trait IAgent {
    /// 表示・ログ用の識別子
    fn get_id(&self) -> String;

    /// エンティティがアクティブかどうか（非アクティブなものは次ティックで除去される）
    fn is_active(&self) -> bool;
}

/// 移動可能なエンティティのインターフェース
pub trait IMovable {
    /// 現在位置の取得
    fn get_position(&self) -> Vector2D;
}

/// 被弾・回復するエンティティのインターフェース
pub trait ICombatant {
    /// 安定識別子
    fn agent_id(&self) -> AgentId;

    /// 現在の体力
    fn get_health(&self) -> f64;

    /// シールド展開中かどうか
    fn is_shielded(&self) -> bool;

    /// ダメージを受ける（シールド中は無効）
    ///
    /// 実際に体力が減った場合はtrueを返します。
    fn take_damage(&mut self, damage: f64) -> bool;

    /// 回復する（上限でクランプ）
    ///
    /// 実際に回復した量を返します。
    fn heal(&mut self, amount: f64) -> f64;

    /// 生存しているかどうか
    fn is_alive(&self) -> bool {
        self.get_health() > 0.0
    }
}
