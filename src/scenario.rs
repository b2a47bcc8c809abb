use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::FormationMode;

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// 実行ティック数（60ティック = 1秒）
    pub ticks: u64,
    pub seed: u64,
    /// 進行状況ログの間隔（ティック）
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_progress_interval() -> u64 {
    600
}

/// 世界設定（トーラス状）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
}

/// 分隊編成
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SquadsConfig {
    pub player_squads: u32,
    /// 味方分隊の人数（リーダー含む）。隊形計算の公称サイズにも使用
    pub drones_per_squad: u32,
    pub enemy_squads: u32,
    /// 敵分隊の人数（リーダー含む）
    pub drones_per_enemy_squad: u32,
    /// 敵分隊IDの開始値（味方分隊IDと重ならないこと）
    pub enemy_start_squad_id: u32,
    /// 隊形 ("V", "CIRCLE")
    pub formation: String,
}

/// ドローン性能の既定値
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DroneDefaults {
    pub firing_range: f64,
    pub detection_range: f64,
}

/// スクリプト化された操作の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// 左クリック相当：クリック位置付近のリーダーがシールドを展開
    Shield,
    /// 右クリック相当：最寄りのリーダーにウェイポイントを設定
    Waypoint,
}

/// 指定ティックで実行するクリック操作
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandConfig {
    pub tick: u64,
    pub kind: CommandKind,
    pub x: f64,
    pub y: f64,
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub world: WorldConfig,
    pub squads: SquadsConfig,
    pub drone_defaults: DroneDefaults,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "default".to_string(),
                description: "味方3分隊と敵2分隊による標準シナリオ".to_string(),
            },
            sim: SimulationConfig {
                ticks: 3600,
                seed: 42,
                progress_interval: default_progress_interval(),
            },
            world: WorldConfig {
                width: 1000.0,
                height: 700.0,
            },
            squads: SquadsConfig {
                player_squads: 3,
                drones_per_squad: 6,
                enemy_squads: 2,
                drones_per_enemy_squad: 4,
                enemy_start_squad_id: 100,
                formation: "V".to_string(),
            },
            drone_defaults: DroneDefaults {
                firing_range: 200.0,
                detection_range: 300.0,
            },
            commands: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(Path::new("<string>").to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 隊形設定（不明な値はFree）
    pub fn formation_mode(&self) -> FormationMode {
        FormationMode::parse_lenient(&self.squads.formation)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.ticks == 0 {
            return Err(ScenarioError::ValidationError("ticks must be positive".to_string()));
        }
        if self.sim.progress_interval == 0 {
            return Err(ScenarioError::ValidationError("progress_interval must be positive".to_string()));
        }

        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return Err(ScenarioError::ValidationError("Invalid world size".to_string()));
        }

        let squads = &self.squads;
        if squads.player_squads > 0 && squads.drones_per_squad == 0 {
            return Err(ScenarioError::ValidationError("drones_per_squad must be positive".to_string()));
        }
        if squads.enemy_squads > 0 && squads.drones_per_enemy_squad == 0 {
            return Err(ScenarioError::ValidationError("drones_per_enemy_squad must be positive".to_string()));
        }
        // 敵分隊IDは u32 の範囲に収まること
        if squads.enemy_start_squad_id.checked_add(squads.enemy_squads).is_none() {
            return Err(ScenarioError::ValidationError(format!(
                "enemy squad ids {}+{} exceed u32 range",
                squads.enemy_start_squad_id, squads.enemy_squads
            )));
        }
        // 敵分隊IDは味方分隊IDの範囲と重ならないこと
        if squads.enemy_squads > 0 && squads.enemy_start_squad_id < squads.player_squads {
            return Err(ScenarioError::ValidationError(format!(
                "enemy_start_squad_id {} overlaps player squad ids 0..{}",
                squads.enemy_start_squad_id, squads.player_squads
            )));
        }

        let defaults = &self.drone_defaults;
        if defaults.firing_range <= 0.0 || defaults.detection_range <= 0.0 {
            return Err(ScenarioError::ValidationError("ranges must be positive".to_string()));
        }

        for command in &self.commands {
            if command.tick >= self.sim.ticks {
                return Err(ScenarioError::ValidationError(format!(
                    "Command at tick {} >= simulation ticks {}",
                    command.tick, self.sim.ticks
                )));
            }
            if !self.is_position_in_bounds(command.x, command.y) {
                return Err(ScenarioError::ValidationError(format!(
                    "Command position ({}, {}) outside world bounds",
                    command.x, command.y
                )));
            }
        }

        Ok(())
    }

    fn is_position_in_bounds(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && x < self.world.width && y >= 0.0 && y < self.world.height
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("ティック数: {} ({:.1}秒)", self.sim.ticks, self.sim.ticks as f64 / 60.0);
        println!("シード値: {}", self.sim.seed);
        println!("ワールド: {:.0} x {:.0}", self.world.width, self.world.height);
        println!();

        let squads = &self.squads;
        println!("=== 味方戦力 ===");
        println!("分隊数: {}", squads.player_squads);
        println!("分隊人数: {}機 (隊形: {:?})", squads.drones_per_squad, self.formation_mode());
        println!("総機数: {}機", squads.player_squads as u64 * squads.drones_per_squad as u64);
        println!();

        println!("=== 敵戦力 ===");
        println!("分隊数: {}", squads.enemy_squads);
        println!("分隊人数: {}機", squads.drones_per_enemy_squad);
        println!("総機数: {}機", squads.enemy_squads as u64 * squads.drones_per_enemy_squad as u64);

        if !self.commands.is_empty() {
            println!();
            println!("=== 操作スクリプト ===");
            for command in &self.commands {
                println!("  t={}: {:?} ({:.0}, {:.0})", command.tick, command.kind, command.x, command.y);
            }
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
meta:
  version: "1.0"
  name: "skirmish"
  description: "test"
sim:
  ticks: 600
  seed: 7
world:
  width: 800
  height: 600
squads:
  player_squads: 2
  drones_per_squad: 5
  enemy_squads: 1
  drones_per_enemy_squad: 3
  enemy_start_squad_id: 100
  formation: "CIRCLE"
drone_defaults:
  firing_range: 200
  detection_range: 300
commands:
  - { tick: 60, kind: shield, x: 150, y: 300 }
  - { tick: 120, kind: waypoint, x: 400, y: 100 }
"#;

    #[test]
    fn test_parse_sample() {
        let config = ScenarioConfig::from_yaml_str(SAMPLE).expect("サンプルの解析に失敗");
        assert_eq!(config.sim.ticks, 600);
        assert_eq!(config.sim.progress_interval, 600);
        assert_eq!(config.formation_mode(), FormationMode::Circle);
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.commands[1].kind, CommandKind::Waypoint);
    }

    #[test]
    fn test_default_is_valid() {
        let config = ScenarioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.formation_mode(), FormationMode::V);
    }

    #[test]
    fn test_overlapping_enemy_ids_rejected() {
        let mut config = ScenarioConfig::default();
        config.squads.enemy_start_squad_id = 2;
        assert!(matches!(config.validate(), Err(ScenarioError::ValidationError(_))));
    }

    #[test]
    fn test_enemy_squad_ids_beyond_u32_rejected() {
        let mut config = ScenarioConfig::default();
        config.squads.enemy_start_squad_id = u32::MAX;
        assert!(matches!(config.validate(), Err(ScenarioError::ValidationError(_))));

        config.squads.enemy_start_squad_id = u32::MAX - 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_summary_totals_do_not_overflow() {
        let mut config = ScenarioConfig::default();
        config.squads.player_squads = u32::MAX;
        config.squads.drones_per_squad = u32::MAX;
        config.squads.enemy_squads = 0;
        config.print_summary();
    }

    #[test]
    fn test_command_after_end_rejected() {
        let mut config = ScenarioConfig::default();
        config.commands.push(CommandConfig {
            tick: config.sim.ticks,
            kind: CommandKind::Shield,
            x: 10.0,
            y: 10.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ScenarioConfig::from_file("does/not/exist.yaml");
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }
}
