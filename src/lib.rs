//! # dronesim
//!
//! 敵味方の分隊に分かれたドローン群のシミュレーションエンジンです。
//!
//! 各ドローンは群れ行動（結合・整列・分離）の上に巡回・交戦・退避の状態機械を持ち、
//! 追尾弾による射撃、衛生兵による回復、リーダーによる分隊シールドを行います。
//! 描画・入力デバイス・フレームレート制御は外部の協調者として扱い、このクレートには含みません。

pub mod commands;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
pub mod world;
