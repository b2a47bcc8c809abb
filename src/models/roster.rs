use std::collections::HashMap;

use crate::models::{
    common::AgentId,
    drone::Drone,
    traits::ICombatant,
};

/// ドローンの索引付きストア
///
/// 並び順（＝更新順）を保持するVecと、安定識別子からインデックスへの対応表を持ちます。
/// 撃破されたドローンは `prune_dead` で除去され、以降そのIDの参照は `None` になります。
#[derive(Debug, Clone, Default)]
pub struct Roster {
    drones: Vec<Drone>,
    index: HashMap<AgentId, usize>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, drone: Drone) {
        self.index.insert(drone.id, self.drones.len());
        self.drones.push(drone);
    }

    pub fn len(&self) -> usize {
        self.drones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }

    /// IDで検索（撃破済みでも除去前なら返す）
    pub fn get(&self, id: AgentId) -> Option<&Drone> {
        self.index.get(&id).map(|&i| &self.drones[i])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Drone> {
        match self.index.get(&id) {
            Some(&i) => self.drones.get_mut(i),
            None => None,
        }
    }

    /// 生存しているドローンのみIDで検索
    pub fn get_alive(&self, id: AgentId) -> Option<&Drone> {
        self.get(id).filter(|d| d.is_alive())
    }

    pub fn at(&self, position: usize) -> Option<&Drone> {
        self.drones.get(position)
    }

    /// 指定位置のドローンを置き換える（IDは変わらない前提）
    pub fn replace_at(&mut self, position: usize, drone: Drone) {
        debug_assert_eq!(self.drones[position].id, drone.id);
        self.drones[position] = drone;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drone> {
        self.drones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Drone> {
        self.drones.iter_mut()
    }

    /// 生存しているドローンのみ
    pub fn alive(&self) -> impl Iterator<Item = &Drone> {
        self.drones.iter().filter(|d| d.is_alive())
    }

    /// 撃破済みドローンを除去し、除去したドローンを返す
    pub fn prune_dead(&mut self) -> Vec<Drone> {
        let (alive, dead): (Vec<Drone>, Vec<Drone>) =
            std::mem::take(&mut self.drones).into_iter().partition(|d| d.is_alive());
        self.drones = alive;
        self.rebuild_index();
        dead
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .drones
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id, i))
            .collect();
    }
}
