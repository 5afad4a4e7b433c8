//! Spatial index: uniform hash grid over (x, z)
//!
//! Architecture:
//! - Agents live in their center cell only, rebuilt wholesale every tick
//! - Obstacles are inserted once into every cell their bounding circle touches
//! - Queries expand by the largest indexed agent radius, filter by true
//!   distance and return results sorted by slot (insertion order never leaks)
//! - Buckets are cleared and reused; cells left empty after a rebuild are
//!   dropped, so the grid tracks occupied cells only

use std::collections::HashMap;

use bevy::prelude::*;

use crate::agent::AgentId;
use crate::config::ConfigError;
use crate::lifecycle::AgentPool;

pub mod obstacle;

pub use obstacle::{Obstacle, ObstacleShape};

type CellKey = (i32, i32);

/// Indexed agent snapshot (position as of the last rebuild)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentEntry {
    pub id: AgentId,
    pub position: Vec3,
    pub radius: f32,
}

#[derive(Resource, Debug)]
pub struct SpatialIndex {
    cell_size: f32,
    inv_cell: f32,
    agent_cells: HashMap<CellKey, Vec<AgentEntry>>,
    obstacle_cells: HashMap<CellKey, Vec<u32>>,
    obstacles: Vec<Obstacle>,
    /// Per-obstacle stamp of the last query that reported it
    obstacle_stamps: Vec<u32>,
    query_stamp: u32,
    max_agent_radius: f32,
    agent_count: usize,
}

impl Default for SpatialIndex {
    /// Grid with the default cell size
    fn default() -> Self {
        Self::with_cell(crate::config::SpatialConfig::default().cell_size)
    }
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Result<Self, ConfigError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(ConfigError::InvalidConfig("spatial.cell_size must be positive"));
        }
        Ok(Self::with_cell(cell_size))
    }

    fn with_cell(cell_size: f32) -> Self {
        Self {
            cell_size,
            inv_cell: 1.0 / cell_size,
            agent_cells: HashMap::new(),
            obstacle_cells: HashMap::new(),
            obstacles: Vec::new(),
            obstacle_stamps: Vec::new(),
            query_stamp: 0,
            max_agent_radius: 0.0,
            agent_count: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacle(&self, index: u32) -> Option<&Obstacle> {
        self.obstacles.get(index as usize)
    }

    fn cell_of(&self, x: f32, z: f32) -> CellKey {
        ((x * self.inv_cell).floor() as i32, (z * self.inv_cell).floor() as i32)
    }

    /// Register a static collider; returns its index.
    pub fn insert_obstacle(&mut self, obstacle: Obstacle) -> u32 {
        let index = self.obstacles.len() as u32;
        let radius = obstacle.bounding_radius();
        let center = obstacle.center;
        let (min_x, min_z) = self.cell_of(center.x - radius, center.z - radius);
        let (max_x, max_z) = self.cell_of(center.x + radius, center.z + radius);

        for cx in min_x..=max_x {
            for cz in min_z..=max_z {
                // Skip corner cells the circle only covers through its bounding square
                let lo_x = cx as f32 * self.cell_size;
                let lo_z = cz as f32 * self.cell_size;
                let near_x = center.x.clamp(lo_x, lo_x + self.cell_size);
                let near_z = center.z.clamp(lo_z, lo_z + self.cell_size);
                let dx = near_x - center.x;
                let dz = near_z - center.z;
                if dx * dx + dz * dz > radius * radius {
                    continue;
                }
                self.obstacle_cells.entry((cx, cz)).or_default().push(index);
            }
        }

        self.obstacles.push(obstacle);
        self.obstacle_stamps.push(0);
        index
    }

    /// Re-index every living agent at its current position.
    pub fn rebuild_agents(&mut self, pool: &AgentPool) {
        for bucket in self.agent_cells.values_mut() {
            bucket.clear();
        }
        self.max_agent_radius = 0.0;
        self.agent_count = 0;

        for agent in pool.iter() {
            if !agent.is_alive() {
                continue;
            }
            let radius = agent.hit_radius();
            let key = self.cell_of(agent.position.x, agent.position.z);
            self.agent_cells.entry(key).or_default().push(AgentEntry {
                id: agent.id,
                position: agent.position,
                radius,
            });
            self.max_agent_radius = self.max_agent_radius.max(radius);
            self.agent_count += 1;
        }

        self.agent_cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Cells holding at least one agent as of the last rebuild.
    pub fn occupied_cells(&self) -> usize {
        self.agent_cells.len()
    }

    /// Agents whose hit circle overlaps the query circle, sorted by slot.
    pub fn query_agents(&self, center: Vec3, radius: f32, out: &mut Vec<AgentEntry>) {
        out.clear();
        if self.agent_count == 0 {
            return;
        }

        let reach = radius + self.max_agent_radius;
        let (min_x, min_z) = self.cell_of(center.x - reach, center.z - reach);
        let (max_x, max_z) = self.cell_of(center.x + reach, center.z + reach);
        let span = (max_x as i64 - min_x as i64 + 1) * (max_z as i64 - min_z as i64 + 1);

        let mut collect = |bucket: &Vec<AgentEntry>| {
            for entry in bucket {
                let limit = radius + entry.radius;
                if crate::agent::planar_dist_sq(center, entry.position) < limit * limit {
                    out.push(*entry);
                }
            }
        };

        if span > self.agent_cells.len() as i64 {
            // Huge query: walking the occupied buckets is cheaper than the cell range
            for (&(cx, cz), bucket) in &self.agent_cells {
                if (min_x..=max_x).contains(&cx) && (min_z..=max_z).contains(&cz) {
                    collect(bucket);
                }
            }
        } else {
            for cx in min_x..=max_x {
                for cz in min_z..=max_z {
                    if let Some(bucket) = self.agent_cells.get(&(cx, cz)) {
                        collect(bucket);
                    }
                }
            }
        }

        out.sort_unstable_by_key(|entry| entry.id.slot);
        out.dedup_by_key(|entry| entry.id.slot);
    }

    /// Obstacles whose bounding circle overlaps the query circle, sorted by index.
    pub fn query_obstacles(&mut self, center: Vec3, radius: f32, out: &mut Vec<u32>) {
        out.clear();
        if self.obstacles.is_empty() {
            return;
        }

        self.query_stamp = self.query_stamp.wrapping_add(1);
        if self.query_stamp == 0 {
            self.obstacle_stamps.iter_mut().for_each(|stamp| *stamp = 0);
            self.query_stamp = 1;
        }

        let (min_x, min_z) = self.cell_of(center.x - radius, center.z - radius);
        let (max_x, max_z) = self.cell_of(center.x + radius, center.z + radius);
        for cx in min_x..=max_x {
            for cz in min_z..=max_z {
                let Some(bucket) = self.obstacle_cells.get(&(cx, cz)) else {
                    continue;
                };
                for &index in bucket {
                    let slot = index as usize;
                    if self.obstacle_stamps[slot] == self.query_stamp {
                        continue;
                    }
                    self.obstacle_stamps[slot] = self.query_stamp;

                    let obstacle = &self.obstacles[slot];
                    let limit = radius + obstacle.bounding_radius();
                    if crate::agent::planar_dist_sq(center, obstacle.center) < limit * limit {
                        out.push(index);
                    }
                }
            }
        }

        out.sort_unstable();
    }
}

/// System: re-index living agents at the start of the tick
pub fn rebuild_spatial_index(pool: Res<AgentPool>, mut index: ResMut<SpatialIndex>) {
    index.rebuild_agents(&pool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ArchetypeKind;
    use crate::config::SimulationConfig;

    fn pool_with(positions: &[Vec3]) -> AgentPool {
        let config = SimulationConfig::default();
        let mut pool = AgentPool::new(positions.len().max(1));
        for &position in positions {
            pool.spawn(&config, ArchetypeKind::Walker, position, 0.0, None);
        }
        pool
    }

    #[test]
    fn test_rebuild_drops_vacated_cells() {
        let mut pool = pool_with(&[Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)]);
        let mut index = SpatialIndex::new(2.0).expect("valid cell size");

        for step in 0..50 {
            for agent in pool.iter_mut() {
                agent.position.x = step as f32 * 3.0;
            }
            index.rebuild_agents(&pool);
        }

        assert_eq!(index.agent_count(), 2);
        assert_eq!(index.occupied_cells(), 1);
        let mut out = Vec::new();
        index.query_agents(Vec3::new(147.0, 0.0, 0.5), 2.0, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_invalid_cell_size_rejected() {
        assert!(SpatialIndex::new(0.0).is_err());
        assert!(SpatialIndex::new(-2.0).is_err());
        assert!(SpatialIndex::new(f32::NAN).is_err());
    }

    #[test]
    fn test_query_sorted_by_slot_without_duplicates() {
        let pool = pool_with(&[
            Vec3::new(3.9, 0.0, 0.0),
            Vec3::new(0.1, 0.0, 0.0),
            Vec3::new(-3.9, 0.0, 0.0),
            Vec3::new(20.0, 0.0, 0.0),
        ]);
        let mut index = SpatialIndex::new(4.0).expect("valid cell size");
        index.rebuild_agents(&pool);

        let mut out = Vec::new();
        index.query_agents(Vec3::ZERO, 5.0, &mut out);

        let slots: Vec<u32> = out.iter().map(|entry| entry.id.slot).collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    #[test]
    fn test_query_result_independent_of_spawn_order() {
        let forward = [Vec3::new(1.0, 0.0, 1.0), Vec3::new(-5.0, 0.0, 2.0), Vec3::new(2.0, 0.0, -3.0)];
        let mut reversed = forward;
        reversed.reverse();

        let mut index_a = SpatialIndex::new(2.0).expect("valid");
        let pool_a = pool_with(&forward);
        index_a.rebuild_agents(&pool_a);
        let mut index_b = SpatialIndex::new(2.0).expect("valid");
        let pool_b = pool_with(&reversed);
        index_b.rebuild_agents(&pool_b);

        let mut out_a = Vec::new();
        let mut out_b = Vec::new();
        index_a.query_agents(Vec3::ZERO, 10.0, &mut out_a);
        index_b.query_agents(Vec3::ZERO, 10.0, &mut out_b);

        let mut positions_a: Vec<_> = out_a.iter().map(|e| (e.position.x as i32, e.position.z as i32)).collect();
        let mut positions_b: Vec<_> = out_b.iter().map(|e| (e.position.x as i32, e.position.z as i32)).collect();
        positions_a.sort();
        positions_b.sort();
        assert_eq!(positions_a, positions_b);

        // Same input, same output on repeat
        let mut again = Vec::new();
        index_a.query_agents(Vec3::ZERO, 10.0, &mut again);
        assert_eq!(out_a, again);
    }

    #[test]
    fn test_query_includes_agent_radius_across_cells() {
        // Walker radius 0.5: center 5.3 away still overlaps a 5.0 query
        let pool = pool_with(&[Vec3::new(5.3, 0.0, 0.0)]);
        let mut index = SpatialIndex::new(1.0).expect("valid");
        index.rebuild_agents(&pool);

        let mut out = Vec::new();
        index.query_agents(Vec3::ZERO, 5.0, &mut out);
        assert_eq!(out.len(), 1);
        index.query_agents(Vec3::ZERO, 4.7, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_huge_query_matches_cell_walk() {
        let pool = pool_with(&[Vec3::new(1.0, 0.0, 1.0), Vec3::new(300.0, 0.0, -200.0)]);
        let mut index = SpatialIndex::new(1.0).expect("valid");
        index.rebuild_agents(&pool);

        let mut out = Vec::new();
        index.query_agents(Vec3::ZERO, 1000.0, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_obstacles_reported_once() {
        let mut index = SpatialIndex::new(1.0).expect("valid");
        let big = index.insert_obstacle(Obstacle::sphere(Vec3::ZERO, 3.0));
        let far = index.insert_obstacle(Obstacle::sphere(Vec3::new(50.0, 0.0, 0.0), 1.0));

        let mut out = Vec::new();
        index.query_obstacles(Vec3::new(0.5, 0.0, 0.5), 2.0, &mut out);
        assert_eq!(out, vec![big]);

        index.query_obstacles(Vec3::new(48.5, 0.0, 0.0), 1.0, &mut out);
        assert_eq!(out, vec![far]);
    }

    #[test]
    fn test_rebuild_reflects_movement_and_skips_dying() {
        let mut pool = pool_with(&[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]);
        let mut index = SpatialIndex::new(4.0).expect("valid");
        index.rebuild_agents(&pool);
        assert_eq!(index.agent_count(), 2);

        if let Some(agent) = pool.slot_mut(0) {
            agent.position = Vec3::new(40.0, 0.0, 40.0);
        }
        if let Some(agent) = pool.slot_mut(1) {
            agent.death_state = crate::agent::DeathState::Shot;
        }
        index.rebuild_agents(&pool);

        let mut out = Vec::new();
        index.query_agents(Vec3::ZERO, 3.0, &mut out);
        assert!(out.is_empty());
        index.query_agents(Vec3::new(40.0, 0.0, 40.0), 1.0, &mut out);
        assert_eq!(out.len(), 1);
    }
}
