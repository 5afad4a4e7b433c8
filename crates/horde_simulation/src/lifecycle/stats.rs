//! Kill statistics, finalized when a dead agent is reclaimed

use bevy::prelude::*;

use crate::agent::ArchetypeKind;

#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct KillStats {
    pub kills_by_archetype: [u32; ArchetypeKind::COUNT],
    pub total_kills: u32,
    /// Kills of agents that belonged to a wave
    pub horde_kills: u32,
    /// Sum of reported (hp-clamped) damage
    pub total_damage: f32,
    pub total_score: u64,
    pub total_xp: u64,
    pub bosses_defeated: u32,
    pub spawned: u32,
    /// Spawn requests refused at the population cap
    pub dropped_spawns: u32,
    pub peak_population: usize,
}

impl KillStats {
    pub fn kills_of(&self, kind: ArchetypeKind) -> u32 {
        self.kills_by_archetype[kind.index()]
    }

    pub fn record_kill(&mut self, kind: ArchetypeKind, score: u32, xp: u32, in_wave: bool) {
        self.kills_by_archetype[kind.index()] += 1;
        self.total_kills += 1;
        self.total_score += u64::from(score);
        self.total_xp += u64::from(xp);
        if in_wave {
            self.horde_kills += 1;
        }
    }

    pub fn record_population(&mut self, population: usize) {
        self.peak_population = self.peak_population.max(population);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_kill_counts_by_type() {
        let mut stats = KillStats::default();
        stats.record_kill(ArchetypeKind::Runner, 15, 6, true);
        stats.record_kill(ArchetypeKind::Runner, 15, 6, false);
        stats.record_kill(ArchetypeKind::Brute, 40, 20, false);

        assert_eq!(stats.kills_of(ArchetypeKind::Runner), 2);
        assert_eq!(stats.kills_of(ArchetypeKind::Brute), 1);
        assert_eq!(stats.kills_of(ArchetypeKind::Walker), 0);
        assert_eq!(stats.total_kills, 3);
        assert_eq!(stats.horde_kills, 1);
        assert_eq!(stats.total_score, 70);
    }

    #[test]
    fn test_peak_population_only_grows() {
        let mut stats = KillStats::default();
        stats.record_population(10);
        stats.record_population(4);
        assert_eq!(stats.peak_population, 10);
    }
}
