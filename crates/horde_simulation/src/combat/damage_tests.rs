#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::agent::{AgentId, ArchetypeKind, DamageCause};
    use crate::combat::damage::{apply_damage, deal_damage, is_high_impact, splash_force, Hit};
    use crate::combat::projectile::{fire, update_projectiles, CombatScratch, ProjectileWorld};
    use crate::combat::weapon_stats::{Pierce, WeaponId};
    use crate::config::SimulationConfig;
    use crate::events::HordeEvent;
    use crate::lifecycle::AgentPool;
    use crate::spatial::obstacle::Obstacle;
    use crate::spatial::SpatialIndex;

    const DT: f32 = 1.0 / 60.0;

    struct Range {
        config: SimulationConfig,
        pool: AgentPool,
        index: SpatialIndex,
        world: ProjectileWorld,
        scratch: CombatScratch,
        rng: ChaCha8Rng,
        events: Vec<HordeEvent>,
        now: f32,
    }

    impl Range {
        fn new(config: SimulationConfig) -> Self {
            let index = SpatialIndex::new(config.spatial.cell_size).expect("index");
            Self {
                pool: AgentPool::new(config.pool.max_agents),
                world: ProjectileWorld::new(config.pool.projectile_capacity, config.pool.fire_zone_capacity),
                config,
                index,
                scratch: CombatScratch::default(),
                rng: ChaCha8Rng::seed_from_u64(7),
                events: Vec::new(),
                now: 1.0,
            }
        }

        fn spawn(&mut self, kind: ArchetypeKind, z: f32) -> AgentId {
            let id = self
                .pool
                .spawn(&self.config, kind, Vec3::new(0.0, 0.0, z), 0.0, None)
                .expect("spawn");
            self.index.rebuild_agents(&self.pool);
            id
        }

        fn shoot(&mut self, weapon: WeaponId) {
            let stats = *self.config.weapons.get(weapon);
            fire(
                &mut self.world,
                &stats,
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::Z,
                &mut self.rng,
                &mut self.events,
            );
        }

        /// Step until every projectile is gone
        fn settle(&mut self) -> f32 {
            let mut total = 0.0;
            for _ in 0..240 {
                if self.world.projectiles.is_empty() {
                    break;
                }
                self.now += DT;
                total += update_projectiles(
                    &mut self.world,
                    &mut self.pool,
                    &mut self.index,
                    &self.config,
                    self.now,
                    DT,
                    &mut self.scratch,
                    &mut self.events,
                );
            }
            total
        }

        fn damage_events(&self) -> Vec<f32> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    HordeEvent::DamageDealt { amount, .. } => Some(*amount),
                    _ => None,
                })
                .collect()
        }

        fn hp(&self, id: AgentId) -> f32 {
            self.pool.get(id).expect("agent").hp
        }
    }

    fn without_spread(mut config: SimulationConfig) -> SimulationConfig {
        for weapon in config.weapons.weapons.iter_mut() {
            weapon.spread = 0.0;
        }
        config
    }

    #[test]
    fn test_piercing_decay_then_floor() {
        let mut config = without_spread(SimulationConfig::default());
        if let Some(rifle) = config.weapons.get_mut(WeaponId::Rifle) {
            rifle.base_damage = 100.0;
            rifle.pierce = Some(Pierce { decay: 0.7, floor: 40.0 });
        }
        let mut range = Range::new(config);
        let brutes: Vec<AgentId> = [5.0, 10.0, 15.0, 20.0]
            .iter()
            .map(|&z| range.spawn(ArchetypeKind::Brute, z))
            .collect();

        range.shoot(WeaponId::Rifle);
        range.settle();

        let dealt = range.damage_events();
        assert_eq!(dealt.len(), 3);
        assert_relative_eq!(dealt[0], 100.0, epsilon = 1e-3);
        assert_relative_eq!(dealt[1], 70.0, epsilon = 1e-3);
        assert_relative_eq!(dealt[2], 49.0, epsilon = 1e-3);

        assert_relative_eq!(range.hp(brutes[0]), 120.0, epsilon = 1e-3);
        assert_relative_eq!(range.hp(brutes[1]), 150.0, epsilon = 1e-3);
        assert_relative_eq!(range.hp(brutes[2]), 171.0, epsilon = 1e-3);
        assert_eq!(range.hp(brutes[3]), 220.0, "bullet should stop below the floor");
    }

    #[test]
    fn test_revolver_pierces_runner_into_walker() {
        let mut range = Range::new(without_spread(SimulationConfig::default()));
        let runner = range.spawn(ArchetypeKind::Runner, 5.0);
        let walker = range.spawn(ArchetypeKind::Walker, 10.0);

        range.shoot(WeaponId::Revolver);
        let total = range.settle();

        // 60 on the runner (30 hp left), 42 on the walker (40 hp left)
        let dealt = range.damage_events();
        assert_eq!(dealt.len(), 2);
        assert_relative_eq!(dealt[0], 30.0, epsilon = 1e-3);
        assert_relative_eq!(dealt[1], 40.0, epsilon = 1e-3);
        assert_relative_eq!(total, 70.0, epsilon = 1e-3);

        let runner = range.pool.get(runner).expect("runner");
        let walker = range.pool.get(walker).expect("walker");
        assert_relative_eq!(runner.hp, -30.0, epsilon = 1e-3);
        assert_relative_eq!(walker.hp, -2.0, epsilon = 1e-3);
        assert!(runner.last_hit.expect("runner hit").high_impact);
        assert!(!walker.last_hit.expect("walker hit").high_impact);
    }

    #[test]
    fn test_shotgun_close_range_is_high_impact() {
        let mut range = Range::new(without_spread(SimulationConfig::default()));
        let walker = range.spawn(ArchetypeKind::Walker, 4.0);

        range.shoot(WeaponId::Shotgun);
        range.settle();

        let agent = range.pool.get(walker).expect("walker");
        assert!(agent.hp <= 0.0);
        let last = agent.last_hit.expect("hit");
        assert!(last.high_impact);
        assert_eq!(last.cause, DamageCause::Ballistic);
        // three pellets finish 40 hp; the rest pass an untargetable agent
        assert_eq!(range.damage_events().len(), 3);
    }

    #[test]
    fn test_high_impact_classes() {
        let config = SimulationConfig::default();
        let shotgun = config.weapons.get(WeaponId::Shotgun);
        let revolver = config.weapons.get(WeaponId::Revolver);
        let pistol = config.weapons.get(WeaponId::Pistol);

        assert!(is_high_impact(shotgun, &config.combat, 4.0, 15.0));
        assert!(!is_high_impact(shotgun, &config.combat, 8.0, 15.0));
        assert!(is_high_impact(revolver, &config.combat, 30.0, 60.0));
        assert!(!is_high_impact(revolver, &config.combat, 1.0, 42.0));
        assert!(!is_high_impact(pistol, &config.combat, 0.5, 25.0));
    }

    #[test]
    fn test_obstacle_stops_bullet_before_agent() {
        let mut range = Range::new(without_spread(SimulationConfig::default()));
        let walker = range.spawn(ArchetypeKind::Walker, 10.0);
        range.index.insert_obstacle(Obstacle::sphere(Vec3::new(0.0, 0.0, 5.0), 1.0));

        range.shoot(WeaponId::Revolver);
        range.settle();

        assert_eq!(range.hp(walker), 40.0);
        assert!(range.events.contains(&HordeEvent::Sound {
            id: crate::events::SoundId::BulletImpact
        }));
    }

    #[test]
    fn test_splash_force_falloff() {
        let (min, max) = (6.0, 24.0);
        let at_center = splash_force(0.0, 10.0, min, max);
        let mid = splash_force(5.0, 10.0, min, max);
        let edge = splash_force(10.0, 10.0, min, max);

        assert_relative_eq!(at_center, max);
        assert_relative_eq!(edge, min);
        assert!(mid > min && mid < max);
        assert!(splash_force(2.0, 10.0, min, max) > splash_force(7.0, 10.0, min, max));
    }

    #[test]
    fn test_reported_damage_is_clamped() {
        let config = SimulationConfig::default();
        let mut pool = AgentPool::new(4);
        let id = pool
            .spawn(&config, ArchetypeKind::Walker, Vec3::ZERO, 0.0, None)
            .expect("spawn");
        let mut events = Vec::new();
        let agent = pool.get_mut(id).expect("agent");

        let reported = deal_damage(agent, &Hit::new(100.0, DamageCause::Ballistic), 1.0, &mut events);
        assert_eq!(reported, Some(40.0));
        assert_eq!(agent.hp, -60.0);
        assert_eq!(
            events,
            vec![HordeEvent::DamageDealt {
                amount: 40.0,
                is_boss: false
            }]
        );

        // hp already at or below zero: further hits are ignored
        assert_eq!(apply_damage(agent, &Hit::new(10.0, DamageCause::Ballistic), 1.1), None);
        assert_eq!(agent.hp, -60.0);
    }

    #[test]
    fn test_spawn_protection_ignores_damage() {
        let config = SimulationConfig::default();
        let mut pool = AgentPool::new(4);
        let id = pool
            .spawn(&config, ArchetypeKind::Boss, Vec3::ZERO, 0.0, None)
            .expect("spawn");
        let agent = pool.get_mut(id).expect("agent");

        assert_eq!(apply_damage(agent, &Hit::new(10.0, DamageCause::Ballistic), 0.1), None);
        assert_eq!(agent.hp, 1500.0);
        assert!(agent.last_hit.is_none());

        let mut events = Vec::new();
        assert_eq!(
            deal_damage(agent, &Hit::new(10.0, DamageCause::Ballistic), 0.5, &mut events),
            Some(10.0)
        );
        assert_eq!(
            events,
            vec![HordeEvent::DamageDealt {
                amount: 10.0,
                is_boss: true
            }]
        );
        assert_eq!(agent.last_hit_time, 0.5);
    }
}
