// Entity storage for one room. BTreeMaps keep iteration order stable across ticks.

use crate::domain::agent::Agent;
use crate::domain::combatant::{Combatant, TargetInfo};
use crate::domain::geometry::WorldBounds;
use crate::domain::ids::EntityId;
use crate::domain::mob::Mob;
use crate::domain::player::Player;
use crate::domain::projectile::Projectile;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct World {
    pub bounds: WorldBounds,
    pub players: BTreeMap<u64, Player>,
    pub mobs: BTreeMap<u64, Mob>,
    pub projectiles: BTreeMap<u64, Projectile>,
}

impl World {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        match id {
            EntityId::Player(raw) => self.players.contains_key(&raw),
            EntityId::Mob(raw) => self.mobs.contains_key(&raw),
        }
    }

    pub fn combatant(&self, id: EntityId) -> Option<&Combatant> {
        match id {
            EntityId::Player(raw) => self.players.get(&raw).map(|p| &p.combatant),
            EntityId::Mob(raw) => self.mobs.get(&raw).map(|m| &m.combatant),
        }
    }

    pub fn combatant_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        match id {
            EntityId::Player(raw) => self.players.get_mut(&raw).map(|p| &mut p.combatant),
            EntityId::Mob(raw) => self.mobs.get_mut(&raw).map(|m| &mut m.combatant),
        }
    }

    pub fn agent(&self, id: EntityId) -> Option<&dyn Agent> {
        match id {
            EntityId::Player(raw) => self.players.get(&raw).map(|p| p as &dyn Agent),
            EntityId::Mob(raw) => self.mobs.get(&raw).map(|m| m as &dyn Agent),
        }
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut dyn Agent> {
        match id {
            EntityId::Player(raw) => self.players.get_mut(&raw).map(|p| p as &mut dyn Agent),
            EntityId::Mob(raw) => self.mobs.get_mut(&raw).map(|m| m as &mut dyn Agent),
        }
    }

    /// Players first, then mobs, each in id order.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.players
            .values()
            .map(|p| &p.combatant)
            .chain(self.mobs.values().map(|m| &m.combatant))
    }

    /// Closest living entity on the other side within `range` (edge to edge is not considered).
    pub fn nearest_opponent(&self, id: EntityId, range: f32) -> Option<(TargetInfo, f32)> {
        let me = self.combatant(id)?;
        let origin = me.position();
        self.combatants()
            .filter(|c| c.is_alive && id.opposes(c.id))
            .map(|c| (c.target_info(), c.distance_to(origin)))
            .filter(|(_, d)| *d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    pub fn alive_mob_count(&self) -> usize {
        self.mobs.values().filter(|m| m.combatant.is_alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::mob::default_archetypes;
    use crate::domain::tuning::player::PlayerTuning;
    use glam::Vec2;

    fn world_with(players: &[(u64, Vec2)], mobs: &[(u64, Vec2)]) -> World {
        let mut world = World::default();
        for (id, pos) in players {
            let p = Player::new(*id, format!("p{id}"), *pos, &PlayerTuning::default(), Vec::new());
            world.players.insert(*id, p);
        }
        let archetype = &default_archetypes()[0];
        for (id, pos) in mobs {
            world.mobs.insert(*id, Mob::new(*id, archetype, *pos, Vec::new(), 0));
        }
        world
    }

    #[test]
    fn when_several_opponents_in_range_then_closest_alive_wins() {
        let mut world = world_with(
            &[(1, Vec2::new(0.0, 0.0))],
            &[(1, Vec2::new(3.0, 0.0)), (2, Vec2::new(6.0, 0.0)), (3, Vec2::new(1.0, 0.0))],
        );
        if let Some(m) = world.mobs.get_mut(&3) {
            m.combatant.die(0);
        }

        let (target, distance) = world
            .nearest_opponent(EntityId::Player(1), 50.0)
            .expect("target");
        assert_eq!(target.id, EntityId::Mob(1));
        assert!((distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn when_only_allies_nearby_then_no_opponent_is_found() {
        let world = world_with(&[], &[(1, Vec2::ZERO), (2, Vec2::new(1.0, 0.0))]);
        assert!(world.nearest_opponent(EntityId::Mob(1), 50.0).is_none());
    }

    #[test]
    fn when_player_and_mob_share_raw_id_then_lookups_stay_separate() {
        let world = world_with(&[(7, Vec2::ZERO)], &[(7, Vec2::new(9.0, 0.0))]);
        let player = world.combatant(EntityId::Player(7)).expect("player");
        let mob = world.combatant(EntityId::Mob(7)).expect("mob");
        assert_ne!(player.x, mob.x);
    }
}
