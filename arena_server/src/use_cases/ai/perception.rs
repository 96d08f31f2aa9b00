use crate::domain::EntityId;
use crate::domain::ports::{Perception, PerceptionSnapshot};
use crate::domain::world::World;

/// Perception backed by the room's own entity maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldPerception;

impl Perception for WorldPerception {
    fn query(
        &self,
        world: &World,
        agent: EntityId,
        range: f32,
        boundary_buffer: f32,
    ) -> Option<PerceptionSnapshot> {
        let me = world.combatant(agent)?;
        let bounds = world.bounds;
        let edge = boundary_buffer + me.radius;
        let near_boundary = me.x - bounds.min_x < edge
            || bounds.max_x - me.x < edge
            || me.y - bounds.min_y < edge
            || bounds.max_y - me.y < edge;

        let nearest = world.nearest_opponent(agent, range);
        Some(PerceptionSnapshot {
            nearest_opposing: nearest.map(|(target, _)| target),
            distance: nearest.map(|(_, d)| d),
            near_boundary,
            bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mob::Mob;
    use crate::domain::player::Player;
    use crate::domain::tuning::mob::default_archetypes;
    use crate::domain::tuning::player::PlayerTuning;
    use glam::Vec2;

    #[test]
    fn when_agent_hugs_an_edge_then_boundary_is_flagged() {
        let mut world = World::default();
        let archetype = &default_archetypes()[0];
        world
            .mobs
            .insert(1, Mob::new(1, archetype, Vec2::new(3.0, 250.0), Vec::new(), 0));
        world
            .mobs
            .insert(2, Mob::new(2, archetype, Vec2::new(250.0, 250.0), Vec::new(), 0));
        let edge = WorldPerception.query(&world, EntityId::Mob(1), 60.0, 5.0).expect("mob 1");
        let center = WorldPerception.query(&world, EntityId::Mob(2), 60.0, 5.0).expect("mob 2");

        assert!(edge.near_boundary);
        assert!(!center.near_boundary);
    }

    #[test]
    fn when_opponent_in_range_then_snapshot_reports_it_with_distance() {
        let mut world = World::default();
        let archetype = &default_archetypes()[0];
        world
            .mobs
            .insert(1, Mob::new(1, archetype, Vec2::new(100.0, 100.0), Vec::new(), 0));
        world.players.insert(
            4,
            Player::new(
                4,
                "p".into(),
                Vec2::new(104.0, 103.0),
                &PlayerTuning::default(),
                Vec::new(),
            ),
        );

        let snapshot = WorldPerception
            .query(&world, EntityId::Mob(1), 60.0, 5.0)
            .expect("snapshot");

        assert_eq!(snapshot.nearest_opposing.map(|t| t.id), Some(EntityId::Player(4)));
        assert_eq!(snapshot.distance, Some(5.0));
    }

    #[test]
    fn when_agent_missing_then_query_returns_none() {
        let world = World::default();
        assert!(WorldPerception.query(&world, EntityId::Mob(1), 60.0, 5.0).is_none());
    }
}
