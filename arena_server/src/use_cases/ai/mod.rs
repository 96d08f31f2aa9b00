// AI decision module: throttled, priority-ordered behavior selection for mobs and bots.

pub mod perception;
pub mod policies;

use crate::domain::EntityId;
use crate::domain::agent::{Agent, Behavior, Decision};
use crate::domain::ports::Perception;
use crate::domain::tuning::ai::AiTuning;
use crate::domain::world::World;
use glam::Vec2;
use policies::{BehaviorPolicy, PolicyContext, default_policies};
use rand::rngs::StdRng;
use std::collections::BTreeMap;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Mob,
    BotPlayer,
}

#[derive(Debug, Clone)]
struct AgentEntry {
    kind: AgentKind,
    last_update: Option<u64>,
}

pub struct AiModule {
    tuning: AiTuning,
    policies: Vec<Box<dyn BehaviorPolicy>>,
    agents: BTreeMap<EntityId, AgentEntry>,
    interval_ms: u64,
    last_run: Option<u64>,
}

impl std::fmt::Debug for AiModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiModule")
            .field("agents", &self.agents.len())
            .field("interval_ms", &self.interval_ms)
            .finish()
    }
}

impl AiModule {
    pub fn new(tuning: AiTuning) -> Self {
        let rate = tuning.decision_rate_hz.max(1) as u64;
        Self {
            tuning,
            policies: default_policies(),
            agents: BTreeMap::new(),
            interval_ms: 1000 / rate,
            last_run: None,
        }
    }

    /// Returns false when the agent is already registered.
    pub fn register(&mut self, id: EntityId, kind: AgentKind) -> bool {
        if self.agents.contains_key(&id) {
            return false;
        }
        self.agents.insert(
            id,
            AgentEntry {
                kind,
                last_update: None,
            },
        );
        true
    }

    pub fn unregister(&mut self, id: EntityId) -> bool {
        self.agents.remove(&id).is_some()
    }

    pub fn is_registered(&self, id: EntityId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn kind_of(&self, id: EntityId) -> Option<AgentKind> {
        self.agents.get(&id).map(|e| e.kind)
    }

    pub fn last_update(&self, id: EntityId) -> Option<u64> {
        self.agents.get(&id).and_then(|e| e.last_update)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// One decision pass. Returns `None` when throttled, otherwise the desired velocity of
    /// every registered agent, capped at its effective max speed.
    pub fn run(
        &mut self,
        now: u64,
        world: &mut World,
        perception: &dyn Perception,
        rng: &mut StdRng,
    ) -> Option<Vec<(EntityId, Vec2)>> {
        if self
            .last_run
            .is_some_and(|last| now.saturating_sub(last) < self.interval_ms)
        {
            return None;
        }
        self.last_run = Some(now);

        let ids: Vec<EntityId> = self.agents.keys().copied().collect();
        let mut velocities = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            let Some(agent) = world.agent(id) else {
                missing.push(id);
                continue;
            };

            if !agent.combatant().is_alive {
                if let Some(agent) = world.agent_mut(id) {
                    agent.agent_state_mut().reset();
                }
                velocities.push((id, Vec2::ZERO));
                continue;
            }

            // Locked decisions are re-emitted as they are.
            if agent.is_locked(now) {
                velocities.push((id, agent.agent_state().desired_velocity));
                continue;
            }

            let decision = {
                let range = self.tuning.perception_range;
                let Some(snapshot) =
                    perception.query(world, id, range, self.tuning.boundary_buffer)
                else {
                    missing.push(id);
                    continue;
                };
                let mut ctx = PolicyContext {
                    snapshot,
                    tuning: &self.tuning,
                    rng: &mut *rng,
                    now,
                };
                decide(&self.policies, agent, &mut ctx)
            };

            if let Some(agent) = world.agent_mut(id) {
                let max_speed = agent.effective_max_speed(now);
                let mut decision = decision;
                decision.desired_velocity = decision.desired_velocity.clamp_length_max(max_speed);
                trace!(agent = %id, behavior = decision.behavior.as_str(), "ai decision");
                agent.apply_decision(&decision, now);
                velocities.push((id, decision.desired_velocity));
            }
            if let Some(entry) = self.agents.get_mut(&id) {
                entry.last_update = Some(now);
            }
        }

        for id in missing {
            warn!(agent = %id, "ai agent missing from world; unregistering");
            self.agents.remove(&id);
        }
        Some(velocities)
    }
}

fn decide(
    policies: &[Box<dyn BehaviorPolicy>],
    agent: &dyn Agent,
    ctx: &mut PolicyContext<'_>,
) -> Decision {
    for policy in policies {
        if policy.can_apply(agent, ctx) {
            return policy.decide(agent, ctx);
        }
    }
    Decision::new(Behavior::Idle, Vec2::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attack::MeleeStrategy;
    use crate::domain::combatant::TargetInfo;
    use crate::domain::ports::PerceptionSnapshot;
    use crate::domain::mob::Mob;
    use crate::domain::player::Player;
    use crate::domain::tuning::mob::default_archetypes;
    use crate::domain::tuning::player::PlayerTuning;
    use crate::use_cases::ai::perception::WorldPerception;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn world_with_mob_and_player() -> World {
        let mut world = World::default();
        let mut archetype = default_archetypes()[0].clone();
        archetype.profile.attack_range = 10.0;
        world.mobs.insert(
            1,
            Mob::new(
                1,
                &archetype,
                Vec2::new(100.0, 100.0),
                vec![Arc::new(MeleeStrategy::default())],
                0,
            ),
        );
        world.players.insert(
            2,
            Player::new(
                2,
                "p".into(),
                Vec2::new(105.0, 100.0),
                &PlayerTuning::default(),
                Vec::new(),
            ),
        );
        world
    }

    /// Reports one fixed opponent regardless of what the world holds.
    struct FixedSighting {
        target: TargetInfo,
        distance: f32,
    }

    impl Perception for FixedSighting {
        fn query(
            &self,
            world: &World,
            agent: EntityId,
            _range: f32,
            _boundary_buffer: f32,
        ) -> Option<PerceptionSnapshot> {
            world.combatant(agent)?;
            Some(PerceptionSnapshot {
                nearest_opposing: Some(self.target),
                distance: Some(self.distance),
                near_boundary: false,
                bounds: world.bounds,
            })
        }
    }

    #[test]
    fn when_perception_is_injected_then_decisions_follow_what_it_reports() {
        let mut world = world_with_mob_and_player();
        world.players.clear();
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Mob(1), AgentKind::Mob);
        let sighting = FixedSighting {
            target: TargetInfo {
                id: EntityId::Player(42),
                position: Vec2::new(104.0, 100.0),
                radius: 1.0,
                is_alive: true,
            },
            distance: 4.0,
        };

        ai.run(0, &mut world, &sighting, &mut rng).expect("pass");

        let mob = &world.mobs[&1];
        assert_eq!(mob.agent.current_behavior, Behavior::Attack);
        assert_eq!(mob.agent.attack_target, Some(EntityId::Player(42)));
    }

    #[test]
    fn when_registered_twice_then_second_registration_fails() {
        let mut ai = AiModule::new(AiTuning::default());
        assert!(ai.register(EntityId::Mob(1), AgentKind::Mob));
        assert!(!ai.register(EntityId::Mob(1), AgentKind::Mob));
        assert!(ai.unregister(EntityId::Mob(1)));
        assert!(!ai.unregister(EntityId::Mob(1)));
    }

    #[test]
    fn when_mob_sees_player_in_range_then_it_attacks_that_player() {
        let mut world = world_with_mob_and_player();
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Mob(1), AgentKind::Mob);

        let velocities = ai
            .run(0, &mut world, &WorldPerception, &mut rng)
            .expect("first pass runs");

        assert_eq!(velocities, vec![(EntityId::Mob(1), Vec2::ZERO)]);
        let mob = &world.mobs[&1];
        assert_eq!(mob.agent.current_behavior, Behavior::Attack);
        assert_eq!(mob.agent.attack_target, Some(EntityId::Player(2)));
        assert_eq!(ai.last_update(EntityId::Mob(1)), Some(0));
    }

    #[test]
    fn when_called_faster_than_decision_rate_then_pass_is_skipped() {
        let mut world = world_with_mob_and_player();
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Mob(1), AgentKind::Mob);

        assert!(ai.run(0, &mut world, &WorldPerception, &mut rng).is_some());
        assert!(ai.run(20, &mut world, &WorldPerception, &mut rng).is_none());
        assert!(ai.run(50, &mut world, &WorldPerception, &mut rng).is_some());
    }

    #[test]
    fn when_decision_locked_then_previous_velocity_is_reemitted() {
        let mut world = world_with_mob_and_player();
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Mob(1), AgentKind::Mob);
        ai.run(0, &mut world, &WorldPerception, &mut rng);

        // Move the player away; the attack lock keeps the old decision for 500 ms.
        if let Some(p) = world.players.get_mut(&2) {
            p.combatant.set_position(Vec2::new(400.0, 400.0));
        }
        ai.run(100, &mut world, &WorldPerception, &mut rng);
        assert_eq!(world.mobs[&1].agent.current_behavior, Behavior::Attack);

        ai.run(600, &mut world, &WorldPerception, &mut rng);
        assert_eq!(world.mobs[&1].agent.current_behavior, Behavior::Wander);
    }

    #[test]
    fn when_agent_dead_then_zero_velocity_is_emitted() {
        let mut world = world_with_mob_and_player();
        if let Some(m) = world.mobs.get_mut(&1) {
            m.combatant.die(0);
        }
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Mob(1), AgentKind::Mob);

        let velocities = ai.run(0, &mut world, &WorldPerception, &mut rng).expect("pass");
        assert_eq!(velocities, vec![(EntityId::Mob(1), Vec2::ZERO)]);
    }

    #[test]
    fn when_agent_missing_from_world_then_it_is_unregistered() {
        let mut world = World::default();
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Mob(9), AgentKind::Mob);

        let velocities = ai.run(0, &mut world, &WorldPerception, &mut rng).expect("pass");

        assert!(velocities.is_empty());
        assert!(!ai.is_registered(EntityId::Mob(9)));
    }

    #[test]
    fn when_bot_player_registered_then_it_targets_mobs() {
        let mut world = world_with_mob_and_player();
        if let Some(p) = world.players.get_mut(&2) {
            p.strategies = vec![Arc::new(MeleeStrategy::default())];
            p.is_bot = true;
        }
        let mut ai = AiModule::new(AiTuning::default());
        let mut rng = StdRng::seed_from_u64(7);
        ai.register(EntityId::Player(2), AgentKind::BotPlayer);

        ai.run(0, &mut world, &WorldPerception, &mut rng);

        let player = &world.players[&2];
        assert_eq!(player.agent.current_behavior, Behavior::Chase);
        assert_eq!(player.agent.chase_target, Some(EntityId::Mob(1)));
    }
}
