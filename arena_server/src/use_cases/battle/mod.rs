// Battle module: every externally triggered combat effect goes through the action queue and
// is resolved here in batches.

pub mod queue;
pub mod rules;

use crate::domain::EntityId;
use crate::domain::attack::AttackRejection;
use crate::domain::world::World;
use crate::use_cases::events::{EventBus, RoomEvent};
use crate::use_cases::timers::{ATTACK_ANIMATION_MS, TimerEffect, TimerQueue};
use glam::Vec2;
use queue::{BattleAction, BattleActionMessage, BattleActionQueue};
use rules::{DamageResult, RespawnRejection};
use tracing::{trace, warn};

/// Minimum spacing between overflow warnings.
const DROP_WARN_INTERVAL_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy)]
pub struct BattleSettings {
    pub drain_interval_ms: u64,
    pub batch_size: usize,
    pub queue_capacity: usize,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            drain_interval_ms: 100,
            batch_size: 256,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingActor,
    MissingTarget,
    ActorDead,
    TargetDead,
    OutOfRange,
    OnCooldown,
    Stunned,
    Invulnerable,
    CantRespawn,
    AlreadyAlive,
}

impl From<AttackRejection> for RejectReason {
    fn from(r: AttackRejection) -> Self {
        match r {
            AttackRejection::AttackerDead => RejectReason::ActorDead,
            AttackRejection::TargetDead => RejectReason::TargetDead,
            AttackRejection::MissingTarget => RejectReason::MissingTarget,
            AttackRejection::OutOfRange => RejectReason::OutOfRange,
            AttackRejection::Stunned => RejectReason::Stunned,
            AttackRejection::OnCooldown | AttackRejection::Busy | AttackRejection::NoStrategy => {
                RejectReason::OnCooldown
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Rejected(RejectReason),
}

/// Mutable room state an action may touch besides the world itself.
pub struct BattleContext<'a> {
    pub world: &'a mut World,
    pub events: &'a mut EventBus,
    pub timers: &'a mut TimerQueue,
}

#[derive(Debug)]
pub struct BattleModule {
    settings: BattleSettings,
    queue: BattleActionQueue,
    last_drain: Option<u64>,
    last_drop_warn: Option<u64>,
}

impl BattleModule {
    pub fn new(settings: BattleSettings) -> Self {
        Self {
            queue: BattleActionQueue::new(settings.queue_capacity),
            settings,
            last_drain: None,
            last_drop_warn: None,
        }
    }

    /// Queues `msg`. On overflow the oldest message is dropped and handed back.
    pub fn submit(&mut self, msg: BattleActionMessage, now: u64) -> Option<BattleActionMessage> {
        let evicted = self.queue.push(msg)?;
        let due = self
            .last_drop_warn
            .is_none_or(|at| now.saturating_sub(at) >= DROP_WARN_INTERVAL_MS);
        if due {
            self.last_drop_warn = Some(now);
            warn!(
                dropped_total = self.queue.dropped(),
                action = evicted.action_key(),
                target = %evicted.target_id,
                "battle queue full; dropping oldest action"
            );
        }
        Some(evicted)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    /// Next batch when the drain interval has elapsed.
    pub fn drain_due(&mut self, now: u64) -> Option<Vec<BattleActionMessage>> {
        if self
            .last_drain
            .is_some_and(|at| now.saturating_sub(at) < self.settings.drain_interval_ms)
        {
            return None;
        }
        self.last_drain = Some(now);
        Some(self.queue.drain(self.settings.batch_size))
    }
}

/// Resolves one action. Invalid requests are rejected, never panicked on.
pub fn resolve(ctx: &mut BattleContext<'_>, msg: &BattleActionMessage, now: u64) -> ActionOutcome {
    let target = msg.target_id;
    let outcome = match &msg.action {
        BattleAction::Attack { damage, reach } => {
            resolve_attack(ctx, msg.actor_id, target, *damage, *reach, now)
        }
        BattleAction::Damage { amount } => match ctx.world.combatant(target) {
            None => ActionOutcome::Rejected(RejectReason::MissingTarget),
            Some(c) => {
                let amount = rules::calculate_damage(*amount, c.defense, c.armor);
                deal_damage(ctx, msg.actor_id, target, amount, now)
            }
        },
        BattleAction::Heal { amount } => match ctx.world.combatant_mut(target) {
            None => ActionOutcome::Rejected(RejectReason::MissingTarget),
            Some(c) => match rules::heal(c, *amount, now) {
                None => ActionOutcome::Rejected(RejectReason::TargetDead),
                Some(healed) => {
                    let health = c.health;
                    ctx.events.publish(RoomEvent::EntityHealed {
                        target,
                        amount: healed,
                        health,
                    });
                    ActionOutcome::Applied
                }
            },
        },
        BattleAction::Kill => match ctx.world.combatant_mut(target) {
            None => ActionOutcome::Rejected(RejectReason::MissingTarget),
            Some(c) => {
                if c.die(now) {
                    ctx.events.publish(RoomEvent::EntityDied {
                        target,
                        killer: msg.actor_id,
                    });
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::Rejected(RejectReason::TargetDead)
                }
            }
        },
        BattleAction::Respawn { position } => resolve_respawn(ctx, target, *position),
        BattleAction::ApplyStatus {
            status,
            duration_ms,
        } => match ctx.world.combatant_mut(target) {
            None => ActionOutcome::Rejected(RejectReason::MissingTarget),
            Some(c) if !c.is_alive => ActionOutcome::Rejected(RejectReason::TargetDead),
            Some(c) => {
                let until = now + duration_ms;
                c.apply_status(*status, until);
                ctx.events.publish(RoomEvent::StatusApplied {
                    target,
                    status: *status,
                    until,
                });
                ActionOutcome::Applied
            }
        },
    };

    if let ActionOutcome::Rejected(reason) = outcome {
        trace!(
            action = msg.action_key(),
            %target,
            reason = ?reason,
            "battle action rejected"
        );
    }
    outcome
}

fn resolve_attack(
    ctx: &mut BattleContext<'_>,
    actor: Option<EntityId>,
    target: EntityId,
    damage: Option<i32>,
    reach: Option<f32>,
    now: u64,
) -> ActionOutcome {
    let Some(actor) = actor else {
        return ActionOutcome::Rejected(RejectReason::MissingActor);
    };
    let (Some(a), Some(t)) = (ctx.world.combatant(actor), ctx.world.combatant(target)) else {
        let reason = if ctx.world.contains(actor) {
            RejectReason::MissingTarget
        } else {
            RejectReason::MissingActor
        };
        return ActionOutcome::Rejected(reason);
    };
    if !t.is_alive {
        return ActionOutcome::Rejected(RejectReason::TargetDead);
    }

    let base = match damage {
        // Committed strike: the cooldown was paid when the step executed.
        Some(base) => {
            let reach = reach.unwrap_or(a.attack_range + a.radius) + t.radius;
            if a.distance_to(t.position()) > reach {
                return ActionOutcome::Rejected(RejectReason::OutOfRange);
            }
            base
        }
        None => {
            if let Err(rejection) = rules::can_attack(a, t, now) {
                return ActionOutcome::Rejected(rejection.into());
            }
            let base = a.attack_damage;
            if let Some(a) = ctx.world.combatant_mut(actor) {
                a.mark_attack(now, None);
            }
            ctx.timers.schedule(
                now + ATTACK_ANIMATION_MS,
                TimerEffect::ResetAttackAnimation(actor),
            );
            base
        }
    };

    let amount = match ctx.world.combatant(target) {
        Some(t) => rules::calculate_damage(base, t.defense, t.armor),
        None => return ActionOutcome::Rejected(RejectReason::MissingTarget),
    };
    deal_damage(ctx, Some(actor), target, amount, now)
}

fn deal_damage(
    ctx: &mut BattleContext<'_>,
    source: Option<EntityId>,
    target: EntityId,
    amount: i32,
    now: u64,
) -> ActionOutcome {
    let Some(c) = ctx.world.combatant_mut(target) else {
        return ActionOutcome::Rejected(RejectReason::MissingTarget);
    };
    match rules::apply_damage(c, amount, now) {
        DamageResult::Blocked if !c.is_alive => ActionOutcome::Rejected(RejectReason::TargetDead),
        DamageResult::Blocked => ActionOutcome::Rejected(RejectReason::Invulnerable),
        DamageResult::Applied { dealt, killed } => {
            let health = c.health;
            if c.is_invulnerable {
                ctx.timers.schedule(
                    now + c.invulnerability_ms,
                    TimerEffect::ClearInvulnerability(target),
                );
            }
            ctx.events.publish(RoomEvent::EntityDamaged {
                target,
                source,
                amount: dealt,
                health,
            });
            if killed {
                ctx.events.publish(RoomEvent::EntityDied {
                    target,
                    killer: source,
                });
            }
            ActionOutcome::Applied
        }
    }
}

fn resolve_respawn(
    ctx: &mut BattleContext<'_>,
    target: EntityId,
    position: Option<Vec2>,
) -> ActionOutcome {
    let (combatant, attack, agent, cant_respawn) = match target {
        EntityId::Player(raw) => match ctx.world.players.get_mut(&raw) {
            Some(p) => {
                p.respawn_requested = false;
                (&mut p.combatant, &mut p.attack, &mut p.agent, false)
            }
            None => return ActionOutcome::Rejected(RejectReason::MissingTarget),
        },
        EntityId::Mob(raw) => match ctx.world.mobs.get_mut(&raw) {
            Some(m) => (&mut m.combatant, &mut m.attack, &mut m.agent, m.cant_respawn),
            None => return ActionOutcome::Rejected(RejectReason::MissingTarget),
        },
    };
    if combatant.is_alive {
        return ActionOutcome::Rejected(RejectReason::AlreadyAlive);
    }
    match rules::respawn_entity(combatant, attack, position, cant_respawn) {
        Err(RespawnRejection::CantRespawn) => ActionOutcome::Rejected(RejectReason::CantRespawn),
        Ok(()) => {
            agent.reset();
            ctx.events.publish(RoomEvent::EntityRespawned {
                target,
                x: combatant.x,
                y: combatant.y,
            });
            ActionOutcome::Applied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::combatant::StatusEffect;
    use crate::domain::mob::Mob;
    use crate::domain::player::Player;
    use crate::domain::tuning::mob::default_archetypes;
    use crate::domain::tuning::player::PlayerTuning;

    struct Fixture {
        world: World,
        events: EventBus,
        timers: TimerQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let mut world = World::default();
            let tuning = PlayerTuning::default();
            let player = Player::new(1, "p".into(), Vec2::new(100.0, 100.0), &tuning, Vec::new());
            world.players.insert(1, player);
            world.mobs.insert(
                1,
                Mob::new(1, &default_archetypes()[0], Vec2::new(102.0, 100.0), Vec::new(), 0),
            );
            Self {
                world,
                events: EventBus::new(),
                timers: TimerQueue::new(),
            }
        }

        fn resolve(
            &mut self,
            actor: Option<EntityId>,
            target: EntityId,
            action: BattleAction,
            now: u64,
        ) -> ActionOutcome {
            let mut ctx = BattleContext {
                world: &mut self.world,
                events: &mut self.events,
                timers: &mut self.timers,
            };
            resolve(&mut ctx, &BattleActionMessage::new(actor, target, action, now), now)
        }
    }

    #[test]
    fn when_committed_strike_lands_then_mitigated_damage_and_invulnerability_follow() {
        let mut fx = Fixture::new();

        let outcome = fx.resolve(
            Some(EntityId::Player(1)),
            EntityId::Mob(1),
            BattleAction::Attack {
                damage: Some(10),
                reach: None,
            },
            0,
        );

        assert_eq!(outcome, ActionOutcome::Applied);
        // grunt: defense 1, armor 0
        assert_eq!(fx.world.mobs[&1].combatant.health, 40 - 9);
        assert!(fx.world.mobs[&1].combatant.is_invulnerable);
        assert_eq!(fx.timers.len(), 1);
        assert!(matches!(
            fx.events.take_pending()[0],
            RoomEvent::EntityDamaged { amount: 9, .. }
        ));
    }

    #[test]
    fn when_target_missing_or_dead_then_action_is_rejected() {
        let mut fx = Fixture::new();
        let strike = BattleAction::Attack {
            damage: Some(10),
            reach: None,
        };

        assert_eq!(
            fx.resolve(Some(EntityId::Player(1)), EntityId::Mob(42), strike.clone(), 0),
            ActionOutcome::Rejected(RejectReason::MissingTarget)
        );

        if let Some(m) = fx.world.mobs.get_mut(&1) {
            m.combatant.die(0);
        }
        assert_eq!(
            fx.resolve(Some(EntityId::Player(1)), EntityId::Mob(1), strike, 0),
            ActionOutcome::Rejected(RejectReason::TargetDead)
        );
    }

    #[test]
    fn when_basic_attack_requested_during_cooldown_then_it_is_rejected() {
        let mut fx = Fixture::new();
        let basic = BattleAction::Attack {
            damage: None,
            reach: None,
        };

        assert_eq!(
            fx.resolve(Some(EntityId::Player(1)), EntityId::Mob(1), basic.clone(), 0),
            ActionOutcome::Applied
        );
        assert_eq!(
            fx.resolve(Some(EntityId::Player(1)), EntityId::Mob(1), basic, 200),
            ActionOutcome::Rejected(RejectReason::OnCooldown)
        );
    }

    #[test]
    fn when_strike_kills_then_death_event_names_the_killer() {
        let mut fx = Fixture::new();

        fx.resolve(
            Some(EntityId::Player(1)),
            EntityId::Mob(1),
            BattleAction::Damage { amount: 500 },
            7,
        );

        let events = fx.events.take_pending();
        assert!(events.contains(&RoomEvent::EntityDied {
            target: EntityId::Mob(1),
            killer: Some(EntityId::Player(1)),
        }));
        assert_eq!(fx.world.mobs[&1].combatant.died_at, Some(7));
    }

    #[test]
    fn when_dead_player_respawns_then_health_and_position_reset() {
        let mut fx = Fixture::new();
        if let Some(p) = fx.world.players.get_mut(&1) {
            p.combatant.die(0);
            p.respawn_requested = true;
        }

        let outcome = fx.resolve(
            None,
            EntityId::Player(1),
            BattleAction::Respawn {
                position: Some(Vec2::new(10.0, 20.0)),
            },
            3_000,
        );

        assert_eq!(outcome, ActionOutcome::Applied);
        let p = &fx.world.players[&1];
        assert!(p.combatant.is_alive);
        assert!(!p.respawn_requested);
        assert_eq!(p.combatant.position(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn when_mob_cannot_respawn_then_respawn_is_rejected() {
        let mut fx = Fixture::new();
        if let Some(m) = fx.world.mobs.get_mut(&1) {
            m.combatant.die(0);
            m.cant_respawn = true;
        }

        assert_eq!(
            fx.resolve(None, EntityId::Mob(1), BattleAction::Respawn { position: None }, 10),
            ActionOutcome::Rejected(RejectReason::CantRespawn)
        );
    }

    #[test]
    fn when_stun_applied_then_status_expires_after_duration() {
        let mut fx = Fixture::new();

        fx.resolve(
            None,
            EntityId::Mob(1),
            BattleAction::ApplyStatus {
                status: StatusEffect::Stun,
                duration_ms: 500,
            },
            1_000,
        );

        let c = &fx.world.mobs[&1].combatant;
        assert!(c.is_stunned(1_499));
        assert!(!c.is_stunned(1_500));
    }

    #[test]
    fn when_queue_overflows_then_the_dropped_message_is_handed_back() {
        let mut battle = BattleModule::new(BattleSettings {
            queue_capacity: 1,
            ..BattleSettings::default()
        });
        let first = BattleActionMessage::new(None, EntityId::Mob(1), BattleAction::Kill, 0);

        assert!(battle.submit(first, 0).is_none());
        let evicted = battle.submit(
            BattleActionMessage::new(None, EntityId::Mob(2), BattleAction::Kill, 1),
            1,
        );

        let evicted = evicted.expect("oldest dropped");
        assert_eq!(evicted.target_id, EntityId::Mob(1));
        assert_eq!(evicted.action, BattleAction::Kill);
        assert_eq!(battle.pending(), 1);
        assert_eq!(battle.dropped(), 1);
    }

    #[test]
    fn when_drain_interval_not_elapsed_then_no_batch_is_returned() {
        let mut battle = BattleModule::new(BattleSettings::default());
        battle.submit(
            BattleActionMessage::new(None, EntityId::Mob(1), BattleAction::Kill, 0),
            0,
        );

        assert_eq!(battle.drain_due(0).map(|b| b.len()), Some(1));
        assert!(battle.drain_due(50).is_none());
        assert_eq!(battle.drain_due(100).map(|b| b.len()), Some(0));
    }
}
