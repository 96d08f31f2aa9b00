// One room's simulation: owns every entity map and runs the fixed stage order each tick.

use crate::domain::agent::Agent;
use crate::domain::attack::{
    AttackEffect, AttackTick, SharedStrategy, StrategyConfig, StrategyError,
};
use crate::domain::combatant::TargetInfo;
use crate::domain::ports::{BodyDesc, BodyId, BodyKind, Perception, PhysicsWorld};
use crate::domain::player::Player;
use crate::domain::projectile::Projectile;
use crate::domain::systems::kinematics::KinematicPhysics;
use crate::domain::systems::projectiles::{ProjectileOutcome, advance_projectiles, despawn_expired};
use crate::domain::tuning::ai::AiTuning;
use crate::domain::tuning::player::PlayerTuning;
use crate::domain::tuning::projectile::ProjectileTuning;
use crate::domain::{EntityId, EntitySnapshot, ProjectileSnapshot, World};
use crate::use_cases::ai::perception::WorldPerception;
use crate::use_cases::ai::{AgentKind, AiModule};
use crate::use_cases::battle::queue::{BattleAction, BattleActionMessage};
use crate::use_cases::battle::{ActionOutcome, BattleContext, BattleModule, BattleSettings, resolve};
use crate::use_cases::events::{EventBus, Listener, ListenerId, RoomEvent};
use crate::use_cases::lifecycle::{LifecycleContext, MapConfig, MapConfigError, MobLifecycleManager};
use crate::use_cases::timers::{ATTACK_ANIMATION_MS, TimerEffect, TimerQueue, apply_timer};
use crate::use_cases::types::{GameEvent, WorldUpdate};
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info, warn};

/// Creature steering acceleration as a multiple of its max speed.
const STEERING_RESPONSE: f32 = 8.0;

/// Upper bound on one integration step, so a stalled loop does not teleport bodies.
const MAX_STEP_SECONDS: f32 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct RoomConfig {
    pub map: MapConfig,
    pub ai: AiTuning,
    pub player: PlayerTuning,
    pub projectile: ProjectileTuning,
    pub battle: BattleSettings,
    pub seed: u64,
}

#[derive(Debug)]
pub enum InitError {
    InvalidMap(MapConfigError),
    InvalidStrategy(StrategyError),
    InvalidSettings(&'static str),
}

#[derive(Debug)]
pub enum RoomError {
    AlreadyExists(String),
    NotFound(String),
    InitFailed(InitError),
}

impl From<InitError> for RoomError {
    fn from(e: InitError) -> Self {
        RoomError::InitFailed(e)
    }
}

/// Recoverable failure of a single tick stage.
#[derive(Debug)]
pub enum SimError {
    /// Bodies the physics collaborator did not know about; they were recreated or skipped.
    MissingBodies(Vec<BodyId>),
}

/// Tick stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Timers,
    ProjectileBodies,
    Physics,
    SyncPositions,
    Projectiles,
    Players,
    Ai,
    Lifecycle,
    Mobs,
    Despawn,
    Battle,
}

impl Stage {
    pub const ORDER: [Stage; 11] = [
        Stage::Timers,
        Stage::ProjectileBodies,
        Stage::Physics,
        Stage::SyncPositions,
        Stage::Projectiles,
        Stage::Players,
        Stage::Ai,
        Stage::Lifecycle,
        Stage::Mobs,
        Stage::Despawn,
        Stage::Battle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Timers => "timers",
            Stage::ProjectileBodies => "projectile_bodies",
            Stage::Physics => "physics",
            Stage::SyncPositions => "sync_positions",
            Stage::Projectiles => "projectiles",
            Stage::Players => "players",
            Stage::Ai => "ai",
            Stage::Lifecycle => "lifecycle",
            Stage::Mobs => "mobs",
            Stage::Despawn => "despawn",
            Stage::Battle => "battle",
        }
    }
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    pub time_ms: u64,
    /// Every event dispatched since the previous report, in publish order.
    pub events: Vec<RoomEvent>,
    pub failed_stages: Vec<Stage>,
    pub actions_applied: usize,
    pub actions_rejected: usize,
}

pub struct Room {
    room_id: String,
    config: RoomConfig,
    world: World,
    physics: Box<dyn PhysicsWorld>,
    perception: Box<dyn Perception>,
    ai: AiModule,
    battle: BattleModule,
    lifecycle: MobLifecycleManager,
    timers: TimerQueue,
    events: EventBus,
    rng: StdRng,
    player_strategies: Vec<SharedStrategy>,
    tick: u64,
    last_tick_at: Option<u64>,
    next_projectile_id: u64,
    dispatched: Vec<RoomEvent>,
    stopped: bool,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("room_id", &self.room_id)
            .field("tick", &self.tick)
            .field("players", &self.world.players.len())
            .field("mobs", &self.world.mobs.len())
            .field("projectiles", &self.world.projectiles.len())
            .finish()
    }
}

impl Room {
    pub fn new(room_id: impl Into<String>, config: RoomConfig) -> Result<Self, RoomError> {
        Self::with_collaborators(
            room_id,
            config,
            Box::new(KinematicPhysics::new()),
            Box::new(WorldPerception),
        )
    }

    /// Builds a room on top of caller-supplied physics and perception.
    pub fn with_collaborators(
        room_id: impl Into<String>,
        config: RoomConfig,
        physics: Box<dyn PhysicsWorld>,
        perception: Box<dyn Perception>,
    ) -> Result<Self, RoomError> {
        config
            .map
            .validate(&config.projectile)
            .map_err(InitError::InvalidMap)?;
        if config.battle.batch_size == 0 || config.battle.queue_capacity == 0 {
            return Err(InitError::InvalidSettings("battle queue limits must be non-zero").into());
        }
        if config.player.strategies.is_empty() {
            return Err(InitError::InvalidSettings("players need at least one strategy").into());
        }
        let player_strategies = config
            .player
            .strategies
            .iter()
            .map(|name| StrategyConfig::preset(name).build(&config.projectile))
            .collect::<Result<Vec<_>, _>>()
            .map_err(InitError::InvalidStrategy)?;

        let room_id = room_id.into();
        info!(
            room_id = %room_id,
            map = %config.map.name,
            desired_mobs = config.map.desired_count,
            seed = config.seed,
            "room initialized"
        );
        Ok(Self {
            world: World::new(config.map.bounds),
            physics,
            perception,
            ai: AiModule::new(config.ai),
            battle: BattleModule::new(config.battle),
            lifecycle: MobLifecycleManager::new(config.map.clone(), config.projectile),
            timers: TimerQueue::new(),
            events: EventBus::new(),
            rng: StdRng::seed_from_u64(config.seed),
            player_strategies,
            tick: 0,
            last_tick_at: None,
            next_projectile_id: 1,
            dispatched: Vec::new(),
            stopped: false,
            room_id,
            config,
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn ai(&self) -> &AiModule {
        &self.ai
    }

    pub fn battle(&self) -> &BattleModule {
        &self.battle
    }

    pub fn physics(&self) -> &dyn PhysicsWorld {
        self.physics.as_ref()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Queues an externally triggered combat action (heal, kill, status...).
    pub fn submit_action(&mut self, msg: BattleActionMessage, now: u64) {
        self.queue_action(msg, now);
    }

    fn queue_action(&mut self, msg: BattleActionMessage, now: u64) {
        let Some(evicted) = self.battle.submit(msg, now) else {
            return;
        };
        // A dropped respawn is requested again by the next Players stage.
        if let (BattleAction::Respawn { .. }, EntityId::Player(raw)) =
            (&evicted.action, evicted.target_id)
        {
            if let Some(p) = self.world.players.get_mut(&raw) {
                p.respawn_requested = false;
            }
        }
    }

    pub fn handle_event(&mut self, event: GameEvent, now: u64) {
        match event {
            GameEvent::Join {
                player_id,
                display_name,
                bot_mode,
            } => self.join(player_id, display_name, bot_mode),
            GameEvent::Leave { player_id } => self.leave(player_id),
            GameEvent::Input { player_id, input } => {
                match self.world.players.get_mut(&player_id) {
                    Some(p) if !p.is_bot => p.input = input,
                    _ => {}
                }
            }
            GameEvent::SetBotMode { player_id, enabled } => {
                self.set_bot_mode(player_id, enabled, now)
            }
        }
        self.dispatch_events();
    }

    fn join(&mut self, player_id: u64, display_name: String, bot_mode: bool) {
        if self.world.players.contains_key(&player_id) {
            warn!(room_id = %self.room_id, player_id, "duplicate join ignored");
            return;
        }
        let position = self
            .world
            .bounds
            .random_point(&mut self.rng, self.config.player.profile.radius);
        let mut player = Player::new(
            player_id,
            display_name,
            position,
            &self.config.player,
            self.player_strategies.clone(),
        );
        if bot_mode {
            player.set_bot_mode(true);
            self.ai.register(EntityId::Player(player_id), AgentKind::BotPlayer);
        }
        self.world.players.insert(player_id, player);
        info!(room_id = %self.room_id, player_id, bot_mode, "player joined");
        self.events
            .publish(RoomEvent::PlayerJoined { player_id, bot_mode });
    }

    fn leave(&mut self, player_id: u64) {
        if self.world.players.remove(&player_id).is_none() {
            return;
        }
        let id = EntityId::Player(player_id);
        self.ai.unregister(id);

        let owned: Vec<u64> = self
            .world
            .projectiles
            .values()
            .filter(|p| p.owner_id == id)
            .map(|p| p.id)
            .collect();
        for projectile_id in owned {
            self.world.projectiles.remove(&projectile_id);
            self.events
                .publish(RoomEvent::ProjectileDespawned { projectile_id });
        }
        info!(room_id = %self.room_id, player_id, "player left");
        self.events.publish(RoomEvent::PlayerLeft { player_id });
    }

    fn set_bot_mode(&mut self, player_id: u64, enabled: bool, now: u64) {
        let Some(player) = self.world.players.get_mut(&player_id) else {
            return;
        };
        if player.is_bot == enabled {
            return;
        }
        player.set_bot_mode(enabled);
        let id = EntityId::Player(player_id);
        if enabled {
            self.ai.register(id, AgentKind::BotPlayer);
        } else {
            self.ai.unregister(id);
        }
        self.physics
            .set_desired_velocity(BodyId::Entity(id), Vec2::ZERO);
        debug!(room_id = %self.room_id, player_id, enabled, now, "bot mode changed");
    }

    /// Runs every stage once. Failed stages are logged and skipped; the tick always completes.
    pub fn tick(&mut self, now: u64) -> TickReport {
        let dt = match self.last_tick_at {
            Some(last) => (now.saturating_sub(last) as f32 / 1000.0).min(MAX_STEP_SECONDS),
            None => 0.0,
        };
        self.last_tick_at = Some(now);
        self.tick += 1;

        let mut report = TickReport {
            tick: self.tick,
            time_ms: now,
            ..TickReport::default()
        };
        for stage in Stage::ORDER {
            if let Err(e) = self.run_stage(stage, now, dt, &mut report) {
                error!(
                    room_id = %self.room_id,
                    tick = self.tick,
                    stage = stage.as_str(),
                    error = ?e,
                    "tick stage failed"
                );
                report.failed_stages.push(stage);
            }
            self.dispatch_events();
        }
        report.events = std::mem::take(&mut self.dispatched);
        report
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        now: u64,
        dt: f32,
        report: &mut TickReport,
    ) -> Result<(), SimError> {
        match stage {
            Stage::Timers => {
                for effect in self.timers.pop_due(now) {
                    apply_timer(&mut self.world, effect);
                }
                Ok(())
            }
            Stage::ProjectileBodies => {
                self.ensure_projectile_bodies();
                Ok(())
            }
            Stage::Physics => self.integrate(now, dt),
            Stage::SyncPositions => self.sync_positions(),
            Stage::Projectiles => {
                self.step_projectiles(now);
                Ok(())
            }
            Stage::Players => {
                self.update_players(now, dt);
                Ok(())
            }
            Stage::Ai => self.run_ai(now),
            Stage::Lifecycle => {
                let mut ctx = LifecycleContext {
                    world: &mut self.world,
                    ai: &mut self.ai,
                    events: &mut self.events,
                    rng: &mut self.rng,
                };
                self.lifecycle.update(&mut ctx, now);
                Ok(())
            }
            Stage::Mobs => {
                self.update_mobs(now, dt);
                Ok(())
            }
            Stage::Despawn => {
                for p in despawn_expired(&mut self.world, now) {
                    self.events
                        .publish(RoomEvent::ProjectileDespawned { projectile_id: p.id });
                }
                Ok(())
            }
            Stage::Battle => {
                self.drain_battle(now, report);
                Ok(())
            }
        }
    }

    fn ensure_projectile_bodies(&mut self) {
        for p in self.world.projectiles.values() {
            let id = BodyId::Projectile(p.id);
            if !self.physics.has_body(id) {
                self.physics.create_body(
                    id,
                    BodyDesc {
                        kind: BodyKind::Projectile,
                        position: p.position(),
                        velocity: p.velocity(),
                        radius: p.radius,
                        max_acceleration: 0.0,
                    },
                );
            }
        }
    }

    fn integrate(&mut self, now: u64, dt: f32) -> Result<(), SimError> {
        let mut missing = Vec::new();
        for p in self.world.players.values().filter(|p| !p.is_bot) {
            let velocity = if p.combatant.is_alive {
                p.input_velocity(now)
            } else {
                Vec2::ZERO
            };
            let id = BodyId::Entity(p.combatant.id);
            if !self.physics.set_desired_velocity(id, velocity) {
                missing.push(id);
            }
        }
        self.physics.update(dt, &self.world.bounds);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SimError::MissingBodies(missing))
        }
    }

    /// Copies integrated positions into creatures; bodies that went missing are rebuilt.
    fn sync_positions(&mut self) -> Result<(), SimError> {
        let mut missing = Vec::new();
        let World { players, mobs, .. } = &mut self.world;
        let creatures = players
            .values_mut()
            .map(|p| (&mut p.combatant, p.agent.max_move_speed))
            .chain(mobs.values_mut().map(|m| (&mut m.combatant, m.agent.max_move_speed)));
        for (c, max_speed) in creatures {
            let id = BodyId::Entity(c.id);
            match self.physics.get_body(id) {
                Some(body) => {
                    c.set_position(body.position);
                    c.vx = body.velocity.x;
                    c.vy = body.velocity.y;
                }
                None => {
                    self.physics
                        .create_body(id, creature_body(c.position(), c.radius, max_speed));
                    missing.push(id);
                }
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SimError::MissingBodies(missing))
        }
    }

    fn step_projectiles(&mut self, now: u64) {
        let outcomes = advance_projectiles(
            &mut self.world,
            self.physics.as_mut(),
            &self.config.projectile,
            now,
        );
        for outcome in outcomes {
            match outcome {
                ProjectileOutcome::Hit {
                    owner,
                    target,
                    damage,
                    ..
                } => self.queue_action(
                    BattleActionMessage::new(
                        Some(owner),
                        target,
                        BattleAction::Damage { amount: damage },
                        now,
                    ),
                    now,
                ),
                ProjectileOutcome::Deflected {
                    projectile_id, by, ..
                } => self
                    .events
                    .publish(RoomEvent::ProjectileDeflected { projectile_id, by }),
            }
        }
    }

    fn update_players(&mut self, now: u64, dt: f32) {
        let ids: Vec<u64> = self.world.players.keys().copied().collect();
        for raw in ids {
            let Some(player) = self.world.players.get(&raw) else {
                continue;
            };

            if !player.combatant.is_alive {
                let due = player
                    .combatant
                    .died_at
                    .is_some_and(|at| now.saturating_sub(at) >= self.config.player.respawn_ms);
                if due && !player.respawn_requested {
                    self.request_respawn(raw, now);
                }
                continue;
            }

            let target = self.player_target(player);
            let wants_swing = !player.is_bot && player.input.attack && target.is_none();
            let Some(player) = self.world.players.get_mut(&raw) else {
                continue;
            };
            let mut tick = player.update(now, dt, target.as_ref());
            if wants_swing && player.swing(now) {
                tick.started = true;
            }
            self.finish_attack_tick(EntityId::Player(raw), tick, now);
        }
    }

    fn request_respawn(&mut self, raw: u64, now: u64) {
        let position = self
            .world
            .bounds
            .random_point(&mut self.rng, self.config.player.profile.radius);
        if let Some(p) = self.world.players.get_mut(&raw) {
            p.respawn_requested = true;
        }
        self.queue_action(
            BattleActionMessage::new(
                None,
                EntityId::Player(raw),
                BattleAction::Respawn {
                    position: Some(position),
                },
                now,
            ),
            now,
        );
    }

    /// Bots engage the AI's chosen target; manual players engage the nearest opponent in
    /// reach while the attack input is held.
    fn player_target(&self, player: &Player) -> Option<TargetInfo> {
        if player.is_bot {
            return self.live_target(player.agent.attack_target);
        }
        if !player.input.attack {
            return None;
        }
        self.world
            .nearest_opponent(player.combatant.id, self.config.ai.perception_range)
            .filter(|(t, d)| *d <= player.best_attack_range(t.radius))
            .map(|(t, _)| t)
    }

    fn live_target(&self, id: Option<EntityId>) -> Option<TargetInfo> {
        id.and_then(|id| self.world.combatant(id))
            .filter(|c| c.is_alive)
            .map(|c| c.target_info())
    }

    fn run_ai(&mut self, now: u64) -> Result<(), SimError> {
        let Some(velocities) = self
            .ai
            .run(now, &mut self.world, self.perception.as_ref(), &mut self.rng)
        else {
            return Ok(());
        };
        let missing: Vec<BodyId> = velocities
            .into_iter()
            .map(|(id, v)| (BodyId::Entity(id), v))
            .filter(|(body, v)| !self.physics.set_desired_velocity(*body, *v))
            .map(|(body, _)| body)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SimError::MissingBodies(missing))
        }
    }

    fn update_mobs(&mut self, now: u64, dt: f32) {
        let ids: Vec<u64> = self.world.mobs.keys().copied().collect();
        for raw in ids {
            let Some(mob) = self.world.mobs.get(&raw) else {
                continue;
            };
            let target = self.live_target(mob.agent.attack_target);
            let Some(mob) = self.world.mobs.get_mut(&raw) else {
                continue;
            };
            let tick = mob.update(now, dt, target.as_ref());
            self.finish_attack_tick(EntityId::Mob(raw), tick, now);
        }
    }

    fn finish_attack_tick(&mut self, id: EntityId, tick: AttackTick, now: u64) {
        if tick.interrupted > 0 {
            debug!(
                room_id = %self.room_id,
                entity = %id,
                dropped = tick.interrupted,
                "cast interrupted"
            );
        }
        if tick.attacked() {
            self.timers.schedule(
                now + ATTACK_ANIMATION_MS,
                TimerEffect::ResetAttackAnimation(id),
            );
        }
        for effect in tick.effects {
            self.apply_effect(effect, now);
        }
    }

    /// Turns an executed attack step into battle actions or a new projectile.
    fn apply_effect(&mut self, effect: AttackEffect, now: u64) {
        match effect {
            AttackEffect::Strike {
                attacker,
                target,
                damage,
            } => self.queue_action(
                BattleActionMessage::new(
                    Some(attacker),
                    target,
                    BattleAction::Attack {
                        damage: Some(damage),
                        reach: None,
                    },
                    now,
                ),
                now,
            ),
            AttackEffect::Area {
                attacker,
                center,
                radius,
                damage,
            } => {
                let victims: Vec<EntityId> = self
                    .world
                    .combatants()
                    .filter(|c| c.is_alive && attacker.opposes(c.id))
                    .filter(|c| c.distance_to(center) <= radius + c.radius)
                    .map(|c| c.id)
                    .collect();
                for target in victims {
                    self.queue_action(
                        BattleActionMessage::new(
                            Some(attacker),
                            target,
                            BattleAction::Attack {
                                damage: Some(damage),
                                reach: Some(radius),
                            },
                            now,
                        ),
                        now,
                    );
                }
            }
            AttackEffect::Projectile(launch) => {
                let id = self.next_projectile_id;
                self.next_projectile_id += 1;
                let projectile = Projectile::launch(id, &launch, &self.config.projectile, now);
                self.world.projectiles.insert(id, projectile);
                self.events.publish(RoomEvent::ProjectileSpawned {
                    projectile_id: id,
                    owner: launch.owner,
                });
            }
        }
    }

    fn drain_battle(&mut self, now: u64, report: &mut TickReport) {
        let Some(batch) = self.battle.drain_due(now) else {
            return;
        };
        let mut ctx = BattleContext {
            world: &mut self.world,
            events: &mut self.events,
            timers: &mut self.timers,
        };
        for msg in &batch {
            match resolve(&mut ctx, msg, now) {
                ActionOutcome::Applied => report.actions_applied += 1,
                ActionOutcome::Rejected(_) => report.actions_rejected += 1,
            }
        }
    }

    /// Internal handlers first, then external listeners.
    fn dispatch_events(&mut self) {
        if !self.events.has_pending() {
            return;
        }
        let events = self.events.take_pending();
        for event in &events {
            self.handle_internal(event);
        }
        self.events.notify(&events);
        self.dispatched.extend(events);
    }

    fn handle_internal(&mut self, event: &RoomEvent) {
        match event {
            RoomEvent::MobSpawned { mob_id, .. } => {
                if let Some(m) = self.world.mobs.get(mob_id) {
                    let c = &m.combatant;
                    self.physics.create_body(
                        BodyId::Entity(c.id),
                        creature_body(c.position(), c.radius, m.agent.max_move_speed),
                    );
                }
            }
            RoomEvent::PlayerJoined { player_id, .. } => {
                if let Some(p) = self.world.players.get(player_id) {
                    let c = &p.combatant;
                    self.physics.create_body(
                        BodyId::Entity(c.id),
                        creature_body(c.position(), c.radius, p.agent.max_move_speed),
                    );
                }
            }
            RoomEvent::MobRemoved { mob_id } => {
                self.physics
                    .remove_body(BodyId::Entity(EntityId::Mob(*mob_id)));
            }
            RoomEvent::PlayerLeft { player_id } => {
                self.physics
                    .remove_body(BodyId::Entity(EntityId::Player(*player_id)));
            }
            RoomEvent::ProjectileDespawned { projectile_id } => {
                self.physics
                    .remove_body(BodyId::Projectile(*projectile_id));
            }
            RoomEvent::EntityDied { target, .. } => {
                self.physics
                    .set_desired_velocity(BodyId::Entity(*target), Vec2::ZERO);
            }
            RoomEvent::EntityRespawned { target, x, y } => {
                let body = BodyId::Entity(*target);
                self.physics.set_position(body, Vec2::new(*x, *y));
                self.physics.set_desired_velocity(body, Vec2::ZERO);
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> (Vec<EntitySnapshot>, Vec<ProjectileSnapshot>) {
        let entities = self
            .world
            .players
            .values()
            .map(EntitySnapshot::from)
            .chain(self.world.mobs.values().map(EntitySnapshot::from))
            .collect();
        let projectiles = self
            .world
            .projectiles
            .values()
            .map(ProjectileSnapshot::from)
            .collect();
        (entities, projectiles)
    }

    pub fn world_update(&self, report: TickReport) -> WorldUpdate {
        let (entities, projectiles) = self.snapshot();
        WorldUpdate {
            tick: report.tick,
            time_ms: report.time_ms,
            entities,
            projectiles,
            events: report.events,
        }
    }

    /// Detaches listeners; the room must not be ticked afterwards.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.events.clear_listeners();
        info!(room_id = %self.room_id, ticks = self.tick, "room stopped");
    }
}

fn creature_body(position: Vec2, radius: f32, max_speed: f32) -> BodyDesc {
    BodyDesc {
        kind: BodyKind::Creature,
        position,
        velocity: Vec2::ZERO,
        radius,
        max_acceleration: max_speed * STEERING_RESPONSE,
    }
}
