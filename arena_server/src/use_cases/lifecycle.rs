// Mob population upkeep: removal of dead mobs, over-population trimming and weighted spawns.

use crate::domain::EntityId;
use crate::domain::attack::{SharedStrategy, StrategyError};
use crate::domain::geometry::WorldBounds;
use crate::domain::mob::Mob;
use crate::domain::tuning::mob::{MobArchetype, WeightedStrategy, default_archetypes};
use crate::domain::tuning::projectile::ProjectileTuning;
use crate::domain::world::World;
use crate::use_cases::ai::{AgentKind, AiModule};
use crate::use_cases::events::{EventBus, RoomEvent};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Per-map population settings and roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub name: String,
    pub bounds: WorldBounds,
    pub desired_count: usize,
    pub max_mobs: usize,
    pub spawn_interval_ms: u64,
    pub batch_size: usize,
    /// Time a dead mob stays in the world before it is removed.
    pub respawn_delay_ms: u64,
    pub archetypes: Vec<MobArchetype>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            bounds: WorldBounds::default(),
            desired_count: 12,
            max_mobs: 20,
            spawn_interval_ms: 2_000,
            batch_size: 3,
            respawn_delay_ms: 5_000,
            archetypes: default_archetypes(),
        }
    }
}

#[derive(Debug)]
pub enum MapConfigError {
    InvalidBounds,
    ZeroBatchSize,
    MaxBelowDesired { desired: usize, max: usize },
    NoArchetypes,
    ZeroArchetypeWeight,
    NoStrategies { archetype: String },
    ZeroStrategyWeight { archetype: String },
    InvalidStrategy { archetype: String, error: StrategyError },
}

impl MapConfig {
    /// Checks everything a spawn relies on, including that every strategy builds.
    pub fn validate(&self, tuning: &ProjectileTuning) -> Result<(), MapConfigError> {
        if !self.bounds.is_valid() {
            return Err(MapConfigError::InvalidBounds);
        }
        if self.batch_size == 0 {
            return Err(MapConfigError::ZeroBatchSize);
        }
        if self.max_mobs < self.desired_count {
            return Err(MapConfigError::MaxBelowDesired {
                desired: self.desired_count,
                max: self.max_mobs,
            });
        }
        if self.archetypes.is_empty() {
            return Err(MapConfigError::NoArchetypes);
        }
        if self.archetypes.iter().all(|a| a.weight == 0) {
            return Err(MapConfigError::ZeroArchetypeWeight);
        }
        for archetype in &self.archetypes {
            if archetype.strategies.is_empty() {
                return Err(MapConfigError::NoStrategies {
                    archetype: archetype.name.clone(),
                });
            }
            if archetype.strategies.iter().all(|s| s.weight == 0) {
                return Err(MapConfigError::ZeroStrategyWeight {
                    archetype: archetype.name.clone(),
                });
            }
            for weighted in &archetype.strategies {
                weighted
                    .strategy
                    .build(tuning)
                    .map_err(|error| MapConfigError::InvalidStrategy {
                        archetype: archetype.name.clone(),
                        error,
                    })?;
            }
        }
        Ok(())
    }
}

/// Picks an item with probability proportional to its weight. `None` if all weights are zero.
pub fn pick_weighted<'a, T>(
    items: &'a [T],
    weight: impl Fn(&T) -> u32,
    rng: &mut StdRng,
) -> Option<&'a T> {
    let total: u64 = items.iter().map(|i| u64::from(weight(i))).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for item in items {
        let w = u64::from(weight(item));
        if roll < w {
            return Some(item);
        }
        roll -= w;
    }
    None
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LifecycleReport {
    pub removed: Vec<u64>,
    pub trimmed: Vec<u64>,
    pub spawned: Vec<u64>,
}

/// Collaborators the manager mutates during an update.
pub struct LifecycleContext<'a> {
    pub world: &'a mut World,
    pub ai: &'a mut AiModule,
    pub events: &'a mut EventBus,
    pub rng: &'a mut StdRng,
}

#[derive(Debug)]
pub struct MobLifecycleManager {
    config: MapConfig,
    projectile_tuning: ProjectileTuning,
    next_mob_id: u64,
    last_spawn_at: Option<u64>,
}

impl MobLifecycleManager {
    pub fn new(config: MapConfig, projectile_tuning: ProjectileTuning) -> Self {
        Self {
            config,
            projectile_tuning,
            next_mob_id: 1,
            last_spawn_at: None,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Alive mobs plus dead ones still waiting for removal.
    pub fn total_count(world: &World) -> usize {
        world.mobs.len()
    }

    pub fn update(&mut self, ctx: &mut LifecycleContext<'_>, now: u64) -> LifecycleReport {
        let mut report = LifecycleReport::default();

        // 1. Remove mobs that finished dying.
        let ready: Vec<u64> = ctx
            .world
            .mobs
            .values()
            .filter(|m| m.ready_to_be_removed(now, self.config.respawn_delay_ms))
            .map(|m| m.combatant.id.raw())
            .collect();
        for id in ready {
            self.remove(ctx, id);
            report.removed.push(id);
        }

        // 2. Trim over-population, oldest ids first.
        let alive: Vec<u64> = ctx
            .world
            .mobs
            .values()
            .filter(|m| m.combatant.is_alive)
            .map(|m| m.combatant.id.raw())
            .collect();
        if alive.len() > self.config.max_mobs {
            let excess = alive.len() - self.config.max_mobs;
            for id in alive.into_iter().take(excess) {
                self.remove(ctx, id);
                report.trimmed.push(id);
            }
        }

        // 3. Refill, gated on the total so corpses awaiting removal still count.
        let total = Self::total_count(ctx.world);
        let interval_elapsed = self
            .last_spawn_at
            .is_none_or(|at| now.saturating_sub(at) >= self.config.spawn_interval_ms);
        if total < self.config.desired_count && interval_elapsed {
            let count = self.config.batch_size.min(self.config.desired_count - total);
            for _ in 0..count {
                match self.spawn(ctx, now) {
                    Ok(id) => report.spawned.push(id),
                    Err(e) => warn!(error = ?e, "mob spawn failed; skipping"),
                }
            }
            self.last_spawn_at = Some(now);
        }

        if !report.removed.is_empty() || !report.trimmed.is_empty() || !report.spawned.is_empty() {
            debug!(
                removed = report.removed.len(),
                trimmed = report.trimmed.len(),
                spawned = report.spawned.len(),
                total = Self::total_count(ctx.world),
                "mob lifecycle update"
            );
        }
        report
    }

    fn remove(&self, ctx: &mut LifecycleContext<'_>, id: u64) {
        if ctx.world.mobs.remove(&id).is_some() {
            ctx.ai.unregister(EntityId::Mob(id));
            ctx.events.publish(RoomEvent::MobRemoved { mob_id: id });
        }
    }

    /// Spawns one mob of a weighted archetype with a weighted strategy at a random position.
    pub fn spawn(&mut self, ctx: &mut LifecycleContext<'_>, now: u64) -> Result<u64, SpawnError> {
        let archetype = pick_weighted(&self.config.archetypes, |a| a.weight, ctx.rng)
            .ok_or(SpawnError::NoArchetype)?
            .clone();
        let strategy = self.resolve_strategy(&archetype, ctx.rng)?;

        let position = ctx
            .world
            .bounds
            .random_point(ctx.rng, archetype.profile.radius);

        let id = self.next_mob_id;
        self.next_mob_id += 1;
        let mob = Mob::new(id, &archetype, position, vec![strategy], now);
        ctx.world.mobs.insert(id, mob);
        ctx.ai.register(EntityId::Mob(id), AgentKind::Mob);
        ctx.events.publish(RoomEvent::MobSpawned {
            mob_id: id,
            archetype: archetype.name.clone(),
            x: position.x,
            y: position.y,
        });
        Ok(id)
    }

    fn resolve_strategy(
        &self,
        archetype: &MobArchetype,
        rng: &mut StdRng,
    ) -> Result<SharedStrategy, SpawnError> {
        let weighted: &WeightedStrategy = pick_weighted(&archetype.strategies, |s| s.weight, rng)
            .ok_or_else(|| SpawnError::NoStrategy(archetype.name.clone()))?;
        weighted
            .strategy
            .build(&self.projectile_tuning)
            .map_err(|e| SpawnError::Strategy(archetype.name.clone(), e))
    }
}

#[derive(Debug)]
pub enum SpawnError {
    NoArchetype,
    NoStrategy(String),
    Strategy(String, StrategyError),
}
