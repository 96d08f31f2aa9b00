// Bounded priority queue of battle actions.

use crate::domain::EntityId;
use crate::domain::combatant::StatusEffect;
use glam::Vec2;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub enum BattleAction {
    /// A strike. `damage: None` is an uncommitted basic attack that still has to pass the
    /// cooldown gate; `reach: None` means melee reach.
    Attack {
        damage: Option<i32>,
        reach: Option<f32>,
    },
    /// Raw damage from a non-melee source such as a projectile.
    Damage { amount: i32 },
    Heal { amount: i32 },
    Kill,
    Respawn { position: Option<Vec2> },
    ApplyStatus { status: StatusEffect, duration_ms: u64 },
}

impl BattleAction {
    pub fn key(&self) -> &'static str {
        match self {
            BattleAction::Attack { .. } => "attack",
            BattleAction::Damage { .. } => "damage",
            BattleAction::Heal { .. } => "heal",
            BattleAction::Kill => "kill",
            BattleAction::Respawn { .. } => "respawn",
            BattleAction::ApplyStatus { .. } => "apply_status",
        }
    }

    /// Kill first, then heal and respawn, then everything else.
    pub fn priority(&self) -> u8 {
        match self {
            BattleAction::Kill => 3,
            BattleAction::Heal { .. } | BattleAction::Respawn { .. } => 2,
            BattleAction::Attack { .. }
            | BattleAction::Damage { .. }
            | BattleAction::ApplyStatus { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleActionMessage {
    pub actor_id: Option<EntityId>,
    pub target_id: EntityId,
    pub action: BattleAction,
    pub timestamp: u64,
    pub priority: u8,
    seq: u64,
}

impl BattleActionMessage {
    pub fn new(
        actor_id: Option<EntityId>,
        target_id: EntityId,
        action: BattleAction,
        timestamp: u64,
    ) -> Self {
        Self {
            actor_id,
            target_id,
            priority: action.priority(),
            action,
            timestamp,
            seq: 0,
        }
    }

    pub fn action_key(&self) -> &'static str {
        self.action.key()
    }
}

#[derive(Debug)]
pub struct BattleActionQueue {
    entries: VecDeque<BattleActionMessage>,
    capacity: usize,
    next_seq: u64,
    dropped: u64,
}

impl BattleActionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_seq: 0,
            dropped: 0,
        }
    }

    /// Enqueues a message; when full the oldest entry is dropped and returned.
    pub fn push(&mut self, mut msg: BattleActionMessage) -> Option<BattleActionMessage> {
        self.next_seq += 1;
        msg.seq = self.next_seq;
        let evicted = if self.entries.len() >= self.capacity {
            self.dropped += 1;
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(msg);
        evicted
    }

    /// Removes up to `batch` messages, highest priority first and FIFO within a priority.
    pub fn drain(&mut self, batch: usize) -> Vec<BattleActionMessage> {
        let mut all: Vec<BattleActionMessage> = self.entries.drain(..).collect();
        all.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        let mut rest = all.split_off(batch.min(all.len()));
        rest.sort_by_key(|m| m.seq);
        self.entries = rest.into();
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total messages evicted by overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(action: BattleAction, target: u64) -> BattleActionMessage {
        BattleActionMessage::new(None, EntityId::Mob(target), action, 0)
    }

    #[test]
    fn when_drained_then_kill_precedes_heal_precedes_attack() {
        let mut queue = BattleActionQueue::new(16);
        queue.push(msg(BattleAction::Attack { damage: Some(1), reach: None }, 1));
        queue.push(msg(BattleAction::Heal { amount: 5 }, 2));
        queue.push(msg(BattleAction::Kill, 3));
        queue.push(msg(BattleAction::Respawn { position: None }, 4));

        let keys: Vec<&str> = queue.drain(10).iter().map(|m| m.action_key()).collect();

        assert_eq!(keys, vec!["kill", "heal", "respawn", "attack"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn when_full_then_oldest_entry_is_dropped() {
        let mut queue = BattleActionQueue::new(2);
        assert!(queue.push(msg(BattleAction::Kill, 1)).is_none());
        assert!(queue.push(msg(BattleAction::Kill, 2)).is_none());

        let evicted = queue.push(msg(BattleAction::Kill, 3)).expect("evicted");

        assert_eq!(evicted.target_id, EntityId::Mob(1));
        assert_eq!(queue.dropped(), 1);
        let targets: Vec<EntityId> = queue.drain(10).iter().map(|m| m.target_id).collect();
        assert_eq!(targets, vec![EntityId::Mob(2), EntityId::Mob(3)]);
    }

    #[test]
    fn when_batch_smaller_than_queue_then_rest_waits_in_arrival_order() {
        let mut queue = BattleActionQueue::new(16);
        queue.push(msg(BattleAction::Attack { damage: Some(1), reach: None }, 1));
        queue.push(msg(BattleAction::Attack { damage: Some(1), reach: None }, 2));
        queue.push(msg(BattleAction::Kill, 3));

        let first = queue.drain(2);
        assert_eq!(first[0].target_id, EntityId::Mob(3));
        assert_eq!(first[1].target_id, EntityId::Mob(1));

        let second = queue.drain(2);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].target_id, EntityId::Mob(2));
    }
}
