use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Player ids are unique for the whole process, so a player never collides across rooms.
pub fn next_player_id() -> u64 {
    NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Log correlation id for a socket, assigned before the player exists.
pub fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_ids_drawn_then_each_sequence_strictly_increases() {
        let a = next_player_id();
        let b = next_player_id();
        assert!(b > a);

        let s1 = next_session_id();
        let s2 = next_session_id();
        assert!(s2 > s1);
    }
}
