/// Keyed one-shot timers on a virtual millisecond clock.
///
/// Scheduling a key that is already pending replaces it, so each key has at
/// most one pending deadline. Timers fire in deadline order; timers sharing a
/// deadline fire in the order they were scheduled.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    pending: Vec<Pending<K>>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
struct Pending<K> {
    deadline: u64,
    seq: u64,
    key: K,
}

impl<K: PartialEq + Copy> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `key` to fire at `now + delay_ms`, replacing any pending instance
    pub fn schedule(&mut self, key: K, now: u64, delay_ms: u64) {
        self.cancel(key);
        self.pending.push(Pending {
            deadline: now + delay_ms,
            seq: self.next_seq,
            key,
        });
        self.next_seq += 1;
    }

    /// Returns true if a pending instance was removed
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.key != key);
        before != self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.iter().any(|p| p.key == key)
    }

    pub fn deadline(&self, key: K) -> Option<u64> {
        self.pending
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.deadline)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return the earliest timer due at or before `until`
    pub fn pop_due(&mut self, until: u64) -> Option<(u64, K)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= until)
            .min_by_key(|(_, p)| (p.deadline, p.seq))
            .map(|(i, _)| i)?;
        let p = self.pending.swap_remove(idx);
        Some((p.deadline, p.key))
    }
}

impl<K: PartialEq + Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
