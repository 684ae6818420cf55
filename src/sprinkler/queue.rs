//! Runtime queue: the set of scheduled station runs and their time windows.
//!
//! Backed by an unordered vector plus a station → slot map so membership
//! checks and removals are O(1). Removal swap-removes the tail into the hole
//! and patches the displaced entry's map slot.

use core::fmt;

use super::station::{StationIndex, MAX_NUM_STATIONS};

/// One live entry per queued station.
///
/// `dequeue_time >= start_time + duration`; the extra tail keeps the entry
/// visible to the master off-lag window after the valve closes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueueItem {
    pub station_index: StationIndex,
    pub program_id: u8,
    pub start_time: i64,
    pub duration: i64,
    pub dequeue_time: i64,
}

impl QueueItem {
    pub fn end_time(&self) -> i64 {
        self.start_time + self.duration
    }

    pub fn is_running(&self, now: i64) -> bool {
        now >= self.start_time && now < self.end_time()
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueError {
    /// The station already has an entry; admission is idempotent-refused.
    AlreadyQueued,
    Full,
}

impl fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnqueueError::AlreadyQueued => write!(f, "station is already queued"),
            EnqueueError::Full => write!(f, "runtime queue is full"),
        }
    }
}

impl std::error::Error for EnqueueError {}

pub struct RuntimeQueue {
    items: Vec<QueueItem>,
    station_slot: [Option<usize>; MAX_NUM_STATIONS],
}

impl RuntimeQueue {
    pub fn new() -> Self {
        RuntimeQueue {
            items: Vec::new(),
            station_slot: [None; MAX_NUM_STATIONS],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn is_queued(&self, station: StationIndex) -> bool {
        station < MAX_NUM_STATIONS && self.station_slot[station].is_some()
    }

    pub fn find_by_station(&self, station: StationIndex) -> Option<&QueueItem> {
        let slot = (*self.station_slot.get(station)?)?;
        self.items.get(slot)
    }

    /// Admit a run. `dequeue_time` defaults to `start_time + duration`.
    pub fn enqueue(&mut self, station: StationIndex, program_id: u8, start_time: i64, duration: i64, dequeue_time: Option<i64>) -> Result<(), EnqueueError> {
        if self.is_queued(station) {
            return Err(EnqueueError::AlreadyQueued);
        }
        if self.items.len() >= MAX_NUM_STATIONS {
            return Err(EnqueueError::Full);
        }

        self.station_slot[station] = Some(self.items.len());
        self.items.push(QueueItem {
            station_index: station,
            program_id,
            start_time,
            duration,
            dequeue_time: dequeue_time.unwrap_or(start_time + duration),
        });
        Ok(())
    }

    /// Swap-remove the entry at `slot`, keeping the station map consistent.
    pub fn dequeue(&mut self, slot: usize) -> Option<QueueItem> {
        if slot >= self.items.len() {
            return None;
        }

        let removed = self.items.swap_remove(slot);
        self.station_slot[removed.station_index] = None;

        if let Some(moved) = self.items.get(slot) {
            self.station_slot[moved.station_index] = Some(slot);
        }

        Some(removed)
    }

    pub fn dequeue_station(&mut self, station: StationIndex) -> Option<QueueItem> {
        let slot = (*self.station_slot.get(station)?)?;
        self.dequeue(slot)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.station_slot = [None; MAX_NUM_STATIONS];
    }

    pub fn running_items(&self, now: i64) -> impl Iterator<Item = &QueueItem> {
        self.items.iter().filter(move |item| item.is_running(now))
    }

    pub fn active_station_ids(&self, now: i64) -> Vec<StationIndex> {
        self.running_items(now).map(|item| item.station_index).collect()
    }

    /// Remove and return every item whose `dequeue_time` has passed.
    pub fn remove_finished(&mut self, now: i64) -> Vec<QueueItem> {
        let mut finished = Vec::new();
        let mut slot = 0;
        while slot < self.items.len() {
            if now >= self.items[slot].dequeue_time {
                if let Some(item) = self.dequeue(slot) {
                    finished.push(item);
                }
                // the swapped-in tail now occupies `slot`; re-examine it
            } else {
                slot += 1;
            }
        }
        finished
    }

    /// Shift every unfinished entry out by `pause_duration` seconds.
    ///
    /// A currently running item is shrunk to its remaining duration first so
    /// total on-time is preserved across the pause.
    pub fn apply_pause(&mut self, now: i64, pause_duration: i64) {
        for item in self.items.iter_mut() {
            if now >= item.end_time() {
                continue;
            }
            if now >= item.start_time {
                item.duration -= now - item.start_time;
                item.start_time = now + pause_duration;
            } else {
                item.start_time += pause_duration;
            }
            item.dequeue_time += pause_duration;
        }
    }

    /// Undo a pause shift of `pause_duration` seconds.
    ///
    /// One second is added back so the tick that processes the resume does
    /// not immediately retrigger the scheduler.
    pub fn apply_resume(&mut self, pause_duration: i64) {
        for item in self.items.iter_mut() {
            item.start_time = item.start_time - pause_duration + 1;
            item.dequeue_time = item.dequeue_time - pause_duration + 1;
        }
    }
}

impl Default for RuntimeQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with(entries: &[(StationIndex, i64, i64)]) -> RuntimeQueue {
        let mut queue = RuntimeQueue::new();
        for &(station, start, duration) in entries {
            queue.enqueue(station, 1, start, duration, None).unwrap();
        }
        queue
    }

    #[test]
    fn one_item_per_station() {
        let mut queue = RuntimeQueue::new();
        queue.enqueue(4, 1, 1000, 60, None).unwrap();
        assert_eq!(queue.enqueue(4, 2, 2000, 60, None), Err(EnqueueError::AlreadyQueued));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn dequeue_time_defaults_to_end() {
        let mut queue = RuntimeQueue::new();
        queue.enqueue(0, 1, 1000, 60, None).unwrap();
        queue.enqueue(1, 1, 1000, 60, Some(1100)).unwrap();
        assert_eq!(queue.find_by_station(0).unwrap().dequeue_time, 1060);
        assert_eq!(queue.find_by_station(1).unwrap().dequeue_time, 1100);
    }

    #[test]
    fn swap_remove_keeps_station_map_consistent() {
        let mut queue = queue_with(&[(0, 1000, 60), (1, 1000, 60), (2, 1000, 60)]);

        queue.dequeue_station(0).unwrap();

        // station 2 was swapped into slot 0 and must still be reachable
        assert!(!queue.is_queued(0));
        assert_eq!(queue.find_by_station(2).unwrap().station_index, 2);
        assert_eq!(queue.find_by_station(1).unwrap().station_index, 1);
        assert_eq!(queue.len(), 2);

        queue.dequeue_station(2).unwrap();
        assert_eq!(queue.find_by_station(1).unwrap().station_index, 1);
    }

    #[test]
    fn running_and_finished_windows() {
        let mut queue = queue_with(&[(0, 1000, 60), (1, 1100, 60)]);

        assert_eq!(queue.active_station_ids(1030), vec![0]);
        assert_eq!(queue.active_station_ids(1099), Vec::<usize>::new());

        let finished = queue.remove_finished(1060);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].station_index, 0);
        assert!(queue.is_queued(1));
    }

    #[test]
    fn pause_preserves_remaining_duration_of_running_item() {
        let mut queue = queue_with(&[(0, 1000, 300)]);

        // 120 s consumed when the pause lands
        queue.apply_pause(1120, 600);

        let item = queue.find_by_station(0).unwrap();
        assert_eq!(item.duration, 180, "remaining on-time is preserved");
        assert_eq!(item.start_time, 1720);
        assert_eq!(item.dequeue_time, 1900);
    }

    #[test]
    fn pause_shifts_pending_items_whole() {
        let mut queue = queue_with(&[(0, 2000, 300)]);

        queue.apply_pause(1000, 600);

        let item = queue.find_by_station(0).unwrap();
        assert_eq!(item.start_time, 2600);
        assert_eq!(item.duration, 300);
        assert_eq!(item.dequeue_time, 2900);
    }

    #[test]
    fn pause_leaves_finished_items_alone() {
        let mut queue = queue_with(&[(0, 1000, 60)]);

        queue.apply_pause(2000, 600);

        let item = queue.find_by_station(0).unwrap();
        assert_eq!(item.start_time, 1000);
        assert_eq!(item.dequeue_time, 1060);
    }

    #[test]
    fn resume_inverts_pause_modulo_one_second() {
        let mut queue = queue_with(&[(0, 2000, 300)]);

        queue.apply_pause(1000, 600);
        queue.apply_resume(600);

        let item = queue.find_by_station(0).unwrap();
        assert_eq!(item.start_time, 2001, "original start plus exactly one second");
        assert_eq!(item.dequeue_time, 2301);
    }
}
