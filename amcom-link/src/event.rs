//! Timed event manager
//!
//! Cooperative scheduler for the main loop: events are registered once,
//! scheduled for an absolute time, and run from [`EventManager::process`]
//! when that time has passed. Handlers run in registration order.
//!
//! Times are plain `u64` ticks; the caller decides the unit.

use heapless::Vec;

/// Event handler
///
/// Called with the shared context, the event's id and the time it was
/// scheduled for. Returning `Some(time)` schedules the event again.
pub type EventHandler<C> = fn(&mut C, EventId, u64) -> Option<u64>;

/// Handle to a registered event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventId(u32);

/// Event manager errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventError {
    /// All event slots are in use
    Full,
    /// The id does not name a registered event
    UnknownEvent,
}

struct Entry<C> {
    id: EventId,
    handler: EventHandler<C>,
    scheduled: Option<u64>,
}

/// Manager for up to `N` events sharing a context of type `C`
pub struct EventManager<C, const N: usize> {
    entries: Vec<Entry<C>, N>,
    next_id: u32,
}

impl<C, const N: usize> Default for EventManager<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> EventManager<C, N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Forget every registered event
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Register a new, unscheduled event
    pub fn register(&mut self, handler: EventHandler<C>) -> Result<EventId, EventError> {
        let id = EventId(self.next_id);
        self.entries
            .push(Entry {
                id,
                handler,
                scheduled: None,
            })
            .map_err(|_| EventError::Full)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    /// Replace the handler of a registered event, keeping its schedule
    pub fn set_handler(&mut self, id: EventId, handler: EventHandler<C>) -> Result<(), EventError> {
        self.entry_mut(id)?.handler = handler;
        Ok(())
    }

    /// Remove an event; a pending run is dropped with it
    pub fn unregister(&mut self, id: EventId) -> Result<(), EventError> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(EventError::UnknownEvent)?;
        self.entries.remove(index);
        Ok(())
    }

    /// Schedule an event to run at `time`, replacing any earlier schedule
    pub fn schedule(&mut self, id: EventId, time: u64) -> Result<(), EventError> {
        self.entry_mut(id)?.scheduled = Some(time);
        Ok(())
    }

    /// Cancel a pending run without unregistering
    pub fn cancel(&mut self, id: EventId) -> Result<(), EventError> {
        self.entry_mut(id)?.scheduled = None;
        Ok(())
    }

    pub fn is_scheduled(&self, id: EventId) -> bool {
        self.scheduled_time(id).is_some()
    }

    /// Time the event is scheduled for, if it is registered and pending
    pub fn scheduled_time(&self, id: EventId) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| e.scheduled)
    }

    /// Number of registered events
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending time across all events
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().filter_map(|e| e.scheduled).min()
    }

    /// Run every event due at or before `now`
    ///
    /// Each due event is unscheduled before its handler runs, so a handler
    /// that returns `None` runs once. Returns the number of handlers run.
    pub fn process(&mut self, now: u64, ctx: &mut C) -> usize {
        let mut ran = 0;
        for entry in self.entries.iter_mut() {
            match entry.scheduled {
                Some(time) if time <= now => {
                    entry.scheduled = None;
                    entry.scheduled = (entry.handler)(ctx, entry.id, time);
                    ran += 1;
                }
                _ => {}
            }
        }
        ran
    }

    fn entry_mut(&mut self, id: EventId) -> Result<&mut Entry<C>, EventError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(EventError::UnknownEvent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        runs: Vec<(u32, u64), 16>,
    }

    fn record(log: &mut Log, id: EventId, time: u64) -> Option<u64> {
        log.runs.push((id.0, time)).unwrap();
        None
    }

    fn every_10(log: &mut Log, id: EventId, time: u64) -> Option<u64> {
        log.runs.push((id.0, time)).unwrap();
        Some(time + 10)
    }

    #[test]
    fn test_register_and_process() {
        let mut events = EventManager::<Log, 4>::new();
        let mut log = Log::default();
        let id = events.register(record).unwrap();

        assert_eq!(events.process(100, &mut log), 0);
        events.schedule(id, 50).unwrap();
        assert!(events.is_scheduled(id));

        assert_eq!(events.process(49, &mut log), 0);
        assert_eq!(events.process(50, &mut log), 1);
        assert_eq!(&log.runs[..], &[(0, 50)]);
        assert!(!events.is_scheduled(id));

        // Runs once
        assert_eq!(events.process(1000, &mut log), 0);
    }

    #[test]
    fn test_late_processing_reports_scheduled_time() {
        let mut events = EventManager::<Log, 4>::new();
        let mut log = Log::default();
        let id = events.register(record).unwrap();
        events.schedule(id, 5).unwrap();
        events.process(500, &mut log);
        assert_eq!(&log.runs[..], &[(0, 5)]);
    }

    #[test]
    fn test_registration_order() {
        let mut events = EventManager::<Log, 4>::new();
        let mut log = Log::default();
        let a = events.register(record).unwrap();
        let b = events.register(record).unwrap();
        events.schedule(b, 1).unwrap();
        events.schedule(a, 2).unwrap();

        events.process(10, &mut log);
        assert_eq!(&log.runs[..], &[(0, 2), (1, 1)]);
    }

    #[test]
    fn test_periodic_reschedule() {
        let mut events = EventManager::<Log, 4>::new();
        let mut log = Log::default();
        let id = events.register(every_10).unwrap();
        events.schedule(id, 0).unwrap();

        for now in [0, 5, 10, 25, 30] {
            events.process(now, &mut log);
        }
        assert_eq!(&log.runs[..], &[(0, 0), (0, 10), (0, 20), (0, 30)]);
        assert_eq!(events.scheduled_time(id), Some(40));
        assert_eq!(events.next_deadline(), Some(40));
    }

    #[test]
    fn test_set_handler_keeps_schedule() {
        let mut events = EventManager::<Log, 4>::new();
        let mut log = Log::default();
        let id = events.register(record).unwrap();
        events.schedule(id, 3).unwrap();
        events.set_handler(id, every_10).unwrap();

        events.process(3, &mut log);
        assert_eq!(events.scheduled_time(id), Some(13));
    }

    #[test]
    fn test_unregister_and_stale_id() {
        let mut events = EventManager::<Log, 2>::new();
        let mut log = Log::default();
        let a = events.register(record).unwrap();
        events.schedule(a, 1).unwrap();
        events.unregister(a).unwrap();

        assert_eq!(events.process(10, &mut log), 0);
        assert_eq!(events.schedule(a, 1), Err(EventError::UnknownEvent));
        assert_eq!(events.unregister(a), Err(EventError::UnknownEvent));

        // Slot is reusable, old id stays dead
        let b = events.register(record).unwrap();
        assert_ne!(a, b);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_full() {
        let mut events = EventManager::<Log, 2>::new();
        events.register(record).unwrap();
        events.register(record).unwrap();
        assert_eq!(events.register(record), Err(EventError::Full));
    }

    #[test]
    fn test_cancel() {
        let mut events = EventManager::<Log, 2>::new();
        let mut log = Log::default();
        let id = events.register(record).unwrap();
        events.schedule(id, 1).unwrap();
        events.cancel(id).unwrap();
        assert_eq!(events.process(10, &mut log), 0);
        assert_eq!(events.next_deadline(), None);
    }
}
