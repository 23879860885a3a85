//! Game statistics and their change notifications.
//!
//! Every mutation goes through a method that emits exactly one
//! [`StatisticsEvent`] to the registered observers, synchronously. An observer
//! may mutate the statistics while handling an event; the events this causes
//! are delivered after the current one has reached every observer, before the
//! outermost call returns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Notification emitted by [`Statistics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsEvent {
    LevelUpdated,
    ScoreUpdated,
    /// Number of newly erased mikans.
    MikansErased(u32),
    /// Number of newly erased preservatives.
    PreservativesErased(u32),
    /// Combo incremented or reset.
    ComboUpdated,
    StatisticsReset,
}

pub trait StatisticsObserver {
    fn on_statistics_event(&mut self, event: StatisticsEvent, statistics: &mut Statistics);
}

impl<T: StatisticsObserver> StatisticsObserver for Rc<RefCell<T>> {
    fn on_statistics_event(&mut self, event: StatisticsEvent, statistics: &mut Statistics) {
        self.borrow_mut().on_statistics_event(event, statistics);
    }
}

/// Handle returned by [`Statistics::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Registered {
    id: ObserverId,
    observer: Box<dyn StatisticsObserver>,
}

#[derive(Default)]
pub struct Statistics {
    level: u32,
    score: u64,
    erased_mikan_count: u32,
    erased_preservative_count: u32,
    combo_length: u32,
    observers: Vec<Registered>,
    next_observer_id: u64,
    pending: VecDeque<StatisticsEvent>,
    dispatching: bool,
    /// Observers taken out of `observers` while an event is delivered.
    delivering: Vec<ObserverId>,
    removed_while_dispatching: Vec<ObserverId>,
}

impl std::fmt::Debug for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statistics")
            .field("level", &self.level)
            .field("score", &self.score)
            .field("erased_mikan_count", &self.erased_mikan_count)
            .field("erased_preservative_count", &self.erased_preservative_count)
            .field("combo_length", &self.combo_length)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn erased_mikan_count(&self) -> u32 {
        self.erased_mikan_count
    }

    pub fn erased_preservative_count(&self) -> u32 {
        self.erased_preservative_count
    }

    pub fn combo_length(&self) -> u32 {
        self.combo_length
    }

    /// No-op (and no event) if `level` is unchanged.
    pub fn set_level(&mut self, level: u32) {
        if self.level != level {
            self.level = level;
            self.emit(StatisticsEvent::LevelUpdated);
        }
    }

    /// No-op (and no event) if `score` is unchanged.
    pub fn set_score(&mut self, score: u64) {
        if self.score != score {
            self.score = score;
            self.emit(StatisticsEvent::ScoreUpdated);
        }
    }

    pub fn add_erased_mikans(&mut self, count: u32) {
        if count != 0 {
            self.erased_mikan_count += count;
            self.emit(StatisticsEvent::MikansErased(count));
        }
    }

    pub fn add_erased_preservatives(&mut self, count: u32) {
        if count != 0 {
            self.erased_preservative_count += count;
            self.emit(StatisticsEvent::PreservativesErased(count));
        }
    }

    pub fn add_combo(&mut self) {
        self.combo_length += 1;
        self.emit(StatisticsEvent::ComboUpdated);
    }

    pub fn reset_combo(&mut self) {
        self.combo_length = 0;
        self.emit(StatisticsEvent::ComboUpdated);
    }

    /// Zeroes every counter. Observers stay registered.
    pub fn reset(&mut self) {
        self.level = 0;
        self.score = 0;
        self.erased_mikan_count = 0;
        self.erased_preservative_count = 0;
        self.combo_length = 0;
        self.emit(StatisticsEvent::StatisticsReset);
    }

    pub fn add_observer(&mut self, observer: Box<dyn StatisticsObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push(Registered { id, observer });
        id
    }

    /// Returns false if `id` is not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        if let Some(idx) = self.observers.iter().position(|r| r.id == id) {
            self.observers.remove(idx);
            return true;
        }
        if self.delivering.contains(&id) && !self.removed_while_dispatching.contains(&id) {
            // out for delivery; gets no further events and is dropped once dispatch ends
            self.removed_while_dispatching.push(id);
            return true;
        }
        false
    }

    fn emit(&mut self, event: StatisticsEvent) {
        self.pending.push_back(event);
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        let mut observers = std::mem::take(&mut self.observers);
        self.delivering = observers.iter().map(|r| r.id).collect();
        while let Some(event) = self.pending.pop_front() {
            for registered in &mut observers {
                if self.removed_while_dispatching.contains(&registered.id) {
                    continue;
                }
                registered.observer.on_statistics_event(event, self);
            }
        }
        self.delivering.clear();
        // observers added while dispatching come after the existing ones
        observers.append(&mut self.observers);
        let removed = std::mem::take(&mut self.removed_while_dispatching);
        observers.retain(|r| !removed.contains(&r.id));
        self.observers = observers;
        self.dispatching = false;
    }
}

/// Traces every notification.
#[derive(Debug, Default)]
pub struct StatisticsLogger;

impl StatisticsObserver for StatisticsLogger {
    fn on_statistics_event(&mut self, event: StatisticsEvent, statistics: &mut Statistics) {
        tracing::debug!(
            ?event,
            level = statistics.level(),
            score = statistics.score(),
            combo = statistics.combo_length(),
            "statistics updated"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Observer that keeps every event it receives.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub events: Vec<StatisticsEvent>,
    }

    impl StatisticsObserver for Recorder {
        fn on_statistics_event(&mut self, event: StatisticsEvent, _statistics: &mut Statistics) {
            self.events.push(event);
        }
    }

    pub fn recorded(statistics: &mut Statistics) -> Rc<RefCell<Recorder>> {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        statistics.add_observer(Box::new(Rc::clone(&recorder)));
        recorder
    }
}

#[cfg(test)]
mod tests {
    use super::testing::recorded;
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_add_erased_mikans() {
        let mut stats = Statistics::new();
        let recorder = recorded(&mut stats);

        stats.add_erased_mikans(0);
        assert!(recorder.borrow().events.is_empty());

        stats.add_erased_mikans(3);
        assert_eq!(recorder.borrow().events, vec![StatisticsEvent::MikansErased(3)]);
        assert_eq!(stats.erased_mikan_count(), 3);
    }

    #[test]
    fn test_setters_skip_unchanged_values() {
        let mut stats = Statistics::new();
        let recorder = recorded(&mut stats);

        stats.set_level(0);
        stats.set_score(0);
        assert!(recorder.borrow().events.is_empty());

        stats.set_level(2);
        stats.set_score(150);
        stats.set_score(150);
        assert_eq!(
            recorder.borrow().events,
            vec![StatisticsEvent::LevelUpdated, StatisticsEvent::ScoreUpdated]
        );
    }

    #[test]
    fn test_combo_and_reset() {
        let mut stats = Statistics::new();
        let recorder = recorded(&mut stats);

        stats.add_combo();
        stats.add_combo();
        assert_eq!(stats.combo_length(), 2);
        stats.reset_combo();
        assert_eq!(stats.combo_length(), 0);
        stats.add_erased_preservatives(2);
        stats.set_score(10);
        stats.reset();

        assert_eq!(stats.score(), 0);
        assert_eq!(stats.erased_preservative_count(), 0);
        assert_eq!(
            recorder.borrow().events,
            vec![
                StatisticsEvent::ComboUpdated,
                StatisticsEvent::ComboUpdated,
                StatisticsEvent::ComboUpdated,
                StatisticsEvent::PreservativesErased(2),
                StatisticsEvent::ScoreUpdated,
                StatisticsEvent::StatisticsReset,
            ]
        );
    }

    /// Bumps the score whenever mikans are erased.
    struct Bonus;

    impl StatisticsObserver for Bonus {
        fn on_statistics_event(&mut self, event: StatisticsEvent, statistics: &mut Statistics) {
            if let StatisticsEvent::MikansErased(count) = event {
                statistics.set_score(statistics.score() + u64::from(count));
            }
        }
    }

    #[test]
    fn test_nested_events_are_delivered_in_order() {
        let mut stats = Statistics::new();
        stats.add_observer(Box::new(Bonus));
        let recorder = recorded(&mut stats);

        stats.add_erased_mikans(4);
        assert_eq!(stats.score(), 4);
        assert_eq!(
            recorder.borrow().events,
            vec![StatisticsEvent::MikansErased(4), StatisticsEvent::ScoreUpdated]
        );
    }

    #[test]
    fn test_remove_observer() {
        let mut stats = Statistics::new();
        let recorder = Rc::new(RefCell::new(testing::Recorder::default()));
        let id = stats.add_observer(Box::new(Rc::clone(&recorder)));

        assert!(stats.remove_observer(id));
        assert!(!stats.remove_observer(id));
        stats.add_combo();
        assert!(recorder.borrow().events.is_empty());
    }

    /// Unregisters itself on the first event and counts what it receives.
    struct OneShot {
        id: Rc<Cell<Option<ObserverId>>>,
        seen: Rc<Cell<u32>>,
        removals: Rc<RefCell<Vec<bool>>>,
    }

    impl StatisticsObserver for OneShot {
        fn on_statistics_event(&mut self, _event: StatisticsEvent, statistics: &mut Statistics) {
            self.seen.set(self.seen.get() + 1);
            if let Some(id) = self.id.get() {
                let mut removals = self.removals.borrow_mut();
                removals.push(statistics.remove_observer(id));
                removals.push(statistics.remove_observer(id));
                // never registered
                removals.push(statistics.remove_observer(ObserverId(id.0 + 100)));
            }
            statistics.set_level(statistics.level() + 1);
        }
    }

    #[test]
    fn test_observer_removes_itself_while_notified() {
        let mut stats = Statistics::new();
        let id_slot = Rc::new(Cell::new(None));
        let seen = Rc::new(Cell::new(0));
        let removals = Rc::new(RefCell::new(Vec::new()));
        let id = stats.add_observer(Box::new(OneShot {
            id: Rc::clone(&id_slot),
            seen: Rc::clone(&seen),
            removals: Rc::clone(&removals),
        }));
        id_slot.set(Some(id));
        let recorder = recorded(&mut stats);

        stats.add_combo();
        // the level change it caused is not delivered back to it
        assert_eq!(seen.get(), 1);
        assert_eq!(*removals.borrow(), vec![true, false, false]);
        assert_eq!(
            recorder.borrow().events,
            vec![StatisticsEvent::ComboUpdated, StatisticsEvent::LevelUpdated]
        );

        stats.add_combo();
        assert_eq!(seen.get(), 1);
        assert!(!stats.remove_observer(id));
        assert_eq!(recorder.borrow().events.len(), 3);
    }
}
