//! Cooperative actor scheduler: prioritized units of work that may re-enqueue themselves.

use crate::search::{lower_bound, upper_bound};

/// Phases of a tick, from the earliest to the latest.
///
/// Only the lowest non-negative band present in the queue runs in a tick, so a
/// phase does not start until every earlier phase has stopped rescheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum ActorPriority {
    /// Player input; runs in the tick it was issued, ahead of every phase.
    Input = -1,
    Spray = 0,
    Absorb = 1,
    Spoil = 2,
    Drop = 3,
    Fall = 4,
    Erase = 5,
    Control = 6,
    Spawn = 7,
}

impl ActorPriority {
    pub const fn value(self) -> i32 {
        self as i32
    }
}

/// A unit of deferred work.
///
/// `act` consumes the actor; one that wants to run again hands itself back to
/// `scheduler`.
pub trait Actor: Sized {
    /// State the actor works on.
    type Context;
    type Error;

    /// Lower runs earlier. Negative priorities run every tick they are queued.
    fn priority(&self) -> i32;

    fn act(
        self,
        context: &mut Self::Context,
        scheduler: &mut Scheduler<Self>,
    ) -> Result<(), Self::Error>;
}

/// Queue of pending actors.
#[derive(Debug)]
pub struct Scheduler<A> {
    queue: Vec<A>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self { queue: Vec::new() }
    }
}

impl<A: Actor> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, actor: A) {
        self.queue.push(actor);
    }

    /// Runs one tick.
    ///
    /// Executes every negative-priority actor, then every actor of the lowest
    /// non-negative priority present. The rest wait for later ticks, after
    /// anything scheduled during this one.
    ///
    /// Stops at the first failing actor: the actors of this tick that did not
    /// get to run are put back in the queue and the error is returned.
    pub fn run(&mut self, context: &mut A::Context) -> Result<usize, A::Error> {
        if self.queue.is_empty() {
            return Ok(0);
        }
        let mut pending = std::mem::take(&mut self.queue);
        pending.sort_by_key(A::priority);

        let by_priority = |actor: &A, priority: &i32| actor.priority().cmp(priority);
        let mut upper = lower_bound(&pending, &0, by_priority);
        if upper < pending.len() {
            let band = pending[upper].priority();
            upper = upper_bound(&pending, &band, by_priority);
        }
        let deferred = pending.split_off(upper);

        let mut ready = pending.into_iter();
        let mut executed = 0;
        while let Some(actor) = ready.next() {
            if let Err(err) = actor.act(context, self) {
                self.queue.extend(ready);
                self.queue.extend(deferred);
                return Err(err);
            }
            executed += 1;
        }
        self.queue.extend(deferred);
        Ok(executed)
    }

    /// Drops every pending actor.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records its id when run; reschedules itself while `repeat > 0`.
    #[derive(Debug)]
    struct Probe {
        id: u32,
        priority: i32,
        repeat: u32,
        fail: bool,
    }

    impl Probe {
        fn new(id: u32, priority: i32) -> Self {
            Self {
                id,
                priority,
                repeat: 0,
                fail: false,
            }
        }
    }

    impl Actor for Probe {
        type Context = Vec<u32>;
        type Error = u32;

        fn priority(&self) -> i32 {
            self.priority
        }

        fn act(mut self, log: &mut Vec<u32>, scheduler: &mut Scheduler<Self>) -> Result<(), u32> {
            if self.fail {
                return Err(self.id);
            }
            log.push(self.id);
            if self.repeat > 0 {
                self.repeat -= 1;
                scheduler.schedule(self);
            }
            Ok(())
        }
    }

    #[test]
    fn test_priorities_are_ordered() {
        assert!(ActorPriority::Input.value() < 0);
        let phases = [
            ActorPriority::Spray,
            ActorPriority::Absorb,
            ActorPriority::Spoil,
            ActorPriority::Drop,
            ActorPriority::Fall,
            ActorPriority::Erase,
            ActorPriority::Control,
            ActorPriority::Spawn,
        ];
        assert!(phases.windows(2).all(|w| w[0].value() < w[1].value()));
        assert_eq!(ActorPriority::Spray.value(), 0);
    }

    #[test]
    fn test_run_empty_is_noop() {
        let mut scheduler: Scheduler<Probe> = Scheduler::new();
        let mut log = Vec::new();
        assert_eq!(scheduler.run(&mut log), Ok(0));
        assert!(log.is_empty());
    }

    #[test]
    fn test_run_negative_and_lowest_band() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Probe::new(4, 2));
        scheduler.schedule(Probe::new(2, 0));
        scheduler.schedule(Probe::new(1, -1));
        scheduler.schedule(Probe::new(3, 0));
        let mut log = Vec::new();

        assert_eq!(scheduler.run(&mut log), Ok(3));
        assert_eq!(log[0], 1);
        log[1..].sort_unstable();
        assert_eq!(log, vec![1, 2, 3]);
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.iter().next().map(|p| p.priority), Some(2));

        log.clear();
        assert_eq!(scheduler.run(&mut log), Ok(1));
        assert_eq!(log, vec![4]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_only_negative_actors() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Probe::new(1, -3));
        scheduler.schedule(Probe::new(2, -1));
        let mut log = Vec::new();
        assert_eq!(scheduler.run(&mut log), Ok(2));
        assert_eq!(log, vec![1, 2]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_self_rescheduling_blocks_later_bands() {
        let mut scheduler = Scheduler::new();
        let mut repeating = Probe::new(1, 0);
        repeating.repeat = 2;
        scheduler.schedule(repeating);
        scheduler.schedule(Probe::new(2, 5));
        let mut log = Vec::new();

        for _ in 0..3 {
            scheduler.run(&mut log).unwrap();
        }
        assert_eq!(log, vec![1, 1, 1]);
        scheduler.run(&mut log).unwrap();
        assert_eq!(log, vec![1, 1, 1, 2]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_error_keeps_unrun_actors() {
        let mut scheduler = Scheduler::new();
        let mut failing = Probe::new(9, 0);
        failing.fail = true;
        scheduler.schedule(failing);
        scheduler.schedule(Probe::new(2, 3));
        let mut log = Vec::new();

        assert_eq!(scheduler.run(&mut log), Err(9));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.run(&mut log), Ok(1));
        assert_eq!(log, vec![2]);
    }

    #[test]
    fn test_clear() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Probe::new(1, 0));
        scheduler.schedule(Probe::new(2, 1));
        scheduler.clear();
        assert!(scheduler.is_empty());
    }
}
