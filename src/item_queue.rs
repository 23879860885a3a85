//! Look-ahead over an [`ItemSource`], so upcoming items can be previewed.

use crate::difficulty::ItemSource;
use crate::item::Item;
use std::collections::VecDeque;

/// Keeps the next `capacity` items of the wrapped source queued.
#[derive(Debug)]
pub struct ItemQueue<S> {
    source: S,
    queue: VecDeque<Item>,
}

impl<S: ItemSource> ItemQueue<S> {
    pub fn new(mut source: S, capacity: usize) -> Self {
        let queue = (0..capacity).map(|_| source.next_item()).collect();
        Self { source, queue }
    }
}

impl<S: ItemSource> ItemSource for ItemQueue<S> {
    /// The oldest queued item; the queue is topped up from the source.
    fn next_item(&mut self) -> Item {
        self.queue.push_back(self.source.next_item());
        self.queue.pop_front().unwrap_or_else(|| self.source.next_item())
    }

    fn speed(&self) -> f64 {
        self.source.speed()
    }

    fn upcoming(&self) -> Vec<&Item> {
        self.queue.iter().collect()
    }
}
