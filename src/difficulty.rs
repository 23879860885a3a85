//! Difficulty policy: scoring, levelling and the items to spawn next.

use crate::item::{Item, ItemKind};
use crate::statistics::{Statistics, StatisticsEvent, StatisticsObserver};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

/// Base score of an erased mikan.
pub const MIKAN_SCORE: u64 = 10;
/// Base score of an erased preservative.
pub const PRESERVATIVE_SCORE: u64 = 1000;
/// Mikans to erase per level.
pub const LEVEL_THRESHOLD: u32 = 20;
/// How many times more likely the max damage is than any other damage value.
pub const MAX_DAMAGE_RATIO: u32 = 2;

const MAX_SPEED: f64 = 15.0;
const MAX_PRESERVATIVE_PROBABILITY: f64 = 0.1;

/// Where spawned items come from.
pub trait ItemSource {
    fn next_item(&mut self) -> Item;

    /// Falling speed of the grabbed pair, pixels per tick.
    fn speed(&self) -> f64;

    /// Items known to come next, oldest first.
    fn upcoming(&self) -> Vec<&Item> {
        Vec::new()
    }
}

impl<T: ItemSource> ItemSource for Rc<RefCell<T>> {
    fn next_item(&mut self) -> Item {
        self.borrow_mut().next_item()
    }

    fn speed(&self) -> f64 {
        self.borrow().speed()
    }
}

/// Derives spawn parameters from the level and scores erasures.
///
/// Observes [`Statistics`]; see [`Difficulty::attach`].
#[derive(Debug)]
pub struct Difficulty {
    rng: StdRng,
    to_next_level: u32,
    speed: f64,
    preservative_stock: u32,
    preservative_count: u32,
    preservative_probability: f64,
    max_damage_ratio: u32,
}

impl Difficulty {
    /// Parameters for the current level of `statistics`. Not yet observing it.
    pub fn new(statistics: &Statistics, rng: StdRng) -> Self {
        let mut difficulty = Self {
            rng,
            to_next_level: LEVEL_THRESHOLD,
            speed: 0.0,
            preservative_stock: 0,
            preservative_count: 0,
            preservative_probability: 0.0,
            max_damage_ratio: MAX_DAMAGE_RATIO,
        };
        difficulty.reset_parameters(statistics.level());
        difficulty
    }

    /// Creates a difficulty that observes `statistics`. A `seed` makes the item
    /// sequence reproducible.
    pub fn attach(statistics: &mut Statistics, seed: Option<u64>) -> Rc<RefCell<Self>> {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let difficulty = Rc::new(RefCell::new(Self::new(statistics, rng)));
        statistics.add_observer(Box::new(Rc::clone(&difficulty)));
        difficulty
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Mikans still to erase before the next level.
    pub fn to_next_level(&self) -> u32 {
        self.to_next_level
    }

    pub fn preservative_stock(&self) -> u32 {
        self.preservative_stock
    }

    pub fn preservative_probability(&self) -> f64 {
        self.preservative_probability
    }

    fn reset_parameters(&mut self, level: u32) {
        self.to_next_level = LEVEL_THRESHOLD;
        self.preservative_count = 0;
        self.max_damage_ratio = MAX_DAMAGE_RATIO;
        self.update_parameters(level);
    }

    fn update_parameters(&mut self, level: u32) {
        let level_f = f64::from(level);
        self.speed = (2.0 + level_f / 4.0).min(MAX_SPEED);
        self.preservative_probability =
            ((level_f - 4.0) / 250.0).clamp(0.0, MAX_PRESERVATIVE_PROBABILITY);
        self.preservative_stock = (level + 1) * (level + 2) / 10;
    }

    /// Consumes `count` erased mikans against the level thresholds.
    fn advance_level(&mut self, level: u32, mut count: u32) -> u32 {
        let mut level = level;
        while count > self.to_next_level {
            count -= self.to_next_level;
            level += 1;
            self.to_next_level = LEVEL_THRESHOLD;
        }
        self.to_next_level -= count;
        level
    }

    fn draw_mikan_damage(&mut self) -> u8 {
        let max = ItemKind::Mikan.max_damage();
        let span = f64::from(u32::from(max) + self.max_damage_ratio);
        let mut chance = self.rng.gen_range(0.0..span);
        let mut damage = 0;
        while chance >= 1.0 && damage < max {
            chance -= 1.0;
            damage += 1;
        }
        damage
    }
}

/// `2^(combo - 1)` rounded half up, so a combo of 0 counts as 1.
fn combo_factor(combo_length: u32) -> u64 {
    1u64.checked_shl(combo_length.saturating_sub(1)).unwrap_or(u64::MAX)
}

fn scored(base: u64, combo_length: u32) -> u64 {
    base.saturating_mul(combo_factor(combo_length))
}

impl ItemSource for Difficulty {
    fn next_item(&mut self) -> Item {
        if self.preservative_count < self.preservative_stock
            && self.rng.gen_bool(self.preservative_probability)
        {
            self.preservative_count += 1;
            Item::preservative()
        } else {
            Item::mikan(self.draw_mikan_damage())
        }
    }

    fn speed(&self) -> f64 {
        self.speed
    }
}

impl StatisticsObserver for Difficulty {
    fn on_statistics_event(&mut self, event: StatisticsEvent, statistics: &mut Statistics) {
        match event {
            StatisticsEvent::MikansErased(count) => {
                let level = statistics.level();
                let gained = scored(
                    u64::from(count + level) * MIKAN_SCORE,
                    statistics.combo_length(),
                );
                statistics.set_score(statistics.score().saturating_add(gained));
                let level = self.advance_level(level, count);
                statistics.set_level(level);
            }
            StatisticsEvent::PreservativesErased(count) => {
                let gained = scored(
                    u64::from(count) * PRESERVATIVE_SCORE,
                    statistics.combo_length(),
                );
                statistics.set_score(statistics.score().saturating_add(gained));
            }
            StatisticsEvent::LevelUpdated => self.update_parameters(statistics.level()),
            StatisticsEvent::StatisticsReset => self.reset_parameters(statistics.level()),
            StatisticsEvent::ScoreUpdated | StatisticsEvent::ComboUpdated => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(seed: u64) -> (Statistics, Rc<RefCell<Difficulty>>) {
        let mut stats = Statistics::new();
        let difficulty = Difficulty::attach(&mut stats, Some(seed));
        (stats, difficulty)
    }

    #[test]
    fn test_level_zero_parameters() {
        let (_stats, difficulty) = attached(1);
        let d = difficulty.borrow();
        assert_eq!(d.speed(), 2.0);
        assert_eq!(d.preservative_probability(), 0.0);
        assert_eq!(d.preservative_stock(), 0);
        assert_eq!(d.to_next_level(), LEVEL_THRESHOLD);
    }

    #[test]
    fn test_erasing_25_mikans_levels_up() {
        let (mut stats, difficulty) = attached(1);
        stats.add_erased_mikans(25);

        assert_eq!(stats.level(), 1);
        assert_eq!(difficulty.borrow().to_next_level(), 15);
        // (25 + 0) * 10, no combo yet
        assert_eq!(stats.score(), 250);
        assert_eq!(difficulty.borrow().speed(), 2.25);
    }

    #[test]
    fn test_exact_threshold_waits_for_next_erase() {
        let (mut stats, difficulty) = attached(1);
        stats.add_erased_mikans(20);
        assert_eq!(stats.level(), 0);
        assert_eq!(difficulty.borrow().to_next_level(), 0);
        stats.add_erased_mikans(1);
        assert_eq!(stats.level(), 1);
        assert_eq!(difficulty.borrow().to_next_level(), 19);
    }

    #[test]
    fn test_no_combo_scores_single() {
        let (mut stats, _difficulty) = attached(1);
        assert_eq!(stats.combo_length(), 0);
        stats.add_erased_preservatives(1);
        assert_eq!(stats.score(), PRESERVATIVE_SCORE);
        stats.add_combo();
        stats.add_erased_mikans(4);
        assert_eq!(stats.score(), PRESERVATIVE_SCORE + 40);
    }

    #[test]
    fn test_combo_factor() {
        assert_eq!(combo_factor(0), 1);
        assert_eq!(combo_factor(1), 1);
        assert_eq!(combo_factor(4), 8);
        assert_eq!(combo_factor(200), u64::MAX);
        assert_eq!(scored(10, 200), u64::MAX);
    }

    #[test]
    fn test_combo_multiplies_score() {
        let (mut stats, _difficulty) = attached(1);
        stats.add_combo();
        stats.add_combo();
        stats.add_combo();
        stats.add_erased_mikans(4);
        // (4 + 0) * 10 * 2^2
        assert_eq!(stats.score(), 160);
        stats.add_erased_preservatives(1);
        assert_eq!(stats.score(), 160 + 4000);
    }

    #[test]
    fn test_parameters_follow_level() {
        let (mut stats, difficulty) = attached(1);
        stats.set_level(30);
        {
            let d = difficulty.borrow();
            assert_eq!(d.speed(), 9.5);
            assert_eq!(d.preservative_probability(), MAX_PRESERVATIVE_PROBABILITY);
            assert_eq!(d.preservative_stock(), 99);
        }
        stats.set_level(100);
        assert_eq!(difficulty.borrow().speed(), MAX_SPEED);

        stats.reset();
        let d = difficulty.borrow();
        assert_eq!(d.speed(), 2.0);
        assert_eq!(d.preservative_stock(), 0);
        assert_eq!(d.to_next_level(), LEVEL_THRESHOLD);
    }

    #[test]
    fn test_next_item_at_level_zero_is_always_a_mikan() {
        let (_stats, difficulty) = attached(7);
        let mut counts = [0u32; 4];
        for _ in 0..5000 {
            let item = difficulty.borrow_mut().next_item();
            assert_eq!(item.kind(), ItemKind::Mikan);
            counts[usize::from(item.damage())] += 1;
        }
        // the max damage is about twice as likely as each other value
        for &low in &counts[..3] {
            assert!(low > 700 && low < 1300, "{counts:?}");
        }
        assert!(counts[3] > 1700 && counts[3] < 2300, "{counts:?}");
    }

    #[test]
    fn test_preservatives_are_limited_by_stock() {
        let (mut stats, difficulty) = attached(3);
        stats.set_level(40);
        let stock = difficulty.borrow().preservative_stock();
        let preservatives = (0..20_000)
            .filter(|_| difficulty.borrow_mut().next_item().kind() == ItemKind::Preservative)
            .count();
        assert!(preservatives > 0);
        assert!(preservatives <= stock as usize);
    }
}
