//! Actors that drop, erase and spoil items in a [`MikanBox`].
//!
//! Erasing a chain schedules sprays, spoiling and a drop pass, then the eraser
//! reschedules itself. The cycle ends with the first erase pass that finds no
//! chain.

use crate::actor::{Actor, ActorPriority, Scheduler};
use crate::error::Result;
use crate::item::{Item, ItemKind};
use crate::mikan_box::{Cell, Chain, MikanBox, SURROUNDINGS};
use crate::spray::Spray;
use crate::statistics::Statistics;
use crate::surface::{Renderable, Surface};
use std::f64::consts::{FRAC_PI_2, SQRT_2};

/// Pixels a dropped item falls per tick.
pub const FALLING_SPEED: f64 = 20.0;

const ERASE_SPRAY_SPEED: f64 = 1.5;
const ERASE_SPRAY_TTL: u32 = 15;
const ABSORB_SPRAY_COUNT: u32 = 4;
const ABSORB_SPRAY_RADIUS: f64 = 15.0;
const ABSORB_SPRAY_TTL: u32 = 10;
/// Ticks a fully spoiled preservative lingers before it disappears.
const DECAY_TTL: u32 = 3;
const DECAY_SPRAY_TTL: u32 = 5;

/// Work on the box, scheduled by the box itself or by the scene.
#[derive(Debug)]
pub enum BoxActor {
    /// Detaches items above a gap and lets them fall.
    Drop,
    /// An item falling into `destination_row` of its column.
    Fall { item: Item, destination_row: i32 },
    /// Erases chains and keeps the cascade going.
    Erase,
    /// Spirals sprays into the cells about to be spoiled.
    Absorb { targets: Vec<Cell> },
    /// Damages the items in `targets`.
    Spoil { targets: Vec<Cell> },
    Spray(Spray),
    /// A fully spoiled preservative about to disappear.
    Decay { item: Item, ttl: u32 },
    /// Counts erased preservatives once their decay is over.
    Tally { count: u32, ttl: u32 },
}

impl BoxActor {
    pub fn priority(&self) -> i32 {
        match self {
            Self::Spray(_) => ActorPriority::Spray,
            Self::Absorb { .. } => ActorPriority::Absorb,
            Self::Spoil { .. } | Self::Decay { .. } | Self::Tally { .. } => ActorPriority::Spoil,
            Self::Drop => ActorPriority::Drop,
            Self::Fall { .. } => ActorPriority::Fall,
            Self::Erase => ActorPriority::Erase,
        }
        .value()
    }

    /// Runs one tick of this actor. Follow-up work goes to `scheduler`.
    pub fn perform<A>(
        self,
        mikan_box: &mut MikanBox,
        statistics: &mut Statistics,
        scheduler: &mut Scheduler<A>,
    ) -> Result<()>
    where
        A: Actor + From<Self>,
    {
        match self {
            Self::Drop => drop_items(mikan_box, scheduler),
            Self::Fall {
                mut item,
                destination_row,
            } => {
                let bottom = item.y + FALLING_SPEED + f64::from(mikan_box.cell_size()) - 1.0;
                if mikan_box.row_at(bottom) >= destination_row {
                    item.translate(0.0, FALLING_SPEED);
                    scheduler.schedule(A::from(Self::Fall {
                        item,
                        destination_row,
                    }));
                } else {
                    let column = mikan_box.column_at(item.x);
                    mikan_box.place(item, column, destination_row, true)?;
                }
                Ok(())
            }
            Self::Erase => erase(mikan_box, statistics, scheduler),
            Self::Absorb { targets } => {
                for &(column, row) in &targets {
                    let cx = mikan_box.left_x_of(column);
                    let cy = mikan_box.top_y_of(row);
                    for i in 0..ABSORB_SPRAY_COUNT {
                        let angle = f64::from(i) * FRAC_PI_2;
                        scheduler.schedule(A::from(Self::Spray(Spray::spiral(
                            cx,
                            cy,
                            ABSORB_SPRAY_RADIUS,
                            angle,
                            ABSORB_SPRAY_TTL,
                        ))));
                    }
                }
                Ok(())
            }
            Self::Spoil { targets } => spoil(mikan_box, &targets, scheduler),
            Self::Spray(mut spray) => {
                if spray.step() {
                    scheduler.schedule(A::from(Self::Spray(spray)));
                }
                Ok(())
            }
            Self::Decay { item, ttl } => {
                let ttl = ttl.saturating_sub(1);
                if ttl > 0 {
                    scheduler.schedule(A::from(Self::Decay { item, ttl }));
                } else {
                    for dx in [-2.0, 0.0, 2.0] {
                        scheduler.schedule(A::from(Self::Spray(Spray::linear(
                            item.x + dx,
                            item.y,
                            DECAY_SPRAY_TTL,
                            0.0,
                            -ERASE_SPRAY_SPEED,
                        ))));
                    }
                }
                Ok(())
            }
            Self::Tally { count, ttl } => {
                let ttl = ttl.saturating_sub(1);
                if ttl > 0 {
                    scheduler.schedule(A::from(Self::Tally { count, ttl }));
                } else {
                    tracing::debug!(count, "preservatives erased");
                    statistics.add_erased_preservatives(count);
                }
                Ok(())
            }
        }
    }
}

impl Renderable for BoxActor {
    fn render(&self, surface: &mut dyn Surface) {
        match self {
            Self::Fall { item, .. } | Self::Decay { item, .. } => item.render(surface),
            Self::Spray(spray) => spray.render(surface),
            _ => {}
        }
    }
}

impl MikanBox {
    /// Schedules a pass that lets every item fall onto the one below it.
    pub fn schedule_to_drop<A: Actor + From<BoxActor>>(&self, scheduler: &mut Scheduler<A>) {
        scheduler.schedule(A::from(BoxActor::Drop));
    }

    /// Schedules the erase cycle.
    pub fn schedule_to_erase<A: Actor + From<BoxActor>>(&self, scheduler: &mut Scheduler<A>) {
        scheduler.schedule(A::from(BoxActor::Erase));
    }
}

fn drop_items<A: Actor + From<BoxActor>>(
    mikan_box: &mut MikanBox,
    scheduler: &mut Scheduler<A>,
) -> Result<()> {
    for column in 0..mikan_box.column_count() as i32 {
        let mut height = 0;
        for row in 0..mikan_box.max_row_count() as i32 {
            if mikan_box.item_at(column, row)?.is_none() {
                continue;
            }
            if row > height {
                if let Some(item) = mikan_box.take(column, row)? {
                    scheduler.schedule(A::from(BoxActor::Fall {
                        item,
                        destination_row: height,
                    }));
                }
            }
            height += 1;
        }
    }
    Ok(())
}

fn erase<A: Actor + From<BoxActor>>(
    mikan_box: &mut MikanBox,
    statistics: &mut Statistics,
    scheduler: &mut Scheduler<A>,
) -> Result<()> {
    let chains = mikan_box.chain_mikans();
    if chains.is_empty() {
        statistics.reset_combo();
        return Ok(());
    }
    let targets = mikan_box.spoil_targets(&chains);
    let mut erased = 0;
    for &(column, row) in chains.iter().flatten() {
        mikan_box.take(column, row)?;
        erased += 1;
    }
    tracing::debug!(
        chains = chains.len(),
        erased,
        spoiled = targets.len(),
        "chains erased"
    );
    statistics.add_combo();
    statistics.add_erased_mikans(erased);

    schedule_sprays(mikan_box, &chains, scheduler);
    scheduler.schedule(A::from(BoxActor::Absorb {
        targets: targets.clone(),
    }));
    scheduler.schedule(A::from(BoxActor::Spoil { targets }));
    mikan_box.schedule_to_drop(scheduler);
    mikan_box.schedule_to_erase(scheduler);
    Ok(())
}

fn schedule_sprays<A: Actor + From<BoxActor>>(
    mikan_box: &MikanBox,
    chains: &[Chain],
    scheduler: &mut Scheduler<A>,
) {
    for &(column, row) in chains.iter().flatten() {
        let x = mikan_box.left_x_of(column);
        let y = mikan_box.top_y_of(row);
        for (dc, dr) in SURROUNDINGS {
            let norm = if dc != 0 && dr != 0 { SQRT_2 } else { 1.0 };
            let speed = ERASE_SPRAY_SPEED / norm;
            scheduler.schedule(A::from(BoxActor::Spray(Spray::linear(
                x,
                y,
                ERASE_SPRAY_TTL,
                f64::from(dc) * speed,
                f64::from(dr) * speed,
            ))));
        }
    }
}

fn spoil<A: Actor + From<BoxActor>>(
    mikan_box: &mut MikanBox,
    targets: &[Cell],
    scheduler: &mut Scheduler<A>,
) -> Result<()> {
    let mut decayed = 0;
    for &(column, row) in targets {
        let Some(item) = mikan_box.item_at_mut(column, row)? else {
            continue;
        };
        item.spoil();
        if item.kind() == ItemKind::Preservative && item.is_max_damaged() {
            if let Some(item) = mikan_box.take(column, row)? {
                scheduler.schedule(A::from(BoxActor::Decay {
                    item,
                    ttl: DECAY_TTL,
                }));
                decayed += 1;
            }
        }
    }
    if decayed > 0 {
        scheduler.schedule(A::from(BoxActor::Tally {
            count: decayed,
            ttl: DECAY_TTL,
        }));
    }
    Ok(())
}
