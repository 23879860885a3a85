//! The game scene: spawns the grabbed pair, applies gravity and player input,
//! and drives the box through one scheduler.

use crate::actor::{Actor, ActorPriority, Scheduler};
use crate::cascade::BoxActor;
use crate::difficulty::ItemSource;
use crate::error::{GameError, Result};
use crate::item::Item;
use crate::mikan_box::MikanBox;
use crate::statistics::Statistics;
use crate::surface::{Renderable, Surface};

/// Buffer rows the grabbed pair needs above the visible area.
pub const MIN_ROW_MARGIN: usize = 2;

/// Receiver of directional commands from an input device.
pub trait DirectionListener {
    fn move_left(&mut self);
    fn move_right(&mut self);
    fn rotate_clockwise(&mut self);
    fn rotate_counter_clockwise(&mut self);
    fn release_control(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    MoveLeft,
    MoveRight,
    RotateClockwise,
    RotateCounterClockwise,
    ReleaseControl,
}

/// The two items under player control.
///
/// `items[1]` orbits `items[0]`: rotation 0 puts it above, 1 to the right,
/// 2 below and 3 to the left.
#[derive(Debug)]
pub struct GrabbedPair {
    pub items: [Item; 2],
    rotation: u8,
}

impl GrabbedPair {
    fn left(&self) -> f64 {
        self.items[0].x.min(self.items[1].x)
    }

    fn right(&self) -> f64 {
        self.items[0].x.max(self.items[1].x)
    }

    /// Top y of the lower item.
    fn bottom(&self) -> f64 {
        self.items[0].y.max(self.items[1].y)
    }
}

/// Everything the scene's actors work on.
pub struct Stage {
    mikan_box: MikanBox,
    statistics: Statistics,
    source: Box<dyn ItemSource>,
    grabbed: Option<GrabbedPair>,
    ended: bool,
}

impl Stage {
    fn cell(&self) -> f64 {
        f64::from(self.mikan_box.cell_size())
    }

    fn vacant(&self, column: i32, row: i32) -> Result<bool> {
        Ok(self.mikan_box.item_at(column, row)?.is_none())
    }

    fn spawn(&mut self, scheduler: &mut Scheduler<GameActor>) -> Result<()> {
        let center = (self.mikan_box.column_count() / 2) as i32;
        let top = self.mikan_box.row_count() as i32 - 1;
        if !self.vacant(center, top)? {
            self.ended = true;
            tracing::info!(
                score = self.statistics.score(),
                level = self.statistics.level(),
                "game ended"
            );
            return Ok(());
        }
        let x = self.mikan_box.left_x_of(center);
        let cell = self.cell();
        let mut pivot = self.source.next_item();
        pivot.locate(x, -cell);
        let mut partner = self.source.next_item();
        partner.locate(x, -2.0 * cell);
        self.grabbed = Some(GrabbedPair {
            items: [pivot, partner],
            rotation: 0,
        });
        scheduler.schedule(GameActor::Gravity);
        scheduler.schedule(GameActor::Spawn);
        Ok(())
    }

    fn apply_gravity(&mut self, scheduler: &mut Scheduler<GameActor>) -> Result<()> {
        let speed = self.source.speed();
        let cell = self.cell();
        let Some(pair) = &mut self.grabbed else {
            return Ok(());
        };
        for item in &mut pair.items {
            item.translate(0.0, speed);
        }
        let (left, right, bottom) = (pair.left(), pair.right(), pair.bottom());

        let bottom_row = self.mikan_box.row_at(bottom + cell - 1.0);
        let moved = bottom_row >= 0
            && self.vacant(self.mikan_box.column_at(left), bottom_row)?
            && self.vacant(self.mikan_box.column_at(right), bottom_row)?;
        if moved {
            scheduler.schedule(GameActor::Gravity);
            Ok(())
        } else {
            self.release(true, scheduler)
        }
    }

    fn handle(&mut self, input: Input, scheduler: &mut Scheduler<GameActor>) -> Result<()> {
        match input {
            Input::MoveLeft => self.shift(-1),
            Input::MoveRight => self.shift(1),
            Input::RotateClockwise => self.rotate(1),
            Input::RotateCounterClockwise => self.rotate(-1),
            Input::ReleaseControl => self.release(false, scheduler),
        }
    }

    /// Moves the pair one column, unless a wall or an item is in the way.
    fn shift(&mut self, columns: i32) -> Result<()> {
        let cell = self.cell();
        let Some(pair) = &self.grabbed else {
            return Ok(());
        };
        let edge = if columns < 0 {
            pair.left() - cell
        } else {
            pair.right() + cell
        };
        let column = self.mikan_box.column_at(edge);
        if column < 0 || column >= self.mikan_box.column_count() as i32 {
            return Ok(());
        }
        let bottom_row = self.mikan_box.row_at(pair.bottom() + cell - 1.0).max(0);
        if self.vacant(column, bottom_row)? {
            if let Some(pair) = &mut self.grabbed {
                for item in &mut pair.items {
                    item.translate(f64::from(columns) * cell, 0.0);
                }
            }
        }
        Ok(())
    }

    fn rotate(&mut self, step: i8) -> Result<()> {
        let cell = self.cell();
        let Some(pair) = &self.grabbed else {
            return Ok(());
        };
        let rotation = (pair.rotation as i8 + step).rem_euclid(4) as u8;
        let (mut x0, mut y0) = (pair.items[0].x, pair.items[0].y);
        let (dx, dy) = match rotation {
            0 => (0.0, -cell),
            1 => (cell, 0.0),
            2 => (0.0, cell),
            _ => (-cell, 0.0),
        };
        let (mut x1, mut y1) = (x0 + dx, y0 + dy);

        // kicks the pair off the floor, the walls and other items
        let mut left = self.mikan_box.column_at(x0.min(x1));
        let mut right = self.mikan_box.column_at(x0.max(x1));
        let bottom_y = y0.max(y1) + cell - 1.0;
        let mut row = self.mikan_box.row_at(bottom_y);
        if rotation == 2 {
            let kick = if row < 0 {
                Some((self.mikan_box.height() - 1.0 - bottom_y, 0))
            } else if !self.vacant(left, row)? {
                Some((self.mikan_box.top_y_of(row) - 1.0 - bottom_y, row + 1))
            } else {
                None
            };
            if let Some((lift, new_row)) = kick {
                y0 += lift;
                y1 += lift;
                row = new_row;
            }
        } else {
            if left < 0 || !self.vacant(left, row)? {
                x0 += cell;
                x1 += cell;
                left += 1;
                right += 1;
            }
            if right >= self.mikan_box.column_count() as i32 || !self.vacant(right, row)? {
                x0 -= cell;
                x1 -= cell;
                left -= 1;
                right -= 1;
            }
        }

        let fits = row >= 0
            && row < self.mikan_box.row_count() as i32
            && left >= 0
            && right < self.mikan_box.column_count() as i32
            && self.vacant(left, row)?
            && self.vacant(right, row)?;
        if fits {
            if let Some(pair) = &mut self.grabbed {
                pair.items[0].locate(x0, y0);
                pair.items[1].locate(x1, y1);
                pair.rotation = rotation;
            }
        }
        Ok(())
    }

    /// Places the pair where it is and starts a cascade. An item that cannot
    /// be placed is lost.
    fn release(&mut self, align: bool, scheduler: &mut Scheduler<GameActor>) -> Result<()> {
        let Some(pair) = self.grabbed.take() else {
            return Ok(());
        };
        for item in pair.items {
            let column = self.mikan_box.column_at(item.x);
            let row = self.mikan_box.row_at(item.y);
            if let Err(err) = self.mikan_box.place(item, column, row, align) {
                tracing::warn!(%err, "discarded a grabbed item");
            }
        }
        self.mikan_box.schedule_to_drop(scheduler);
        self.mikan_box.schedule_to_erase(scheduler);
        Ok(())
    }
}

/// Every actor that runs in the scene.
#[derive(Debug)]
pub enum GameActor {
    Field(BoxActor),
    /// Grabs a new pair, or ends the game if the box is full.
    Spawn,
    /// Moves the grabbed pair down and releases it once it lands.
    Gravity,
    Input(Input),
}

impl From<BoxActor> for GameActor {
    fn from(actor: BoxActor) -> Self {
        Self::Field(actor)
    }
}

impl Actor for GameActor {
    type Context = Stage;
    type Error = GameError;

    fn priority(&self) -> i32 {
        match self {
            Self::Field(actor) => actor.priority(),
            Self::Spawn => ActorPriority::Spawn.value(),
            Self::Gravity => ActorPriority::Control.value(),
            Self::Input(_) => ActorPriority::Input.value(),
        }
    }

    fn act(self, stage: &mut Stage, scheduler: &mut Scheduler<Self>) -> Result<()> {
        match self {
            Self::Field(actor) => {
                actor.perform(&mut stage.mikan_box, &mut stage.statistics, scheduler)
            }
            Self::Spawn => stage.spawn(scheduler),
            Self::Gravity => stage.apply_gravity(scheduler),
            Self::Input(input) => {
                if let Err(err) = stage.handle(input, scheduler) {
                    tracing::error!(?input, %err, "input failed");
                }
                Ok(())
            }
        }
    }
}

impl Renderable for GameActor {
    fn render(&self, surface: &mut dyn Surface) {
        if let Self::Field(actor) = self {
            actor.render(surface);
        }
    }
}

/// One game session.
pub struct Scene {
    scheduler: Scheduler<GameActor>,
    stage: Stage,
}

impl Scene {
    /// Starts a game in `mikan_box`, drawing items from `source`.
    pub fn new(
        mikan_box: MikanBox,
        statistics: Statistics,
        source: Box<dyn ItemSource>,
    ) -> Result<Self> {
        if mikan_box.row_margin() < MIN_ROW_MARGIN {
            return Err(GameError::InvalidDimension {
                name: "row_margin",
                value: mikan_box.row_margin() as i64,
            });
        }
        let mut scheduler = Scheduler::new();
        scheduler.schedule(GameActor::Spawn);
        Ok(Self {
            scheduler,
            stage: Stage {
                mikan_box,
                statistics,
                source,
                grabbed: None,
                ended: false,
            },
        })
    }

    /// Empties the box, zeroes the statistics and starts over.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.stage.mikan_box.clear();
        self.stage.grabbed = None;
        self.stage.ended = false;
        self.stage.statistics.reset();
        self.scheduler.schedule(GameActor::Spawn);
        tracing::info!("scene reset");
    }

    /// Advances one frame. An error leaves the board as the failing actor left it.
    pub fn tick(&mut self) -> Result<usize> {
        let executed = self.scheduler.run(&mut self.stage)?;
        tracing::trace!(executed, pending = self.scheduler.len(), "tick");
        Ok(executed)
    }

    pub fn is_ended(&self) -> bool {
        self.stage.ended
    }

    pub fn mikan_box(&self) -> &MikanBox {
        &self.stage.mikan_box
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stage.statistics
    }

    pub fn grabbed(&self) -> Option<&GrabbedPair> {
        self.stage.grabbed.as_ref()
    }

    /// Items that will be grabbed next, oldest first.
    pub fn upcoming(&self) -> Vec<&Item> {
        self.stage.source.upcoming()
    }

    fn input(&mut self, input: Input) {
        self.scheduler.schedule(GameActor::Input(input));
    }
}

impl DirectionListener for Scene {
    fn move_left(&mut self) {
        self.input(Input::MoveLeft);
    }

    fn move_right(&mut self) {
        self.input(Input::MoveRight);
    }

    fn rotate_clockwise(&mut self) {
        self.input(Input::RotateClockwise);
    }

    fn rotate_counter_clockwise(&mut self) {
        self.input(Input::RotateCounterClockwise);
    }

    fn release_control(&mut self) {
        self.input(Input::ReleaseControl);
    }
}

impl Renderable for Scene {
    fn render(&self, surface: &mut dyn Surface) {
        self.stage.mikan_box.render(surface);
        for actor in self.scheduler.iter() {
            actor.render(surface);
        }
        if let Some(pair) = &self.stage.grabbed {
            for item in &pair.items {
                item.render(surface);
            }
        }
    }
}
