//! Items dropped into the box: mikans and preservatives.

/// Kind of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Mikan,
    Preservative,
}

impl ItemKind {
    pub const fn max_damage(self) -> u8 {
        match self {
            Self::Mikan => 3,
            Self::Preservative => 4,
        }
    }
}

/// An item and its screen location (top-left corner, pixels).
///
/// Not `Clone`: an item lives in exactly one place at a time (a cell, the
/// grabbed pair or an actor) and moves between them by value.
#[derive(Debug, PartialEq)]
pub struct Item {
    kind: ItemKind,
    pub x: f64,
    pub y: f64,
    damage: u8,
}

impl Item {
    /// Damage is truncated to `[0, kind.max_damage()]`.
    pub fn new(kind: ItemKind, damage: u8) -> Self {
        Self {
            kind,
            x: 0.0,
            y: 0.0,
            damage: damage.min(kind.max_damage()),
        }
    }

    pub fn mikan(damage: u8) -> Self {
        Self::new(ItemKind::Mikan, damage)
    }

    /// Fresh, undamaged preservative.
    pub fn preservative() -> Self {
        Self::new(ItemKind::Preservative, 0)
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn damage(&self) -> u8 {
        self.damage
    }

    pub fn set_damage(&mut self, damage: u8) {
        self.damage = damage.min(self.max_damage());
    }

    pub fn max_damage(&self) -> u8 {
        self.kind.max_damage()
    }

    pub fn is_max_damaged(&self) -> bool {
        self.damage == self.max_damage()
    }

    /// True for a mikan that can join a chain.
    pub fn is_max_damaged_mikan(&self) -> bool {
        self.kind == ItemKind::Mikan && self.is_max_damaged()
    }

    /// One more point of damage, saturating at the max.
    pub fn spoil(&mut self) {
        self.set_damage(self.damage.saturating_add(1));
    }

    pub fn locate(&mut self, x: f64, y: f64) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.x += dx;
        self.y += dy;
        self
    }
}
