use std::collections::HashMap;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::TileRect;

/// Direction a template faces, an exit leads, or generation proceeds.
///
/// `Both` is only meaningful as a template facing or as the direction of the
/// very first generation call (the symmetric start room). Exits and every
/// generated neighbour resolve to one of the four cardinal directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    Both,
}

impl Direction {
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    #[must_use]
    pub const fn is_cardinal(self) -> bool {
        !matches!(self, Self::Both)
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Both => Self::Both,
        }
    }

    /// Swaps `Left` and `Right` when `flip_x` is set. Vertical directions are
    /// unaffected by horizontal mirroring.
    #[must_use]
    pub const fn mirrored(self, flip_x: bool) -> Self {
        if flip_x && self.is_horizontal() {
            self.opposite()
        } else {
            self
        }
    }

    /// Unit step on the tile and chunk lattices. Up is +Y.
    #[must_use]
    pub const fn step(self) -> IVec2 {
        match self {
            Self::Left => IVec2::NEG_X,
            Self::Right => IVec2::X,
            Self::Up => IVec2::Y,
            Self::Down => IVec2::NEG_Y,
            Self::Both => IVec2::ZERO,
        }
    }

    /// Whether a template facing `facing` can be placed for a `requested`
    /// generation direction, and if so whether it must be mirrored.
    ///
    /// Returns `Some(false)` for an exact match (or a horizontal template in a
    /// `Both` request), `Some(true)` for the horizontal opposite, `None` when
    /// the template cannot be used.
    #[must_use]
    pub const fn fit(requested: Self, facing: Self) -> Option<bool> {
        match (requested, facing) {
            (Self::Left, Self::Left)
            | (Self::Right, Self::Right)
            | (Self::Up, Self::Up)
            | (Self::Down, Self::Down)
            | (Self::Both, Self::Both | Self::Left | Self::Right) => Some(false),
            (Self::Left, Self::Right) | (Self::Right, Self::Left) => Some(true),
            _ => None,
        }
    }
}

/// What a world item can do. Declared per [`ItemKind`] variant.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub collectible: bool,
    pub breakable: bool,
    pub damaging: bool,
    pub respawn: bool,
}

/// Kinds of items a template can place in its item slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    HealthPack,
    Weapon,
    Crate,
    Spikes,
    /// Not spawned as an object; marks a respawn location for the chunk.
    Respawn,
}

impl ItemKind {
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Coin | Self::HealthPack | Self::Weapon => Capabilities {
                collectible: true,
                breakable: false,
                damaging: false,
                respawn: false,
            },
            Self::Crate => Capabilities {
                collectible: false,
                breakable: true,
                damaging: false,
                respawn: false,
            },
            Self::Spikes => Capabilities {
                collectible: false,
                breakable: false,
                damaging: true,
                respawn: false,
            },
            Self::Respawn => Capabilities {
                collectible: false,
                breakable: false,
                damaging: false,
                respawn: true,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSlot {
    pub kind: ItemKind,
    pub position: IVec2,
}

/// One painted tile: template-local position plus an opaque tile token the
/// rendering backend understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntry {
    pub position: IVec2,
    pub tile: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub tiles: Vec<TileEntry>,
}

/// An exit in the template's local frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateExit {
    pub direction: Direction,
    /// Last tile inside the template before the neighbour begins.
    pub position: IVec2,
    /// Camera path waypoints in local tiles, in any authoring order.
    pub waypoints: Vec<IVec2>,
}

/// An authored, immutable terrain segment ("sample terrain").
///
/// All tile positions are in the template's local frame; generation maps
/// them relative to `entry`, so `entry` lands on the tile where the previous
/// chunk's exit led.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleTerrain {
    pub facing: Direction,
    pub layers: Vec<TileLayer>,
    pub ground_bounds: TileRect,
    pub entry: IVec2,
    pub exits: Vec<TemplateExit>,
    pub item_slots: Vec<ItemSlot>,
    /// Probability that each non-respawn item slot is populated.
    pub item_drop_chance: f32,
    /// Position in the owning [`TemplateLibrary`]; assigned on load.
    #[serde(skip)]
    pub index: usize,
}

impl SampleTerrain {
    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidTemplate {
            index: self.index,
            reason,
        };

        if !self.ground_bounds.is_valid() {
            return Err(invalid(format!(
                "ground bounds {:?} are inverted",
                self.ground_bounds
            )));
        }
        if !self.ground_bounds.contains(self.entry) {
            return Err(invalid(format!(
                "entry {} lies outside ground bounds",
                self.entry
            )));
        }
        if !(0.0..=1.0).contains(&self.item_drop_chance) {
            return Err(invalid(format!(
                "item drop chance {} is not a probability",
                self.item_drop_chance
            )));
        }
        for (i, exit) in self.exits.iter().enumerate() {
            if !exit.direction.is_cardinal() {
                return Err(invalid(format!("exit {i} has no cardinal direction")));
            }
            if exit.waypoints.len() < 2 {
                log::error!(
                    "template {} exit {i} has {} camera waypoints",
                    self.index,
                    exit.waypoints.len()
                );
                return Err(Error::InsufficientPathPoints {
                    count: exit.waypoints.len(),
                });
            }
        }
        Ok(())
    }
}

/// A template chosen for a generation direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub index: usize,
    pub flip_x: bool,
}

/// All loaded templates, indexed by facing direction.
#[derive(Debug)]
pub struct TemplateLibrary {
    templates: Vec<SampleTerrain>,
    by_facing: HashMap<Direction, Vec<usize>>,
}

impl TemplateLibrary {
    /// Validates and indexes `templates`. Each template's `index` is set to its
    /// position in the list.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure: [`Error::InsufficientPathPoints`]
    /// for an exit with fewer than two waypoints, [`Error::InvalidTemplate`]
    /// for any other malformed template.
    pub fn new(mut templates: Vec<SampleTerrain>) -> Result<Self> {
        let mut by_facing: HashMap<Direction, Vec<usize>> = HashMap::new();
        for (index, template) in templates.iter_mut().enumerate() {
            template.index = index;
            template.validate()?;
            by_facing.entry(template.facing).or_default().push(index);
        }
        log::debug!("loaded {} terrain templates", templates.len());
        Ok(Self {
            templates,
            by_facing,
        })
    }

    /// Decodes a postcard-encoded template list.
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if the bytes are not a template list, or any error
    /// from [`TemplateLibrary::new`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let templates: Vec<SampleTerrain> = postcard::from_bytes(bytes)?;
        Self::new(templates)
    }

    /// Encodes the library for [`TemplateLibrary::from_bytes`].
    ///
    /// # Errors
    ///
    /// [`Error::Decode`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(&self.templates)?)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SampleTerrain> {
        self.templates.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleTerrain> {
        self.templates.iter()
    }

    /// Indices of templates authored with exactly this facing.
    #[must_use]
    pub fn facing(&self, direction: Direction) -> &[usize] {
        self.by_facing
            .get(&direction)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Templates usable for `requested`, in library order.
    #[must_use]
    pub fn candidates(&self, requested: Direction) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
            Direction::Both,
        ]
        .into_iter()
        .filter_map(|facing| Direction::fit(requested, facing).map(|flip| (facing, flip)))
        .flat_map(|(facing, flip_x)| {
            self.facing(facing)
                .iter()
                .map(move |&index| Candidate { index, flip_x })
        })
        .collect();
        candidates.sort_unstable_by_key(|c| c.index);
        candidates
    }
}
