use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::PathGeometry;
use crate::registry::ChunkRegistry;

/// Easing curve for glides along a camera path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EasingKind {
    #[default]
    Linear,
    QuadInOut,
    CubicInOut,
    SineInOut,
    ExpoInOut,
}

impl EasingKind {
    /// Map to a `simple_easing` function pointer.
    #[must_use]
    pub fn to_fn(self) -> fn(f32) -> f32 {
        match self {
            Self::Linear => simple_easing::linear,
            Self::QuadInOut => simple_easing::quad_in_out,
            Self::CubicInOut => simple_easing::cubic_in_out,
            Self::SineInOut => simple_easing::sine_in_out,
            Self::ExpoInOut => simple_easing::expo_in_out,
        }
    }
}

/// Identifies a camera path by chunk and exit rather than by reference, so a
/// follower never outlives the chunk it follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathHandle {
    pub grid: IVec2,
    pub exit: usize,
}

impl PathHandle {
    /// Looks the path up again.
    ///
    /// # Errors
    ///
    /// [`Error::ChunkNotFound`] if the chunk was removed;
    /// [`Error::NoPathsInChunk`] if the exit has no path.
    pub fn resolve<'a>(&self, registry: &'a ChunkRegistry) -> Result<&'a PathGeometry> {
        registry
            .get(self.grid)?
            .path_for_exit(self.exit)
            .ok_or(Error::NoPathsInChunk(self.grid))
    }
}

/// Eased move from one arc-length distance to another.
struct Glide {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    easing: fn(f32) -> f32,
}

impl Glide {
    fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn distance(&self) -> f32 {
        let t = if self.duration > 0.0 {
            (self.easing)(self.elapsed / self.duration)
        } else {
            1.0
        };
        self.from + (self.to - self.from) * t
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowStatus {
    /// Still moving along the path.
    Following,
    /// Reached the end of the path (the exit).
    Arrived,
    /// The chunk or path is gone; the follower must be re-attached.
    Detached,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FollowUpdate {
    pub status: FollowStatus,
    /// Tracked position, absent once detached.
    pub position: Option<Vec2>,
}

/// Slides a tracked position along a chunk's camera path, one tick at a
/// time. The path is re-resolved through the registry on every tick.
pub struct PathFollower {
    handle: PathHandle,
    distance: f32,
    speed: f32,
    glide: Option<Glide>,
}

impl PathFollower {
    /// Attaches to the path of chunk `grid` nearest `position`, starting at
    /// the point on it closest to `position`.
    ///
    /// # Errors
    ///
    /// [`Error::ChunkNotFound`] or [`Error::NoPathsInChunk`].
    pub fn attach(
        registry: &ChunkRegistry,
        grid: IVec2,
        position: Vec2,
        speed: f32,
    ) -> Result<Self> {
        let path = registry.get(grid)?.closest_path(position)?;
        Ok(Self {
            handle: PathHandle {
                grid,
                exit: path.exit,
            },
            distance: path.geometry.distance_along(position),
            speed,
            glide: None,
        })
    }

    #[must_use]
    pub fn handle(&self) -> PathHandle {
        self.handle
    }

    /// Arc length travelled along the current path.
    #[must_use]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Replaces constant-speed travel with an eased glide to `target`
    /// (arc length) over `duration` seconds.
    pub fn glide_to(&mut self, target: f32, duration: f32, easing: EasingKind) {
        self.glide = Some(Glide {
            from: self.distance,
            to: target,
            duration,
            elapsed: 0.0,
            easing: easing.to_fn(),
        });
    }

    /// Advances by `dt` seconds.
    pub fn advance(&mut self, dt: f32, registry: &ChunkRegistry) -> FollowUpdate {
        let Ok(path) = self.handle.resolve(registry) else {
            log::debug!("follower lost chunk {}", self.handle.grid);
            return FollowUpdate {
                status: FollowStatus::Detached,
                position: None,
            };
        };

        if let Some(glide) = &mut self.glide {
            glide.advance(dt);
            self.distance = glide.distance();
            if glide.is_complete() {
                self.glide = None;
            }
        } else {
            self.distance += self.speed * dt;
        }
        self.distance = self.distance.clamp(0.0, path.length());

        let status = if self.glide.is_none() && self.distance >= path.length() {
            FollowStatus::Arrived
        } else {
            FollowStatus::Following
        };
        FollowUpdate {
            status,
            position: Some(path.point_at_distance(self.distance)),
        }
    }
}
