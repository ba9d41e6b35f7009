//! Axis aligned bounding boxes.

use glam::{DVec2, DVec3};

/// 2D axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb2 {
    /// Minimum corner.
    pub min: DVec2,
    /// Maximum corner.
    pub max: DVec2,
}

impl Aabb2 {
    /// An empty box that any point expands.
    pub const EMPTY: Self = Self {
        min: DVec2::splat(f64::INFINITY),
        max: DVec2::splat(f64::NEG_INFINITY),
    };

    /// Smallest box holding all `points`; [`Aabb2::EMPTY`] for none.
    pub fn from_points<I: IntoIterator<Item = DVec2>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.expand(p);
            b
        })
    }

    /// Grows the box to include `p`.
    #[inline]
    pub fn expand(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// True when no point has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    /// Whether `p` lies within the box grown by `tol` on every side.
    #[inline]
    pub fn contains(&self, p: DVec2, tol: f64) -> bool {
        p.x >= self.min.x - tol
            && p.x <= self.max.x + tol
            && p.y >= self.min.y - tol
            && p.y <= self.max.y + tol
    }

    /// Edge lengths of the box.
    #[inline]
    pub fn extent(&self) -> DVec2 {
        if self.is_empty() {
            DVec2::ZERO
        } else {
            self.max - self.min
        }
    }
}

impl From<Aabb2> for Aabb3 {
    fn from(b: Aabb2) -> Self {
        if b.is_empty() {
            return Aabb3::EMPTY;
        }
        Aabb3 {
            min: b.min.extend(0.0),
            max: b.max.extend(0.0),
        }
    }
}

/// 3D axis aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb3 {
    /// An empty box that any point expands.
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Smallest box holding all `points`; [`Aabb3::EMPTY`] for none.
    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.expand(p);
            b
        })
    }

    /// Grows the box to include `p`.
    #[inline]
    pub fn expand(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// True when no point has been added.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Whether `p` lies within the box grown by `tol` on every side.
    #[inline]
    pub fn contains(&self, p: DVec3, tol: f64) -> bool {
        p.x >= self.min.x - tol
            && p.x <= self.max.x + tol
            && p.y >= self.min.y - tol
            && p.y <= self.max.y + tol
            && p.z >= self.min.z - tol
            && p.z <= self.max.z + tol
    }

    /// Edge lengths of the box.
    #[inline]
    pub fn extent(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }
}
