//! Lattice layout and flat-index helpers for labelled voxel grids.
//!
//! Two grids are involved in every meshing run: the voxel grid holding the
//! labels, and the corner lattice one larger on every axis whose sites become
//! mesh nodes.
//!
//! # Memory Layout
//!
//! ```text
//! Voxel grid (nx * ny * nz), X fastest:
//!
//! Address:  0      1      ...  nx-1     nx     ...
//! Content: [0,0,0][1,0,0]...[nx-1,0,0][0,1,0]...
//!          └──────── X ────────────┘
//!
//! voxel_index = k * nx * ny + j * nx + i
//! node_key    = k * (nx+1) * (ny+1) + j * (nx+1) + i
//! ```
//!
//! # Face and edge keys
//!
//! Lattice edges and voxel faces are both keyed by their minimum corner and an
//! axis, so a key space three times the node count covers every site:
//!
//! ```text
//! edge_key(origin, axis) = node_key(origin) * 3 + axis   (edge along axis)
//! face_key(origin, axis) = node_key(origin) * 3 + axis   (face normal to axis)
//! ```
//!
//! # Quad corner order
//!
//! ```text
//!   v
//!   │  c3 ──── c2
//!   │  │     / │       (u, v) = cyclic successors of the face axis
//!   │  │   /   │       X -> (Y, Z), Y -> (Z, X), Z -> (X, Y)
//!   │  c0 ──── c1
//!   └──────────── u    u × v = +axis
//! ```

/// Label written on the far side of faces that touch the outside of the grid.
pub const EXTERIOR_LABEL: i32 = -1;

/// Label of voxels that belong to no grain.
pub const BACKGROUND_LABEL: i32 = 0;

/// Number of axes keyed per lattice site (edges and faces).
pub const AXES_PER_SITE: usize = 3;

/// Coordinate axis of the lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
  X = 0,
  Y = 1,
  Z = 2,
}

impl Axis {
  /// All axes in scan order.
  pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

  #[inline]
  pub const fn index(self) -> usize {
    self as usize
  }

  #[inline]
  pub const fn from_index(index: usize) -> Option<Axis> {
    match index {
      0 => Some(Axis::X),
      1 => Some(Axis::Y),
      2 => Some(Axis::Z),
      _ => None,
    }
  }

  /// In-plane axes `(u, v)` of a face normal to `self`, ordered so that
  /// `u × v` points along `+self`.
  #[inline]
  pub const fn plane_axes(self) -> (Axis, Axis) {
    match self {
      Axis::X => (Axis::Y, Axis::Z),
      Axis::Y => (Axis::Z, Axis::X),
      Axis::Z => (Axis::X, Axis::Y),
    }
  }

  /// Unit step along this axis.
  #[inline]
  pub const fn unit(self) -> [u32; 3] {
    match self {
      Axis::X => [1, 0, 0],
      Axis::Y => [0, 1, 0],
      Axis::Z => [0, 0, 1],
    }
  }
}

/// Voxel grid dimensions plus the derived corner-lattice shape.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LatticeDims {
  pub nx: usize,
  pub ny: usize,
  pub nz: usize,
}

impl LatticeDims {
  pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
    Self { nx, ny, nz }
  }

  /// Voxel count per axis.
  #[inline]
  pub const fn voxels(&self) -> [usize; 3] {
    [self.nx, self.ny, self.nz]
  }

  /// Corner-lattice site count per axis.
  #[inline]
  pub const fn corners(&self) -> [usize; 3] {
    [self.nx + 1, self.ny + 1, self.nz + 1]
  }

  /// Total voxel count, `None` on overflow.
  pub fn voxel_count(&self) -> Option<usize> {
    self.nx.checked_mul(self.ny)?.checked_mul(self.nz)
  }

  /// Total corner-lattice site count, `None` on overflow.
  pub fn node_count(&self) -> Option<usize> {
    let [cx, cy, cz] = self.corners();
    cx.checked_mul(cy)?.checked_mul(cz)
  }

  /// Size of the edge/face key spaces, `None` on overflow.
  pub fn site_key_count(&self) -> Option<usize> {
    self.node_count()?.checked_mul(AXES_PER_SITE)
  }

  /// Convert voxel coordinates to the flat label index.
  #[inline(always)]
  pub const fn voxel_index(&self, i: usize, j: usize, k: usize) -> usize {
    k * self.nx * self.ny + j * self.nx + i
  }

  /// Convert a flat label index back to voxel coordinates.
  #[inline(always)]
  pub const fn voxel_coord(&self, index: usize) -> (usize, usize, usize) {
    let plane = self.nx * self.ny;
    let k = index / plane;
    let rem = index % plane;
    (rem % self.nx, rem / self.nx, k)
  }

  /// Convert corner-lattice coordinates to the canonical node key.
  #[inline(always)]
  pub const fn node_key(&self, i: usize, j: usize, k: usize) -> usize {
    let cx = self.nx + 1;
    let cy = self.ny + 1;
    k * cx * cy + j * cx + i
  }

  /// Convert a node key back to corner-lattice coordinates.
  #[inline(always)]
  pub const fn node_coord(&self, key: usize) -> (usize, usize, usize) {
    let cx = self.nx + 1;
    let plane = cx * (self.ny + 1);
    let k = key / plane;
    let rem = key % plane;
    (rem % cx, rem / cx, k)
  }

  /// Key of the lattice edge starting at `origin` and running along `axis`.
  #[inline(always)]
  pub const fn edge_key(&self, origin: [u32; 3], axis: Axis) -> usize {
    self.node_key(origin[0] as usize, origin[1] as usize, origin[2] as usize) * AXES_PER_SITE
      + axis.index()
  }

  /// Key of the voxel face normal to `axis` whose minimum corner is `origin`.
  #[inline(always)]
  pub const fn face_key(&self, origin: [u32; 3], axis: Axis) -> usize {
    self.node_key(origin[0] as usize, origin[1] as usize, origin[2] as usize) * AXES_PER_SITE
      + axis.index()
  }

  /// Whether a corner-lattice site lies on the outer surface of the grid.
  #[inline]
  pub const fn is_boundary_corner(&self, c: [u32; 3]) -> bool {
    c[0] == 0
      || c[1] == 0
      || c[2] == 0
      || c[0] as usize == self.nx
      || c[1] as usize == self.ny
      || c[2] as usize == self.nz
  }
}

/// Offset a lattice coordinate by one step along `axis`.
#[inline(always)]
pub const fn step(c: [u32; 3], axis: Axis) -> [u32; 3] {
  let u = axis.unit();
  [c[0] + u[0], c[1] + u[1], c[2] + u[2]]
}

/// Corners `c0..c3` of the face normal to `axis` with minimum corner `origin`.
#[inline]
pub const fn face_corners(origin: [u32; 3], axis: Axis) -> [[u32; 3]; 4] {
  let (u, v) = axis.plane_axes();
  let c1 = step(origin, u);
  [origin, c1, step(c1, v), step(origin, v)]
}

/// Cube corner offsets relative to the minimum corner of a voxel.
///
/// Corner layout (binary: ZYX):
/// - 0 = (0,0,0)
/// - 1 = (1,0,0)
/// - 2 = (0,1,0)
/// - 3 = (1,1,0)
/// - 4 = (0,0,1)
/// - 5 = (1,0,1)
/// - 6 = (0,1,1)
/// - 7 = (1,1,1)
pub const CORNER_OFFSETS: [[u32; 3]; 8] = [
  [0, 0, 0],
  [1, 0, 0],
  [0, 1, 0],
  [1, 1, 0],
  [0, 0, 1],
  [1, 0, 1],
  [0, 1, 1],
  [1, 1, 1],
];

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
