//! Boundary-face scan: labelled voxel grid to sparse node/edge/triangle tables.
//!
//! Every pair of face-adjacent voxels with different labels contributes one
//! quad face. Its four corners become nodes, its four lattice edges become
//! edges, and the quad is split along the `c0`-`c2` diagonal into two
//! triangles. Each site is numbered the first time the scan reaches it.
//!
//! ```text
//! scan order: for z { for y { for x { -x -y -z (exterior), +x +y +z, +x +y +z (exterior) } } }
//!
//!  c3 ───── c2        triangle 2f   = (c0, c1, c2)
//!  │      ╱ │         triangle 2f+1 = (c0, c2, c3)
//!  │   ╱    │         labels        = [low, high]
//!  c0 ───── c1        low is the voxel on the -axis side
//! ```

pub mod sentinel;

pub use sentinel::{Assigned, SentinelIndex, UNASSIGNED};

use crate::constants::{face_corners, step, Axis, LatticeDims, EXTERIOR_LABEL};
use crate::error::{MeshError, MeshResult};
use crate::mesh::{Edge, Node, SurfaceMesh, Triangle};
use crate::types::{MeshConfig, VoxelGrid};

/// Lookup tables for the three entity kinds, one slot per possible site.
#[derive(Clone, Debug)]
pub struct IndexTables {
  pub nodes: SentinelIndex,
  pub edges: SentinelIndex,
  pub faces: SentinelIndex,
}

impl IndexTables {
  /// Allocate tables for the corner lattice of `dims`.
  pub fn for_dims(dims: LatticeDims) -> MeshResult<Self> {
    let nodes = dims.node_count().ok_or(MeshError::Allocation {
      entity: "node",
      count: usize::MAX,
    })?;
    let sites = dims.site_key_count().ok_or(MeshError::Allocation {
      entity: "edge",
      count: usize::MAX,
    })?;
    Ok(Self {
      nodes: SentinelIndex::try_new(nodes, "node")?,
      edges: SentinelIndex::try_new(sites, "edge")?,
      faces: SentinelIndex::try_new(sites, "face")?,
    })
  }
}

/// Scan `grid` and build the surface entity tables.
///
/// Triangle attributes are left zeroed; see
/// [`SurfaceMesh::compute_triangle_attributes`].
#[tracing::instrument(skip_all, name = "index_table::scan")]
pub fn scan(grid: &VoxelGrid, config: &MeshConfig) -> MeshResult<SurfaceMesh> {
  let (mesh, _) = scan_with_tables(grid, config)?;
  Ok(mesh)
}

/// [`scan`], also returning the lookup tables used for numbering.
pub fn scan_with_tables(
  grid: &VoxelGrid,
  config: &MeshConfig,
) -> MeshResult<(SurfaceMesh, IndexTables)> {
  let dims = grid.dims();
  let mut builder = SurfaceBuilder {
    grid,
    tables: IndexTables::for_dims(dims)?,
    mesh: SurfaceMesh::new(dims),
  };
  let [nx, ny, nz] = dims.voxels();
  let exterior = config.exterior_faces;

  for k in 0..nz {
    for j in 0..ny {
      for i in 0..nx {
        let label = grid.label(i, j, k);
        let origin = [i as u32, j as u32, k as u32];
        let coord = [i, j, k];
        let last = [nx - 1, ny - 1, nz - 1];

        if exterior {
          for axis in Axis::ALL {
            if coord[axis.index()] == 0 {
              builder.emit_face(origin, axis, EXTERIOR_LABEL, label);
            }
          }
        }

        for axis in Axis::ALL {
          if coord[axis.index()] < last[axis.index()] {
            let u = axis.unit();
            let neighbor = grid.label(i + u[0] as usize, j + u[1] as usize, k + u[2] as usize);
            if neighbor != label {
              builder.emit_face(step(origin, axis), axis, label, neighbor);
            }
          }
        }

        if exterior {
          for axis in Axis::ALL {
            if coord[axis.index()] == last[axis.index()] {
              builder.emit_face(step(origin, axis), axis, label, EXTERIOR_LABEL);
            }
          }
        }
      }
    }
  }

  let SurfaceBuilder { tables, mesh, .. } = builder;
  tracing::debug!(
    nodes = mesh.nodes.len(),
    edges = mesh.edges.len(),
    triangles = mesh.triangles.len(),
    "boundary scan complete"
  );
  Ok((mesh, tables))
}

/// Scan state: the grid, the lookup tables and the arenas they index.
struct SurfaceBuilder<'a> {
  grid: &'a VoxelGrid,
  tables: IndexTables,
  mesh: SurfaceMesh,
}

impl SurfaceBuilder<'_> {
  /// Register the face normal to `axis` with minimum corner `origin`.
  fn emit_face(&mut self, origin: [u32; 3], axis: Axis, low: i32, high: i32) {
    let dims = self.mesh.dims;
    let face = self.tables.faces.assign(dims.face_key(origin, axis));
    if !face.fresh {
      return;
    }

    let corners = face_corners(origin, axis);
    let ids = corners.map(|c| self.node(c, low, high));

    let (u, v) = axis.plane_axes();
    self.edge(corners[0], u, [ids[0], ids[1]]);
    self.edge(corners[1], v, [ids[1], ids[2]]);
    self.edge(corners[3], u, [ids[3], ids[2]]);
    self.edge(corners[0], v, [ids[0], ids[3]]);

    debug_assert_eq!(self.mesh.triangles.len(), face.index as usize * 2);
    let labels = [low, high];
    self
      .mesh
      .triangles
      .push(Triangle::new([ids[0], ids[1], ids[2]], labels, face.index));
    self
      .mesh
      .triangles
      .push(Triangle::new([ids[0], ids[2], ids[3]], labels, face.index));
  }

  fn node(&mut self, c: [u32; 3], low: i32, high: i32) -> u32 {
    let dims = self.mesh.dims;
    let key = dims.node_key(c[0] as usize, c[1] as usize, c[2] as usize);
    let slot = self.tables.nodes.assign(key);
    if slot.fresh {
      let position = self.grid.corner_position(c);
      self
        .mesh
        .nodes
        .push(Node::new(c, position, dims.is_boundary_corner(c)));
    }
    let node = &mut self.mesh.nodes[slot.index as usize];
    node.add_owner(low);
    node.add_owner(high);
    slot.index
  }

  fn edge(&mut self, origin: [u32; 3], axis: Axis, nodes: [u32; 2]) {
    let slot = self.tables.edges.assign(self.mesh.dims.edge_key(origin, axis));
    if slot.fresh {
      self.mesh.edges.push(Edge::new(nodes, axis));
    }
  }
}
