//! Winding consistency across shared edges.
//!
//! For every grain label, triangles of that label are walked breadth-first
//! across edges they share with exactly one other triangle of the same label.
//! Each newly reached triangle is compared with the one it was reached from
//! and flipped when both traverse the shared edge in the same direction.

mod patch;

pub use patch::{Patch, WindingCheck};

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use smallvec::SmallVec;

use crate::constants::EXTERIOR_LABEL;
use crate::error::MeshResult;
use crate::mesh::SurfaceMesh;
use crate::types::WindingConfig;

/// Counts from one resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindingReport {
  /// Adjacent pairs compared.
  pub checked_pairs: usize,
  /// Triangles flipped.
  pub flipped: usize,
  /// Disagreements left in place because flipping was disabled.
  pub mismatches: usize,
  /// Disagreements with triangles fixed by an earlier label.
  pub conflicts: usize,
  /// Edges carrying more than two triangles of one label.
  pub non_manifold_edges: usize,
  /// Walks started from a triangle no earlier label had reached.
  pub seeds: usize,
}

type EdgeKey = (u32, u32);

#[inline]
fn edge_key(a: u32, b: u32) -> EdgeKey {
  if a < b { (a, b) } else { (b, a) }
}

/// Make triangle windings agree across every manifold shared edge.
///
/// Flipped triangles have their attributes recomputed. Non-manifold edges and
/// conflicts are added to the mesh warnings.
#[tracing::instrument(skip_all, name = "winding::resolve")]
pub fn resolve_windings(mesh: &mut SurfaceMesh, config: &WindingConfig) -> MeshResult<WindingReport> {
  let mut patches: Vec<Patch> = mesh.triangles.iter().map(Patch::from_triangle).collect();
  let live: Vec<bool> = mesh.triangles.iter().map(|t| !t.killed).collect();

  let mut edges: HashMap<EdgeKey, SmallVec<[u32; 4]>> = HashMap::new();
  let mut by_label: BTreeMap<i32, Vec<u32>> = BTreeMap::new();
  for (idx, p) in patches.iter().enumerate().filter(|&(i, _)| live[i]) {
    let [a, b, c] = p.node_id;
    for key in [edge_key(a, b), edge_key(b, c), edge_key(c, a)] {
      edges.entry(key).or_default().push(idx as u32);
    }
    for label in p.n_spin {
      let list = by_label.entry(label).or_default();
      if list.last() != Some(&(idx as u32)) {
        list.push(idx as u32);
      }
    }
  }

  let mut report = WindingReport::default();
  let mut visited = vec![false; patches.len()];
  let mut stamp = vec![usize::MAX; patches.len()];
  let mut non_manifold: HashSet<(EdgeKey, i32)> = HashSet::new();
  let mut queue = VecDeque::new();

  for (pass, label) in label_order(&by_label, &patches).into_iter().enumerate() {
    let tris = &by_label[&label];

    // Seeds already oriented by an earlier label first, so their orientation
    // carries over; then fresh seeds for components not reached yet.
    let mut cursor = 0;
    loop {
      let seed = tris
        .iter()
        .copied()
        .find(|&t| stamp[t as usize] != pass && visited[t as usize])
        .or_else(|| pick_fresh_seed(mesh, &patches, tris, &stamp, pass, config, &mut cursor));
      let Some(seed) = seed else {
        break;
      };

      if !visited[seed as usize] {
        report.seeds += 1;
        if config.orient_seeds && config.do_flip && seed_faces_inward(mesh, &patches[seed as usize], label) {
          patches[seed as usize].flip_winding();
          report.flipped += 1;
        }
      }
      visited[seed as usize] = true;
      stamp[seed as usize] = pass;
      queue.push_back(seed);

      while let Some(t) = queue.pop_front() {
        let current = patches[t as usize];
        let [a, b, c] = current.node_id;
        for key in [edge_key(a, b), edge_key(b, c), edge_key(c, a)] {
          let Some(sharing) = edges.get(&key) else {
            continue;
          };
          let mut same_label = sharing
            .iter()
            .copied()
            .filter(|&o| patches[o as usize].has_spin(label));
          let first = same_label.next();
          let second = same_label.next();
          if same_label.next().is_some() {
            non_manifold.insert((key, label));
            continue;
          }
          let Some(other) = (match (first, second) {
            (Some(x), Some(y)) if x == t => Some(y),
            (Some(x), Some(_)) => Some(x),
            _ => None,
          }) else {
            continue;
          };
          if stamp[other as usize] == pass {
            continue;
          }

          report.checked_pairs += 1;
          if visited[other as usize] {
            let mut probe = patches[other as usize];
            if current.verify_winding(&mut probe, label, false)? != WindingCheck::Consistent {
              report.conflicts += 1;
            }
          } else {
            match current.verify_winding(&mut patches[other as usize], label, config.do_flip)? {
              WindingCheck::Consistent => {}
              WindingCheck::Flipped => report.flipped += 1,
              WindingCheck::Mismatch => report.mismatches += 1,
            }
            visited[other as usize] = true;
          }
          stamp[other as usize] = pass;
          queue.push_back(other);
        }
      }
    }
  }

  // =========================================================================
  // Write back flipped windings
  // =========================================================================
  let mut changed = 0;
  for (t, p) in mesh.triangles.iter_mut().zip(&patches) {
    if t.nodes != p.node_id {
      t.nodes = p.node_id;
      changed += 1;
    }
  }
  if changed > 0 {
    mesh.compute_triangle_attributes();
  }

  report.non_manifold_edges = non_manifold.len();
  mesh.warnings.non_manifold_edges += report.non_manifold_edges;
  mesh.warnings.winding_conflicts += report.conflicts;
  tracing::debug!(
    flipped = report.flipped,
    checked = report.checked_pairs,
    seeds = report.seeds,
    "winding resolution complete"
  );
  Ok(report)
}

/// Labels starting from the smallest, then in the order neighbours are met.
fn label_order(by_label: &BTreeMap<i32, Vec<u32>>, patches: &[Patch]) -> Vec<i32> {
  let mut order = Vec::with_capacity(by_label.len());
  let mut queued = HashSet::new();
  let mut queue = VecDeque::new();
  for &start in by_label.keys() {
    if !queued.insert(start) {
      continue;
    }
    queue.push_back(start);
    while let Some(label) = queue.pop_front() {
      order.push(label);
      for &t in &by_label[&label] {
        let spins = patches[t as usize].n_spin;
        let other = if spins[0] == label { spins[1] } else { spins[0] };
        if queued.insert(other) {
          queue.push_back(other);
        }
      }
    }
  }
  order
}

/// Next unreached triangle of `label`: the first in index order, or the one
/// with the largest centroid x when seeds are oriented.
fn pick_fresh_seed(
  mesh: &SurfaceMesh,
  patches: &[Patch],
  tris: &[u32],
  stamp: &[usize],
  pass: usize,
  config: &WindingConfig,
  cursor: &mut usize,
) -> Option<u32> {
  if config.orient_seeds {
    return tris
      .iter()
      .copied()
      .filter(|&t| stamp[t as usize] != pass)
      .max_by(|&a, &b| {
        centroid_x(mesh, &patches[a as usize]).total_cmp(&centroid_x(mesh, &patches[b as usize]))
      });
  }
  while let Some(&t) = tris.get(*cursor) {
    *cursor += 1;
    if stamp[t as usize] != pass {
      return Some(t);
    }
  }
  None
}

fn centroid_x(mesh: &SurfaceMesh, patch: &Patch) -> f64 {
  patch
    .node_id
    .iter()
    .map(|&n| mesh.nodes[n as usize].position.x)
    .sum::<f64>()
    / 3.0
}

/// Whether a largest-x seed faces the wrong way for `label`.
///
/// Grains face `+x` there; the exterior wraps the grid and faces `-x`.
fn seed_faces_inward(mesh: &SurfaceMesh, patch: &Patch, label: i32) -> bool {
  let Some(ids) = patch.get_winding_indices(label) else {
    return false;
  };
  let [p0, p1, p2] = ids.map(|n| mesh.nodes[n as usize].position);
  let nx = (p1 - p0).cross(p2 - p0).x;
  if label == EXTERIOR_LABEL { nx > 0.0 } else { nx < 0.0 }
}

/// Count manifold edges whose two same-label triangles traverse the edge in
/// the same direction. Zero after a successful resolution.
pub fn count_inconsistent_edges(mesh: &SurfaceMesh) -> usize {
  let mut edges: HashMap<EdgeKey, SmallVec<[u32; 4]>> = HashMap::new();
  for (idx, t) in mesh.triangles.iter().enumerate().filter(|(_, t)| !t.killed) {
    let [a, b, c] = t.nodes;
    for key in [edge_key(a, b), edge_key(b, c), edge_key(c, a)] {
      edges.entry(key).or_default().push(idx as u32);
    }
  }

  let mut inconsistent = 0;
  for sharing in edges.values() {
    let mut labels: SmallVec<[i32; 8]> = sharing
      .iter()
      .flat_map(|&t| mesh.triangles[t as usize].labels)
      .collect();
    labels.sort_unstable();
    labels.dedup();
    for label in labels {
      let same: SmallVec<[u32; 4]> = sharing
        .iter()
        .copied()
        .filter(|&t| mesh.triangles[t as usize].has_label(label))
        .collect();
      if same.len() != 2 {
        continue;
      }
      let first = Patch::from_triangle(&mesh.triangles[same[0] as usize]);
      let mut second = Patch::from_triangle(&mesh.triangles[same[1] as usize]);
      if !matches!(first.verify_winding(&mut second, label, false), Ok(WindingCheck::Consistent)) {
        inconsistent += 1;
      }
    }
  }
  inconsistent
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
