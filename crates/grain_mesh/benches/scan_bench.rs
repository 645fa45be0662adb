//! Meshing benchmarks over synthetic grain structures.
//!
//! - **blocks**: cubic grains of edge `cell` voxels (many flat boundaries)
//! - **voronoi**: nearest-seed grains (irregular boundaries, triple lines)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use grain_mesh::{index_table, volume_mesh, MeshConfig, MeshGenerator, VoxelGrid};

// =============================================================================
// Synthetic grids
// =============================================================================

fn block_grid(n: usize, cell: usize) -> VoxelGrid {
  let per_axis = n.div_ceil(cell);
  let mut labels = Vec::with_capacity(n * n * n);
  for k in 0..n {
    for j in 0..n {
      for i in 0..n {
        let label = (k / cell) * per_axis * per_axis + (j / cell) * per_axis + i / cell;
        labels.push(label as i32 + 1);
      }
    }
  }
  VoxelGrid::from_labels(n, n, n, labels).unwrap()
}

/// Nearest-seed labelling with seeds from a fixed LCG.
fn voronoi_grid(n: usize, seeds: usize) -> VoxelGrid {
  let mut state = 0x2545_f491_u64;
  let mut next = || {
    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    ((state >> 33) as usize % n) as f64 + 0.5
  };
  let points: Vec<[f64; 3]> = (0..seeds).map(|_| [next(), next(), next()]).collect();

  let mut labels = Vec::with_capacity(n * n * n);
  for k in 0..n {
    for j in 0..n {
      for i in 0..n {
        let p = [i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5];
        let nearest = points
          .iter()
          .enumerate()
          .map(|(s, q)| {
            let d = (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2) + (p[2] - q[2]).powi(2);
            (s, d)
          })
          .min_by(|a, b| a.1.total_cmp(&b.1))
          .map_or(0, |(s, _)| s);
        labels.push(nearest as i32 + 1);
      }
    }
  }
  VoxelGrid::from_labels(n, n, n, labels).unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_scan(c: &mut Criterion) {
  let mut group = c.benchmark_group("scan");
  let config = MeshConfig::default();

  for n in [16, 32, 64] {
    let grid = voronoi_grid(n, 24);
    group.bench_with_input(BenchmarkId::new("voronoi", format!("{n}³")), &grid, |b, grid| {
      b.iter(|| index_table::scan(black_box(grid), &config))
    });
  }

  group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
  let mut group = c.benchmark_group("pipeline");
  let generator = MeshGenerator::new(MeshConfig::default().with_exterior_faces(true));

  let blocks = block_grid(32, 8);
  group.bench_function("blocks (32³, 8³ grains)", |b| {
    b.iter(|| generator.run(black_box(&blocks)))
  });

  let voronoi = voronoi_grid(32, 24);
  group.bench_function("voronoi (32³, 24 grains)", |b| {
    b.iter(|| generator.run(black_box(&voronoi)))
  });

  group.finish();
}

fn bench_volume_mesh(c: &mut Criterion) {
  let grid = voronoi_grid(32, 24);
  let config = MeshConfig::default();

  c.bench_function("volume_mesh::generate (32³)", |b| {
    b.iter(|| volume_mesh::generate(black_box(&grid), &config))
  });
}

criterion_group!(benches, bench_scan, bench_full_pipeline, bench_volume_mesh);
criterion_main!(benches);
