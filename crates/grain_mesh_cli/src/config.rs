//! Optional TOML configuration for a meshing run.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! scalar = "GrainID"
//! exterior_faces = false
//! min_grain_size = 8
//!
//! [outputs]
//! voxels = false
//! binary = true
//! ```

use anyhow::{Context, Result};
use grain_mesh::{DanglingPolicy, MeshConfig, WindingConfig};
use serde::Deserialize;
use std::path::Path;

/// Root configuration for `grain_mesh mesh`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Name of the VTK scalar block holding grain labels.
	pub scalar: String,
	/// Output directory for all files.
	pub output_dir: String,
	/// Voxel spacing override [dx, dy, dz].
	pub resolution: Option<[f64; 3]>,
	/// Close the surface against the outside of the sample.
	pub exterior_faces: bool,
	/// Grains with fewer voxels are merged into background.
	pub min_grain_size: usize,
	/// Triangles at or below this area are dropped.
	pub min_triangle_area: f64,
	/// Flip triangles to agree with their neighbours.
	pub flip_windings: bool,
	/// Point each label's seed triangle away from the grain.
	pub orient_seeds: bool,
	/// Abort instead of dropping triangles on removed nodes.
	pub strict_compaction: bool,
	/// Treat label 0 as a grain.
	pub include_background: bool,
	/// Build the tetrahedral mesh too.
	pub volume_mesh: bool,
	pub outputs: OutputConfig,
}

/// Which files to write.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
	pub nodes: bool,
	pub triangles: bool,
	pub surface: bool,
	pub grains: bool,
	pub voxels: bool,
	/// Tetrahedral mesh, only with `volume_mesh`.
	pub mesh: bool,
	/// Dihedral angle histogram, only with `volume_mesh`.
	pub dihedral_angles: bool,
	/// Write the surface with one shared triangle per face.
	pub conformal: bool,
	/// BINARY instead of ASCII VTK where supported.
	pub binary: bool,
}

impl Default for Config {
	fn default() -> Self {
		let mesh = MeshConfig::default();
		Self {
			scalar: "GrainID".to_string(),
			output_dir: ".".to_string(),
			resolution: None,
			exterior_faces: mesh.exterior_faces,
			min_grain_size: mesh.min_grain_size,
			min_triangle_area: mesh.min_triangle_area,
			flip_windings: mesh.winding.do_flip,
			orient_seeds: mesh.winding.orient_seeds,
			strict_compaction: mesh.dangling_policy == DanglingPolicy::Fail,
			include_background: mesh.include_background,
			volume_mesh: mesh.volume_mesh,
			outputs: OutputConfig::default(),
		}
	}
}

impl Default for OutputConfig {
	fn default() -> Self {
		Self {
			nodes: true,
			triangles: true,
			surface: true,
			grains: true,
			voxels: true,
			mesh: true,
			dihedral_angles: true,
			conformal: true,
			binary: false,
		}
	}
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content)
	}

	pub fn parse(content: &str) -> Result<Self> {
		let config: Config =
			toml::from_str(content).with_context(|| "Failed to parse config TOML")?;

		if !(config.min_triangle_area >= 0.0) {
			anyhow::bail!(
				"min_triangle_area must be non-negative, got {}",
				config.min_triangle_area
			);
		}
		if let Some(res) = config.resolution {
			if res.iter().any(|&r| !(r > 0.0) || !r.is_finite()) {
				anyhow::bail!("resolution must be positive, got {:?}", res);
			}
		}

		Ok(config)
	}

	/// Core meshing settings.
	pub fn mesh_config(&self) -> MeshConfig {
		let policy = if self.strict_compaction {
			DanglingPolicy::Fail
		} else {
			DanglingPolicy::CascadeKill
		};
		MeshConfig::default()
			.with_exterior_faces(self.exterior_faces)
			.with_min_grain_size(self.min_grain_size)
			.with_min_triangle_area(self.min_triangle_area)
			.with_winding(WindingConfig {
				do_flip: self.flip_windings,
				orient_seeds: self.orient_seeds,
			})
			.with_dangling_policy(policy)
			.with_include_background(self.include_background)
			.with_volume_mesh(self.volume_mesh)
	}
}
