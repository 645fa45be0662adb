//! Grain boundary mesher.
//!
//! Reads a labelled voxel grid (VTK legacy file, or a stack of TSL `.ang`
//! slices) and writes the grain boundary surface, grain table and optionally a
//! tetrahedral volume mesh.
//!
//! Outputs of `grain_mesh mesh`:
//! - nodes.txt, triangles.txt: plain text node and triangle tables
//! - surface.vtk: POLYDATA surface with per-triangle grain labels
//! - grains.txt: per-grain centroid, volume, area and bounds
//! - voxels.vtk: the (filtered) voxel grid that was meshed
//! - mesh.vtk, dihedral_angles.txt: volume mesh and its quality histogram

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::DVec3;
use grain_mesh::ebsd::{AngReader, SliceStack};
use grain_mesh::io::{self, VtkEncoding};
use grain_mesh::{MeshGenerator, MeshOutput, VoxelGrid};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;

/// Grain boundary surface and volume mesher.
#[derive(Parser, Debug)]
#[command(name = "grain_mesh")]
#[command(about = "Meshes grain boundaries of labelled voxel microstructures")]
struct Args {
	/// Log debug output (RUST_LOG overrides).
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Mesh a VTK voxel grid.
	Mesh(MeshArgs),
	/// Stack EBSD .ang slices into a VTK voxel grid.
	Ang(AngArgs),
}

#[derive(clap::Args, Debug)]
struct MeshArgs {
	/// VTK legacy file with a label scalar block.
	#[arg(short, long)]
	input: PathBuf,

	/// Scalar block name (default: GrainID).
	#[arg(short, long)]
	scalar: Option<String>,

	/// Output directory.
	#[arg(short, long)]
	output_dir: Option<PathBuf>,

	/// Path to configuration TOML file.
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Voxel spacing.
	#[arg(long, num_args = 3, value_names = ["DX", "DY", "DZ"])]
	resolution: Option<Vec<f64>>,

	/// Merge grains with fewer voxels into background.
	#[arg(long)]
	min_grain_size: Option<usize>,

	/// Drop triangles at or below this area.
	#[arg(long)]
	min_area: Option<f64>,

	/// Leave grains open where they meet the outside of the sample.
	#[arg(long)]
	no_exterior: bool,

	/// Also build the tetrahedral volume mesh.
	#[arg(long)]
	volume_mesh: bool,

	/// Write BINARY VTK where supported.
	#[arg(long)]
	binary: bool,
}

#[derive(clap::Args, Debug)]
struct AngArgs {
	/// One .ang file per slice, bottom to top.
	#[arg(short, long, num_args = 1.., required = true)]
	input: Vec<PathBuf>,

	/// Output VTK file.
	#[arg(short, long)]
	output: PathBuf,

	/// Slice spacing along z.
	#[arg(long, default_value_t = 1.0)]
	z_res: f64,

	/// Write BINARY VTK.
	#[arg(long)]
	binary: bool,
}

fn main() -> ExitCode {
	let args = Args::parse();

	let level = if args.verbose { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

	let result = match args.command {
		Command::Mesh(mesh_args) => run_mesh(mesh_args),
		Command::Ang(ang_args) => run_ang(ang_args),
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("Error: {err:#}");
			ExitCode::FAILURE
		}
	}
}

/// Merge flags over the (optional) config file.
fn resolve_config(args: &MeshArgs) -> Result<Config> {
	let mut config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::default(),
	};
	if let Some(scalar) = &args.scalar {
		config.scalar = scalar.clone();
	}
	if let Some(dir) = &args.output_dir {
		config.output_dir = dir.display().to_string();
	}
	if let Some(res) = &args.resolution {
		if res.iter().any(|&r| !(r > 0.0) || !r.is_finite()) {
			anyhow::bail!("resolution must be positive, got {:?}", res);
		}
		config.resolution = Some([res[0], res[1], res[2]]);
	}
	if let Some(size) = args.min_grain_size {
		config.min_grain_size = size;
	}
	if let Some(area) = args.min_area {
		config.min_triangle_area = area;
	}
	config.exterior_faces &= !args.no_exterior;
	config.volume_mesh |= args.volume_mesh;
	config.outputs.binary |= args.binary;
	Ok(config)
}

fn run_mesh(args: MeshArgs) -> Result<()> {
	let config = resolve_config(&args)?;

	log::info!("Reading {} (scalar {})", args.input.display(), config.scalar);
	let mut grid = io::read_vtk_labels(&args.input, &config.scalar)
		.with_context(|| format!("Failed to read voxel grid: {}", args.input.display()))?;
	if let Some([dx, dy, dz]) = config.resolution {
		grid = VoxelGrid::new(grid.dims(), DVec3::new(dx, dy, dz), grid.labels().to_vec())?
			.with_origin(grid.origin());
	}
	let [nx, ny, nz] = grid.dims().voxels();
	log::info!("Grid {}x{}x{}, {} labels", nx, ny, nz, grid.distinct_labels().len());

	let output = MeshGenerator::new(config.mesh_config())
		.run(&grid)
		.context("Meshing failed")?;

	let output_dir = PathBuf::from(&config.output_dir);
	std::fs::create_dir_all(&output_dir)
		.with_context(|| format!("Failed to create output dir: {}", output_dir.display()))?;

	write_outputs(&config, &grid, &output, &output_dir)?;

	println!(
		"{} nodes, {} triangles, {} grains in {:.1} ms",
		output.surface.node_count(),
		output.surface.triangle_count(),
		output.grains.len(),
		output.stats.total_us as f64 / 1000.0
	);
	if !output.warnings.is_clean() {
		println!("{} warnings (see log)", output.warnings.total());
	}
	Ok(())
}

fn write_outputs(config: &Config, grid: &VoxelGrid, output: &MeshOutput, dir: &Path) -> Result<()> {
	let outputs = &config.outputs;
	let encoding = VtkEncoding::from_binary(outputs.binary);

	if outputs.nodes {
		emit(dir, "nodes.txt", |out| io::write_nodes(&output.surface, out))?;
	}
	if outputs.triangles {
		emit(dir, "triangles.txt", |out| io::write_triangles(&output.surface, out))?;
	}
	if outputs.surface {
		emit(dir, "surface.vtk", |out| {
			io::write_surface_vtk(&output.surface, out, encoding, outputs.conformal)
		})?;
	}
	if outputs.grains {
		emit(dir, "grains.txt", |out| io::write_grains(&output.grains, out))?;
	}
	if outputs.voxels {
		// Size filtering happens inside the run; write what was meshed.
		let mut meshed = grid.clone();
		meshed.filter_small_grains(config.min_grain_size);
		emit(dir, "voxels.vtk", |out| io::write_voxeldata(&meshed, out, encoding))?;
	}
	if let Some(volume) = &output.volume {
		if outputs.mesh {
			emit(dir, "mesh.vtk", |out| io::write_meshdata(volume, out))?;
		}
		if outputs.dihedral_angles {
			emit(dir, "dihedral_angles.txt", |out| {
				io::write_dihedralangles(&volume.histogram, out)
			})?;
		}
	}
	Ok(())
}

fn emit<F>(dir: &Path, name: &str, write: F) -> Result<()>
where
	F: FnOnce(&mut std::io::BufWriter<std::fs::File>) -> io::IoResult<()>,
{
	let path = dir.join(name);
	io::write_file(&path, write).with_context(|| format!("Failed to write: {}", path.display()))?;
	println!("  ✓ {}", name);
	Ok(())
}

fn run_ang(args: AngArgs) -> Result<()> {
	let mut stack = SliceStack::new(args.z_res);
	for path in &args.input {
		let data = AngReader::read_file(path)
			.with_context(|| format!("Failed to read ANG slice: {}", path.display()))?;
		log::info!("{}: {}x{} points", path.display(), data.ncols(), data.nrows());
		stack
			.push(data)
			.with_context(|| format!("Slice does not match the stack: {}", path.display()))?;
	}

	let warnings = stack.warnings();
	if !warnings.is_clean() {
		warnings.log();
	}

	let grid = stack.to_phase_grid().context("Failed to build voxel grid")?;
	let encoding = VtkEncoding::from_binary(args.binary);
	io::write_file(&args.output, |out| io::write_voxeldata(&grid, out, encoding))
		.with_context(|| format!("Failed to write: {}", args.output.display()))?;

	let [nx, ny, nz] = grid.dims().voxels();
	println!("Wrote {}x{}x{} voxels to {}", nx, ny, nz, args.output.display());
	Ok(())
}
