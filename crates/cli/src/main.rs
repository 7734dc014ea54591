use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

/// `pyrite64 --cli --cmd {build|clean} <path-to-.p64proj>` (spec §6). The
/// GUI mode the original falls back to without `--cli` is out of scope;
/// this binary only drives the build pipeline.
#[derive(Parser)]
#[command(name = "pyrite64", version)]
struct Args {
	/// Run in CLI mode. Reserved for parity with the original's flag; this
	/// binary has no GUI mode, so the flag is accepted but not required.
	#[arg(long)]
	cli: bool,

	#[arg(long = "cmd", value_enum)]
	cmd: Command,

	/// Path to the project file (.p64proj).
	project: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Command {
	Build,
	Clean,
}

fn main() -> ExitCode {
	env_logger::init();
	let args = Args::parse();

	let result = match args.cmd {
		Command::Build => run_build(&args.project),
		Command::Clean => run_clean(&args.project),
	};

	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			log::error!("{err:#}");
			ExitCode::FAILURE
		}
	}
}

fn run_build(project: &PathBuf) -> anyhow::Result<()> {
	log::info!("building project: {}", project.display());
	let summary = build::build_project(project)?;
	log::info!("build done: {} assets, {} scene files", summary.asset_count, summary.scene_files.len());
	Ok(())
}

fn run_clean(project: &PathBuf) -> anyhow::Result<()> {
	log::info!("cleaning project: {}", project.display());
	build::clean_project(project, &build::CleanArgs::default())?;
	Ok(())
}
