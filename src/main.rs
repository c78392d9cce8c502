#![allow(missing_docs)]

use clap::{Parser, Subcommand};

mod cmd;

#[derive(Parser)]
#[command(name = "cimrep", about = "CIM class store inspection tools")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Show version record fields and record counts.
	Info(cmd::info::Args),
	/// List class records with parents and flags.
	Classes(cmd::classes::Args),
	/// Decode and render one class.
	Class(cmd::class::Args),
	/// Print the inheritance hierarchy.
	Tree(cmd::tree::Args),
}

fn main() {
	env_logger::init();
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> cimrep::rep::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Classes(args) => cmd::classes::run(args),
		Commands::Class(args) => cmd::class::run(args),
		Commands::Tree(args) => cmd::tree::run(args),
	}
}
