use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{info, LevelFilter};
use quill::MergeOptions;
use quill::tiny_v1::TinyV1File;
use quill::tree::mappings::Mappings;

#[derive(Debug, PartialEq, Parser)]
struct Cli {
	/// Be verbose, give twice for even more output.
	#[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
	verbose: u8,

	#[command(subcommand)]
	command: Command,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
	/// Merges two tiny v2 files that share a namespace
	#[command(name = "merge-tiny-v2", disable_help_flag = true)]
	MergeTinyV2(MergeArgs),
	/// Merges two tiny v1 files that share a namespace, adding the namespaces of the second one to the lines of the first one
	#[command(name = "merge-tiny", disable_help_flag = true)]
	MergeTiny(MergeArgs),
}

#[derive(Debug, PartialEq, Args)]
struct MergeArgs {
	input_a: PathBuf,
	input_b: PathBuf,
	output: PathBuf,

	/// The namespace both inputs share, only needed if they share more than one
	#[arg(short = 'c', long = "common-namespace")]
	common_namespace: Option<String>,

	/// Leave names missing in both inputs empty, instead of using the name in the common namespace
	#[arg(short = 'h', long = "leave-holes")]
	leave_holes: bool,

	/// Print help
	#[arg(long = "help", action = ArgAction::Help)]
	help: Option<bool>,
}

impl MergeArgs {
	fn options(&self) -> MergeOptions {
		MergeOptions {
			common_namespace: self.common_namespace.clone(),
			leave_holes: self.leave_holes,
		}
	}
}

fn setup_logging(verbose: u8) -> Result<()> {
	let level = match verbose {
		0 => LevelFilter::Info,
		1 => LevelFilter::Debug,
		_ => LevelFilter::Trace,
	};

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
		})
		.level(level)
		.chain(std::io::stderr())
		.apply()
		.context("failed to set up logging")
}

fn merge_tiny_v2(args: &MergeArgs) -> Result<()> {
	info!("reading {}", args.input_a.display());
	let a = quill::tiny_v2::read_file(&args.input_a)?;
	info!("reading {}", args.input_b.display());
	let b = quill::tiny_v2::read_file(&args.input_b)?;

	info!("merging {} with {}", args.input_a.display(), args.input_b.display());
	let merged = Mappings::merge(&a, &b, &args.options())
		.with_context(|| anyhow!("failed to merge {:?} with {:?}", args.input_a, args.input_b))?;

	quill::tiny_v2::write_file(&merged, &args.output)?;
	info!("merged mappings written to {}", args.output.display());

	Ok(())
}

fn merge_tiny(args: &MergeArgs) -> Result<()> {
	info!("reading {}", args.input_a.display());
	let a = quill::tiny_v1::read_file(&args.input_a)?;
	info!("reading {}", args.input_b.display());
	let b = quill::tiny_v1::read_file(&args.input_b)?;

	info!("merging {} with {}", args.input_a.display(), args.input_b.display());
	let mut merged = Vec::new();
	TinyV1File::merge(&a, &b, &args.options(), &mut merged)
		.with_context(|| anyhow!("failed to merge {:?} with {:?}", args.input_a, args.input_b))?;

	// never overwrite an existing file
	let mut file = File::options()
		.write(true)
		.create_new(true)
		.open(&args.output)
		.with_context(|| anyhow!("failed to create new file {:?}", args.output))?;
	file.write_all(&merged)
		.with_context(|| anyhow!("failed to write to {:?}", args.output))?;
	info!("merged mappings written to {}", args.output.display());

	Ok(())
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_logging(cli.verbose)?;

	match &cli.command {
		Command::MergeTinyV2(args) => merge_tiny_v2(args),
		Command::MergeTiny(args) => merge_tiny(args),
	}
}

#[cfg(test)]
mod testing {
	use std::path::PathBuf;
	use clap::{CommandFactory, Parser};
	use pretty_assertions::assert_eq;
	use crate::{Cli, Command, MergeArgs};

	#[test]
	fn verify_cli() {
		Cli::command().debug_assert();
	}

	#[test]
	fn parse() {
		let cli = Cli::try_parse_from(["tiny-merge", "-vv", "merge-tiny-v2", "a.tiny", "b.tiny", "out.tiny", "-c", "intermediary", "-h"]).unwrap();
		assert_eq!(cli, Cli {
			verbose: 2,
			command: Command::MergeTinyV2(MergeArgs {
				input_a: PathBuf::from("a.tiny"),
				input_b: PathBuf::from("b.tiny"),
				output: PathBuf::from("out.tiny"),
				common_namespace: Some("intermediary".to_owned()),
				leave_holes: true,
				help: None,
			}),
		});

		let cli = Cli::try_parse_from(["tiny-merge", "merge-tiny", "a.tiny", "b.tiny", "out.tiny", "--leave-holes"]).unwrap();
		let Command::MergeTiny(args) = cli.command else {
			panic!("expected merge-tiny, got {:?}", cli.command);
		};
		assert_eq!(args.common_namespace, None);
		assert!(args.leave_holes);

		assert!(Cli::try_parse_from(["tiny-merge", "merge-tiny", "a.tiny", "b.tiny"]).is_err());
	}
}
