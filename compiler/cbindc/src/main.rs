//! cbind CLI.

use std::path::PathBuf;
use std::process::ExitCode;

use cbind_gen::CommandFormatter;
use cbindc::{init_tracing, run_file, RunOptions};

struct Args {
    config: PathBuf,
    out_dir: PathBuf,
    format: bool,
    formatter: Option<String>,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        print_usage();
        return ExitCode::SUCCESS;
    }
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    init_tracing();

    let mut options = RunOptions::new(args.out_dir);
    if args.format {
        let formatter = args.formatter.map_or_else(CommandFormatter::default, CommandFormatter::new);
        tracing::debug!(program = formatter.program(), "formatting output");
        options = options.with_formatter(formatter);
    }
    match run_file(&args.config, &options) {
        Ok(written) => {
            for path in written {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut config = None;
    let mut out_dir = PathBuf::from(".");
    let mut format = true;
    let mut formatter = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" | "-o" => {
                let dir = iter.next().ok_or("--out needs a directory")?;
                out_dir = PathBuf::from(dir);
            }
            "--no-format" => format = false,
            "--formatter" => {
                let program = iter.next().ok_or("--formatter needs a program")?;
                formatter = Some(program.clone());
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option `{flag}`")),
            path if config.is_none() => config = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument `{extra}`")),
        }
    }

    Ok(Args {
        config: config.ok_or("missing project file")?,
        out_dir,
        format,
        formatter,
    })
}

fn print_usage() {
    eprintln!("Usage: cbind <config.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --out <dir>          Output directory (default: .)");
    eprintln!("  --no-format              Write generated sources unformatted");
    eprintln!("  --formatter <program>    Formatter fed on stdin (default: gofmt)");
    eprintln!();
    eprintln!("Logging: RUST_LOG=cbind_gen=debug, CBIND_LOG_TREE=1 for nested output");
}
