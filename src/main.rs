use clap::Parser;
use sellsignal::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
