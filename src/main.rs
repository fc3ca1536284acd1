//! tilegif - Command-line tool for tiling animated GIFs onto a fixed canvas

use std::process::ExitCode;

use tilegif::cli;

fn main() -> ExitCode {
    cli::run()
}
