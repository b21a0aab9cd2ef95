//! svgbundle - Command-line tool for compiling SVG files into icon modules

use std::process::ExitCode;

use svgbundle::cli;

fn main() -> ExitCode {
    cli::run()
}
