//! gis-cli entry point.

#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

fn main() {
    if let Err(e) = gis_cli::run() {
        eprintln!("error: {}", e.report());
        std::process::exit(1);
    }
}
