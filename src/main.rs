use std::env::var;

use clap::Parser;
use miette::Result;
use standup::{run, Cli};

fn main() -> Result<()> {
    if var("RUST_LOG").is_ok() {
        env_logger::init();
    }
    run(Cli::parse())
}
