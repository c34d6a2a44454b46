//! Backends command

use anyhow::Result;
use convo_compute::{describe_backends, select_best_backend};

pub fn run() -> Result<()> {
    print!("{}", describe_backends());
    println!("Auto selects: {}", select_best_backend());
    Ok(())
}
