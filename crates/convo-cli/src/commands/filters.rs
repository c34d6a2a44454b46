//! Filters command

use anyhow::Result;
use convo_core::FilterCatalog;

pub fn run(verbose: bool) -> Result<()> {
    let catalog = FilterCatalog::standard();
    for (name, kernel) in catalog.iter() {
        println!("{name:<12} {0}x{0}  sum={1}", kernel.size(), kernel.sum());
        if verbose {
            for row in kernel.weights().chunks(kernel.size()) {
                let cells: Vec<String> = row.iter().map(|w| format!("{w:>8.4}")).collect();
                println!("    {}", cells.join(" "));
            }
        }
    }
    Ok(())
}
