//! Check command - resolve entries without downloading.

use std::path::Path;

use preloader::resolver::{EntryResolver, SourceResolver};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the check command.
pub fn run(game_dir: &Path) -> Result<(), CliError> {
    let runner = CliRunner::new(game_dir, true)?;
    runner.log_startup("check");
    let config = runner.config();

    let resolver = EntryResolver::from_config(super::registry_client(config)?, config);
    let mut checked = 0;
    let mut failed = 0;

    for entry in config.enabled_downloads() {
        checked += 1;
        println!("{}", entry.name);
        match resolver.resolve(entry) {
            Ok(transfer) => {
                println!("  url:  {}", transfer.url);
                match &transfer.expected_hash {
                    Some(hash) => println!("  {}: {}", hash.algorithm.name(), hash.hex),
                    None => println!("  hash: (none published)"),
                }
                if let Some(size) = transfer.size {
                    println!("  size: {} bytes", size);
                }
            }
            Err(e) => {
                failed += 1;
                println!("  error: {}", e);
            }
        }
    }

    println!();
    if checked == 0 {
        println!("No enabled entries.");
        return Ok(());
    }
    println!("{} checked, {} failed", checked, failed);

    if failed > 0 {
        return Err(CliError::Config(format!(
            "{} of {} entries could not be resolved",
            failed, checked
        )));
    }
    Ok(())
}
