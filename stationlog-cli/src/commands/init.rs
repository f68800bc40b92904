//! `stationlog init` - write a default configuration file.

use std::path::Path;

use console::style;
use stationlog::config::ConfigFile;

use crate::error::CliError;

/// Write the default configuration to `path`.
///
/// An existing file is only replaced when `force` is set.
pub fn run(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.to_path_buf()));
    }

    ConfigFile::default().save_to(path)?;

    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        style(path.display()).cyan()
    );
    println!("  Edit it, then start the console with 'stationlog run'.");
    Ok(())
}
