use std::fs;
use std::path::PathBuf;

use color_eyre::Result;

use gridmate::io;

pub struct Options {
    pub input: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
}

/// Runs the import adapter and one export adapter without the TUI: reads a
/// CSV file and writes it back out as CSV or a pretty JSON array.
pub fn command(options: Options) -> Result<()> {
    let content = fs::read_to_string(&options.input)?;
    let rowset = io::csv::import(&content)?;
    tracing::debug!(rows = rowset.len(), input = %options.input.display(), "imported");

    let rendered = if options.json {
        io::json::export(&rowset)?
    } else {
        io::csv::export(&rowset)?
    };

    match options.output {
        Some(path) => fs::write(path, rendered)?,
        None => {
            print!("{rendered}");
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
