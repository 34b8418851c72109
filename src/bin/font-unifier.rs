//! Command-line front end for the font normalizer.
//!
//! Plays the role the GUI plays elsewhere: pick a file, pick a font, invoke
//! one blocking normalization, report success or a single failure message.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "font-unifier",
    version,
    about = "Unify the font used across an Office document (.docx, .xlsx, .pptx)"
)]
struct Cli {
    /// Office document to process
    file: PathBuf,

    /// Target font display name
    #[arg(short, long, default_value = "Meiryo UI")]
    font: String,

    /// Replace an existing {name}_modified file instead of picking a fresh name
    #[arg(long)]
    overwrite: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let out = font_unifier::normalize_file(&cli.file, &cli.font, cli.overwrite)
        .with_context(|| format!("failed to process {}", cli.file.display()))?;

    println!("File processed successfully.");
    println!("Saved as: {}", out.display());
    Ok(())
}
