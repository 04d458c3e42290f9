mod cmd;
mod logging;

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mddb", version, about = "Index a folder of Markdown files into SQLite")]
struct Cli {
    /// Folder to index, or a single file to inspect
    path: Option<PathBuf>,

    /// Path to an mddb.toml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep running and sync filesystem changes into the index
    #[arg(long)]
    watch: bool,
}

fn main() {
    let cli = Cli::parse();

    let path = match cli.path {
        Some(path) => path,
        None => {
            eprintln!("Error: no path given (expected a folder to index or a file to inspect)");
            std::process::exit(1);
        }
    };

    if path.is_dir() {
        cmd::index::run(&path, cli.config.as_deref(), cli.watch);
    } else if path.is_file() {
        cmd::inspect::run(&path);
    } else {
        eprintln!("Error: path does not exist: {}", path.display());
        std::process::exit(1);
    }
}
