use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "vacancy-tables",
    version,
    about = "Rebuild federal judicial vacancy tables from PDF text layout"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Convert(ConvertArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "raw")]
    pub raw_root: PathBuf,

    #[arg(long, default_value = ".cache/vacancies")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// PDFs to convert; defaults to every PDF in the inventory.
    pub files: Vec<PathBuf>,

    #[arg(long, default_value = "raw")]
    pub raw_root: PathBuf,

    #[arg(long, default_value = ".cache/vacancies")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub run_manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    /// Dump classifier annotations per document under `<cache-root>/debug`.
    #[arg(long, default_value_t = false)]
    pub debug_annotations: bool,

    /// Also write each document's records as JSON into this directory.
    #[arg(long)]
    pub json_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/vacancies")]
    pub cache_root: PathBuf,
}
