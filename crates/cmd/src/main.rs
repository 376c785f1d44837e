use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cmd::commands::{self, FormatEdit, UploadArgs};
use cmd::common::CatalogContext;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "homecat")]
struct Cli {
    /// Catalog root directory (defaults to $HOMECAT_ROOT)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new catalog and its homecat.yaml
    Init {
        /// Owner recorded on uploads
        #[arg(long)]
        user: Option<String>,
        /// Rows returned by previews
        #[arg(long)]
        preview_limit: Option<usize>,
    },
    /// List a root (home:alice) or folder (home:alice/docs)
    Ls { parent: String },
    /// Create a folder
    Mkdir { path: String },
    /// Delete a folder and everything under it
    Rmdir {
        path: String,
        #[arg(long)]
        version: Option<u64>,
    },
    /// Upload a local file
    Upload(UploadArgs),
    /// Describe a file or folder
    Stat { path: String },
    /// Show or change the format of a file or folder
    Format {
        #[command(subcommand)]
        action: FormatAction,
    },
    /// Delete a dataset record
    Rm {
        path: String,
        #[arg(long)]
        version: Option<u64>,
    },
    /// Rename a file within its folder
    Mv { path: String, new_name: String },
    /// Show the first rows of a file
    Preview { path: String },
    /// Run SQL against a file, exposed as the table `dataset`
    Query {
        path: String,
        #[arg(long)]
        sql: Option<String>,
    },
}

#[derive(Subcommand)]
enum FormatAction {
    Show {
        path: String,
    },
    Set {
        path: String,
        #[command(flatten)]
        edit: FormatEdit,
    },
}

async fn run(cli: Cli, out: &mut String) -> Result<()> {
    let ctx = CatalogContext::new(cli.root)?;
    match cli.command {
        Commands::Init {
            user,
            preview_limit,
        } => commands::init_command(&ctx, user, preview_limit, out).await,
        Commands::Ls { parent } => commands::list_command(&ctx, &parent, out).await,
        Commands::Mkdir { path } => commands::mkdir_command(&ctx, &path, out).await,
        Commands::Rmdir { path, version } => {
            commands::rmdir_command(&ctx, &path, version, out).await
        }
        Commands::Upload(args) => commands::upload_command(&ctx, &args, out).await,
        Commands::Stat { path } => commands::stat_command(&ctx, &path, out).await,
        Commands::Format { action } => match action {
            FormatAction::Show { path } => commands::format_show_command(&ctx, &path, out).await,
            FormatAction::Set { path, edit } => {
                commands::format_set_command(&ctx, &path, &edit, out).await
            }
        },
        Commands::Rm { path, version } => commands::rm_command(&ctx, &path, version, out).await,
        Commands::Mv { path, new_name } => {
            commands::mv_command(&ctx, &path, &new_name, out).await
        }
        Commands::Preview { path } => commands::preview_command(&ctx, &path, out).await,
        Commands::Query { path, sql } => commands::query_command(&ctx, &path, sql, out).await,
    }
}

#[tokio::main]
#[allow(clippy::print_stdout)]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut out = String::new();
    let result = run(cli, &mut out).await;
    print!("{out}");
    result
}
