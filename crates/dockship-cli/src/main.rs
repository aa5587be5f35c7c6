mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dockship",
    about = "Build, publish and deploy container images to Kubernetes"
)]
#[command(version)]
struct Cli {
    /// Project root holding dockship.toml
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage the build context, render the Dockerfile and build the image
    Package,
    /// Package, push the version-tagged image, then push the commit tag
    Publish,
    /// Tag the local version-tagged image with the current commit and push it
    Tag,
    /// Render manifests and apply them to the cluster
    Deploy {
        /// Deployment environment, selects `<name>_<env>` config files
        #[arg(long)]
        env: String,
    },
    /// Print the image reference
    ImageName {
        /// Print the commit-pinned reference instead of the version-tagged one
        #[arg(long)]
        commit: bool,
    },
    /// Check tool availability and project setup
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dir = cli.project_dir.as_path();

    match cli.command {
        Commands::Package => commands::package(dir).await?,
        Commands::Publish => commands::publish(dir).await?,
        Commands::Tag => commands::tag(dir).await?,
        Commands::Deploy { env } => commands::deploy(dir, &env).await?,
        Commands::ImageName { commit } => commands::image_name(dir, commit)?,
        Commands::Doctor => commands::doctor(dir).await?,
    }

    Ok(())
}
