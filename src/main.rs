use anyhow::Result;
use clap::Parser;
use satpkgr::runtime::RealRuntime;
use satpkgr::{Config, Layout, PackageAddress, PackageManager};
use std::path::PathBuf;

/// satpkgr - package manager for COSMOS / cFS ground station projects
///
/// Reads satpkgr.json in the project root, downloads dependencies into
/// sat_modules/ and registers their launchers with the COSMOS launcher.
///
/// If the GITHUB_TOKEN environment variable is set, it is sent with archive
/// downloads so private repositories can be installed.
///
/// Examples:
///   satpkgr init                  # Write a fresh satpkgr.json
///   satpkgr install               # Install everything listed in satpkgr.json
///   satpkgr install owner/repo    # Install one package
#[derive(Parser, Debug)]
#[command(author, version = env!("SATPKGR_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root containing satpkgr.json (also via SATPKGR_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "SATPKGR_ROOT",
        value_name = "PATH",
        default_value = ".",
        global = true
    )]
    pub root: PathBuf,

    /// Archive host (defaults to https://github.com)
    #[arg(long = "host", env = "SATPKGR_HOST", value_name = "URL", global = true)]
    pub host: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Write a new satpkgr.json in the project root
    Init,

    /// Install one package, or every dependency listed in satpkgr.json
    Install(InstallArgs),

    /// Remove an installed package
    Uninstall(UninstallArgs),

    /// Delete the whole package directory
    Clean,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// The package in the format "owner/repo"; omit to install all dependencies
    #[arg(value_name = "OWNER/REPO")]
    pub package: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UninstallArgs {
    /// The package in the format "owner/repo"
    #[arg(value_name = "OWNER/REPO")]
    pub package: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Init => {
            let path = PackageManager::init_package(&runtime, &cli.root, &Layout::default())?;
            println!("Created {}", path.display());
        }
        Commands::Install(args) => {
            let config = Config::new(runtime, cli.root, cli.host)?;
            let mut manager = PackageManager::new(config)?;
            match args.package {
                Some(package) => {
                    let address = package.parse::<PackageAddress>()?;
                    manager
                        .install_package(&address.owner, &address.repo)
                        .await?;
                    println!("Installed {}", address);
                }
                None => manager.install_all_packages().await?,
            }
        }
        Commands::Uninstall(args) => {
            let address = args.package.parse::<PackageAddress>()?;
            let config = Config::new(runtime, cli.root, cli.host)?;
            let mut manager = PackageManager::new(config)?;
            manager.uninstall_package(&address.owner, &address.repo)?;
            println!("Removed {}", address);
        }
        Commands::Clean => {
            let config = Config::new(runtime, cli.root, cli.host)?;
            let manager = PackageManager::new(config)?;
            manager.remove_package_directory()?;
            println!("Removed {}", manager.package_dir().display());
        }
    }
    Ok(())
}
