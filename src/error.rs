//! Failures raised by the package manager workflows.
//!
//! These travel inside `anyhow::Error`; callers that need to branch on a
//! specific failure use `downcast_ref::<SatPkgrError>()`.

use std::path::PathBuf;

#[derive(Debug)]
pub enum SatPkgrError {
    /// The project manifest does not exist at construction time
    ManifestNotFound(PathBuf),
    /// A dependency key is not of the form `owner/repo`
    BadPackageAddress(String),
    /// `install_all_packages` was called on an empty dependency map
    NoPackagesListed(PathBuf),
    /// The archive host answered with a non-2xx status
    HttpStatus { status: u16, url: String },
    /// The downloaded archive could not be opened or unpacked
    Extraction {
        archive: PathBuf,
        source: anyhow::Error,
    },
    /// The installed package's own manifest is missing or malformed
    PackageManifest {
        path: PathBuf,
        source: anyhow::Error,
    },
    /// The installed package's manifest has no `cosmos.launcher` entry
    MissingLauncher { path: PathBuf },
    NotInstalled(String),
    /// No launcher registry line mentions the package
    NotInRegistry { package: String, registry: PathBuf },
    NotADirectory(PathBuf),
}

impl std::fmt::Display for SatPkgrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SatPkgrError::ManifestNotFound(path) => {
                write!(
                    f,
                    "File does not exist: {}. Use `satpkgr init`.",
                    path.display()
                )
            }
            SatPkgrError::BadPackageAddress(address) => {
                write!(f, "Bad package address: '{}'", address)
            }
            SatPkgrError::NoPackagesListed(path) => {
                write!(f, "No packages are listed in {}", path.display())
            }
            SatPkgrError::HttpStatus { status, url } => {
                write!(f, "{} on '{}'", status, url)
            }
            SatPkgrError::Extraction { archive, source } => {
                write!(f, "Failed to extract {}: {:#}", archive.display(), source)
            }
            SatPkgrError::PackageManifest { path, source } => {
                write!(
                    f,
                    "Failed to read package manifest {}: {:#}",
                    path.display(),
                    source
                )
            }
            SatPkgrError::MissingLauncher { path } => {
                write!(
                    f,
                    "Package manifest {} does not declare cosmos.launcher",
                    path.display()
                )
            }
            SatPkgrError::NotInstalled(package) => {
                write!(f, "{} is not installed", package)
            }
            SatPkgrError::NotInRegistry { package, registry } => {
                write!(f, "{} not found in {}", package, registry.display())
            }
            SatPkgrError::NotADirectory(path) => {
                write!(f, "{} is not a directory.", path.display())
            }
        }
    }
}

impl std::error::Error for SatPkgrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SatPkgrError::Extraction { source, .. }
            | SatPkgrError::PackageManifest { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
