//! The package manager façade.
//!
//! A `PackageManager` owns the in-memory copy of the project manifest and
//! drives every install/uninstall workflow. The manifest is written back to
//! disk right after each change.

use anyhow::Result;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::archive::{ExtractionReport, ZipExtractor};
use crate::config::{Config, Layout};
use crate::download::download_file;
use crate::error::SatPkgrError;
use crate::http::HttpClient;
use crate::manifest::Manifest;
use crate::package::PackageAddress;
use crate::registry::LauncherRegistry;
use crate::runtime::{Runtime, relative_path_from_dir, to_slash_string};

pub struct PackageManager<R: Runtime> {
    runtime: R,
    http_client: HttpClient,
    layout: Layout,
    root: PathBuf,
    manifest_path: PathBuf,
    package_dir: PathBuf,
    manifest: Manifest,
}

impl<R: Runtime> PackageManager<R> {
    /// Open the project at `config.root`. The manifest must already exist.
    #[tracing::instrument(skip(config))]
    pub fn new(config: Config<R>) -> Result<Self> {
        let Config {
            runtime,
            http_client,
            layout,
            root,
        } = config;

        let manifest_path = layout.manifest_path(&root);
        let package_dir = layout.package_dir(&root);

        if !runtime.exists(&manifest_path) {
            return Err(SatPkgrError::ManifestNotFound(manifest_path).into());
        }

        let manifest = Manifest::load(&runtime, &manifest_path)?;
        debug!(
            "Loaded {:?} with {} dependencies",
            manifest_path,
            manifest.dependency_names().len()
        );

        Ok(Self {
            runtime,
            http_client,
            layout,
            root,
            manifest_path,
            package_dir,
            manifest,
        })
    }

    /// Write a placeholder manifest into `root`, replacing any existing one.
    #[tracing::instrument(skip(runtime, layout))]
    pub fn init_package(runtime: &R, root: &Path, layout: &Layout) -> Result<PathBuf> {
        let manifest_path = layout.manifest_path(root);
        Manifest::template().save(runtime, &manifest_path)?;
        info!("Wrote {:?}", manifest_path);
        Ok(manifest_path)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Install every dependency listed in the manifest, in file order.
    /// Stops at the first failure.
    #[tracing::instrument(skip(self))]
    pub async fn install_all_packages(&mut self) -> Result<()> {
        let packages = self.manifest.dependency_names();

        if packages.is_empty() {
            return Err(SatPkgrError::NoPackagesListed(self.manifest_path.clone()).into());
        }

        for package in packages {
            info!("Installing package '{}'", package);
            let address = package.parse::<PackageAddress>()?;
            self.install_package(&address.owner, &address.repo).await?;
            info!("Success!");
        }

        Ok(())
    }

    /// Download, extract and register `owner/repo`.
    ///
    /// The dependency is recorded in the manifest only after the launcher
    /// line has been written. If the package turns out to have no usable
    /// manifest of its own, the archive and the extracted files stay on disk
    /// but the manifest and the launcher registry are left as they were.
    #[tracing::instrument(skip(self))]
    pub async fn install_package(&mut self, owner: &str, repo: &str) -> Result<()> {
        let address = PackageAddress::from_parts(owner, repo)?;
        let owner_dir = self.package_dir.join(owner);
        let archive_path = owner_dir.join(format!("{}.zip", repo));

        self.fetch_archive(&address, &archive_path).await?;
        self.extract_archive(&archive_path, &owner_dir)?;

        let extracted_dir = owner_dir.join(self.layout.extracted_dir_name(repo));
        let launcher = self.read_package_launcher(&extracted_dir)?;
        let launch_path = self.launch_path(&extracted_dir, &launcher)?;

        self.registry().register(repo, &launch_path)?;

        self.manifest
            .set_dependency(&address.to_string(), &self.layout.branch)?;
        self.persist()?;

        info!("Installed {} into {:?}", address, extracted_dir);
        Ok(())
    }

    /// Remove `owner/repo` from the manifest, the launcher registry and disk.
    #[tracing::instrument(skip(self))]
    pub fn uninstall_package(&mut self, owner: &str, repo: &str) -> Result<()> {
        let address = PackageAddress::from_parts(owner, repo)?;
        let package_name = address.to_string();
        let owner_dir = self.package_dir.join(owner);
        let extracted_dir = owner_dir.join(self.layout.extracted_dir_name(repo));

        if !self.manifest.has_dependency(&package_name) {
            return Err(SatPkgrError::NotInstalled(package_name).into());
        }

        self.manifest.remove_dependency(&package_name);
        self.persist()?;

        let registry = self.registry();
        let removed = registry.unregister(&package_name)?;
        if removed.is_empty() {
            return Err(SatPkgrError::NotInRegistry {
                package: package_name,
                registry: registry.path().to_path_buf(),
            }
            .into());
        }

        info!("Removing {} from {:?}", package_name, extracted_dir);
        if !self.runtime.is_dir(&extracted_dir) {
            return Err(SatPkgrError::NotADirectory(extracted_dir).into());
        }
        self.runtime.remove_dir_all(&extracted_dir)?;

        self.remove_leftovers(&owner_dir, repo)?;
        Ok(())
    }

    /// Delete the whole package directory. Fails if it does not exist.
    #[tracing::instrument(skip(self))]
    pub fn remove_package_directory(&self) -> Result<()> {
        info!("Removing {:?}", self.package_dir);
        self.runtime.remove_dir_all(&self.package_dir)
    }

    fn registry(&self) -> LauncherRegistry<'_, R> {
        LauncherRegistry::new(&self.runtime, self.layout.registry_path(&self.root))
    }

    fn persist(&self) -> Result<()> {
        self.manifest.save(&self.runtime, &self.manifest_path)
    }

    async fn fetch_archive(&self, address: &PackageAddress, archive_path: &Path) -> Result<u64> {
        let url = self.layout.archive_url(address);
        download_file(&self.runtime, &url, archive_path, &self.http_client).await
    }

    fn extract_archive(&self, archive_path: &Path, owner_dir: &Path) -> Result<ExtractionReport> {
        ZipExtractor
            .extract(&self.runtime, archive_path, owner_dir)
            .map_err(|source| {
                anyhow::Error::from(SatPkgrError::Extraction {
                    archive: archive_path.to_path_buf(),
                    source,
                })
            })
    }

    /// The `cosmos.launcher` entry of an installed package's own manifest.
    fn read_package_launcher(&self, extracted_dir: &Path) -> Result<String> {
        let path = self.layout.manifest_path(extracted_dir);
        let manifest = Manifest::load(&self.runtime, &path).map_err(|source| {
            SatPkgrError::PackageManifest {
                path: path.clone(),
                source,
            }
        })?;

        match manifest.launcher() {
            Some(launcher) => Ok(launcher.to_string()),
            None => Err(SatPkgrError::MissingLauncher { path }.into()),
        }
    }

    /// Path of the launcher script as seen from the COSMOS tools directory.
    fn launch_path(&self, extracted_dir: &Path, launcher: &str) -> Result<String> {
        let entry_point = extracted_dir.join("cosmos").join(launcher);
        let tool_dir = self.layout.tool_dir(&self.root);
        let relative = relative_path_from_dir(&tool_dir, &entry_point).ok_or_else(|| {
            anyhow::anyhow!(
                "Cannot express {:?} relative to {:?}",
                entry_point,
                tool_dir
            )
        })?;
        Ok(to_slash_string(&relative))
    }

    /// Drop the downloaded archive and, if nothing else is left, the owner directory.
    fn remove_leftovers(&self, owner_dir: &Path, repo: &str) -> Result<()> {
        let archive_path = owner_dir.join(format!("{}.zip", repo));
        if self.runtime.exists(&archive_path) {
            debug!("Removing archive {:?}", archive_path);
            self.runtime.remove_file(&archive_path)?;
        }

        match self.runtime.read_dir(owner_dir) {
            Ok(entries) if entries.is_empty() => {
                debug!("Removing empty owner directory {:?}", owner_dir);
                if let Err(e) = self.runtime.remove_dir(owner_dir) {
                    debug!("Failed to remove {:?}: {:#}", owner_dir, e);
                }
            }
            Ok(_) => {}
            Err(e) => debug!("Failed to list {:?}: {:#}", owner_dir, e),
        }
        Ok(())
    }
}
