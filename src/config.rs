//! Fixed names and locations, plus the wiring needed to run the package manager.

use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use std::path::{Path, PathBuf};

use crate::{http::HttpClient, package::PackageAddress, runtime::Runtime};

pub const DEFAULT_HOST: &str = "https://github.com";

/// Where things live relative to a project root, and where archives come from.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Manifest file name inside the project root
    pub manifest_file_name: String,
    /// Package directory name inside the project root
    pub package_dir_name: String,
    /// COSMOS launcher configuration, relative to the project root
    pub launcher_registry: PathBuf,
    /// Directory the COSMOS launcher resolves LAUNCH paths from, relative to the project root
    pub launcher_tool_dir: PathBuf,
    /// Archive host, without trailing slash
    pub host: String,
    /// Ref fetched for every package
    pub branch: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            manifest_file_name: "satpkgr.json".to_string(),
            package_dir_name: "sat_modules".to_string(),
            launcher_registry: ["config", "tools", "launcher", "launcher.txt"]
                .iter()
                .collect(),
            launcher_tool_dir: PathBuf::from("tools"),
            host: DEFAULT_HOST.to_string(),
            branch: "master".to_string(),
        }
    }
}

impl Layout {
    /// Same layout, different archive host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns: `<root>/satpkgr.json`
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.manifest_file_name)
    }

    /// Returns: `<root>/sat_modules`
    pub fn package_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.package_dir_name)
    }

    pub fn registry_path(&self, root: &Path) -> PathBuf {
        root.join(&self.launcher_registry)
    }

    pub fn tool_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.launcher_tool_dir)
    }

    /// Returns: `<host>/<owner>/<repo>/archive/<branch>.zip`
    pub fn archive_url(&self, address: &PackageAddress) -> String {
        format!(
            "{}/{}/{}/archive/{}.zip",
            self.host, address.owner, address.repo, self.branch
        )
    }

    /// Name of the top-level directory inside a downloaded archive: `<repo>-<branch>`
    pub fn extracted_dir_name(&self, repo: &str) -> String {
        format!("{}-{}", repo, self.branch)
    }
}

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http_client: HttpClient,
    pub layout: Layout,
    pub root: PathBuf,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, root: PathBuf, host: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var("GITHUB_TOKEN") {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using GITHUB_TOKEN for archive downloads");
        }

        let client = Client::builder()
            .user_agent("satpkgr-cli")
            .default_headers(headers)
            .build()?;

        let layout = match host {
            Some(host) => Layout::default().with_host(host),
            None => Layout::default(),
        };

        Ok(Self {
            runtime,
            http_client: HttpClient::new(client),
            layout,
            root,
        })
    }
}
