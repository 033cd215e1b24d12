use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// What an extraction run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub extracted: usize,
    /// Entries whose destination already existed
    pub skipped: usize,
}

/// Extractor for .zip archives.
///
/// Entries are written under the destination directory with their archive
/// paths kept as-is (no top-level directory stripping). A destination that
/// already exists is left untouched.
pub struct ZipExtractor;

impl ZipExtractor {
    #[tracing::instrument(skip(self, runtime))]
    pub fn extract<R: Runtime>(
        &self,
        runtime: &R,
        archive_path: &Path,
        extract_to: &Path,
    ) -> Result<ExtractionReport> {
        debug!("Extracting zip archive to {:?}...", extract_to);
        let mut reader = runtime
            .open(archive_path)
            .with_context(|| format!("Failed to open archive at {:?}", archive_path))?;

        // zip needs Read + Seek; Runtime::open only gives Read
        let mut buffer = Vec::new();
        reader
            .read_to_end(&mut buffer)
            .with_context(|| format!("Failed to read archive {:?}", archive_path))?;
        let cursor = std::io::Cursor::new(buffer);

        let mut archive = ZipArchive::new(cursor).context("Failed to parse ZIP archive")?;
        let mut report = ExtractionReport::default();

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("Failed to read ZIP entry {}", i))?;

            let entry_path = match entry.enclosed_name() {
                Some(path) => path.to_path_buf(),
                None => {
                    debug!("Skipping entry with unsafe path {:?}", entry.name());
                    continue;
                }
            };

            let full_path = extract_to.join(&entry_path);

            if runtime.exists(&full_path) {
                debug!("Skipping existing {:?}", full_path);
                report.skipped += 1;
                continue;
            }

            if entry.is_dir() {
                runtime.create_dir_all(&full_path)?;
            } else {
                if let Some(parent) = full_path.parent() {
                    runtime.create_dir_all(parent)?;
                }
                let mut dest_file = runtime.create_file(&full_path)?;
                std::io::copy(&mut entry, &mut dest_file)
                    .with_context(|| format!("Failed to extract file {:?}", full_path))?;

                #[cfg(unix)]
                if let Some(mode) = entry.unix_mode()
                    && let Err(e) = runtime.set_permissions(&full_path, mode)
                {
                    debug!("Failed to set permissions on {:?}: {}", full_path, e);
                }
            }
            report.extracted += 1;
        }

        info!(
            "Extraction complete ({} extracted, {} already present).",
            report.extracted, report.skipped
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;
    use zip::CompressionMethod;
    use zip::ZipWriter;
    use zip::write::FileOptions;

    fn create_test_archive(path: &Path, files: &[(&str, &str)]) -> Result<()> {
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in files {
            zip.start_file(*name, options)?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    #[test]
    fn test_extract_keeps_top_level_directory() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("app.zip");
        let owner_dir = dir.path().join("owner");
        fs::create_dir(&owner_dir)?;

        create_test_archive(
            &archive_path,
            &[
                ("app-master/satpkgr.json", "{}"),
                ("app-master/cosmos/launcher.rb", "puts 1"),
            ],
        )?;

        let report = ZipExtractor.extract(&RealRuntime, &archive_path, &owner_dir)?;

        assert_eq!(report.extracted, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(
            fs::read_to_string(owner_dir.join("app-master/cosmos/launcher.rb"))?,
            "puts 1"
        );
        Ok(())
    }

    #[test]
    fn test_extract_skips_existing_files() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("app.zip");
        let owner_dir = dir.path().join("owner");
        fs::create_dir_all(owner_dir.join("app-master"))?;
        fs::write(owner_dir.join("app-master/readme.txt"), "local edit")?;

        create_test_archive(
            &archive_path,
            &[
                ("app-master/readme.txt", "from archive"),
                ("app-master/new.txt", "new"),
            ],
        )?;

        let report = ZipExtractor.extract(&RealRuntime, &archive_path, &owner_dir)?;

        assert_eq!(report, ExtractionReport { extracted: 1, skipped: 1 });
        assert_eq!(
            fs::read_to_string(owner_dir.join("app-master/readme.txt"))?,
            "local edit"
        );
        assert_eq!(fs::read_to_string(owner_dir.join("app-master/new.txt"))?, "new");
        Ok(())
    }

    #[test]
    fn test_extract_twice_is_idempotent() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("app.zip");
        let owner_dir = dir.path().join("owner");
        fs::create_dir(&owner_dir)?;

        create_test_archive(&archive_path, &[("app-master/a.txt", "a")])?;

        ZipExtractor.extract(&RealRuntime, &archive_path, &owner_dir)?;
        let second = ZipExtractor.extract(&RealRuntime, &archive_path, &owner_dir)?;

        assert_eq!(second.extracted, 0);
        assert_eq!(second.skipped, 1);
        Ok(())
    }

    #[test]
    fn test_extract_archive_with_directory_entries() -> Result<()> {
        let dir = tempdir()?;
        let archive_path = dir.path().join("app.zip");
        let owner_dir = dir.path().join("owner");
        fs::create_dir(&owner_dir)?;

        {
            let file = File::create(&archive_path)?;
            let mut zip = ZipWriter::new(file);
            let options: FileOptions<()> =
                FileOptions::default().compression_method(CompressionMethod::Stored);

            zip.add_directory("app-master/", options)?;
            zip.add_directory("app-master/cfs/", options)?;

            let file_options: FileOptions<()> =
                FileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file("app-master/cfs/app.c", file_options)?;
            zip.write_all(b"int main;")?;

            zip.finish()?;
        }

        ZipExtractor.extract(&RealRuntime, &archive_path, &owner_dir)?;

        assert!(owner_dir.join("app-master/cfs").is_dir());
        assert_eq!(
            fs::read_to_string(owner_dir.join("app-master/cfs/app.c"))?,
            "int main;"
        );
        Ok(())
    }

    #[test]
    #[cfg(unix)]
    fn test_extract_archive_preserves_file_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let archive_path = dir.path().join("app.zip");
        let owner_dir = dir.path().join("owner");
        fs::create_dir(&owner_dir)?;

        {
            let file = File::create(&archive_path)?;
            let mut zip = ZipWriter::new(file);

            let options: FileOptions<()> = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o755);
            zip.start_file("app-master/cosmos/launcher.rb", options)?;
            zip.write_all(b"#!/usr/bin/env ruby")?;

            zip.finish()?;
        }

        ZipExtractor.extract(&RealRuntime, &archive_path, &owner_dir)?;

        let mode = fs::metadata(owner_dir.join("app-master/cosmos/launcher.rb"))?
            .permissions()
            .mode();
        assert!(mode & 0o111 != 0, "expected executable, mode was {:o}", mode);
        Ok(())
    }

    #[test]
    fn test_extract_corrupted_archive() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("app.zip");
        fs::write(&archive_path, "corrupted data").unwrap();

        let result = ZipExtractor.extract(&RealRuntime, &archive_path, dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_nonexistent_archive() {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("nonexistent.zip");

        let result = ZipExtractor.extract(&RealRuntime, &archive_path, dir.path());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to open archive")
        );
    }
}
