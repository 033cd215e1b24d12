use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::Server;
use predicates::prelude::*;
use std::io::prelude::*;
use std::path::Path;
use tempfile::tempdir;
use zip::ZipWriter;
use zip::write::FileOptions;

fn create_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        let options: FileOptions<()> = FileOptions::default();
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

fn package_zip(repo: &str) -> Vec<u8> {
    let top = format!("{}-master", repo);
    create_zip(&[
        (
            &format!("{}/satpkgr.json", top),
            r#"{"name": "demo", "cosmos": {"launcher": "launcher.rb"}}"#,
        ),
        (&format!("{}/cosmos/launcher.rb", top), "puts 'hi'"),
    ])
}

fn satpkgr(root: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("satpkgr"));
    cmd.env_remove("SATPKGR_HOST")
        .env_remove("GITHUB_TOKEN")
        .arg("--root")
        .arg(root);
    cmd
}

fn write_project(root: &Path, manifest: &str, launcher: &str) {
    std::fs::write(root.join("satpkgr.json"), manifest).unwrap();
    let launcher_dir = root.join("config/tools/launcher");
    std::fs::create_dir_all(&launcher_dir).unwrap();
    std::fs::write(launcher_dir.join("launcher.txt"), launcher).unwrap();
}

#[test]
fn test_init_writes_manifest() {
    let root_dir = tempdir().unwrap();

    satpkgr(root_dir.path()).arg("init").assert().success();

    let content = std::fs::read_to_string(root_dir.path().join("satpkgr.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["dependencies"], serde_json::json!({}));
    assert!(json["cosmos"].get("launcher").is_some());
}

#[test]
fn test_end_to_end_install_and_uninstall() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_archive = server
        .mock("GET", "/owner/demo/archive/master.zip")
        .with_status(200)
        .with_body(package_zip("demo"))
        .create();

    let root_dir = tempdir().unwrap();
    let root = root_dir.path();
    write_project(
        root,
        r#"{"name": "ground", "dependencies": {}}"#,
        "TOOL \"Existing\" \"LAUNCH existing.rb\"",
    );

    satpkgr(root)
        .arg("--host")
        .arg(&url)
        .arg("install")
        .arg("owner/demo")
        .assert()
        .success();

    assert!(
        root.join("sat_modules/owner/demo-master/cosmos/launcher.rb")
            .exists()
    );
    let launcher = std::fs::read_to_string(root.join("config/tools/launcher/launcher.txt")).unwrap();
    assert_eq!(
        launcher,
        "TOOL \"Existing\" \"LAUNCH existing.rb\"\n\
         TOOL \"demo\" \"LAUNCH ../sat_modules/owner/demo-master/cosmos/launcher.rb\""
    );
    let manifest = std::fs::read_to_string(root.join("satpkgr.json")).unwrap();
    assert!(manifest.contains("\"owner/demo\""));

    satpkgr(root)
        .arg("uninstall")
        .arg("owner/demo")
        .assert()
        .success();

    assert!(!root.join("sat_modules/owner").exists());
    let launcher = std::fs::read_to_string(root.join("config/tools/launcher/launcher.txt")).unwrap();
    assert_eq!(launcher, "TOOL \"Existing\" \"LAUNCH existing.rb\"\n");
    let manifest = std::fs::read_to_string(root.join("satpkgr.json")).unwrap();
    assert!(!manifest.contains("owner/demo"));
}

#[test]
fn test_install_all_from_manifest() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_a = server
        .mock("GET", "/owner/alpha/archive/master.zip")
        .with_status(200)
        .with_body(package_zip("alpha"))
        .create();
    let _mock_b = server
        .mock("GET", "/owner/beta/archive/master.zip")
        .with_status(200)
        .with_body(package_zip("beta"))
        .create();

    let root_dir = tempdir().unwrap();
    let root = root_dir.path();
    write_project(
        root,
        r#"{"dependencies": {"owner/alpha": "*", "owner/beta": "*"}}"#,
        "",
    );

    satpkgr(root)
        .arg("--host")
        .arg(&url)
        .arg("install")
        .assert()
        .success();

    assert!(root.join("sat_modules/owner/alpha-master").is_dir());
    assert!(root.join("sat_modules/owner/beta-master").is_dir());
    let launcher = std::fs::read_to_string(root.join("config/tools/launcher/launcher.txt")).unwrap();
    let alpha = launcher.find("TOOL \"alpha\"").unwrap();
    let beta = launcher.find("TOOL \"beta\"").unwrap();
    assert!(alpha < beta);
}

#[test]
fn test_install_all_without_dependencies_fails() {
    let root_dir = tempdir().unwrap();
    let root = root_dir.path();
    write_project(root, r#"{"dependencies": {}}"#, "");

    satpkgr(root)
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No packages are listed"));

    assert!(!root.join("sat_modules").exists());
}

#[test]
fn test_install_missing_repository_fails() {
    let mut server = Server::new();
    let url = server.url();

    let _mock_archive = server
        .mock("GET", "/owner/missing/archive/master.zip")
        .with_status(404)
        .create();

    let root_dir = tempdir().unwrap();
    let root = root_dir.path();
    let manifest = r#"{"dependencies": {}}"#;
    write_project(root, manifest, "");

    satpkgr(root)
        .arg("--host")
        .arg(&url)
        .arg("install")
        .arg("owner/missing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("404"));

    assert_eq!(
        std::fs::read_to_string(root.join("satpkgr.json")).unwrap(),
        manifest
    );
}

#[test]
fn test_commands_without_manifest_fail() {
    let root_dir = tempdir().unwrap();

    satpkgr(root_dir.path())
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("satpkgr init"));
}

#[test]
fn test_bad_package_address_fails() {
    let root_dir = tempdir().unwrap();
    write_project(root_dir.path(), r#"{"dependencies": {}}"#, "");

    satpkgr(root_dir.path())
        .arg("uninstall")
        .arg("just-a-name")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad package address"));
}

#[test]
fn test_uninstall_not_installed_fails() {
    let root_dir = tempdir().unwrap();
    write_project(root_dir.path(), r#"{"dependencies": {}}"#, "");

    satpkgr(root_dir.path())
        .arg("uninstall")
        .arg("owner/demo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn test_clean_removes_package_directory() {
    let root_dir = tempdir().unwrap();
    let root = root_dir.path();
    write_project(root, r#"{"dependencies": {}}"#, "");
    std::fs::create_dir_all(root.join("sat_modules/owner/demo-master")).unwrap();

    satpkgr(root).arg("clean").assert().success();

    assert!(!root.join("sat_modules").exists());
}

#[test]
fn test_install_parent_directory_address_fails() {
    let root_dir = tempdir().unwrap();
    let root = root_dir.path();
    write_project(root, r#"{"dependencies": {}}"#, "");

    satpkgr(root)
        .arg("--host")
        .arg("http://127.0.0.1:9")
        .arg("install")
        .arg("../evil")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Bad package address"));

    assert!(!root.join("evil.zip").exists());
    assert!(!root.join("sat_modules").exists());
}
