//! Integration tests for imgcache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    /// Command isolated from the user's config file and install path
    fn imgcache(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("imgcache");
        cmd.env("IMGCACHE_CONFIG", dir.path().join("config.toml"))
            .env("IMGCACHE_INSTALL_PATH", dir.path().join("images"))
            .env("CI", "1");
        cmd
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cluster container image cache"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("imgcache"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("partition"));
    }

    #[test]
    fn config_init_writes_file() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        let written = fs::read_to_string(dir.path().join("config.toml")).unwrap();
        assert!(written.contains("[import]"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[cache\n").unwrap();

        imgcache(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn check_missing_install_path_fails() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .args(["check", "ubuntu:22.04", "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Install path"))
            .stdout(predicate::str::contains("does not exist"));
    }

    #[test]
    fn check_missing_subdirectory_fails() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();

        imgcache(&dir)
            .args(["check", "ubuntu:22.04", "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Subdirectory path"));
    }

    #[test]
    fn check_finds_cached_image() {
        let dir = TempDir::new().unwrap();
        let slot = dir.path().join("images").join("runA");
        fs::create_dir_all(&slot).unwrap();
        fs::write(slot.join("img.sqsh"), b"hsqs").unwrap();

        imgcache(&dir)
            .args(["check", "ubuntu:22.04", "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("img.sqsh"));
    }

    #[test]
    fn check_accepts_local_image_path() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("local.sqsh");
        fs::write(&local, b"hsqs").unwrap();

        imgcache(&dir)
            .args(["check", local.to_str().unwrap(), "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Container image file path is valid."));
    }

    #[test]
    fn check_json_output() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .args(["check", "ubuntu:22.04", "-d", "runA", "-f", "img.sqsh", "--format", "json"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("\"success\": false"))
            .stdout(predicate::str::contains("\"failure\": \"path_missing\""));
    }

    #[test]
    fn evict_absent_slot_succeeds() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();

        imgcache(&dir)
            .args(["evict", "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached container image found"));
        assert!(!dir.path().join("images").join("runA").exists());
    }

    #[test]
    fn uninstall_removes_emptied_subdirectory() {
        let dir = TempDir::new().unwrap();
        let slot = dir.path().join("images").join("runA");
        fs::create_dir_all(&slot).unwrap();
        fs::write(slot.join("img.sqsh"), b"hsqs").unwrap();

        imgcache(&dir)
            .args(["uninstall", "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Subdirectory removed successfully."));
        assert!(!slot.exists());
    }

    #[test]
    fn uninstall_keeps_shared_subdirectory() {
        let dir = TempDir::new().unwrap();
        let slot = dir.path().join("images").join("runA");
        fs::create_dir_all(&slot).unwrap();
        fs::write(slot.join("img.sqsh"), b"hsqs").unwrap();
        fs::write(slot.join("other.sqsh"), b"hsqs").unwrap();

        imgcache(&dir)
            .args(["uninstall", "-d", "runA", "-f", "img.sqsh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("uninstalled successfully"));
        assert!(slot.join("other.sqsh").exists());
    }

    #[test]
    fn evict_refuses_subdirectory_outside_install_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("images")).unwrap();
        let victim = dir.path().join("victim.sqsh");
        fs::write(&victim, b"hsqs").unwrap();

        imgcache(&dir)
            .args(["evict", "-d", "..", "-f", "victim.sqsh"])
            .assert()
            .failure()
            .stdout(predicate::str::contains("Invalid cache subdirectory"));
        assert!(victim.exists());
    }

    #[test]
    fn populate_requires_slot() {
        let dir = TempDir::new().unwrap();
        imgcache(&dir)
            .args(["populate", "ubuntu:22.04"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--subdir"));
    }
}
