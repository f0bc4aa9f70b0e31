//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use predicates::str::contains;

#[test]
fn cli_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("snapwarden");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("create").and(contains("prune")));
}

#[test]
fn prune_without_account_fails_before_calling_aws() {
    let mut cmd = cargo_bin_cmd!("snapwarden");
    cmd.env("SNAPWARDEN_AWS_BIN", "snapwarden-missing-aws")
        .env_remove("RUST_LOG")
        .args(["prune", "--event", r#"{"days":5}"#])
        .assert()
        .failure()
        .stderr(contains("missing required field `account`"));
}

#[test]
fn prune_rejects_negative_days() {
    let mut cmd = cargo_bin_cmd!("snapwarden");
    cmd.env("SNAPWARDEN_AWS_BIN", "snapwarden-missing-aws")
        .args(["prune", "--event", r#"{"account":"123","days":-1}"#])
        .assert()
        .failure()
        .stderr(contains("must not be negative"));
}

#[test]
fn inline_and_file_events_conflict() {
    let mut cmd = cargo_bin_cmd!("snapwarden");
    cmd.args(["create", "--event", "{}", "--event-file", "event.json"])
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));
}

#[cfg(unix)]
mod stub_aws {
    use std::os::unix::fs::PermissionsExt;

    use assert_cmd::cargo::cargo_bin_cmd;
    use camino::Utf8PathBuf;
    use cap_std::{ambient_authority, fs_utf8::Dir};
    use tempfile::TempDir;

    const STUB_SCRIPT: &str = r#"#!/bin/sh
printf '%s\n' "$2 $3 $4" >> "$(dirname "$0")/calls.log"
case "$2" in
  describe-volumes)
    echo '{"Volumes":[{"VolumeId":"vol-1","Tags":[{"Key":"Backup","Value":"true"},{"Key":"Name","Value":"db"}]},{"VolumeId":"vol-2","Tags":[{"Key":"Name","Value":"scratch"}]}]}'
    ;;
  create-snapshot)
    echo '{"SnapshotId":"snap-9","State":"pending"}'
    ;;
  describe-snapshots)
    echo '{"Snapshots":[{"SnapshotId":"snap-old","StartTime":"2000-01-01T00:00:00.000Z"},{"SnapshotId":"snap-future","StartTime":"2999-01-01T00:00:00.000Z"}]}'
    ;;
esac
"#;

    struct StubAws {
        _tmp: TempDir,
        dir: Dir,
        bin: Utf8PathBuf,
    }

    impl StubAws {
        fn install() -> Self {
            let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
            let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
                .unwrap_or_else(|path| panic!("temp dir should be utf8: {}", path.display()));
            let dir = Dir::open_ambient_dir(&root, ambient_authority())
                .unwrap_or_else(|err| panic!("open temp dir: {err}"));
            dir.write("aws", STUB_SCRIPT)
                .unwrap_or_else(|err| panic!("write stub: {err}"));
            let bin = root.join("aws");
            std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755))
                .unwrap_or_else(|err| panic!("chmod stub: {err}"));
            Self {
                _tmp: tmp,
                dir,
                bin,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.dir
                .read_to_string("calls.log")
                .unwrap_or_else(|err| panic!("read call log: {err}"))
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    fn snapwarden(stub: &StubAws) -> assert_cmd::Command {
        let mut cmd = cargo_bin_cmd!("snapwarden");
        cmd.env("SNAPWARDEN_AWS_BIN", stub.bin.as_str())
            .env_remove("SNAPWARDEN_REGION")
            .env_remove("SNAPWARDEN_PROFILE")
            .env_remove("SNAPWARDEN_RETENTION_DAYS")
            .env_remove("SNAPWARDEN_LOG_FILTER")
            .env_remove("SNAPWARDEN_JSON_LOGS")
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn create_snapshots_and_tags_backup_volumes() {
        let stub = StubAws::install();

        snapwarden(&stub).arg("create").assert().success();

        assert_eq!(
            stub.calls(),
            vec![
                "describe-volumes --output json",
                "create-snapshot --volume-id vol-1",
                "create-tags --resources snap-9",
            ]
        );
    }

    #[test]
    fn prune_deletes_only_expired_snapshots() {
        let stub = StubAws::install();

        snapwarden(&stub)
            .args(["prune", "--event", r#"{"account":"123","days":30}"#])
            .assert()
            .success();

        assert_eq!(
            stub.calls(),
            vec![
                "describe-snapshots --owner-ids 123",
                "delete-snapshot --snapshot-id snap-old",
            ]
        );
    }
}
