//! End-to-end runs of both jobs against a scripted `aws` CLI.

use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};
use snapwarden::aws::DEFAULT_AWS_BIN;
use snapwarden::test_support::{
    ScriptedRunner, json_created_snapshot, json_snapshots, json_volumes,
};
use snapwarden::{
    AwsCliClient, AwsCliConfig, AwsCliError, Clock, FixedClock, RetentionDays, SnapshotCreator,
    SnapshotPruner,
};

#[fixture]
fn clock() -> FixedClock {
    let now = Utc
        .with_ymd_and_hms(2024, 3, 9, 7, 5, 3)
        .single()
        .unwrap_or_else(|| panic!("fixture instant should be valid"));
    FixedClock::new(now)
}

fn client(runner: &ScriptedRunner) -> AwsCliClient<ScriptedRunner> {
    let config = AwsCliConfig::new(DEFAULT_AWS_BIN, Some(String::from("eu-west-1")), None)
        .unwrap_or_else(|err| panic!("config should build: {err}"));
    AwsCliClient::new(config, runner.clone())
}

#[rstest]
fn creator_issues_create_then_tag(clock: FixedClock) {
    let runner = ScriptedRunner::new();
    runner.push_output(
        Some(0),
        json_volumes(&[
            ("vol-1", &[("Backup", "true"), ("Name", "db")]),
            ("vol-2", &[("Name", "scratch")]),
        ]),
        "",
    );
    runner.push_output(Some(0), json_created_snapshot("snap-new"), "");
    runner.push_success();

    SnapshotCreator::new(client(&runner), clock)
        .make_snapshots()
        .unwrap_or_else(|err| panic!("snapshot run should succeed: {err}"));

    let commands = runner
        .invocations()
        .iter()
        .map(snapwarden::test_support::CommandInvocation::command_string)
        .collect::<Vec<_>>();
    assert_eq!(
        commands,
        vec![
            "aws ec2 describe-volumes --region eu-west-1 --output json",
            "aws ec2 create-snapshot --volume-id vol-1 --description Backup of db \
             --region eu-west-1 --output json",
            "aws ec2 create-tags --resources snap-new \
             --tags [{\"Key\":\"Name\",\"Value\":\"db 20240309070503\"}] --region eu-west-1",
        ]
    );
}

#[rstest]
fn pruner_deletes_only_expired_snapshots(clock: FixedClock) {
    let runner = ScriptedRunner::new();
    runner.push_output(
        Some(0),
        json_snapshots(&[
            ("snap-old", clock.now() - Duration::days(45)),
            ("snap-new", clock.now() - Duration::days(2)),
        ]),
        "",
    );
    runner.push_success();

    SnapshotPruner::new(client(&runner), clock)
        .delete_old_snapshots("123456789012", RetentionDays::default())
        .unwrap_or_else(|err| panic!("prune should succeed: {err}"));

    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 2);
    let delete = invocations
        .last()
        .unwrap_or_else(|| panic!("expected a delete invocation"));
    assert_eq!(delete.flag_value("--snapshot-id").as_deref(), Some("snap-old"));
}

#[rstest]
fn pruner_stops_on_first_cli_failure(clock: FixedClock) {
    let runner = ScriptedRunner::new();
    runner.push_output(
        Some(0),
        json_snapshots(&[
            ("snap-a", clock.now() - Duration::days(45)),
            ("snap-b", clock.now() - Duration::days(45)),
        ]),
        "",
    );
    runner.push_failure(254, "An error occurred (InvalidSnapshot.InUse)");

    let err = SnapshotPruner::new(client(&runner), clock)
        .delete_old_snapshots("123456789012", RetentionDays::default())
        .expect_err("delete should fail");

    assert!(matches!(err, AwsCliError::CommandFailure { .. }));
    assert_eq!(runner.invocations().len(), 2, "snap-b must not be attempted");
}
