// SPDX-FileCopyrightText: 2026 Faxline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relay pipeline and retention sweeper behavior over the mock backend.

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use faxline_core::{RelayOutcome, RemoteFile, SweepReport, WatchEvent};
use faxline_relay::{DirectoryWatcher, ReplaySummary};
use faxline_test_utils::{MockBackend, TestHarness};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const ACME_FILE: &str = "0312345678 20260301120000.pdf";

fn acme_harness() -> TestHarness {
    TestHarness::builder()
        .with_directory_entry("0312345678", "Acme Co")
        .build()
        .unwrap()
}

async fn wait_for_notifications(harness: &TestHarness, count: usize) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while harness.notifier.sent_count().await < count {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("notifications did not arrive in time");
}

#[tokio::test]
async fn two_events_for_one_file_notify_once() {
    let harness = acme_harness();
    let path = harness.drop_file(ACME_FILE).unwrap();
    let cancel = CancellationToken::new();

    let first = harness
        .pipeline
        .handle_event(WatchEvent::file(path.clone()), &cancel)
        .await;
    let second = harness
        .pipeline
        .handle_event(WatchEvent::file(path), &cancel)
        .await;

    assert!(matches!(first, RelayOutcome::Done { .. }));
    assert_eq!(second, RelayOutcome::Duplicate);
    assert_eq!(harness.notifier.sent_count().await, 1);
    assert_eq!(harness.backend.uploaded().await, vec![ACME_FILE.to_string()]);
}

#[tokio::test]
async fn relayed_file_is_announced_with_resolved_name_and_link() {
    let harness = acme_harness();
    let path = harness.drop_file(ACME_FILE).unwrap();

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path), &CancellationToken::new())
        .await;

    let link = MockBackend::link_for(ACME_FILE);
    assert_eq!(
        outcome,
        RelayOutcome::Done {
            display_name: "Acme Co".into(),
            link: link.clone(),
        }
    );
    let sent = harness.notifier.sent_messages().await;
    assert_eq!(sent[0].display_name, "Acme Co");
    assert_eq!(sent[0].share_link.as_deref(), Some(link.as_str()));
}

#[tokio::test]
async fn unresolvable_name_falls_back_to_file_name() {
    let harness = acme_harness();
    let path = harness.drop_file("scan.pdf").unwrap();

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path), &CancellationToken::new())
        .await;

    assert!(matches!(outcome, RelayOutcome::Done { ref display_name, .. } if display_name == "scan.pdf"));
}

#[tokio::test]
async fn directories_and_other_extensions_are_ignored() {
    let harness = acme_harness();
    let cancel = CancellationToken::new();
    let txt = harness.drop_file("notes.txt").unwrap();

    let dir_event = WatchEvent {
        path: harness.watch_dir.join("archive.pdf"),
        is_directory: true,
    };
    assert_eq!(harness.pipeline.handle_event(dir_event, &cancel).await, RelayOutcome::Ignored);
    assert_eq!(
        harness.pipeline.handle_event(WatchEvent::file(txt), &cancel).await,
        RelayOutcome::Ignored
    );
    assert_eq!(harness.notifier.sent_count().await, 0);
    assert!(harness.pipeline.notified_names().await.is_empty());
}

#[tokio::test]
async fn extension_match_is_case_insensitive() {
    let harness = acme_harness();
    let path = harness.drop_file("0312345678 20260301120000.PDF").unwrap();

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path), &CancellationToken::new())
        .await;
    assert!(matches!(outcome, RelayOutcome::Done { .. }));
}

#[tokio::test]
async fn folder_is_ensured_once_per_run() {
    let harness = acme_harness();
    let cancel = CancellationToken::new();
    for name in ["a 20260301120000.pdf", "b 20260301120001.pdf"] {
        let path = harness.drop_file(name).unwrap();
        harness.pipeline.handle_event(WatchEvent::file(path), &cancel).await;
    }
    assert_eq!(harness.backend.ensured_folders().await, vec!["FAX".to_string()]);
}

#[tokio::test]
async fn failed_upload_is_journaled_not_notified() {
    let harness = acme_harness();
    let path = harness.drop_file(ACME_FILE).unwrap();
    harness.backend.fail_uploads_of(ACME_FILE).await;

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path.clone()), &CancellationToken::new())
        .await;

    assert_eq!(outcome, RelayOutcome::Journaled);
    assert_eq!(harness.journal_entries().await.unwrap(), vec![path]);
    assert_eq!(harness.notifier.sent_count().await, 0);
}

#[tokio::test]
async fn failure_notice_sent_when_enabled() {
    let harness = TestHarness::builder().with_failure_notice().build().unwrap();
    let path = harness.drop_file(ACME_FILE).unwrap();
    harness.backend.fail_uploads_of(ACME_FILE).await;

    harness
        .pipeline
        .handle_event(WatchEvent::file(path), &CancellationToken::new())
        .await;

    let sent = harness.notifier.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].share_link, None);
}

#[tokio::test]
async fn notification_failure_does_not_journal() {
    let harness = acme_harness();
    harness.notifier.set_failing(true);
    let path = harness.drop_file(ACME_FILE).unwrap();

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path), &CancellationToken::new())
        .await;

    assert!(matches!(outcome, RelayOutcome::Done { .. }));
    assert!(harness.journal_entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn shutdown_during_debounce_journals_file() {
    let harness = TestHarness::builder()
        .with_debounce(Duration::from_secs(3600))
        .build()
        .unwrap();
    let path = harness.drop_file(ACME_FILE).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path.clone()), &cancel)
        .await;

    assert_eq!(outcome, RelayOutcome::Journaled);
    assert_eq!(harness.journal_entries().await.unwrap(), vec![path]);
    assert!(harness.backend.uploaded().await.is_empty());
}

#[tokio::test]
async fn replay_keeps_only_entries_that_fail_again() {
    let harness = acme_harness();
    let a = harness.drop_file("a 20260301120000.pdf").unwrap();
    let b = harness.drop_file("b 20260301120001.pdf").unwrap();
    harness.journal.append(&a).await.unwrap();
    harness.journal.append(&b).await.unwrap();
    harness.backend.fail_uploads_of("a 20260301120000.pdf").await;

    let summary = harness.pipeline.replay_journal().await.unwrap();

    assert_eq!(
        summary,
        ReplaySummary {
            succeeded: 1,
            failed: 1,
            dropped: 0,
        }
    );
    assert_eq!(harness.journal_entries().await.unwrap(), vec![a]);
    assert_eq!(harness.notifier.sent_count().await, 1);
}

#[tokio::test]
async fn file_journaled_during_outage_is_sent_on_replay() {
    let harness = acme_harness();
    let path = harness.drop_file(ACME_FILE).unwrap();
    harness.backend.fail_uploads_of(ACME_FILE).await;
    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path.clone()), &CancellationToken::new())
        .await;
    assert_eq!(outcome, RelayOutcome::Journaled);

    // Next run: a fresh pipeline over a reachable backend.
    let next_run = TestHarness::builder()
        .with_directory_entry("0312345678", "Acme Co")
        .build()
        .unwrap();
    next_run.journal.rewrite(&[path]).await.unwrap();
    let summary = next_run.pipeline.replay_journal().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert!(next_run.journal_entries().await.unwrap().is_empty());
    let sent = next_run.notifier.sent_messages().await;
    assert_eq!(sent[0].display_name, "Acme Co");
}

#[tokio::test]
async fn relative_event_path_is_journaled_absolute() {
    let harness = acme_harness();
    harness.backend.fail_uploads_of(ACME_FILE).await;
    let relative = std::path::PathBuf::from("inbox").join(ACME_FILE);

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(relative.clone()), &CancellationToken::new())
        .await;

    assert_eq!(outcome, RelayOutcome::Journaled);
    let entries = harness.journal_entries().await.unwrap();
    assert_eq!(entries, vec![std::env::current_dir().unwrap().join(relative)]);
    assert!(entries[0].is_absolute());
}

#[tokio::test]
async fn replay_drops_missing_files_and_repeats() {
    let harness = acme_harness();
    let present = harness.drop_file(ACME_FILE).unwrap();
    let gone = harness.watch_dir.join("gone 20260301120000.pdf");
    harness.journal.append(&gone).await.unwrap();
    harness.journal.append(&present).await.unwrap();
    harness.journal.append(&present).await.unwrap();

    let summary = harness.pipeline.replay_journal().await.unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.dropped, 2);
    assert!(harness.journal_entries().await.unwrap().is_empty());
    assert_eq!(harness.notifier.sent_count().await, 1);
}

#[tokio::test]
async fn replayed_file_is_not_announced_again_by_live_event() {
    let harness = acme_harness();
    let path = harness.drop_file(ACME_FILE).unwrap();
    harness.journal.append(&path).await.unwrap();

    harness.pipeline.replay_journal().await.unwrap();
    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path), &CancellationToken::new())
        .await;

    assert_eq!(outcome, RelayOutcome::Duplicate);
    assert_eq!(harness.notifier.sent_count().await, 1);
}

#[tokio::test]
async fn rejected_token_refresh_journals_file_without_sign_in() {
    let harness = acme_harness();
    harness.authenticator.set_failing(true);
    let path = harness.drop_file(ACME_FILE).unwrap();

    let outcome = harness
        .pipeline
        .handle_event(WatchEvent::file(path.clone()), &CancellationToken::new())
        .await;

    assert_eq!(outcome, RelayOutcome::Journaled);
    assert_eq!(harness.journal_entries().await.unwrap(), vec![path]);
    assert!(harness.backend.uploaded().await.is_empty());
    assert_eq!(harness.notifier.sent_count().await, 0);
    assert!(harness.credentials.get_valid().await.unwrap_err().is_auth());
    assert_eq!(harness.authenticator.sign_ins(), 0);
}

#[tokio::test]
async fn worker_keeps_running_after_auth_failure() {
    let harness = acme_harness();
    harness.authenticator.set_failing(true);
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(harness.pipeline.clone().run(rx, cancel.clone()));

    let rejected = harness.drop_file("a 20260301120000.pdf").unwrap();
    tx.send(WatchEvent::file(rejected.clone())).await.unwrap();
    tokio::time::timeout(Duration::from_secs(10), async {
        while harness.authenticator.calls() == 0 || harness.pipeline.notified_names().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("first event was not handled");

    harness.authenticator.set_failing(false);
    let accepted = harness.drop_file(ACME_FILE).unwrap();
    tx.send(WatchEvent::file(accepted)).await.unwrap();
    wait_for_notifications(&harness, 1).await;

    cancel.cancel();
    worker.await.unwrap();

    assert_eq!(harness.journal_entries().await.unwrap(), vec![rejected]);
    assert_eq!(harness.backend.uploaded().await, vec![ACME_FILE.to_string()]);
    assert_eq!(harness.notifier.sent_messages().await[0].display_name, "Acme Co");
    assert_eq!(harness.authenticator.sign_ins(), 0);
}

#[tokio::test]
async fn worker_relays_events_from_channel() {
    let harness = acme_harness();
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(harness.pipeline.clone().run(rx, cancel.clone()));

    let path = harness.drop_file(ACME_FILE).unwrap();
    tx.send(WatchEvent::file(path)).await.unwrap();
    wait_for_notifications(&harness, 1).await;

    cancel.cancel();
    worker.await.unwrap();

    let sent = harness.notifier.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].display_name, "Acme Co");
    assert_eq!(sent[0].share_link, Some(MockBackend::link_for(ACME_FILE)));
    assert!(harness.journal_entries().await.unwrap().is_empty());
    assert!(harness.pipeline.notified_names().await.contains(ACME_FILE));
}

#[tokio::test]
async fn buffered_events_are_journaled_on_shutdown() {
    let harness = acme_harness();
    let (tx, rx) = mpsc::channel(8);
    let a = harness.drop_file("a 20260301120000.pdf").unwrap();
    let b = harness.drop_file("b 20260301120001.pdf").unwrap();
    tx.send(WatchEvent::file(a.clone())).await.unwrap();
    tx.send(WatchEvent::file(b.clone())).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    harness.pipeline.clone().run(rx, cancel).await;

    assert_eq!(harness.journal_entries().await.unwrap(), vec![a, b]);
    assert!(harness.backend.uploaded().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_dropped_into_watched_directory_end_to_end() {
    let harness = acme_harness();
    let (tx, rx) = mpsc::channel(16);
    let _watcher = DirectoryWatcher::start(&harness.watch_dir, tx).unwrap();
    let cancel = CancellationToken::new();
    let worker = tokio::spawn(harness.pipeline.clone().run(rx, cancel.clone()));

    harness.drop_file(ACME_FILE).unwrap();
    wait_for_notifications(&harness, 1).await;

    cancel.cancel();
    worker.await.unwrap();
    assert_eq!(harness.notifier.sent_count().await, 1);
    assert!(harness.journal_entries().await.unwrap().is_empty());
}

fn remote(name: &str, age: ChronoDuration) -> RemoteFile {
    RemoteFile {
        id: format!("id-{name}"),
        name: name.to_string(),
        created_at: Utc::now() - age,
        parent_folder: "FAX".into(),
    }
}

#[tokio::test]
async fn retention_boundary_is_whole_days() {
    let harness = acme_harness();
    harness
        .backend
        .set_remote_files(vec![
            remote("old.pdf", ChronoDuration::days(7)),
            remote(
                "young.pdf",
                ChronoDuration::days(6) + ChronoDuration::hours(23),
            ),
        ])
        .await;

    let report = harness.sweeper.sweep_once(Utc::now()).await.unwrap();

    assert_eq!(
        report,
        SweepReport {
            scanned: 2,
            deleted: 1,
            failed: 0,
        }
    );
    assert_eq!(harness.backend.revoked().await, vec!["old.pdf".to_string()]);
    assert_eq!(harness.backend.deleted().await, vec!["old.pdf".to_string()]);
}

#[tokio::test]
async fn sweep_continues_past_failed_delete() {
    let harness = acme_harness();
    harness
        .backend
        .set_remote_files(vec![
            remote("stuck.pdf", ChronoDuration::days(10)),
            remote("old.pdf", ChronoDuration::days(8)),
        ])
        .await;
    harness.backend.fail_deletes_of("stuck.pdf").await;

    let report = harness.sweeper.sweep_once(Utc::now()).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(harness.backend.deleted().await, vec!["old.pdf".to_string()]);
}

#[tokio::test]
async fn sweep_acquires_credentials_first() {
    let harness = acme_harness();
    harness.sweeper.sweep_once(Utc::now()).await.unwrap();
    harness.sweeper.sweep_once(Utc::now()).await.unwrap();

    assert_eq!(harness.authenticator.calls(), 1);
    assert_eq!(harness.store.save_count(), 1);
}

#[tokio::test]
#[tracing_test::traced_test]
async fn empty_sweep_logs_distinctly() {
    let harness = acme_harness();
    harness
        .backend
        .set_remote_files(vec![remote("fresh.pdf", ChronoDuration::hours(1))])
        .await;

    let report = harness.sweeper.sweep_once(Utc::now()).await.unwrap();

    assert_eq!(report.deleted, 0);
    assert!(logs_contain("retention sweep found nothing to delete"));
}

#[tokio::test]
async fn sweeper_loop_runs_at_startup_and_stops_on_cancel() {
    let harness = acme_harness();
    harness
        .backend
        .set_remote_files(vec![remote("old.pdf", ChronoDuration::days(30))])
        .await;
    let cancel = CancellationToken::new();
    let task = tokio::spawn(harness.sweeper.clone().run(cancel.clone()));

    tokio::time::timeout(Duration::from_secs(10), async {
        while harness.backend.deleted().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("startup sweep did not run");

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn retention_threshold_is_configurable() {
    let harness = TestHarness::builder().with_threshold_days(30).build().unwrap();
    harness
        .backend
        .set_remote_files(vec![
            remote("month.pdf", ChronoDuration::days(30)),
            remote("week.pdf", ChronoDuration::days(8)),
        ])
        .await;

    let report = harness.sweeper.sweep_once(Utc::now()).await.unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(harness.backend.deleted().await, vec!["month.pdf".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn sweeper_loop_survives_failed_sweep() {
    let harness = acme_harness();
    harness.authenticator.set_failing(true);
    harness
        .backend
        .set_remote_files(vec![remote("old.pdf", ChronoDuration::days(30))])
        .await;
    let cancel = CancellationToken::new();
    let task = tokio::spawn(harness.sweeper.clone().run(cancel.clone()));

    tokio::time::timeout(Duration::from_secs(10), async {
        while harness.authenticator.calls() == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("startup sweep did not run");
    assert!(harness.backend.deleted().await.is_empty());

    harness.authenticator.set_failing(false);
    tokio::time::advance(Duration::from_secs(86_400)).await;
    tokio::time::timeout(Duration::from_secs(10), async {
        while harness.backend.deleted().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("second sweep did not run");

    cancel.cancel();
    task.await.unwrap();
    assert_eq!(harness.authenticator.sign_ins(), 0);
}
