//! 통합 테스트 -- 탐지부터 알림 확정까지 전체 흐름 검증
//!
//! 실제 SQLite 파일과 mock 전송기로 여러 실행에 걸친 불변식을 확인합니다.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use dbalarm_core::error::NotifyError;
use dbalarm_engine::{AlarmStore, Notifier, ReconcileEngine};

struct ScriptedNotifier {
    fail: AtomicBool,
    sent: Mutex<Vec<String>>,
}

impl ScriptedNotifier {
    fn new(fail: bool) -> Self {
        Self {
            fail: AtomicBool::new(fail),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().expect("lock").len()
    }
}

impl Notifier for &ScriptedNotifier {
    async fn send(&self, _subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("unreachable".to_owned()));
        }
        self.sent.lock().expect("lock").push(body.to_owned());
        Ok(())
    }
}

fn engine_at<'a>(
    path: &Path,
    notifier: &'a ScriptedNotifier,
) -> ReconcileEngine<&'a ScriptedNotifier> {
    let store = AlarmStore::open(path).expect("store should open");
    ReconcileEngine::new(store, notifier).expect("engine should build")
}

const LOG: &[&str] = &[
    "2024-01-01T00:00:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)",
    "2024-01-01T00:05:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (10, 10, 0)",
    "2024-01-01T00:10:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (0, 0, 0)",
];

/// 빈 저장소 + 성공하는 전송기: 매칭 라인만 알람이 되고 즉시 확정됨
#[tokio::test]
async fn full_pass_records_and_confirms_matching_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("alarms.db");
    let notifier = ScriptedNotifier::new(false);

    let report = engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("run");

    assert_eq!(report.detections, 2);
    assert_eq!(
        report.new_alarms,
        vec!["2024-01-01T00:00:00+0000", "2024-01-01T00:10:00+0000"]
    );
    assert!(report.new_alarms_notified);

    let store = AlarmStore::open(&db).expect("reopen");
    let alarms = store.alarms().expect("alarms");
    assert_eq!(alarms.len(), 2);
    for alarm in &alarms {
        assert!(alarm.notified_at.is_some());
    }
    // 배치 전체가 같은 notified_at 값을 공유
    let stamps: HashSet<_> = alarms.iter().map(|a| a.notified_at.clone()).collect();
    assert_eq!(stamps.len(), 1);
}

/// 같은 로그를 연속 두 번 실행: 키는 중복되지 않고 두 번째 실행은 조용함
#[tokio::test]
async fn overlapping_runs_never_duplicate_alarms() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("alarms.db");
    let notifier = ScriptedNotifier::new(false);

    engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("first run");
    let report = engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("second run");

    assert!(report.new_alarms.is_empty());
    assert_eq!(report.already_known, 2);
    assert_eq!(notifier.sent_count(), 1);

    let store = AlarmStore::open(&db).expect("reopen");
    assert_eq!(store.alarms().expect("alarms").len(), 2);
}

/// 전송 실패 후 재실행: Phase A가 flush하고 재삽입은 없음 (크래시 안전성)
#[tokio::test]
async fn failed_delivery_is_retried_by_next_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("alarms.db");
    let notifier = ScriptedNotifier::new(true);

    let report = engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("failing run");
    assert_eq!(report.pending_after, 2);
    assert_eq!(notifier.sent_count(), 0);

    // 전송 복구 후, 새 프로세스처럼 저장소를 다시 열어 실행
    notifier.fail.store(false, Ordering::SeqCst);
    let report = engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("retry run");

    assert_eq!(report.flushed, 2);
    assert!(report.new_alarms.is_empty());
    assert_eq!(report.pending_after, 0);
    assert_eq!(notifier.sent_count(), 1);
}

/// 확정된 notified_at은 이후 실행에서 절대 변하지 않음 (단조성)
#[tokio::test]
async fn notified_at_is_immutable_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("alarms.db");
    let notifier = ScriptedNotifier::new(false);

    engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("first run");
    let before = AlarmStore::open(&db)
        .expect("open")
        .alarms()
        .expect("alarms");

    engine_at(&db, &notifier)
        .run(LOG.iter().copied())
        .await
        .expect("second run");
    let after = AlarmStore::open(&db)
        .expect("open")
        .alarms()
        .expect("alarms");

    assert_eq!(before, after);
}

/// 매칭 없는 로그는 상태를 전혀 바꾸지 않음
#[tokio::test]
async fn non_matching_log_leaves_store_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("alarms.db");
    let notifier = ScriptedNotifier::new(false);

    let lines = [
        "2024-01-01T00:05:00+0000 [dbase#info] DB Stats Readings [Total, OK, NOK] = (10, 10, 0)",
        "noise",
    ];
    let report = engine_at(&db, &notifier)
        .run(lines.iter().copied())
        .await
        .expect("run");

    assert_eq!(report.detections, 0);
    assert_eq!(notifier.sent_count(), 0);
    let store = AlarmStore::open(&db).expect("reopen");
    assert!(store.alarms().expect("alarms").is_empty());
}
