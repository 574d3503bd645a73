//! 조정 엔진 -- 탐지/중복제거/알림 전달의 오케스트레이션
//!
//! [`ReconcileEngine`]은 실행마다 두 단계를 항상 같은 순서로 수행합니다.
//!
//! # 실행 흐름
//! ```text
//! Phase A (flush): pending 알람 조회 -> 일괄 알림 -> 성공 시에만 mark_notified
//! Phase B (detect): 라인 스캔 -> 기존 키와 diff -> 새 알람 삽입(커밋) -> 알림
//! ```
//!
//! 삽입이 전송 시도보다 먼저 커밋되므로 전송 실패나 크래시가 나도 정보가
//! 유실되지 않고, mark_notified는 전송 성공 확인 후에만 실행되므로 중복
//! 알림도 발생하지 않습니다. 전송에 실패한 알람은 pending으로 남아 다음
//! 실행의 Phase A에서 재시도됩니다.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info};

use dbalarm_core::error::{DbAlarmError, StorageError};

use crate::extract::SignatureScanner;
use crate::notify::Notifier;
use crate::store::AlarmStore;

/// 한 번의 실행 결과 요약
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// 스캔한 입력 라인 수
    pub lines_scanned: usize,
    /// 실패 시그니처 탐지 수 (파일 내 중복 제거 후)
    pub detections: usize,
    /// 이미 저장소에 있던 탐지 수
    pub already_known: usize,
    /// 이번 실행에서 새로 기록된 알람 키 (오름차순)
    pub new_alarms: Vec<String>,
    /// Phase A에서 전달 확인된 알람 수
    pub flushed: usize,
    /// Phase B의 새 알람 알림이 전달 확인되었는지 여부
    pub new_alarms_notified: bool,
    /// 실행 종료 시점의 pending 알람 수
    pub pending_after: usize,
}

/// 조정 엔진
///
/// 저장소와 알림 전송기를 소유하며, 전송기는 trait으로 주입되어
/// 테스트에서 mock으로 대체할 수 있습니다.
pub struct ReconcileEngine<N: Notifier> {
    scanner: SignatureScanner,
    store: AlarmStore,
    notifier: N,
}

impl<N: Notifier> ReconcileEngine<N> {
    /// 새 엔진을 생성합니다.
    pub fn new(store: AlarmStore, notifier: N) -> Result<Self, DbAlarmError> {
        Ok(Self {
            scanner: SignatureScanner::new()?,
            store,
            notifier,
        })
    }

    /// 한 번의 조정 실행: Phase A(flush) 후 Phase B(detect).
    ///
    /// 저장소/전송 에러는 각 단계 안에서 로깅하고 해당 단계만 중단합니다
    /// (상태 변경 없이 fail closed). 유일한 예외는 삽입 시의
    /// [`StorageError::DuplicateKey`]로, 사전 diff를 거친 뒤에는 도달할 수
    /// 없는 내부 결함이므로 호출자까지 전파됩니다.
    pub async fn run<'a, I>(&mut self, lines: I) -> Result<RunReport, DbAlarmError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut report = RunReport::default();

        self.flush_pending(&mut report).await;
        self.detect_and_record(lines, &mut report).await?;

        match self.store.pending_count() {
            Ok(count) => report.pending_after = count,
            Err(e) => error!(error = %e, "failed to read final pending count"),
        }

        Ok(report)
    }

    /// Phase A: 이전 실행에서 전달되지 못한 알람을 일괄 재시도합니다.
    async fn flush_pending(&mut self, report: &mut RunReport) {
        let count = match self.store.pending_count() {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "phase A aborted: pending count unavailable");
                return;
            }
        };
        if count == 0 {
            debug!("no pending alarms to flush");
            return;
        }

        let pending = match self.store.pending_alarms() {
            Ok(pending) => pending,
            Err(e) => {
                error!(error = %e, "phase A aborted: pending alarms unavailable");
                return;
            }
        };

        info!(count = pending.len(), "flushing pending alarms");
        let (subject, body) = compose_notification(&pending);
        match self.notifier.send(&subject, &body).await {
            Ok(()) => {
                let now = processing_timestamp();
                match self.store.mark_notified(&pending, &now) {
                    Ok(updated) => {
                        report.flushed = updated;
                        info!(count = updated, notified_at = %now, "pending alarms notified");
                    }
                    Err(e) => {
                        // 전송은 성공했으나 마킹 실패: 다음 실행에서 같은
                        // 배치가 다시 전송됨 (at-least-once)
                        error!(error = %e, "failed to mark flushed alarms notified");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, count = pending.len(), "flush notification failed, alarms stay pending");
            }
        }
    }

    /// Phase B: 현재 입력에서 새 탐지를 기록하고 알림을 시도합니다.
    async fn detect_and_record<'a, I>(
        &mut self,
        lines: I,
        report: &mut RunReport,
    ) -> Result<(), DbAlarmError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines_scanned = 0;
        let detections: BTreeSet<String> = lines
            .into_iter()
            .inspect(|_| lines_scanned += 1)
            .filter_map(|line| self.scanner.matches(line))
            .collect();
        report.lines_scanned = lines_scanned;
        report.detections = detections.len();
        info!(lines = lines_scanned, detections = detections.len(), "scanned input");

        if detections.is_empty() {
            return Ok(());
        }

        let existing = match self.store.existing_keys() {
            Ok(existing) => existing,
            Err(e) => {
                error!(error = %e, "phase B aborted: existing alarm keys unavailable");
                return Ok(());
            }
        };

        // 전체 이력 대비 diff: 미전달(pending) 알람만이 아니라 모든 키와 비교
        let new: BTreeSet<String> = detections.difference(&existing).cloned().collect();
        report.already_known = detections.len() - new.len();
        if new.is_empty() {
            info!("all detections already recorded");
            return Ok(());
        }

        // 전송 시도 전에 커밋: 이후 크래시가 나도 알람은 pending으로 남음
        if let Err(e) = self.store.insert_alarms(&new) {
            if matches!(e, StorageError::DuplicateKey { .. }) {
                // diff를 통과한 키가 이미 존재 -- 내부 결함이므로 전파
                return Err(e.into());
            }
            error!(error = %e, "phase B aborted: failed to record new alarms");
            return Ok(());
        }
        report.new_alarms = new.iter().cloned().collect();
        info!(count = new.len(), "recorded new alarms");

        let (subject, body) = compose_notification(&report.new_alarms);
        match self.notifier.send(&subject, &body).await {
            Ok(()) => {
                let now = processing_timestamp();
                match self.store.mark_notified(&report.new_alarms, &now) {
                    Ok(_) => {
                        report.new_alarms_notified = true;
                        info!(count = new.len(), notified_at = %now, "new alarms notified");
                    }
                    Err(e) => {
                        error!(error = %e, "failed to mark new alarms notified");
                    }
                }
            }
            Err(e) => {
                // 다음 실행의 Phase A가 재시도
                error!(error = %e, count = new.len(), "new alarm notification failed, will retry as pending");
            }
        }

        Ok(())
    }
}

/// 알람 배치 하나를 덮는 알림 제목/본문을 구성합니다.
///
/// 운영자 가독성을 위해 타임스탬프는 오름차순(가장 오래된 것부터)으로
/// 나열합니다.
fn compose_notification(keys: &[String]) -> (String, String) {
    let subject = format!(
        "[dbalarm] ingestion reported zero readings ({} event{})",
        keys.len(),
        if keys.len() == 1 { "" } else { "s" }
    );

    let mut body = String::from(
        "The database writer reported zero readings processed at the following times:\n\n",
    );
    for key in keys {
        body.push_str("  - ");
        body.push_str(key);
        body.push('\n');
    }
    body.push_str("\nEach timestamp is one occurrence of the failure signature in the ingestion log.\n");

    (subject, body)
}

/// 이번 실행의 처리 시각 (탐지 타임스탬프와 같은 형식, UTC)
fn processing_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%z").to_string()
}
