//! 알람 저장소 어댑터 -- SQLite 영속화
//!
//! [`AlarmStore`]는 `alarms_t` 테이블에 대한 트랜잭션 단위 연산을 제공합니다.
//! 스키마: `alarms_t(detected_at TEXT PRIMARY KEY, notified_at TEXT NULL)`.
//!
//! 배치 삽입과 알림 마킹은 각각 단일 커밋이며, 삽입은 전송 시도 전에
//! 커밋되어야 합니다. 전송 전 크래시가 나도 알람은 pending으로 남아
//! 다음 실행에서 재시도됩니다.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::debug;

use dbalarm_core::error::StorageError;
use dbalarm_core::types::Alarm;

/// SQLite 기반 알람 저장소
pub struct AlarmStore {
    conn: Connection,
}

impl AlarmStore {
    /// 지정된 경로의 데이터베이스를 열거나 생성합니다.
    ///
    /// 스키마가 없으면 생성하고 WAL 저널 모드를 활성화합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // 인메모리 DB는 "memory" 모드를 반환하므로 결과값은 확인하지 않음
        let _journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(to_query_error)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS alarms_t (
                detected_at TEXT PRIMARY KEY,
                notified_at TEXT NULL
            )",
            [],
        )
        .map_err(to_query_error)?;

        Ok(Self { conn })
    }

    /// 저장된 모든 `detected_at` 키를 반환합니다.
    pub fn existing_keys(&self) -> Result<BTreeSet<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT detected_at FROM alarms_t")
            .map_err(to_query_error)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(to_query_error)?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(to_query_error)?;
        Ok(keys)
    }

    /// 새 알람들을 `notified_at = NULL`로 일괄 삽입합니다.
    ///
    /// 배치 전체가 하나의 트랜잭션입니다 (전부 삽입 또는 전부 롤백).
    /// 이미 존재하는 키는 [`StorageError::DuplicateKey`]로 표면화합니다.
    /// 사전 set-difference를 거쳤다면 발생할 수 없는 내부 결함 신호이므로
    /// 조용히 무시하지 않습니다.
    pub fn insert_alarms(&mut self, keys: &BTreeSet<String>) -> Result<(), StorageError> {
        let tx = self.conn.transaction().map_err(to_query_error)?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO alarms_t (detected_at, notified_at) VALUES (?1, NULL)")
                .map_err(to_query_error)?;
            for key in keys {
                stmt.execute(params![key]).map_err(|e| {
                    if is_constraint_violation(&e) {
                        StorageError::DuplicateKey { key: key.clone() }
                    } else {
                        to_query_error(e)
                    }
                })?;
            }
        }
        tx.commit().map_err(to_query_error)?;
        debug!(count = keys.len(), "inserted new alarms");
        Ok(())
    }

    /// 전달 확인 전인 알람 키를 `detected_at` 오름차순으로 반환합니다.
    pub fn pending_alarms(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT detected_at FROM alarms_t
                 WHERE notified_at IS NULL ORDER BY detected_at ASC",
            )
            .map_err(to_query_error)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(to_query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_query_error)?;
        Ok(keys)
    }

    /// 전달 확인 전인 알람 수를 반환합니다.
    ///
    /// Phase A에서 배치를 만들기 전의 저렴한 존재 확인용입니다.
    pub fn pending_count(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM alarms_t WHERE notified_at IS NULL",
                [],
                |row| row.get(0),
            )
            .map_err(to_query_error)?;
        Ok(count as usize)
    }

    /// 주어진 키들의 `notified_at`을 단일 트랜잭션으로 기록합니다.
    ///
    /// 호출자가 읽어서 전송한 키로 범위를 한정합니다. `notified_at`이 이미
    /// 설정된 행은 건드리지 않으므로 NULL -> 확정 전이는 단조적입니다.
    /// 갱신된 행 수를 반환합니다.
    pub fn mark_notified(&mut self, keys: &[String], now: &str) -> Result<usize, StorageError> {
        let tx = self.conn.transaction().map_err(to_query_error)?;
        let mut updated = 0;
        {
            let mut stmt = tx
                .prepare(
                    "UPDATE alarms_t SET notified_at = ?1
                     WHERE detected_at = ?2 AND notified_at IS NULL",
                )
                .map_err(to_query_error)?;
            for key in keys {
                updated += stmt.execute(params![now, key]).map_err(to_query_error)?;
            }
        }
        tx.commit().map_err(to_query_error)?;
        debug!(count = updated, notified_at = now, "marked alarms notified");
        Ok(updated)
    }

    /// 저장된 모든 알람을 `detected_at` 오름차순으로 반환합니다.
    pub fn alarms(&self) -> Result<Vec<Alarm>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT detected_at, notified_at FROM alarms_t
                 ORDER BY detected_at ASC",
            )
            .map_err(to_query_error)?;
        let alarms = stmt
            .query_map([], |row| {
                Ok(Alarm {
                    detected_at: row.get(0)?,
                    notified_at: row.get(1)?,
                })
            })
            .map_err(to_query_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(to_query_error)?;
        Ok(alarms)
    }
}

fn to_query_error(e: rusqlite::Error) -> StorageError {
    StorageError::Query(e.to_string())
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
