//! 에러 타입 — 도메인별 에러 정의

/// dbalarm 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DbAlarmError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 알람 저장소 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 알림 전송 에러
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    /// 탐지 패턴 컴파일 에러
    #[error("pattern error: {0}")]
    Pattern(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 알람 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 데이터베이스 열기 실패
    #[error("failed to open database {path}: {reason}")]
    Open { path: String, reason: String },

    /// 쿼리 실패
    #[error("query failed: {0}")]
    Query(String),

    /// 탐지 키 중복 -- 사전 dedup을 통과한 키가 이미 존재함 (내부 결함 신호)
    #[error("duplicate alarm key: {key}")]
    DuplicateKey { key: String },
}

/// 알림 전송 에러
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP 전송 실패 (연결, 인증, 프로토콜)
    #[error("smtp transport error: {0}")]
    Transport(String),

    /// 메일 주소 파싱 실패
    #[error("invalid mail address '{address}': {reason}")]
    Address { address: String, reason: String },

    /// 메시지 구성 실패
    #[error("failed to build message: {0}")]
    Message(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_display_includes_key() {
        let err = StorageError::DuplicateKey {
            key: "2024-01-01T00:00:00+0000".to_owned(),
        };
        assert!(err.to_string().contains("2024-01-01T00:00:00+0000"));
    }

    #[test]
    fn storage_error_converts_to_top_level() {
        let err = StorageError::Query("no such table: alarms_t".to_owned());
        let top: DbAlarmError = err.into();
        assert!(matches!(top, DbAlarmError::Storage(_)));
        assert!(top.to_string().contains("no such table"));
    }

    #[test]
    fn notify_error_converts_to_top_level() {
        let err = NotifyError::Transport("connection refused".to_owned());
        let top: DbAlarmError = err.into();
        assert!(matches!(top, DbAlarmError::Notify(_)));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::InvalidValue {
            field: "smtp.port".to_owned(),
            reason: "must not be 0".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("smtp.port"));
        assert!(msg.contains("must not be 0"));
    }
}
