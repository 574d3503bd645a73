//! dbalarm 공통 크레이트 -- 에러, 설정, 도메인 타입
//!
//! 엔진과 CLI가 공유하는 기반 타입을 정의합니다.
//! 탐지/알림 로직 자체는 `dbalarm-engine`에 있습니다.

pub mod config;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, DbAlarmError, NotifyError, StorageError};

// 설정
pub use config::{DatabaseConfig, DbAlarmConfig, GeneralConfig, SmtpConfig};

// 도메인 타입
pub use types::Alarm;
