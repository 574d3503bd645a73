//! 설정 관리 — dbalarm.toml 파싱 및 런타임 설정
//!
//! [`DbAlarmConfig`]는 도구 전체의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`DBALARM_SMTP_HOST=mail.example.org` 형식)
//! 2. 설정 파일 (`dbalarm.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), dbalarm_core::error::DbAlarmError> {
//! use dbalarm_core::config::DbAlarmConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = DbAlarmConfig::load("dbalarm.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = DbAlarmConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, DbAlarmError};

/// dbalarm 통합 설정
///
/// `dbalarm.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbAlarmConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 알람 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// SMTP 알림 설정
    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl DbAlarmConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DbAlarmError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, DbAlarmError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DbAlarmError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                DbAlarmError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, DbAlarmError> {
        toml::from_str(toml_str).map_err(|e| {
            DbAlarmError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `DBALARM_{SECTION}_{FIELD}`
    /// 예: `DBALARM_SMTP_HOST=mail.example.org`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "DBALARM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "DBALARM_GENERAL_LOG_FORMAT");

        // Database
        override_string(&mut self.database.path, "DBALARM_DATABASE_PATH");

        // SMTP
        override_string(&mut self.smtp.host, "DBALARM_SMTP_HOST");
        override_u16(&mut self.smtp.port, "DBALARM_SMTP_PORT");
        override_string(&mut self.smtp.username, "DBALARM_SMTP_USERNAME");
        override_string(&mut self.smtp.password, "DBALARM_SMTP_PASSWORD");
        override_string(&mut self.smtp.sender, "DBALARM_SMTP_SENDER");
        override_string(&mut self.smtp.recipients, "DBALARM_SMTP_RECIPIENTS");
        override_bool(&mut self.smtp.confidential, "DBALARM_SMTP_CONFIDENTIAL");
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// SMTP 필드 누락은 실행 시점이 아니라 시작 시점의 설정 에러로 처리합니다.
    pub fn validate(&self) -> Result<(), DbAlarmError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // 데이터베이스 경로 검증
        if self.database.path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".to_owned(),
                reason: "path must not be empty".to_owned(),
            }
            .into());
        }

        // SMTP 검증
        if self.smtp.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "smtp.host".to_owned(),
                reason: "host must not be empty".to_owned(),
            }
            .into());
        }
        if self.smtp.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "smtp.port".to_owned(),
                reason: "port must not be 0".to_owned(),
            }
            .into());
        }
        if self.smtp.sender.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "smtp.sender".to_owned(),
                reason: "sender must not be empty".to_owned(),
            }
            .into());
        }
        if self.smtp.recipient_list().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "smtp.recipients".to_owned(),
                reason: "at least one recipient is required".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 알람 데이터베이스 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite 파일 경로
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "/var/lib/dbalarm/alarms.db".to_owned(),
        }
    }
}

/// SMTP 알림 설정
///
/// 전송 단계(Phase A/B)에 모두 필요하며, 누락은 시작 시점 설정 에러입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// SMTP 서버 호스트
    pub host: String,
    /// SMTP 서버 포트
    pub port: u16,
    /// 인증 사용자명 (비어 있으면 sender를 사용)
    pub username: String,
    /// 인증 비밀번호
    pub password: String,
    /// 발신자 주소
    pub sender: String,
    /// 수신자 주소 목록 (쉼표 구분)
    pub recipients: String,
    /// true면 수신자를 전부 Bcc로 숨기고 To에는 발신자만 노출
    pub confidential: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            password: String::new(),
            sender: String::new(),
            recipients: String::new(),
            confidential: false,
        }
    }
}

impl SmtpConfig {
    /// 쉼표 구분 수신자 문자열을 개별 주소로 분리합니다.
    ///
    /// 빈 항목은 걸러냅니다 (`"a@x.org,, b@x.org"` -> 2건).
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// 인증에 사용할 사용자명 (username이 비어 있으면 sender)
    pub fn effective_username(&self) -> &str {
        if self.username.is_empty() {
            &self.sender
        } else {
            &self.username
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}
