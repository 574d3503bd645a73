//! 도메인 타입 — 알람 레코드
//!
//! 엔진과 CLI가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 영속화된 알람 레코드
///
/// 로그에서 추출된 탐지 타임스탬프 하나가 알람 한 건이 됩니다.
/// `detected_at`은 유일 키이며 생성 이후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    /// 탐지 시각 (ISO-8601, `+HHMM` 오프셋, 초 단위)
    pub detected_at: String,
    /// 알림 전달이 확인된 시각. `None`이면 아직 미전달 (재시도 대상)
    pub notified_at: Option<String>,
}

impl Alarm {
    /// 전달 확인 전인 알람인지 여부
    pub fn is_pending(&self) -> bool {
        self.notified_at.is_none()
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.notified_at {
            Some(at) => write!(f, "{} (notified {})", self.detected_at, at),
            None => write!(f, "{} (pending)", self.detected_at),
        }
    }
}
