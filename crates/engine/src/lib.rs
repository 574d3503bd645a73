//! dbalarm 엔진 -- 탐지/중복제거/알림 전달 상태 기계
//!
//! 수집된 로그 라인에서 zero-readings 실패 시그니처를 추출하고,
//! 저장소의 기존 알람과 비교해 새 알람만 기록한 뒤 이메일 알림을 보냅니다.
//! 전송 실패 시 알람은 pending 상태로 남아 다음 실행에서 재시도됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! lines -> SignatureScanner -> ReconcileEngine -> AlarmStore (SQLite)
//!                                   |
//!                                   +-> Notifier (SMTP)
//! ```

pub mod extract;
pub mod notify;
pub mod reconcile;
pub mod store;

pub use extract::SignatureScanner;
pub use notify::{Notifier, SmtpNotifier};
pub use reconcile::{ReconcileEngine, RunReport};
pub use store::AlarmStore;
