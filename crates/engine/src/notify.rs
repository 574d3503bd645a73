//! 알림 전송 -- SMTP 이메일 어댑터
//!
//! [`Notifier`]는 엔진이 의존하는 전송 seam이며, 테스트에서는 mock으로
//! 대체됩니다. 프로덕션 구현 [`SmtpNotifier`]는 lettre의 비동기 SMTP
//! 전송을 사용합니다.
//!
//! 재시도 정책은 이 계층에 없습니다. 호출당 정확히 한 번 전송을
//! 시도하고, 실패는 값으로 보고합니다. 재시도는 엔진의 pending 경로가
//! 담당합니다.

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use dbalarm_core::config::SmtpConfig;
use dbalarm_core::error::NotifyError;

/// 알림 전송 seam
///
/// 구현은 전송 성공(원격 수락 확인) 또는 실패를 반환해야 하며,
/// 에러를 조용히 삼켜서는 안 됩니다.
pub trait Notifier: Send + Sync {
    /// 제목과 본문으로 알림 한 건을 전송합니다.
    fn send(
        &self,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// lettre 기반 SMTP 알림 전송기
///
/// STARTTLS 릴레이로 연결하고 자격증명으로 인증합니다.
/// 수신자 목록은 설정의 쉼표 구분 문자열에서 가져옵니다.
#[derive(Debug)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    /// true면 수신자를 전부 Bcc로 숨김 (To에는 발신자만 노출)
    confidential: bool,
}

impl SmtpNotifier {
    /// 설정에서 전송기를 구성합니다.
    ///
    /// 주소 파싱과 릴레이 구성 실패는 시작 시점 에러로 보고됩니다.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let sender = parse_mailbox(&config.sender)?;
        let recipients = config
            .recipient_list()
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;

        let creds = Credentials::new(
            config.effective_username().to_owned(),
            config.password.clone(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .credentials(creds)
            .port(config.port)
            .build();

        Ok(Self {
            transport,
            sender,
            recipients,
            confidential: config.confidential,
        })
    }

    fn build_message(&self, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        if self.confidential {
            // 주소 프라이버시: 수신자 목록을 서로에게 노출하지 않음
            builder = builder.to(self.sender.clone());
            for recipient in &self.recipients {
                builder = builder.bcc(recipient.clone());
            }
        } else {
            for recipient in &self.recipients {
                builder = builder.to(recipient.clone());
            }
        }

        builder
            .body(body.to_owned())
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(subject, body)?;
        // 원격이 수락을 확인할 때까지 블로킹; 연결/인증/프로토콜 실패는
        // 전부 값으로 보고되어 엔진의 재시도 경로로 들어감
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e| NotifyError::Address {
        address: address.to_owned(),
        reason: format!("{e}"),
    })
}
