pub mod resend;

use async_trait::async_trait;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}
