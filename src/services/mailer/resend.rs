use anyhow::Context;
use async_trait::async_trait;

use super::EmailProvider;

pub struct ResendProvider {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl ResendProvider {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailProvider for ResendProvider {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "text": body,
            }))
            .send()
            .await
            .context("failed to send email")?
            .error_for_status()
            .context("email API returned error")?;

        Ok(())
    }
}
