use formgate_core::{GateError, RelayConfig, TemplateRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Display name the notification is posted under.
const BOT_USERNAME: &str = "NewContact";

const FOOTER: &str = "New contact request";

/// Slack message attachment — the subset of fields the relay fills in.
#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub author_name: String,
    pub author_icon: String,
    pub title: String,
    pub title_link: String,
    pub text: String,
    pub footer: String,
    pub thumb_url: String,
    pub ts: String,
    pub mrkdwn_in: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    username: &'a str,
    attachments: &'a [Attachment],
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts rendered contact notifications to a Slack channel.
///
/// One attempt per submission; a failed call surfaces as
/// [`GateError::Delivery`] and is never retried.
pub struct Notifier {
    client: reqwest::Client,
    api_base: String,
    token: String,
    channel: String,
    company_name: String,
    website_url: String,
    logo_url: String,
}

impl Notifier {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.slack.api_base.clone(),
            token: config.slack.token.clone(),
            channel: config.slack.channel.clone(),
            company_name: config.branding.company_name.clone(),
            website_url: config.branding.website_url.clone(),
            logo_url: config.branding.logo_url.clone(),
        }
    }

    /// Render the route's template against the submitted values and post the
    /// result to the configured channel.
    pub async fn notify(
        &self,
        registry: &TemplateRegistry,
        route: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), GateError> {
        let text = registry.render(route, values)?;
        let attachment = self.build_attachment(text);
        self.post_message(&attachment).await?;
        debug!(channel = %self.channel, route = %route, "notification delivered");
        Ok(())
    }

    /// Wrap rendered message text in the branded attachment envelope.
    pub fn build_attachment(&self, text: String) -> Attachment {
        Attachment {
            author_name: self.company_name.clone(),
            author_icon: self.logo_url.clone(),
            title: format!("New contact request for {}", self.company_name),
            title_link: self.website_url.clone(),
            text,
            footer: FOOTER.to_string(),
            thumb_url: self.logo_url.clone(),
            ts: unix_now().to_string(),
            mrkdwn_in: vec!["text".to_string()],
        }
    }

    async fn post_message(&self, attachment: &Attachment) -> Result<(), GateError> {
        let body = PostMessageRequest {
            channel: &self.channel,
            username: BOT_USERNAME,
            attachments: std::slice::from_ref(attachment),
        };

        let url = format!("{}/chat.postMessage", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GateError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GateError::Delivery(format!(
                "slack returned HTTP {}",
                response.status()
            )));
        }

        let parsed: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| GateError::Delivery(e.to_string()))?;
        if !parsed.ok {
            return Err(GateError::Delivery(
                parsed.error.unwrap_or_else(|| "unknown slack error".to_string()),
            ));
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: &str) -> RelayConfig {
        let mut cfg = RelayConfig::default();
        cfg.slack.token = "xoxb-test".into();
        cfg.slack.channel = "#contact".into();
        cfg.slack.api_base = api_base.into();
        cfg.branding.company_name = "Acme".into();
        cfg.branding.website_url = "https://acme.example".into();
        cfg.branding.logo_url = "https://acme.example/logo.png".into();
        cfg
    }

    fn registry_with(body: &str) -> TemplateRegistry {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("contact.tpl"), body).unwrap();
        TemplateRegistry::load(dir.path()).unwrap()
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn attachment_carries_branding_and_rendered_text() {
        let notifier = Notifier::new(&config("https://slack.com/api"));
        let att = notifier.build_attachment("Hello Alice".to_string());

        assert_eq!(att.author_name, "Acme");
        assert_eq!(att.author_icon, "https://acme.example/logo.png");
        assert_eq!(att.title, "New contact request for Acme");
        assert_eq!(att.title_link, "https://acme.example");
        assert_eq!(att.text, "Hello Alice");
        assert_eq!(att.footer, "New contact request");
        assert_eq!(att.thumb_url, "https://acme.example/logo.png");
        assert_eq!(att.mrkdwn_in, vec!["text"]);
        let ts: u64 = att.ts.parse().unwrap();
        assert!(ts > 1_500_000_000);
    }

    #[tokio::test]
    async fn notify_posts_rendered_template_to_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(bearer_token("xoxb-test"))
            .and(body_partial_json(serde_json::json!({
                "channel": "#contact",
                "username": "NewContact",
                "attachments": [{ "text": "Hello Alice" }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = Notifier::new(&config(&server.uri()));
        let registry = registry_with("Hello {{name}}");
        notifier
            .notify(&registry, "/contact", &values(&[("name", "Alice")]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn slack_level_error_is_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": false, "error": "invalid_auth"}),
            ))
            .mount(&server)
            .await;

        let notifier = Notifier::new(&config(&server.uri()));
        let registry = registry_with("Hello {{name}}");
        let err = notifier
            .notify(&registry, "/contact", &values(&[("name", "Alice")]))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Delivery(_)));
        assert!(err.to_string().contains("invalid_auth"));
    }

    #[tokio::test]
    async fn http_level_error_is_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let notifier = Notifier::new(&config(&server.uri()));
        let registry = registry_with("Hello {{name}}");
        let err = notifier
            .notify(&registry, "/contact", &values(&[("name", "Alice")]))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Delivery(_)));
    }

    #[tokio::test]
    async fn unknown_route_fails_before_any_api_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(0)
            .mount(&server)
            .await;

        let notifier = Notifier::new(&config(&server.uri()));
        let registry = registry_with("Hello {{name}}");
        let err = notifier
            .notify(&registry, "/missing", &values(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Render(_)));
    }
}
