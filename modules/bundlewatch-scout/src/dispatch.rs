use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::warn;

use bundlewatch_common::ScoutError;

use crate::router::RoutedNotification;
use crate::traits::WebhookTransport;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// JSON body POSTed to a webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookBody {
    pub content: String,
    pub tts: bool,
    pub embeds: Vec<Embed>,
    pub components: Vec<serde_json::Value>,
    pub username: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Render a routed notification into the wire body: a header embed with
/// title, image, expiry and category footer, then a detail embed with the
/// price and item list.
pub fn build_body(routed: &RoutedNotification, username: &str, avatar_url: &str) -> WebhookBody {
    let p = &routed.payload;
    WebhookBody {
        content: routed.content.clone(),
        tts: false,
        embeds: vec![
            Embed {
                description: format!(
                    "Offer expires {}, on {}",
                    p.expiry_relative_text, p.expiry_absolute_text
                ),
                title: Some(p.title_text.clone()),
                image: Some(EmbedImage { url: p.image_url.clone() }),
                footer: Some(EmbedFooter { text: p.category_label.clone() }),
                url: Some(p.url.clone()),
            },
            Embed {
                description: format!("{}\n\n**Items**\n{}", p.price_line, p.items_line),
                title: None,
                image: None,
                footer: None,
                url: None,
            },
        ],
        components: vec![],
        username: username.to_string(),
        avatar_url: avatar_url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn deliver(&self, endpoint: &str, body: &WebhookBody) -> Result<()> {
        let resp = self.client.post(endpoint).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            anyhow::bail!("webhook returned {status}: {message}");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Delivery counts for one bundle's batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub attempted: u32,
    pub failed: u32,
}

/// Best-effort fan-out to subscriber endpoints. One failed endpoint never
/// stops the rest of the batch; the batch counts as processed once every
/// subscriber has been attempted.
pub struct DispatchEngine {
    transport: Arc<dyn WebhookTransport>,
    concurrency: usize,
    username: String,
    avatar_url: String,
}

impl DispatchEngine {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        concurrency: usize,
        username: String,
        avatar_url: String,
    ) -> Self {
        Self {
            transport,
            // cap 1 is the valid degenerate sequential case
            concurrency: concurrency.max(1),
            username,
            avatar_url,
        }
    }

    pub async fn dispatch(&self, bundle_id: &str, batch: &[RoutedNotification]) -> DispatchStats {
        let results: Vec<(String, Result<()>)> = stream::iter(batch.iter().map(|routed| {
            let body = build_body(routed, &self.username, &self.avatar_url);
            let endpoint = routed.subscriber.endpoint.clone();
            let transport = Arc::clone(&self.transport);
            async move {
                let result = transport.deliver(&endpoint, &body).await;
                (endpoint, result)
            }
        }))
        .buffer_unordered(self.concurrency)
        .collect()
        .await;

        let mut stats = DispatchStats::default();
        for (endpoint, result) in results {
            stats.attempted += 1;
            if let Err(e) = result {
                stats.failed += 1;
                let err = ScoutError::Dispatch {
                    endpoint,
                    message: e.to_string(),
                };
                warn!(bundle_id, error = %err, "Webhook delivery failed");
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RoutedNotification;
    use bundlewatch_common::{MentionPolicy, NotificationPayload, WebhookSubscriber};
    use std::collections::HashSet;

    fn routed(content: &str) -> RoutedNotification {
        RoutedNotification {
            subscriber: WebhookSubscriber {
                endpoint: "https://discord.com/api/webhooks/1/a".to_string(),
                mention: MentionPolicy::None,
                categories: HashSet::from(["games".to_string()]),
                currency: "$".to_string(),
            },
            payload: NotificationPayload {
                title_text: "Alpha Bundle".to_string(),
                url: "https://x.test/games/alpha".to_string(),
                image_url: "https://x.test/logo.png".to_string(),
                expiry_relative_text: "<t:95400:R>".to_string(),
                expiry_absolute_text: "<t:95400:F>".to_string(),
                price_line: "**Price**: €25".to_string(),
                items_line: "One\nTwo".to_string(),
                category_label: "Games".to_string(),
            },
            content: content.to_string(),
        }
    }

    #[test]
    fn body_matches_wire_schema() {
        let body = build_body(&routed("@everyone"), "Humble Bundle", "https://x.test/avatar.png");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["content"], "@everyone");
        assert_eq!(json["tts"], false);
        assert_eq!(json["components"], serde_json::json!([]));
        assert_eq!(json["username"], "Humble Bundle");
        assert_eq!(json["avatar_url"], "https://x.test/avatar.png");

        let embeds = json["embeds"].as_array().unwrap();
        assert_eq!(embeds.len(), 2);
        assert_eq!(embeds[0]["title"], "Alpha Bundle");
        assert_eq!(embeds[0]["url"], "https://x.test/games/alpha");
        assert_eq!(embeds[0]["image"]["url"], "https://x.test/logo.png");
        assert_eq!(embeds[0]["footer"]["text"], "Games");
        assert_eq!(
            embeds[0]["description"],
            "Offer expires <t:95400:R>, on <t:95400:F>"
        );
        assert_eq!(embeds[1]["description"], "**Price**: €25\n\n**Items**\nOne\nTwo");
        assert!(embeds[1].get("title").is_none());
    }
}
