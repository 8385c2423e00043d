use std::time::Duration;

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, warn};

use events_domain::{ChangeNotifier, EventChange, NotifierConfig};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Signature-256";
pub const TOPIC_HEADER: &str = "X-Event-Topic";

#[derive(Serialize)]
struct ChangeEnvelope<'a> {
    topic: &'a str,
    #[serde(flatten)]
    change: &'a EventChange,
}

/// Serializes a change into the JSON body published on `topic`.
pub fn encode_change(topic: &str, change: &EventChange) -> Result<String> {
    Ok(serde_json::to_string(&ChangeEnvelope { topic, change })?)
}

pub fn sign_payload(secret: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| anyhow!("hmac init failed: {err}"))?;
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256=");
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}

/// Posts every change to a webhook. Delivery runs on a spawned task; failures are logged only.
pub struct WebhookChangeNotifier {
    client: Client,
    url: String,
    topic: String,
    signing_secret: Option<String>,
}

impl WebhookChangeNotifier {
    pub fn new(config: &NotifierConfig, url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            topic: config.topic.clone(),
            signing_secret: config.signing_secret.clone(),
        })
    }
}

impl ChangeNotifier for WebhookChangeNotifier {
    fn publish(&self, change: EventChange) {
        let client = self.client.clone();
        let url = self.url.clone();
        let topic = self.topic.clone();
        let secret = self.signing_secret.clone();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(event_id = %change.event.id, "no runtime available, change notification dropped");
            return;
        };
        runtime.spawn(async move {
            if let Err(err) = deliver(&client, &url, &topic, secret.as_deref(), &change).await {
                warn!(
                    event_id = %change.event.id,
                    kind = change.kind.as_str(),
                    error = %err,
                    "change notification failed"
                );
            }
        });
    }
}

async fn deliver(
    client: &Client,
    url: &str,
    topic: &str,
    secret: Option<&str>,
    change: &EventChange,
) -> Result<()> {
    let payload = encode_change(topic, change)?;
    let mut request = client
        .post(url)
        .header("Content-Type", "application/json")
        .header(TOPIC_HEADER, topic);
    if let Some(secret) = secret {
        request = request.header(SIGNATURE_HEADER, sign_payload(secret, &payload)?);
    }
    request.body(payload).send().await?.error_for_status()?;
    Ok(())
}

/// Used when no webhook is configured.
pub struct LogChangeNotifier {
    topic: String,
}

impl LogChangeNotifier {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
        }
    }
}

impl ChangeNotifier for LogChangeNotifier {
    fn publish(&self, change: EventChange) {
        info!(
            topic = %self.topic,
            kind = change.kind.as_str(),
            event_id = %change.event.id,
            team_id = %change.event.team_id,
            actor_id = %change.actor_id,
            "event change"
        );
    }
}
