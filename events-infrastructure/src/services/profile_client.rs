use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use events_domain::{ProfileOracle, ProfileView, UpstreamConfig, UserId, UserProfile};

#[derive(Serialize)]
struct ProfilesRequest<'a> {
    user_ids: &'a [UserId],
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProfilesResponse {
    #[serde(default)]
    profiles: HashMap<String, UserProfile>,
}

/// User service client issuing one batched lookup per call.
pub struct HttpProfileOracle {
    client: Client,
    base_url: String,
}

impl HttpProfileOracle {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.rpc_timeout_ms.max(1)))
            .build()?;
        Ok(Self::with_client(client, &config.user_service_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ProfileOracle for HttpProfileOracle {
    async fn get_profiles(&self, user_ids: &[UserId]) -> Result<ProfileView> {
        if user_ids.is_empty() {
            return Ok(ProfileView::new());
        }
        let url = format!("{}/internal/profiles/batch", self.base_url);
        let body: ProfilesResponse = self
            .client
            .post(&url)
            .json(&ProfilesRequest { user_ids })
            .send()
            .await
            .context("profile batch request failed")?
            .error_for_status()?
            .json()
            .await?;
        Ok(profile_view(body))
    }
}

pub(crate) fn profile_view(body: ProfilesResponse) -> ProfileView {
    body.profiles
        .into_iter()
        .filter_map(|(user_id, profile)| match UserId::from_str(&user_id) {
            Ok(user_id) => Some((user_id, profile)),
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "user service returned malformed user id");
                None
            }
        })
        .collect()
}
