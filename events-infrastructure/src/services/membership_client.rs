use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use events_domain::{
    MembershipOracle, MembershipView, TeamId, TeamMember, TeamRole, UpstreamConfig, UserId,
};

#[derive(Serialize)]
struct UserIdsRequest<'a> {
    user_ids: &'a [UserId],
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MembershipResponse {
    #[serde(default)]
    members: HashMap<String, MemberRole>,
}

#[derive(Debug, Deserialize)]
struct MemberRole {
    role: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SummaryResponse {
    #[serde(default)]
    members: Vec<SummaryMember>,
}

#[derive(Debug, Deserialize)]
struct SummaryMember {
    user_id: String,
    role: String,
}

/// Team service client. A team without members answers 200 with an empty list;
/// every non-2xx status is an error, never an empty team.
pub struct HttpMembershipOracle {
    client: Client,
    base_url: String,
}

impl HttpMembershipOracle {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.rpc_timeout_ms.max(1)))
            .build()?;
        Ok(Self::with_client(client, &config.team_service_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MembershipOracle for HttpMembershipOracle {
    async fn check_membership(
        &self,
        team_id: TeamId,
        user_ids: &[UserId],
    ) -> Result<MembershipView> {
        let url = format!("{}/internal/teams/{}/membership", self.base_url, team_id);
        let body: MembershipResponse = self
            .client
            .post(&url)
            .json(&UserIdsRequest { user_ids })
            .send()
            .await
            .context("membership request failed")?
            .error_for_status()?
            .json()
            .await?;
        Ok(membership_view(body))
    }

    async fn team_summary(&self, team_id: TeamId) -> Result<Vec<TeamMember>> {
        let url = format!("{}/internal/teams/{}/summary", self.base_url, team_id);
        let body: SummaryResponse = self
            .client
            .get(&url)
            .send()
            .await
            .context("team summary request failed")?
            .error_for_status()?
            .json()
            .await?;
        Ok(roster(body))
    }
}

pub(crate) fn membership_view(body: MembershipResponse) -> MembershipView {
    body.members
        .into_iter()
        .filter_map(|(user_id, member)| match UserId::from_str(&user_id) {
            Ok(user_id) => Some((user_id, TeamRole::from(member.role.as_str()))),
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "team service returned malformed user id");
                None
            }
        })
        .collect()
}

pub(crate) fn roster(body: SummaryResponse) -> Vec<TeamMember> {
    body.members
        .into_iter()
        .filter_map(|member| match UserId::from_str(&member.user_id) {
            Ok(user_id) => Some(TeamMember {
                user_id,
                role: TeamRole::from(member.role.as_str()),
            }),
            Err(err) => {
                warn!(user_id = %member.user_id, error = %err, "team service returned malformed user id");
                None
            }
        })
        .collect()
}
