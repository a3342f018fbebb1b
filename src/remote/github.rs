use std::collections::BTreeSet;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::info;

use crate::model::github::{OrganizationMember, OrganizationRole, Team, TeamMember};
use crate::remote::http::{
    client, next_page_url, read_json, string_field, string_field_or_default, u64_field,
    warn_on_rate_limit,
};

const DEFAULT_API_URL: &str = "https://api.github.com";

pub struct GithubClient {
    token: String,
    api_url: String,
}

impl GithubClient {
    pub fn new(token: String, api_url: Option<String>) -> Self {
        Self {
            token,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        }
    }

    pub fn from_env(api_url: Option<String>) -> Result<Self> {
        let token = std::env::var("GITHUB_TOKEN").context(
            "expected GITHUB_TOKEN environment variable to be set \
             (a personal access token with read:org permission)",
        )?;
        Ok(Self::new(token, api_url))
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        client()
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/vnd.github.v3+json")
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .request(&url)
            .send()
            .await
            .with_context(|| format!("failed GET request: {url}"))?;
        warn_on_rate_limit(response.headers());
        read_json(response).await
    }

    async fn get_paginated(&self, path: &str) -> Result<Vec<Value>> {
        let mut url = format!("{}{}?per_page=100", self.api_url, path);
        let mut items = Vec::new();
        loop {
            let response = self
                .request(&url)
                .send()
                .await
                .with_context(|| format!("failed GET request: {url}"))?;
            warn_on_rate_limit(response.headers());
            let next = next_page_url(response.headers());
            let page = read_json(response).await?;
            let page_items = page
                .as_array()
                .with_context(|| format!("expected a JSON array from {url}"))?;
            items.extend(page_items.iter().cloned());
            match next {
                Some(next_url) => url = next_url,
                None => break,
            }
        }
        Ok(items)
    }

    pub async fn organization_members(&self, org: &str) -> Result<BTreeSet<OrganizationMember>> {
        let members = self.get_paginated(&format!("/orgs/{org}/members")).await?;
        let total = members.len();

        let mut out = BTreeSet::new();
        for (i, member) in members.iter().enumerate() {
            let user_name = string_field(member, "login")?;
            let user_id = u64_field(member, "id")?;
            info!("[{}/{total}] retrieving membership: {user_name}", i + 1);

            let membership = self
                .get_json(&format!("/orgs/{org}/memberships/{user_name}"))
                .await?;
            let role: OrganizationRole = string_field(&membership, "role")?
                .parse()
                .with_context(|| format!("membership of {user_name}"))?;

            out.insert(OrganizationMember {
                user_id,
                user_name,
                role,
            });
        }
        Ok(out)
    }

    pub async fn organization_teams(&self, org: &str) -> Result<BTreeSet<Team>> {
        let teams = self.get_paginated(&format!("/orgs/{org}/teams")).await?;
        teams.iter().map(team_from_json).collect()
    }

    // The actual team is passed in rather than the target one, because the
    // endpoint needs the slug the remote side actually has.
    pub async fn team_members(&self, org: &str, team: &Team) -> Result<BTreeSet<TeamMember>> {
        let members = self
            .get_paginated(&format!("/orgs/{org}/teams/{}/members", team.slug))
            .await?;
        members
            .iter()
            .map(|member| team_member_from_json(member, &team.name))
            .collect()
    }
}

fn team_from_json(value: &Value) -> Result<Team> {
    let parent_team_name = value
        .get("parent")
        .filter(|parent| !parent.is_null())
        .map(|parent| string_field(parent, "name"))
        .transpose()?;
    Ok(Team {
        team_id: u64_field(value, "id")?,
        name: string_field(value, "name")?,
        slug: string_field(value, "slug")?,
        description: string_field_or_default(value, "description"),
        parent_team_name,
    })
}

fn team_member_from_json(value: &Value, team_name: &str) -> Result<TeamMember> {
    Ok(TeamMember {
        user_id: u64_field(value, "id")?,
        user_name: string_field(value, "login")?,
        team_name: team_name.to_string(),
    })
}
