use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::github::{OrganizationMember, OrganizationRole, Team, TeamMember};

#[derive(Debug, Deserialize)]
struct OrgFile {
    organization: OrganizationSection,
    #[serde(default)]
    team: Vec<TeamEntry>,
    #[serde(default)]
    member: Vec<MemberEntry>,
}

#[derive(Debug, Deserialize)]
struct OrganizationSection {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    name: String,
    // Known only after the team has been created, so 0 is allowed for teams
    // that do not exist yet.
    #[serde(default)]
    github_team_id: u64,
    slug: Option<String>,
    #[serde(default)]
    description: String,
    parent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberEntry {
    github_user_id: u64,
    github_user_name: String,
    organization_role: OrganizationRole,
    #[serde(default)]
    teams: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OrgManifest {
    pub organization: String,
    pub members: BTreeSet<OrganizationMember>,
    pub teams: BTreeSet<Team>,
    pub team_memberships: BTreeSet<TeamMember>,
}

impl OrgManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading manifest: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed parsing manifest: {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: OrgFile = toml::from_str(raw)?;

        let members: BTreeSet<OrganizationMember> = file
            .member
            .iter()
            .map(|entry| OrganizationMember {
                user_id: entry.github_user_id,
                user_name: entry.github_user_name.clone(),
                role: entry.organization_role,
            })
            .collect();

        let teams: BTreeSet<Team> = file
            .team
            .into_iter()
            .map(|entry| Team {
                team_id: entry.github_team_id,
                // By default the team slug is equal to its name.
                slug: entry.slug.unwrap_or_else(|| entry.name.clone()),
                name: entry.name,
                description: entry.description,
                parent_team_name: entry.parent,
            })
            .collect();

        let team_memberships: BTreeSet<TeamMember> = file
            .member
            .iter()
            .flat_map(|entry| {
                entry.teams.iter().map(|team_name| TeamMember {
                    user_id: entry.github_user_id,
                    user_name: entry.github_user_name.clone(),
                    team_name: team_name.clone(),
                })
            })
            .collect();

        Ok(Self {
            organization: file.organization.name,
            members,
            teams,
            team_memberships,
        })
    }

    pub fn template() -> &'static str {
        r#"[organization]
# GitHub organization to target.
name = "acme-co"

[[team]]
# Name of the team. In this example, you can mention the team with
# '@acme-co/developers'.
name = "developers"
# Known after creating the team.
github_team_id = 9999
description = "All developers"

# Optionally, if this team should be nested under a parent team,
# the name of the parent. For top-level teams, this key can be omitted.
# parent = "humans"

[[member]]
# Because usernames can be changed, we identify GitHub users by id.
# One easy way to get a user's id is to look at the url of their avatar,
# it's of the form "https://avatars.githubusercontent.com/u/«user-id»?v=4".
github_user_id = 583231
github_user_name = "octocat"

# Role in the organization is either "member" or "admin".
organization_role = "member"

# A list of teams that this user should be a member of.
teams = ["developers"]
"#
    }
}

#[cfg(test)]
mod tests {
    use crate::manifest::github::OrgManifest;
    use crate::model::github::{OrganizationRole, TeamMember};

    #[test]
    fn template_manifest_parses() {
        let manifest = OrgManifest::from_toml_str(OrgManifest::template()).unwrap();
        assert_eq!(manifest.organization, "acme-co");
        assert_eq!(manifest.members.len(), 1);
        assert_eq!(manifest.teams.len(), 1);
        assert_eq!(manifest.team_memberships.len(), 1);
    }

    #[test]
    fn memberships_expand_from_per_member_team_lists() {
        let manifest = OrgManifest::from_toml_str(
            r#"
            [organization]
            name = "acme-co"

            [[team]]
            name = "developers"

            [[team]]
            name = "ops"

            [[member]]
            github_user_id = 1
            github_user_name = "alice"
            organization_role = "admin"
            teams = ["developers", "ops"]

            [[member]]
            github_user_id = 2
            github_user_name = "bob"
            organization_role = "member"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.team_memberships.len(), 2);
        assert!(manifest.team_memberships.contains(&TeamMember {
            user_id: 1,
            user_name: "alice".to_string(),
            team_name: "ops".to_string(),
        }));
    }

    #[test]
    fn team_slug_defaults_to_its_name() {
        let manifest = OrgManifest::from_toml_str(
            r#"
            [organization]
            name = "acme-co"

            [[team]]
            name = "Dev Ops"
            slug = "dev-ops"

            [[team]]
            name = "developers"
            "#,
        )
        .unwrap();

        let slugs: Vec<(&str, &str)> = manifest
            .teams
            .iter()
            .map(|t| (t.name.as_str(), t.slug.as_str()))
            .collect();
        assert!(slugs.contains(&("Dev Ops", "dev-ops")));
        assert!(slugs.contains(&("developers", "developers")));
    }

    #[test]
    fn member_role_is_required_and_validated() {
        let result = OrgManifest::from_toml_str(
            r#"
            [organization]
            name = "acme-co"

            [[member]]
            github_user_id = 1
            github_user_name = "alice"
            organization_role = "overlord"
            "#,
        );
        assert!(result.is_err());
    }
}
