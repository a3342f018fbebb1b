use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::{Diffable, EntityId, RenderToml};
use crate::model::toml_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRole {
    Admin,
    Member,
}

impl Display for OrganizationRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown organization role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for OrganizationRole {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OrganizationMember {
    pub user_id: u64,
    pub user_name: String,
    pub role: OrganizationRole,
}

impl Diffable for OrganizationMember {
    fn id(&self) -> EntityId {
        EntityId::Int(self.user_id)
    }
}

impl RenderToml for OrganizationMember {
    fn to_toml(&self) -> String {
        format!(
            "[[member]]\n\
             github_user_id = {}\n\
             github_user_name = {}\n\
             role = {}",
            self.user_id,
            toml_string(&self.user_name),
            toml_string(&self.role.to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Team {
    pub team_id: u64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_team_name: Option<String>,
}

impl Diffable for Team {
    fn id(&self) -> EntityId {
        EntityId::Int(self.team_id)
    }
}

impl RenderToml for Team {
    fn to_toml(&self) -> String {
        let mut lines = vec![
            "[[team]]".to_string(),
            format!("github_team_id = {}", self.team_id),
            format!("name = {}", toml_string(&self.name)),
        ];

        // The slug defaults to the team name, only list it if they differ.
        if self.slug != self.name {
            lines.push(format!("slug = {}", toml_string(&self.slug)));
        }

        lines.push(format!("description = {}", toml_string(&self.description)));

        if let Some(parent) = &self.parent_team_name {
            lines.push(format!("parent = {}", toml_string(parent)));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TeamMember {
    pub user_id: u64,
    pub user_name: String,
    pub team_name: String,
}

impl Diffable for TeamMember {
    // Memberships have no id of their own; deriving the identity from the
    // full value means the differ never turns a membership add/remove pair
    // into a change.
    fn id(&self) -> EntityId {
        EntityId::Text(format!(
            "{}:{}@{}",
            self.user_id, self.user_name, self.team_name
        ))
    }
}
