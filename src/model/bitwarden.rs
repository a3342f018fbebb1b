use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::{Diffable, EntityId, RenderToml};
use crate::model::toml_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Owner,
    Admin,
    User,
    Manager,
    Custom,
}

impl MemberType {
    // The public API reports member types as integer codes.
    pub fn from_api_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Owner),
            1 => Some(Self::Admin),
            2 => Some(Self::User),
            3 => Some(Self::Manager),
            4 => Some(Self::Custom),
            _ => None,
        }
    }
}

impl Display for MemberType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
            Self::Manager => write!(f, "manager"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown member type: {0}")]
pub struct MemberTypeParseError(pub String);

impl FromStr for MemberType {
    type Err = MemberTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            // Manifests historically spell the plain user type "member".
            "user" | "member" => Ok(Self::User),
            "manager" => Ok(Self::Manager),
            "custom" => Ok(Self::Custom),
            _ => Err(MemberTypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupAccess {
    ReadOnly,
    Write,
}

impl GroupAccess {
    pub fn from_read_only(read_only: bool) -> Self {
        if read_only {
            Self::ReadOnly
        } else {
            Self::Write
        }
    }
}

impl Display for GroupAccess {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "readonly"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub member_type: MemberType,
    pub access_all: bool,
}

impl Diffable for Member {
    fn id(&self) -> EntityId {
        EntityId::Text(self.id.clone())
    }
}

impl RenderToml for Member {
    fn to_toml(&self) -> String {
        format!(
            "[[member]]\n\
             member_id = {}\n\
             member_name = {}\n\
             email = {}\n\
             type = {}\n\
             access_all = {}",
            toml_string(&self.id),
            toml_string(&self.name),
            toml_string(&self.email),
            toml_string(&self.member_type.to_string()),
            self.access_all,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub access_all: bool,
}

impl Diffable for Group {
    fn id(&self) -> EntityId {
        EntityId::Text(self.id.clone())
    }
}

impl RenderToml for Group {
    fn to_toml(&self) -> String {
        format!(
            "[[group]]\n\
             group_id = {}\n\
             group_name = {}\n\
             access_all = {}",
            toml_string(&self.id),
            toml_string(&self.name),
            self.access_all,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupMember {
    pub member_id: String,
    pub member_name: String,
    pub group_name: String,
}

impl Diffable for GroupMember {
    // Memberships have no id of their own; deriving the identity from the
    // full value means the differ never turns a membership add/remove pair
    // into a change.
    fn id(&self) -> EntityId {
        EntityId::Text(format!(
            "{}:{}@{}",
            self.member_id, self.member_name, self.group_name
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MemberCollectionAccess {
    pub name: String,
}

impl MemberCollectionAccess {
    fn to_inline_toml(&self) -> String {
        format!("{{ member_name = {} }}", toml_string(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupCollectionAccess {
    pub name: String,
    pub access: GroupAccess,
}

impl GroupCollectionAccess {
    fn to_inline_toml(&self) -> String {
        format!(
            "{{ group_name = {}, access = {} }}",
            toml_string(&self.name),
            toml_string(&self.access.to_string()),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Collection {
    pub id: String,
    pub external_id: String,
    pub group_access: Option<Vec<GroupCollectionAccess>>,
    pub member_access: Option<Vec<MemberCollectionAccess>>,
}

impl Collection {
    // Access lists are kept sorted so that equal collections compare equal
    // regardless of the order a source listed them in.
    pub fn new(
        id: String,
        external_id: String,
        group_access: Option<Vec<GroupCollectionAccess>>,
        member_access: Option<Vec<MemberCollectionAccess>>,
    ) -> Self {
        let group_access = group_access.map(|mut entries| {
            entries.sort();
            entries
        });
        let member_access = member_access.map(|mut entries| {
            entries.sort();
            entries
        });
        Self {
            id,
            external_id,
            group_access,
            member_access,
        }
    }
}

impl Diffable for Collection {
    fn id(&self) -> EntityId {
        EntityId::Text(self.id.clone())
    }
}

impl RenderToml for Collection {
    fn to_toml(&self) -> String {
        let mut lines = vec![
            "[[collection]]".to_string(),
            format!("collection_id = {}", toml_string(&self.id)),
            format!("external_id = {}", toml_string(&self.external_id)),
        ];

        if let Some(member_access) = &self.member_access {
            push_access_list(
                &mut lines,
                "member_access",
                member_access.iter().map(MemberCollectionAccess::to_inline_toml),
            );
        }

        if let Some(group_access) = &self.group_access {
            push_access_list(
                &mut lines,
                "group_access",
                group_access.iter().map(GroupCollectionAccess::to_inline_toml),
            );
        }

        lines.join("\n")
    }
}

fn push_access_list(
    lines: &mut Vec<String>,
    key: &str,
    entries: impl Iterator<Item = String>,
) {
    let entries: Vec<String> = entries.collect();
    if entries.is_empty() {
        lines.push(format!("{key} = []"));
        return;
    }
    lines.push(format!("{key} = ["));
    for entry in entries {
        lines.push(format!("  {entry},"));
    }
    lines.push("]".to_string());
}
