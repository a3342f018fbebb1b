use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::bitwarden::{
    Collection, Group, GroupAccess, GroupCollectionAccess, GroupMember, Member,
    MemberCollectionAccess, MemberType,
};

#[derive(Debug, Deserialize)]
struct VaultFile {
    #[serde(default)]
    member: Vec<MemberEntry>,
    #[serde(default)]
    group: Vec<GroupEntry>,
    #[serde(default)]
    collection: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct MemberEntry {
    member_id: String,
    member_name: String,
    email: String,
    #[serde(rename = "type")]
    member_type: String,
    #[serde(default)]
    access_all: bool,
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    group_id: String,
    group_name: String,
    #[serde(default)]
    access_all: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    collection_id: String,
    external_id: String,
    member_access: Option<Vec<MemberAccessEntry>>,
    group_access: Option<Vec<GroupAccessEntry>>,
}

#[derive(Debug, Deserialize)]
struct MemberAccessEntry {
    member_name: String,
}

#[derive(Debug, Deserialize)]
struct GroupAccessEntry {
    group_name: String,
    #[serde(default)]
    read_only: bool,
}

#[derive(Debug, Clone)]
pub struct BitwardenManifest {
    pub members: BTreeSet<Member>,
    pub groups: BTreeSet<Group>,
    pub collections: BTreeSet<Collection>,
    pub group_memberships: BTreeSet<GroupMember>,
}

impl BitwardenManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading manifest: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("failed parsing manifest: {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: VaultFile = toml::from_str(raw)?;

        let mut members = BTreeSet::new();
        for entry in &file.member {
            let member_type = MemberType::from_str(&entry.member_type)
                .with_context(|| format!("member {}", entry.member_name))?;
            members.insert(Member {
                id: entry.member_id.clone(),
                name: entry.member_name.clone(),
                email: entry.email.clone(),
                member_type,
                access_all: entry.access_all,
            });
        }

        let groups: BTreeSet<Group> = file
            .group
            .into_iter()
            .map(|entry| Group {
                id: entry.group_id,
                name: entry.group_name,
                access_all: entry.access_all,
            })
            .collect();

        let group_memberships: BTreeSet<GroupMember> = file
            .member
            .iter()
            .flat_map(|entry| {
                entry.groups.iter().map(|group_name| GroupMember {
                    member_id: entry.member_id.clone(),
                    member_name: entry.member_name.clone(),
                    group_name: group_name.clone(),
                })
            })
            .collect();

        let collections: BTreeSet<Collection> = file
            .collection
            .into_iter()
            .map(|entry| {
                Collection::new(
                    entry.collection_id,
                    entry.external_id,
                    entry.group_access.map(|accesses| {
                        accesses
                            .into_iter()
                            .map(|access| GroupCollectionAccess {
                                name: access.group_name,
                                access: GroupAccess::from_read_only(access.read_only),
                            })
                            .collect()
                    }),
                    entry.member_access.map(|accesses| {
                        accesses
                            .into_iter()
                            .map(|access| MemberCollectionAccess {
                                name: access.member_name,
                            })
                            .collect()
                    }),
                )
            })
            .collect();

        Ok(Self {
            members,
            groups,
            collections,
            group_memberships,
        })
    }

    pub fn template() -> &'static str {
        r#"[[member]]
member_id = "2564c11f-fc1b-4ec7-aa0b-afaf00a9e4a4"
member_name = "yan"
email = "yan@example.com"
type = "member"
groups = ["group1", "group2"]

[[member]]
member_id = "856cba2d-cae1-40e7-96cc-afaf00a8a4cb"
member_name = "yunkel"
email = "yunkel@example.com"
type = "owner"
# access_all is optional, default is false.
access_all = true
groups = ["group1"]

[[group]]
group_id = "c6a13b93-edc1-4c3b-9fc5-afaf00a8d33f"
group_name = "group1"
access_all = false

[[group]]
group_id = "39b48ab2-81fd-40eb-87e9-afb0000110f3"
group_name = "group2"
access_all = false

[[collection]]
collection_id = "50351c20-55b4-4ee8-bbe0-afaf00a8f25d"
external_id = "collection1"
member_access = [
  { member_name = "yan" },
]
group_access = [
  { group_name = "group1", read_only = true },
  { group_name = "group2", read_only = true },
]
"#
    }
}
