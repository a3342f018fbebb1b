use std::collections::{BTreeMap, BTreeSet};

use anyhow::{anyhow, Context, Result};
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::model::bitwarden::{
    Collection, Group, GroupAccess, GroupCollectionAccess, GroupMember, Member,
    MemberCollectionAccess, MemberType,
};
use crate::remote::http::{
    array_field, bool_field, client, read_json, string_field, string_field_or_default, u64_field,
};

const DEFAULT_API_URL: &str = "https://api.bitwarden.com";
const IDENTITY_TOKEN_URL: &str = "https://identity.bitwarden.com/connect/token";

pub struct BitwardenClient {
    bearer_token: String,
    api_url: String,
}

impl BitwardenClient {
    pub async fn connect(
        client_id: &str,
        client_secret: &str,
        api_url: Option<String>,
    ) -> Result<Self> {
        let response = client()
            .post(IDENTITY_TOKEN_URL)
            .basic_auth(client_id, Some(client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", "api.organization"),
            ])
            .send()
            .await
            .context("failed requesting Bitwarden access token")?;
        let payload = read_json(response).await?;
        let bearer_token = string_field(&payload, "access_token")?;
        Ok(Self {
            bearer_token,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    pub async fn from_env(api_url: Option<String>) -> Result<Self> {
        let client_id = std::env::var("BITWARDEN_CLIENT_ID")
            .context("expected BITWARDEN_CLIENT_ID environment variable to be set")?;
        let client_secret = std::env::var("BITWARDEN_CLIENT_SECRET")
            .context("expected BITWARDEN_CLIENT_SECRET environment variable to be set")?;
        Self::connect(&client_id, &client_secret, api_url).await
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.api_url, path);
        let response = client()
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("failed GET request: {url}"))?;
        read_json(response).await
    }

    pub async fn members(&self) -> Result<BTreeSet<Member>> {
        let payload = self.get_json("/public/members").await?;
        array_field(&payload, "data")?
            .iter()
            .map(member_from_json)
            .collect()
    }

    pub async fn groups(&self) -> Result<BTreeSet<Group>> {
        let payload = self.get_json("/public/groups").await?;
        array_field(&payload, "data")?
            .iter()
            .map(group_from_json)
            .collect()
    }

    pub async fn group_members(
        &self,
        group: &Group,
        members_by_id: &BTreeMap<String, Member>,
    ) -> Result<BTreeSet<GroupMember>> {
        let member_ids = self
            .member_ids_of_group(&group.id)
            .await
            .with_context(|| format!("failed listing members of group '{}'", group.name))?;

        let mut out = BTreeSet::new();
        for member_id in member_ids {
            let member = members_by_id.get(&member_id).with_context(|| {
                format!("group '{}' references unknown member id {member_id}", group.name)
            })?;
            out.insert(GroupMember {
                member_id: member.id.clone(),
                member_name: member.name.clone(),
                group_name: group.name.clone(),
            });
        }
        Ok(out)
    }

    pub async fn collections(
        &self,
        members_by_id: &BTreeMap<String, Member>,
        groups_by_id: &BTreeMap<String, Group>,
    ) -> Result<BTreeSet<Collection>> {
        let payload = self.get_json("/public/collections").await?;

        let mut out = BTreeSet::new();
        for item in array_field(&payload, "data")? {
            let collection_id = string_field(item, "id")?;
            let external_id = string_field_or_default(item, "externalId");

            let detail = self
                .get_json(&format!("/public/collections/{collection_id}"))
                .await?;
            let group_entries = array_field(&detail, "groups")?;

            let mut group_access = Vec::new();
            for entry in group_entries {
                let group_id = string_field(entry, "id")?;
                let group = groups_by_id.get(&group_id).with_context(|| {
                    format!("collection {collection_id} references unknown group id {group_id}")
                })?;
                group_access.push(GroupCollectionAccess {
                    name: group.name.clone(),
                    access: GroupAccess::from_read_only(bool_field(entry, "readOnly")?),
                });
            }

            // Member access exists only through groups, so a collection with
            // no group access has no member access either.
            let (group_access, member_access) = if group_access.is_empty() {
                (None, None)
            } else {
                let mut member_access = Vec::new();
                for entry in group_entries {
                    let group_id = string_field(entry, "id")?;
                    for member_id in self.member_ids_of_group(&group_id).await? {
                        let member = members_by_id.get(&member_id).with_context(|| {
                            format!("group {group_id} references unknown member id {member_id}")
                        })?;
                        member_access.push(MemberCollectionAccess {
                            name: member.name.clone(),
                        });
                    }
                }
                let member_access = if member_access.is_empty() {
                    None
                } else {
                    Some(member_access)
                };
                (Some(group_access), member_access)
            };

            out.insert(Collection::new(
                collection_id,
                external_id,
                group_access,
                member_access,
            ));
        }
        Ok(out)
    }

    async fn member_ids_of_group(&self, group_id: &str) -> Result<Vec<String>> {
        let payload = self
            .get_json(&format!("/public/groups/{group_id}/member-ids"))
            .await?;
        let ids = payload
            .as_array()
            .ok_or_else(|| anyhow!("expected a JSON array of member ids for group {group_id}"))?;
        ids.iter()
            .map(|id| {
                id.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("member id of group {group_id} is not a string"))
            })
            .collect()
    }
}

fn member_from_json(value: &Value) -> Result<Member> {
    let type_code = u64_field(value, "type")?;
    let member_type = MemberType::from_api_code(type_code)
        .ok_or_else(|| anyhow!("unknown member type code: {type_code}"))?;
    Ok(Member {
        id: string_field(value, "id")?,
        // Invited members may not have filled in their name yet.
        name: string_field_or_default(value, "name"),
        email: string_field(value, "email")?,
        member_type,
        access_all: bool_field(value, "accessAll")?,
    })
}

fn group_from_json(value: &Value) -> Result<Group> {
    Ok(Group {
        id: string_field(value, "id")?,
        name: string_field(value, "name")?,
        access_all: bool_field(value, "accessAll")?,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::model::bitwarden::MemberType;
    use crate::remote::bitwarden::{group_from_json, member_from_json};

    #[test]
    fn parses_a_member_with_an_integer_type() {
        let payload = json!({
            "id": "2564c11f",
            "name": "yan",
            "email": "yan@example.com",
            "type": 2,
            "accessAll": false
        });
        let member = member_from_json(&payload).unwrap();
        assert_eq!(member.member_type, MemberType::User);
        assert_eq!(member.name, "yan");
    }

    #[test]
    fn tolerates_a_null_member_name() {
        let payload = json!({
            "id": "856cba2d",
            "name": null,
            "email": "invitee@example.com",
            "type": 0,
            "accessAll": true
        });
        let member = member_from_json(&payload).unwrap();
        assert_eq!(member.name, "");
        assert_eq!(member.member_type, MemberType::Owner);
        assert!(member.access_all);
    }

    #[test]
    fn rejects_an_out_of_range_member_type() {
        let payload = json!({
            "id": "856cba2d",
            "name": "zed",
            "email": "zed@example.com",
            "type": 7,
            "accessAll": false
        });
        assert!(member_from_json(&payload).is_err());
    }

    #[test]
    fn parses_a_group_listing_entry() {
        let payload = json!({
            "id": "c6a13b93",
            "name": "group1",
            "accessAll": false
        });
        let group = group_from_json(&payload).unwrap();
        assert_eq!(group.name, "group1");
        assert!(!group.access_all);
    }
}
