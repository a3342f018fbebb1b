use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::Diff;
use crate::model::bitwarden::{Collection, Group, GroupMember, Member};
use crate::model::github::{OrganizationMember, Team, TeamMember};

#[derive(Debug, Serialize)]
pub struct GithubDriftReport {
    pub organization: String,
    pub scanned_at: DateTime<Utc>,
    pub members: Diff<OrganizationMember>,
    pub teams: Diff<Team>,
    pub team_memberships: BTreeMap<String, Diff<TeamMember>>,
}

impl GithubDriftReport {
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        let mut rows = vec![
            SummaryRow::from_diff("members", &self.members),
            SummaryRow::from_diff("teams", &self.teams),
        ];
        for (team_name, diff) in &self.team_memberships {
            rows.push(SummaryRow::from_diff(
                &format!("members of team '{team_name}'"),
                diff,
            ));
        }
        rows
    }
}

#[derive(Debug, Serialize)]
pub struct BitwardenDriftReport {
    pub scanned_at: DateTime<Utc>,
    pub members: Diff<Member>,
    pub collections: Diff<Collection>,
    pub groups: Diff<Group>,
    pub group_memberships: BTreeMap<String, Diff<GroupMember>>,
}

impl BitwardenDriftReport {
    pub fn summary_rows(&self) -> Vec<SummaryRow> {
        let mut rows = vec![
            SummaryRow::from_diff("members", &self.members),
            SummaryRow::from_diff("collections", &self.collections),
            SummaryRow::from_diff("groups", &self.groups),
        ];
        for (group_name, diff) in &self.group_memberships {
            rows.push(SummaryRow::from_diff(
                &format!("members of group '{group_name}'"),
                diff,
            ));
        }
        rows
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub kind: String,
    pub to_add: usize,
    pub to_remove: usize,
    pub to_change: usize,
}

impl SummaryRow {
    pub fn from_diff<T>(kind: &str, diff: &Diff<T>) -> Self {
        Self {
            kind: kind.to_string(),
            to_add: diff.to_add.len(),
            to_remove: diff.to_remove.len(),
            to_change: diff.to_change.len(),
        }
    }
}
