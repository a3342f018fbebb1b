use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use access_drift::diff::Diff;
use access_drift::manifest::{BitwardenManifest, OrgManifest};
use access_drift::model::bitwarden::{Group, GroupMember, Member};
use access_drift::model::github::TeamMember;
use access_drift::output::json::render_json;
use access_drift::output::table::render_summary_table;
use access_drift::remote::{BitwardenClient, GithubClient};
use access_drift::report::{BitwardenDriftReport, GithubDriftReport};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Summary,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Service {
    Github,
    Bitwarden,
}

#[derive(Debug, Parser)]
#[command(
    name = "access-drift",
    about = "Compare declared organization access against the live state"
)]
struct Cli {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Github {
        manifest: PathBuf,
        #[arg(long)]
        api_url: Option<String>,
    },
    Bitwarden {
        manifest: PathBuf,
        #[arg(long)]
        api_url: Option<String>,
    },
    Template {
        service: Service,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Github { manifest, api_url } => {
            run_github(manifest, api_url.clone(), cli.output).await
        }
        Commands::Bitwarden { manifest, api_url } => {
            run_bitwarden(manifest, api_url.clone(), cli.output).await
        }
        Commands::Template { service } => {
            match service {
                Service::Github => print!("{}", OrgManifest::template()),
                Service::Bitwarden => print!("{}", BitwardenManifest::template()),
            }
            Ok(())
        }
    }
}

async fn run_github(
    manifest_path: &Path,
    api_url: Option<String>,
    output: OutputFormat,
) -> Result<()> {
    let manifest = OrgManifest::load(manifest_path)?;
    let manifest_name = manifest_path.display().to_string();
    let client = GithubClient::from_env(api_url)?;
    let org = manifest.organization.clone();

    let current_members = client.organization_members(&org).await?;
    let members = Diff::between(&manifest.members, &current_members);

    let current_teams = client.organization_teams(&org).await?;
    let teams = Diff::between(&manifest.teams, &current_teams);

    // Compare members only for the teams which we want to exist and which do
    // actually exist.
    let target_team_names: BTreeSet<&str> =
        manifest.teams.iter().map(|team| team.name.as_str()).collect();
    let mut team_memberships = BTreeMap::new();
    for team in &current_teams {
        if !target_team_names.contains(team.name.as_str()) {
            continue;
        }
        let actual_members = client.team_members(&org, team).await?;
        let target_members: BTreeSet<TeamMember> = manifest
            .team_memberships
            .iter()
            .filter(|membership| membership.team_name == team.name)
            .cloned()
            .collect();
        let diff = Diff::between(&target_members, &actual_members);
        if !diff.is_empty() {
            team_memberships.insert(team.name.clone(), diff);
        }
    }

    let report = GithubDriftReport {
        organization: org,
        scanned_at: Utc::now(),
        members,
        teams,
        team_memberships,
    };

    match output {
        OutputFormat::Text => {
            print!(
                "{}",
                report.members.render(
                    &format!("The following members are specified in {manifest_name} but not a member of the GitHub organization:"),
                    &format!("The following members of the GitHub organization are not specified in {manifest_name}:"),
                    &format!("The following members on GitHub need to be changed to match {manifest_name}:"),
                )
            );
            print!(
                "{}",
                report.teams.render(
                    &format!("The following teams specified in {manifest_name} are not present on GitHub:"),
                    &format!("The following teams in the GitHub organization are not specified in {manifest_name}:"),
                    &format!("The following teams on GitHub need to be changed to match {manifest_name}:"),
                )
            );
            for (team_name, diff) in &report.team_memberships {
                print!(
                    "{}",
                    render_team_members_diff(team_name, &manifest_name, diff)
                );
            }
        }
        OutputFormat::Json => println!("{}", render_json(&report)?),
        OutputFormat::Summary => println!("{}", render_summary_table(&report.summary_rows())),
    }
    Ok(())
}

async fn run_bitwarden(
    manifest_path: &Path,
    api_url: Option<String>,
    output: OutputFormat,
) -> Result<()> {
    let manifest = BitwardenManifest::load(manifest_path)?;
    let manifest_name = manifest_path.display().to_string();
    let client = BitwardenClient::from_env(api_url).await?;

    let current_members = client.members().await?;
    let members = Diff::between(&manifest.members, &current_members);
    let members_by_id: BTreeMap<String, Member> = current_members
        .iter()
        .map(|member| (member.id.clone(), member.clone()))
        .collect();

    let current_groups = client.groups().await?;
    let groups_by_id: BTreeMap<String, Group> = current_groups
        .iter()
        .map(|group| (group.id.clone(), group.clone()))
        .collect();

    let current_collections = client.collections(&members_by_id, &groups_by_id).await?;
    let collections = Diff::between(&manifest.collections, &current_collections);

    let groups = Diff::between(&manifest.groups, &current_groups);

    // Compare members only for the groups which we want to exist and which do
    // actually exist.
    let target_group_names: BTreeSet<&str> = manifest
        .groups
        .iter()
        .map(|group| group.name.as_str())
        .collect();
    let mut group_memberships = BTreeMap::new();
    for group in &current_groups {
        if !target_group_names.contains(group.name.as_str()) {
            continue;
        }
        let actual_members = client.group_members(group, &members_by_id).await?;
        let target_members: BTreeSet<GroupMember> = manifest
            .group_memberships
            .iter()
            .filter(|membership| membership.group_name == group.name)
            .cloned()
            .collect();
        let diff = Diff::between(&target_members, &actual_members);
        if !diff.is_empty() {
            group_memberships.insert(group.name.clone(), diff);
        }
    }

    let report = BitwardenDriftReport {
        scanned_at: Utc::now(),
        members,
        collections,
        groups,
        group_memberships,
    };

    match output {
        OutputFormat::Text => {
            print!(
                "{}",
                report.members.render(
                    &format!("The following members are specified in {manifest_name} but not a member of the Bitwarden organization:"),
                    &format!("The following members are not specified in {manifest_name} but are a member of the Bitwarden organization:"),
                    &format!("The following members on Bitwarden need to be changed to match {manifest_name}:"),
                )
            );
            print!(
                "{}",
                report.collections.render(
                    &format!("The following collections are specified in {manifest_name} but not present on Bitwarden:"),
                    &format!("The following collections are not specified in {manifest_name} but are present on Bitwarden:"),
                    &format!("The following collections on Bitwarden need to be changed to match {manifest_name}:"),
                )
            );
            print!(
                "{}",
                report.groups.render(
                    &format!("The following groups specified in {manifest_name} are not present on Bitwarden:"),
                    &format!("The following groups are not specified in {manifest_name} but are present on Bitwarden:"),
                    &format!("The following groups on Bitwarden need to be changed to match {manifest_name}:"),
                )
            );
            for (group_name, diff) in &report.group_memberships {
                print!(
                    "{}",
                    render_group_members_diff(group_name, &manifest_name, diff)
                );
            }
        }
        OutputFormat::Json => println!("{}", render_json(&report)?),
        OutputFormat::Summary => println!("{}", render_summary_table(&report.summary_rows())),
    }
    Ok(())
}

// Membership diffs are not expressed in toml; they print as plain name lists,
// removals first. Changes cannot occur because a membership's identity covers
// its full value.
fn render_team_members_diff(team_name: &str, manifest_name: &str, diff: &Diff<TeamMember>) -> String {
    let mut out = String::new();
    if !diff.to_remove.is_empty() {
        out.push_str(&format!(
            "The following members of team '{team_name}' are not specified in {manifest_name}, but are present on GitHub:\n\n"
        ));
        for member in &diff.to_remove {
            out.push_str(&format!("  {}\n", member.user_name));
        }
        out.push('\n');
    }
    if !diff.to_add.is_empty() {
        out.push_str(&format!(
            "The following members of team '{team_name}' are not members on GitHub, but are specified in {manifest_name}:\n\n"
        ));
        for member in &diff.to_add {
            out.push_str(&format!("  {}\n", member.user_name));
        }
        out.push('\n');
    }
    out
}

fn render_group_members_diff(
    group_name: &str,
    manifest_name: &str,
    diff: &Diff<GroupMember>,
) -> String {
    let mut out = String::new();
    if !diff.to_remove.is_empty() {
        out.push_str(&format!(
            "The following members of group '{group_name}' are not specified in {manifest_name}, but are present on Bitwarden:\n\n"
        ));
        for member in &diff.to_remove {
            out.push_str(&format!("  {}\n", member.member_name));
        }
        out.push('\n');
    }
    if !diff.to_add.is_empty() {
        out.push_str(&format!(
            "The following members of group '{group_name}' are specified in {manifest_name}, but are not present on Bitwarden:\n\n"
        ));
        for member in &diff.to_add {
            out.push_str(&format!("  {}\n", member.member_name));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use access_drift::diff::Diff;
    use access_drift::model::github::TeamMember;

    use crate::render_team_members_diff;

    fn membership(user_id: u64, user_name: &str) -> TeamMember {
        TeamMember {
            user_id,
            user_name: user_name.to_string(),
            team_name: "developers".to_string(),
        }
    }

    #[test]
    fn membership_diff_prints_removals_before_additions() {
        let target: BTreeSet<_> = [membership(1, "alice"), membership(2, "bob")]
            .into_iter()
            .collect();
        let actual: BTreeSet<_> = [membership(1, "alice"), membership(3, "carol")]
            .into_iter()
            .collect();

        let diff = Diff::between(&target, &actual);
        let rendered = render_team_members_diff("developers", "org.toml", &diff);
        assert_eq!(
            rendered,
            "The following members of team 'developers' are not specified in org.toml, \
             but are present on GitHub:\n\
             \n\
             \x20 carol\n\
             \n\
             The following members of team 'developers' are not members on GitHub, \
             but are specified in org.toml:\n\
             \n\
             \x20 bob\n\
             \n"
        );
    }

    #[test]
    fn clean_membership_diff_prints_nothing() {
        let members: BTreeSet<_> = [membership(1, "alice")].into_iter().collect();
        let diff = Diff::between(&members, &members);
        assert_eq!(render_team_members_diff("developers", "org.toml", &diff), "");
    }
}
