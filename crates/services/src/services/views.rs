//! Derived, side-effect-free projections over store snapshots. Every
//! function here is deterministic in its inputs; filters treat an absent
//! predicate as "all".

use db::{
    models::{
        issue::Issue, issue_comment::IssueComment, member::Member, notice::Notice,
        project::Project, wiki_page::WikiPage,
    },
    types::{Industry, IssuePriority, IssueStatus, IssueType, Priority, ProjectStatus},
};
use strum::IntoEnumIterator;
use uuid::Uuid;

/// Read-time placeholder for a member id that no longer resolves.
pub const UNKNOWN_MEMBER: &str = "unknown";
/// Read-time placeholder for a project id that no longer resolves.
pub const MISSING_PROJECT: &str = "-";

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub assignee_id: Option<Uuid>,
    pub issue_type: Option<IssueType>,
    pub priority: Option<IssuePriority>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub industry: Option<Industry>,
    pub search: Option<String>,
}

fn matches_search(needle: &str, haystacks: &[&str]) -> bool {
    let needle = needle.to_lowercase();
    haystacks
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
}

pub fn filter_issues(issues: &[Issue], filter: &IssueFilter) -> Vec<Issue> {
    issues
        .iter()
        .filter(|issue| {
            filter
                .status
                .as_ref()
                .is_none_or(|status| issue.status == *status)
        })
        .filter(|issue| {
            filter
                .assignee_id
                .is_none_or(|assignee| issue.assignee_id == Some(assignee))
        })
        .filter(|issue| {
            filter
                .issue_type
                .as_ref()
                .is_none_or(|issue_type| issue.issue_type == *issue_type)
        })
        .filter(|issue| {
            filter
                .priority
                .as_ref()
                .is_none_or(|priority| issue.priority == *priority)
        })
        .filter(|issue| {
            filter.search.as_deref().is_none_or(|needle| {
                matches_search(needle, &[&issue.title, &issue.description])
            })
        })
        .cloned()
        .collect()
}

pub fn filter_projects(projects: &[Project], filter: &ProjectFilter) -> Vec<Project> {
    projects
        .iter()
        .filter(|project| {
            filter
                .status
                .as_ref()
                .is_none_or(|status| project.status == *status)
        })
        .filter(|project| {
            filter
                .priority
                .as_ref()
                .is_none_or(|priority| project.priority == *priority)
        })
        .filter(|project| {
            filter
                .industry
                .as_ref()
                .is_none_or(|industry| project.industry == *industry)
        })
        .filter(|project| {
            filter.search.as_deref().is_none_or(|needle| {
                matches_search(needle, &[&project.name, &project.description])
            })
        })
        .cloned()
        .collect()
}

/// Favorites ahead of the rest, ties broken by creation time descending.
pub fn favorite_first(projects: &[Project]) -> Vec<Project> {
    let mut ordered = projects.to_vec();
    ordered.sort_by(|a, b| {
        b.favorite
            .cmp(&a.favorite)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ordered
}

/// Kanban partition. Column order follows the canonical status list, not
/// the order statuses appear in the data.
pub fn group_by_status(issues: &[Issue]) -> Vec<(IssueStatus, Vec<Issue>)> {
    IssueStatus::iter()
        .map(|status| {
            let column: Vec<Issue> = issues
                .iter()
                .filter(|issue| issue.status == status)
                .cloned()
                .collect();
            (status, column)
        })
        .collect()
}

/// Comment thread order: oldest first.
pub fn sorted_comments(comments: &[IssueComment]) -> Vec<IssueComment> {
    let mut ordered = comments.to_vec();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    ordered
}

pub fn member_display_name(members: &[Member], id: Uuid) -> String {
    members
        .iter()
        .find(|member| member.id == id)
        .map(|member| member.name.clone())
        .unwrap_or_else(|| UNKNOWN_MEMBER.to_string())
}

pub fn project_display_name(projects: &[Project], id: Uuid) -> String {
    projects
        .iter()
        .find(|project| project.id == id)
        .map(|project| project.name.clone())
        .unwrap_or_else(|| MISSING_PROJECT.to_string())
}

pub fn search_notices(notices: &[Notice], query: &str) -> Vec<Notice> {
    notices
        .iter()
        .filter(|notice| matches_search(query, &[&notice.title, &notice.content]))
        .cloned()
        .collect()
}

pub fn search_wiki_pages(pages: &[WikiPage], query: &str) -> Vec<WikiPage> {
    pages
        .iter()
        .filter(|page| matches_search(query, &[&page.title, &page.content]))
        .cloned()
        .collect()
}
