//! Fixed table lists sent to the ingestion connector and the export endpoint.
//!
//! These are curated by hand; nothing here is derived at runtime.

/// GitHub tables requested from the ingestion connector. Selecting them
/// explicitly keeps imports of large repositories fast; the connector still
/// imports dependent tables and its own metadata tables.
pub const RELEVANT_GITHUB_TABLE_NAMES_FOR_IMPORT: &[&str] = &[
    "stargazers",
    "commits",
    "comments",
    "pull_requests",
    "pull_request_stats",
    "issue_reactions",
];

/// Imported tables exported to the query engine. `stargazers_user` is a
/// dependent table of `stargazers` and has to be listed on its own.
pub const SPLITGRAPH_TABLES_TO_EXPORT_TO_SEAFOWL: &[&str] = &["stargazers", "stargazers_user"];

/// Tables the connector is expected to produce for
/// [`RELEVANT_GITHUB_TABLE_NAMES_FOR_IMPORT`]. Manually curated and possibly
/// incomplete.
pub const EXPECTED_IMPORTED_TABLE_NAMES: &[&str] = &[
    "_airbyte_raw_comments",
    "_airbyte_raw_commits",
    "_airbyte_raw_issue_reactions",
    "_airbyte_raw_pull_request_stats",
    "_airbyte_raw_pull_requests",
    "_sg_ingestion_state",
    "comments",
    "comments_user",
    "commits",
    "commits_author",
    "commits_commit",
    "commits_commit_author",
    "commits_commit_committer",
    "commits_commit_tree",
    "commits_commit_verification",
    "commits_committer",
    "commits_parents",
    "issue_reactions",
    "issue_reactions_user",
    "pull_request_stats",
    "pull_request_stats_merged_by",
    "pull_requests",
    "pull_requests__links",
    "pull_requests__links_comments",
    "pull_requests__links_commits",
    "pull_requests__links_html",
    "pull_requests__links_issue",
    "pull_requests__links_review_comment",
    "pull_requests__links_review_comments",
    "pull_requests__links_self",
    "pull_requests__links_statuses",
    "pull_requests_assignee",
    "pull_requests_assignees",
    "pull_requests_auto_merge",
    "pull_requests_auto_merge_enabled_by",
    "pull_requests_base",
    "pull_requests_head",
    "pull_requests_labels",
    "pull_requests_milestone",
    "pull_requests_milestone_creator",
    "pull_requests_requested_reviewers",
    "pull_requests_requested_teams",
    "pull_requests_user",
];

/// One `{namespace, repository, table}` triple of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTableInput {
    pub namespace: String,
    pub repository: String,
    pub table: String,
}

pub fn tables_to_export(namespace: &str, repository: &str) -> Vec<ExportTableInput> {
    SPLITGRAPH_TABLES_TO_EXPORT_TO_SEAFOWL
        .iter()
        .map(|table| ExportTableInput {
            namespace: namespace.to_string(),
            repository: repository.to_string(),
            table: (*table).to_string(),
        })
        .collect()
}
