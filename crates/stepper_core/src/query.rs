//! Bidirectional codec between [`WizardState`] and URL query parameters.
//!
//! The query string is the only persistence the wizard has, so reloads and
//! shared links resume at the encoded step. Parsing is strict: a repeated
//! parameter or a phase missing its required fields is a [`ConfigError`].

use std::collections::BTreeMap;

use thiserror::Error;
use url::Url;

use crate::{GitHubRepository, Phase, UnknownPhase, WizardState};

pub const PARAM_STEPPER_STATE: &str = "stepperState";
pub const PARAM_GITHUB_NAMESPACE: &str = "githubNamespace";
pub const PARAM_GITHUB_REPOSITORY: &str = "githubRepository";
pub const PARAM_IMPORT_TASK_ID: &str = "importTaskId";
pub const PARAM_IMPORT_ERROR: &str = "importError";
pub const PARAM_EXPORT_ERROR: &str = "exportError";
pub const PARAM_SPLITGRAPH_NAMESPACE: &str = "splitgraphNamespace";
pub const PARAM_SPLITGRAPH_REPOSITORY: &str = "splitgraphRepository";

/// Every parameter owned by the stepper, in serialization order.
pub const STEPPER_PARAMS: [&str; 8] = [
    PARAM_STEPPER_STATE,
    PARAM_GITHUB_NAMESPACE,
    PARAM_GITHUB_REPOSITORY,
    PARAM_IMPORT_TASK_ID,
    PARAM_IMPORT_ERROR,
    PARAM_EXPORT_ERROR,
    PARAM_SPLITGRAPH_NAMESPACE,
    PARAM_SPLITGRAPH_REPOSITORY,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("expected only one query param but got multiple: {0}")]
    DuplicateParam(&'static str),
    #[error(transparent)]
    UnknownPhase(#[from] UnknownPhase),
    #[error("missing required keys for {phase}: {}", .missing.join(", "))]
    MissingParams {
        phase: Phase,
        missing: Vec<&'static str>,
    },
}

/// The URL-carried subset of [`WizardState`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedUrlState {
    pub phase: Phase,
    pub source_repository: Option<GitHubRepository>,
    pub import_job_id: Option<String>,
    pub import_error: Option<String>,
    pub export_error: Option<String>,
    pub destination_namespace: Option<String>,
    pub destination_repository: Option<String>,
}

impl ParsedUrlState {
    pub fn from_state(state: &WizardState) -> Self {
        Self {
            phase: state.phase(),
            source_repository: state.source_repository().cloned(),
            import_job_id: state.import_job_id().map(ToOwned::to_owned),
            import_error: state.import_error().map(ToOwned::to_owned),
            export_error: state.export_error().map(ToOwned::to_owned),
            destination_namespace: state.destination_namespace().map(ToOwned::to_owned),
            destination_repository: state.destination_repository().map(ToOwned::to_owned),
        }
    }

    /// A fresh state carrying these fields and no export jobs.
    pub fn into_state(self) -> WizardState {
        let mut state = WizardState::new();
        state.apply_parsed(self);
        state
    }
}

/// Parses already-decoded query pairs.
///
/// Pairs whose key is not a stepper parameter are ignored.
pub fn parse_params<I, K, V>(pairs: I) -> Result<ParsedUrlState, ConfigError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut values: BTreeMap<&'static str, String> = BTreeMap::new();
    for (key, value) in pairs {
        let Some(name) = STEPPER_PARAMS
            .iter()
            .copied()
            .find(|name| *name == key.as_ref())
        else {
            continue;
        };
        if values.insert(name, value.into()).is_some() {
            return Err(ConfigError::DuplicateParam(name));
        }
    }

    let phase = match values.remove(PARAM_STEPPER_STATE) {
        Some(raw) => raw.parse::<Phase>()?,
        None => Phase::Unstarted,
    };

    let github_namespace = values.remove(PARAM_GITHUB_NAMESPACE);
    let github_repository = values.remove(PARAM_GITHUB_REPOSITORY);
    let missing_repository_params: Vec<&'static str> = [
        (PARAM_GITHUB_NAMESPACE, github_namespace.is_none()),
        (PARAM_GITHUB_REPOSITORY, github_repository.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, missing)| missing.then_some(name))
    .collect();
    let source_repository = match (github_namespace, github_repository) {
        (Some(namespace), Some(repository)) => Some(GitHubRepository {
            namespace,
            repository,
        }),
        _ => None,
    };

    let parsed = ParsedUrlState {
        phase,
        source_repository,
        import_job_id: values.remove(PARAM_IMPORT_TASK_ID),
        import_error: values.remove(PARAM_IMPORT_ERROR),
        export_error: values.remove(PARAM_EXPORT_ERROR),
        destination_namespace: values.remove(PARAM_SPLITGRAPH_NAMESPACE),
        destination_repository: values.remove(PARAM_SPLITGRAPH_REPOSITORY),
    };

    validate(&parsed, &missing_repository_params)?;
    Ok(parsed)
}

/// Parses a raw query string such as `stepperState=unstarted&foo=bar`.
pub fn parse_query(query: &str) -> Result<ParsedUrlState, ConfigError> {
    let query = query.strip_prefix('?').unwrap_or(query);
    parse_params(url::form_urlencoded::parse(query.as_bytes()).into_owned())
}

pub fn parse_url(url: &Url) -> Result<ParsedUrlState, ConfigError> {
    parse_params(url.query_pairs().into_owned())
}

/// Parameters each phase requires when reconstructed from external input.
pub fn required_params(phase: Phase) -> &'static [&'static str] {
    match phase {
        Phase::Uninitialized | Phase::Unstarted => &[],
        Phase::AwaitingImport => &[
            PARAM_GITHUB_NAMESPACE,
            PARAM_GITHUB_REPOSITORY,
            PARAM_IMPORT_TASK_ID,
            PARAM_SPLITGRAPH_NAMESPACE,
            PARAM_SPLITGRAPH_REPOSITORY,
        ],
        Phase::ImportComplete | Phase::AwaitingExport | Phase::ExportComplete => &[
            PARAM_GITHUB_NAMESPACE,
            PARAM_GITHUB_REPOSITORY,
            PARAM_SPLITGRAPH_NAMESPACE,
            PARAM_SPLITGRAPH_REPOSITORY,
        ],
    }
}

fn validate(
    parsed: &ParsedUrlState,
    missing_repository_params: &[&'static str],
) -> Result<(), ConfigError> {
    let missing: Vec<&'static str> = required_params(parsed.phase)
        .iter()
        .copied()
        .filter(|name| match *name {
            PARAM_GITHUB_NAMESPACE | PARAM_GITHUB_REPOSITORY => {
                missing_repository_params.contains(name)
            }
            PARAM_IMPORT_TASK_ID => parsed.import_job_id.is_none(),
            PARAM_SPLITGRAPH_NAMESPACE => parsed.destination_namespace.is_none(),
            PARAM_SPLITGRAPH_REPOSITORY => parsed.destination_repository.is_none(),
            _ => false,
        })
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingParams {
            phase: parsed.phase,
            missing,
        })
    }
}

/// Projects the URL-carried fields to query pairs, omitting absent ones.
pub fn serialize(state: &WizardState) -> Vec<(&'static str, String)> {
    let repository = state.source_repository();
    let optional = [
        (PARAM_GITHUB_NAMESPACE, repository.map(|r| r.namespace.as_str())),
        (PARAM_GITHUB_REPOSITORY, repository.map(|r| r.repository.as_str())),
        (PARAM_IMPORT_TASK_ID, state.import_job_id()),
        (PARAM_IMPORT_ERROR, state.import_error()),
        (PARAM_EXPORT_ERROR, state.export_error()),
        (PARAM_SPLITGRAPH_NAMESPACE, state.destination_namespace()),
        (PARAM_SPLITGRAPH_REPOSITORY, state.destination_repository()),
    ];

    let mut pairs = Vec::with_capacity(STEPPER_PARAMS.len());
    pairs.push((PARAM_STEPPER_STATE, state.phase().as_str().to_string()));
    pairs.extend(
        optional
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value.to_string()))),
    );
    pairs
}

/// Returns `url` with its stepper parameters replaced by those of `state`.
///
/// Unrelated parameters keep their original order and come first.
pub fn apply_to_url(url: &Url, state: &WizardState) -> Url {
    let unrelated: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !STEPPER_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut next = url.clone();
    {
        let mut query = next.query_pairs_mut();
        query.clear();
        for (key, value) in &unrelated {
            query.append_pair(key, value);
        }
        for (key, value) in serialize(state) {
            query.append_pair(key, &value);
        }
    }
    next
}
