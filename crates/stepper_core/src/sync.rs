use url::Url;

use crate::query::{apply_to_url, parse_url, ParsedUrlState};
use crate::{Phase, WizardState};

/// True when `url` encodes a different step than `state`.
///
/// Only phase, repository identity, import job id and the destination pair
/// take part; error messages alone never force a replace. A URL that no
/// longer parses always needs replacing.
pub fn url_needs_change(state: &WizardState, url: &Url) -> bool {
    match parse_url(url) {
        Ok(encoded) => !encodes_same_step(state, &encoded),
        Err(_) => true,
    }
}

fn encodes_same_step(state: &WizardState, encoded: &ParsedUrlState) -> bool {
    state.phase() == encoded.phase
        && state.source_repository() == encoded.source_repository.as_ref()
        && state.import_job_id() == encoded.import_job_id.as_deref()
        && state.destination_namespace() == encoded.destination_namespace.as_deref()
        && state.destination_repository() == encoded.destination_repository.as_deref()
}

/// The URL to replace the current one with, or `None` if it is up to date.
///
/// Never produces a URL while the state is still `uninitialized`.
pub fn sync_target(state: &WizardState, current: &Url) -> Option<Url> {
    if state.phase() == Phase::Uninitialized {
        return None;
    }
    if !url_needs_change(state, current) {
        return None;
    }
    Some(apply_to_url(current, state))
}
