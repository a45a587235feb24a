use stepper_logging::{stepper_debug, stepper_warn};

use crate::{Action, Effect, Phase, TaskId, Watch, WizardState};

/// Pure update function: applies an action to state and returns any effects.
///
/// Effects are derived by comparing the state before and after the action, so
/// an `initialize_from_url` that lands in a waiting phase resumes the same
/// watches a direct transition would have started.
pub fn update(mut state: WizardState, action: Action) -> (WizardState, Vec<Effect>) {
    let previous = state.clone();

    match action {
        Action::StartImport {
            repository,
            task_id,
            destination_namespace,
            destination_repository,
        } => {
            state.start_import(
                repository,
                task_id,
                destination_namespace,
                destination_repository,
            );
        }
        Action::ImportComplete => {
            if state.phase() != Phase::AwaitingImport {
                stepper_debug!("import_complete received in phase {}", state.phase());
            }
            state.set_phase(Phase::ImportComplete);
        }
        Action::StartExport { jobs } => {
            state.start_export(jobs);
        }
        Action::ExportTableTaskComplete { task_id } => {
            if !state.complete_export_task(&task_id) {
                stepper_warn!(
                    "ignoring completion for export task {} which is not loading",
                    task_id
                );
                return (state, Vec::new());
            }
        }
        Action::ExportComplete => {
            state.set_phase(Phase::ExportComplete);
        }
        Action::ImportError { error } => {
            state.fail_import(error);
        }
        Action::ExportError { error } => {
            state.fail_export(error);
        }
        Action::Reset => {
            state = WizardState::new();
        }
        Action::InitializeFromUrl(parsed) => {
            state.apply_parsed(parsed);
        }
    }

    let effects = derive_effects(&previous, &state);
    (state, effects)
}

fn derive_effects(previous: &WizardState, next: &WizardState) -> Vec<Effect> {
    let mut cancels = Vec::new();
    let mut starts = Vec::new();

    let previous_import = import_watch(previous);
    let next_import = import_watch(next);
    if previous_import != next_import {
        if previous_import.is_some() {
            cancels.push(Effect::Cancel(Watch::Import));
        }
        if let Some((task_id, namespace, repository)) = next_import {
            starts.push(Effect::AwaitImport {
                task_id: task_id.to_string(),
                destination_namespace: namespace.to_string(),
                destination_repository: repository.to_string(),
            });
        }
    }

    let previous_exporting = exporting(previous);
    // Re-entering awaiting_export resumes every loading task; a running watch
    // only gains the keys it lacks.
    let new_tasks: Vec<TaskId> = match (previous_exporting, exporting(next)) {
        (_, false) => Vec::new(),
        (false, true) => next.loading_export_jobs().keys().cloned().collect(),
        (true, true) => next
            .loading_export_jobs()
            .keys()
            .filter(|task_id| !previous.loading_export_jobs().contains_key(*task_id))
            .cloned()
            .collect(),
    };
    let drained = next.phase() == Phase::ExportComplete
        && next.loading_export_jobs().is_empty()
        && !next.completed_export_jobs().is_empty();
    if previous_exporting && !drained && (!exporting(next) || !new_tasks.is_empty()) {
        cancels.push(Effect::Cancel(Watch::Export));
    }
    if !new_tasks.is_empty() {
        starts.push(Effect::AwaitExportTasks {
            task_ids: new_tasks,
        });
    }

    let previous_target = completion_watch(previous);
    let next_target = completion_watch(next);
    if previous_target != next_target {
        if previous_target.is_some() {
            cancels.push(Effect::Cancel(Watch::Completion));
        }
        if let Some(target) = next_target {
            starts.push(Effect::NotifyCompletion(target));
        }
    } else if next.phase() == Phase::ExportComplete
        && previous.phase() != Phase::ExportComplete
        && next_target.is_none()
    {
        stepper_warn!("export_complete reached without source and destination identity");
    }

    cancels.extend(starts);
    cancels
}

fn import_watch(state: &WizardState) -> Option<(&str, &str, &str)> {
    if state.phase() != Phase::AwaitingImport {
        return None;
    }
    Some((
        state.import_job_id()?,
        state.destination_namespace()?,
        state.destination_repository()?,
    ))
}

fn exporting(state: &WizardState) -> bool {
    state.phase() == Phase::AwaitingExport && !state.loading_export_jobs().is_empty()
}

fn completion_watch(state: &WizardState) -> Option<crate::CompletionRequest> {
    if state.phase() != Phase::ExportComplete {
        return None;
    }
    state.completion_target()
}
