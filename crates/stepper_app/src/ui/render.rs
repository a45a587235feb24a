use stepper_core::{ExportPanel, ImportPanel, StepperView, WizardState};

pub fn render(view: &StepperView) -> Vec<String> {
    let (import, export) = match view {
        StepperView::Loading => return vec!["........".to_string()],
        StepperView::Panels { import, export } => (import, export),
    };

    let mut lines = Vec::new();
    match import {
        ImportPanel::StartButton { error } => {
            if let Some(error) = error {
                lines.push(format!("! {error}"));
            }
            lines.push("[Start Import]  (import <namespace>/<repository>)".to_string());
        }
        ImportPanel::Awaiting {
            repository,
            task_id,
        } => lines.push(format!("Importing {repository} (task {task_id})...")),
        ImportPanel::Done { repository } => lines.push(format!("Imported {repository}")),
    }

    match export {
        ExportPanel::Hidden => {}
        ExportPanel::StartButton { error } => {
            if let Some(error) = error {
                lines.push(format!("! {error}"));
            }
            lines.push("[Start Export]  (export)".to_string());
        }
        ExportPanel::Progress { completed, total } => {
            lines.push(format!("Exporting tables: {completed}/{total}"));
        }
        ExportPanel::Finished {
            destination_namespace,
            destination_repository,
        } => {
            lines.push(format!(
                "Export of {destination_namespace}/{destination_repository} complete"
            ));
            lines.push("[Query Seafowl in Splitgraph Console]  [View Report]".to_string());
        }
    }
    lines
}

/// Raw field dump shown when debugging is enabled.
pub fn render_debug(state: &WizardState) -> Vec<String> {
    let mut lines = vec![format!("phase: {}", state.phase())];
    if let Some(repository) = state.source_repository() {
        lines.push(format!("source: {repository}"));
    }
    let optional = [
        ("importTaskId", state.import_job_id()),
        ("importError", state.import_error()),
        ("exportError", state.export_error()),
        ("splitgraphNamespace", state.destination_namespace()),
        ("splitgraphRepository", state.destination_repository()),
    ];
    for (name, value) in optional {
        if let Some(value) = value {
            lines.push(format!("{name}: {value}"));
        }
    }
    for (label, jobs) in [
        ("loading", state.loading_export_jobs()),
        ("completed", state.completed_export_jobs()),
    ] {
        for job in jobs.values() {
            lines.push(format!(
                "{label}: {} -> {}.{}",
                job.task_id, job.destination_schema, job.destination_table
            ));
        }
    }
    lines
}
