use crate::{GitHubRepository, Phase, WizardState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportPanel {
    /// Repository input and the Start Import button.
    StartButton { error: Option<String> },
    Awaiting {
        repository: GitHubRepository,
        task_id: String,
    },
    Done { repository: GitHubRepository },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPanel {
    Hidden,
    StartButton { error: Option<String> },
    Progress { completed: usize, total: usize },
    Finished {
        destination_namespace: String,
        destination_repository: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepperView {
    /// Still waiting for the first URL parse.
    Loading,
    Panels {
        import: ImportPanel,
        export: ExportPanel,
    },
}

impl StepperView {
    pub fn from_state(state: &WizardState) -> Self {
        if state.phase() == Phase::Uninitialized {
            return StepperView::Loading;
        }
        StepperView::Panels {
            import: import_panel(state),
            export: export_panel(state),
        }
    }
}

fn import_panel(state: &WizardState) -> ImportPanel {
    let repository = state.source_repository().cloned();
    match (state.phase(), repository) {
        (Phase::AwaitingImport, Some(repository)) => ImportPanel::Awaiting {
            repository,
            task_id: state.import_job_id().unwrap_or_default().to_string(),
        },
        (
            Phase::ImportComplete | Phase::AwaitingExport | Phase::ExportComplete,
            Some(repository),
        ) => ImportPanel::Done { repository },
        _ => ImportPanel::StartButton {
            error: state.import_error().map(ToOwned::to_owned),
        },
    }
}

fn export_panel(state: &WizardState) -> ExportPanel {
    match state.phase() {
        Phase::ImportComplete => ExportPanel::StartButton {
            error: state.export_error().map(ToOwned::to_owned),
        },
        Phase::AwaitingExport => {
            let completed = state.completed_export_jobs().len();
            ExportPanel::Progress {
                completed,
                total: completed + state.loading_export_jobs().len(),
            }
        }
        Phase::ExportComplete => ExportPanel::Finished {
            destination_namespace: state.destination_namespace().unwrap_or_default().to_string(),
            destination_repository: state.destination_repository().unwrap_or_default().to_string(),
        },
        Phase::Uninitialized | Phase::Unstarted | Phase::AwaitingImport => ExportPanel::Hidden,
    }
}
