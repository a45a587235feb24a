use std::sync::Once;

use pretty_assertions::assert_eq;
use stepper_core::{update, Action, ExportJob, GitHubRepository, Phase, WizardState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(stepper_logging::initialize_for_tests);
}

fn job(task_id: &str, table: &str) -> ExportJob {
    ExportJob {
        destination_schema: "widgets".to_string(),
        destination_table: table.to_string(),
        task_id: task_id.to_string(),
        source_query: None,
    }
}

fn dispatch(state: WizardState, action: Action) -> WizardState {
    update(state, action).0
}

fn start_import() -> Action {
    Action::StartImport {
        repository: GitHubRepository::new("acme", "widgets"),
        task_id: "t1".to_string(),
        destination_namespace: "sg".to_string(),
        destination_repository: "widgets".to_string(),
    }
}

fn imported() -> WizardState {
    let state = dispatch(WizardState::new(), start_import());
    dispatch(state, Action::ImportComplete)
}

#[test]
fn full_wizard_walkthrough() {
    init_logging();
    let state = dispatch(WizardState::new(), start_import());
    assert_eq!(state.phase(), Phase::AwaitingImport);
    assert_eq!(
        state.source_repository(),
        Some(&GitHubRepository::new("acme", "widgets"))
    );
    assert_eq!(state.import_job_id(), Some("t1"));
    assert_eq!(state.destination_namespace(), Some("sg"));
    assert_eq!(state.destination_repository(), Some("widgets"));

    let state = dispatch(state, Action::ImportComplete);
    assert_eq!(state.phase(), Phase::ImportComplete);

    let state = dispatch(
        state,
        Action::StartExport {
            jobs: vec![job("e1", "stargazers")],
        },
    );
    assert_eq!(state.phase(), Phase::AwaitingExport);
    assert_eq!(state.loading_export_jobs().len(), 1);

    let state = dispatch(
        state,
        Action::ExportTableTaskComplete {
            task_id: "e1".to_string(),
        },
    );
    assert_eq!(state.phase(), Phase::ExportComplete);
    assert!(state.loading_export_jobs().is_empty());
    assert_eq!(state.completed_export_jobs().len(), 1);
}

#[test]
fn completing_every_task_moves_all_jobs_to_completed() {
    init_logging();
    let jobs = vec![
        job("e1", "stargazers"),
        job("e2", "stargazers_user"),
        job("e3", "commits"),
    ];
    let mut state = dispatch(imported(), Action::StartExport { jobs: jobs.clone() });

    for task_id in ["e2", "e3", "e1"] {
        state = dispatch(
            state,
            Action::ExportTableTaskComplete {
                task_id: task_id.to_string(),
            },
        );
    }

    assert_eq!(state.phase(), Phase::ExportComplete);
    assert!(state.loading_export_jobs().is_empty());
    let completed: Vec<ExportJob> = state.completed_export_jobs().values().cloned().collect();
    assert_eq!(completed, jobs);
}

#[test]
fn partial_completion_stays_awaiting_export() {
    init_logging();
    let jobs: Vec<ExportJob> = (1..=4)
        .map(|n| job(&format!("e{n}"), &format!("table_{n}")))
        .collect();
    let mut state = dispatch(imported(), Action::StartExport { jobs });

    for task_id in ["e1", "e3"] {
        state = dispatch(
            state,
            Action::ExportTableTaskComplete {
                task_id: task_id.to_string(),
            },
        );
        assert_eq!(state.phase(), Phase::AwaitingExport);
    }

    assert_eq!(state.loading_export_jobs().len(), 2);
    assert_eq!(state.completed_export_jobs().len(), 2);
    assert!(state
        .loading_export_jobs()
        .keys()
        .all(|task_id| !state.completed_export_jobs().contains_key(task_id)));
}

#[test]
fn unknown_task_completion_is_rejected() {
    init_logging();
    let state = dispatch(
        imported(),
        Action::StartExport {
            jobs: vec![job("e1", "stargazers")],
        },
    );

    let (next, effects) = update(
        state.clone(),
        Action::ExportTableTaskComplete {
            task_id: "nope".to_string(),
        },
    );

    assert_eq!(next, state);
    assert!(effects.is_empty());
    assert!(next.completed_export_jobs().is_empty());
}

#[test]
fn repeated_task_completion_is_rejected() {
    init_logging();
    let state = dispatch(
        imported(),
        Action::StartExport {
            jobs: vec![job("e1", "stargazers"), job("e2", "stargazers_user")],
        },
    );
    let done_once = dispatch(
        state,
        Action::ExportTableTaskComplete {
            task_id: "e1".to_string(),
        },
    );
    let done_twice = dispatch(
        done_once.clone(),
        Action::ExportTableTaskComplete {
            task_id: "e1".to_string(),
        },
    );

    assert_eq!(done_twice, done_once);
    assert_eq!(done_twice.phase(), Phase::AwaitingExport);
}

#[test]
fn start_export_replaces_jobs_and_clears_completed() {
    init_logging();
    let state = dispatch(
        imported(),
        Action::StartExport {
            jobs: vec![job("e1", "stargazers"), job("e2", "stargazers_user")],
        },
    );
    let state = dispatch(
        state,
        Action::ExportTableTaskComplete {
            task_id: "e1".to_string(),
        },
    );

    let state = dispatch(
        state,
        Action::StartExport {
            jobs: vec![job("e9", "stargazers")],
        },
    );

    assert_eq!(state.phase(), Phase::AwaitingExport);
    assert_eq!(
        state.loading_export_jobs().keys().collect::<Vec<_>>(),
        vec!["e9"]
    );
    assert!(state.completed_export_jobs().is_empty());
}

#[test]
fn import_error_from_any_phase_resets_to_unstarted() {
    init_logging();
    let starting_points = vec![
        WizardState::uninitialized(),
        WizardState::new(),
        dispatch(WizardState::new(), start_import()),
        imported(),
        dispatch(
            imported(),
            Action::StartExport {
                jobs: vec![job("e1", "stargazers")],
            },
        ),
    ];

    for state in starting_points {
        let next = dispatch(
            state,
            Action::ImportError {
                error: "boom".to_string(),
            },
        );
        assert_eq!(next.phase(), Phase::Unstarted);
        assert_eq!(next.source_repository(), None);
        assert_eq!(next.import_job_id(), None);
        assert_eq!(next.destination_namespace(), None);
        assert_eq!(next.destination_repository(), None);
        assert_eq!(next.import_error(), Some("boom"));
    }
}

#[test]
fn export_error_clears_jobs_and_rolls_back_to_import_complete() {
    init_logging();
    let state = dispatch(
        imported(),
        Action::StartExport {
            jobs: vec![job("e1", "stargazers"), job("e2", "stargazers_user")],
        },
    );
    let state = dispatch(
        state,
        Action::ExportTableTaskComplete {
            task_id: "e2".to_string(),
        },
    );

    let state = dispatch(
        state,
        Action::ExportError {
            error: "export failed".to_string(),
        },
    );

    assert_eq!(state.phase(), Phase::ImportComplete);
    assert!(state.loading_export_jobs().is_empty());
    assert!(state.completed_export_jobs().is_empty());
    assert_eq!(state.export_error(), Some("export failed"));
    assert_eq!(state.destination_repository(), Some("widgets"));
}

#[test]
fn export_complete_action_forces_terminal_phase() {
    init_logging();
    let state = dispatch(imported(), Action::ExportComplete);
    assert_eq!(state.phase(), Phase::ExportComplete);
}

#[test]
fn reset_returns_initial_state() {
    init_logging();
    let state = dispatch(
        imported(),
        Action::ExportError {
            error: "x".to_string(),
        },
    );
    let state = dispatch(state, Action::Reset);
    assert_eq!(state, WizardState::new());
    assert_eq!(state.phase(), Phase::Unstarted);
}

#[test]
fn initialize_from_url_overwrites_url_fields_and_keeps_jobs() {
    init_logging();
    let state = dispatch(
        imported(),
        Action::StartExport {
            jobs: vec![job("e1", "stargazers")],
        },
    );
    let parsed = stepper_core::query::parse_query(
        "stepperState=awaiting_export&githubNamespace=acme&githubRepository=widgets\
         &splitgraphNamespace=sg&splitgraphRepository=widgets",
    )
    .expect("valid query");

    let next = dispatch(state, Action::InitializeFromUrl(parsed));

    assert_eq!(next.phase(), Phase::AwaitingExport);
    assert_eq!(next.import_job_id(), None);
    assert_eq!(next.loading_export_jobs().len(), 1);
}
