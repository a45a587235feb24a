use pretty_assertions::assert_eq;
use stepper_app::effects::action_for_event;
use stepper_core::query::parse_query;
use stepper_core::{update, Action, ExportJob, GitHubRepository, WizardState};
use stepper_engine::{EngineEvent, ExportTask, MarkCompleteRequest, StartImportResponse};

fn init_logging() {
    stepper_logging::initialize_for_tests();
}

fn at(query: &str) -> WizardState {
    parse_query(query).expect("valid query").into_state()
}

const IMPORTED: &str = "stepperState=import_complete&githubNamespace=acme\
    &githubRepository=widgets&splitgraphNamespace=sg&splitgraphRepository=widgets";
const FINISHED: &str = "stepperState=export_complete&githubNamespace=acme\
    &githubRepository=widgets&splitgraphNamespace=sg&splitgraphRepository=widgets";

fn awaiting_import() -> WizardState {
    at("stepperState=awaiting_import&githubNamespace=acme&githubRepository=widgets\
        &importTaskId=t1&splitgraphNamespace=sg&splitgraphRepository=widgets")
}

fn awaiting_export() -> WizardState {
    let (state, _) = update(
        at(IMPORTED),
        Action::StartExport {
            jobs: vec![ExportJob {
                destination_schema: "widgets".to_string(),
                destination_table: "stargazers".to_string(),
                task_id: "e1".to_string(),
                source_query: None,
            }],
        },
    );
    state
}

fn mark_request(repository: &str) -> MarkCompleteRequest {
    MarkCompleteRequest {
        github_source_namespace: "acme".to_string(),
        github_source_repository: repository.to_string(),
        splitgraph_destination_namespace: "sg".to_string(),
        splitgraph_destination_repository: repository.to_string(),
    }
}

fn failed(message: &str) -> EngineEvent {
    EngineEvent::ExportFailed {
        message: message.to_string(),
    }
}

#[test]
fn completion_failure_applies_only_to_the_current_target() {
    init_logging();
    let event = |repository: &str| EngineEvent::CompletionFailed {
        request: mark_request(repository),
        message: "boom".to_string(),
    };

    assert_eq!(
        action_for_event(event("widgets"), &at(FINISHED)),
        Some(Action::ExportError {
            error: "boom".to_string(),
        })
    );
    assert_eq!(action_for_event(event("gadgets"), &at(FINISHED)), None);
    assert_eq!(action_for_event(event("widgets"), &WizardState::new()), None);
    assert_eq!(action_for_event(event("widgets"), &at(IMPORTED)), None);
}

#[test]
fn export_failure_outside_export_steps_is_dropped() {
    init_logging();
    let expected = Some(Action::ExportError {
        error: "late".to_string(),
    });

    assert_eq!(action_for_event(failed("late"), &at(IMPORTED)), expected);
    assert_eq!(action_for_event(failed("late"), &awaiting_export()), expected);
    assert_eq!(action_for_event(failed("late"), &WizardState::new()), None);
    assert_eq!(action_for_event(failed("late"), &at(FINISHED)), None);
}

#[test]
fn export_task_completion_needs_a_loading_task() {
    init_logging();
    let done = |task_id: &str| EngineEvent::ExportTaskCompleted {
        task_id: task_id.to_string(),
    };

    assert_eq!(
        action_for_event(done("e1"), &awaiting_export()),
        Some(Action::ExportTableTaskComplete {
            task_id: "e1".to_string(),
        })
    );
    assert_eq!(action_for_event(done("e9"), &awaiting_export()), None);

    // The job maps outlive a navigation back to import_complete.
    let (back, _) = update(
        awaiting_export(),
        Action::InitializeFromUrl(parse_query(IMPORTED).expect("valid query")),
    );
    assert_eq!(action_for_event(done("e1"), &back), None);
}

#[test]
fn import_events_are_tied_to_their_step() {
    init_logging();
    let started = EngineEvent::ImportStarted {
        github_namespace: "acme".to_string(),
        github_repository: "widgets".to_string(),
        response: StartImportResponse {
            task_id: "t2".to_string(),
            splitgraph_namespace: "sg".to_string(),
            splitgraph_repository: "widgets".to_string(),
        },
    };
    assert_eq!(
        action_for_event(started.clone(), &WizardState::new()),
        Some(Action::StartImport {
            repository: GitHubRepository::new("acme", "widgets"),
            task_id: "t2".to_string(),
            destination_namespace: "sg".to_string(),
            destination_repository: "widgets".to_string(),
        })
    );
    assert_eq!(action_for_event(started, &at(IMPORTED)), None);

    let import_failed = EngineEvent::ImportFailed {
        message: "nope".to_string(),
    };
    assert!(action_for_event(import_failed.clone(), &awaiting_import()).is_some());
    assert_eq!(action_for_event(import_failed, &at(IMPORTED)), None);

    let completed = EngineEvent::ImportCompleted {
        task_id: "t1".to_string(),
    };
    assert_eq!(
        action_for_event(completed.clone(), &awaiting_import()),
        Some(Action::ImportComplete)
    );
    assert_eq!(action_for_event(completed, &at(IMPORTED)), None);
}

#[test]
fn export_start_only_lands_in_import_complete() {
    init_logging();
    let started = EngineEvent::ExportStarted {
        tasks: vec![ExportTask {
            table_name: "stargazers".to_string(),
            task_id: "e1".to_string(),
            destination_schema: None,
            source_query: None,
        }],
    };

    let action = action_for_event(started.clone(), &at(IMPORTED));
    assert!(matches!(action, Some(Action::StartExport { ref jobs }) if jobs.len() == 1));
    assert_eq!(action_for_event(started, &WizardState::new()), None);
}
