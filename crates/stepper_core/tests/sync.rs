use stepper_core::query::apply_to_url;
use stepper_core::{
    sync_target, update, url_needs_change, Action, ExportPanel, GitHubRepository, ImportPanel,
    StepperView, WizardState,
};
use url::Url;

fn base() -> Url {
    Url::parse("https://demo.example/?theme=dark").expect("valid url")
}

fn awaiting_import() -> WizardState {
    update(
        WizardState::new(),
        Action::StartImport {
            repository: GitHubRepository::new("acme", "widgets"),
            task_id: "t1".to_string(),
            destination_namespace: "sg".to_string(),
            destination_repository: "widgets".to_string(),
        },
    )
    .0
}

#[test]
fn uninitialized_state_never_pushes() {
    let url = Url::parse("https://demo.example/?stepperState=import_complete").expect("valid url");
    assert_eq!(sync_target(&WizardState::uninitialized(), &url), None);
}

#[test]
fn matching_url_needs_no_change() {
    let state = awaiting_import();
    let url = apply_to_url(&base(), &state);
    assert!(!url_needs_change(&state, &url));
    assert_eq!(sync_target(&state, &url), None);
}

#[test]
fn phase_change_produces_replacement() {
    let state = awaiting_import();
    let url = apply_to_url(&base(), &state);
    let (next, _) = update(state, Action::ImportComplete);

    let target = sync_target(&next, &url).expect("phase changed");
    assert!(target.as_str().contains("stepperState=import_complete"));
    assert!(target.as_str().contains("theme=dark"));
}

#[test]
fn error_message_alone_does_not_force_push() {
    let state = WizardState::new();
    let url = apply_to_url(&base(), &state);
    let with_error = Url::parse(&format!("{}&exportError=stale", url)).expect("valid url");
    assert!(!url_needs_change(&state, &with_error));
}

#[test]
fn unparsable_url_is_replaced() {
    let state = WizardState::new();
    let broken = Url::parse("https://demo.example/?stepperState=a&stepperState=b").expect("valid url");
    let target = sync_target(&state, &broken).expect("broken url is replaced");
    assert_eq!(
        target.query_pairs().filter(|(key, _)| key == "stepperState").count(),
        1
    );
}

#[test]
fn view_follows_phase() {
    assert_eq!(WizardState::uninitialized().view(), StepperView::Loading);

    let view = awaiting_import().view();
    assert_eq!(
        view,
        StepperView::Panels {
            import: ImportPanel::Awaiting {
                repository: GitHubRepository::new("acme", "widgets"),
                task_id: "t1".to_string(),
            },
            export: ExportPanel::Hidden,
        }
    );

    let (imported, _) = update(awaiting_import(), Action::ImportComplete);
    let (failed, _) = update(
        imported,
        Action::ExportError {
            error: "nope".to_string(),
        },
    );
    match failed.view() {
        StepperView::Panels { export, .. } => assert_eq!(
            export,
            ExportPanel::StartButton {
                error: Some("nope".to_string())
            }
        ),
        StepperView::Loading => panic!("expected panels"),
    }
}
