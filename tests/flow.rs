mod common;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{checkbox, file_upload, input, required, text, Action, RecordingSurface, Screen};
use workday_autofill::driver::{CREATE_ACCOUNT_SUBMIT, SIGN_IN_SUBMIT};
use workday_autofill::scripts::NEXT_BUTTON;
use workday_autofill::steps::{current_step, ProgressEntry};
use workday_autofill::{
    Driver, Error, FillFailure, Profile, RunContext, RunOptions, Step, StepReport,
};

fn entry(name: &str, active: bool) -> ProgressEntry {
    ProgressEntry {
        name: name.into(),
        active,
    }
}

// ============================================================================
// Step sequence
// ============================================================================

#[test]
fn steps_advance_linearly_to_done() {
    let mut step = Step::Login;
    let mut seen = vec![step];
    while step != Step::Done {
        step = step.next();
        seen.push(step);
    }
    assert_eq!(
        seen,
        [
            Step::Login,
            Step::ApplyManually,
            Step::MyInformation,
            Step::MyExperience,
            Step::ApplicationQuestions,
            Step::VoluntaryDisclosures,
            Step::SelfIdentify,
            Step::ReviewSubmit,
            Step::Done,
        ]
    );
    assert_eq!(Step::Done.next(), Step::Done);
}

#[test]
fn form_steps_have_numbered_sections() {
    let keys: Vec<_> = Step::FORM_STEPS
        .iter()
        .map(|s| s.profile_key().unwrap())
        .collect();
    assert_eq!(keys, ["step1", "step2", "step3", "step4", "step5", "step6"]);
    assert_eq!(Step::Login.profile_key(), Some("login"));
    assert!(!Step::Login.is_form());
}

#[test]
fn progress_titles_map_to_steps() {
    assert_eq!(Step::from_title("My Information"), Some(Step::MyInformation));
    assert_eq!(Step::from_title("Self Identification"), Some(Step::SelfIdentify));
    assert_eq!(Step::from_title("Review and Submit"), Some(Step::ReviewSubmit));
    assert_eq!(Step::from_title("Voluntary Disclosures"), Some(Step::VoluntaryDisclosures));
    assert_eq!(Step::from_title("Something Else"), None);
    assert_eq!(Step::from_title(""), None);
}

#[test]
fn current_step_is_the_active_entry() {
    let entries = vec![
        entry("My Information", false),
        entry("My Experience", true),
        entry("Application Questions", false),
    ];
    assert_eq!(current_step(&entries), Some(Step::MyExperience));
    assert_eq!(current_step(&[]), None);
    assert_eq!(current_step(&[entry("My Information", false)]), None);
}

#[test]
fn step_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&Step::ApplicationQuestions).unwrap(),
        "\"application_questions\""
    );
    assert_eq!(Step::ReviewSubmit.slug(), "review_submit");
}

// ============================================================================
// Run context
// ============================================================================

#[test]
fn context_starts_at_login_and_tracks_jumps() {
    let mut ctx = RunContext::new();
    assert_eq!(ctx.step(), Step::Login);
    assert_eq!(ctx.advance(), Step::ApplyManually);
    ctx.jump_to(Step::ApplicationQuestions);
    assert_eq!(ctx.step(), Step::ApplicationQuestions);
    assert!(!ctx.is_done());
}

#[test]
fn context_accumulates_reports() {
    let mut ctx = RunContext::new();
    ctx.record(StepReport::new(Step::Login));
    ctx.record(StepReport::new(Step::MyInformation));
    let steps: Vec<_> = ctx.reports().iter().map(|r| r.step).collect();
    assert_eq!(steps, [Step::Login, Step::MyInformation]);
}

#[test]
fn cancellation_is_seen_at_step_boundary() {
    let flag = Arc::new(AtomicBool::new(false));
    let mut ctx = RunContext::with_cancel_flag(flag.clone());
    ctx.advance();
    assert!(ctx.check_cancelled().is_ok());

    flag.store(true, Ordering::SeqCst);
    let err = ctx.check_cancelled().unwrap_err();
    assert!(matches!(err, Error::Cancelled(Step::ApplyManually)));
    assert!(err.is_fatal());
}

#[test]
fn empty_report_is_submittable() {
    let report = StepReport::new(Step::SelfIdentify);
    assert!(report.is_submittable());
    assert_eq!(report.summary().filled, 0);
}

// ============================================================================
// Driver
// ============================================================================

const PROFILE: &str = r#"
job_url: https://acme.example/job/123
email: john.doe@example.com
password: secret
step1:
  first_name: John
  resume: ./no-such-resume.pdf
step3:
  sponsorship: "No"
"#;

fn profile(extra: &str) -> Profile {
    Profile::from_yaml_str(&format!("{PROFILE}{extra}")).unwrap()
}

fn options() -> RunOptions {
    RunOptions {
        submit: false,
        artifacts_dir: PathBuf::from("artifacts"),
        ..RunOptions::default()
    }
}

fn at(step: Step) -> RunContext {
    let mut ctx = RunContext::new();
    ctx.jump_to(step);
    ctx
}

fn sign_in_screen() -> Screen {
    Screen::new(
        "https://acme.example/login",
        vec![text("email", "Email Address"), input("password", "password", "Password")],
    )
}

fn my_information(fields: Vec<workday_autofill::form::RawField>) -> Screen {
    Screen::new("https://acme.example/apply/1", fields).step("My Information")
}

fn review() -> Screen {
    Screen::new("https://acme.example/apply/review", Vec::new()).step("Review")
}

fn position(actions: &[Action], wanted: &Action) -> usize {
    actions
        .iter()
        .position(|a| a == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not in {actions:?}"))
}

#[tokio::test]
async fn full_run_signs_in_fills_and_stops_before_submit() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![
        sign_in_screen(),
        my_information(vec![required(text("first", "First Name"))]),
        review(),
    ]);
    let mut ctx = RunContext::new();

    Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap();

    assert!(ctx.is_done());
    let steps: Vec<_> = ctx.reports().iter().map(|r| r.step).collect();
    assert_eq!(steps, [Step::Login, Step::MyInformation]);

    let actions = surface.actions();
    assert_eq!(actions[0], Action::Visited("https://acme.example/job/123".into()));
    let sign_in = position(&actions, &Action::Clicked(SIGN_IN_SUBMIT.into()));
    let apply = position(&actions, &Action::Button("Apply Manually".into()));
    let first = position(&actions, &Action::Text("first".into(), "John".into()));
    assert!(sign_in < apply && apply < first);
    assert!(!actions.contains(&Action::Button("Create Account".into())));
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 1);
}

#[tokio::test]
async fn unmatched_required_field_never_reaches_next() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![my_information(vec![
        text("first", "First Name"),
        required(text("ssn", "National ID")),
    ])]);
    let mut ctx = at(Step::MyInformation);

    let err = Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StepBlocked { step: Step::MyInformation, .. }));
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 0);
    let failures = ctx.reports()[0].failures();
    assert!(matches!(failures[0].1, FillFailure::UnmatchedRequiredField { .. }));
    assert!(surface
        .actions()
        .contains(&Action::Screenshot(PathBuf::from("artifacts/my_information_failed.png"))));
}

#[tokio::test]
async fn missing_upload_never_reaches_next() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![my_information(vec![
        text("first", "First Name"),
        file_upload("resume", "Resume"),
    ])]);
    let mut ctx = at(Step::MyInformation);

    let err = Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StepBlocked { .. }));
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 0);
    assert!(matches!(
        ctx.reports()[0].failures()[0].1,
        FillFailure::FileNotFound { .. }
    ));
}

#[tokio::test]
async fn rejected_step_is_filled_again() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![
        my_information(vec![text("first", "First Name")]),
        review(),
    ])
    .rejecting_next(1);
    let mut ctx = at(Step::MyInformation);

    Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap();

    assert!(ctx.is_done());
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 2);
    assert_eq!(
        surface.fills(),
        vec![
            Action::Text("first".into(), "John".into()),
            Action::Text("first".into(), "John".into()),
        ]
    );
    assert_eq!(ctx.reports().len(), 2);
}

#[tokio::test]
async fn rejection_stops_after_max_attempts() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![my_information(vec![text("first", "First Name")])])
        .rejecting_next(10);
    let mut ctx = at(Step::MyInformation);
    let options = RunOptions {
        max_attempts: 2,
        ..options()
    };

    let err = Driver::new(&surface, &profile, options)
        .run(&mut ctx)
        .await
        .unwrap_err();

    match err {
        Error::StepBlocked { step, reason } => {
            assert_eq!(step, Step::MyInformation);
            assert!(reason.contains("after 2 attempts"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 2);
    assert_eq!(ctx.reports().len(), 2);
    assert_eq!(ctx.step(), Step::MyInformation);
}

#[tokio::test]
async fn cancellation_lands_before_next() {
    let profile = profile("");
    let flag = Arc::new(AtomicBool::new(false));
    let surface = RecordingSurface::site(vec![my_information(vec![text("first", "First Name")])])
        .cancelling(flag.clone());
    let mut ctx = RunContext::with_cancel_flag(flag);
    ctx.jump_to(Step::MyInformation);

    let err = Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled(Step::MyInformation)));
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 0);
    assert!(!surface
        .actions()
        .iter()
        .any(|a| matches!(a, Action::Screenshot(_))));
}

#[tokio::test]
async fn progress_bar_decides_the_section() {
    let profile = profile("");
    let questions = Screen::new(
        "https://acme.example/apply/3",
        vec![common::select("sponsor", "Will you require sponsorship?", &["Yes", "No"])],
    )
    .step("Application Questions");
    let surface = RecordingSurface::site(vec![questions, review()]);
    let mut ctx = at(Step::MyInformation);

    Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap();

    assert_eq!(ctx.reports()[0].step, Step::ApplicationQuestions);
    assert_eq!(
        surface.fills(),
        vec![Action::Chose("sponsor".into(), vec!["No".into()])]
    );
}

#[tokio::test]
async fn without_progress_bar_a_url_change_means_moved() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![
        Screen::new("https://acme.example/apply/1", vec![text("first", "First Name")]),
        review(),
    ]);
    let mut ctx = at(Step::MyInformation);

    Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap();

    assert!(ctx.is_done());
    assert_eq!(surface.clicks_on(NEXT_BUTTON), 1);
}

#[tokio::test]
async fn without_progress_bar_an_unchanged_page_is_not_moved() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![
        Screen::new("https://acme.example/apply", vec![text("first", "First Name")]),
        Screen::new("https://acme.example/apply", vec![text("first", "First Name")]),
    ]);
    let mut ctx = at(Step::MyInformation);

    let err = Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
    assert_eq!(ctx.step(), Step::MyInformation);
}

#[tokio::test]
async fn new_account_is_created_then_signed_in() {
    let profile = profile("create_account: true\n");
    let create = Screen::new(
        "https://acme.example/create",
        vec![
            text("email", "Email Address"),
            input("password", "password", "Password"),
            input("verify", "password", "Verify New Password"),
            checkbox("terms", "I agree to the Terms"),
        ],
    );
    let surface = RecordingSurface::site(vec![create, sign_in_screen(), review()]);
    let mut ctx = RunContext::new();

    Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap();

    let actions = surface.actions();
    let top_sign_in = position(&actions, &Action::Button("Sign In".into()));
    let create_button = position(&actions, &Action::Button("Create Account".into()));
    let created = position(&actions, &Action::Clicked(CREATE_ACCOUNT_SUBMIT.into()));
    let signed_in = position(&actions, &Action::Clicked(SIGN_IN_SUBMIT.into()));
    assert!(top_sign_in < create_button && create_button < created && created < signed_in);

    let second_sign_in = actions[created..]
        .iter()
        .position(|a| a == &Action::Button("Sign In".into()))
        .expect("signs in after creating the account");
    assert!(created + second_sign_in < signed_in);

    assert!(actions.contains(&Action::Text("verify".into(), "secret".into())));
    assert!(actions.contains(&Action::Checked("terms".into(), true)));
    let logins = ctx.reports().iter().filter(|r| r.step == Step::Login).count();
    assert_eq!(logins, 2);
    assert!(ctx.is_done());
}

#[tokio::test]
async fn login_error_banner_rejects_the_run() {
    let profile = profile("");
    let surface = RecordingSurface::site(vec![sign_in_screen()]).with_login_error();
    let mut ctx = RunContext::new();

    let err = Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::LoginRejected(_)));
    assert!(surface
        .actions()
        .contains(&Action::Screenshot(PathBuf::from("artifacts/login_failed.png"))));
}

#[tokio::test]
async fn missing_job_url_is_a_config_error() {
    let profile = Profile::from_yaml_str("email: a@b.c\npassword: x\n").unwrap();
    let surface = RecordingSurface::site(Vec::new());
    let mut ctx = RunContext::new();

    let err = Driver::new(&surface, &profile, options())
        .run(&mut ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(surface.actions().iter().all(|a| !matches!(a, Action::Visited(_))));
}
