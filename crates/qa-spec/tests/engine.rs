use jobqa_spec::{
    Position, Question, QuestionFormat, QuestionnaireError, SelectOption, SessionSnapshot,
    SessionState, TemplateQuestions, initialize,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "gpu_job" => include_str!("../tests/fixtures/gpu_job.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn env_questions() -> Vec<Question> {
    vec![
        Question::new("env", "Environment"),
        Question::new("gpu_type", "GPU type")
            .with_default("a100")
            .with_format(QuestionFormat::Select {
                options: vec![
                    SelectOption::new("v100", "NVIDIA V100"),
                    SelectOption::new("a100", "NVIDIA A100"),
                ],
            })
            .asked_when("env", "gpu"),
        Question::new("notes", "Notes").with_default("none"),
    ]
}

fn plain_questions() -> Vec<Question> {
    vec![
        Question::new("a", "First"),
        Question::new("b", "Second"),
        Question::new("c", "Third"),
    ]
}

#[test]
fn initialize_preserves_order_and_length() {
    let questions = env_questions();
    let state = initialize(questions.clone()).expect("valid questions");

    assert_eq!(state.len(), questions.len());
    assert_eq!(state.current_index(), 0);
    let ids = state.questions().map(|q| q.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["env", "gpu_type", "notes"]);
    assert!(state.answers().iter().all(|answer| !answer.is_set()));
}

#[test]
fn empty_question_list_starts_in_summary() {
    let state = initialize(Vec::new()).expect("empty list is valid");
    assert!(state.is_summary());
    assert_eq!(state.position(), Position::Summary);
    assert!(state.summary().is_empty());
    assert!(state.flatten().is_empty());
    assert_eq!(state.previous().current_index(), 0);
    assert_eq!(state.next().current_index(), 0);
}

#[test]
fn effective_value_falls_back_to_default() {
    let state = initialize(env_questions()).unwrap();
    let state = state.next();
    let notes = state.answer("notes").unwrap();
    assert_eq!(notes.value(), "");
    assert_eq!(notes.effective_value(), "none");

    let state = state.change("bring coffee");
    assert_eq!(state.answer("notes").unwrap().effective_value(), "bring coffee");
}

#[test]
fn should_ask_compares_dependency_effective_value() {
    let questions = vec![
        Question::new("env", "Environment").with_default("gpu"),
        Question::new("gpu_type", "GPU type").asked_when("env", "gpu"),
    ];
    let state = initialize(questions.clone()).unwrap();
    assert!(state.should_ask(&questions[1]).unwrap(), "default satisfies condition");

    let state = state.change("cpu");
    assert!(!state.should_ask(&questions[1]).unwrap());

    let state = state.change("gpu");
    assert!(state.should_ask(&questions[1]).unwrap());
    assert!(state.should_ask(&questions[0]).unwrap());
}

#[test]
fn should_ask_reports_unknown_dependency() {
    let state = initialize(plain_questions()).unwrap();
    let stranger = Question::new("z", "Z").asked_when("missing", "x");
    assert!(matches!(
        state.should_ask(&stranger),
        Err(QuestionnaireError::UnknownDependency { depends_on, .. }) if depends_on == "missing"
    ));
}

#[test]
fn change_only_touches_current_answer() {
    let state = initialize(plain_questions()).unwrap().next();
    let changed = state.change("value-b");

    assert_eq!(changed.current_index(), 1);
    assert_eq!(changed.answer("b").unwrap().value(), "value-b");
    assert_eq!(changed.answer("a").unwrap().value(), "");
    assert_eq!(state.answer("b").unwrap().value(), "", "original state untouched");
}

#[test]
fn change_in_summary_is_ignored() {
    let state = initialize(plain_questions()).unwrap().next().next().next();
    assert!(state.is_summary());
    let changed = state.change("late");
    assert_eq!(changed.snapshot(), state.snapshot());
}

#[test]
fn next_strictly_increases_until_summary() {
    let mut state = initialize(env_questions()).unwrap();
    let length = state.len();
    while !state.is_summary() {
        let advanced = state.next();
        assert!(advanced.current_index() > state.current_index());
        assert!(advanced.current_index() <= length);
        state = advanced;
    }
    assert_eq!(state.current_index(), length);
    assert_eq!(state.next().current_index(), length);
}

#[test]
fn previous_never_increases_or_goes_negative() {
    let state = initialize(env_questions()).unwrap();
    assert_eq!(state.previous().current_index(), 0);

    let mut state = state.change("cpu").next().next();
    assert!(state.is_summary());
    loop {
        let retreated = state.previous();
        assert!(retreated.current_index() <= state.current_index());
        if retreated.current_index() == state.current_index() {
            break;
        }
        state = retreated;
    }
    assert_eq!(state.current_index(), 0);
}

#[test]
fn previous_skips_inapplicable_questions() {
    let state = initialize(env_questions()).unwrap().change("cpu").next();
    assert_eq!(state.current_index(), 2);
    assert_eq!(state.previous().current_index(), 0);
}

#[test]
fn next_then_previous_round_trip() {
    let state = initialize(plain_questions()).unwrap();
    let state = state.next().change("second").next();
    assert_eq!(state.current_index(), 2);

    let back = state.previous();
    assert_eq!(back.current_index(), 1);
    assert_eq!(back.current().unwrap().value(), "second");
}

#[test]
fn flatten_ignores_values_typed_before_question_was_skipped() {
    let state = initialize(env_questions()).unwrap();
    let state = state.change("gpu").next();
    assert_eq!(state.current_question().unwrap().id, "gpu_type");
    let state = state.change("v100");

    let state = state.previous().change("cpu").next();
    assert_eq!(state.current_question().unwrap().id, "notes");

    let flat = state.flatten();
    assert_eq!(flat["gpu_type"], "a100");
    assert_eq!(state.answer("gpu_type").unwrap().value(), "v100");
}

#[test]
fn cpu_scenario_skips_gpu_type() {
    let state = initialize(env_questions()).unwrap().change("cpu").next();
    assert_eq!(state.position(), Position::Asking(2));

    let state = state.next();
    assert!(state.is_summary());
    let flat = state.flatten();
    assert_eq!(flat.len(), 3);
    assert_eq!(flat["env"], "cpu");
    assert_eq!(flat["gpu_type"], "a100");
    assert_eq!(flat["notes"], "none");

    let summary = state.summary();
    assert!(summary.get("gpu_type").is_none());
    assert_eq!(summary.get("env").unwrap().value, "cpu");
}

#[test]
fn gpu_scenario_asks_gpu_type() {
    let state = initialize(env_questions()).unwrap().change("gpu").next();
    assert_eq!(state.current_question().unwrap().id, "gpu_type");

    let state = state.change("v100").next();
    assert_eq!(state.current_question().unwrap().id, "notes");

    let state = state.change("long run").next();
    let flat = state.flatten();
    assert_eq!(flat["env"], "gpu");
    assert_eq!(flat["gpu_type"], "v100");
    assert_eq!(flat["notes"], "long run");
    assert_eq!(state.summary().len(), 3);
}

#[test]
fn skipped_dependency_still_gates_through_its_default() {
    let template = TemplateQuestions::from_json(fixture("gpu_job")).unwrap();
    let state = initialize(template.questions).unwrap();

    // env keeps its cpu default, so gpu_type is skipped but resolves to a100
    let state = state.next().next();
    assert_eq!(state.current_question().unwrap().id, "gpu_count");
    let gpu_type = state.answer("gpu_type").unwrap();
    assert_eq!(gpu_type.effective_value(), "a100");
    assert!(!state.should_ask(gpu_type.question()).unwrap());
    let gpu_count = state.current_question().unwrap().clone();
    assert!(state.should_ask(&gpu_count).unwrap());
    assert_eq!(state.applicable_count(), 5);
    assert_eq!(state.step_number(), Some(3));

    let state = state.change("2").next();
    assert_eq!(state.current_question().unwrap().id, "walltime");
    assert_eq!(state.previous().current_question().unwrap().id, "gpu_count");

    let flat = state.flatten();
    assert_eq!(flat["gpu_type"], "a100");
    assert_eq!(flat["gpu_count"], "2");
    assert!(state.summary().get("gpu_count").is_some());
    assert!(state.summary().get("gpu_type").is_none());
}

#[test]
fn long_dependency_chain_resolves_each_link_directly() {
    let mut questions = vec![Question::new("q0", "Q0").with_default("y")];
    for i in 1..20_000 {
        questions.push(
            Question::new(format!("q{}", i), format!("Q{}", i))
                .with_default("y")
                .asked_when(format!("q{}", i - 1), "y"),
        );
    }
    let state = initialize(questions).unwrap();
    assert_eq!(state.applicable_count(), 20_000);
    assert_eq!(state.summary().len(), 20_000);

    let state = state.change("n").next();
    assert_eq!(state.current_question().unwrap().id, "q2");
    assert_eq!(state.flatten()["q1"], "y");
}

#[test]
fn chained_condition_is_asked_when_dependency_default_matches() {
    let template = TemplateQuestions::from_json(fixture("gpu_job")).unwrap();
    let state = initialize(template.questions).unwrap();

    let state = state.next().change("gpu").next();
    assert_eq!(state.current_question().unwrap().id, "gpu_type");
    let state = state.next();
    assert_eq!(state.current_question().unwrap().id, "gpu_count");

    let state = state.previous().change("v100").next();
    assert_eq!(state.current_question().unwrap().id, "walltime");
}

#[test]
fn initialize_rejects_forward_dependency() {
    let questions = vec![
        Question::new("a", "A").asked_when("b", "x"),
        Question::new("b", "B"),
    ];
    match initialize(questions) {
        Err(QuestionnaireError::InvalidConfiguration(report)) => {
            assert_eq!(report.codes(), vec!["forward_dependency"]);
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn snapshot_restores_cursor_and_values() {
    let state = initialize(env_questions()).unwrap().change("gpu").next();
    let snapshot = state.snapshot();
    assert_eq!(snapshot.current_index, 1);
    assert_eq!(snapshot.values, vec!["gpu", "", ""]);

    let restored = SessionState::restore(env_questions(), &snapshot).unwrap();
    assert_eq!(restored.current_index(), 1);
    assert_eq!(restored.flatten(), state.flatten());
}

#[test]
fn restore_moves_cursor_off_skipped_question() {
    let snapshot = SessionSnapshot {
        current_index: 1,
        values: vec!["cpu".into(), String::new(), String::new()],
    };
    let restored = SessionState::restore(env_questions(), &snapshot).unwrap();
    assert_eq!(restored.current_index(), 2);
}

#[test]
fn restore_rejects_mismatched_snapshot() {
    let snapshot = SessionSnapshot {
        current_index: 0,
        values: vec!["only-one".into()],
    };
    assert!(matches!(
        SessionState::restore(env_questions(), &snapshot),
        Err(QuestionnaireError::SnapshotMismatch {
            expected: 3,
            found: 1
        })
    ));

    let snapshot = SessionSnapshot {
        current_index: 9,
        values: vec![String::new(); 3],
    };
    assert!(matches!(
        SessionState::restore(env_questions(), &snapshot),
        Err(QuestionnaireError::CursorOutOfRange { cursor: 9, .. })
    ));
}
