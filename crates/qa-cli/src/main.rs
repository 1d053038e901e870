mod wizard;

use clap::{Parser, Subcommand, ValueEnum};
use component_jobqa::{
    HandlebarsRenderer, RenderRequest, RenderedScript, ScriptRenderer, Submission,
    next as qa_next, previous as qa_previous, render_json_ui, render_request, change as qa_change,
};
use jobqa_spec::{
    ReplayOutcome, SessionSnapshot, TemplateQuestions, ValidationReport, answers_from_value,
    replay, validate_questions,
};
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wizard::{
    AnswerParseError, PromptContext, QuestionKind, Verbosity, ViewStatus, WizardPayload,
    WizardPresenter, WizardQuestion,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Job-script questionnaire CLI",
    long_about = "Answers template questionnaires, validates question lists and renders job scripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a template questionnaire interactively.
    Wizard {
        /// Path to the template questions JSON.
        #[arg(long, value_name = "TEMPLATE")]
        template: PathBuf,
        /// Optional JSON file with answers used to prefill the questionnaire.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (status, progress, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit the submitted answers as JSON.
        #[arg(long)]
        answers_json: bool,
        /// Handlebars job-script template rendered once the questionnaire is done.
        #[arg(long, value_name = "SCRIPT")]
        script: Option<PathBuf>,
        /// Name of the generated script (defaults to the template id).
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        /// Directory receiving the generated script.
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Overwrite an existing script.
        #[arg(long)]
        force: bool,
    },
    /// Replay answers through the questionnaire and print the flattened result.
    Flatten {
        #[arg(long, value_name = "TEMPLATE")]
        template: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Check a template's question list for configuration errors.
    Validate {
        #[arg(long, value_name = "TEMPLATE")]
        template: PathBuf,
    },
    /// Replay answers and render a job script with a Handlebars template.
    Render {
        #[arg(long, value_name = "TEMPLATE")]
        template: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(long, value_name = "NAME")]
        name: String,
        /// Output directory (defaults to JOBQA_OUTPUT_DIR or the current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Wizard {
            template,
            answers,
            verbose,
            answers_json,
            script,
            name,
            out,
            force,
        } => run_wizard(WizardArgs {
            template,
            answers,
            verbose,
            answers_json,
            script,
            name,
            out,
            force,
        }),
        Command::Flatten {
            template,
            answers,
            format,
        } => run_flatten(template, answers, format),
        Command::Validate { template } => run_validate(template),
        Command::Render {
            template,
            answers,
            script,
            name,
            out,
            force,
        } => run_render(template, answers, script, name, out, force),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobqa=warn,jobqa_spec=warn,component_jobqa=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn load_template(path: &Path) -> CliResult<(String, TemplateQuestions)> {
    let raw = fs::read_to_string(path)?;
    let template = TemplateQuestions::from_json(&raw)?;
    Ok((raw, template))
}

fn replay_answers(template: &TemplateQuestions, answers_path: &Path) -> CliResult<ReplayOutcome> {
    let contents = fs::read_to_string(answers_path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let answers = answers_from_value(&value)?;
    let outcome = replay(template.questions.clone(), &answers)?;
    for warning in &outcome.warnings {
        eprintln!("Warning: {}", warning);
    }
    Ok(outcome)
}

fn run_validate(template_path: PathBuf) -> CliResult<()> {
    let (_, template) = load_template(&template_path)?;
    let report = validate_questions(&template.questions);
    println!(
        "Validation result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    describe_validation(&report);

    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(report: &ValidationReport) {
    if report.issues.is_empty() {
        return;
    }
    println!("Issues:");
    for issue in &report.issues {
        println!(
            "  {} [{}] - {}",
            issue.question_id.as_deref().unwrap_or("<unknown>"),
            issue.code,
            issue.message
        );
    }
}

fn run_flatten(template_path: PathBuf, answers_path: PathBuf, format: OutputFormat) -> CliResult<()> {
    let (_, template) = load_template(&template_path)?;
    let outcome = replay_answers(&template, &answers_path)?;
    let summary = outcome.state.summary();
    let flat = outcome.state.flatten();

    match format {
        OutputFormat::Json => {
            let output = json!({
                "template_id": template.template_id,
                "summary": summary.entries,
                "answers": flat,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            println!("Summary:");
            for entry in &summary.entries {
                println!("  {}: {}", entry.text, entry.value);
            }
            println!("Flattened answers:");
            for (id, value) in &flat {
                println!("  {} = {}", id, value);
            }
        }
    }
    Ok(())
}

fn run_render(
    template_path: PathBuf,
    answers_path: PathBuf,
    script_path: PathBuf,
    name: String,
    out: Option<PathBuf>,
    force: bool,
) -> CliResult<()> {
    let (_, template) = load_template(&template_path)?;
    let outcome = replay_answers(&template, &answers_path)?;
    let request = RenderRequest::new(&template.template_id, outcome.state.flatten(), &name)?;
    let script = render_script(&script_path, &request)?;
    let written = write_script(&script, out, force)?;
    println!("Rendered job script at {}", written.display());
    Ok(())
}

fn render_script(script_path: &Path, request: &RenderRequest) -> CliResult<RenderedScript> {
    let source = fs::read_to_string(script_path)?;
    let renderer = HandlebarsRenderer::new(&source)?;
    Ok(renderer.render(request)?)
}

fn resolve_output_dir(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match out {
        Some(path) => path,
        None => env::var_os("JOBQA_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    Ok(candidate)
}

fn write_script(script: &RenderedScript, out: Option<PathBuf>, force: bool) -> CliResult<PathBuf> {
    let out_dir = resolve_output_dir(out)?;
    fs::create_dir_all(&out_dir)?;
    let target = out_dir.join(&script.file_name);
    if target.exists() && !force {
        return Err(format!(
            "script {} already exists; rerun with --force to overwrite",
            target.display()
        )
        .into());
    }
    fs::write(&target, &script.contents)?;
    debug!(path = %target.display(), "wrote job script");
    Ok(target)
}

struct WizardArgs {
    template: PathBuf,
    answers: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
    script: Option<PathBuf>,
    name: Option<String>,
    out: Option<PathBuf>,
    force: bool,
}

/// Outcome of one line of wizard input.
#[derive(Debug, PartialEq, Eq)]
enum WizardInput {
    Back,
    Exit,
    Keep,
    Answer(String),
}

fn run_wizard(args: WizardArgs) -> CliResult<()> {
    let (template_raw, template) = load_template(&args.template)?;
    let template_id = template.template_id.as_str();
    let config_json = json!({ "templates_json": template_raw }).to_string();

    let mut state_json = match &args.answers {
        Some(path) => {
            let outcome = replay_answers(&template, path)?;
            let prefilled = SessionSnapshot {
                current_index: 0,
                ..outcome.state.snapshot()
            };
            serde_json::to_string(&prefilled)?
        }
        None => String::new(),
    };

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(args.verbose), args.answers_json);

    loop {
        let ui = parse_component_result(&render_json_ui(template_id, &config_json, &state_json))?;
        let payload =
            WizardPayload::from_json(&ui).map_err(|err| format!("wizard UI error: {}", err))?;
        presenter.show_header(&payload);
        presenter.show_status(&payload);

        if payload.status == ViewStatus::Summary {
            presenter.show_summary(&payload);
            print!("Press Enter to finish or type 'back' to revise: ");
            io::stdout().flush()?;
            match read_input()?.as_str() {
                "back" => {
                    state_json = step(qa_previous(template_id, &config_json, &state_json))?;
                    continue;
                }
                "exit" => return Err("wizard aborted by user".into()),
                _ => break,
            }
        }

        let question = payload
            .question
            .as_ref()
            .ok_or("wizard payload missing the current question")?;
        let prompt = PromptContext::new(question, &payload.progress);

        let input = loop {
            presenter.show_prompt(&prompt);
            print!("> ");
            io::stdout().flush()?;
            match interpret_input(question, &read_input()?) {
                Ok(input) => break input,
                Err(err) => presenter.show_parse_error(&err),
            }
        };

        state_json = match input {
            WizardInput::Exit => return Err("wizard aborted by user".into()),
            WizardInput::Back => step(qa_previous(template_id, &config_json, &state_json))?,
            WizardInput::Keep => step(qa_next(template_id, &config_json, &state_json))?,
            WizardInput::Answer(value) => {
                let changed = step(qa_change(template_id, &config_json, &state_json, &value))?;
                step(qa_next(template_id, &config_json, &changed))?
            }
        };
    }

    let script_name = args.name.as_deref().unwrap_or(template_id);
    let request: RenderRequest = serde_json::from_value(parse_component_result(&render_request(
        template_id,
        &config_json,
        &state_json,
        script_name,
    ))?)?;
    presenter.show_completion(&Submission::from_request(&request));

    if let Some(script_path) = &args.script {
        let script = render_script(script_path, &request)?;
        let written = write_script(&script, args.out.clone(), args.force)?;
        println!("Rendered job script at {}", written.display());
    }
    Ok(())
}

/// Extracts the session snapshot from a transition response.
fn step(response: String) -> CliResult<String> {
    let value = parse_component_result(&response)?;
    let state = value
        .get("state")
        .ok_or("component response is missing the session state")?;
    Ok(state.to_string())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

fn read_input() -> CliResult<String> {
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err("input closed before the questionnaire finished".into());
    }
    Ok(input.trim().to_string())
}

fn interpret_input(question: &WizardQuestion, raw: &str) -> Result<WizardInput, AnswerParseError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Ok(WizardInput::Exit);
    }
    if trimmed.eq_ignore_ascii_case("back") {
        return Ok(WizardInput::Back);
    }
    if trimmed.is_empty() {
        return Ok(WizardInput::Keep);
    }

    match question.kind {
        QuestionKind::Select => parse_select(question, trimmed).map(WizardInput::Answer),
        QuestionKind::MultilineText => Ok(WizardInput::Answer(trimmed.replace("\\n", "\n"))),
        QuestionKind::Text | QuestionKind::Unknown => Ok(WizardInput::Answer(trimmed.to_string())),
    }
}

fn parse_select(question: &WizardQuestion, raw: &str) -> Result<String, AnswerParseError> {
    if question.options.is_empty() {
        return Err(AnswerParseError::new(
            "Options are not defined for this question.",
            None,
        ));
    }

    if let Some((value, _)) = question
        .options
        .iter()
        .find(|(value, _)| value.eq_ignore_ascii_case(raw))
    {
        return Ok(value.clone());
    }

    let allowed = question
        .options
        .iter()
        .map(|(value, _)| value.as_str())
        .collect::<Vec<_>>();
    Err(AnswerParseError::new(
        format!("Choose one of: {}.", allowed.join(", ")),
        Some(format!("allowed values: {}", allowed.join(", "))),
    ))
}
