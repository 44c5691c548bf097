mod console;

use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use exam_core::AnswerPolicy;
use exam_core::model::{QuestionKind, TestId};
use services::{AppServices, Clock, SessionHandle, SessionOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::debug;

use console::{HELP, Input, is_selected, parse_input, render_question, resolve_option};

#[derive(Debug, Parser)]
#[command(name = "exam", about = "Take timed tests from the terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start a timed session and answer questions interactively.
    Take(TakeArgs),
    /// List the built-in test catalogue.
    Tests,
    /// Add students to a test and print their access keys.
    ///
    /// The catalogue lives in memory, so keys printed here are only valid
    /// within this process; `take --require-issued-keys` issues its own.
    IssueKey {
        #[arg(long, env = "EXAM_TEST_ID")]
        test_id: Option<TestId>,
        /// Student name; repeat to add several students.
        #[arg(long = "student", required = true)]
        students: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct TakeArgs {
    /// Access key; prompted for when absent.
    #[arg(long, env = "EXAM_ACCESS_KEY")]
    key: Option<String>,

    /// Test to take, e.g. `test-001`. Defaults to the demo test.
    #[arg(long, env = "EXAM_TEST_ID")]
    test_id: Option<TestId>,

    /// Override the test's duration.
    #[arg(long, env = "EXAM_DURATION_SECS")]
    duration_secs: Option<u32>,

    /// Reject answers that are not one of the options or not a number.
    #[arg(long, env = "EXAM_STRICT_ANSWERS")]
    strict: bool,

    /// Only admit administrator-issued keys. One key is issued and printed at startup.
    #[arg(long)]
    require_issued_keys: bool,

    /// Holder of the key issued by `--require-issued-keys`.
    #[arg(long, default_value = "Student")]
    student: String,
}

type StdinLines = Lines<BufReader<Stdin>>;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Take(args) => take(args).await,
        Command::Tests => list_tests().await,
        Command::IssueKey { test_id, students } => issue_keys(test_id, &students).await,
    }
}

//
// ─── CATALOGUE ─────────────────────────────────────────────────────────────────
//

async fn list_tests() -> Result<()> {
    let services = AppServices::in_memory(Clock::system(), SessionOptions::default()).await?;
    for item in services.admin().list_tests().await? {
        let test = &item.test;
        println!(
            "{}  {}  {} questions  {} min  {} .. {}  {} students",
            test.id(),
            test.title(),
            test.questions().len(),
            test.duration_minutes(),
            test.starts_on(),
            test.ends_on(),
            item.student_count,
        );
    }
    Ok(())
}

async fn issue_keys(test_id: Option<TestId>, students: &[String]) -> Result<()> {
    let services = AppServices::in_memory(Clock::system(), SessionOptions::default()).await?;
    let test_id = test_id.unwrap_or_else(|| services.default_test_id());
    let admin = services.admin();
    for student in students {
        admin
            .issue_key(test_id, student)
            .await
            .with_context(|| format!("could not add student `{student}`"))?;
    }
    for record in admin.keys_for(test_id).await? {
        println!("{}  {}  {}", record.test_id, record.student, record.key);
    }
    Ok(())
}

//
// ─── TAKE ──────────────────────────────────────────────────────────────────────
//

enum Flow {
    Continue,
    Finished,
    Quit,
}

async fn take(args: TakeArgs) -> Result<()> {
    let options = SessionOptions {
        require_issued_keys: args.require_issued_keys,
        policy: if args.strict {
            AnswerPolicy::Strict
        } else {
            AnswerPolicy::Lenient
        },
        duration_secs: args.duration_secs,
    };
    let services = AppServices::in_memory(Clock::system(), options).await?;
    let test_id = args.test_id.unwrap_or_else(|| services.default_test_id());

    if args.require_issued_keys {
        let record = services.admin().issue_key(test_id, &args.student).await?;
        eprintln!("issued access key for {} on {test_id}: {}", record.student, record.key);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let key = match args.key {
        Some(key) => key,
        None => {
            prompt("Access key: ").await?;
            lines.next_line().await?.unwrap_or_default()
        }
    };

    let handle = services
        .exam_loop()
        .start_session(test_id, &key)
        .await
        .with_context(|| format!("could not start {test_id}"))?;
    println!("{HELP}");

    match drive(&handle, &mut lines).await? {
        Flow::Quit => {
            handle.close().await;
            println!("left without submitting");
            return Ok(());
        }
        Flow::Finished | Flow::Continue => {}
    }

    let snapshot = handle.wait_finished().await?;
    let submissions = services
        .storage()
        .submissions
        .submissions_for_test(test_id)
        .await?;
    let Some(submission) = submissions.last() else {
        bail!("session finished but no submission was recorded");
    };
    println!("\n{} with {} left", submission.reason(), snapshot.remaining_label());
    println!("{}", serde_json::to_string_pretty(submission)?);
    Ok(())
}

async fn drive(handle: &SessionHandle, lines: &mut StdinLines) -> Result<Flow> {
    let mut updates = handle.subscribe();
    let mut warned_low = false;
    prompt(&render_question(handle.current_question(), &handle.snapshot())).await?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(Flow::Quit);
                }
                let snapshot = updates.borrow_and_update().clone();
                if snapshot.is_finished() {
                    println!("\ntime is up, answers submitted");
                    return Ok(Flow::Finished);
                }
                if snapshot.is_running_low() && !warned_low {
                    warned_low = true;
                    prompt(&format!("\n{} left\n> ", snapshot.remaining_label())).await?;
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    return Ok(Flow::Quit);
                };
                match step(handle, &line).await? {
                    Flow::Continue => {
                        prompt(&render_question(handle.current_question(), &handle.snapshot())).await?;
                    }
                    done => return Ok(done),
                }
            }
        }
    }
}

async fn step(handle: &SessionHandle, line: &str) -> Result<Flow> {
    let input = match parse_input(line) {
        Ok(input) => input,
        Err(err) => {
            println!("{err}");
            return Ok(Flow::Continue);
        }
    };

    let result = match input {
        Input::Next => handle.go_next().await,
        Input::Previous => handle.go_previous().await,
        Input::Answer(raw) => answer(handle, &raw).await,
        Input::Finish => handle.finish().await.map(|_| ()),
        Input::Status => {
            let snapshot = handle.snapshot();
            println!(
                "{} left, {} of {} answered",
                snapshot.remaining_label(),
                snapshot.answers.len(),
                snapshot.total_questions,
            );
            Ok(())
        }
        Input::Help => {
            println!("{HELP}");
            Ok(())
        }
        Input::Quit => return Ok(Flow::Quit),
    };

    match result {
        Ok(()) if handle.snapshot().is_finished() => Ok(Flow::Finished),
        Ok(()) => Ok(Flow::Continue),
        Err(err) if err.is_closed() => Ok(Flow::Finished),
        Err(err) => {
            debug!(error = %err, "command rejected");
            println!("{err}");
            Ok(Flow::Continue)
        }
    }
}

async fn answer(handle: &SessionHandle, raw: &str) -> Result<(), services::SessionServiceError> {
    let question = handle.current_question();
    let id = question.id();
    match question.kind() {
        QuestionKind::Single => handle.set_single(id, resolve_option(question, raw)).await,
        QuestionKind::Multiple => {
            let option = resolve_option(question, raw);
            let selected = !is_selected(handle.snapshot().answer_for(id), &option);
            handle.toggle_multiple(id, option, selected).await
        }
        QuestionKind::Number => handle.set_number(id, raw).await,
    }
}

async fn prompt(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
