use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use tracing::info;

use services::{
    ApiConfig, AppServices, Clock, FlowController, FlowError, FlowSettings, SessionStore,
};
use skillpath_core::model::{AssessmentId, Level, Pace};
use skillpath_core::session::{Advance, SessionError, SessionPhase};
use storage::repository::Storage;

use crate::db::prepare_sqlite_file;
use crate::terminal::{Prompter, TerminalNavigator};

pub struct Context {
    pub db_url: String,
    pub api: ApiConfig,
    pub display_delay: Duration,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LevelArg {
    Beginner,
    Intermediate,
    Advanced,
}

impl From<LevelArg> for Level {
    fn from(value: LevelArg) -> Self {
        match value {
            LevelArg::Beginner => Level::Beginner,
            LevelArg::Intermediate => Level::Intermediate,
            LevelArg::Advanced => Level::Advanced,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PaceArg {
    Relaxed,
    Steady,
    Intensive,
}

impl From<PaceArg> for Pace {
    fn from(value: PaceArg) -> Self {
        match value {
            PaceArg::Relaxed => Pace::Relaxed,
            PaceArg::Steady => Pace::Steady,
            PaceArg::Intensive => Pace::Intensive,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// What you want to learn
    #[arg(long)]
    prompt: String,

    #[arg(long, value_enum)]
    level: Option<LevelArg>,

    #[arg(long, value_enum)]
    pace: Option<PaceArg>,

    #[arg(long)]
    language: Option<String>,

    /// Toggle a platform from the default selection (repeatable)
    #[arg(long = "platform")]
    platforms: Vec<String>,

    /// Go straight to the roadmap without an assessment
    #[arg(long)]
    skip: bool,
}

#[derive(Args)]
pub struct ResumeArgs {
    assessment_id: AssessmentId,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(long, default_value_t = 10)]
    limit: u32,

    /// Show a single entry by its history id
    #[arg(long)]
    id: Option<i64>,
}

async fn flow(ctx: Context) -> Result<FlowController> {
    prepare_sqlite_file(&ctx.db_url)?;
    let services = AppServices::new_sqlite(&ctx.db_url, Clock::system(), ctx.api).await?;
    Ok(services.flow_controller(
        Arc::new(TerminalNavigator),
        FlowSettings {
            display_delay: ctx.display_delay,
            ..FlowSettings::default()
        },
    ))
}

pub async fn run(ctx: Context, args: &RunArgs) -> Result<()> {
    let mut flow = flow(ctx).await?;
    let mut input = Prompter::new();

    flow.load_topics(&args.prompt).await?;
    configure(&mut flow, args, &mut input).await?;

    if args.skip {
        flow.skip_assessment().await?;
        return Ok(());
    }

    let id = flow.submit_configuration().await?;
    info!(assessment = %id, "assessment started");
    take_assessment(&mut flow, &mut input).await
}

pub async fn resume(ctx: Context, args: &ResumeArgs) -> Result<()> {
    let mut flow = flow(ctx).await?;
    let mut input = Prompter::new();

    flow.open_assessment(args.assessment_id.clone()).await?;
    if flow
        .session()
        .is_some_and(|s| s.phase() == SessionPhase::Error)
    {
        match flow.resume_unanswered().await {
            Ok(_) => {}
            Err(FlowError::Session(SessionError::NothingToResume)) => {
                flow.retry_assessment().await?;
            }
            Err(err) => return Err(err.into()),
        }
    }
    take_assessment(&mut flow, &mut input).await
}

pub async fn history(db_url: &str, args: &HistoryArgs) -> Result<()> {
    prepare_sqlite_file(db_url)?;
    let storage = Storage::sqlite(db_url).await?;
    let store = SessionStore::from_storage(Clock::system(), &storage);

    if let Some(id) = args.id {
        let scored = store.result(id).await?;
        let result = &scored.result;
        println!("id:              {id}");
        println!("assessment:      {}", result.assessment_id);
        println!("personalization: {}", result.personalization_id);
        println!(
            "score:           {}/{} ({})",
            result.score,
            result.max_score,
            result.percentage_label()
        );
        println!("completed:       {}", scored.completed_at.to_rfc3339());
        return Ok(());
    }

    let rows = store.history(args.limit).await?;
    if rows.is_empty() {
        println!("no scored assessments yet");
    }
    for row in rows {
        let result = &row.scored.result;
        println!(
            "{:>4}  {}  {}  {}/{}  {}",
            row.id,
            row.scored.completed_at.format("%Y-%m-%d %H:%M"),
            result.assessment_id,
            result.score,
            result.max_score,
            result.percentage_label()
        );
    }
    Ok(())
}

async fn configure(flow: &mut FlowController, args: &RunArgs, input: &mut Prompter) -> Result<()> {
    let builder = flow.builder_mut();
    if let Some(level) = args.level {
        builder.set_difficulty(level.into());
    }
    if let Some(pace) = args.pace {
        builder.set_pace(pace.into());
    }
    if let Some(language) = &args.language {
        builder.set_language(language.clone());
    }
    for platform in &args.platforms {
        builder.toggle_platform(platform)?;
    }

    loop {
        let builder = flow.builder();
        println!("Topics:");
        for (i, topic) in builder.topics().iter().enumerate() {
            let mark = if topic.included() { 'x' } else { ' ' };
            println!("  {}. [{mark}] {} ({})", i + 1, topic.name(), topic.level());
        }
        println!(
            "About {} weeks, {:?} resources",
            builder.estimated_weeks(),
            builder.resource_mix()
        );

        let count = builder.topics().len();
        let Some(index) = input
            .choose("Toggle a topic by number, or press enter to continue:", count)
            .await?
        else {
            if flow.builder().can_proceed() {
                return Ok(());
            }
            println!("select at least one topic");
            continue;
        };
        let name = flow.builder().topics()[index].name().to_owned();
        flow.builder_mut().toggle_topic(&name)?;
    }
}

async fn take_assessment(flow: &mut FlowController, input: &mut Prompter) -> Result<()> {
    loop {
        let Some(session) = flow.session() else {
            anyhow::bail!("no assessment is open");
        };
        if session.is_complete() {
            break;
        }
        let Some(question) = session.current_question().cloned() else {
            anyhow::bail!("the assessment has no questions");
        };
        let progress = session.progress();

        println!();
        println!("{}  {}", progress.position_label(), progress.score_label());
        println!("{}", question.prompt());

        if !session.explanation_shown() {
            let answer = if question.options().is_empty() {
                input.ask("Your answer:").await?
            } else {
                for (i, option) in question.options().iter().enumerate() {
                    println!("  {}. {option}", i + 1);
                }
                match input.choose("Choose:", question.options().len()).await? {
                    Some(index) => question.options()[index].clone(),
                    None => continue,
                }
            };
            match flow.select_answer(&answer).await {
                Ok(outcome) if outcome.correct => println!("Correct."),
                Ok(_) => println!("Incorrect. The answer is: {}", question.correct_answer()),
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            }
            if !question.explanation().is_empty() {
                println!("{}", question.explanation());
            }
        }

        match flow.advance().await {
            Ok(Advance::Completed(_)) => break,
            Ok(Advance::Next { .. }) => {}
            Err(FlowError::Session(SessionError::Incomplete { .. })) => {
                println!("{}", flow.error_banner().unwrap_or("incomplete"));
                flow.resume_unanswered().await?;
            }
            Err(err) => return Err(err.into()),
        }
    }

    let mut outcome = flow.submit().await;
    let result = loop {
        match outcome {
            Ok(result) => break result,
            Err(FlowError::Api(err)) => {
                println!("submission failed: {err}");
                if !input.confirm("Try again?").await? {
                    return Err(err.into());
                }
                outcome = flow.retry_submission().await;
            }
            Err(err) => return Err(err.into()),
        }
    };

    println!();
    println!(
        "Score: {}/{} ({})",
        result.score,
        result.max_score,
        result.percentage_label()
    );
    flow.proceed_to_roadmap().await?;
    Ok(())
}
