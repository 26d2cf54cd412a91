use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;
use services::{AppServices, Clock, Dashboard, TrackerService};
use storage::repository::Storage;
use tracker_core::model::{SectionKind, TaskLink, UserProfile};

mod cli;
mod db;
mod logging;
mod render;

use cli::{
    ChapterCommand, Cli, Command, ProfileCommand, SectionCommand, SubSectionCommand,
    SubjectCommand, TaskCommand, ThemeCommand,
};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let db_url = db::normalize_sqlite_url(&cli.db_url);
    let storage = if db_url == "sqlite::memory:" {
        // A pooled in-memory SQLite database is not shared between
        // connections, so scratch runs use the plain in-memory store.
        Storage::in_memory()
    } else {
        db::prepare_sqlite_file(&db_url)?;
        Storage::sqlite(&db_url)
            .await
            .with_context(|| format!("open {db_url}"))?
    };
    let services = AppServices::from_storage(storage, Clock::default_clock())
        .await
        .context("load tracker state")?;

    let result = dispatch(&services, cli.command).await;
    // Queued writes must land before the process exits, even after a failed
    // command.
    services.tracker().flush().await;
    result
}

async fn dispatch(services: &AppServices, command: Command) -> anyhow::Result<()> {
    let tracker = services.tracker();
    match command {
        Command::Status => {
            print!("{}", render::dashboard(&services.dashboard()?));
        }
        Command::Subject { command } => subject(&tracker, command)?,
        Command::Chapter { command } => chapter(&tracker, command)?,
        Command::Section { command } => section(&tracker, command)?,
        Command::SubSection { command } => sub_section(&tracker, command)?,
        Command::Toggle(args) => {
            let done = tracker
                .toggle_question(args.section_id, args.index)
                .context("toggle question")?;
            println!(
                "question {} is now {}",
                args.index,
                if done { "done" } else { "open" }
            );
        }
        Command::Task { command } => task(services, &tracker, command)?,
        Command::Theme { command } => theme(services, command).await?,
        Command::Profile { command } => profile(services, command).await?,
        Command::Demo => demo(&tracker)?,
    }
    Ok(())
}

fn subject(tracker: &TrackerService, command: SubjectCommand) -> anyhow::Result<()> {
    match command {
        SubjectCommand::Add { title, icon } => {
            let subject = tracker.create_subject(title, icon).context("create subject")?;
            println!("{}", subject.id());
        }
        SubjectCommand::Delete { id } => {
            let subject = tracker.delete_subject(id).context("delete subject")?;
            tracing::info!(subject = %subject.id(), "deleted subject and its chapters");
        }
        SubjectCommand::List => {
            let state = tracker.snapshot()?;
            print!("{}", render::subjects(state.tree().subjects()));
        }
    }
    Ok(())
}

fn chapter(tracker: &TrackerService, command: ChapterCommand) -> anyhow::Result<()> {
    match command {
        ChapterCommand::Add(args) => {
            let chapter = tracker
                .create_chapter(args.subject_id, args.title.clone(), args.initial_kinds())
                .context("create chapter")?;
            print!("{}", render::chapter(&chapter));
        }
        ChapterCommand::Delete { id } => {
            tracker.delete_chapter(id).context("delete chapter")?;
        }
        ChapterCommand::Show { id } => {
            let state = tracker.snapshot()?;
            let chapter = state
                .tree()
                .chapter(id)
                .with_context(|| format!("chapter not found: {id}"))?;
            print!("{}", render::chapter(chapter));
        }
    }
    Ok(())
}

fn section(tracker: &TrackerService, command: SectionCommand) -> anyhow::Result<()> {
    match command {
        SectionCommand::Add {
            chapter_id,
            title,
            kind,
            questions,
        } => {
            let section = match questions {
                Some(count) => tracker.add_question_section(chapter_id, title, kind, count),
                None => tracker.add_section(chapter_id, title),
            }
            .context("add section")?;
            println!("{}", section.id());
        }
        SectionCommand::Delete {
            chapter_id,
            section_id,
        } => {
            tracker
                .delete_section(chapter_id, section_id)
                .context("delete section")?;
        }
    }
    Ok(())
}

fn sub_section(tracker: &TrackerService, command: SubSectionCommand) -> anyhow::Result<()> {
    match command {
        SubSectionCommand::Add {
            chapter_id,
            parent_id,
            title,
            questions,
        } => {
            let sub = tracker
                .add_sub_section(chapter_id, parent_id, title, questions)
                .context("add sub-section")?;
            println!("{}", sub.id());
        }
        SubSectionCommand::Delete {
            chapter_id,
            parent_id,
            sub_id,
        } => {
            tracker
                .delete_sub_section(chapter_id, parent_id, sub_id)
                .context("delete sub-section")?;
        }
    }
    Ok(())
}

fn task(
    services: &AppServices,
    tracker: &TrackerService,
    command: TaskCommand,
) -> anyhow::Result<()> {
    match command {
        TaskCommand::Add(args) => {
            let link = TaskLink {
                subject_id: args.subject,
                chapter_id: args.chapter,
                section_id: args.section,
            };
            let task = tracker.create_task(args.title, link).context("add task")?;
            println!("{}", task.id());
        }
        TaskCommand::Link {
            subject_id,
            chapter,
            section,
        } => {
            let task = tracker
                .create_linked_task(subject_id, chapter, section)
                .context("add linked task")?;
            println!("{}  {}", task.title(), task.id());
        }
        TaskCommand::Toggle { id } => {
            let done = tracker.toggle_task(id).context("toggle task")?;
            println!("{}", if done { "done" } else { "open" });
        }
        TaskCommand::Delete { id } => {
            tracker.delete_task(id).context("delete task")?;
        }
        TaskCommand::List => {
            let view: Dashboard = services.dashboard()?;
            for item in &view.tasks {
                print!("{}", render::task_line(item));
            }
        }
    }
    Ok(())
}

async fn theme(services: &AppServices, command: ThemeCommand) -> anyhow::Result<()> {
    let profile = services.profile();
    let theme = match command {
        ThemeCommand::Show => profile.theme().await?,
        ThemeCommand::Set { theme } => {
            profile.set_theme(theme).await?;
            theme
        }
        ThemeCommand::Toggle => profile.toggle_theme().await?,
    };
    println!("{theme}");
    Ok(())
}

async fn profile(services: &AppServices, command: ProfileCommand) -> anyhow::Result<()> {
    let profiles = services.profile();
    match command {
        ProfileCommand::Show => {
            let current = profiles.current().await?;
            print!("{}", render::profile(current.as_ref()));
        }
        ProfileCommand::SignIn(args) => {
            let profile = profiles
                .sign_in(UserProfile {
                    uid: args.uid,
                    display_name: args.name,
                    email: args.email,
                    photo_url: args.photo,
                    is_anonymous: false,
                })
                .await?;
            print!("{}", render::profile(Some(&profile)));
        }
        ProfileCommand::Guest => {
            let profile = profiles.sign_in(UserProfile::guest()).await?;
            print!("{}", render::profile(Some(&profile)));
        }
        ProfileCommand::SignOut => profiles.sign_out().await?,
        ProfileCommand::Update { name, photo } => {
            let profile = profiles.update_profile(name, photo).await?;
            print!("{}", render::profile(Some(&profile)));
        }
    }
    Ok(())
}

fn demo(tracker: &TrackerService) -> anyhow::Result<()> {
    if !tracker.snapshot()?.tree().subjects().is_empty() {
        anyhow::bail!("demo data is only added to an empty tracker");
    }

    let maths = tracker.create_subject("Mathematics", "Calculator")?;
    let calculus = tracker.create_chapter(
        maths.id(),
        "Calculus",
        [SectionKind::Examples, SectionKind::Exercise],
    )?;
    let exercise = calculus.sections()[1].id();
    let sub = tracker.add_sub_section(calculus.id(), exercise, "Ex 1.1", 10)?;
    for index in 0..3 {
        tracker.toggle_question(sub.id(), index)?;
    }
    tracker.add_sub_section(calculus.id(), exercise, "Ex 1.2", 8)?;

    let physics = tracker.create_subject("Physics", "Atom")?;
    let optics = tracker.create_chapter(physics.id(), "Optics", SectionKind::DEFAULT_INITIAL)?;
    let drill = tracker.add_question_section(optics.id(), "Ray diagrams", SectionKind::Other, 5)?;
    tracker.toggle_question(drill.id(), 0)?;

    tracker.create_linked_task(maths.id(), Some(calculus.id()), Some(exercise))?;
    tracker.create_task("Plan next week", TaskLink::default())?;

    tracing::info!("added demo data");
    Ok(())
}
