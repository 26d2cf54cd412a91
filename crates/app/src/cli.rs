use clap::{Args, Parser, Subcommand};
use tracker_core::model::{ChapterId, SectionId, SectionKind, SubjectId, TaskId, Theme};

pub const DEFAULT_DB_URL: &str = "sqlite://tracker.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "tracker", author, version, about = "Track study progress and goals")]
pub struct Cli {
    /// SQLite database URL or path.
    #[arg(long = "db", global = true, env = "TRACKER_DB_URL", default_value = DEFAULT_DB_URL)]
    pub db_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show overall mastery, subjects, and the task inbox.
    Status,
    Subject {
        #[command(subcommand)]
        command: SubjectCommand,
    },
    Chapter {
        #[command(subcommand)]
        command: ChapterCommand,
    },
    Section {
        #[command(subcommand)]
        command: SectionCommand,
    },
    #[command(name = "sub")]
    SubSection {
        #[command(subcommand)]
        command: SubSectionCommand,
    },
    /// Flip one practice question in a section or sub-section.
    Toggle(ToggleArgs),
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Fill an empty database with a small sample catalogue.
    Demo,
}

#[derive(Debug, Subcommand)]
pub enum SubjectCommand {
    Add {
        title: String,
        #[arg(long, default_value = tracker_core::model::DEFAULT_ICON)]
        icon: String,
    },
    #[command(alias = "rm")]
    Delete { id: SubjectId },
    List,
}

#[derive(Debug, Subcommand)]
pub enum ChapterCommand {
    Add(ChapterAddArgs),
    #[command(alias = "rm")]
    Delete { id: ChapterId },
    /// Print a chapter with every section and question grid.
    Show { id: ChapterId },
}

#[derive(Debug, Args)]
pub struct ChapterAddArgs {
    pub subject_id: SubjectId,
    pub title: String,

    /// Initial section kinds, one empty section each.
    #[arg(long, value_delimiter = ',', default_value = "examples,exercise,pyqs")]
    pub kinds: Vec<SectionKind>,

    /// Start without any sections.
    #[arg(long, conflicts_with = "kinds")]
    pub empty: bool,
}

impl ChapterAddArgs {
    #[must_use]
    pub fn initial_kinds(&self) -> Vec<SectionKind> {
        if self.empty {
            Vec::new()
        } else {
            self.kinds.clone()
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum SectionCommand {
    /// Append a section. With `--questions` it gets its own question grid.
    Add {
        chapter_id: ChapterId,
        title: String,
        #[arg(long, default_value = "other")]
        kind: SectionKind,
        #[arg(long)]
        questions: Option<u32>,
    },
    #[command(alias = "rm")]
    Delete {
        chapter_id: ChapterId,
        section_id: SectionId,
    },
}

#[derive(Debug, Subcommand)]
pub enum SubSectionCommand {
    Add {
        chapter_id: ChapterId,
        parent_id: SectionId,
        title: String,
        #[arg(long, default_value_t = 10)]
        questions: u32,
    },
    #[command(alias = "rm")]
    Delete {
        chapter_id: ChapterId,
        parent_id: SectionId,
        sub_id: SectionId,
    },
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    pub section_id: SectionId,
    /// Zero-based question index.
    pub index: usize,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    Add(TaskAddArgs),
    /// Add a task titled after the linked subject, chapter, and section.
    Link {
        subject_id: SubjectId,
        #[arg(long)]
        chapter: Option<ChapterId>,
        #[arg(long, requires = "chapter")]
        section: Option<SectionId>,
    },
    Toggle {
        id: TaskId,
    },
    #[command(alias = "rm")]
    Delete {
        id: TaskId,
    },
    List,
}

#[derive(Debug, Args)]
pub struct TaskAddArgs {
    pub title: String,
    #[arg(long)]
    pub subject: Option<SubjectId>,
    #[arg(long)]
    pub chapter: Option<ChapterId>,
    #[arg(long)]
    pub section: Option<SectionId>,
}

#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    Show,
    Set { theme: Theme },
    Toggle,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    Show,
    /// Store a profile handed over by an identity provider.
    SignIn(SignInArgs),
    /// Continue as a local guest.
    Guest,
    SignOut,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        photo: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct SignInArgs {
    #[arg(long)]
    pub uid: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub photo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser as _;

    #[test]
    fn chapter_kinds_default_and_parse() {
        let subject = SubjectId::generate().to_string();
        let cli = Cli::try_parse_from(["tracker", "chapter", "add", &subject, "Calculus"]).unwrap();
        let Command::Chapter {
            command: ChapterCommand::Add(args),
        } = cli.command
        else {
            panic!("expected chapter add");
        };
        assert_eq!(args.initial_kinds(), SectionKind::DEFAULT_INITIAL.to_vec());

        let cli = Cli::try_parse_from([
            "tracker", "chapter", "add", &subject, "Optics", "--kinds", "lecture,PYQS",
        ])
        .unwrap();
        let Command::Chapter {
            command: ChapterCommand::Add(args),
        } = cli.command
        else {
            panic!("expected chapter add");
        };
        assert_eq!(
            args.initial_kinds(),
            vec![SectionKind::Lecture, SectionKind::Pyqs]
        );
    }

    #[test]
    fn rejects_malformed_ids_and_kinds() {
        assert!(Cli::try_parse_from(["tracker", "subject", "rm", "42"]).is_err());
        let subject = SubjectId::generate().to_string();
        assert!(
            Cli::try_parse_from(["tracker", "chapter", "add", &subject, "x", "--kinds", "quiz"])
                .is_err()
        );
    }

    #[test]
    fn section_link_requires_chapter() {
        let subject = SubjectId::generate().to_string();
        let section = SectionId::generate().to_string();
        assert!(
            Cli::try_parse_from(["tracker", "task", "link", &subject, "--section", &section])
                .is_err()
        );
    }

    #[test]
    fn db_flag_is_global() {
        let cli = Cli::try_parse_from(["tracker", "status", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(cli.db_url, "sqlite::memory:");
    }
}
