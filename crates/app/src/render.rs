//! Plain-text views printed by the CLI.

use std::fmt::Write as _;

use services::{Dashboard, TaskItem};
use tracker_core::model::{Chapter, Section, Subject, UserProfile};

pub fn dashboard(view: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Overall mastery: {}%", view.overall_mastery);
    let _ = writeln!(out);
    if view.subjects.is_empty() {
        let _ = writeln!(out, "No subjects yet.");
    }
    for subject in &view.subjects {
        let _ = writeln!(
            out,
            "{:>3}%  {}  [{}] {} units  {}",
            subject.progress, subject.title, subject.icon, subject.unit_count, subject.id
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Tasks: {} pending, {} done",
        view.pending_tasks, view.completed_tasks
    );
    for task in &view.tasks {
        out.push_str(&task_line(task));
    }
    out
}

pub fn task_line(task: &TaskItem) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    let mut line = format!("[{mark}] {}  {}", task.title, task.id);
    if task.is_stale() {
        line.push_str("  (linked item was deleted)");
    }
    line.push('\n');
    line
}

pub fn subjects<'a>(subjects: impl IntoIterator<Item = &'a Subject>) -> String {
    let mut out = String::new();
    for subject in subjects {
        let _ = writeln!(
            out,
            "{}  {} ({}%, {} units)",
            subject.id(),
            subject.title(),
            subject.progress(),
            subject.unit_count()
        );
    }
    out
}

pub fn chapter(chapter: &Chapter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}%)  {}",
        chapter.title(),
        chapter.progress(),
        chapter.id()
    );
    for section in chapter.sections() {
        section_block(&mut out, section);
    }
    out
}

fn section_block(out: &mut String, section: &Section) {
    let _ = writeln!(
        out,
        "  {} [{}] {}/{}  {}",
        section.title(),
        section.kind(),
        section.completed_count(),
        section.total_questions(),
        section.id()
    );
    if !section.questions().is_empty() {
        let _ = writeln!(out, "    {}", grid(section.questions()));
    }
    for sub in section.sub_sections() {
        let _ = writeln!(
            out,
            "    {} {}/{}  {}",
            sub.title(),
            sub.completed_count(),
            sub.total_questions(),
            sub.id()
        );
        let _ = writeln!(out, "      {}", grid(sub.questions()));
    }
}

fn grid(questions: &[bool]) -> String {
    questions
        .iter()
        .map(|done| if *done { '#' } else { '.' })
        .collect()
}

pub fn profile(profile: Option<&UserProfile>) -> String {
    match profile {
        None => "Signed out\n".to_string(),
        Some(p) => {
            let name = p.display_name.as_deref().unwrap_or("(no name)");
            let kind = if p.is_anonymous { "guest" } else { "account" };
            let mut out = format!("{name} [{kind}] uid={}\n", p.uid);
            if let Some(email) = &p.email {
                let _ = writeln!(out, "email: {email}");
            }
            out
        }
    }
}
