use tracker_core::model::{Chapter, SectionKind, TaskLink};
use tracker_core::time::fixed_clock;
use tracker_core::{Entity, ProgressTree, SectionRef, Tracker, TrackerError};

/// Checks every derived value in the tree against its source data.
fn assert_consistent(tree: &ProgressTree) {
    for chapter in tree.chapters() {
        let mut total = 0;
        let mut completed = 0;
        for section in chapter.sections() {
            if section.is_container() {
                assert!(section.questions().is_empty());
                let sub_total: usize = section.sub_sections().iter().map(|s| s.questions().len()).sum();
                let sub_done: usize = section
                    .sub_sections()
                    .iter()
                    .map(|s| s.questions().iter().filter(|q| **q).count())
                    .sum();
                assert_eq!(section.total_questions(), sub_total);
                assert_eq!(section.completed_count(), sub_done);
            } else {
                assert_eq!(section.total_questions(), section.questions().len());
                assert_eq!(
                    section.completed_count(),
                    section.questions().iter().filter(|q| **q).count()
                );
            }
            total += section.total_questions();
            completed += section.completed_count();
        }
        let expected = if total == 0 {
            0
        } else {
            (100.0 * completed as f64 / total as f64).round() as u8
        };
        assert_eq!(chapter.progress(), expected, "chapter {}", chapter.title());
    }

    for subject in tree.subjects() {
        let chapters: Vec<&Chapter> = tree
            .chapters()
            .iter()
            .filter(|c| c.subject_id() == subject.id())
            .collect();
        assert_eq!(subject.unit_count() as usize, chapters.len());
        let expected = if chapters.is_empty() {
            0
        } else {
            let sum: f64 = chapters.iter().map(|c| f64::from(c.progress())).sum();
            (sum / chapters.len() as f64).round() as u8
        };
        assert_eq!(subject.progress(), expected, "subject {}", subject.title());
    }
}

#[test]
fn calculus_scenario_rolls_up_to_thirty_percent() {
    let mut tracker = Tracker::new(fixed_clock());
    let maths = tracker.create_subject("Mathematics", "Sigma").unwrap();
    assert_eq!(maths.progress(), 0);
    assert_eq!(maths.unit_count(), 0);

    let calculus = tracker
        .create_chapter(
            maths.id(),
            "Calculus",
            [SectionKind::Examples, SectionKind::Exercise],
        )
        .unwrap();
    let titles: Vec<&str> = calculus.sections().iter().map(|s| s.title()).collect();
    assert_eq!(titles, ["EXAMPLES", "EXERCISE"]);
    let exercise = calculus.sections()[1].id();

    let sub = tracker
        .add_sub_section(calculus.id(), exercise, "Ex 1.1", 10)
        .unwrap();
    assert_eq!(sub.questions(), &[false; 10]);

    for index in [0, 1, 2] {
        assert!(tracker.toggle_question(sub.id(), index).unwrap());
    }

    let tree = tracker.tree();
    let chapter = tree.chapter(calculus.id()).unwrap();
    let section = chapter.section(exercise).unwrap();
    assert!(section.is_container());
    assert_eq!(section.completed_count(), 3);
    assert_eq!(section.total_questions(), 10);
    assert_eq!(chapter.progress(), 30);
    assert_eq!(tree.subject(maths.id()).unwrap().progress(), 30);
    assert_eq!(tree.subject(maths.id()).unwrap().unit_count(), 1);
    assert_consistent(tree);
}

#[test]
fn empty_chapter_and_subject_report_zero() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("History", "History").unwrap().id();
    assert_eq!(tree.subject(subject).unwrap().progress(), 0);

    let chapter = tree
        .create_chapter(subject, "Empires", std::iter::empty())
        .unwrap()
        .id();
    let chapter = tree.chapter(chapter).unwrap();
    assert!(chapter.sections().is_empty());
    assert_eq!(chapter.progress(), 0);
    assert_eq!(tree.subject(subject).unwrap().progress(), 0);
    assert_consistent(&tree);
}

#[test]
fn initial_kinds_are_deduplicated_in_canonical_order() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Chemistry", "FlaskConical").unwrap().id();
    let chapter = tree
        .create_chapter(
            subject,
            "Bonds",
            [SectionKind::Pyqs, SectionKind::Examples, SectionKind::Pyqs],
        )
        .unwrap();
    let kinds: Vec<SectionKind> = chapter.sections().iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, [SectionKind::Examples, SectionKind::Pyqs]);
}

#[test]
fn toggling_twice_restores_everything() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Physics", "Atom").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "Waves", [SectionKind::Exercise])
        .unwrap()
        .id();
    let parent = tree.chapter(chapter).unwrap().sections()[0].id();
    let sub = tree.add_sub_section(chapter, parent, "Set A", 4).unwrap().id();
    tree.toggle_question(sub, 1).unwrap();

    let before = tree.clone();
    tree.toggle_question(sub, 3).unwrap();
    assert_ne!(
        tree.chapter(chapter).unwrap().progress(),
        before.chapter(chapter).unwrap().progress()
    );
    tree.toggle_question(sub, 3).unwrap();

    assert_eq!(tree.chapters(), before.chapters());
    assert_eq!(tree.subjects(), before.subjects());
}

#[test]
fn toggle_at_grid_length_is_out_of_range_and_changes_nothing() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Biology", "Dna").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "Cells", [SectionKind::Exercise])
        .unwrap()
        .id();
    let parent = tree.chapter(chapter).unwrap().sections()[0].id();
    let sub = tree.add_sub_section(chapter, parent, "Ex 2", 5).unwrap().id();
    tree.toggle_question(sub, 0).unwrap();

    let before = tree.clone();
    let err = tree.toggle_question(sub, 5).unwrap_err();
    assert_eq!(err, TrackerError::OutOfRange { index: 5, len: 5 });
    assert_eq!(tree.chapters(), before.chapters());
    assert_eq!(tree.subjects(), before.subjects());
}

#[test]
fn toggle_on_container_or_unknown_id_fails() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Art", "Palette").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "Colour", [SectionKind::Exercise])
        .unwrap()
        .id();
    let parent = tree.chapter(chapter).unwrap().sections()[0].id();
    tree.add_sub_section(chapter, parent, "Wheel", 3).unwrap();

    assert_eq!(
        tree.toggle_question(parent, 0).unwrap_err(),
        TrackerError::OutOfRange { index: 0, len: 0 }
    );
    assert!(matches!(
        tree.toggle_question(tracker_core::model::SectionId::generate(), 0),
        Err(TrackerError::NotFound { entity: Entity::Section, .. })
    ));
}

#[test]
fn question_sections_toggle_directly() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Music", "Music").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "Scales", std::iter::empty())
        .unwrap()
        .id();
    let drills = tree
        .add_question_section(chapter, "Drills", SectionKind::Lecture, 4)
        .unwrap()
        .id();
    tree.toggle_question(drills, 3).unwrap();
    assert_eq!(tree.chapter(chapter).unwrap().progress(), 25);
    assert_eq!(tree.subject(subject).unwrap().progress(), 25);

    let err = tree.add_sub_section(chapter, drills, "Nested", 2).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidState(_)));
    assert_consistent(&tree);
}

#[test]
fn add_section_appends_without_changing_totals() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Languages", "Languages").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "French", [SectionKind::Exercise])
        .unwrap()
        .id();
    let parent = tree.chapter(chapter).unwrap().sections()[0].id();
    let sub = tree.add_sub_section(chapter, parent, "Verbs", 2).unwrap().id();
    tree.toggle_question(sub, 0).unwrap();
    assert_eq!(tree.chapter(chapter).unwrap().progress(), 50);

    let added = tree.add_section(chapter, "Reading").unwrap();
    assert_eq!(added.kind(), SectionKind::Other);
    assert_eq!(added.total_questions(), 0);
    let chapter = tree.chapter(chapter).unwrap();
    assert_eq!(chapter.sections().last().unwrap().title(), "Reading");
    assert_eq!(chapter.progress(), 50);
}

#[test]
fn missing_parents_are_not_found() {
    let mut tree = ProgressTree::new();
    assert!(matches!(
        tree.create_chapter(
            tracker_core::model::SubjectId::generate(),
            "Orphan",
            [SectionKind::Other]
        ),
        Err(TrackerError::NotFound { entity: Entity::Subject, .. })
    ));
    assert!(matches!(
        tree.add_section(tracker_core::model::ChapterId::generate(), "Loose"),
        Err(TrackerError::NotFound { entity: Entity::Chapter, .. })
    ));

    let subject = tree.create_subject("Computing", "Cpu").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "Graphs", std::iter::empty())
        .unwrap()
        .id();
    assert!(matches!(
        tree.add_sub_section(chapter, tracker_core::model::SectionId::generate(), "x", 1),
        Err(TrackerError::NotFound { entity: Entity::Section, .. })
    ));
    assert!(tree.subjects()[0].unit_count() == 1);
}

#[test]
fn deleting_chapter_decrements_unit_count_once() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Geography", "Globe").unwrap().id();
    let keep = tree
        .create_chapter(subject, "Rivers", [SectionKind::Exercise])
        .unwrap()
        .id();
    let drop = tree
        .create_chapter(subject, "Mountains", [SectionKind::Exercise])
        .unwrap()
        .id();

    let parent = tree.chapter(drop).unwrap().sections()[0].id();
    let sub = tree.add_sub_section(drop, parent, "Peaks", 2).unwrap().id();
    tree.toggle_question(sub, 0).unwrap();
    tree.toggle_question(sub, 1).unwrap();
    assert_eq!(tree.subject(subject).unwrap().unit_count(), 2);
    assert_eq!(tree.subject(subject).unwrap().progress(), 50);

    tree.delete_chapter(drop).unwrap();
    let s = tree.subject(subject).unwrap();
    assert_eq!(s.unit_count(), 1);
    assert_eq!(s.progress(), 0);
    assert_eq!(tree.chapters_of(subject).count(), 1);
    assert_eq!(tree.chapters_of(subject).next().unwrap().id(), keep);

    let again = tree
        .create_chapter(subject, "Mountains", [SectionKind::Exercise])
        .unwrap()
        .id();
    assert_ne!(again, drop);
    assert_eq!(tree.subject(subject).unwrap().unit_count(), 2);
    assert!(matches!(
        tree.delete_chapter(drop),
        Err(TrackerError::NotFound { entity: Entity::Chapter, .. })
    ));
    assert_consistent(&tree);
}

#[test]
fn deleting_subject_cascades_to_chapters_only() {
    let mut tracker = Tracker::new(fixed_clock());
    let a = tracker.create_subject("A", "BookOpen").unwrap().id();
    let b = tracker.create_subject("B", "BookOpen").unwrap().id();
    let ch = tracker.create_chapter(a, "A1", [SectionKind::Other]).unwrap().id();
    tracker.create_chapter(b, "B1", [SectionKind::Other]).unwrap();
    tracker
        .create_task("Finish A1", TaskLink::to_chapter(a, ch))
        .unwrap();

    tracker.delete_subject(a).unwrap();
    assert_eq!(tracker.tree().subjects().len(), 1);
    assert_eq!(tracker.tree().chapters().len(), 1);
    assert!(tracker.tree().chapter(ch).is_none());
    assert_eq!(tracker.inbox().tasks().len(), 1);
    assert!(matches!(
        tracker.delete_subject(a),
        Err(TrackerError::NotFound { entity: Entity::Subject, .. })
    ));
}

#[test]
fn deleting_sections_rederives_ancestors() {
    let mut tree = ProgressTree::new();
    let subject = tree.create_subject("Maths", "Calculator").unwrap().id();
    let chapter = tree
        .create_chapter(subject, "Algebra", [SectionKind::Examples, SectionKind::Exercise])
        .unwrap()
        .id();
    let sections: Vec<_> = tree.chapter(chapter).unwrap().sections().iter().map(|s| s.id()).collect();
    let (examples, exercise) = (sections[0], sections[1]);

    let done = tree.add_sub_section(chapter, examples, "Worked", 2).unwrap().id();
    tree.toggle_question(done, 0).unwrap();
    tree.toggle_question(done, 1).unwrap();
    let todo = tree.add_sub_section(chapter, exercise, "Ex 1", 2).unwrap().id();
    let other = tree.add_sub_section(chapter, exercise, "Ex 2", 4).unwrap().id();
    tree.toggle_question(other, 0).unwrap();
    // 3 of 8
    assert_eq!(tree.chapter(chapter).unwrap().progress(), 38);

    tree.delete_sub_section(chapter, exercise, todo).unwrap();
    // 3 of 6
    assert_eq!(tree.chapter(chapter).unwrap().progress(), 50);
    assert!(matches!(
        tree.delete_sub_section(chapter, exercise, todo),
        Err(TrackerError::NotFound { entity: Entity::SubSection, .. })
    ));

    tree.delete_section(chapter, examples).unwrap();
    // 1 of 4
    assert_eq!(tree.chapter(chapter).unwrap().progress(), 25);
    assert_eq!(tree.subject(subject).unwrap().progress(), 25);
    assert!(matches!(
        tree.delete_section(chapter, examples),
        Err(TrackerError::NotFound { entity: Entity::Section, .. })
    ));
    assert_consistent(&tree);
}

#[test]
fn task_linked_to_deleted_chapter_survives() {
    let mut tracker = Tracker::new(fixed_clock());
    let subject = tracker.create_subject("Physics", "Atom").unwrap().id();
    let chapter = tracker
        .create_chapter(subject, "Optics", [SectionKind::Exercise])
        .unwrap();
    let section = chapter.sections()[0].id();
    let task = tracker
        .create_task(
            "Physics - Optics (EXERCISE)",
            TaskLink::to_chapter(subject, chapter.id()).with_section(section),
        )
        .unwrap();

    let resolved = tracker.tree().resolve_link(task.link());
    assert!(resolved.chapter.is_some());
    assert!(matches!(resolved.section, Some(SectionRef::Section(_))));

    tracker.delete_chapter(chapter.id()).unwrap();

    let kept = tracker.inbox().task(task.id()).unwrap();
    assert_eq!(kept.title(), "Physics - Optics (EXERCISE)");
    assert_eq!(kept.link().chapter_id, Some(chapter.id()));

    let resolved = tracker.tree().resolve_link(kept.link());
    assert!(resolved.subject.is_some());
    assert!(resolved.chapter.is_none());
    assert!(resolved.section.is_none());

    assert!(tracker.toggle_task(task.id()).unwrap());
    tracker.delete_task(task.id()).unwrap();
    assert!(tracker.inbox().tasks().is_empty());
}

#[test]
fn overall_mastery_averages_subjects() {
    let mut tree = ProgressTree::new();
    assert_eq!(tree.overall_mastery(), 0);

    let a = tree.create_subject("A", "BookOpen").unwrap().id();
    tree.create_subject("B", "BookOpen").unwrap();
    let chapter = tree.create_chapter(a, "A1", std::iter::empty()).unwrap().id();
    let drills = tree
        .add_question_section(chapter, "Drills", SectionKind::Other, 1)
        .unwrap()
        .id();
    tree.toggle_question(drills, 0).unwrap();
    assert_eq!(tree.subject(a).unwrap().progress(), 100);
    assert_eq!(tree.overall_mastery(), 50);
}

#[test]
fn rebuild_from_persisted_rederives_and_drops_orphans() {
    let mut source = ProgressTree::new();
    let subject = source.create_subject("Maths", "Sigma").unwrap().id();
    let chapter = source
        .create_chapter(subject, "Limits", [SectionKind::Exercise])
        .unwrap()
        .id();
    let parent = source.chapter(chapter).unwrap().sections()[0].id();
    let sub = source.add_sub_section(chapter, parent, "Ex", 3).unwrap().id();
    source.toggle_question(sub, 2).unwrap();

    let other = source.create_subject("Gone", "BookOpen").unwrap().id();
    source.create_chapter(other, "Stranded", std::iter::empty()).unwrap();
    let chapters = source.chapters().to_vec();
    let subjects: Vec<_> = source
        .subjects()
        .iter()
        .filter(|s| s.id() != other)
        .cloned()
        .collect();

    let rebuilt = ProgressTree::from_persisted(subjects, chapters).unwrap();
    assert_eq!(rebuilt.chapters().len(), 1);
    assert_eq!(rebuilt.chapter(chapter).unwrap().progress(), 33);
    assert_eq!(rebuilt.subject(subject).unwrap().progress(), 33);
    assert_eq!(rebuilt.subject(subject).unwrap().unit_count(), 1);
    assert_consistent(&rebuilt);
}

#[test]
fn rebuild_rejects_duplicate_ids() {
    let mut source = ProgressTree::new();
    let subject = source.create_subject("Maths", "Sigma").unwrap().clone();
    let err = ProgressTree::from_persisted(vec![subject.clone(), subject], Vec::new()).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidState(_)));
}

#[test]
fn blank_titles_are_rejected_and_others_trimmed() {
    let mut tree = ProgressTree::new();
    assert_eq!(
        tree.create_subject("   ", "BookOpen").unwrap_err(),
        TrackerError::EmptyTitle
    );
    let subject = tree.create_subject("  Economics ", "BookOpen").unwrap();
    assert_eq!(subject.title(), "Economics");
    assert!(tree.subjects().len() == 1);
}
