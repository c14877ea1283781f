#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{mount, mount_with, sections_of, snapshot, CompletionMode, TestView};
use diffable_core::{
    Changeset, DataSourceOptions, DiffEngine, DiffableDataSource, DiffableError, Differ,
    IndexPath, Keyed, ReloadPolicy, Snapshot,
};

fn view_sections(source: &common::TestSource) -> Vec<(&'static str, Vec<u32>)> {
    source.with_view(|view| view.sections.clone())
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

#[test]
fn test_first_apply_populates_view() {
    let (source, _pump) = mount(CompletionMode::Inline);
    let s = snapshot(&[("a", &[1, 2]), ("b", &[3])]);

    source.apply(s.clone(), false);

    assert_eq!(view_sections(&source), sections_of(&s));
    assert_eq!(source.snapshot(), s);
    assert_eq!(source.with_view(|view| view.batches), 1);
}

#[test]
fn test_successive_applies_round_trip() {
    let (source, _pump) = mount(CompletionMode::Inline);
    let steps = [
        snapshot(&[("a", &[1, 2, 3]), ("b", &[4, 5])]),
        snapshot(&[("b", &[5, 4]), ("a", &[1, 3])]),
        snapshot(&[("a", &[3, 1, 2]), ("c", &[4]), ("b", &[])]),
        snapshot(&[("c", &[2, 4, 1]), ("d", &[3, 6])]),
        snapshot(&[("d", &[6])]),
        snapshot(&[]),
    ];

    for step in steps {
        source.apply(step.clone(), true);
        assert_eq!(view_sections(&source), sections_of(&step), "after {:?}", step);
        assert_eq!(source.snapshot(), step);
    }
}

#[test]
fn test_scenario_item_moves_into_new_section() {
    // GIVEN: the view shows [A] with A = [1, 2]
    let (source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("A", &[1, 2])]), false);
    source.with_view(|view| view.calls.clear());

    // WHEN: applying [A, B] with A = [1], B = [2]
    let next = snapshot(&[("A", &[1]), ("B", &[2])]);
    source.apply(next.clone(), true);

    // THEN: one section insert plus one item move reach the view
    assert_eq!(
        source.with_view(|view| view.calls.clone()),
        vec!["insert_sections", "move_item"]
    );
    assert_eq!(view_sections(&source), sections_of(&next));
}

#[test]
fn test_empty_delta_is_fast_path() {
    let (source, _pump) = mount(CompletionMode::Inline);
    let s = snapshot(&[("a", &[1])]);
    source.apply(s.clone(), false);

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    source.apply_with_completion(
        s,
        true,
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(source.with_view(|view| view.batches), 1, "no second batch");
}

#[test]
fn test_view_without_batching_gets_reload_data() {
    let (source, _pump) = mount(CompletionMode::Inline);
    source.with_view(|view| view.supports_batch = false);
    let s = snapshot(&[("a", &[1, 2])]);

    source.apply(s.clone(), true);

    assert_eq!(source.with_view(|view| view.full_reloads), 1);
    assert_eq!(source.with_view(|view| view.batches), 0);
    assert_eq!(view_sections(&source), sections_of(&s));
}

#[test]
fn test_animate_flag_reaches_view() {
    let (source, _pump) = mount(CompletionMode::Inline);

    source.apply(snapshot(&[("a", &[1])]), true);
    source.apply(snapshot(&[("a", &[1, 2])]), false);

    assert_eq!(source.with_view(|view| view.batches), 2);
    assert_eq!(source.with_view(|view| view.animated_batches), 1);
}

#[test]
fn test_apply_default_animates_unless_configured_otherwise() {
    // GIVEN: one source with default options, one configured not to animate
    let (animated, _pump) = mount(CompletionMode::Inline);
    let (still, _still_pump) = mount_with(
        CompletionMode::Inline,
        DataSourceOptions::<&'static str, u32>::new().with_default_animation(false),
    );

    // WHEN: applying without an explicit animation flag
    animated.apply_default(snapshot(&[("a", &[1])]));
    still.apply_default(snapshot(&[("a", &[1])]));

    // THEN: the configured default reached the view
    assert_eq!(animated.with_view(|view| view.animated_batches), 1);
    assert_eq!(still.with_view(|view| view.batches), 1);
    assert_eq!(still.with_view(|view| view.animated_batches), 0);
    assert_eq!(still.snapshot(), snapshot(&[("a", &[1])]));
}

#[test]
fn test_content_changes_reach_view_through_reloads() {
    let (source, _pump) = mount_with::<&'static str, Keyed<u32, &'static str>>(
        CompletionMode::Inline,
        DataSourceOptions::default(),
    );
    let first: Snapshot<&str, Keyed<u32, &str>> = Snapshot::from_sections([(
        "a",
        vec![Keyed::new(1, "one"), Keyed::new(2, "two"), Keyed::new(3, "three")],
    )])
    .unwrap();
    let second: Snapshot<&str, Keyed<u32, &str>> = Snapshot::from_sections([(
        "a",
        vec![Keyed::new(3, "THREE"), Keyed::new(1, "one"), Keyed::new(2, "TWO")],
    )])
    .unwrap();

    source.apply(first, false);
    source.apply(second.clone(), true);

    assert_eq!(source.with_view(|view| view.sections.clone()), sections_of(&second));
}

#[test]
fn test_forced_policy_reloads_marked_items() {
    let (source, _pump) = mount_with::<&'static str, u32>(
        CompletionMode::Inline,
        DataSourceOptions::new().with_reload_policy(ReloadPolicy::Forced),
    );
    source.apply(snapshot(&[("a", &[1, 2])]), false);
    source.with_view(|view| view.calls.clear());

    let mut next = source.snapshot();
    next.reload_items(&[2]).unwrap();
    source.apply(next, false);

    assert_eq!(source.with_view(|view| view.calls.clone()), vec!["reload_items"]);
    // Marks only apply to one diff
    assert!(source.snapshot().reloaded_item_identifiers().is_empty());
}

#[test]
fn test_default_policy_ignores_marks_on_unchanged_items() {
    let (source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("a", &[1, 2])]), false);

    let mut next = source.snapshot();
    next.reload_items(&[2]).unwrap();
    source.apply(next, false);

    assert_eq!(source.with_view(|view| view.batches), 1);
}

struct CountingEngine {
    inner: Differ,
    calls: Arc<AtomicUsize>,
}

impl DiffEngine<&'static str, u32> for CountingEngine {
    fn diff(
        &self,
        old: &Snapshot<&'static str, u32>,
        new: &Snapshot<&'static str, u32>,
    ) -> Changeset<&'static str, u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.diff(old, new)
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

#[test]
fn test_custom_engine_is_used() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = CountingEngine {
        inner: Differ::new(),
        calls: Arc::clone(&calls),
    };
    let (source, _pump) = mount_with(
        CompletionMode::Inline,
        DataSourceOptions::<&'static str, u32>::new().with_engine(Arc::new(engine)),
    );

    source.apply(snapshot(&[("a", &[1])]), false);
    source.apply(snapshot(&[("a", &[2])]), false);

    assert_eq!(source.engine_name(), "counting");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_default_engine_name() {
    let (source, _pump) = mount(CompletionMode::Inline);
    assert_eq!(source.engine_name(), "lis");
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[test]
fn test_query_callbacks() {
    let (source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("a", &[1, 2]), ("b", &[3])]), false);

    assert_eq!(source.number_of_sections(), 2);
    assert_eq!(source.number_of_items(0), 2);
    assert_eq!(source.number_of_items(1), 1);
    assert_eq!(source.number_of_items(7), 0);
    assert_eq!(source.item_identifier(IndexPath::new(1, 0)), Some(3));
    assert_eq!(source.item_identifier(IndexPath::new(1, 1)), None);
    assert_eq!(source.index_path(&2), Some(IndexPath::new(0, 1)));
    assert_eq!(source.index_path(&42), None);
    assert_eq!(source.section_identifier(1), Some("b"));
    assert_eq!(source.section_identifier(2), None);
    assert_eq!(source.index_of_section(&"b"), Some(1));
    assert_eq!(source.index_of_section(&"zz"), None);
}

#[test]
fn test_snapshot_is_defensive_copy() {
    // GIVEN: an applied snapshot
    let (source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("a", &[1, 2])]), false);

    // WHEN: mutating the copy handed out
    let mut copy = source.snapshot();
    copy.delete_all_items();
    copy.append_sections(["x"]).unwrap();

    // THEN: the live structure and the view are unaffected
    assert_eq!(source.snapshot(), snapshot(&[("a", &[1, 2])]));
    assert_eq!(source.number_of_sections(), 1);
    assert_eq!(view_sections(&source), vec![("a", vec![1, 2])]);
}

#[test]
fn test_reader_tracks_live_snapshot() {
    let (source, _pump) = mount(CompletionMode::Inline);
    let reader = source.reader();
    let other = reader.clone();
    assert_eq!(reader.number_of_sections(), 0);

    source.apply(snapshot(&[("a", &[1]), ("b", &[2, 3])]), false);

    assert_eq!(other.number_of_sections(), 2);
    assert_eq!(other.number_of_items(1), 2);
    assert_eq!(other.item_identifier(IndexPath::new(1, 1)), Some(3));
    assert_eq!(other.index_path(&3), Some(IndexPath::new(1, 1)));
    assert_eq!(other.section_identifier(0), Some("a"));
    assert_eq!(other.index_of_section(&"b"), Some(1));
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[test]
fn test_cell_is_built_from_current_item() {
    let (source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("a", &[10, 20])]), false);

    let cell = source.with_view(|view| source.cell(view, IndexPath::new(0, 1)));

    assert_eq!(cell.unwrap(), "20");
}

#[test]
fn test_cell_for_missing_coordinate_is_contract_violation() {
    let (source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("a", &[10])]), false);

    let err = source
        .with_view(|view| source.cell(view, IndexPath::new(0, 5)))
        .unwrap_err();

    assert_eq!(err, DiffableError::InvalidIndexPath { section: 0, item: 5 });
}

#[test]
fn test_cell_provider_returning_none_is_fatal_error() {
    let pump = common::CompletionPump::default();
    let view: TestView = TestView::new(CompletionMode::Inline, pump);
    let source: DiffableDataSource<&str, u32, TestView> = DiffableDataSource::new(
        view,
        Box::new(|_: &TestView, _: IndexPath, item: &u32| {
            (*item != 13).then(|| item.to_string())
        }),
    );
    let reader = source.reader();
    source.with_view(|view| view.attach(reader));
    source.apply(snapshot(&[("a", &[12, 13])]), false);

    let ok = source.with_view(|view| source.cell(view, IndexPath::new(0, 0)));
    let err = source
        .with_view(|view| source.cell(view, IndexPath::new(0, 1)))
        .unwrap_err();

    assert_eq!(ok.unwrap(), "12");
    assert_eq!(
        err,
        DiffableError::CellProviderReturnedNone {
            section: 0,
            item: 1,
            item_id: "13".to_string(),
        }
    );
}

#[test]
fn test_supplementary_views() {
    let (mut source, _pump) = mount(CompletionMode::Inline);
    source.apply(snapshot(&[("a", &[1])]), false);

    // No provider registered
    let none = source.with_view(|view| source.supplementary_view(view, "header", IndexPath::new(0, 0)));
    assert_eq!(none.unwrap(), None);

    source.set_supplementary_view_provider(Box::new(
        |_: &TestView, kind: &str, path: IndexPath| {
            (kind == "header").then(|| format!("{} {}", kind, path.section))
        },
    ));

    let header =
        source.with_view(|view| source.supplementary_view(view, "header", IndexPath::new(0, 0)));
    assert_eq!(header.unwrap(), Some("header 0".to_string()));

    let footer = source
        .with_view(|view| source.supplementary_view(view, "footer", IndexPath::new(0, 0)))
        .unwrap_err();
    assert!(matches!(
        footer,
        DiffableError::SupplementaryProviderReturnedNone { .. }
    ));

    let out_of_range = source
        .with_view(|view| source.supplementary_view(view, "header", IndexPath::new(3, 0)))
        .unwrap_err();
    assert_eq!(
        out_of_range,
        DiffableError::InvalidIndexPath { section: 3, item: 0 }
    );
}
