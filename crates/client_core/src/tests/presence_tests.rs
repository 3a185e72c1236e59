use super::*;
use shared::protocol::DetailedUser;

fn detailed(pairs: &[(&str, &str)]) -> PresenceSnapshot {
    PresenceSnapshot::Detailed(
        pairs
            .iter()
            .map(|(id, name)| DetailedUser {
                id: (*id).to_string(),
                username: (*name).to_string(),
            })
            .collect(),
    )
}

fn names(list: &[&str]) -> PresenceSnapshot {
    PresenceSnapshot::Names(list.iter().map(|name| (*name).to_string()).collect())
}

fn pairs(view: &PresenceView) -> Vec<(String, String)> {
    view.entries()
        .iter()
        .map(|entry| (entry.id.to_string(), entry.name.clone()))
        .collect()
}

#[test]
fn names_get_positional_ids() {
    let view = PresenceView::from_snapshot(names(&["Bob", "Carol"]));
    assert_eq!(
        pairs(&view),
        vec![
            ("1".to_string(), "Bob".to_string()),
            ("2".to_string(), "Carol".to_string())
        ]
    );
}

#[test]
fn duplicate_ids_keep_first_entry() {
    let view = PresenceView::from_snapshot(detailed(&[("1", "Bob"), ("2", "Carol"), ("1", "Bobby")]));
    assert_eq!(view.len(), 2);
    assert_eq!(
        pairs(&view),
        vec![
            ("1".to_string(), "Bob".to_string()),
            ("2".to_string(), "Carol".to_string())
        ]
    );
}

#[test]
fn repeated_names_are_distinct_participants() {
    let view = PresenceView::from_snapshot(names(&["Guest", "Guest"]));
    assert_eq!(view.len(), 2);
}

#[test]
fn snapshot_replaces_whole_view() {
    let mut reconciler = PresenceReconciler::new();
    assert!(reconciler.apply_snapshot(detailed(&[("1", "Bob"), ("2", "Carol")])));
    assert!(reconciler.apply_snapshot(detailed(&[("3", "Dan")])));

    let view = reconciler.view();
    assert_eq!(pairs(view), vec![("3".to_string(), "Dan".to_string())]);
    assert!(!view.contains(&ParticipantId::new("1")));
}

#[test]
fn identical_snapshot_reports_no_change() {
    let mut reconciler = PresenceReconciler::new();
    assert!(reconciler.apply_snapshot(names(&["Bob"])));
    assert!(!reconciler.apply_snapshot(names(&["Bob"])));
}

#[test]
fn no_duplicates_across_any_poll_sequence() {
    let mut reconciler = PresenceReconciler::new();
    let polls = [
        detailed(&[("1", "a"), ("1", "b"), ("2", "c")]),
        names(&["x", "y", "x"]),
        detailed(&[]),
        detailed(&[("9", "z"), ("9", "z"), ("9", "z")]),
    ];
    for snapshot in polls {
        reconciler.apply_snapshot(snapshot);
        let ids: Vec<_> = reconciler.view().entries().iter().map(|e| &e.id).collect();
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len());
    }
}

#[test]
fn clear_empties_the_view() {
    let mut reconciler = PresenceReconciler::new();
    assert!(!reconciler.clear());
    reconciler.apply_snapshot(names(&["Bob"]));
    assert!(reconciler.clear());
    assert!(reconciler.view().is_empty());
}
