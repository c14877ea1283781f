//! Human-readable summary renderer for changesets.

use std::fmt::{Debug, Display};

use crate::diff::model::Changeset;

/// Render a human-readable Markdown/text summary of a [`Changeset`].
///
/// Intended for debug logs and review of what an apply is about to do.
/// It is informational only and does not affect the structured changeset.
pub fn render_summary<S: Debug, I: Debug>(changeset: &Changeset<S, I>) -> String {
    let mut out = String::new();

    out.push_str("## Changeset\n\n");

    if changeset.is_empty() {
        out.push_str("_No changes._\n");
        return out;
    }

    out.push_str(&format!(
        "**Changes**: {}  \n**Structural**: {}\n\n",
        changeset.change_count(),
        if changeset.has_structural_changes() {
            "yes"
        } else {
            "no"
        }
    ));

    block(
        &mut out,
        "Section Deletes",
        changeset
            .section_deletes
            .iter()
            .map(|d| format!("{:?} from {}", d.id, d.source)),
    );
    block(
        &mut out,
        "Section Inserts",
        changeset
            .section_inserts
            .iter()
            .map(|i| format!("{:?} at {}", i.id, i.target)),
    );
    block(
        &mut out,
        "Section Moves",
        changeset
            .section_moves
            .iter()
            .map(|m| arrow(&m.id, m.source, m.target)),
    );
    block(
        &mut out,
        "Section Reloads",
        changeset
            .section_reloads
            .iter()
            .map(|r| format!("{:?} at {}", r.id, r.target)),
    );
    block(
        &mut out,
        "Item Deletes",
        changeset
            .item_deletes
            .iter()
            .map(|d| format!("{:?} from {}", d.id, d.source)),
    );
    block(
        &mut out,
        "Item Inserts",
        changeset
            .item_inserts
            .iter()
            .map(|i| format!("{:?} at {}", i.id, i.target)),
    );
    block(
        &mut out,
        "Item Moves",
        changeset
            .item_moves
            .iter()
            .map(|m| arrow(&m.id, m.source, m.target)),
    );
    block(
        &mut out,
        "Item Reloads",
        changeset
            .item_reloads
            .iter()
            .map(|r| format!("{:?} at {}", r.id, r.target)),
    );

    out
}

fn block(out: &mut String, title: &str, lines: impl ExactSizeIterator<Item = String>) {
    if lines.len() == 0 {
        return;
    }
    out.push_str(&format!("### {} ({})\n\n", title, lines.len()));
    for line in lines {
        out.push_str(&format!("- {}\n", line));
    }
    out.push('\n');
}

fn arrow<T: Debug, P: Display>(id: &T, source: P, target: P) -> String {
    format!("{:?}: {} -> {}", id, source, target)
}
