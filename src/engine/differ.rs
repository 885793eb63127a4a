//! Diff display between a saved snapshot and the current build

use colored::Colorize;
use declarative::{Change, Declaration, DiffSummary, Kind, ResourceDiff, group_by_kind};
use similar::{ChangeTag, TextDiff};

/// Section title for a kind
pub fn kind_title(kind: Kind) -> &'static str {
    match kind {
        Kind::Network => "Network",
        Kind::Cluster => "Cluster",
        Kind::Provider => "Providers",
        Kind::Namespace => "Namespaces",
        Kind::HelmRelease => "Helm releases",
        Kind::CustomResource => "Custom resources",
        Kind::NetworkPolicy => "Network policies",
    }
}

/// Line-level diff of two declarations' parameters as pretty JSON
///
/// Only inserted and deleted lines are returned.
pub fn param_changes(before: &Declaration, after: &Declaration) -> Vec<(ChangeTag, String)> {
    let render = |d: &Declaration| serde_json::to_string_pretty(&d.params).unwrap_or_default();
    let (old, new) = (render(before), render(after));

    TextDiff::from_lines(&old, &new)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal)
        .map(|change| (change.tag(), change.value().trim_end().to_string()))
        .collect()
}

/// Display a list of diffs in a user-friendly format
///
/// With `detailed`, modified declarations also show their parameter diff.
pub fn display_diff(diffs: &[ResourceDiff], detailed: bool) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Declaration Diff".bold()
    );
    println!("│");

    for (kind, kind_diffs) in group_by_kind(diffs) {
        println!("│ {}", kind_title(kind).bold());

        for diff in kind_diffs {
            let (symbol, detail) = match &diff.change {
                Change::Added => ("+".green(), "(new)".to_string()),
                Change::Removed => ("-".red(), "(removed)".to_string()),
                Change::Modified { fields } => ("~".yellow(), fields.join(", ")),
            };
            println!("│   {} {:<40} {}", symbol, diff.id.name, detail.dimmed());

            if detailed
                && let (Some(before), Some(after)) = (&diff.before, &diff.after)
            {
                for (tag, line) in param_changes(before, after) {
                    match tag {
                        ChangeTag::Delete => println!("│       {}", format!("- {line}").red()),
                        ChangeTag::Insert => println!("│       {}", format!("+ {line}").green()),
                        ChangeTag::Equal => {}
                    }
                }
            }
        }
        println!("│");
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} added, {} modified, {} removed)",
        summary.total().to_string().bold(),
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}
