use similar::{capture_diff_slices, Algorithm, DiffTag};

use crate::diff::engine::{Diff, Diffable};

pub trait RenderToml {
    fn to_toml(&self) -> String;
}

impl<T: Diffable + RenderToml> Diff<T> {
    pub fn render(
        &self,
        header_to_add: &str,
        header_to_remove: &str,
        header_to_change: &str,
    ) -> String {
        let mut out = String::new();

        if !self.to_add.is_empty() {
            out.push_str(header_to_add);
            out.push('\n');
            for entry in &self.to_add {
                out.push('\n');
                push_indented(&mut out, &entry.to_toml());
            }
            out.push('\n');
        }

        if !self.to_remove.is_empty() {
            out.push_str(header_to_remove);
            out.push('\n');
            for entry in &self.to_remove {
                out.push('\n');
                push_indented(&mut out, &entry.to_toml());
            }
            out.push('\n');
        }

        if !self.to_change.is_empty() {
            out.push_str(header_to_change);
            out.push('\n');
            for change in &self.to_change {
                out.push('\n');
                out.push_str(&render_simple_diff(
                    &change.actual.to_toml(),
                    &change.target.to_toml(),
                ));
            }
            out.push('\n');
        }

        out
    }
}

pub fn push_indented(out: &mut String, text: &str) {
    for line in text.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}

// Line-based diff of the two renderings, without abbreviating large chunks of
// identical lines like a standard unified diff would do. For replaced runs all
// removed lines come before all inserted lines.
pub fn render_simple_diff(actual: &str, target: &str) -> String {
    let actual_lines: Vec<&str> = actual.lines().collect();
    let target_lines: Vec<&str> = target.lines().collect();

    let mut out = String::new();
    for op in capture_diff_slices(Algorithm::Myers, &actual_lines, &target_lines) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for line in &actual_lines[old_range] {
                    push_prefixed(&mut out, "  ", line);
                }
            }
            DiffTag::Delete => {
                for line in &actual_lines[old_range] {
                    push_prefixed(&mut out, "- ", line);
                }
            }
            DiffTag::Insert => {
                for line in &target_lines[new_range] {
                    push_prefixed(&mut out, "+ ", line);
                }
            }
            DiffTag::Replace => {
                for line in &actual_lines[old_range] {
                    push_prefixed(&mut out, "- ", line);
                }
                for line in &target_lines[new_range] {
                    push_prefixed(&mut out, "+ ", line);
                }
            }
        }
    }
    out
}

fn push_prefixed(out: &mut String, prefix: &str, line: &str) {
    out.push_str(prefix);
    out.push_str(line);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::diff::engine::Diff;
    use crate::diff::render::render_simple_diff;
    use crate::model::github::{OrganizationMember, OrganizationRole};

    fn member(user_id: u64, user_name: &str, role: OrganizationRole) -> OrganizationMember {
        OrganizationMember {
            user_id,
            user_name: user_name.to_string(),
            role,
        }
    }

    #[test]
    fn identical_inputs_render_as_all_equal_lines() {
        let text = "a\nb\nc";
        let rendered = render_simple_diff(text, text);
        assert_eq!(rendered, "  a\n  b\n  c\n");
    }

    #[test]
    fn inserted_and_deleted_lines_get_their_prefixes() {
        let rendered = render_simple_diff("a\nb\nc", "a\nc\nd");
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines.contains(&"- b"));
        assert!(lines.contains(&"+ d"));
        assert!(lines.contains(&"  a"));
        assert!(lines.contains(&"  c"));
    }

    #[test]
    fn replaced_runs_print_removals_before_insertions() {
        let rendered = render_simple_diff("keep\nold one\nold two\nkeep2", "keep\nnew one\nkeep2");
        let lines: Vec<&str> = rendered.lines().collect();
        let first_minus = lines.iter().position(|l| l.starts_with("- ")).unwrap();
        let last_minus = lines.iter().rposition(|l| l.starts_with("- ")).unwrap();
        let first_plus = lines.iter().position(|l| l.starts_with("+ ")).unwrap();
        assert!(last_minus < first_plus, "removals must precede insertions");
        assert_eq!(lines[first_minus], "- old one");
    }

    #[test]
    fn long_equal_runs_are_never_abbreviated() {
        let common: Vec<String> = (0..100).map(|i| format!("line {i}")).collect();
        let actual = common.join("\n");
        let target = format!("{}\nextra", actual);

        let rendered = render_simple_diff(&actual, &target);
        let equal_count = rendered.lines().filter(|l| l.starts_with("  ")).count();
        assert_eq!(equal_count, 100);
        assert!(rendered.lines().any(|l| l == "+ extra"));
    }

    #[test]
    fn stripped_prefixes_reconstruct_both_sides() {
        let actual = "alpha\nbeta\ngamma\ndelta";
        let target = "alpha\nbeta2\ngamma\nepsilon\ndelta";
        let rendered = render_simple_diff(actual, target);

        let from_actual: Vec<&str> = rendered
            .lines()
            .filter(|l| l.starts_with("  ") || l.starts_with("- "))
            .map(|l| &l[2..])
            .collect();
        assert_eq!(from_actual.join("\n"), actual);

        let from_target: Vec<&str> = rendered
            .lines()
            .filter(|l| l.starts_with("  ") || l.starts_with("+ "))
            .map(|l| &l[2..])
            .collect();
        assert_eq!(from_target.join("\n"), target);
    }

    #[test]
    fn empty_diff_renders_nothing() {
        let entities: BTreeSet<_> = [member(1, "alice", OrganizationRole::Member)]
            .into_iter()
            .collect();
        let diff = Diff::between(&entities, &entities);
        assert_eq!(diff.render("add", "remove", "change"), "");
    }

    #[test]
    fn sections_print_header_then_indented_entries() {
        let target: BTreeSet<_> = [member(1, "alice", OrganizationRole::Member)]
            .into_iter()
            .collect();
        let actual = BTreeSet::new();

        let diff = Diff::between(&target, &actual);
        let rendered = diff.render("To add:", "To remove:", "To change:");
        assert_eq!(
            rendered,
            "To add:\n\
             \n\
             \x20 [[member]]\n\
             \x20 github_user_id = 1\n\
             \x20 github_user_name = \"alice\"\n\
             \x20 role = \"member\"\n\
             \n"
        );
        assert!(!rendered.contains("To remove:"));
        assert!(!rendered.contains("To change:"));
    }

    #[test]
    fn change_section_renders_a_line_diff() {
        let target: BTreeSet<_> = [member(1, "alice", OrganizationRole::Admin)]
            .into_iter()
            .collect();
        let actual: BTreeSet<_> = [member(1, "alice", OrganizationRole::Member)]
            .into_iter()
            .collect();

        let diff = Diff::between(&target, &actual);
        let rendered = diff.render("To add:", "To remove:", "To change:");
        assert!(rendered.starts_with("To change:\n"));
        assert!(rendered.contains("  [[member]]\n"));
        assert!(rendered.contains("- role = \"member\"\n"));
        assert!(rendered.contains("+ role = \"admin\"\n"));
    }
}
