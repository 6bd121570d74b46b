pub mod fixtures;

pub use fixtures::{
    FIXTURE_FORMAT_V1, FixtureCase, FixtureNode, FixtureStep, FixtureValue, HandlerPool,
    fixture_dir, load_corpus,
};

/// Nesting depth of a snapshot line (two spaces per level).
fn depth(line: &str) -> usize {
    (line.len() - line.trim_start_matches(' ').len()) / 2
}

/// Ancestor lines of `lines[index]`, outermost first, without indentation.
fn ancestors(lines: &[String], index: usize) -> Vec<&str> {
    let mut path = Vec::new();
    let Some(line) = lines.get(index) else {
        return path;
    };
    let mut level = depth(line);
    for line in lines[..index].iter().rev() {
        if level == 0 {
            break;
        }
        let d = depth(line);
        if d < level {
            path.push(line.trim_start());
            level = d;
        }
    }
    path.reverse();
    path
}

fn shown(line: Option<&String>) -> &str {
    line.map_or("<missing>", |l| l.trim_start())
}

/// Report on the first node where two output snapshots disagree.
///
/// Snapshots hold one node per line, indented by depth; the report names the
/// chain of ancestors above the differing node.
pub fn diff_snapshot_lines(expected: &[String], actual: &[String]) -> String {
    let Some(index) = (0..expected.len().max(actual.len()))
        .find(|&i| expected.get(i) != actual.get(i))
    else {
        return format!("snapshots are identical ({} lines)", expected.len());
    };

    let path = if index < expected.len() {
        ancestors(expected, index)
    } else {
        ancestors(actual, index)
    };
    let under = if path.is_empty() {
        "<top level>".to_string()
    } else {
        path.join(" > ")
    };
    format!(
        "first difference at line {}\n   under: {under}\nexpected: {}\n  actual: {}\nexpected {} lines, actual {} lines",
        index + 1,
        shown(expected.get(index)),
        shown(actual.get(index)),
        expected.len(),
        actual.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn names_the_ancestors_of_the_differing_node() {
        let expected = lines(&["<ul>", "  <li>", "    \"a\"", "  <li>", "    \"b\""]);
        let actual = lines(&["<ul>", "  <li>", "    \"a\"", "  <li>", "    \"x\""]);
        let report = diff_snapshot_lines(&expected, &actual);
        assert!(report.starts_with("first difference at line 5\n"));
        assert!(report.contains("   under: <ul> > <li>\n"));
        assert!(report.contains("expected: \"b\"\n  actual: \"x\""));
    }

    #[test]
    fn reports_missing_tail_and_line_counts() {
        let report = diff_snapshot_lines(&lines(&["<p>", "<div>"]), &lines(&["<p>"]));
        assert!(report.contains("under: <top level>"));
        assert!(report.contains("actual: <missing>"));
        assert!(report.ends_with("expected 2 lines, actual 1 lines"));
    }

    #[test]
    fn identical_snapshots_say_so() {
        let same = lines(&["<p>", "  \"hi\""]);
        assert_eq!(diff_snapshot_lines(&same, &same), "snapshots are identical (2 lines)");
    }
}
