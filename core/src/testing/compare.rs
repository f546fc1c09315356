use super::result::{ComparisonOutcome, LineDiff, LineText};

/// Trims the whole text, then splits it into lines (`\n` or `\r\n`).
/// Inner whitespace, including trailing spaces on inner lines, is kept.
pub fn normalize(text: &str) -> Vec<&str> {
    text.trim().lines().collect()
}

pub fn compare(expected: &str, actual: &str) -> ComparisonOutcome {
    let expected_lines = normalize(expected);
    let actual_lines = normalize(actual);

    if expected_lines == actual_lines {
        return ComparisonOutcome {
            passed: true,
            diffs: Vec::new(),
        };
    }
    ComparisonOutcome {
        passed: false,
        diffs: diff_lines(&expected_lines, &actual_lines),
    }
}

/// Every position where the two sides differ, 1-based, in order.
/// A side that has run out of lines is `LineText::Missing`.
pub fn diff_lines(expected: &[&str], actual: &[&str]) -> Vec<LineDiff> {
    let n = expected.len().max(actual.len());
    (0..n)
        .filter_map(|i| {
            let e = expected.get(i).copied();
            let a = actual.get(i).copied();
            (e != a).then(|| LineDiff {
                line_number: i + 1,
                expected: LineText::from_opt(e),
                actual: LineText::from_opt(a),
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn diff(line_number: usize, expected: LineText, actual: LineText) -> LineDiff {
        LineDiff {
            line_number,
            expected,
            actual,
        }
    }

    #[test]
    fn normalize_trims_outer_whitespace_only() {
        assert_eq!(normalize("  a\nb  \n\n"), ["a", "b"]);
        assert_eq!(normalize("a  \nb"), ["a  ", "b"]);
        assert_eq!(normalize("a\r\nb\r\n"), ["a", "b"]);
        assert_eq!(normalize("a\n\nb"), ["a", "", "b"]);
        assert!(normalize("").is_empty());
        assert!(normalize(" \n\t\n").is_empty());
    }

    #[test]
    fn outer_whitespace_does_not_change_verdict() {
        let base = "1 2\n3 4";
        for decorated in [
            "1 2\n3 4\n",
            "1 2\n3 4\n\n\n",
            "\n1 2\n3 4",
            "  1 2\n3 4  \t\n",
            "1 2\r\n3 4\r\n",
        ] {
            assert!(compare(base, decorated).passed, "{:?}", decorated);
            assert!(compare(decorated, base).passed, "{:?}", decorated);
        }
        assert!(!compare(base, "1 2\n3 5\n\n").passed);
    }

    #[test]
    fn inner_whitespace_matters() {
        let r = compare("1 2\n3", "1  2\n3");
        assert!(!r.passed);
        assert_eq!(r.diffs, [diff(1, "1 2".into(), "1  2".into())]);
    }

    #[test]
    fn passed_has_no_diffs() {
        let r = compare("7\n", "7");
        assert!(r.passed);
        assert!(r.diffs.is_empty());
    }

    #[test]
    fn actual_shorter_gives_missing_actual() {
        let r = compare("a\nb\nc", "a\nb");
        assert!(!r.passed);
        assert_eq!(r.diffs, [diff(3, "c".into(), LineText::Missing)]);
    }

    #[test]
    fn actual_longer_gives_missing_expected() {
        let r = compare("a", "a\nb\nc\n");
        assert_eq!(
            r.diffs,
            [
                diff(2, LineText::Missing, "b".into()),
                diff(3, LineText::Missing, "c".into()),
            ]
        );
    }

    #[test]
    fn all_divergences_are_listed() {
        let r = compare("1\n2\n3\n4", "1\nx\n3\ny");
        assert_eq!(
            r.diffs,
            [diff(2, "2".into(), "x".into()), diff(4, "4".into(), "y".into())]
        );
    }

    #[test]
    fn empty_actual() {
        let r = compare("3", "");
        assert_eq!(r.diffs, [diff(1, "3".into(), LineText::Missing)]);

        let r = compare("", "\n");
        assert!(r.passed);
    }
}
