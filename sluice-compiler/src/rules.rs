//! Rule evaluation
//!
//! Decides whether a container applies to the current build. Evaluation is
//! pure and infallible: a pattern that cannot be compiled simply does not
//! match.

use globset::GlobBuilder;
use regex::Regex;
use sluice_core::pipeline::{Matcher, Operator, RuleData, Rules, Ruleset};

/// Evaluate `ruleset` against build metadata
///
/// An empty ruleset always matches. A matching `unless` side vetoes the
/// container regardless of the `if` side.
pub fn matches(ruleset: &Ruleset, data: &RuleData) -> bool {
    if ruleset.is_empty() {
        return true;
    }

    if !ruleset.unless.is_empty()
        && side_matches(&ruleset.unless, data, ruleset.matcher, ruleset.operator)
    {
        return false;
    }

    ruleset.allow.is_empty()
        || side_matches(&ruleset.allow, data, ruleset.matcher, ruleset.operator)
}

/// Combine the non-empty categories of one side with `operator`
fn side_matches(rules: &Rules, data: &RuleData, matcher: Matcher, operator: Operator) -> bool {
    let categories: [(&[String], Vec<&str>); 10] = [
        (rules.branch.as_slice(), vec![data.branch.as_str()]),
        (rules.comment.as_slice(), vec![data.comment.as_str()]),
        (rules.event.as_slice(), vec![data.event.as_str()]),
        (rules.path.as_slice(), data.path.iter().map(String::as_str).collect()),
        (rules.repo.as_slice(), vec![data.repo.as_str()]),
        (rules.status.as_slice(), vec![data.status.as_str()]),
        (rules.tag.as_slice(), vec![data.tag.as_str()]),
        (rules.target.as_slice(), vec![data.target.as_str()]),
        (rules.label.as_slice(), data.label.iter().map(String::as_str).collect()),
        (rules.instance.as_slice(), vec![data.instance.as_str()]),
    ];

    let mut results = categories
        .iter()
        .filter(|(patterns, _)| !patterns.is_empty())
        .map(|(patterns, values)| category_matches(patterns, values, matcher));

    match operator {
        Operator::And => results.all(|matched| matched),
        Operator::Or => results.any(|matched| matched),
    }
}

/// Any pattern matching any value satisfies the category
fn category_matches(patterns: &[String], values: &[&str], matcher: Matcher) -> bool {
    patterns.iter().any(|pattern| {
        values
            .iter()
            .any(|value| pattern_matches(pattern, value, matcher))
    })
}

fn pattern_matches(pattern: &str, value: &str, matcher: Matcher) -> bool {
    match matcher {
        Matcher::Filepath => match GlobBuilder::new(pattern).literal_separator(true).build() {
            Ok(glob) => glob.compile_matcher().is_match(value),
            Err(e) => {
                tracing::debug!("Ignoring invalid glob pattern {:?}: {}", pattern, e);
                false
            }
        },
        Matcher::Regexp => match Regex::new(pattern) {
            Ok(re) => re.is_match(value),
            Err(e) => {
                tracing::debug!("Ignoring invalid regexp pattern {:?}: {}", pattern, e);
                false
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ruleset(yaml: &str) -> Ruleset {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn data(branch: &str, event: &str) -> RuleData {
        RuleData {
            branch: branch.to_string(),
            event: event.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_ruleset_matches() {
        assert!(matches(&Ruleset::default(), &RuleData::default()));
    }

    #[test]
    fn test_branch_filter() {
        let main_only = ruleset("if:\n  branch: [main]\n");
        let dev_only = ruleset("if:\n  branch: [dev]\n");
        let build = data("main", "push");

        assert!(matches(&main_only, &build));
        assert!(!matches(&dev_only, &build));
    }

    #[test]
    fn test_patterns_within_category_are_or() {
        let rules = ruleset("branch: [dev, main]\n");
        assert!(matches(&rules, &data("main", "push")));
    }

    #[test]
    fn test_categories_are_and_by_default() {
        let rules = ruleset("branch: main\nevent: tag\n");

        assert!(!matches(&rules, &data("main", "push")));
        assert!(matches(&rules, &data("main", "tag")));
    }

    #[test]
    fn test_or_operator() {
        let rules = ruleset("if:\n  branch: main\n  event: tag\noperator: or\n");
        assert!(matches(&rules, &data("main", "push")));
        assert!(!matches(&rules, &data("dev", "push")));
    }

    #[test]
    fn test_unless_vetoes_allow() {
        let rules = ruleset("if:\n  branch: main\nunless:\n  event: pull_request\n");

        assert!(matches(&rules, &data("main", "push")));
        assert!(!matches(&rules, &data("main", "pull_request")));
    }

    #[test]
    fn test_unless_only() {
        let rules = ruleset("unless:\n  branch: main\n");

        assert!(!matches(&rules, &data("main", "push")));
        assert!(matches(&rules, &data("dev", "push")));
    }

    #[test]
    fn test_glob_does_not_cross_separator() {
        let rules = ruleset("branch: \"release/*\"\n");

        assert!(matches(&rules, &data("release/1.0", "push")));
        assert!(!matches(&rules, &data("release/1.0/hotfix", "push")));
        assert!(!matches(&rules, &data("main", "push")));
    }

    #[test]
    fn test_path_matches_any_changed_file() {
        let rules = ruleset("path: [\"docs/*.md\"]\n");
        let mut build = data("main", "push");
        build.path = vec!["src/main.rs".to_string(), "docs/index.md".to_string()];

        assert!(matches(&rules, &build));

        build.path = vec!["src/main.rs".to_string()];
        assert!(!matches(&rules, &build));
    }

    #[test]
    fn test_regexp_matcher() {
        let rules = ruleset("if:\n  tag: \"^v[0-9]+\\\\.[0-9]+$\"\nmatcher: regexp\n");
        let mut build = data("main", "tag");

        build.tag = "v1.2".to_string();
        assert!(matches(&rules, &build));

        build.tag = "v1.2-rc1".to_string();
        assert!(!matches(&rules, &build));
    }

    #[test]
    fn test_invalid_patterns_do_not_match() {
        let glob = ruleset("branch: \"[main\"\n");
        assert!(!matches(&glob, &data("[main", "push")));

        let regexp = ruleset("if:\n  branch: \"(main\"\nmatcher: regexp\n");
        assert!(!matches(&regexp, &data("main", "push")));
    }
}
