//! # Filter Unit Tests / 过滤器单元测试
//!
//! Tests for criteria construction, the status/category predicate and the
//! ordered selection rules, including the environment Not Applicable rules.
//!
//! 测试过滤条件构建、状态/类别谓词以及有序的选择规则，包括环境"不适用"规则。

mod common;

use common::*;
use glados::core::config::EnvironmentSettings;
use glados::core::filter::{EnvironmentRule, FilterCriteria, FilterInput, matches_filters, select_tests};
use glados::core::models::{TestCase, TestStatus};
use std::collections::HashSet;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod criteria_tests {
    use super::*;

    #[test]
    fn test_empty_lists_accept_everything_and_exclude_nothing() {
        let criteria = criteria("stg1");
        assert_eq!(criteria.accepted_statuses.len(), 6);
        assert_eq!(criteria.accepted_categories.len(), 4);
        assert!(criteria.excluded_categories.is_empty());
        assert_eq!(criteria.staging_only_category, Some(STAGING_ONLY_ID));
        assert_eq!(criteria.release_only_category, Some(RELEASE_ONLY_ID));
    }

    #[test]
    fn test_names_are_matched_after_sanitizing() {
        let criteria = criteria_from(FilterInput {
            statuses: strings(&["Passed", "failed"]),
            categories: strings(&["staging test only"]),
            excluded_categories: strings(&["SMOKE"]),
            environment: "stg1".to_string(),
            ..FilterInput::default()
        });
        assert_eq!(criteria.accepted_statuses, HashSet::from([1, 5]));
        assert_eq!(criteria.accepted_categories, HashSet::from([STAGING_ONLY_ID]));
        assert_eq!(criteria.excluded_categories, HashSet::from([SMOKE_ID]));
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let criteria = criteria_from(FilterInput {
            statuses: strings(&["4"]),
            ..FilterInput::default()
        });
        assert_eq!(criteria.accepted_statuses, HashSet::from([4]));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let input = FilterInput {
            categories: strings(&["nightly"]),
            ..FilterInput::default()
        };
        let err = FilterCriteria::from_input(&input, &statuses(), &categories(), &EnvironmentSettings::default())
            .unwrap_err();
        assert!(err.to_string().contains("Unknown test category 'nightly'"));
    }

    #[test]
    fn test_missing_environment_categories_disable_the_rules() {
        let plain: Vec<_> = categories()
            .into_iter()
            .filter(|c| c.id != STAGING_ONLY_ID && c.id != RELEASE_ONLY_ID)
            .collect();
        let criteria = FilterCriteria::from_input(
            &FilterInput::default(),
            &statuses(),
            &plain,
            &EnvironmentSettings::default(),
        )
        .unwrap();
        assert_eq!(criteria.staging_only_category, None);
        assert_eq!(criteria.release_only_category, None);
    }
}

#[cfg(test)]
mod matches_filters_tests {
    use super::*;

    #[test]
    fn test_status_outside_accepted_set_is_rejected() {
        let criteria = criteria_from(FilterInput {
            statuses: strings(&["passed", "failed"]),
            ..FilterInput::default()
        });
        let mut case = automated_case(1);
        case.status_id = TestStatus::NotApplicable.id();
        assert!(!matches_filters(&case, &criteria));

        case.status_id = TestStatus::Failed.id();
        assert!(matches_filters(&case, &criteria));
    }

    #[test]
    fn test_exclusion_wins_over_acceptance() {
        let criteria = criteria_from(FilterInput {
            categories: strings(&["regression"]),
            excluded_categories: strings(&["smoke"]),
            ..FilterInput::default()
        });
        let mut case = automated_case(1);
        case.custom_test_category = vec![REGRESSION_ID, SMOKE_ID];
        assert!(!matches_filters(&case, &criteria));
    }

    #[test]
    fn test_case_without_categories_never_matches() {
        let criteria = criteria("stg1");
        let mut case = automated_case(1);
        case.custom_test_category.clear();
        assert!(!matches_filters(&case, &criteria));
    }
}

#[cfg(test)]
mod select_tests_tests {
    use super::*;

    fn select(cases: Vec<TestCase>, criteria: &FilterCriteria) -> glados::core::filter::Selection {
        select_tests(cases, criteria, &HashSet::new())
    }

    #[test]
    fn test_manual_case_requires_developer_mode() {
        let mut manual = automated_case(1);
        manual.type_id = 7;

        let selection = select(vec![manual.clone()], &criteria("stg1"));
        assert!(selection.group.is_empty());
        assert_eq!(selection.rejected.not_automated, 1);

        let dev = criteria_from(FilterInput {
            environment: "stg1".to_string(),
            developer_mode: true,
            ..FilterInput::default()
        });
        let selection = select(vec![manual], &dev);
        assert_eq!(selection.group.len(), 1);
    }

    #[test]
    fn test_blank_automation_name_is_never_dispatched() {
        let mut case = automated_case(1);
        case.custom_automation_test_name = Some("   ".to_string());
        let dev = criteria_from(FilterInput {
            developer_mode: true,
            ..FilterInput::default()
        });
        let selection = select(vec![case], &dev);
        assert!(selection.group.is_empty());
        assert_eq!(selection.rejected.not_automated, 1);
    }

    #[test]
    fn test_manually_finalized_tests_are_skipped_in_automation_only_mode() {
        let criteria = criteria_from(FilterInput {
            environment: "stg1".to_string(),
            automation_only: true,
            ..FilterInput::default()
        });
        let manual_final = HashSet::from([2]);
        let selection = select_tests(vec![automated_case(1), automated_case(2)], &criteria, &manual_final);

        assert_eq!(selection.group.len(), 1);
        assert_eq!(selection.group.ungrouped[0].id, 1);
        assert_eq!(selection.rejected.manually_finalized, 1);
    }

    #[test]
    fn test_manual_results_are_ignored_without_automation_only() {
        let manual_final = HashSet::from([2]);
        let selection = select_tests(vec![automated_case(1), automated_case(2)], &criteria("stg1"), &manual_final);
        assert_eq!(selection.group.len(), 2);
    }

    #[test]
    fn test_staging_only_case_on_production_is_not_applicable() {
        let mut case = automated_case(1);
        case.custom_test_category = vec![REGRESSION_ID, STAGING_ONLY_ID];

        let selection = select(vec![case], &criteria("prd"));

        assert!(selection.group.is_empty());
        assert_eq!(selection.not_applicable.len(), 1);
        let mismatch = &selection.not_applicable[0];
        assert_eq!(mismatch.rule, EnvironmentRule::StagingOnly);
        assert_eq!(mismatch.status(), TestStatus::NotApplicable);
        assert_eq!(
            mismatch.comment("prd"),
            "This is a staging only test, but someone tried to run it on prd."
        );
    }

    #[test]
    fn test_release_only_case_on_staging_is_not_applicable() {
        let mut case = automated_case(1);
        case.custom_test_category = vec![RELEASE_ONLY_ID];

        let selection = select(vec![case], &criteria("stg3"));

        assert_eq!(selection.not_applicable.len(), 1);
        assert_eq!(selection.not_applicable[0].rule, EnvironmentRule::ReleaseOnly);
        assert_eq!(
            selection.not_applicable[0].comment("stg3"),
            "This is a release (prod) only test, but someone tried to run it on stg3."
        );
    }

    #[test]
    fn test_environment_rules_pass_on_allowed_environments() {
        let mut staging = automated_case(1);
        staging.custom_test_category = vec![STAGING_ONLY_ID];
        let mut release = automated_case(2);
        release.custom_test_category = vec![RELEASE_ONLY_ID];

        let on_qa = select(vec![staging], &criteria("qa1"));
        assert_eq!(on_qa.group.len(), 1);

        let on_www = select(vec![release], &criteria("www"));
        assert_eq!(on_www.group.len(), 1);
    }

    #[test]
    fn test_developer_mode_does_not_bypass_environment_rules() {
        let mut case = automated_case(1);
        case.custom_test_category = vec![STAGING_ONLY_ID];
        let dev = criteria_from(FilterInput {
            environment: "prd".to_string(),
            developer_mode: true,
            ..FilterInput::default()
        });
        let selection = select(vec![case], &dev);
        assert_eq!(selection.not_applicable.len(), 1);
    }

    #[test]
    fn test_grouping_preserves_fetch_order() {
        let mut a = automated_case(1);
        a.custom_automation_sub_suite_name = Some("Checkout".to_string());
        let b = automated_case(2);
        let mut c = automated_case(3);
        c.custom_automation_sub_suite_name = Some("Search".to_string());
        let mut d = automated_case(4);
        d.custom_automation_sub_suite_name = Some("Checkout".to_string());

        let selection = select(vec![a, b, c, d], &criteria("stg1"));

        assert_eq!(selection.group.ungrouped.iter().map(|c| c.id).collect::<Vec<_>>(), vec![2]);
        let keys: Vec<&str> = selection.group.groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Checkout", "Search"]);
        let checkout: Vec<u64> = selection.group.groups["Checkout"].iter().map(|c| c.id).collect();
        assert_eq!(checkout, vec![1, 4]);
        assert_eq!(selection.group.command_count(), 3);
    }
}
