// Cluster test results as returned by `runTests`

use serde::{Deserialize, Deserializer, Serialize};

/// Declaration order is severity order, so `max` is the worst status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    Pass,
    Warning,
    Fail,
}

impl TestStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pass" => Some(TestStatus::Pass),
            "warning" => Some(TestStatus::Warning),
            "fail" => Some(TestStatus::Fail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    #[serde(default)]
    pub test_name: String,
    #[serde(default, deserialize_with = "status_from_str")]
    pub test_status: Option<TestStatus>,
    #[serde(default)]
    pub test_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCategory {
    #[serde(default)]
    pub category_name: String,
    /// `None` when the server skipped the category.
    #[serde(default, deserialize_with = "status_from_str")]
    pub category_status: Option<TestStatus>,
    #[serde(default)]
    pub category_active: bool,
    #[serde(default)]
    pub tests: Vec<TestOutcome>,
}

impl TestCategory {
    pub fn is_skipped(&self) -> bool {
        self.category_status.is_none()
    }
}

/// Worst status across categories. Skipped categories do not count.
pub fn overall_status(categories: &[TestCategory]) -> Option<TestStatus> {
    categories.iter().filter_map(|c| c.category_status).max()
}

fn status_from_str<'de, D>(deserializer: D) -> Result<Option<TestStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(TestStatus::parse))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(status: Option<TestStatus>) -> TestCategory {
        TestCategory {
            category_name: "Hadoop File System".into(),
            category_status: status,
            category_active: true,
            tests: Vec::new(),
        }
    }

    #[test]
    fn overall_is_the_worst_status() {
        use TestStatus::*;
        let cases = [
            (vec![Pass, Warning, Pass], Warning),
            (vec![Pass, Fail, Warning], Fail),
            (vec![Pass, Pass], Pass),
        ];
        for (statuses, expected) in cases {
            let cats: Vec<_> = statuses.iter().map(|s| cat(Some(*s))).collect();
            assert_eq!(
                overall_status(&cats),
                Some(expected),
                "Overall of {:?} should be {:?}",
                statuses,
                expected
            );
        }
    }

    #[test]
    fn skipped_categories_are_ignored() {
        let cats = vec![cat(None), cat(Some(TestStatus::Pass))];
        assert_eq!(overall_status(&cats), Some(TestStatus::Pass));
        assert_eq!(overall_status(&[cat(None)]), None);
        assert_eq!(overall_status(&[]), None);
    }

    #[test]
    fn deserializes_server_payload() {
        let body = r#"[
            {"categoryName":"Hadoop File System","categoryStatus":"Pass","categoryActive":true,
             "tests":[{"testName":"Ping","testStatus":"Pass","testActive":true}]},
            {"categoryName":"Oozie","categoryStatus":"","categoryActive":false,"tests":[]},
            {"categoryName":"Kafka","categoryStatus":"Fail","categoryActive":true}
        ]"#;

        let cats: Vec<TestCategory> = serde_json::from_str(body).expect("valid payload");

        assert_eq!(cats.len(), 3);
        assert_eq!(cats[0].tests[0].test_status, Some(TestStatus::Pass));
        assert!(cats[1].is_skipped());
        assert!(cats[2].tests.is_empty());
        assert_eq!(overall_status(&cats), Some(TestStatus::Fail));
    }
}
