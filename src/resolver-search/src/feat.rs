use regex::Regex;

const PARENTHESIZED: &str = r"^(.*?)\(feat\..*?\).*?$";
const TRAILING: &str = r"^(.*?)feat\..*?$";

/// One normalization step: when `pattern` matches, the value shrinks to its
/// first capture group.
#[derive(Debug, Clone)]
struct StripRule {
    name: &'static str,
    pattern: Regex,
}

impl StripRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("built-in feat pattern must compile"),
        }
    }

    fn apply<'a>(&self, value: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(value)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Removes "featuring" credits from artist and title strings.
///
/// Rules run in order and each sees the output of the previous one, so
/// `"A feat. B (feat. C)"` first loses the parenthesized credit and then the
/// bare one. The order must not change.
#[derive(Debug, Clone)]
pub struct FeatureStripper {
    rules: Vec<StripRule>,
}

impl FeatureStripper {
    pub fn new() -> Self {
        Self {
            rules: vec![
                StripRule::new("parenthesized", PARENTHESIZED),
                StripRule::new("trailing", TRAILING),
            ],
        }
    }

    pub fn strip(&self, value: &str) -> String {
        let mut current = value;
        for rule in &self.rules {
            if let Some(prefix) = rule.apply(current) {
                tracing::trace!(rule = rule.name, before = current, after = prefix, "feat stripped");
                current = prefix;
            }
        }
        current.to_string()
    }
}

impl Default for FeatureStripper {
    fn default() -> Self {
        Self::new()
    }
}
