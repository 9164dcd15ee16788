use crate::base::SentinelRule;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Strategy decides how `limit_app` is interpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorityStrategy {
    /// White: only callers named in `limit_app` are admitted.
    White,
    /// Black: callers named in `limit_app` are rejected, everyone else passes.
    Black,
}

impl Default for AuthorityStrategy {
    fn default() -> Self {
        Self::White
    }
}

/// Rule describes an authority (origin whitelist/blacklist) check for a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub id: String,
    pub resource: String,
    pub strategy: AuthorityStrategy,
    /// the set of caller origins this rule names
    pub limit_app: Vec<String>,
}

impl Default for Rule {
    fn default() -> Self {
        Rule {
            #[cfg(target_arch = "wasm32")]
            id: String::new(),
            #[cfg(not(target_arch = "wasm32"))]
            id: uuid::Uuid::new_v4().to_string(),
            resource: String::default(),
            strategy: AuthorityStrategy::default(),
            limit_app: Vec::new(),
        }
    }
}

impl Rule {
    /// `is_allowed` reports whether `origin` may pass, per this rule's strategy.
    pub fn is_allowed(&self, origin: &str) -> bool {
        let listed = self.limit_app.iter().any(|app| app == origin);
        match self.strategy {
            AuthorityStrategy::White => listed,
            AuthorityStrategy::Black => !listed,
        }
    }
}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.resource.hash(state);
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
            && self.strategy == other.strategy
            && self.limit_app == other.limit_app
    }
}

impl Eq for Rule {}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuthorityRule{{id={}, resource={}, strategy={:?}, limit_app={:?}}}",
            self.id, self.resource, self.strategy, self.limit_app
        )
    }
}

impl SentinelRule for Rule {
    fn resource_name(&self) -> String {
        self.resource.clone()
    }

    fn is_valid(&self) -> Result<()> {
        if self.resource.is_empty() {
            return Err(crate::Error::msg("empty resource name"));
        }
        if self.limit_app.is_empty() {
            return Err(crate::Error::msg("empty limit_app"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn white_list() {
        let rule = Rule {
            resource: "abc".into(),
            strategy: AuthorityStrategy::White,
            limit_app: vec!["appA".into()],
            ..Default::default()
        };
        assert!(rule.is_allowed("appA"));
        assert!(!rule.is_allowed("appB"));
    }

    #[test]
    fn black_list() {
        let rule = Rule {
            resource: "abc".into(),
            strategy: AuthorityStrategy::Black,
            limit_app: vec!["appA".into()],
            ..Default::default()
        };
        assert!(!rule.is_allowed("appA"));
        assert!(rule.is_allowed("appB"));
    }

    #[test]
    fn invalid_empty_resource() {
        let rule = Rule {
            limit_app: vec!["appA".into()],
            ..Default::default()
        };
        assert!(rule.is_valid().is_err());
    }

    #[test]
    fn invalid_empty_limit_app() {
        let rule = Rule {
            resource: "abc".into(),
            ..Default::default()
        };
        assert!(rule.is_valid().is_err());
    }
}
