use super::*;
use crate::{base::SentinelRule, logging, utils};
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

pub type RuleMap = HashMap<String, HashSet<Arc<Rule>>>;

lazy_static! {
    static ref RULE_MAP: RwLock<RuleMap> = RwLock::new(RuleMap::new());
    static ref CURRENT_RULES: Mutex<RuleMap> = Mutex::new(RuleMap::new());
}

/// `get_rules_of_resource` returns the given resource's rules.
// This func acquires a read lock on global `RULE_MAP`,
// please release the lock before calling this func
pub fn get_rules_of_resource(res: &str) -> Vec<Arc<Rule>> {
    let rule_map = RULE_MAP.read().unwrap();
    let placeholder = HashSet::new();
    rule_map
        .get(res)
        .unwrap_or(&placeholder)
        .iter()
        .cloned()
        .collect()
}

/// `get_rules` returns all the rules in the global `RULE_MAP`.
pub fn get_rules() -> Vec<Arc<Rule>> {
    let rule_map = RULE_MAP.read().unwrap();
    let mut rules = Vec::new();
    for rs in rule_map.values() {
        rules.extend(rs.iter().cloned());
    }
    rules
}

/// `load_rules` replaces all authority rules with the given set.
// This func acquires the locks on global `CURRENT_RULES` and `RULE_MAP`,
// please release the locks before calling this func
pub fn load_rules(rules: Vec<Arc<Rule>>) -> bool {
    let rule_map = build_rule_map(rules);

    let mut current_rules = CURRENT_RULES.lock().unwrap();
    if *current_rules == rule_map {
        logging::info!(
            "[Authority] Load rules is the same with current rules, so ignore load operation."
        );
        return false;
    }

    let start = utils::curr_time_nanos();
    *RULE_MAP.write().unwrap() = rule_map.clone();
    *current_rules = rule_map;
    logging::debug!(
        "[Authority load_rules] Time statistic(ns) for updating authority rule, timeCost {}",
        utils::curr_time_nanos() - start
    );
    true
}

/// `clear_rules` clears all the previous rules.
pub fn clear_rules() {
    CURRENT_RULES.lock().unwrap().clear();
    RULE_MAP.write().unwrap().clear();
}

fn build_rule_map(rules: Vec<Arc<Rule>>) -> RuleMap {
    let mut m = RuleMap::new();
    for rule in rules {
        if let Err(err) = rule.is_valid() {
            logging::warn!(
                "[Authority build_rule_map] Ignoring invalid rule {:?}, reason: {:?}",
                rule,
                err
            );
            continue;
        }
        m.entry(rule.resource.clone()).or_default().insert(rule);
    }
    m
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_rules() {
        clear_rules();
        assert_eq!(0, get_rules().len());
    }

    #[test]
    fn load_and_query() {
        clear_rules();
        let rule = Arc::new(Rule {
            resource: "abc".into(),
            strategy: AuthorityStrategy::White,
            limit_app: vec!["appA".into()],
            ..Default::default()
        });
        assert!(load_rules(vec![Arc::clone(&rule)]));
        assert_eq!(1, get_rules_of_resource("abc").len());
        assert_eq!(0, get_rules_of_resource("def").len());
        assert!(!load_rules(vec![rule]));
        clear_rules();
        assert_eq!(0, get_rules().len());
    }

    #[test]
    fn invalid_rule_dropped() {
        clear_rules();
        let rule = Arc::new(Rule {
            resource: "abc".into(),
            limit_app: Vec::new(),
            ..Default::default()
        });
        load_rules(vec![rule]);
        assert_eq!(0, get_rules_of_resource("abc").len());
    }
}
