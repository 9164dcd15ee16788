//! The direct calculator and reject checker: the simplest traffic shaping
//! pairing, admitting requests up to a fixed threshold and rejecting the
//! rest outright.

use super::super::Grade;
use super::{Calculator, Checker, Controller, Rule};
use crate::core::base::{BlockType, ConcurrencyStat, MetricEvent, StatNode, TokenResult};
use std::sync::{Arc, Weak};

/// DirectCalculator always returns the rule's configured threshold, with no
/// warm-up ramp or memory-adaptive scaling.
#[derive(Debug)]
pub struct DirectCalculator {
    owner: Weak<Controller>,
    threshold: f64,
}

impl DirectCalculator {
    pub fn new(owner: Weak<Controller>, rule: Arc<Rule>) -> Self {
        DirectCalculator {
            owner,
            threshold: rule.threshold,
        }
    }
}

impl Calculator for DirectCalculator {
    fn get_owner(&self) -> &Weak<Controller> {
        &self.owner
    }

    fn set_owner(&mut self, owner: Weak<Controller>) {
        self.owner = owner;
    }

    fn calculate_allowed_threshold(&self, _batch_count: u32, _flag: i32) -> f64 {
        self.threshold
    }
}

/// RejectChecker blocks a request outright once the window's pass count
/// would exceed the calculated threshold.
#[derive(Debug)]
pub struct RejectChecker {
    owner: Weak<Controller>,
    rule: Arc<Rule>,
}

impl RejectChecker {
    pub fn new(owner: Weak<Controller>, rule: Arc<Rule>) -> Self {
        RejectChecker { owner, rule }
    }
}

impl Checker for RejectChecker {
    fn get_owner(&self) -> &Weak<Controller> {
        &self.owner
    }

    fn set_owner(&mut self, owner: Weak<Controller>) {
        self.owner = owner;
    }

    fn do_check(
        &self,
        stat_node: Option<Arc<dyn StatNode>>,
        batch_count: u32,
        threshold: f64,
    ) -> TokenResult {
        let cur_count = if self.rule.grade == Grade::Thread {
            stat_node
                .map(|n| n.current_concurrency() as f64)
                .unwrap_or(0.0)
        } else {
            let owner = self.owner.upgrade();
            match &owner {
                Some(owner) => owner.stat().read_only_metric().sum(MetricEvent::Pass) as f64,
                None => 0.0,
            }
        };
        if cur_count + batch_count as f64 > threshold {
            TokenResult::new_blocked_with_cause(
                BlockType::Flow,
                "flow reject check blocked".into(),
                self.rule.clone(),
                Arc::new(cur_count),
            )
        } else {
            TokenResult::new_pass()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn direct_calculator_returns_threshold() {
        let rule = Arc::new(Rule {
            threshold: 42.0,
            ..Default::default()
        });
        let dc = DirectCalculator::new(Weak::new(), rule);
        assert_eq!(dc.calculate_allowed_threshold(0, 0), 42.0);
    }

    #[test]
    fn reject_checker_passes_without_owner() {
        let rule = Arc::new(Rule {
            threshold: 10.0,
            ..Default::default()
        });
        let rc = RejectChecker::new(Weak::new(), rule);
        assert!(rc.do_check(None, 1, 10.0).is_pass());
    }

    #[test]
    fn reject_checker_thread_grade_reads_concurrency() {
        use crate::core::base::MockStatNode;

        let rule = Arc::new(Rule {
            threshold: 2.0,
            grade: Grade::Thread,
            ..Default::default()
        });
        let rc = RejectChecker::new(Weak::new(), rule.clone());

        let mut low = MockStatNode::new();
        low.expect_current_concurrency().return_const(1u32);
        assert!(rc.do_check(Some(Arc::new(low)), 1, 2.0).is_pass());

        let mut high = MockStatNode::new();
        high.expect_current_concurrency().return_const(2u32);
        assert!(rc.do_check(Some(Arc::new(high)), 1, 2.0).is_blocked());
    }
}
