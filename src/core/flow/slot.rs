use super::*;
use crate::{
    base::{BaseSlot, ContextPtr, RuleCheckSlot, StatNode, TokenResult},
    logging, stat, utils,
};
use lazy_static::lazy_static;
use std::sync::Arc;

const RULE_CHECK_SLOT_ORDER: u32 = 2000;

/// A RuleSlot for flow related metrics
pub struct Slot {}

lazy_static! {
    pub static ref DEFAULT_SLOT: Arc<Slot> = Arc::new(Slot {});
}

pub fn default_slot() -> Arc<Slot> {
    DEFAULT_SLOT.clone()
}

impl BaseSlot for Slot {
    fn order(&self) -> u32 {
        RULE_CHECK_SLOT_ORDER
    }
}

impl RuleCheckSlot for Slot {
    fn check(&self, ctx_ptr: &ContextPtr) -> TokenResult {
        cfg_if_async! {
            let mut ctx = ctx_ptr.write().unwrap(),
            let mut ctx = ctx_ptr.borrow_mut()
        };
        let res = ctx.resource().name();
        let stat_node = ctx.stat_node();
        let origin_node = ctx.origin_node();
        let origin = ctx.origin().to_owned();
        let context_name = ctx.name().to_owned();
        let input = ctx.input();
        let tcs = get_traffic_controller_list_for(res);
        for tc in &tcs {
            let r = can_pass_check(
                tc,
                stat_node.clone(),
                origin_node.clone(),
                &origin,
                &context_name,
                &tcs,
                input.batch_count(),
            );
            match r {
                TokenResult::Pass => {}
                TokenResult::Blocked(_) => {
                    ctx.set_result(r);
                    return ctx.result().clone();
                }
                TokenResult::Wait(nanos_to_wait) => {
                    utils::sleep_for_ns(nanos_to_wait);
                }
            }
        }
        return ctx.result().clone();
    }
}

/// where a DIRECT-strategy rule's `limit_app` says statistics should be
/// read from: the resource's aggregate ClusterNode, the caller's own
/// OriginNode, or nowhere (the rule doesn't apply to this caller).
enum DirectTarget {
    Cluster,
    Origin,
    NotApplicable,
}

/// `limit_app` selects which callers a DIRECT rule applies to: `"default"`
/// matches everyone and measures at the resource level; a specific origin
/// name matches only that caller and measures at the origin level;
/// `"other"` matches every caller that isn't named by one of the
/// resource's other rules.
fn direct_target_for(rule: &Rule, origin: &str, siblings: &[Arc<Controller>]) -> DirectTarget {
    let limit_app = rule.limit_app.as_str();
    if limit_app.is_empty() || limit_app == "default" {
        return DirectTarget::Cluster;
    }
    if limit_app == "other" {
        let has_dedicated_rule = siblings.iter().any(|other| {
            let other_limit_app = other.rule().limit_app.as_str();
            other_limit_app != "default" && other_limit_app != "other" && other_limit_app == origin
        });
        return if has_dedicated_rule {
            DirectTarget::NotApplicable
        } else {
            DirectTarget::Cluster
        };
    }
    if limit_app == origin {
        return DirectTarget::Origin;
    }
    DirectTarget::NotApplicable
}

fn can_pass_check(
    tc: &Arc<Controller>,
    given_node: Option<Arc<dyn StatNode>>,
    origin_node: Option<Arc<dyn StatNode>>,
    origin: &str,
    context_name: &str,
    siblings: &[Arc<Controller>],
    batch_count: u32,
) -> TokenResult {
    let rule = tc.rule();
    let actual_node = match rule.relation_strategy {
        RelationStrategy::Associated => {
            stat::get_cluster_node(&rule.ref_resource).map(|n| n as Arc<dyn StatNode>)
        }
        RelationStrategy::Chain => {
            if context_name != rule.ref_resource {
                // entered through a different entrance than the one this
                // rule is chained to, so it doesn't apply here.
                return TokenResult::new_pass();
            }
            given_node
        }
        RelationStrategy::Current => match direct_target_for(rule, origin, siblings) {
            DirectTarget::NotApplicable => return TokenResult::new_pass(),
            DirectTarget::Origin => origin_node.or(given_node),
            DirectTarget::Cluster => given_node,
        },
    };
    match actual_node {
        Some(node) => tc.perform_checking(node, batch_count, 0),
        None => {
            logging::FREQUENT_ERROR_ONCE.call_once(|| {
                logging::error!(
                    "None statistics node for flow rule in FlowSlot.can_pass_check() {:?}",
                    rule
                );
            });
            TokenResult::new_pass()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{
        EntryContext, MetricEvent, ResourceType, ResourceWrapper, SentinelInput, StatSlot,
        TrafficType,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn rule_check_slot() {
        let slot = Slot {};
        let stat_slot = StandaloneStatSlot {};
        let res_name = String::from("abc");
        let res =
            ResourceWrapper::new(res_name.clone(), ResourceType::Common, TrafficType::Inbound);
        let res_node = stat::get_or_create_cluster_node(&res_name, &ResourceType::Common);
        let mut ctx = EntryContext::new();
        ctx.set_input(SentinelInput::new(1, 0));
        ctx.set_stat_node(res_node);
        ctx.set_resource(res);
        let ctx = Rc::new(RefCell::new(ctx));

        slot.check(&ctx);

        let r1 = Arc::new(Rule {
            resource: res_name.clone(),
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            // Use standalone statistic, using single-bucket-sliding-windows
            stat_interval_ms: 20000,
            threshold: 100.0,
            relation_strategy: RelationStrategy::Current,
            ..Default::default()
        });
        load_rules(vec![r1]);

        for _ in 0..50 {
            slot.check(&ctx);
            stat_slot.on_entry_pass(Rc::clone(&ctx));
        }
        assert_eq!(
            get_traffic_controller_list_for(&res_name)[0]
                .stat()
                .read_only_metric()
                .sum(MetricEvent::Pass),
            50
        );
    }

    #[test]
    fn chain_rule_does_not_apply_outside_its_entrance() {
        let slot = Slot {};
        let res_name = String::from("chain-res-mismatch");
        let res =
            ResourceWrapper::new(res_name.clone(), ResourceType::Common, TrafficType::Inbound);
        let res_node = stat::get_or_create_cluster_node(&res_name, &ResourceType::Common);

        let mut ctx = EntryContext::with_name("unrelated-entrance".into());
        ctx.set_input(SentinelInput::new(1, 0));
        ctx.set_stat_node(res_node);
        ctx.set_resource(res);
        let ctx = Rc::new(RefCell::new(ctx));

        let r1 = Arc::new(Rule {
            resource: res_name.clone(),
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            threshold: 0.0,
            relation_strategy: RelationStrategy::Chain,
            ref_resource: "chained-entrance".into(),
            ..Default::default()
        });
        load_rules(vec![r1]);

        // threshold of 0 would block any Current-strategy rule, but this
        // one is chained to an entrance the context wasn't entered under.
        assert!(slot.check(&ctx).is_pass());
    }

    #[test]
    fn chain_rule_applies_when_entrance_matches() {
        let slot = Slot {};
        let res_name = String::from("chain-res-match");
        let res =
            ResourceWrapper::new(res_name.clone(), ResourceType::Common, TrafficType::Inbound);
        let res_node = stat::get_or_create_cluster_node(&res_name, &ResourceType::Common);

        let mut ctx = EntryContext::with_name("chained-entrance-2".into());
        ctx.set_input(SentinelInput::new(1, 0));
        ctx.set_stat_node(res_node);
        ctx.set_resource(res);
        let ctx = Rc::new(RefCell::new(ctx));

        let r1 = Arc::new(Rule {
            resource: res_name.clone(),
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            threshold: 0.0,
            relation_strategy: RelationStrategy::Chain,
            ref_resource: "chained-entrance-2".into(),
            ..Default::default()
        });
        load_rules(vec![r1]);

        assert!(slot.check(&ctx).is_blocked());
    }

    #[test]
    fn direct_rule_with_limit_app_measures_the_named_origin_only() {
        use crate::base::ConcurrencyStat;

        let slot = Slot {};
        let res_name = String::from("origin-scoped-res");
        let res =
            ResourceWrapper::new(res_name.clone(), ResourceType::Common, TrafficType::Inbound);
        let cluster_node = stat::get_or_create_cluster_node(&res_name, &ResourceType::Common);
        let origin_node = cluster_node.get_or_create_origin_node("caller-a").unwrap();
        // caller-a alone is already over the per-origin concurrency limit,
        // even though the resource-wide concurrency is still low.
        origin_node.increase_concurrency();
        origin_node.increase_concurrency();

        let mut ctx = EntryContext::new();
        ctx.set_input(SentinelInput::new(1, 0));
        ctx.set_stat_node(cluster_node.clone());
        ctx.set_origin_node(Some(origin_node.clone() as Arc<dyn StatNode>));
        ctx.set_origin("caller-a".into());
        ctx.set_resource(res);
        let ctx = Rc::new(RefCell::new(ctx));

        let r1 = Arc::new(Rule {
            resource: res_name.clone(),
            limit_app: "caller-a".into(),
            grade: Grade::Thread,
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            threshold: 1.0,
            relation_strategy: RelationStrategy::Current,
            ..Default::default()
        });
        load_rules(vec![r1]);

        assert!(
            slot.check(&ctx).is_blocked(),
            "rule should measure caller-a's OriginNode, which is already at concurrency 2 > threshold 1"
        );
    }
}
