use super::*;
use crate::base::{BaseSlot, BlockType, ContextPtr, RuleCheckSlot, TokenResult};
use lazy_static::lazy_static;
use std::sync::Arc;

const RULE_CHECK_SLOT_ORDER: u32 = 1000;

/// A RuleSlot checking the caller's origin against authority rules.
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
        let res = ctx.resource().name().clone();
        let origin = ctx.origin().to_string();
        for rule in get_rules_of_resource(&res) {
            if !rule.is_allowed(&origin) {
                ctx.set_result(TokenResult::new_blocked_with_msg(
                    BlockType::AuthorityFlow,
                    format!("origin {} blocked by authority rule {:?}", origin, rule),
                ));
                return ctx.result().clone();
            }
        }
        ctx.result().clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{EntryContext, ResourceType, ResourceWrapper, TrafficType};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ctx_with_origin(res_name: &str, origin: &str) -> ContextPtr {
        let mut ctx = EntryContext::new();
        ctx.set_resource(ResourceWrapper::new(
            res_name.into(),
            ResourceType::Common,
            TrafficType::Inbound,
        ));
        ctx.set_origin(origin.into());
        Rc::new(RefCell::new(ctx))
    }

    #[test]
    fn no_rules_passes() {
        clear_rules();
        let slot = Slot {};
        let ctx = ctx_with_origin("abc", "appA");
        assert!(slot.check(&ctx).is_pass());
    }

    #[test]
    fn whitelist_blocks_unknown_origin() {
        clear_rules();
        load_rules(vec![Arc::new(Rule {
            resource: "abc".into(),
            strategy: AuthorityStrategy::White,
            limit_app: vec!["appA".into()],
            ..Default::default()
        })]);
        let slot = Slot {};
        assert!(slot.check(&ctx_with_origin("abc", "appA")).is_pass());
        assert!(slot.check(&ctx_with_origin("abc", "appB")).is_blocked());
        clear_rules();
    }

    #[test]
    fn blacklist_blocks_listed_origin() {
        clear_rules();
        load_rules(vec![Arc::new(Rule {
            resource: "abc".into(),
            strategy: AuthorityStrategy::Black,
            limit_app: vec!["appA".into()],
            ..Default::default()
        })]);
        let slot = Slot {};
        assert!(slot.check(&ctx_with_origin("abc", "appA")).is_blocked());
        assert!(slot.check(&ctx_with_origin("abc", "appB")).is_pass());
        clear_rules();
    }
}
