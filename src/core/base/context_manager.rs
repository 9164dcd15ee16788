//! Per-thread `Context` binding and the LIFO stack of in-flight entries.
//!
//! A task keeps at most one active `Context`, reused across nested
//! `entry()` calls so they see a consistent name/origin and so `exit()`
//! can tell whether it is popping the entry it should be popping.
//! `enter_context` opens the binding (or hands back the existing one
//! untouched), `exit_context` tears it down, and `push_entry`/`pop_entry`
//! maintain the stack.

use super::{ContextPtr, EntryContext, EntryWeakPtr, MAX_CONTEXT_NAME_SIZE};
use crate::{Error, Result};
use lazy_static::lazy_static;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::{Arc, RwLock};

lazy_static! {
    /// process-wide registry of context names ever entered, bounding how
    /// many distinct names the process will track regardless of thread.
    static ref CONTEXT_NAMES: RwLock<HashSet<String>> = RwLock::new(HashSet::new());
}

std::thread_local! {
    static CURRENT_CONTEXT: RefCell<Option<ContextPtr>> = RefCell::new(None);
    static ENTRY_STACK: RefCell<Vec<EntryWeakPtr>> = RefCell::new(Vec::new());
}

/// Binds a `Context` to the current task. If one is already bound, it is
/// returned unchanged — a nested `entry()` on the same task reuses the
/// outer context even if it asked for a different name/origin. Otherwise
/// a context named `name` is created, unless the process has already
/// registered `MAX_CONTEXT_NAME_SIZE` distinct context names, in which
/// case `ContextOverflow` is raised.
pub fn enter_context(name: String, origin: String) -> Result<ContextPtr> {
    if let Some(ctx) = CURRENT_CONTEXT.with(|c| c.borrow().clone()) {
        return Ok(ctx);
    }
    {
        let names = CONTEXT_NAMES.read().unwrap();
        if !names.contains(&name) && names.len() >= MAX_CONTEXT_NAME_SIZE {
            return Err(Error::msg(format!(
                "ContextOverflow: the process has already registered {} distinct context names, limit is {}",
                names.len(),
                MAX_CONTEXT_NAME_SIZE
            )));
        }
    }
    CONTEXT_NAMES.write().unwrap().insert(name.clone());

    let mut ctx = EntryContext::with_name(name);
    ctx.set_origin(origin);
    cfg_if_async!(
        let ctx: ContextPtr = Arc::new(RwLock::new(ctx)),
        let ctx: ContextPtr = Rc::new(RefCell::new(ctx))
    );
    CURRENT_CONTEXT.with(|c| *c.borrow_mut() = Some(ctx.clone()));
    Ok(ctx)
}

/// Clears the current task's context binding and drops any entries still
/// tracked on its stack. Safe to call when nothing is bound.
pub fn exit_context() {
    CURRENT_CONTEXT.with(|c| *c.borrow_mut() = None);
    ENTRY_STACK.with(|s| s.borrow_mut().clear());
}

/// True while the current task still has a context bound.
pub fn has_active_context() -> bool {
    CURRENT_CONTEXT.with(|c| c.borrow().is_some())
}

/// Pushes a newly built entry onto the task's stack.
pub fn push_entry(entry: EntryWeakPtr) {
    ENTRY_STACK.with(|s| s.borrow_mut().push(entry));
}

/// Pops `entry` if it is the top of the task's stack — the only legal
/// pairing. If the stack is empty or `entry` isn't on top, the pairing
/// is broken: the context is torn down immediately (to avoid cascading
/// mismatches from whatever called `exit()` out of order) and
/// `ErrorEntryFree` is returned. The last entry popping cleanly also
/// tears the context down, since nothing is left using it.
pub fn pop_entry(entry: &EntryWeakPtr) -> Result<()> {
    let popped = ENTRY_STACK.with(|s| {
        let mut stack = s.borrow_mut();
        match stack.last() {
            Some(top) if top.ptr_eq(entry) => {
                stack.pop();
                true
            }
            _ => false,
        }
    });
    if !popped {
        exit_context();
        return Err(Error::msg(
            "ErrorEntryFree: exit() does not match the top of the context's entry stack",
        ));
    }
    if ENTRY_STACK.with(|s| s.borrow().is_empty()) {
        exit_context();
    }
    Ok(())
}
