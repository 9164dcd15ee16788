pub mod block_error;
pub mod constant;
pub mod context;
pub mod context_manager;
pub mod entry;
pub mod metric_item;
pub mod resource;
pub mod result;
pub mod rule;
pub mod slot_chain;
pub mod stat;

pub use block_error::*;
pub use constant::*;
pub use context::*;
pub use context_manager::*;
pub use entry::*;
pub use metric_item::*;
pub use resource::*;
pub use result::*;
pub use rule::*;
pub use slot_chain::*;
pub use stat::*;
