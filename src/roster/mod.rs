//! NPC/Group registry: the persona definitions the kernel consumes.
//!
//! The kernel only ever sees an immutable `Vec<NpcProfile>` snapshot; every
//! edit goes through a store and is pushed in as `Event::RosterChanged`.

pub mod defaults;
pub mod groups;
pub mod store;
pub mod types;

pub use groups::GroupRegistry;
pub use store::{FileNpcStore, InMemoryNpcStore, NpcStore, RosterError};
pub use types::{find_by_name, GroupId, NpcGroup, NpcId, NpcPatch, NpcProfile};
