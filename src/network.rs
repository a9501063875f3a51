mod binding;
pub mod interface;
pub mod link;
pub mod topology;

pub use binding::{ChannelConfig, SubnetAllocator};
pub use interface::LinkInterface;
pub use link::LinkParam;
pub use topology::Topology;
