pub mod installer;
pub mod routing_table;

pub use installer::RouteInstaller;
pub use routing_table::{HostRoute, RoutingTable};
