pub mod reconcile;
pub mod status;

pub use reconcile::{reconcile, DiscoveredDevice};
pub use status::{collect, read_neighbor_table, NetworkStatus};
