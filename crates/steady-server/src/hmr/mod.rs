//! Hot module replacement: client groups, update preparation and the
//! wire messages sent to clients.

pub mod clients;
pub mod coordinator;
pub mod message;
pub mod perf;
pub mod serializer;

pub use clients::{Client, ClientGroup, ClientId, ClientIndex, GraphOptions};
pub use coordinator::{HmrCoordinator, UpdateOptions};
pub use message::{HmrModule, HmrUpdate, Message, UpdateBody};
pub use perf::{ChangeEvent, PerfLogger, TracingPerfLogger};
pub use serializer::{HmrBundleOptions, hmr_bundle};
