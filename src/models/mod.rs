// Domain models

mod alert;
mod resource;
mod snapshot;

pub use alert::{Alert, SeverityLevel};
pub use resource::{ParseResourceError, ResourceId};
pub use snapshot::{ContainerUsage, MetricSnapshot, ResourceUsage, USAGE_MAX};
