// Domain models: raw samples, join context, series, chart definitions

mod chart;
mod context;
mod series;
mod slice;
mod snapshot;

pub use chart::{ChartDefinition, ChartFrame, DashboardFrame, LineType, TickFormat};
pub use context::{ContainerEntry, ContainerList, InstanceDomainMapping};
pub use series::{DataPoint, Instance, Series, default_label};
pub use slice::TimeSlice;
pub use snapshot::{InstanceId, SINGLETON, Snapshot, Window};
