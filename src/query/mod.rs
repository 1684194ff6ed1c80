pub mod descriptor;
pub mod rate;

pub use descriptor::{
    Aggregate, AggregateFunction, Datasource, ResultDescriptor, ResultDescriptorBuilder,
    SourceKind, DEFAULT_HEARTBEAT_MULTIPLIER, DEFAULT_STEP_MILLIS,
};
pub use rate::{Rate, RateExt, RateState};
