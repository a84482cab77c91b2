//! Pipeline services.
//!
//! Each service owns one stage of the notification pipeline and talks to
//! the providers through trait seams, so every stage is testable against
//! scripted fakes.

mod aggregator_service;
mod label_service;
mod metrics_service;
mod pipeline_service;
mod resolver_service;

pub use aggregator_service::{AggregatorError, AggregatorService};
pub use label_service::{LabelError, LabelResult, LabelService};
pub use metrics_service::{
    MetricsError, MetricsResult, MetricsService, MetricsStorage, PolarityCounts,
};
pub use pipeline_service::{PipelineError, PipelineOutcome, PipelineService};
pub use resolver_service::ResolverService;
