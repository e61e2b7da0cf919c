pub mod period_ctx;
pub mod period_flow;

pub use period_ctx::PeriodCtx;
pub use period_flow::PeriodFlow;
