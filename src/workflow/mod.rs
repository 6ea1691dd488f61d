pub mod publish_flow;
pub mod run_ctx;

pub use publish_flow::{FlowTiming, PublishEvent, PublishFlow, PublishMachine, PublishState};
pub use run_ctx::RunCtx;
