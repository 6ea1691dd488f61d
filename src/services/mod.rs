pub mod content_injector;
pub mod diagnostics;
pub mod element_resolver;
pub mod navigator;
pub mod run_log;
pub mod session_store;

pub use content_injector::{ContentInjector, InjectOptions};
pub use diagnostics::{ArtifactDiagnostics, DiagnosticSink, DisabledDiagnostics, FailureRecord};
pub use element_resolver::{ElementResolver, ResolvedElement};
pub use navigator::{LoginCheck, NavigationPlan, Navigator};
pub use run_log::RunLogWriter;
pub use session_store::{repair_domains, RepairReport, SessionStore};
