pub mod article;
pub mod loaders;
pub mod matcher;
pub mod outcome;
pub mod session_state;

pub use article::{Article, PLACEHOLDER_TITLE};
pub use loaders::{load_selector_overrides, SelectorOverrides};
pub use matcher::{CandidateMatcher, Field, Locator, SelectorSet};
pub use outcome::{Phase, PublishMode, RunOutcome, Terminal};
pub use session_state::{CookieRecord, OriginState, SessionState, StorageEntry};
