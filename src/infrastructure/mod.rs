//! 基础设施层
//!
//! 持有稀缺资源（Page），只暴露能力

pub mod cdp_page;
pub mod page_driver;

pub use cdp_page::{CdpPage, ElementRef};
pub use page_driver::{BrowserLauncher, BrowserSession, LaunchOptions, PageDriver, SnapshotSource};
