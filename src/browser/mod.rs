pub mod launcher;
pub mod session;

pub use launcher::ChromeLauncher;
pub use session::ChromeSession;
