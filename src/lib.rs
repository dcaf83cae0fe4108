// Library surface shared by the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod question;
pub mod runtime;
pub mod session;
pub mod store;
pub mod streak;
pub mod ui;
pub mod util;

pub use error::QuizError;
