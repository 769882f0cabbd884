pub mod browser;
pub mod cli;
pub mod config;
pub mod driver;
pub mod element;
pub mod error;
pub mod form;
pub mod page;
pub mod profile;
pub mod report;
pub mod scripts;
pub mod steps;

pub use browser::WorkdayBrowser;
pub use config::BrowserConfig;
pub use driver::{Driver, FlowSurface, RunContext, RunOptions};
pub use error::{Error, Result};
pub use form::{FieldDescriptor, FieldKind, FormSurface};
pub use page::Page;
pub use profile::{Profile, ProfileValue, Section};
pub use report::{FieldOutcome, FillFailure, StepReport};
pub use steps::Step;
