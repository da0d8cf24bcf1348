//! In-process collaborators for the deployment orchestrator.
//!
//! [`SimulatedStackClient`] keeps stacks in memory and walks them through scripted status
//! paths; [`LocalTemplateParser`] reads template parameters without a remote service.
mod error;
pub use error::LocalError;

mod simulated;
pub use simulated::{SimCall, SimScript, SimulatedStackClient};

mod template;
pub use template::LocalTemplateParser;
