//! Light service abstraction layer.
//!
//! The remote service is a black box behind [`LightsService`]:
//! - [`HttpLightsService`] talks to the real HTTP endpoints
//! - [`MockLightsService`] is a scriptable in-memory stand-in for tests

pub mod http;
pub mod mock;
pub mod traits;
pub mod types;

pub use http::HttpLightsService;
pub use mock::MockLightsService;
pub use traits::{LightsService, ServiceError};
pub use types::{Command, CommandReply, ControlAction, HealthReport, Method, StatusSnapshot};
