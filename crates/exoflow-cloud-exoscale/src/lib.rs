//! Exoscale compute driver for exoflow
//!
//! Implements [`exoflow_cloud::CloudDriver`] over the CloudStack-compatible
//! Exoscale compute API.
//!
//! # Requirements
//!
//! - An Exoscale API key and secret with compute access
//!
//! # Example
//!
//! ```ignore
//! use exoflow_cloud::CloudDriver;
//! use exoflow_cloud_exoscale::ExoscaleDriver;
//!
//! let driver = ExoscaleDriver::new("EXO...", "secret", None, Some("ch-gva-2"))?;
//!
//! let auth = driver.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let keypairs = driver.list_key_pairs().await?;
//! ```

pub mod api;
pub mod driver;
pub mod error;
pub mod models;
pub mod signing;

pub use api::{DEFAULT_ENDPOINT, DeployVirtualMachine, ExoscaleApi};
pub use driver::ExoscaleDriver;
pub use error::{ExoscaleError, Result};
