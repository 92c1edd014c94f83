//! exoflow cloud abstraction
//!
//! This crate defines the narrow capability surface the provisioning core
//! needs from a compute provider, independent of any provider SDK.
//!
//! # Supported Providers
//!
//! - **Exoscale**: keypairs, security groups, templates, offerings and
//!   virtual machines (via the CloudStack-compatible compute API)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  exoflow CLI                     │
//! │        (provision / validate / teardown)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               exoflow-provider                   │
//! │   keypairs · security groups · compute · ssh     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                exoflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │            Driver Abstraction             │   │
//! │  │  trait CloudDriver { ... }                │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │ Resource types│  │ ProviderContext store│    │
//! │  └──────────────┘  └──────────────────────┘    │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │   exoscale    │
//! │    driver     │
//! └───────────────┘
//! ```

pub mod context;
pub mod driver;
pub mod error;
pub mod types;

// Re-exports
pub use context::{ContextStore, ProviderContext};
pub use driver::{AuthStatus, CloudDriver};
pub use error::{CloudError, Result};
pub use types::{
    CreateNodeRequest, CreatedKeyPair, Image, IngressRequest, IngressRule, KeyPair, Node,
    NodeState, SecurityGroup, Size,
};
