//! Configuration, environment and connection descriptors for capstan.
//!
//! Nothing in this crate touches the network; descriptors are only turned
//! into driver options when a connection is first opened.

pub mod config;
pub mod descriptor;
pub mod env;
pub mod error;

pub use config::{EnvironmentConfig, Environments, PathsConfig, RunnerConfig};
pub use descriptor::ConnectionDescriptor;
pub use env::{load_env_file, EnvSnapshot};
pub use error::{CapstanError, Result};
