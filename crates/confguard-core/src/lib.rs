//! # confguard-core: Foundational Types
//!
//! Shared vocabulary of the confguard workspace. The schema pipeline in
//! `confguard-schema` is written against these types only and never
//! touches a concrete configuration store directly.
//!
//! ## Contents
//!
//! 1. **`ConfigPath`.** Dotted configuration keys plus lossless
//!    conversion to and from JSON Pointers.
//!
//! 2. **`DeclaredType`.** The JSON type a schema declares for a property,
//!    used to coerce raw environment strings before validation.
//!
//! 3. **`EnvSource`.** Environment lookup behind a trait, so tests and
//!    hosts can inject variables.
//!
//! 4. **`ConfigProvider`.** The contract the pipeline uses to bind
//!    environment variables and read the merged configuration.
//!    `LayeredConfig` is the reference implementation.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `confguard-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod env;
pub mod error;
pub mod file;
pub mod path;
pub mod provider;
pub mod value_type;

pub use env::{env_var_name, EnvSource, MapEnv, ProcessEnv};
pub use error::{ConfigError, PointerError};
pub use file::{json_type_name, load_config_file};
pub use path::{dotted_to_pointer, pointer_to_dotted, ConfigPath};
pub use provider::{ConfigProvider, EnvBinding, LayeredConfig, ResolvedValue, ValueSource};
pub use value_type::DeclaredType;
