//! Skill Execution Contract
//!
//! Validation and dispatch layer between callers and skill handlers.
//!
//! # Architecture
//!
//! ```text
//! TaskPayload ──► SchemaRegistry ──► Skill::execute ──► SchemaRegistry ──► result
//!                 (input schema)       (by task_type)     (output schema)
//! ```
//!
//! # Contract Format
//!
//! Contracts are explicit schema descriptors. Built-in ones cover
//! `generate_content` and `fetch_trends`; more can be loaded from disk:
//!
//! ```toml
//! name = "summarize"
//!
//! [input]
//! name = "summarize_input"
//!
//! [input.fields.task_id]
//! type = "string"
//! required = true
//!
//! [output]
//! name = "summarize_output"
//!
//! [output.fields.summary]
//! type = "string"
//! required = true
//! ```

pub mod builtin;
pub mod dispatcher;
pub mod loader;
pub mod payload;
pub mod schema;
pub mod skill;
pub mod validator;

pub use dispatcher::{DispatchError, DispatchOutcome, SkillDispatcher, SkillDispatcherBuilder};
pub use loader::ContractLoader;
pub use payload::{TaskPayload, TaskType};
pub use schema::{FieldSpec, FieldType, SchemaDescriptor, Violation};
pub use skill::{Skill, SkillError};
pub use validator::{Direction, SchemaRegistry, SchemaRegistryBuilder, SkillContract, ValidationError};
