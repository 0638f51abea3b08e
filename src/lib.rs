//! Skill Contract
//!
//! Validation and dispatch layer for agent skills.
//!
//! # Features
//!
//! - **Schema Registry**: explicit input/output contracts per skill
//! - **Skill Dispatch**: `task_type` tag → handler, with validation on both sides
//! - **Trend Fetcher**: concurrent polling of resource locators with
//!   per-resource timeouts and partial-failure reporting
//! - **Resource Sources**: HTTP (reqwest), cached (moka), in-memory
//!
//! # Architecture
//!
//! ```text
//! caller ──► SkillDispatcher ──► SchemaRegistry (input)
//!                 │
//!                 ├── TrendFetchSkill ──► TrendFetcher ──► ResourceSource × N
//!                 │
//!                 └──────────────────► SchemaRegistry (output) ──► caller
//! ```

pub mod config;
pub mod logging;
pub mod skills;
pub mod trends;

pub use config::Config;
pub use skills::{
    ContractLoader, DispatchError, DispatchOutcome, FieldSpec, FieldType, SchemaDescriptor,
    SchemaRegistry, Skill, SkillContract, SkillDispatcher, SkillError, TaskPayload, TaskType,
    ValidationError, Violation,
};
pub use trends::{
    CachedSource, FetchError, FetchReport, HttpSource, MemorySource, RawSignal,
    ResourceFetchFailure, ResourceSource, TrendAlert, TrendFetchConfig, TrendFetchSkill,
    TrendFetcher,
};
