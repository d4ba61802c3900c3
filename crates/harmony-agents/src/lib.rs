//! # Harmony-Agents
//!
//! Conversational recommendation layer on top of the scoring engine.
//!
//! ## Architecture
//!
//! - **HarmonyLayer**: cached pair assessments, ranking and feedback learning
//! - **ReplyClassifier**: turns chat replies into like / pass / more / free text
//! - **Explainer**: pluggable natural-language explanation with a template fallback
//! - **RecommendationOrchestrator**: per-user session state machine
//!
//! ## Session Flow
//!
//! ```text
//! ProfileInput
//!     ↓
//! [ProfileMapper] → PersonalityVector
//!     ↓
//! [HarmonyLayer::rank] ← CandidateStore
//!     ↓
//! present → reply → [ReplyClassifier]
//!     ↓                    ↓
//! next candidate    [HarmonyLayer learning] → re-rank
//! ```

pub mod agent;
pub mod cache;
pub mod classifier;
pub mod explanation;
pub mod harmony;
pub mod messages;
pub mod orchestrator;
pub mod prompts;
pub mod store;

pub use agent::*;
pub use cache::*;
pub use classifier::*;
pub use explanation::*;
pub use harmony::*;
pub use messages::*;
pub use orchestrator::*;
pub use prompts::*;
pub use store::*;
