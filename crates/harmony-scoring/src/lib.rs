//! # Harmony Scoring
//!
//! Deterministic compatibility scoring between two personality vectors.
//!
//! ## Dimensions
//!
//! Seven weighted dimensions make up the overall score:
//!
//! 1. **Attachment** (0.25) - style matrix lookup
//! 2. **Communication** (0.20) - directness, expression, listening, conflict
//! 3. **Values** (0.15) - similarity over the eight values
//! 4. **Personality** (0.15) - Big Five similarity and complementarity
//! 5. **Emotional** (0.10) - the weaker partner's emotional intelligence
//! 6. **Lifestyle** (0.10) - extension point, capped confidence
//! 7. **Growth** (0.05) - extension point, capped confidence
//!
//! Predictions and insights are derived from the dimension scores by fixed
//! formulas and threshold rules.
//!
//! ## Profile Mapping
//!
//! [`ProfileMapper`] turns questionnaire answers (MBTI, Big Five
//! percentiles, interests, values) into an initial vector and derives the
//! remaining groups through the ordered [`COMBINATION_RULES`] table.

pub mod attachment;
pub mod batch;
pub mod dimensions;
pub mod insights;
pub mod mapper;
pub mod predictions;
pub mod rules;
pub mod scorer;

pub use attachment::*;
pub use batch::*;
pub use dimensions::*;
pub use insights::*;
pub use mapper::*;
pub use predictions::*;
pub use rules::*;
pub use scorer::*;
