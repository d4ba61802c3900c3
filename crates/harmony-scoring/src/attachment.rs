//! Attachment style classification and the pairwise compatibility matrix.

use harmony_core::{Dimension, PersonalityVector, TraitGroup};
use serde::{Deserialize, Serialize};

/// Score used when either side has no attachment data
pub const UNKNOWN_PAIR_SCORE: f64 = 0.5;

/// Categorical attachment style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStyle {
    Secure,
    Anxious,
    Avoidant,
    Disorganized,
}

impl AttachmentStyle {
    pub fn from_dimension(dimension: Dimension) -> Option<Self> {
        match dimension {
            Dimension::Secure => Some(AttachmentStyle::Secure),
            Dimension::Anxious => Some(AttachmentStyle::Anxious),
            Dimension::Avoidant => Some(AttachmentStyle::Avoidant),
            Dimension::Disorganized => Some(AttachmentStyle::Disorganized),
            _ => None,
        }
    }

    /// Primary attachment style of a vector
    pub fn of(vector: &PersonalityVector) -> Self {
        Self::from_dimension(vector.primary_style(TraitGroup::Attachment))
            .unwrap_or(AttachmentStyle::Secure)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttachmentStyle::Secure => "secure",
            AttachmentStyle::Anxious => "anxious",
            AttachmentStyle::Avoidant => "avoidant",
            AttachmentStyle::Disorganized => "disorganized",
        }
    }
}

/// Upper triangle of the symmetric 4x4 matrix
const MATRIX: [((AttachmentStyle, AttachmentStyle), f64); 10] = {
    use AttachmentStyle::*;
    [
        ((Secure, Secure), 0.95),
        ((Secure, Anxious), 0.75),
        ((Secure, Avoidant), 0.70),
        ((Secure, Disorganized), 0.65),
        ((Anxious, Anxious), 0.45),
        ((Anxious, Avoidant), 0.35),
        ((Anxious, Disorganized), 0.40),
        ((Avoidant, Avoidant), 0.50),
        ((Avoidant, Disorganized), 0.35),
        ((Disorganized, Disorganized), 0.30),
    ]
};

/// Matrix lookup trying both key orders.
pub fn pair_compatibility(a: AttachmentStyle, b: AttachmentStyle) -> f64 {
    MATRIX
        .iter()
        .find(|((x, y), _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, score)| *score)
        .unwrap_or(UNKNOWN_PAIR_SCORE)
}

/// Short reading of a style pairing
pub fn pairing_analysis(a: AttachmentStyle, b: AttachmentStyle) -> String {
    use AttachmentStyle::*;
    let note = match (a, b) {
        (Secure, Secure) => "a stable, trusting foundation",
        (Secure, _) | (_, Secure) => "one partner can anchor the other's insecurities",
        (Anxious, Avoidant) | (Avoidant, Anxious) => {
            "a pursue-withdraw cycle that needs deliberate care"
        }
        (Anxious, Anxious) => "high closeness needs that can amplify worry",
        (Avoidant, Avoidant) => "comfortable distance that can drift into disconnection",
        _ => "unpredictable closeness patterns on both sides",
    };
    format!("{} and {} attachment: {}", a.name(), b.name(), note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use AttachmentStyle::*;

    #[test]
    fn test_matrix_values() {
        assert_eq!(pair_compatibility(Secure, Secure), 0.95);
        assert_eq!(pair_compatibility(Anxious, Avoidant), 0.35);
        assert_eq!(pair_compatibility(Disorganized, Disorganized), 0.30);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let styles = [Secure, Anxious, Avoidant, Disorganized];
        for a in styles {
            for b in styles {
                assert_eq!(pair_compatibility(a, b), pair_compatibility(b, a));
            }
        }
        assert_eq!(pair_compatibility(Avoidant, Secure), 0.70);
    }

    #[test]
    fn test_style_of_vector() {
        let mut v = PersonalityVector::create_default("u1");
        assert_eq!(AttachmentStyle::of(&v), Secure);

        v.load_partial(&json!({ "attachment": { "avoidant": 0.8 } }))
            .unwrap();
        assert_eq!(AttachmentStyle::of(&v), Avoidant);
    }
}
