//! Prompt and template text for match explanations.

use crate::agent::{ExplanationDepth, ExplanationRequest};
use crate::explanation::FactorKind;

/// System prompt for generative explainers
pub const EXPLAINER_SYSTEM_PROMPT: &str = r#"You are a warm, grounded relationship coach. You explain why two people might be a good match based on a compatibility assessment.

You will receive:
1. The names of the user and the candidate
2. An overall compatibility percentage
3. Ranked key factors, each marked as a strength, a risk, or neutral

Your task is to write a short explanation that:
- Leads with the strongest shared ground
- Mentions at most one area that may need attention, framed constructively
- Avoids clinical terms such as "attachment style" or "neuroticism"
- Never promises an outcome

Write in second person, addressed to the user. Keep brief explanations under 60 words and detailed ones under 150 words."#;

/// Template for explainer input
pub fn format_explanation_input(request: &ExplanationRequest) -> String {
    let factors = request
        .factors
        .iter()
        .map(|f| {
            format!(
                "- {} [{}] {:.0}%: {}",
                f.dimension.label(),
                kind_tag(f.kind),
                f.score * 100.0,
                f.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let depth = match request.depth {
        ExplanationDepth::Brief => "brief",
        ExplanationDepth::Detailed => "detailed",
    };

    format!(
        r#"=== MATCH EXPLANATION ===

User: {}
Candidate: {}
Overall compatibility: {}%

Key factors:
{}

Please write a {} explanation."#,
        request.user_name, request.candidate_name, request.overall_percent, factors, depth
    )
}

fn kind_tag(kind: FactorKind) -> &'static str {
    match kind {
        FactorKind::Strength => "strength",
        FactorKind::Risk => "risk",
        FactorKind::Neutral => "neutral",
    }
}

/// Render the fallback explanation from fixed sentence templates
pub fn render_template(request: &ExplanationRequest) -> String {
    let limit = match request.depth {
        ExplanationDepth::Brief => 3,
        ExplanationDepth::Detailed => request.factors.len(),
    };

    let mut sentences = vec![format!(
        "You and {} are {}% compatible.",
        request.candidate_name, request.overall_percent
    )];

    for factor in request.factors.iter().take(limit) {
        let label = factor.dimension.label().to_lowercase();
        let sentence = match factor.kind {
            FactorKind::Strength => format!("Your {label} line up especially well."),
            FactorKind::Risk => format!("Your {label} differ, which is worth talking about early."),
            FactorKind::Neutral => format!("Your {label} are a reasonable fit."),
        };
        sentences.push(sentence);
    }

    if request.depth == ExplanationDepth::Detailed {
        for factor in request.factors.iter().filter(|f| !f.description.is_empty()) {
            sentences.push(format!("{}: {}.", factor.dimension.label(), factor.description));
        }
    }

    sentences.join(" ")
}
