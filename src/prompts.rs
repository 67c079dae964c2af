//! Centralized prompt definitions for the analysis stages
//!
//! Each prompt pins down the exact JSON shape its stage parses, so a change
//! to a schema in [`crate::schema`] must be mirrored here.

/// System instruction sent with every completion unless a stage overrides it.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a meticulous analysis assistant. Respond with JSON only.";

/// Placeholder replaced with the serialized context in the factor prompt.
pub const CONTEXT_PLACEHOLDER: &str = "{context_json}";

/// Factor extraction prompt.
pub const FACTOR_EXTRACTION_PROMPT: &str = r#"You are analysing a business or policy report. Decompose it into the discrete causal factors that explain its outcome.

Report context (JSON):
{context_json}

Your response MUST be valid JSON in this exact format:
{
  "factors": [
    {
      "factor_id": "F1",
      "description": "short description of one causal factor",
      "domain": "sales"
    }
  ]
}

Guidelines:
- Number factors F1, F2, F3, ... in order of importance
- Every factor_id must be unique
- domain must be exactly one of: sales, statistics, policy, organization
- Ground every factor in the narrative, facts or metrics provided
- Prefer 3-6 factors; never return an empty list

Always respond with valid JSON only, no other text."#;

/// Support sub-stage prompt.
pub const SUPPORT_PROMPT: &str = r#"You are the SUPPORT side of a structured debate. Argue that the given factor genuinely contributed to the reported outcome.

Your response MUST be valid JSON in this exact format:
{
  "support_arguments": [
    {
      "claim": "what the factor caused",
      "evidence": "data or narrative that backs the claim",
      "assumption": "what must be true for the claim to hold"
    }
  ]
}

Guidelines:
- Give 2-4 distinct arguments
- Cite numbers from the context wherever possible
- State assumptions honestly; they will be attacked

Always respond with valid JSON only, no other text."#;

/// Opposition sub-stage prompt.
pub const OPPOSITION_PROMPT: &str = r#"You are the OPPOSITION side of a structured debate. Challenge each supporting argument for the given factor.

Your response MUST be valid JSON in this exact format:
{
  "counter_arguments": [
    {
      "target_claim": "the support claim being challenged",
      "challenge": "why the claim is weak, confounded or unsupported",
      "risk": "what goes wrong if the claim is accepted uncritically"
    }
  ]
}

Guidelines:
- Address the support claims directly, one counter per claim where possible
- Look for confounders, selection effects and missing baselines
- Do not invent data that is not in the inputs

Always respond with valid JSON only, no other text."#;

/// Synthesis prompt.
pub const SYNTHESIS_PROMPT: &str = r#"You are the JUDGE of a multi-factor debate. Weigh the support and opposition for every factor and write the final verdict.

Your response MUST be valid JSON in this exact format:
{
  "what_worked": "what went well and why the evidence supports it",
  "what_failed": "what went badly",
  "why_it_happened": "the causal explanation that survived the debate",
  "how_to_improve": "concrete next steps",
  "synthesis": "one paragraph integrating all factors",
  "recommendation": "the single most important recommendation"
}

Guidelines:
- Prefer arguments that survived their counter-arguments
- Flag factors where the debate was one-sided
- Keep each field concise and specific

Always respond with valid JSON only, no other text."#;
