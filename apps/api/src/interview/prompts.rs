// Interview feedback prompt templates.

pub const FEEDBACK_SYSTEM: &str = "\
You are an expert technical interviewer. \
Grade mock interview transcripts fairly and concretely. \
You MUST respond with valid JSON only — no markdown fences, no explanations.";

/// Replace `{job_role}` and `{transcript}` before sending.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"Analyze the following interview transcript for a {job_role} position.

TRANSCRIPT:
{transcript}

Return a JSON object with this EXACT schema:
{
  "score": 0-100 integer,
  "strengths": ["string"],
  "weaknesses": ["string"],
  "recommendations": ["string"],
  "overallFeedback": "string"
}"#;

/// Served when no model is configured or the model call fails.
pub const FALLBACK_FEEDBACK: &str = r#"{
  "score": 70,
  "strengths": ["Good communication", "Technical knowledge"],
  "weaknesses": ["Need more practice with system design", "Could improve problem-solving speed"],
  "recommendations": ["Practice more coding problems", "Study system design patterns", "Work on communication clarity"],
  "overallFeedback": "Good performance overall. Continue practicing and refining your technical skills."
}"#;

pub fn render_feedback_prompt(job_role: &str, transcript: &str) -> String {
    FEEDBACK_PROMPT_TEMPLATE
        .replace("{job_role}", job_role)
        .replace("{transcript}", transcript)
}
