//! Prompts sent to vision and portrait models.

/// Instruction describing the expected recognition output.
pub const RECOGNITION_SYSTEM_PROMPT: &str = "You are an expert anime character recognition system. \
Analyze images and identify all anime characters present. \
Return ONLY a JSON array of character names, nothing else. \
Format: [\"Character Name 1\", \"Character Name 2\"]. \
If no anime characters are detected, return an empty array [].";

/// The per-image request.
pub const RECOGNITION_USER_PROMPT: &str =
    "Identify all anime characters in this image. Return only a JSON array of their full names.";

/// Prompt asking for a portrait reference for one character.
pub fn portrait_prompt(name: &str, description: &str) -> String {
    format!(
        "Generate a high-quality anime character portrait image URL of {}. {}. \
         Return ONLY the direct URL of the generated image and nothing else.",
        name,
        description.trim_end_matches('.')
    )
}
