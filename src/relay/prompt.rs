//! Prompt assembly for chat relays

use serde::{Deserialize, Serialize};

/// Persona and domain instruction attached to every chat generation
pub const SYSTEM_PROMPT: &str = "You are an expert agricultural assistant for Indian farmers. You have deep knowledge in:

1. **Crop Cultivation**: Best practices for growing wheat, rice, maize, cotton, sugarcane, pulses, vegetables and fruits in Indian conditions.

2. **Soil Management**: Soil types (loamy, clay, sandy, alluvial), pH levels, nutrient content (NPK) and soil health improvement.

3. **Weather & Seasons**: Kharif, Rabi and Zaid seasons, monsoon patterns and climate-smart farming.

4. **Pest & Disease Management**: Identification and organic or chemical treatment of common crop diseases and pests.

5. **Water Management**: Irrigation techniques, water conservation and drought management.

6. **Market Information**: Mandi prices, MSP (Minimum Support Price) and good selling practices.

7. **Government Schemes**: PM-KISAN, crop insurance, subsidies and other farmer welfare programs.

8. **Modern Farming**: Precision agriculture, organic certification and sustainable practices.

Guidelines:
- Be friendly, supportive and encouraging
- Give practical, actionable advice in simple language
- Include specific measurements, timings and quantities when relevant
- Mention local or traditional practices when applicable
- Be concise; farmers are busy people
- Ask for more details when the answer depends on the farmer's region
- Answer in Hindi or English, matching the question

Your advice can affect a farmer's livelihood, so be accurate.";

/// Speaker of a previous turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used in the transcript
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One previous turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    /// Create a turn
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Build the single prompt string sent upstream
///
/// Previous turns become `"{Role}: {content}"` lines, followed by
/// `User: {message}\nAssistant:`.
pub fn build_prompt(history: &[ChatTurn], message: &str) -> String {
    let mut prompt = String::new();
    for turn in history {
        prompt.push_str(turn.role.label());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }
    prompt.push_str("User: ");
    prompt.push_str(message);
    prompt.push_str("\nAssistant:");
    prompt
}
