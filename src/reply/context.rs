//! Context assembly for generation prompts

use tracing::warn;

use crate::models::ConversationTurn;
use crate::models::PersonaProfile;
use crate::models::RetrievedMemory;

/// Assembler for persona, history and retrieved-memory context
pub struct ContextAssembler {
    max_context_length: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_length: usize) -> Self {
        Self { max_context_length }
    }

    /// Concatenate retrieved memories as grounding context, within the byte budget
    #[must_use]
    pub fn assemble(&self, memories: &[RetrievedMemory]) -> String {
        let mut context = String::new();
        let mut total_length = 0;

        for (idx, memory) in memories.iter().enumerate() {
            let header = format!(
                "\n[Past reply {}] (similarity {:.2})\n",
                idx + 1,
                memory.similarity_score
            );
            let entry_length = header.len() + memory.content.len() + 1;
            let remaining = self.max_context_length.saturating_sub(total_length);

            if entry_length > remaining {
                // Last entry that fits is clipped to the remaining budget
                let room = remaining.saturating_sub(header.len() + 1 + ELLIPSIS.len());
                let clipped = clip_to_bytes(&memory.content, room);
                if !clipped.is_empty() {
                    context.push_str(&header);
                    context.push_str(clipped);
                    context.push_str(ELLIPSIS);
                    context.push('\n');
                }
                let kept = idx + usize::from(!clipped.is_empty());
                if kept < memories.len() {
                    warn!(
                        "Grounding budget of {} bytes kept {}/{} past replies",
                        self.max_context_length,
                        kept,
                        memories.len()
                    );
                }
                break;
            }

            context.push_str(&header);
            context.push_str(&memory.content);
            context.push('\n');
            total_length += entry_length;
        }

        context
    }

    /// System prompt: persona, optional grounding context, then recent history
    #[must_use]
    pub fn system_prompt(
        &self,
        persona: &PersonaProfile,
        history: &[ConversationTurn],
        supplemental: &[RetrievedMemory],
    ) -> String {
        let mut prompt = self.persona_prompt(persona);

        let grounding = self.assemble(supplemental);
        if !grounding.is_empty() {
            prompt.push_str("\nYou have answered similar messages before. ");
            prompt.push_str("Use these past replies as factual grounding, but write a fresh reply; ");
            prompt.push_str("do not copy them word for word.\n");
            prompt.push_str(&grounding);
        }

        if !history.is_empty() {
            prompt.push_str("\nRecent conversation (oldest first):\n");
            prompt.push_str(&render_history(history));
        }

        prompt
    }

    /// Describe the creator's voice
    #[must_use]
    pub fn persona_prompt(&self, persona: &PersonaProfile) -> String {
        let mut prompt = String::new();
        prompt.push_str("You are a creator replying to a message from one of your fans. ");
        prompt.push_str("Write exactly as you would write it yourself.\n\n");

        if !persona.personality.trim().is_empty() {
            prompt.push_str(&format!("Personality: {}\n", persona.personality.trim()));
        }
        if !persona.tone.trim().is_empty() {
            prompt.push_str(&format!("Tone: {}\n", persona.tone.trim()));
        }

        if !persona.voice_examples.is_empty() {
            prompt.push_str("\nThings you have written before (match this voice, length and emoji use):\n");
            for (idx, example) in persona.voice_examples.iter().enumerate() {
                prompt.push_str(&format!("{}. \"{}\"\n", idx + 1, example));
            }
        }

        if !persona.avoid_list.is_empty() {
            prompt.push_str("\nNever say or do the following:\n");
            for item in &persona.avoid_list {
                prompt.push_str(&format!("- {item}\n"));
            }
        }

        if let Some(signature) = persona.signature.as_deref().filter(|s| !s.trim().is_empty()) {
            prompt.push_str(&format!("\nSign off replies with: {}\n", signature.trim()));
        }

        prompt
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(4000) // Default max context length
    }
}

const ELLIPSIS: &str = "...";

/// Longest prefix of `s` within `max_bytes`, ending on a char boundary
fn clip_to_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// "speaker: text" lines, one per turn
#[must_use]
pub fn render_history(turns: &[ConversationTurn]) -> String {
    let mut rendered = String::new();
    for turn in turns {
        rendered.push_str(&format!("{}: {}\n", turn.sender_label, turn.text));
    }
    rendered
}
