//! Prompt templates for reply generation

use std::collections::HashMap;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let variables = extract_variables(&template);
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    ///
    /// Single pass over the template: inserted values are never re-scanned, so a
    /// value containing `{{name}}` is emitted verbatim. Unknown placeholders are kept.
    #[must_use]
    pub fn render(&self, values: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                result.push_str(&rest[start..]);
                return result;
            };
            let name = &after_open[..end];
            match values.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after_open[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Fill in the template from borrowed pairs
    #[must_use]
    pub fn render_with(&self, values: &[(&str, &str)]) -> String {
        let values: HashMap<String, String> = values
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.render(&values)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Extract variable names from template
fn extract_variables(template: &str) -> Vec<String> {
    let mut variables = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'{') {
            chars.next(); // skip second '{'
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == '}' {
                    chars.next();
                    if chars.peek() == Some(&'}') {
                        chars.next();
                        break;
                    }
                } else {
                    var_name.push(ch);
                    chars.next();
                }
            }
            if !var_name.is_empty() && !variables.contains(&var_name) {
                variables.push(var_name);
            }
        }
    }

    variables
}

/// Standard reply prompt templates
pub struct ReplyPrompts;

impl ReplyPrompts {
    /// Three drafts of increasing length as one JSON object
    #[must_use]
    pub fn three_drafts() -> PromptTemplate {
        PromptTemplate::new(
            r#"Fan message:
{{message}}

Write three different replies to this message, in your own voice:
- "short": exactly 1 sentence
- "medium": 2-3 sentences
- "detailed": 4-5 sentences

Each reply must stand on its own and read differently from the others, not only in length.
Respond with a JSON object and nothing else, in the form:
{"short": "...", "medium": "...", "detailed": "..."}"#,
        )
    }

    /// Exactly one reply of a given archetype
    #[must_use]
    pub fn single_draft() -> PromptTemplate {
        PromptTemplate::new(
            r"Fan message:
{{message}}

Write exactly one reply to this message, in your own voice. The reply should be {{archetype}}.
{{length_guidance}}
Respond with the reply text only: no quotes, no preamble, no alternatives.",
        )
    }

    /// System prompt for minimally rewriting a previously-sent reply
    #[must_use]
    pub fn adaptation_system() -> PromptTemplate {
        PromptTemplate::new(
            r"You are editing a reply that {{creator}} already sent to a similar question.
Change as little as possible. Keep the tone, punctuation, capitalization, emoji and sentence structure exactly as they are.
Only adjust names, pronouns or small details when it is strictly necessary for the reply to fit the new message.
If nothing needs to change, return the reply unchanged.

Voice reference: {{tone}}",
        )
    }

    /// User prompt for minimally rewriting a previously-sent reply
    #[must_use]
    pub fn adaptation_request() -> PromptTemplate {
        PromptTemplate::new(
            r"Previously sent reply:
{{memory}}

New fan message:
{{message}}

Return only the adapted reply text.",
        )
    }
}
