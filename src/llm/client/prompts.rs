//! Prompt pairs and `{placeholder}` interpolation.

use std::collections::HashMap;

use super::LlmError;

/// Default system instruction for enrichment calls.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Default user instruction for enrichment calls.
pub const DEFAULT_USER_PROMPT: &str = "Tell me a fun fact about space.";

/// A system instruction plus a user instruction template.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
    /// Values for `{name}` placeholders in `user`. When present the template
    /// is always interpolated, so `{{` and `}}` must be used for literal braces.
    pub inputs: Option<HashMap<String, String>>,
}

impl PromptPair {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            inputs: None,
        }
    }

    pub fn with_inputs(mut self, inputs: HashMap<String, String>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Add a single placeholder value.
    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// The user instruction that is actually sent.
    pub fn render_user(&self) -> Result<String, LlmError> {
        match &self.inputs {
            Some(inputs) => interpolate(&self.user, inputs),
            None => Ok(self.user.clone()),
        }
    }
}

/// Replace every `{name}` in `template` with `inputs[name]`.
///
/// `{{` and `}}` produce literal braces. A placeholder without a value, an
/// empty `{}`, an unclosed `{` or a lone `}` is a `LlmError::Formatting`.
pub fn interpolate(template: &str, inputs: &HashMap<String, String>) -> Result<String, LlmError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let mut key = String::new();
                let mut closed = false;
                for (_, k) in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    key.push(k);
                }

                if !closed {
                    return Err(LlmError::Formatting(format!(
                        "unclosed '{{' at position {}",
                        pos
                    )));
                }
                if key.is_empty() {
                    return Err(LlmError::Formatting(format!(
                        "empty placeholder at position {}",
                        pos
                    )));
                }

                let value = inputs.get(&key).ok_or_else(|| {
                    LlmError::Formatting(format!("no value for placeholder '{}'", key))
                })?;
                out.push_str(value);
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(LlmError::Formatting(format!(
                        "single '}}' at position {}",
                        pos
                    )));
                }
            }
            other => out.push(other),
        }
    }

    Ok(out)
}
