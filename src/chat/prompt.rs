//! Prompt assembly.
//!
//! `PromptTemplate` is a single-pass `{var}` substituter: placeholders are
//! checked against the declared variable set when the template is built, so a
//! typo in a template text fails at startup rather than mid-request, and
//! substituted values are copied through verbatim - a question containing
//! `{context}` stays literal text.

use super::prompts;
use super::Language;
use crate::core::errors::ChatError;
use crate::llm::ChatMessage;

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: &'static str,
}

impl PromptTemplate {
    pub fn new(text: &'static str, variables: &[&'static str]) -> Result<Self, ChatError> {
        let found = scan_placeholders(text)?;
        for var in variables {
            if !found.iter().any(|f| f == var) {
                return Err(ChatError::Config(format!(
                    "prompt template is missing placeholder {{{}}}",
                    var
                )));
            }
        }
        for name in &found {
            if !variables.contains(&name.as_str()) {
                return Err(ChatError::Config(format!(
                    "prompt template has undeclared placeholder {{{}}}",
                    name
                )));
            }
        }
        Ok(Self { text })
    }

    /// Substitutes every placeholder in one pass over the template text.
    pub fn render(&self, values: &[(&str, &str)]) -> Result<String, ChatError> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                ChatError::Config("prompt template has an unclosed placeholder".to_string())
            })?;
            let name = &after[..end];
            let value = values
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| {
                    ChatError::Config(format!("no value supplied for placeholder {{{}}}", name))
                })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

fn scan_placeholders(text: &str) -> Result<Vec<String>, ChatError> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            ChatError::Config("prompt template has an unclosed placeholder".to_string())
        })?;
        let name = &after[..end];
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ChatError::Config(format!(
                "prompt template has a malformed placeholder {{{}}}",
                name
            )));
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    Ok(names)
}

/// Templates for one chain in one language.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub condense: PromptTemplate,
    pub system: PromptTemplate,
    pub qa: PromptTemplate,
}

/// All template sets, validated once at startup.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    plain_en: PromptSet,
    plain_zh: PromptSet,
    cite_en: PromptSet,
    cite_zh: PromptSet,
    search_query_en: PromptTemplate,
    search_query_zh: PromptTemplate,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, ChatError> {
        let history_and_question = ["chat_history", "question"];
        let plain_qa_vars = ["context", "chat_history", "question"];
        let cite_qa_vars = ["context", "materials", "chat_history", "question"];

        Ok(Self {
            plain_en: PromptSet {
                condense: PromptTemplate::new(prompts::CONDENSE_EN, &history_and_question)?,
                system: PromptTemplate::new(prompts::PLAIN_SYSTEM_EN, &[])?,
                qa: PromptTemplate::new(prompts::PLAIN_QA_EN, &plain_qa_vars)?,
            },
            plain_zh: PromptSet {
                condense: PromptTemplate::new(prompts::PLAIN_CONDENSE_ZH, &history_and_question)?,
                system: PromptTemplate::new(prompts::PLAIN_SYSTEM_ZH, &[])?,
                qa: PromptTemplate::new(prompts::PLAIN_QA_ZH, &plain_qa_vars)?,
            },
            cite_en: PromptSet {
                condense: PromptTemplate::new(prompts::CONDENSE_EN, &history_and_question)?,
                system: PromptTemplate::new(prompts::CITE_SYSTEM_EN, &["tools"])?,
                qa: PromptTemplate::new(prompts::CITE_QA_EN, &cite_qa_vars)?,
            },
            cite_zh: PromptSet {
                condense: PromptTemplate::new(prompts::CITE_CONDENSE_ZH, &history_and_question)?,
                system: PromptTemplate::new(prompts::CITE_SYSTEM_ZH, &["tools"])?,
                qa: PromptTemplate::new(prompts::CITE_QA_ZH, &cite_qa_vars)?,
            },
            search_query_en: PromptTemplate::new(prompts::SEARCH_QUERY_EN, &["question"])?,
            search_query_zh: PromptTemplate::new(prompts::SEARCH_QUERY_ZH, &["question"])?,
        })
    }

    pub fn plain(&self, language: Language) -> &PromptSet {
        match language {
            Language::English => &self.plain_en,
            Language::Chinese => &self.plain_zh,
        }
    }

    pub fn cite(&self, language: Language) -> &PromptSet {
        match language {
            Language::English => &self.cite_en,
            Language::Chinese => &self.cite_zh,
        }
    }

    pub fn search_query(&self, language: Language) -> &PromptTemplate {
        match language {
            Language::English => &self.search_query_en,
            Language::Chinese => &self.search_query_zh,
        }
    }
}

/// System + QA message pair for the plain chain.
pub fn plain_messages(
    set: &PromptSet,
    context: &str,
    chat_history: &str,
    question: &str,
) -> Result<Vec<ChatMessage>, ChatError> {
    let system = set.system.render(&[])?;
    let qa = set.qa.render(&[
        ("context", context),
        ("chat_history", chat_history),
        ("question", question),
    ])?;
    Ok(vec![ChatMessage::system(system), ChatMessage::user(qa)])
}

/// System (with tools and the decision protocol) + QA message pair for the
/// citation chain. The agent loop appends scratchpad messages after these.
pub fn cite_messages(
    set: &PromptSet,
    context: &str,
    materials: &str,
    chat_history: &str,
    question: &str,
    tool_descriptions: &str,
) -> Result<Vec<ChatMessage>, ChatError> {
    let system = set.system.render(&[("tools", tool_descriptions)])?;
    let system = format!("{}\n\n{}", system, prompts::DECISION_PROTOCOL);
    let qa = set.qa.render(&[
        ("context", context),
        ("materials", materials),
        ("chat_history", chat_history),
        ("question", question),
    ])?;
    Ok(vec![ChatMessage::system(system), ChatMessage::user(qa)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_all_placeholders() {
        let template = PromptTemplate::new("Q: {question} H: {chat_history}", &[
            "question",
            "chat_history",
        ])
        .unwrap();
        let out = template
            .render(&[("question", "what?"), ("chat_history", "none")])
            .unwrap();
        assert_eq!(out, "Q: what? H: none");
    }

    #[test]
    fn values_pass_through_verbatim() {
        let template = PromptTemplate::new("body: {question}", &["question"]).unwrap();
        let out = template
            .render(&[("question", "tell me about {context} literally")])
            .unwrap();
        // inserted text is never rescanned for placeholders
        assert_eq!(out, "body: tell me about {context} literally");
    }

    #[test]
    fn missing_declared_variable_fails_at_construction() {
        let err = PromptTemplate::new("no placeholders here", &["question"]).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn undeclared_placeholder_fails_at_construction() {
        let err = PromptTemplate::new("hello {surprise}", &[]).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn library_templates_all_validate() {
        PromptLibrary::new().unwrap();
    }

    #[test]
    fn assembly_is_byte_identical_across_calls() {
        let library = PromptLibrary::new().unwrap();
        let set = library.plain(Language::English);

        let first = plain_messages(set, "ctx", "Human: hi\nAssistant: hello", "what?").unwrap();
        let second = plain_messages(set, "ctx", "Human: hi\nAssistant: hello", "what?").unwrap();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.role, b.role);
            assert_eq!(a.content, b.content);
        }
    }

    #[test]
    fn cite_system_carries_tools_and_protocol() {
        let library = PromptLibrary::new().unwrap();
        let set = library.cite(Language::English);

        let messages = cite_messages(
            set,
            "ctx",
            "materials",
            "history",
            "what?",
            "web-search: searches the web",
        )
        .unwrap();

        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.contains("web-search: searches the web"));
        assert!(messages[0].content.contains("\"type\":\"tool_call\""));
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("<materials>"));
    }
}
