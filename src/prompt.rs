//! Instruction prompt sent to the oracle for each article.

use crate::models::Article;
use crate::taxonomy::Taxonomy;

/// Built-in instruction. `{regions}` and `{categories}` are filled from the taxonomy.
pub const DEFAULT_PROMPT: &str = r#"You are a news analyst screening today's articles for a technology strategy team.

Decide whether the article is relevant to one of these categories: {categories}.
Relevant articles report concrete products, launches, funding, partnerships or policy
with real business impact. Politics, lifestyle, sports and general economy are not relevant.

If it is relevant:
- pick exactly one category from the list above,
- pick one region from: {regions},
- score its business value from 1 to 10.

Answer with a single JSON object and nothing else, for example:
{"keep": true, "category": "FinTech", "region": "Global", "score": 8}"#;

/// Renders the per-article prompt from an instruction template.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    instruction: String,
    max_content_words: usize,
}

impl PromptTemplate {
    pub fn new(template: Option<&str>, taxonomy: &Taxonomy, max_content_words: usize) -> Self {
        let instruction = template
            .unwrap_or(DEFAULT_PROMPT)
            .replace("{regions}", &taxonomy.regions.join(", "))
            .replace("{categories}", &taxonomy.categories.join(", "));
        Self {
            instruction: instruction.trim().to_string(),
            max_content_words,
        }
    }

    pub fn render(&self, article: &Article) -> String {
        let body = truncate_words(article.body().unwrap_or_default(), self.max_content_words);
        format!(
            "{}\n\nTitle: {}\n\nArticle Content:\n{}",
            self.instruction,
            article.title.trim(),
            body
        )
    }
}

/// Keep at most `max` whitespace-separated words, joined by single spaces.
pub fn truncate_words(text: &str, max: usize) -> String {
    text.split_whitespace().take(max).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy;

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one  two\nthree four", 3), "one two three");
        assert_eq!(truncate_words("short", 10), "short");
        assert_eq!(truncate_words("", 10), "");
    }

    #[test]
    fn test_default_prompt_lists_taxonomy() {
        let template = PromptTemplate::new(None, &taxonomy::sample(), 1000);
        let article = Article {
            title: " Bank launches AI assistant ".into(),
            content: Some("word ".repeat(2000)),
            ..Default::default()
        };
        let prompt = template.render(&article);
        assert!(prompt.contains("Startup, FinTech, Blockchain"));
        assert!(prompt.contains("Global, East Asia"));
        assert!(prompt.contains("Title: Bank launches AI assistant\n"));
        let content = prompt.split("Article Content:\n").nth(1).unwrap();
        assert_eq!(content.split_whitespace().count(), 1000);
    }

    #[test]
    fn test_custom_template() {
        let template = PromptTemplate::new(Some("Classify into {categories}."), &taxonomy::sample(), 5);
        let article = Article {
            title: "t".into(),
            description: Some("a b c d e f g".into()),
            ..Default::default()
        };
        assert_eq!(
            template.render(&article),
            "Classify into Startup, FinTech, Blockchain.\n\nTitle: t\n\nArticle Content:\na b c d e"
        );
    }
}
