/// Stand-in when the persona is blank.
pub const DEFAULT_PERSONA: &str = "user";
/// Stand-in when the job-to-be-done is blank.
pub const DEFAULT_TASK: &str = "find the most relevant information";

pub const QUERY_COUNT: usize = 5;

/// Ordered paraphrases of one information need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet(Vec<String>);

impl QuerySet {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for QuerySet {
    fn from(queries: Vec<String>) -> Self {
        QuerySet(queries)
    }
}

/// Expand persona + task into five queries: statement, relevance question,
/// content question, extraction prompt, goal prompt. Both inputs appear
/// verbatim in every query.
pub fn expand(persona: &str, task: &str) -> QuerySet {
    let persona = non_blank(persona, DEFAULT_PERSONA);
    let task = non_blank(task, DEFAULT_TASK);

    QuerySet(vec![
        format!("You are a {} and your goal is to {}.", persona, task),
        format!("Which sections in the documents help a {} to {}?", persona, task),
        format!("What content should a {} use to {}?", persona, task),
        format!("Identify key suggestions, locations, or tips for a {}: {}", persona, task),
        format!("Find relevant sections for a {} to achieve the goal: {}", persona, task),
    ])
}

fn non_blank<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    if s.trim().is_empty() {
        fallback
    } else {
        s
    }
}
