use crate::error::{config_error, SyncResult};

/// Case-sensitive, OR-combined subject substrings that mark vacation events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> SyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(config_error("At least one vacation keyword is required"));
        }
        Ok(Self { keywords })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Local equivalent of the server-side `contains(subject, ..)` filter
    pub fn matches(&self, subject: &str) -> bool {
        self.keywords.iter().any(|k| subject.contains(k.as_str()))
    }

    /// `contains(subject,'Urlaub') or contains(subject,'Vacation') ...`
    pub fn odata_predicate(&self) -> String {
        self.keywords
            .iter()
            .map(|k| format!("contains(subject,{})", odata_string(k)))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// Quote an OData string literal, doubling embedded single quotes
pub fn odata_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
