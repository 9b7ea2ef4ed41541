use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Raw input value captured for one operation attempt. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query(Arc<str>);

impl Query {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Deref for Query {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl From<&String> for Query {
    fn from(text: &String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection() {
        assert!(Query::from("").is_blank());
        assert!(Query::from("  \t\n").is_blank());
        assert!(!Query::from(" react ").is_blank());
    }

    #[test]
    fn keeps_text_verbatim() {
        let query = Query::from(String::from("  Re "));
        assert_eq!(query.as_str(), "  Re ");
        assert_eq!(query.len(), 5);
    }
}
