use async_std::task;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::OperationError;
use crate::model::query::Query;
use crate::services::operation::Operation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub name: String,
    pub email: String,
}

impl User {
    fn new(id: u32, name: &str, email: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
        }
    }
}

static SAMPLE_USERS: Lazy<Vec<User>> = Lazy::new(|| {
    vec![
        User::new(1, "Leanne Graham", "sincere@april.biz"),
        User::new(2, "Ervin Howell", "shanna@melissa.tv"),
        User::new(3, "Clementine Bauch", "nathan@yesenia.net"),
        User::new(4, "Patricia Lebsack", "julianne.oconner@kory.org"),
        User::new(5, "Chelsey Dietrich", "lucio_hettinger@annie.ca"),
        User::new(6, "Dennis Schulist", "karley_dach@jasper.info"),
        User::new(7, "Kurtis Weissnat", "telly.hoeger@billy.biz"),
        User::new(8, "Nicholas Runolfsdottir", "sherwood@rosamond.me"),
        User::new(9, "Glenna Reichert", "chaim_mcdermott@dana.io"),
        User::new(10, "Clementina DuBuque", "rey.padberg@karina.biz"),
    ]
});

/// In-memory user list standing in for a remote search endpoint.
#[derive(Debug, Clone)]
pub struct Directory {
    users: Arc<Vec<User>>,
}

impl Directory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    pub fn sample() -> Self {
        Self::new(SAMPLE_USERS.clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Case-insensitive substring match on name or email.
    pub fn search(&self, query: &str) -> Vec<User> {
        let needle = query.trim().to_lowercase();
        self.users
            .iter()
            .filter(|user| {
                user.name.to_lowercase().contains(&needle)
                    || user.email.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// Search behind a simulated round trip of `latency`.
    pub fn operation(&self, latency: Duration) -> impl Operation<Vec<User>> {
        let directory = self.clone();
        move |query: Query| {
            let directory = directory.clone();
            async move {
                task::sleep(latency).await;
                let found = directory.search(&query);
                if found.is_empty() {
                    return Err(OperationError::status(404, "No results found"));
                }
                Ok(found)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn matches_name_and_email_case_insensitively() {
        let directory = Directory::sample();
        assert_eq!(directory.len(), 10);

        let names: Vec<_> = directory.search("CLEMENT").into_iter().map(|u| u.id).collect();
        assert_eq!(names, vec![3, 10]);

        let by_email = directory.search(".biz");
        assert_eq!(by_email.len(), 3);
    }

    #[test]
    fn blank_query_matches_everything() {
        let directory = Directory::sample();
        assert_eq!(directory.search("  ").len(), directory.len());
    }

    #[async_std::test]
    async fn operation_reports_empty_results_as_failure() {
        let op = Directory::sample().operation(Duration::from_millis(1));
        let err = op.perform(Query::from("zzz")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Status(404));
        assert_eq!(err.message, "No results found");

        let found = op.perform(Query::from("leanne")).await.unwrap();
        assert_eq!(found[0].name, "Leanne Graham");
    }
}
