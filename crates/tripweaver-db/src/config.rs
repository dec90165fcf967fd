/// Environment variable holding the PostgreSQL connection URL.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The connection URL used when nothing else is configured.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/tripweaver";

    /// Build a config from an explicit URL.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The database name: the last path segment of the URL, without any
    /// query string.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(head, _)| head);
        let (_, name) = without_query.rsplit_once('/')?;
        if name.is_empty() || name.contains(':') {
            None
        } else {
            Some(name)
        }
    }

    /// A URL for the `postgres` maintenance database on the same server,
    /// used to issue `CREATE DATABASE`.
    pub fn maintenance_url(&self) -> String {
        let (without_query, query) = match self.database_url.split_once('?') {
            Some((head, q)) => (head, Some(q)),
            None => (self.database_url.as_str(), None),
        };
        let mut url = match without_query.rfind('/') {
            Some(pos) => format!("{}/postgres", &without_query[..pos]),
            None => without_query.to_owned(),
        };
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }
        url
    }
}
