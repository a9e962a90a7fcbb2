//! Connection settings for a database server

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database connection settings
///
/// Typically resolved from a JSON environment variable:
///
/// ```
/// use cfgspec::{env_json, DatabaseConfig, EnvSpec};
///
/// let spec: EnvSpec<DatabaseConfig> = env_json("DATABASE");
/// # let _ = spec;
/// ```
///
/// The password is never serialized and is masked in `Display` and `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

impl DatabaseConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
            user: user.into(),
            password: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

impl fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.password {
            Some(_) => write!(
                f,
                "{}:****@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
            None => write!(
                f,
                "{}@{}:{}/{}",
                self.user, self.host, self.port, self.database
            ),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_masks_password() {
        let db = DatabaseConfig::new("db.internal", 5432, "orders", "svc").with_password("hunter2");
        assert_eq!(db.to_string(), "svc:****@db.internal:5432/orders");
        assert!(!format!("{:?}", db).contains("hunter2"));

        let db = DatabaseConfig::new("localhost", 5432, "orders", "dev");
        assert_eq!(db.to_string(), "dev@localhost:5432/orders");
    }

    #[test]
    fn test_deserialize_and_serialize() {
        let db: DatabaseConfig = serde_json::from_str(
            r#"{"host":"h","port":6543,"database":"d","user":"u","password":"p"}"#,
        )
        .unwrap();
        assert_eq!(db, DatabaseConfig::new("h", 6543, "d", "u").with_password("p"));

        let json = serde_json::to_value(&db).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"host": "h", "port": 6543, "database": "d", "user": "u"})
        );
    }
}
