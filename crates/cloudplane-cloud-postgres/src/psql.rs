//! psql CLI wrapper
//!
//! Runs catalog queries through the `psql` binary in unaligned,
//! tuples-only mode and parses the line-per-row output.

use crate::credentials::PostgresCredentials;
use crate::error::{PgError, Result};
use std::process::Stdio;
use tokio::process::Command;

/// psql wrapper bound to one server.
#[derive(Debug)]
pub struct Psql {
    credentials: PostgresCredentials,
}

impl Psql {
    pub fn new(credentials: PostgresCredentials) -> Self {
        Self { credentials }
    }

    /// Arguments for one query invocation.
    fn args(&self, sql: &str) -> Vec<String> {
        vec![
            "--host".to_string(),
            self.credentials.host.clone(),
            "--port".to_string(),
            self.credentials.port.to_string(),
            "--username".to_string(),
            self.credentials.username.clone(),
            "--dbname".to_string(),
            self.credentials.database.clone(),
            "--tuples-only".to_string(),
            "--no-align".to_string(),
            "--command".to_string(),
            sql.to_string(),
        ]
    }

    /// Run a query and return one string per row.
    pub async fn query(&self, sql: &str) -> Result<Vec<String>> {
        let args = self.args(sql);
        tracing::debug!("Running: psql {}", args.join(" "));

        let mut cmd = Command::new("psql");
        cmd.args(&args);
        // psql reads the password from the environment, never from argv.
        cmd.env("PGPASSWORD", &self.credentials.password);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PgError::PsqlNotFound
            } else {
                PgError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PgError::CommandFailed(stderr.to_string()));
        }

        Ok(parse_rows(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Lightweight connection check.
    pub async fn check_connection(&self) -> Result<()> {
        self.query("SELECT 1").await?;
        Ok(())
    }

    /// Non-template databases on the server.
    pub async fn list_databases(&self, name_like: Option<&str>) -> Result<Vec<String>> {
        let mut sql =
            "SELECT datname FROM pg_database WHERE datistemplate = false".to_string();
        if let Some(pattern) = name_like {
            sql.push_str(&format!(
                " AND datname LIKE '%{}%'",
                escape_like(pattern)
            ));
        }
        sql.push_str(" ORDER BY datname");
        self.query(&sql).await
    }

    /// Login roles on the server.
    pub async fn list_roles(&self, name_like: Option<&str>) -> Result<Vec<String>> {
        let mut sql = "SELECT usename FROM pg_catalog.pg_user".to_string();
        if let Some(pattern) = name_like {
            sql.push_str(&format!(" WHERE usename LIKE '%{}%'", escape_like(pattern)));
        }
        sql.push_str(" ORDER BY usename");
        self.query(&sql).await
    }
}

/// Split tuples-only output into trimmed, non-empty rows.
fn parse_rows(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Escape quotes and LIKE metacharacters in a user-supplied pattern.
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\'', "''")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> PostgresCredentials {
        PostgresCredentials {
            host: "db.internal".to_string(),
            port: 5432,
            username: "admin".to_string(),
            password: "pw".to_string(),
            database: "postgres".to_string(),
        }
    }

    #[test]
    fn args_never_carry_the_password() {
        let psql = Psql::new(credentials());
        let args = psql.args("SELECT 1");
        assert!(args.iter().all(|a| a != "pw"));
        assert!(args.contains(&"--tuples-only".to_string()));
        assert!(args.contains(&"--no-align".to_string()));
    }

    #[test]
    fn rows_parse_from_tuples_output() {
        let rows = parse_rows("app\n  analytics  \n\npostgres\n");
        assert_eq!(rows, vec!["app", "analytics", "postgres"]);
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("it's_50%"), "it''s\\_50\\%");
    }
}
