//! Connection string parsing for SQL Server targets
//!
//! Splits an ADO.NET-style connection string (`Server=host,port;Database=db;...`)
//! into structured fields. Unrecognized keys are kept verbatim so they can be
//! passed through to SqlPackage untouched.

use std::collections::BTreeMap;

use thiserror::Error;

/// Default SQL Server TCP port
pub const DEFAULT_SQL_PORT: u16 = 1433;

/// Errors produced while parsing a connection string
#[derive(Error, Debug)]
pub enum ConnectionStringError {
    #[error("Malformed connection string field: {field}")]
    MalformedField { field: String },

    #[error("Non-numeric port in server address: {server}")]
    MalformedPort { server: String },

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: &'static str },
}

/// Structured fields of a SQL Server connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    /// Server hostname, with any `,port` suffix already split off
    pub server: String,
    /// TCP port, defaulting to 1433 when the server field carries none
    pub port: u16,
    pub database: String,
    pub user_id: String,
    pub password: String,
    /// Unrecognized fields, preserved verbatim for passthrough
    pub raw_fields: BTreeMap<String, String>,
}

impl ConnectionParameters {
    /// Parse an ADO.NET-style connection string.
    ///
    /// Fields are separated by `;`, keys from values by the first `=`.
    /// Recognized keys are matched case-insensitively; everything else lands
    /// in `raw_fields`.
    pub fn parse(raw: &str) -> Result<Self, ConnectionStringError> {
        let mut server: Option<String> = None;
        let mut database = String::new();
        let mut user_id = String::new();
        let mut password = String::new();
        let mut raw_fields = BTreeMap::new();

        for field in raw.split(';') {
            let field = field.trim();
            if field.is_empty() {
                continue;
            }

            let (key, value) = field.split_once('=').ok_or_else(|| {
                ConnectionStringError::MalformedField {
                    field: field.to_string(),
                }
            })?;
            let key = key.trim();
            let value = value.trim();

            if eq_any_ci(key, &["server", "address", "addr", "data source"]) {
                server = Some(value.to_string());
            } else if eq_any_ci(key, &["database", "initial catalog"]) {
                database = value.to_string();
            } else if eq_any_ci(key, &["user id", "uid", "user"]) {
                user_id = value.to_string();
            } else if eq_any_ci(key, &["password", "pwd"]) {
                password = value.to_string();
            } else {
                raw_fields.insert(key.to_string(), value.to_string());
            }
        }

        let server = server.ok_or(ConnectionStringError::MissingRequiredField {
            field: "server",
        })?;
        let (server, port) = split_server_address(&server)?;

        Ok(ConnectionParameters {
            server,
            port,
            database,
            user_id,
            password,
            raw_fields,
        })
    }

    /// Serialize back into a connection string.
    ///
    /// Re-parsing the result yields an equal `ConnectionParameters`.
    pub fn to_connection_string(&self) -> String {
        let mut out = if self.port == DEFAULT_SQL_PORT {
            format!("Server={}", self.server)
        } else {
            format!("Server={},{}", self.server, self.port)
        };
        if !self.database.is_empty() {
            out.push_str(&format!(";Database={}", self.database));
        }
        if !self.user_id.is_empty() {
            out.push_str(&format!(";User Id={}", self.user_id));
        }
        if !self.password.is_empty() {
            out.push_str(&format!(";Password={}", self.password));
        }
        for (key, value) in &self.raw_fields {
            out.push_str(&format!(";{}={}", key, value));
        }
        out
    }
}

/// Split a `host,port` server address into its parts.
///
/// Without a `,` separator the port defaults to 1433. Also used for
/// server-name overrides, which may embed a port the same way.
pub fn split_server_address(raw: &str) -> Result<(String, u16), ConnectionStringError> {
    match raw.split_once(',') {
        Some((host, port)) => {
            let port = port.trim().parse::<u16>().map_err(|_| {
                ConnectionStringError::MalformedPort {
                    server: raw.to_string(),
                }
            })?;
            Ok((host.trim().to_string(), port))
        }
        None => Ok((raw.trim().to_string(), DEFAULT_SQL_PORT)),
    }
}

fn eq_any_ci(key: &str, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| key.eq_ignore_ascii_case(c))
}
