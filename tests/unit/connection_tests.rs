//! Unit tests for connection string parsing

use pretty_assertions::assert_eq;

use rust_sqldeploy::connection::{
    split_server_address, ConnectionParameters, ConnectionStringError, DEFAULT_SQL_PORT,
};

#[test]
fn test_parse_server_with_embedded_port() {
    let params = ConnectionParameters::parse(
        "Server=host,1433;Database=mydb;User Id=sa;Password=Password1",
    )
    .unwrap();

    assert_eq!(params.server, "host");
    assert_eq!(params.port, 1433);
    assert_eq!(params.database, "mydb");
    assert_eq!(params.user_id, "sa");
    assert_eq!(params.password, "Password1");
}

#[test]
fn test_parse_server_without_port_uses_default() {
    let params = ConnectionParameters::parse("Server=myserver;Database=db").unwrap();

    assert_eq!(params.server, "myserver");
    assert_eq!(params.port, DEFAULT_SQL_PORT);
}

#[test]
fn test_parse_non_default_port() {
    let params = ConnectionParameters::parse("Server=myserver,14330;Database=db").unwrap();

    assert_eq!(params.server, "myserver");
    assert_eq!(params.port, 14330);
}

#[test]
fn test_parse_key_aliases_are_case_insensitive() {
    let params = ConnectionParameters::parse(
        "DATA SOURCE=host;INITIAL CATALOG=db;UID=admin;PWD=secret",
    )
    .unwrap();

    assert_eq!(params.server, "host");
    assert_eq!(params.database, "db");
    assert_eq!(params.user_id, "admin");
    assert_eq!(params.password, "secret");
}

#[test]
fn test_parse_preserves_unknown_fields() {
    let params = ConnectionParameters::parse(
        "Server=host;Database=db;TrustServerCertificate=True;Encrypt=False",
    )
    .unwrap();

    assert_eq!(
        params.raw_fields.get("TrustServerCertificate").map(String::as_str),
        Some("True")
    );
    assert_eq!(
        params.raw_fields.get("Encrypt").map(String::as_str),
        Some("False")
    );
}

#[test]
fn test_parse_missing_server_fails() {
    let err = ConnectionParameters::parse("Database=db;User Id=sa").unwrap_err();

    assert!(matches!(
        err,
        ConnectionStringError::MissingRequiredField { field: "server" }
    ));
}

#[test]
fn test_parse_non_numeric_port_fails() {
    let err = ConnectionParameters::parse("Server=host,abc;Database=db").unwrap_err();

    assert!(matches!(err, ConnectionStringError::MalformedPort { .. }));
}

#[test]
fn test_parse_field_without_separator_fails() {
    let err = ConnectionParameters::parse("Server=host;garbage").unwrap_err();

    assert!(matches!(err, ConnectionStringError::MalformedField { .. }));
}

#[test]
fn test_parse_ignores_empty_fields() {
    // Trailing and doubled separators are tolerated
    let params = ConnectionParameters::parse("Server=host;;Database=db;").unwrap();

    assert_eq!(params.server, "host");
    assert_eq!(params.database, "db");
}

#[test]
fn test_split_server_address() {
    assert_eq!(
        split_server_address("host,1433").unwrap(),
        ("host".to_string(), 1433)
    );
    assert_eq!(
        split_server_address("host").unwrap(),
        ("host".to_string(), DEFAULT_SQL_PORT)
    );
    assert!(split_server_address("host,nope").is_err());
}

#[test]
fn test_connection_string_round_trip() {
    let original = ConnectionParameters::parse(
        "Server=host,14330;Database=db;User Id=sa;Password=pw;TrustServerCertificate=True",
    )
    .unwrap();

    let reparsed = ConnectionParameters::parse(&original.to_connection_string()).unwrap();
    assert_eq!(original, reparsed);
}

#[test]
fn test_round_trip_with_default_port() {
    let original = ConnectionParameters::parse("Server=host;Database=db").unwrap();

    let reparsed = ConnectionParameters::parse(&original.to_connection_string()).unwrap();
    assert_eq!(original, reparsed);
}
