//! Action plan resolution
//!
//! Maps the raw deployment inputs onto exactly one typed plan: run a SQL
//! script, publish a pre-built dacpac, or build a database project and
//! publish the result. Artifact inputs are checked in a fixed priority order
//! (dacpac > sql-file > project-file), so a run that supplies one artifact
//! always resolves to the matching plan.

use std::path::PathBuf;

use crate::connection::ConnectionParameters;
use crate::diagnostics::Diagnostics;
use crate::error::DeployError;
use crate::sqlpackage::resolve_file_path;

const DACPAC_EXTENSION: &str = "dacpac";
const SQL_EXTENSION: &str = "sql";
const SQLPROJ_EXTENSION: &str = "sqlproj";

/// Raw, untyped deployment inputs as supplied by the caller
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub connection_string: String,
    pub server_name: Option<String>,
    pub dacpac_package: Option<String>,
    pub sql_file: Option<String>,
    pub project_file: Option<String>,
    pub build_arguments: Option<String>,
    pub additional_arguments: Option<String>,
}

/// SqlPackage verb used when publishing a dacpac
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlPackageAction {
    Publish,
    Script,
    DeployReport,
}

impl SqlPackageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlPackageAction::Publish => "Publish",
            SqlPackageAction::Script => "Script",
            SqlPackageAction::DeployReport => "DeployReport",
        }
    }
}

/// The resolved, validated deployment plan
///
/// Each variant carries only the fields meaningful to it; a plan with a
/// dacpac path but no publish action is unrepresentable.
#[derive(Debug, Clone)]
pub enum ActionPlan {
    /// Execute a raw SQL script inside a transaction
    Sql {
        server_name: String,
        connection: ConnectionParameters,
        sql_file: PathBuf,
        additional_arguments: Option<String>,
    },
    /// Publish a pre-built dacpac package
    Dacpac {
        server_name: String,
        connection: ConnectionParameters,
        dacpac_package: PathBuf,
        sqlpackage_action: SqlPackageAction,
        additional_arguments: Option<String>,
    },
    /// Build a database project, then publish the built dacpac
    ///
    /// The server name may still be absent here; it is required at publish
    /// time, after the build has produced an artifact.
    BuildAndPublish {
        server_name: Option<String>,
        connection: ConnectionParameters,
        project_file: PathBuf,
        build_arguments: Option<String>,
        additional_arguments: Option<String>,
    },
}

/// Resolve raw inputs into exactly one action plan.
pub fn resolve(inputs: &RawInputs, diagnostics: &dyn Diagnostics) -> Result<ActionPlan, DeployError> {
    let connection = ConnectionParameters::parse(&inputs.connection_string)?;

    // Effective server name: an explicit override wins over the connection
    // string's server, with a debug notice on conflict.
    let server_name = match inputs.server_name.as_deref().filter(|s| !s.is_empty()) {
        Some(override_name) => {
            if !connection.server.is_empty() && override_name != connection.server {
                diagnostics.debug(
                    "'server-name' is conflicting with 'server' property specified in the \
                     connection string. 'server-name' will take precedence.",
                );
            }
            Some(override_name.to_string())
        }
        None if connection.server.is_empty() => None,
        None => Some(connection.server.clone()),
    };

    if let Some(dacpac_package) = inputs.dacpac_package.as_deref().filter(|s| !s.is_empty()) {
        let dacpac_package = resolve_file_path(dacpac_package)?;
        require_extension(&dacpac_package, DACPAC_EXTENSION)?;
        let server_name = server_name.ok_or(DeployError::MissingServerName)?;

        return Ok(ActionPlan::Dacpac {
            server_name,
            connection,
            dacpac_package,
            sqlpackage_action: SqlPackageAction::Publish,
            additional_arguments: inputs.additional_arguments.clone(),
        });
    }

    if let Some(sql_file) = inputs.sql_file.as_deref().filter(|s| !s.is_empty()) {
        let sql_file = resolve_file_path(sql_file)?;
        require_extension(&sql_file, SQL_EXTENSION)?;
        let server_name = server_name.ok_or(DeployError::MissingServerName)?;

        return Ok(ActionPlan::Sql {
            server_name,
            connection,
            sql_file,
            additional_arguments: inputs.additional_arguments.clone(),
        });
    }

    if let Some(project_file) = inputs.project_file.as_deref().filter(|s| !s.is_empty()) {
        let project_file = resolve_file_path(project_file)?;
        require_extension(&project_file, SQLPROJ_EXTENSION)?;

        // Server name requirement is deferred to publish time for project
        // builds; the build step itself needs no target.
        return Ok(ActionPlan::BuildAndPublish {
            server_name,
            connection,
            project_file,
            build_arguments: inputs.build_arguments.clone(),
            additional_arguments: inputs.additional_arguments.clone(),
        });
    }

    Err(DeployError::NoArtifactSpecified)
}

fn require_extension(path: &PathBuf, expected: &'static str) -> Result<(), DeployError> {
    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(expected));

    if matches {
        Ok(())
    } else {
        Err(DeployError::InvalidArtifactExtension {
            path: path.clone(),
            expected,
        })
    }
}
