//! rust-sqldeploy: A deployment helper for SQL Server databases
//!
//! This library executes a SQL artifact against a target server: a raw .sql
//! script run inside a transaction, a pre-built .dacpac published through
//! SqlPackage, or a .sqlproj database project built and then published.

pub mod action;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod sqlpackage;

use std::path::Path;

use anyhow::Result;

pub use action::{ActionPlan, RawInputs};
pub use connection::ConnectionParameters;
pub use error::DeployError;

use diagnostics::{ConsoleDiagnostics, Diagnostics};
use executor::TdsTransaction;

/// Options for running a deployment
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Raw inputs, resolved into exactly one action plan
    pub inputs: RawInputs,
    /// Enable verbose output
    pub verbose: bool,
}

/// Resolve the inputs and execute the resulting plan
pub async fn run_deploy(options: DeployOptions) -> Result<()> {
    let diagnostics = ConsoleDiagnostics {
        verbose: options.verbose,
    };

    // Step 1: Resolve raw inputs into a typed plan
    let plan = action::resolve(&options.inputs, &diagnostics)?;

    match plan {
        ActionPlan::Sql {
            server_name,
            connection,
            sql_file,
            ..
        } => {
            execute_sql_file(&server_name, &connection, &sql_file, &diagnostics).await?;
        }
        ActionPlan::Dacpac {
            server_name,
            connection,
            dacpac_package,
            sqlpackage_action,
            additional_arguments,
        } => {
            sqlpackage::publish_dacpac(
                &dacpac_package,
                sqlpackage_action.as_str(),
                &server_name,
                &connection,
                additional_arguments.as_deref(),
                &diagnostics,
            )?;
        }
        ActionPlan::BuildAndPublish {
            server_name,
            connection,
            project_file,
            build_arguments,
            additional_arguments,
        } => {
            // Step 2: Build the project, then publish like a plain dacpac.
            // The server name becomes mandatory here.
            let dacpac_package =
                sqlpackage::build_project(&project_file, build_arguments.as_deref(), &diagnostics)?;
            let server_name = server_name.ok_or(DeployError::MissingServerName)?;

            sqlpackage::publish_dacpac(
                &dacpac_package,
                action::SqlPackageAction::Publish.as_str(),
                &server_name,
                &connection,
                additional_arguments.as_deref(),
                &diagnostics,
            )?;
        }
    }

    Ok(())
}

/// Run a SQL script as one transactional batch against the target server.
async fn execute_sql_file(
    server_name: &str,
    connection: &ConnectionParameters,
    sql_file: &Path,
    diagnostics: &dyn Diagnostics,
) -> Result<(), DeployError> {
    let sql_text =
        std::fs::read_to_string(sql_file).map_err(|source| DeployError::SqlFileReadError {
            path: sql_file.to_path_buf(),
            source,
        })?;

    diagnostics.debug(&format!(
        "Executing {} against {}",
        sql_file.display(),
        server_name
    ));

    let mut handle = TdsTransaction::connect(server_name, connection).await?;
    let summary = executor::run_transaction(&mut handle, &sql_text).await?;

    diagnostics.debug(&format!(
        "Transaction committed ({} rows affected)",
        summary.rows_affected
    ));

    Ok(())
}
