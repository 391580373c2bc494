use anyhow::Result;
use clap::Parser;

use rust_sqldeploy::{run_deploy, DeployOptions, RawInputs};

#[derive(Parser)]
#[command(name = "rust-sqldeploy")]
#[command(author, version, about = "Deploy SQL scripts, dacpacs and database projects to SQL Server")]
struct Cli {
    /// Full connection string for the target database
    #[arg(short, long)]
    connection_string: String,

    /// Server name or address, overriding the connection string's server
    #[arg(short, long)]
    server_name: Option<String>,

    /// Path to a pre-built .dacpac package to publish
    #[arg(short, long)]
    dacpac_package: Option<String>,

    /// Path to a .sql script to execute transactionally
    #[arg(short = 'f', long)]
    sql_file: Option<String>,

    /// Path to a .sqlproj database project to build and publish
    #[arg(short, long)]
    project_file: Option<String>,

    /// Arguments passed through to dotnet build
    #[arg(short, long)]
    build_arguments: Option<String>,

    /// Additional arguments passed through to SqlPackage
    #[arg(short, long)]
    arguments: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let options = DeployOptions {
        inputs: RawInputs {
            connection_string: cli.connection_string,
            server_name: cli.server_name,
            dacpac_package: cli.dacpac_package,
            sql_file: cli.sql_file,
            project_file: cli.project_file,
            build_arguments: cli.build_arguments,
            additional_arguments: cli.arguments,
        },
        verbose: cli.verbose,
    };

    run_deploy(options).await
}
