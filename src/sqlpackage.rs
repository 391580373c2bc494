//! External collaborators: file resolution, project builds and SqlPackage
//!
//! Builds run through `dotnet build`; dacpac publishing goes through the
//! SqlPackage CLI. Both are opaque processes, invoked and checked for a zero
//! exit status.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::connection::ConnectionParameters;
use crate::diagnostics::Diagnostics;
use crate::error::DeployError;

/// Resolve a user-supplied file path or glob pattern to one absolute path.
///
/// Glob patterns must match exactly one file. Literal paths are absolutized
/// without an existence check; reading them later reports the failure.
pub fn resolve_file_path(input: &str) -> Result<PathBuf, DeployError> {
    if !input.contains(['*', '?', '[']) {
        return std::path::absolute(input).map_err(|e| DeployError::FileResolution {
            input: input.to_string(),
            message: e.to_string(),
        });
    }

    let matches: Vec<PathBuf> = glob::glob(input)
        .map_err(|e| DeployError::FileResolution {
            input: input.to_string(),
            message: e.to_string(),
        })?
        .filter_map(Result::ok)
        .collect();

    match matches.as_slice() {
        [single] => std::path::absolute(single).map_err(|e| DeployError::FileResolution {
            input: input.to_string(),
            message: e.to_string(),
        }),
        [] => Err(DeployError::FileResolution {
            input: input.to_string(),
            message: "no files found matching pattern".to_string(),
        }),
        _ => Err(DeployError::FileResolution {
            input: input.to_string(),
            message: format!("pattern matched {} files, expected exactly one", matches.len()),
        }),
    }
}

/// Locate the SqlPackage CLI: PATH first, then the .NET global tool location.
pub fn find_sqlpackage() -> Option<String> {
    if Command::new("sqlpackage")
        .arg("/version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
    {
        return Some("sqlpackage".to_string());
    }

    if let Ok(home) = std::env::var("HOME") {
        let dotnet_tool_path = format!("{}/.dotnet/tools/sqlpackage", home);
        if Command::new(&dotnet_tool_path)
            .arg("/version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
        {
            return Some(dotnet_tool_path);
        }
    }

    None
}

/// Build a database project with `dotnet build`, returning the built dacpac.
///
/// The dacpac lands at the SDK's default output path,
/// `bin/Debug/<project>.dacpac`.
pub fn build_project(
    project_file: &Path,
    build_arguments: Option<&str>,
    diagnostics: &dyn Diagnostics,
) -> Result<PathBuf, DeployError> {
    diagnostics.debug(&format!("Building project: {}", project_file.display()));

    let mut command = Command::new("dotnet");
    command.arg("build").arg(project_file);
    if let Some(args) = build_arguments {
        command.args(args.split_whitespace());
    }

    let output = command.output().map_err(|e| DeployError::BuildFailed {
        path: project_file.to_path_buf(),
        message: format!("failed to run dotnet build: {}", e),
    })?;

    if !output.status.success() {
        return Err(DeployError::BuildFailed {
            path: project_file.to_path_buf(),
            message: format!(
                "stdout: {}\nstderr: {}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    let project_dir = project_file.parent().unwrap_or(Path::new("."));
    let project_name = project_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let dacpac_path = project_dir
        .join("bin")
        .join("Debug")
        .join(format!("{}.dacpac", project_name));

    if !dacpac_path.exists() {
        return Err(DeployError::BuiltDacpacMissing { path: dacpac_path });
    }

    Ok(dacpac_path)
}

/// Publish a dacpac with SqlPackage against the effective server.
pub fn publish_dacpac(
    dacpac_package: &Path,
    action: &str,
    server_name: &str,
    connection: &ConnectionParameters,
    additional_arguments: Option<&str>,
    diagnostics: &dyn Diagnostics,
) -> Result<(), DeployError> {
    let sqlpackage = find_sqlpackage().ok_or(DeployError::SqlPackageNotFound)?;

    // The override wins: rebuild the connection string around the effective
    // server so SqlPackage targets the same host the resolver picked.
    let mut target = connection.clone();
    if server_name.contains(',') {
        let (host, port) = crate::connection::split_server_address(server_name)?;
        target.server = host;
        target.port = port;
    } else {
        target.server = server_name.to_string();
    }
    let connection_string = target.to_connection_string();

    diagnostics.debug(&format!(
        "Publishing {} to {}",
        dacpac_package.display(),
        target.server
    ));

    let mut command = Command::new(&sqlpackage);
    command
        .arg(format!("/Action:{}", action))
        .arg(format!("/SourceFile:{}", dacpac_package.display()))
        .arg(format!("/TargetConnectionString:{}", connection_string));
    if let Some(args) = additional_arguments {
        command.args(args.split_whitespace());
    }

    let output = command.output().map_err(|e| DeployError::PublishFailed {
        path: dacpac_package.to_path_buf(),
        message: format!("failed to run sqlpackage: {}", e),
    })?;

    if !output.status.success() {
        return Err(DeployError::PublishFailed {
            path: dacpac_package.to_path_buf(),
            message: format!(
                "stdout: {}\nstderr: {}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    Ok(())
}
