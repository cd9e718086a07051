//! Assembler and linker invocation

use crate::config::BuildOptions;
use log::info;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use tlc_common::error::ExitStatus;
use tlc_common::CompilerError;

/// Run `program` with `args`, turning a non-zero exit into
/// `CompilerError::Toolchain`
pub fn run_tool(program: &str, args: &[&OsStr]) -> Result<(), CompilerError> {
    info!("Running {} {:?}", program, args);
    let status = Command::new(program).args(args).status().map_err(|e| CompilerError::Io {
        message: format!("cannot run '{}': {}", program, e),
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(CompilerError::Toolchain {
            tool: program.to_string(),
            status: ExitStatus(status.code()),
        })
    }
}

/// Assemble `assembly` to an object file next to it, then link it with the
/// runtime into an executable. Returns the executable path.
pub fn build_executable(assembly: &Path, options: &BuildOptions) -> Result<PathBuf, CompilerError> {
    let object = assembly.with_extension("o");
    let executable = options
        .output
        .clone()
        .unwrap_or_else(|| assembly.with_extension(""));

    run_tool(
        &options.assembler,
        &[assembly.as_os_str(), OsStr::new("-o"), object.as_os_str()],
    )?;

    let mut link_args = vec![object.as_os_str()];
    link_args.extend(options.runtime.iter().map(|p| p.as_os_str()));
    link_args.push(OsStr::new("-o"));
    link_args.push(executable.as_os_str());
    run_tool(&options.linker, &link_args)?;

    info!("Built {}", executable.display());
    Ok(executable)
}
