use std::ffi::OsString;
use std::process::{Command, Stdio};

/// Start a fresh copy of this program with the same arguments and stdio.
///
/// Used after hotkey bindings change so the dispatcher side picks them up.
/// The caller exits once this returns `Ok`.
pub fn spawn_replacement() -> std::io::Result<()> {
    let exe = std::env::current_exe()?;
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    tracing::info!("[Main] Relaunching {} {:?}", exe.display(), args);
    Command::new(exe)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;
    Ok(())
}

/// Relaunch and exit with code 0. Falls back to continuing if the spawn fails.
pub fn relaunch_and_exit() {
    match spawn_replacement() {
        Ok(()) => std::process::exit(0),
        Err(e) => tracing::error!("[Main] Relaunch failed, keeping this instance: {}", e),
    }
}
