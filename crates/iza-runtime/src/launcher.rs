//! Namespace-isolated process creation.
//!
//! The parent clones the child directly into its namespaces with a
//! caller-provided flag set, then synchronizes with it solely through
//! `waitpid`. The child entry function runs as PID 1 of the new PID
//! namespace: it sets the container hostname, chroots into the assembled
//! rootfs, mounts the pseudo-filesystems, and execs the user command.

use std::ffi::{CStr, CString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::mount::{mount, MsFlags};
use nix::sched::clone;
use nix::sys::prctl;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{chdir, chroot, execv, sethostname, Pid};

use iza_common::constants::{CHILD_STACK_SIZE, CONTAINER_HOSTNAME};
use iza_common::error::{IzaError, Result};
use iza_core::namespace::NamespaceConfig;

/// Clones the container child into fresh namespaces.
///
/// Returns as soon as the child exists so the caller can attach it to a
/// cgroup before it reaches the user command. The argument vector is
/// passed through whole: `command[0]` is both the program to exec and
/// `argv[0]`.
///
/// # Errors
///
/// Returns an error if the command is empty, contains an interior NUL
/// byte, or if the `clone(2)` syscall fails.
pub fn spawn(rootfs: &Path, command: &[String], namespaces: &NamespaceConfig) -> Result<Pid> {
    let program = command.first().ok_or_else(|| IzaError::Config {
        message: "no command to execute".into(),
    })?;
    let program = to_cstring(program)?;
    let argv = command
        .iter()
        .map(|arg| to_cstring(arg))
        .collect::<Result<Vec<_>>>()?;
    let rootfs_c = to_cstring_path(rootfs)?;

    let mut stack = vec![0u8; CHILD_STACK_SIZE];
    let flags = namespaces.clone_flags();

    tracing::debug!(?flags, rootfs = %rootfs.display(), "cloning container child");
    let child = Box::new(|| child_main(&rootfs_c, &program, &argv));

    // SAFETY: the child callback only touches data cloned into the new
    // process image and never returns to the caller's frame.
    let pid = unsafe { clone(child, &mut stack, flags, Some(Signal::SIGCHLD as i32)) }.map_err(
        |e| IzaError::PermissionDenied {
            message: format!("clone failed: {e} (creating namespaces requires root)"),
        },
    )?;

    tracing::info!(pid = pid.as_raw(), "container child started");
    Ok(pid)
}

/// Blocks until the child exits and translates its wait status.
///
/// Interrupted waits are retried, so a signal handler firing in the
/// parent does not abandon the child.
///
/// # Errors
///
/// Returns an error if `waitpid(2)` itself fails.
pub fn wait_for_exit(pid: Pid) -> Result<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = exit_code(&status) {
                    return Ok(code);
                }
            }
            Err(nix::errno::Errno::EINTR) => {}
            Err(e) => {
                return Err(IzaError::Config {
                    message: format!("waitpid failed: {e}"),
                });
            }
        }
    }
}

/// Maps a terminal wait status to the runtime's exit code: the child's
/// own code for a normal exit, `128 + N` for death by signal N.
#[must_use]
pub fn exit_code(status: &WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(*code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + *signal as i32),
        _ => None,
    }
}

/// Entry function of the cloned child, running as PID 1 of the new PID
/// namespace in a mount namespace copied from the parent.
///
/// Failures before the exec are reported on stderr; the parent surfaces
/// the resulting non-zero status. The `/proc` and `/tmp` mounts are
/// best-effort: a rootfs without those directories still runs.
#[allow(clippy::print_stderr)]
fn child_main(rootfs: &CStr, program: &CStr, argv: &[CString]) -> isize {
    // die with the parent rather than outliving the runtime
    if let Err(e) = prctl::set_pdeathsig(Signal::SIGKILL) {
        eprintln!("iza: set parent-death signal: {e}");
    }

    if let Err(e) = sethostname(CONTAINER_HOSTNAME) {
        eprintln!("iza: sethostname: {e}");
    }

    if let Err(e) = chroot(rootfs) {
        eprintln!("iza: chroot: {e}");
        return 1;
    }
    if let Err(e) = chdir("/") {
        eprintln!("iza: chdir /: {e}");
        return 1;
    }

    if let Err(e) = mount(Some("proc"), "/proc", Some("proc"), MsFlags::empty(), None::<&str>) {
        eprintln!("iza: mount /proc: {e}");
    }
    if let Err(e) = mount(
        Some("tmpfs"),
        "/tmp",
        Some("tmpfs"),
        MsFlags::empty(),
        None::<&str>,
    ) {
        eprintln!("iza: mount /tmp: {e}");
    }

    match execv(program, argv) {
        Ok(_) => unreachable!(),
        Err(e) => {
            eprintln!("iza: exec {}: {e}", program.to_string_lossy());
            127
        }
    }
}

fn to_cstring(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| IzaError::Config {
        message: format!("argument contains a NUL byte: {s:?}"),
    })
}

fn to_cstring_path(path: &Path) -> Result<CString> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| IzaError::Config {
        message: format!("path contains a NUL byte: {}", path.display()),
    })
}
