//! # iza-runtime
//!
//! Container launching for the iza runtime: spawns the user command as
//! PID 1 of fresh PID/mount/UTS/IPC/network namespaces via `clone(2)`,
//! pivots its filesystem view into the assembled rootfs, confines it to
//! a cgroup scope when limits were requested, and guarantees teardown of
//! everything it allocated on every exit path.

pub mod container;
#[cfg(target_os = "linux")]
pub mod launcher;
