//! Integration tests for container runtime operations.
//!
//! These tests are implemented in:
//! `crates/iza-runtime/tests/e2e_test.rs` and
//! `crates/iza-image/tests/store_test.rs`
//!
//! Covered scenarios:
//! - `pipeline_limit_strings_to_cgroup_values`: `--memory`/`--cpus` literals to cgroup values
//! - `pipeline_assemble_run_teardown_leaves_overlay_root_clean`: rootfs assembly/teardown residue
//! - `pipeline_writes_in_the_container_rootfs_do_not_touch_the_image`: image immutability
//! - `pipeline_failed_run_leaves_no_workspace_behind`: cleanup on setup failure
//! - `register_then_resolve_returns_rootfs_path`: image catalog registration
//! - `repeated_registration_replaces_the_record`: pull idempotence
//! - `failed_extraction_removes_the_partial_record`: no partially visible images
//! - `privileged_run_executes_a_command_in_a_real_rootfs`: full run (ignored; needs root)
