//! `iza run` — Execute a command inside an isolated container.

use clap::Args;

use iza_common::config::IzaConfig;
use iza_common::constants::DEFAULT_COMMAND;
use iza_common::limits::{parse_cpu_limit, parse_memory_limit};
use iza_common::types::ResourceLimits;
use iza_core::namespace::NamespaceConfig;
use iza_image::reference::ImageReference;
use iza_image::store::ImageStore;
use iza_runtime::container::{ContainerInstance, RunConfig};

const USAGE_HINT: &str = "Usage: iza run [--memory LIMIT] [--cpus LIMIT] IMAGE [COMMAND ARGS...]";

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Memory limit (e.g. 100m, 1g).
    #[arg(long, value_name = "LIMIT")]
    pub memory: Option<String>,

    /// CPU limit in cores (e.g. 0.5, 2).
    #[arg(long, value_name = "LIMIT")]
    pub cpus: Option<String>,

    /// Image reference followed by the command and its arguments.
    #[arg(
        value_name = "IMAGE [COMMAND ARGS...]",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required = true
    )]
    pub args: Vec<String>,
}

/// Executes the `run` command.
///
/// The container's exit code becomes the process exit code, so this
/// only returns to the caller on setup failure.
///
/// # Errors
///
/// Returns an error for unparseable limits, an unresolvable image, or a
/// launch failure.
pub fn execute(args: RunArgs) -> anyhow::Result<()> {
    // limits parse before anything touches the filesystem
    let limits = ResourceLimits {
        memory_bytes: args
            .memory
            .as_deref()
            .map(parse_memory_limit)
            .transpose()
            .map_err(|e| anyhow::anyhow!("{e}\n{USAGE_HINT}"))?,
        cpu: args
            .cpus
            .as_deref()
            .map(parse_cpu_limit)
            .transpose()
            .map_err(|e| anyhow::anyhow!("{e}\n{USAGE_HINT}"))?,
    };

    let config = IzaConfig::default();
    let store = ImageStore::with_defaults();

    let Some((image, command)) = split_image_and_command(&args.args, |candidate| {
        ImageReference::parse(candidate)
            .ok()
            .and_then(|r| store.resolve(&r))
            .is_some()
    }) else {
        return Err(anyhow::anyhow!(
            "'{}' is neither a tagged image reference nor a locally available image.\n\
             Pull one first (e.g. `iza pull alpine:3.18`), then: {USAGE_HINT}",
            args.args.first().map_or("", String::as_str)
        ));
    };

    let reference = ImageReference::parse(&image)?;
    let Some(image_rootfs) = store.resolve(&reference) else {
        return Err(anyhow::anyhow!(
            "image '{reference}' not found locally. Pull it first: iza pull {reference}"
        ));
    };

    // keep the parent alive through an interrupt so the child gets
    // reaped and cleanup runs; the terminal delivers SIGINT to the
    // child's process group on its own
    if let Err(e) = ctrlc::set_handler(|| {
        tracing::debug!("interrupt received; waiting for the container to exit");
    }) {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let run_config = RunConfig {
        image_rootfs,
        overlay_root: config.overlay_dir,
        limits,
        command,
        namespaces: NamespaceConfig::default(),
    };
    let code = ContainerInstance::new().run(&run_config)?;

    std::process::exit(code);
}

/// Splits the positional arguments into an image reference and the
/// command to run.
///
/// The first token is the image iff it contains a colon or resolves to
/// a local image; an image with no trailing command gets the default
/// shell. Returns `None` when the first token cannot name an image.
fn split_image_and_command<F>(args: &[String], resolves_locally: F) -> Option<(String, Vec<String>)>
where
    F: Fn(&str) -> bool,
{
    let first = args.first()?;
    if !first.contains(':') && !resolves_locally(first) {
        return None;
    }

    let command = if args.len() > 1 {
        args[1..].to_vec()
    } else {
        vec![DEFAULT_COMMAND.to_owned()]
    };
    Some((first.clone(), command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn colon_tagged_first_token_is_the_image() {
        let (image, command) =
            split_image_and_command(&strings(&["alpine:3.18", "/bin/sh", "-c", "echo hi"]), |_| {
                false
            })
            .unwrap();
        assert_eq!(image, "alpine:3.18");
        assert_eq!(command, strings(&["/bin/sh", "-c", "echo hi"]));
    }

    #[test]
    fn locally_resolvable_token_is_the_image() {
        let (image, command) =
            split_image_and_command(&strings(&["ubuntu", "/bin/ls"]), |c| c == "ubuntu").unwrap();
        assert_eq!(image, "ubuntu");
        assert_eq!(command, strings(&["/bin/ls"]));
    }

    #[test]
    fn image_alone_defaults_to_a_shell() {
        let (image, command) =
            split_image_and_command(&strings(&["alpine:3.18"]), |_| false).unwrap();
        assert_eq!(image, "alpine:3.18");
        assert_eq!(command, strings(&["/bin/bash"]));
    }

    #[test]
    fn unresolvable_first_token_is_not_an_image() {
        assert!(split_image_and_command(&strings(&["/bin/ls", "-la"]), |_| false).is_none());
    }

    #[test]
    fn empty_args_yield_nothing() {
        assert!(split_image_and_command(&[], |_| true).is_none());
    }
}
