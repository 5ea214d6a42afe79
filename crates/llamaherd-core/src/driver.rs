//! Driver argument vector construction.
//!
//! The argument shapes mirror what the llama.cpp binaries accept; note
//! that `llama-bench` spells the mmap switch differently (`-mmp 0`) and
//! controls context length through its own sweep flags, so the configured
//! context size is never forwarded to it.

use crate::config::{ExecutionMode, RunConfiguration};

/// System prompt passed to `llama-cli` conversation mode.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Build the full argument vector for the local driver process.
///
/// The first element is the program (`toolbox`); the rest are its
/// arguments. `backend_addr` is the comma-joined `host:port` list of
/// ready workers, in configuration order.
pub fn driver_command(config: &RunConfiguration, backend_addr: &str) -> Vec<String> {
    let mut argv: Vec<String> = vec![
        "toolbox".into(),
        "run".into(),
        "-c".into(),
        config.toolbox_image.clone(),
        "--".into(),
        config.mode.binary().into(),
        "-m".into(),
        config.model_path.to_string_lossy().into_owned(),
        "--rpc".into(),
        backend_addr.into(),
    ];

    match config.mode {
        ExecutionMode::Server => {
            argv.extend([
                "--no-mmap".into(),
                "-fa".into(),
                "1".into(),
                "--host".into(),
                "0.0.0.0".into(),
                "--port".into(),
                config.local_http_port.to_string(),
            ]);
            if let Some(ctx) = config.context_size {
                argv.extend(["-c".into(), ctx.to_string()]);
            }
        }
        ExecutionMode::Cli => {
            argv.extend([
                "--no-mmap".into(),
                "-fa".into(),
                "1".into(),
                "-cnv".into(),
                "-p".into(),
                DEFAULT_SYSTEM_PROMPT.into(),
            ]);
            if let Some(ctx) = config.context_size {
                argv.extend(["-c".into(), ctx.to_string()]);
            }
        }
        ExecutionMode::Bench => {
            argv.extend(["-mmp".into(), "0".into(), "-fa".into(), "1".into()]);
        }
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostEntry;

    fn config(mode: ExecutionMode, context_size: Option<u32>) -> RunConfiguration {
        RunConfiguration {
            model_path: "/models/llama-8b.gguf".into(),
            mode,
            context_size,
            toolbox_image: "llama-rocm7-nightlies".into(),
            hosts: vec![HostEntry::enabled("10.0.0.1")],
            local_http_port: 8080,
        }
    }

    fn has_flag_pair(argv: &[String], flag: &str, value: &str) -> bool {
        argv.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_base_arguments_shared_by_all_modes() {
        for mode in [
            ExecutionMode::Server,
            ExecutionMode::Cli,
            ExecutionMode::Bench,
        ] {
            let argv = driver_command(&config(mode, None), "10.0.0.1:50052");
            assert_eq!(argv[0], "toolbox");
            assert_eq!(argv[1], "run");
            assert!(has_flag_pair(&argv, "-c", "llama-rocm7-nightlies"));
            assert!(argv.contains(&mode.binary().to_string()));
            assert!(has_flag_pair(&argv, "-m", "/models/llama-8b.gguf"));
            assert!(has_flag_pair(&argv, "--rpc", "10.0.0.1:50052"));
        }
    }

    #[test]
    fn test_server_mode_binds_host_and_port() {
        let argv = driver_command(&config(ExecutionMode::Server, None), "10.0.0.1:50052");
        assert!(argv.contains(&"--no-mmap".to_string()));
        assert!(has_flag_pair(&argv, "-fa", "1"));
        assert!(has_flag_pair(&argv, "--host", "0.0.0.0"));
        assert!(has_flag_pair(&argv, "--port", "8080"));
    }

    #[test]
    fn test_cli_mode_forces_conversation_with_system_prompt() {
        let argv = driver_command(&config(ExecutionMode::Cli, None), "10.0.0.1:50052");
        assert!(argv.contains(&"-cnv".to_string()));
        assert!(has_flag_pair(&argv, "-p", DEFAULT_SYSTEM_PROMPT));
    }

    #[test]
    fn test_bench_mode_uses_its_own_mmap_flag() {
        let argv = driver_command(&config(ExecutionMode::Bench, None), "10.0.0.1:50052");
        assert!(has_flag_pair(&argv, "-mmp", "0"));
        assert!(!argv.contains(&"--no-mmap".to_string()));
    }

    #[test]
    fn test_context_size_forwarded_for_server_and_cli() {
        for mode in [ExecutionMode::Server, ExecutionMode::Cli] {
            let argv = driver_command(&config(mode, Some(8192)), "10.0.0.1:50052");
            assert!(has_flag_pair(&argv, "-c", "8192"), "mode {mode}");

            let argv = driver_command(&config(mode, None), "10.0.0.1:50052");
            assert!(!has_flag_pair(&argv, "-c", "8192"));
        }
    }

    #[test]
    fn test_context_size_never_forwarded_for_bench() {
        let argv = driver_command(&config(ExecutionMode::Bench, Some(8192)), "10.0.0.1:50052");
        assert!(!argv.contains(&"8192".to_string()));
    }
}
