//! `ordo completions`: shell completion scripts.

use std::io::Write;

use clap::Args;
use clap_complete::{Shell, generate};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `args.shell` to `out`.
pub fn write_completions(args: &CompletionsArgs, command: &mut clap::Command, out: &mut dyn Write) {
    generate(args.shell, command, "ordo", out);
}

/// Execute `ordo completions`.
pub fn run_completions(args: &CompletionsArgs, command: &mut clap::Command) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(args, command, &mut out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[derive(Parser)]
    #[command(name = "ordo")]
    struct Wrapper {
        #[arg(long)]
        only: Vec<String>,
    }

    #[test]
    fn bash_script_mentions_binary_and_flags() {
        let args = CompletionsArgs { shell: Shell::Bash };
        let mut buf = Vec::new();
        write_completions(&args, &mut Wrapper::command(), &mut buf);

        let script = String::from_utf8(buf).expect("utf8");
        assert!(script.contains("ordo"));
        assert!(script.contains("--only"));
    }
}
