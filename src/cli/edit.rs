use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, bail, Context as _};

use crate::config::Config;

/// Terminal editors tried in order when `$EDITOR` is unset.
const PREFERRED_EDITORS: [&str; 4] = ["nano", "vim", "emacs", "vi"];

/// Open the configuration file in an editor, writing defaults first if needed.
pub fn open_config() -> anyhow::Result<()> {
    let path = Config::filepath()?;
    if !path.exists() {
        Config::default().save_to(&path)?;
        log::info!("Created default configuration at {}", path.display());
    }

    let lookup = |name: &str| which::which(name).ok();
    let (program, args) = editor_command(std::env::var("EDITOR").ok(), lookup).ok_or_else(|| {
        anyhow!(
            "no suitable editor found. Please set your $EDITOR environment variable \
             or install nano, vim, emacs, vi, or VS Code (code)"
        )
    })?;

    log::debug!("Opening {} with {}", path.display(), program.display());
    let status = Command::new(&program)
        .args(&args)
        .arg(&path)
        .status()
        .with_context(|| format!("failed to launch editor {}", program.display()))?;
    if !status.success() {
        bail!("editor {} exited with {status}", program.display());
    }
    Ok(())
}

/// Program and leading arguments used to edit a file.
///
/// `$EDITOR` wins and is split shell-style. VS Code always gets `--wait` so we
/// only return once the file is closed.
fn editor_command<L>(env_editor: Option<String>, lookup: L) -> Option<(PathBuf, Vec<String>)>
where
    L: Fn(&str) -> Option<PathBuf>,
{
    if let Some(words) = env_editor.as_deref().and_then(shlex::split) {
        if let Some((program, rest)) = words.split_first() {
            let program = PathBuf::from(program);
            let mut args = rest.to_vec();
            if is_vscode(&program) && !args.iter().any(|a| a == "--wait" || a == "-w") {
                args.push("--wait".to_owned());
            }
            return Some((program, args));
        }
    }

    if let Some(found) = PREFERRED_EDITORS.iter().find_map(|name| lookup(name)) {
        return Some((found, Vec::new()));
    }

    lookup("code").map(|code| (code, vec!["--wait".to_owned()]))
}

fn is_vscode(program: &Path) -> bool {
    program.file_stem().is_some_and(|stem| stem == "code")
}
