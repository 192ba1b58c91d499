//! Shell selection and sanitized command construction.

use portable_pty::CommandBuilder;

/// The user's default shell.
///
/// - Unix: `$SHELL`, falls back to `/bin/sh`
/// - Windows: `$COMSPEC`, falls back to `cmd.exe`
pub fn default_shell() -> String {
    #[cfg(unix)]
    {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
    #[cfg(windows)]
    {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    }
}

/// Environment variables the remote shell inherits.
///
/// Everything else is dropped so server-side secrets never leak into a
/// session a remote peer controls.
const INHERITED_ENV: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "PATH",
    "TERM",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TMPDIR",
    "TMP",
    "TEMP",
    // Windows-specific
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "SYSTEMROOT",
    "COMSPEC",
    "HOMEDRIVE",
    "HOMEPATH",
];

/// Build the shell command with a scrubbed environment.
pub(crate) fn build_shell_command(shell: &str) -> CommandBuilder {
    let mut command = CommandBuilder::new(shell);

    command.env_clear();
    for key in INHERITED_ENV {
        if let Ok(value) = std::env::var(key) {
            command.env(key, value);
        }
    }
    command.env("TERM", "xterm-256color");

    // Login shell on Unix so profiles load.
    #[cfg(unix)]
    {
        command.arg("-l");
    }

    command
}
