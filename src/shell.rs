//! Shell-safe command lines.
//!
//! Vendor CLIs are often installed as shell shims (`npm` wrappers, `.cmd`
//! files on Windows), so they are launched through the host shell. Every
//! argument, including the program, goes through the same escaping since
//! instruction text and paths can carry metacharacters too.

use std::borrow::Cow;

use tokio::process::Command;

/// Quoting rules of the shell used to launch the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellFamily {
    /// `sh -c`, single-quote escaping.
    Posix,
    /// `cmd /C`, double-quote escaping.
    Windows,
}

impl ShellFamily {
    /// The family of the platform we are running on.
    #[must_use]
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Posix
        }
    }
}

/// Escape one argument for the given shell.
#[must_use]
pub fn escape_arg(arg: &str, family: ShellFamily) -> String {
    match family {
        ShellFamily::Posix => shell_escape::unix::escape(Cow::Borrowed(arg)).into_owned(),
        ShellFamily::Windows => escape_windows(arg),
    }
}

/// Join a program and its arguments into one escaped command line.
#[must_use]
pub fn command_line(program: &str, args: &[String], family: ShellFamily) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|part| escape_arg(part, family))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a command that runs `program args...` through the host shell.
///
/// On Unix the line is prefixed with `exec` so the shell is replaced by the
/// program and termination signals reach it directly.
#[must_use]
pub fn shell_command(program: &str, args: &[String]) -> Command {
    let line = command_line(program, args, ShellFamily::host());
    build_shell_command(&line)
}

#[cfg(not(windows))]
fn build_shell_command(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(format!("exec {line}"));
    cmd
}

#[cfg(windows)]
fn build_shell_command(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/D", "/S", "/C"]).raw_arg(format!("\"{line}\""));
    cmd
}

/// Double-quote an argument following the MSVC argv rules.
///
/// `cmd` treats a newline as a command separator even inside quotes, so CR
/// and LF are collapsed to spaces first. `cmd` also expands `%VAR%` inside
/// quotes; each `%` is followed by `%cd:~,%`, which expands to nothing and
/// breaks any variable name.
fn escape_windows(arg: &str) -> String {
    let flattened = arg.replace("\r\n", " ").replace(['\r', '\n'], " ");

    let mut out = String::with_capacity(flattened.len() + 2);
    out.push('"');
    let mut backslashes = 0usize;
    for ch in flattened.chars() {
        match ch {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat('\\').take(backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            '%' => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                out.push_str("%%cd:~,%");
                backslashes = 0;
            }
            other => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                out.push(other);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat('\\').take(backslashes * 2));
    out.push('"');
    out
}
