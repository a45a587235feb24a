use stepper_core::GitHubRepository;
use url::Url;

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Import(GitHubRepository),
    Export,
    Reset,
    Open(Url),
    Back,
    Forward,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CommandError(pub String);

pub const HELP: &str = "\
commands:
  import <namespace>/<repository>   start importing a GitHub repository
  export                            export the imported tables
  reset                             start over
  open <url>                        navigate to a (shared) wizard link
  back | forward                    walk the session history
  show                              print the current step and URL
  quit";

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();
    if words.next().is_some() {
        return Err(CommandError(format!("too many arguments for {verb}")));
    }

    let command = match (verb, argument) {
        ("import", Some(raw)) => Command::Import(parse_repository(raw)?),
        ("import", None) => {
            return Err(CommandError(
                "usage: import <namespace>/<repository>".to_string(),
            ))
        }
        ("export", None) => Command::Export,
        ("reset", None) => Command::Reset,
        ("open", Some(raw)) => Command::Open(
            Url::parse(raw).map_err(|err| CommandError(format!("bad url {raw}: {err}")))?,
        ),
        ("back", None) => Command::Back,
        ("forward", None) => Command::Forward,
        ("show", None) => Command::Show,
        ("help", None) => Command::Help,
        ("quit" | "exit", None) => Command::Quit,
        _ => return Err(CommandError(format!("unknown command: {}", line.trim()))),
    };
    Ok(Some(command))
}

fn parse_repository(raw: &str) -> Result<GitHubRepository, CommandError> {
    let raw = raw.trim_start_matches("https://github.com/").trim_end_matches('/');
    match raw.split_once('/') {
        Some((namespace, repository))
            if !namespace.is_empty() && !repository.is_empty() && !repository.contains('/') =>
        {
            Ok(GitHubRepository::new(namespace, repository))
        }
        _ => Err(CommandError(format!(
            "expected <namespace>/<repository>, got {raw}"
        ))),
    }
}
