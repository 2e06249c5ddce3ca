use std::fmt;

use crate::error::InvalidCommand;

/// Program name plus arguments for one dump. Never empty.
///
/// Arguments routinely carry credentials (`--password=...`), so neither
/// `Debug` nor `Display` print them.
#[derive(Clone, PartialEq, Eq)]
pub struct DumpCommand {
    tokens: Vec<String>,
}

impl DumpCommand {
    pub fn new<I, S>(tokens: I) -> Result<Self, InvalidCommand>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match tokens.first() {
            None => Err(InvalidCommand::new("empty command")),
            Some(program) if program.trim().is_empty() => {
                Err(InvalidCommand::new("empty program name"))
            }
            Some(_) => Ok(Self { tokens }),
        }
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for DumpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (+{} args)", self.program(), self.args().len())
    }
}

impl fmt::Debug for DumpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpCommand")
            .field("program", &self.program())
            .field("args", &self.args().len())
            .finish()
    }
}

/// Turns a source address into a dump command. Must not have side effects.
pub trait CommandBuilder: Send + Sync {
    fn build_command(&self, source: &str) -> Result<DumpCommand, InvalidCommand>;
}

impl<F> CommandBuilder for F
where
    F: Fn(&str) -> Result<DumpCommand, InvalidCommand> + Send + Sync,
{
    fn build_command(&self, source: &str) -> Result<DumpCommand, InvalidCommand> {
        self(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_token_list() {
        let err = DumpCommand::new(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.reason, "empty command");
        assert!(DumpCommand::new(["  ", "x"]).is_err());
    }

    #[test]
    fn splits_program_from_args() {
        let cmd = DumpCommand::new(["printf", "hello"]).unwrap();
        assert_eq!(cmd.program(), "printf");
        assert_eq!(cmd.args(), ["hello".to_string()]);
    }

    #[test]
    fn formatting_hides_arguments() {
        let cmd = DumpCommand::new(["mysqldump", "--password=secret", "db"]).unwrap();
        assert_eq!(cmd.to_string(), "mysqldump (+2 args)");
        assert!(!format!("{cmd:?}").contains("secret"));
    }

    #[test]
    fn closures_are_command_builders() {
        let builder = |source: &str| DumpCommand::new(["echo", source]);
        let cmd = builder.build_command("abc").unwrap();
        assert_eq!(cmd.tokens(), ["echo".to_string(), "abc".to_string()]);
    }
}
