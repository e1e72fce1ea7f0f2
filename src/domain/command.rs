use serde::{Deserialize, Serialize};

/// A stored shell command and the platform it applies to.
///
/// `id` is assigned by the store on insert. Any value a client sends on
/// create is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(default, alias = "Id")]
    pub id: i32,
    #[serde(default, alias = "HowTo")]
    pub how_to: String,
    #[serde(default, alias = "Platform")]
    pub platform: String,
    #[serde(default, alias = "CommandLine")]
    pub command_line: String,
}

/// The mutable fields of a command, staged for insertion before the store
/// has assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommand {
    pub how_to: String,
    pub platform: String,
    pub command_line: String,
}

impl NewCommand {
    pub fn with_id(self, id: i32) -> Command {
        Command {
            id,
            how_to: self.how_to,
            platform: self.platform,
            command_line: self.command_line,
        }
    }
}

impl From<Command> for NewCommand {
    fn from(command: Command) -> Self {
        Self {
            how_to: command.how_to,
            platform: command.platform,
            command_line: command.command_line,
        }
    }
}
