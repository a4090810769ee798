//! Session command line parsing.
//!
//! One command per line: a verb, then arguments. Term lists are
//! comma-separated because terms contain spaces (`pick best quality, 1girl`).

use std::str::FromStr;

use jumon_types::NodeId;
use strum::EnumString;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum Verb {
    #[strum(serialize = "pick", serialize = "add", serialize = "p")]
    Pick,
    #[strum(serialize = "drop", serialize = "rm", serialize = "d")]
    Drop,
    #[strum(serialize = "group", serialize = "g")]
    Group,
    #[strum(serialize = "ungroup", serialize = "ug")]
    Ungroup,
    #[strum(serialize = "weight", serialize = "w")]
    Weight,
    Import,
    #[strum(serialize = "show", serialize = "prompt")]
    Show,
    Tree,
    Clear,
    #[strum(serialize = "help", serialize = "?")]
    Help,
    #[strum(serialize = "quit", serialize = "exit", serialize = "q")]
    Quit,
}

/// What a weight command applies to.
#[derive(Clone, Debug, PartialEq)]
pub enum WeightTarget {
    /// A group id as shown by `tree` (`#7`).
    Node(NodeId),
    /// The outermost group holding this term.
    Term(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Pick(Vec<String>),
    Drop(Vec<String>),
    Group(Vec<String>),
    Ungroup(Vec<String>),
    Weight { target: WeightTarget, weight: Option<f64> },
    Import(String),
    Show,
    Tree { json: bool },
    Clear,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("unknown command `{0}`; try `help`")]
    UnknownVerb(String),
    #[error("`{verb}` needs {what}")]
    MissingArgument { verb: &'static str, what: &'static str },
    #[error("invalid weight `{0}`: expected a number or `none`")]
    InvalidWeight(String),
}

pub const HELP: &[&str] = &[
    "pick <term>[, <term>...]      select terms",
    "drop <term>[, <term>...]      unselect terms",
    "group <term>, <term>[, ...]   merge terms into one group",
    "ungroup <term>[, <term>...]   move terms back to the top level",
    "weight <#id|term> <n|none>    set or clear a group weight",
    "import <prompt text>          merge prompt text into the selection",
    "show                          print the composed prompt",
    "tree [--json]                 print the selection tree",
    "clear                         unselect everything",
    "quit                          leave the session",
];

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("# ") || line == "#" {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let verb = Verb::from_str(word).map_err(|_| CommandError::UnknownVerb(word.to_string()))?;

        let command = match verb {
            Verb::Pick => Command::Pick(terms(rest, "pick")?),
            Verb::Drop => Command::Drop(terms(rest, "drop")?),
            Verb::Group => Command::Group(terms(rest, "group")?),
            Verb::Ungroup => Command::Ungroup(terms(rest, "ungroup")?),
            Verb::Weight => parse_weight(rest)?,
            Verb::Import => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument { verb: "import", what: "prompt text" });
                }
                Command::Import(rest.to_string())
            }
            Verb::Show => Command::Show,
            Verb::Tree => Command::Tree { json: rest == "--json" },
            Verb::Clear => Command::Clear,
            Verb::Help => Command::Help,
            Verb::Quit => Command::Quit,
        };
        Ok(Some(command))
    }

    /// Whether the command can change the selection.
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Pick(_)
                | Command::Drop(_)
                | Command::Group(_)
                | Command::Ungroup(_)
                | Command::Weight { .. }
                | Command::Import(_)
                | Command::Clear
        )
    }
}

fn terms(rest: &str, verb: &'static str) -> Result<Vec<String>, CommandError> {
    let terms: Vec<String> = rest
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if terms.is_empty() {
        return Err(CommandError::MissingArgument { verb, what: "at least one term" });
    }
    Ok(terms)
}

fn parse_weight(rest: &str) -> Result<Command, CommandError> {
    let missing = CommandError::MissingArgument { verb: "weight", what: "a target and a value" };
    let (target, value) = rest.rsplit_once(char::is_whitespace).ok_or(missing)?;
    let target = target.trim();

    let weight = match value {
        "none" | "-" => None,
        number => match number.parse::<f64>() {
            Ok(w) if w.is_finite() => Some(w),
            _ => return Err(CommandError::InvalidWeight(number.to_string())),
        },
    };

    let target = match target.strip_prefix('#').and_then(|_| NodeId::from_str(target).ok()) {
        Some(id) => WeightTarget::Node(id),
        None => WeightTarget::Term(target.to_string()),
    };
    Ok(Command::Weight { target, weight })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# a note").unwrap(), None);
    }

    #[test]
    fn test_term_lists_split_on_commas() {
        assert_eq!(
            parse("pick best quality,  1girl ,"),
            Command::Pick(vec!["best quality".into(), "1girl".into()])
        );
        assert_eq!(parse("RM 傑作"), Command::Drop(vec!["傑作".into()]));
        assert_eq!(parse("g a, b"), Command::Group(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_missing_terms() {
        assert_eq!(
            Command::parse("pick").unwrap_err(),
            CommandError::MissingArgument { verb: "pick", what: "at least one term" }
        );
        assert!(matches!(Command::parse("import  "), Err(CommandError::MissingArgument { .. })));
    }

    #[test]
    fn test_weight_targets() {
        assert_eq!(
            parse("weight #7 1.3"),
            Command::Weight { target: WeightTarget::Node(NodeId::new(7)), weight: Some(1.3) }
        );
        assert_eq!(
            parse("w best quality none"),
            Command::Weight { target: WeightTarget::Term("best quality".into()), weight: None }
        );
        assert_eq!(
            Command::parse("weight #7 heavy").unwrap_err(),
            CommandError::InvalidWeight("heavy".into())
        );
        assert!(matches!(Command::parse("weight 1.2"), Err(CommandError::MissingArgument { .. })));
    }

    #[test]
    fn test_unknown_verb() {
        assert_eq!(
            Command::parse("frobnicate x").unwrap_err().to_string(),
            "unknown command `frobnicate`; try `help`"
        );
    }

    #[test]
    fn test_simple_verbs() {
        assert_eq!(parse("tree"), Command::Tree { json: false });
        assert_eq!(parse("tree --json"), Command::Tree { json: true });
        assert_eq!(parse("exit"), Command::Quit);
        assert_eq!(parse("?"), Command::Help);
        assert!(parse("clear").mutates());
        assert!(!parse("show").mutates());
    }
}
