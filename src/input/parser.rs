//! Turns raw chat text into an [`Intent`].
//!
//! Examples:
//!   "/guess asuka"                 -> Command(Verb::Guess, args=["asuka"])
//!   "/catch@catch_bot Asuka"       -> Command(Verb::Guess, args=["Asuka"])   (our bot)
//!   "/start@some_other_bot"        -> Ignored
//!   "/set-interval 30"             -> Command(Verb::SetInterval, args=["30"])
//!   "asuka!"                       -> Text("asuka!")

use once_cell::sync::Lazy;
use regex::Regex;

static COMMAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^/([A-Za-z0-9_-]+)(?:@([A-Za-z0-9_]+))?(?:\s+(.*))?$").expect("command regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Start,
    Help,
    Ping,
    Balance,
    Inventory,
    Guess,
    Pay,
    Top,
    GroupTop,
    /// Admin commands
    Spawn,
    SetInterval,
    Upload,
    Reload,
    /// Anything we don't know
    Custom(String),
}

impl Verb {
    pub fn parse(name: &str) -> Verb {
        let name = name.to_ascii_lowercase().replace('-', "_");
        match name.as_str() {
            "start" => Verb::Start,
            "help" => Verb::Help,
            "ping" => Verb::Ping,
            "balance" | "bal" => Verb::Balance,
            "inventory" | "harem" | "collection" => Verb::Inventory,
            "guess" | "catch" | "grab" => Verb::Guess,
            "pay" => Verb::Pay,
            "top" => Verb::Top,
            "ctop" => Verb::GroupTop,
            "spawn" => Verb::Spawn,
            "set_interval" | "setinterval" | "changetime" => Verb::SetInterval,
            "upload" => Verb::Upload,
            "reload" => Verb::Reload,
            _ => Verb::Custom(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Start => "start",
            Verb::Help => "help",
            Verb::Ping => "ping",
            Verb::Balance => "balance",
            Verb::Inventory => "inventory",
            Verb::Guess => "guess",
            Verb::Pay => "pay",
            Verb::Top => "top",
            Verb::GroupTop => "ctop",
            Verb::Spawn => "spawn",
            Verb::SetInterval => "set-interval",
            Verb::Upload => "upload",
            Verb::Reload => "reload",
            Verb::Custom(s) => s.as_str(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Verb::Spawn | Verb::SetInterval | Verb::Upload | Verb::Reload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    /// Whitespace separated arguments
    pub args: Vec<String>,
    /// Everything after the command word, trimmed
    pub rest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Command(Command),
    /// Plain chat message. Might be a guess.
    Text(String),
    /// Empty, or a command addressed to another bot
    Ignored,
}

pub fn parse_intent(input: &str, bot_username: Option<&str>) -> Intent {
    let text = input.trim();
    if text.is_empty() {
        return Intent::Ignored;
    }

    if !text.starts_with('/') {
        return Intent::Text(text.to_string());
    }

    let Some(caps) = COMMAND_RE.captures(text) else {
        // "/" on its own, "/ something", etc.
        return Intent::Text(text.to_string());
    };

    if let (Some(target), Some(ours)) = (caps.get(2), bot_username) {
        if !target.as_str().eq_ignore_ascii_case(ours.trim_start_matches('@')) {
            return Intent::Ignored;
        }
    }

    let rest = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("").to_string();
    let args = rest.split_whitespace().map(str::to_string).collect();

    Intent::Command(Command {
        verb: Verb::parse(&caps[1]),
        args,
        rest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(input: &str) -> Command {
        match parse_intent(input, Some("catch_bot")) {
            Intent::Command(c) => c,
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_is_text() {
        assert_eq!(parse_intent("  Asuka  ", None), Intent::Text("Asuka".into()));
        assert_eq!(parse_intent("   ", None), Intent::Ignored);
    }

    #[test]
    fn aliases_map_to_the_same_verb() {
        assert_eq!(command("/catch asuka").verb, Verb::Guess);
        assert_eq!(command("/grab asuka").verb, Verb::Guess);
        assert_eq!(command("/harem").verb, Verb::Inventory);
        assert_eq!(command("/changetime 10").verb, Verb::SetInterval);
        assert_eq!(command("/set-interval 10").verb, Verb::SetInterval);
        assert_eq!(command("/SET_INTERVAL 10").verb, Verb::SetInterval);
    }

    #[test]
    fn bot_suffix_is_handled() {
        let cmd = command("/guess@catch_bot Asuka Langley");
        assert_eq!(cmd.verb, Verb::Guess);
        assert_eq!(cmd.args, vec!["Asuka", "Langley"]);
        assert_eq!(cmd.rest, "Asuka Langley");

        assert_eq!(parse_intent("/guess@Catch_Bot x", Some("catch_bot")), parse_intent("/guess x", None));
        assert_eq!(parse_intent("/start@other_bot", Some("catch_bot")), Intent::Ignored);
    }

    #[test]
    fn unknown_commands_are_custom() {
        assert_eq!(command("/dance").verb, Verb::Custom("dance".into()));
        assert!(command("/dance").args.is_empty());
    }

    #[test]
    fn admin_verbs() {
        assert!(Verb::Upload.is_admin());
        assert!(!Verb::Guess.is_admin());
    }
}
