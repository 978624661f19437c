//! Command-line option parsing.
//!
//! Options are declared once in [`SCHEMA`]. Each entry says whether it is a
//! boolean toggle or carries a string value, and which single-character
//! shortcut (if any) aliases it. Parsing never stops at a malformed token: it
//! records a [`Diagnostic`] and carries on with the next token so a single run
//! reports as many problems as possible. Printing the diagnostics is up to the
//! caller.

use std::fmt;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Flag,
    Value,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub shortcut: Option<char>,
    pub kind: OptionKind,
    pub help: &'static str,
}

pub const SCHEMA: &[OptionSpec] = &[
    OptionSpec {
        name: "target",
        shortcut: Some('t'),
        kind: OptionKind::Value,
        help: "target platform: opengl, opengles2 or opengles3 (default: opengl)",
    },
    OptionSpec {
        name: "output",
        shortcut: Some('o'),
        kind: OptionKind::Value,
        help: "output file",
    },
    OptionSpec {
        name: "cheader",
        shortcut: None,
        kind: OptionKind::Value,
        help: "emit a C header defining the shader as a string named <value>",
    },
    OptionSpec {
        name: "fs",
        shortcut: None,
        kind: OptionKind::Flag,
        help: "treat the input as a fragment shader",
    },
    OptionSpec {
        name: "vs",
        shortcut: None,
        kind: OptionKind::Flag,
        help: "treat the input as a vertex shader",
    },
    OptionSpec {
        name: "version",
        shortcut: None,
        kind: OptionKind::Flag,
        help: "print the version and exit",
    },
    OptionSpec {
        name: "help",
        shortcut: None,
        kind: OptionKind::Flag,
        help: "print this help and exit",
    },
];

fn find_option(name: &str) -> Option<usize> {
    SCHEMA.iter().position(|spec| spec.name == name)
}

fn resolve_shortcut(c: char) -> Option<&'static str> {
    SCHEMA
        .iter()
        .find(|spec| spec.shortcut == Some(c))
        .map(|spec| spec.name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Flag(bool),
    Value(Option<String>),
}

impl OptionValue {
    fn unset(kind: OptionKind) -> Self {
        match kind {
            OptionKind::Flag => OptionValue::Flag(false),
            OptionKind::Value => OptionValue::Value(None),
        }
    }
}

/// Current value of every option in [`SCHEMA`], in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    values: Vec<OptionValue>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            values: SCHEMA.iter().map(|spec| OptionValue::unset(spec.kind)).collect(),
        }
    }
}

impl Options {
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        find_option(name).map(|index| &self.values[index])
    }

    /// Whether a flag option was given. Unknown names and value options are `false`.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(OptionValue::Flag(true)))
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(OptionValue::Value(Some(value))) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.value("target")
    }

    pub fn output(&self) -> Option<&str> {
        self.value("output")
    }

    pub fn cheader(&self) -> Option<&str> {
        self.value("cheader")
    }

    pub fn fs(&self) -> bool {
        self.flag("fs")
    }

    pub fn vs(&self) -> bool {
        self.flag("vs")
    }

    pub fn version(&self) -> bool {
        self.flag("version")
    }

    pub fn help(&self) -> bool {
        self.flag("help")
    }
}

/// A problem with a single token. None of these stop parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnknownShortcut(String),
    UnknownOption(String),
    DuplicateFlag(String),
    MissingValue(String),
    Overwritten(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownShortcut(c) => write!(f, "unknown option -{}.", c),
            Diagnostic::UnknownOption(name) => write!(f, "unknown option --{}.", name),
            Diagnostic::DuplicateFlag(name) => write!(f, "multiple --{} defined.", name),
            Diagnostic::MissingValue(name) => {
                write!(f, "--{} needs value. but not defined.", name)
            }
            Diagnostic::Overwritten(name) => {
                write!(f, "multiple {} defined. previous one will be ignored.", name)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    pub options: Options,
    pub inputs: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

fn report(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    debug!("argument diagnostic: {:?}", diagnostic);
    diagnostics.push(diagnostic);
}

/// Parses `tokens` (the program name already stripped).
pub fn parse_args<I, S>(tokens: I) -> ParsedArgs
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    let mut parsed = ParsedArgs::default();

    let mut i = 0;
    while i < tokens.len() {
        let arg = &tokens[i];
        i += 1;

        let Some(rest) = arg.strip_prefix('-') else {
            parsed.inputs.push(arg.clone());
            continue;
        };

        let (key, inline) = match rest.strip_prefix('-') {
            Some(long) => (long, ""),
            None => {
                let mut chars = rest.chars();
                let short = chars.next();
                match short.and_then(resolve_shortcut) {
                    Some(name) => (name, chars.as_str()),
                    None => {
                        let shown = short.map(String::from).unwrap_or_default();
                        report(&mut parsed.diagnostics, Diagnostic::UnknownShortcut(shown));
                        continue;
                    }
                }
            }
        };

        let Some(index) = find_option(key) else {
            report(
                &mut parsed.diagnostics,
                Diagnostic::UnknownOption(key.to_string()),
            );
            continue;
        };

        match &mut parsed.options.values[index] {
            OptionValue::Flag(true) => {
                report(
                    &mut parsed.diagnostics,
                    Diagnostic::DuplicateFlag(key.to_string()),
                );
            }
            OptionValue::Flag(set) => *set = true,
            OptionValue::Value(slot) => {
                // The next token is taken verbatim, even if it looks like a flag.
                let value = if !inline.is_empty() {
                    inline.to_string()
                } else if let Some(next) = tokens.get(i) {
                    i += 1;
                    next.clone()
                } else {
                    report(
                        &mut parsed.diagnostics,
                        Diagnostic::MissingValue(key.to_string()),
                    );
                    continue;
                };

                if slot.is_some() {
                    report(
                        &mut parsed.diagnostics,
                        Diagnostic::Overwritten(key.to_string()),
                    );
                }
                *slot = Some(value);
            }
        }
    }

    parsed
}

/// Help text listing every option with its shortcut.
pub fn usage(program: &str) -> String {
    let mut out = format!("Usage: {} [options] [file]\n\nOptions:\n", program);
    for spec in SCHEMA {
        let short = match spec.shortcut {
            Some(c) => format!("-{}, ", c),
            None => "    ".to_string(),
        };
        let long = match spec.kind {
            OptionKind::Flag => format!("--{}", spec.name),
            OptionKind::Value => format!("--{} <value>", spec.name),
        };
        out.push_str(&format!("  {}{:<20} {}\n", short, long, spec.help));
    }
    out
}
