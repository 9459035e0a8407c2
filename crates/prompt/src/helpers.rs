//! Directive helpers for the story string.
//!
//! Every markup directive the template language understands is a variant of
//! [`Directive`]. The set is closed: the template engine resolves names and
//! aliases against it when the story string is parsed, so an unknown name is
//! a parse error rather than a lookup failure halfway through rendering.
//!
//! Helpers take exactly the arguments written in the template. Invocation
//! metadata travels separately in [`Invocation`].

use regex::Regex;
use serde_json::Value as Json;
use std::fmt;
use std::sync::LazyLock;

/// Scene break marker.
pub const SCENE_BREAK: &str = "***";

/// Story break marker.
pub const STORY_BREAK: &str = "⁂";

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]{3,}").expect("valid whitespace pattern"));

static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline pattern"));

/// A value passed to a directive.
///
/// Template arguments are either field references (strings, or `Undefined`
/// when the field is missing) or literals. Truthiness and stringification
/// follow the template language's conventions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    /// Convert a resolved template parameter.
    ///
    /// `missing` is set when the parameter referenced a field that does not
    /// exist in the fragment mapping.
    pub fn from_json(json: &Json, missing: bool) -> Self {
        if missing {
            return Value::Undefined;
        }
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Str(s.clone()),
            other => Value::Str(other.to_string()),
        }
    }

    /// Empty strings, zero, NaN, false, null and undefined are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

/// Finite numbers the way the template language prints them: no `-0`, and
/// exponent notation outside `[1e-6, 1e21)`.
fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let exp = format!("{:e}", n);
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        };
    }
    // f64's Display already drops a zero fraction ("3", not "3.0")
    n.to_string()
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Out-of-band information about a single directive invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Name as written in the template (canonical name or alias)
    pub name: &'a str,
    /// Whether the directive was invoked in block form
    pub block: bool,
}

impl fmt::Display for Invocation<'_> {
    /// The invocation context stringifies as an opaque object. `knowledge`
    /// appends it to its output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[object Object]")
    }
}

/// The closed set of story-string directives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Instruct,
    Info,
    Brackets,
    MultiBracket,
    Knowledge,
    Attg,
    Style,
    NewScene,
    NewStory,
    En,
    Em,
    Stat,
    Trim,
}

impl Directive {
    /// Every directive, in registration order.
    pub const ALL: [Directive; 13] = [
        Directive::Instruct,
        Directive::Info,
        Directive::Brackets,
        Directive::MultiBracket,
        Directive::Knowledge,
        Directive::Attg,
        Directive::Style,
        Directive::NewScene,
        Directive::NewStory,
        Directive::En,
        Directive::Em,
        Directive::Stat,
        Directive::Trim,
    ];

    /// Resolve a directive from its name or alias. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == name || d.alias() == name)
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Instruct => "instruct",
            Self::Info => "info",
            Self::Brackets => "brackets",
            Self::MultiBracket => "multiBracket",
            Self::Knowledge => "knowledge",
            Self::Attg => "attg",
            Self::Style => "style",
            Self::NewScene => "new_scene",
            Self::NewStory => "new_story",
            Self::En => "en",
            Self::Em => "em",
            Self::Stat => "stat",
            Self::Trim => "trim",
        }
    }

    /// Short alias.
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Instruct => "in",
            Self::Info => "i",
            Self::Brackets => "b",
            Self::MultiBracket => "mb",
            Self::Knowledge => "k",
            Self::Attg => "a",
            Self::Style => "s",
            Self::NewScene => "ns",
            Self::NewStory => "nst",
            Self::En => "e",
            Self::Em => "m",
            Self::Stat => "st",
            Self::Trim => "t",
        }
    }

    /// Block directives post-process a rendered template region instead of
    /// taking arguments.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Trim)
    }

    /// Expand an inline directive.
    ///
    /// For block directives `args` is ignored and the caller is expected to
    /// use [`Directive::apply_block`] instead; calling this on one returns an
    /// empty string.
    pub fn apply(&self, args: &[Value], invocation: &Invocation<'_>) -> String {
        match self {
            Self::Instruct => instruct(args),
            Self::Info => info(args),
            Self::Brackets => brackets(args),
            Self::MultiBracket => multi_bracket(args),
            Self::Knowledge => knowledge(args, invocation),
            Self::Attg => attg(args),
            Self::Style => style(args),
            Self::NewScene => new_scene(),
            Self::NewStory => new_story(),
            Self::En => en(),
            Self::Em => em(),
            Self::Stat => stat(args),
            Self::Trim => String::new(),
        }
    }

    /// Post-process the rendered body of a block directive.
    pub fn apply_block(&self, body: &str) -> String {
        match self {
            Self::Trim => trim(body),
            _ => body.to_string(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn gate_open(args: &[Value]) -> bool {
    args.first().is_some_and(Value::is_truthy)
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn join(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// `{ a } { b }` instruction markers.
pub fn instruct(args: &[Value]) -> String {
    if !gate_open(args) {
        return String::new();
    }
    args.iter()
        .map(|v| format!("{{ {} }}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dash-ruled info section closed by a scene break.
pub fn info(args: &[Value]) -> String {
    if !gate_open(args) {
        return String::new();
    }
    let sections = args
        .iter()
        .map(|v| {
            if v.is_truthy() {
                format!("----\n {}", v)
            } else {
                "null".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n{}", sections, SCENE_BREAK)
}

/// `[ subject ]` or `[ subject: a, b ]`. The first argument only gates.
pub fn brackets(args: &[Value]) -> String {
    if !gate_open(args) {
        return String::new();
    }
    let subject = arg(args, 1);
    let rest = args.get(2..).unwrap_or_default();
    if rest.is_empty() {
        format!("[ {} ]", subject)
    } else {
        format!("[ {}: {} ]", subject, join(rest, ", "))
    }
}

/// `[ k1: v1 ; k2: v2 ]` from the key/value pairs after the gate argument.
pub fn multi_bracket(args: &[Value]) -> String {
    if !gate_open(args) {
        return String::new();
    }
    let pairs = args.get(1..).unwrap_or_default();
    let mut output = String::new();
    for (index, key) in pairs.iter().enumerate().step_by(2) {
        let value = arg(pairs, index + 1);
        output.push_str(&format!("{}: {} ; ", key, value));
    }
    let body = output.strip_suffix(" ; ").unwrap_or(&output);
    format!("[ {} ]", body)
}

/// `[ Knowledge: ... ]`, with the invocation context as the final entry.
pub fn knowledge(args: &[Value], invocation: &Invocation<'_>) -> String {
    let mut entries: Vec<String> = args.iter().map(ToString::to_string).collect();
    entries.push(invocation.to_string());
    format!("[ Knowledge: {} ]", entries.join(", "))
}

/// Author/title/tags/genre header.
pub fn attg(args: &[Value]) -> String {
    let [author, title, tags, genre] = [0, 1, 2, 3].map(|i| arg(args, i));
    if ![&author, &title, &tags, &genre]
        .into_iter()
        .any(Value::is_truthy)
    {
        return String::new();
    }
    format!(
        "[ Author: {}; Title: {}; Tags: {}; Genre: {} ]",
        author, title, tags, genre
    )
}

/// `[ Style: a, b ]`.
pub fn style(args: &[Value]) -> String {
    format!("[ Style: {} ]", join(args, ", "))
}

pub fn new_scene() -> String {
    SCENE_BREAK.to_string()
}

pub fn new_story() -> String {
    STORY_BREAK.to_string()
}

/// An en space (U+2002).
pub fn en() -> String {
    "\u{2002}".to_string()
}

/// An em space (U+2003).
pub fn em() -> String {
    "\u{2003}".to_string()
}

/// `─ value`.
pub fn stat(args: &[Value]) -> String {
    format!("─ {}", arg(args, 0))
}

/// Collapse whitespace runs in a rendered block and trim it.
pub fn trim(body: &str) -> String {
    let collapsed = HORIZONTAL_RUN.replace_all(body, " ");
    let collapsed = NEWLINE_RUN.replace_all(&collapsed, "\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    fn inline(name: &str) -> Invocation<'_> {
        Invocation { name, block: false }
    }

    #[test]
    fn test_directive_names_and_aliases_resolve() {
        for directive in Directive::ALL {
            assert_eq!(Directive::from_name(directive.name()), Some(directive));
            assert_eq!(Directive::from_name(directive.alias()), Some(directive));
        }
        assert_eq!(Directive::from_name("multibracket"), None);
        assert_eq!(Directive::from_name("if"), None);
    }

    #[test]
    fn test_only_trim_is_block() {
        let blocks: Vec<_> = Directive::ALL.into_iter().filter(|d| d.is_block()).collect();
        assert_eq!(blocks, vec![Directive::Trim]);
    }

    #[test]
    fn test_value_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Str("0".to_string()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
        assert_eq!(Value::Number(-1.5e22).to_string(), "-1.5e+22");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Number(123456789.0).to_string(), "123456789");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_value_from_missing_json() {
        assert_eq!(Value::from_json(&Json::Null, true), Value::Undefined);
        assert_eq!(Value::from_json(&Json::Null, false), Value::Null);
        assert_eq!(
            Value::from_json(&Json::String("x".to_string()), false),
            Value::from("x")
        );
    }

    #[test]
    fn test_instruct() {
        assert_eq!(instruct(&strs(&["a", "b"])), "{ a } { b }");
        assert_eq!(instruct(&strs(&["", "b"])), "");
        assert_eq!(instruct(&[Value::Undefined]), "");
        assert_eq!(instruct(&[]), "");
    }

    #[test]
    fn test_info() {
        assert_eq!(info(&strs(&["a"])), "----\n a\n***");
        assert_eq!(info(&strs(&["a", "", "c"])), "----\n a\nnull\n----\n c\n***");
        assert_eq!(info(&strs(&["", "b"])), "");
    }

    #[test]
    fn test_brackets() {
        assert_eq!(brackets(&strs(&["x", "subject"])), "[ subject ]");
        assert_eq!(
            brackets(&strs(&["x", "subject", "k1", "k2"])),
            "[ subject: k1, k2 ]"
        );
        assert_eq!(brackets(&strs(&["", "subject"])), "");
        assert_eq!(brackets(&strs(&["x"])), "[ undefined ]");
    }

    #[test]
    fn test_multi_bracket() {
        assert_eq!(
            multi_bracket(&strs(&["x", "A", "1", "B", "2"])),
            "[ A: 1 ; B: 2 ]"
        );
        assert_eq!(multi_bracket(&strs(&["x", "A"])), "[ A: undefined ]");
        assert_eq!(multi_bracket(&strs(&["x"])), "[  ]");
        assert_eq!(multi_bracket(&strs(&["", "A", "1"])), "");
    }

    #[test]
    fn test_knowledge_appends_invocation_context() {
        assert_eq!(
            knowledge(&strs(&["dragons", "caves"]), &inline("k")),
            "[ Knowledge: dragons, caves, [object Object] ]"
        );
        assert_eq!(
            knowledge(&[], &inline("knowledge")),
            "[ Knowledge: [object Object] ]"
        );
    }

    #[test]
    fn test_attg() {
        assert_eq!(
            attg(&strs(&["Ann", "Tide", "sea", "drama"])),
            "[ Author: Ann; Title: Tide; Tags: sea; Genre: drama ]"
        );
        assert_eq!(
            attg(&strs(&["", "Tide"])),
            "[ Author: ; Title: Tide; Tags: undefined; Genre: undefined ]"
        );
        assert_eq!(attg(&strs(&["", "", "", ""])), "");
        assert_eq!(attg(&[]), "");
    }

    #[test]
    fn test_style() {
        assert_eq!(style(&strs(&["terse", "gothic"])), "[ Style: terse, gothic ]");
        assert_eq!(style(&[]), "[ Style:  ]");
    }

    #[test]
    fn test_fixed_markers_ignore_arguments() {
        let any = strs(&["whatever"]);
        let inv = inline("ns");
        assert_eq!(Directive::NewScene.apply(&any, &inv), "***");
        assert_eq!(Directive::NewScene.apply(&[], &inv), "***");
        assert_eq!(Directive::NewStory.apply(&any, &inv), "⁂");
        assert_eq!(Directive::En.apply(&any, &inv), "\u{2002}");
        assert_eq!(Directive::Em.apply(&[], &inv), "\u{2003}");
    }

    #[test]
    fn test_stat() {
        assert_eq!(stat(&strs(&["HP 10"])), "─ HP 10");
        assert_eq!(stat(&[Value::Number(7.0)]), "─ 7");
        assert_eq!(stat(&[Value::Number(-0.0)]), "─ 0");
        assert_eq!(stat(&[]), "─ undefined");
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim("a   b\n\n\n\nc"), "a b\nc");
        assert_eq!(trim("  keep  two\n\nlines  "), "keep  two\n\nlines");
        assert_eq!(trim("\t \t x"), "x");
        assert_eq!(Directive::Trim.apply_block("a \t  b"), "a b");
    }
}
