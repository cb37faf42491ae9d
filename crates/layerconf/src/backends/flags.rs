use crate::backend::{Backend, BackendError};
use crate::context::Context;
use crate::error::LoadError;
use crate::field::{FieldDescriptor, TypeKind};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use fxhash::FxHashMap;
use std::ffi::OsString;
use std::sync::OnceLock;
use tracing::debug;

/// Tags are split on commas, so no field key can take this id.
const HELP_ID: &str = ",help";

#[derive(Debug, Clone)]
enum Failure {
    Help(String),
    Invalid(String),
}

impl Failure {
    fn to_error(&self) -> LoadError {
        match self {
            Self::Help(usage) => LoadError::HelpRequested { usage: usage.clone() },
            Self::Invalid(message) => {
                LoadError::FlagParse { message: message.clone().into(), context: None }
            },
        }
    }
}

#[derive(Debug, Default)]
struct Parsed {
    values: FxHashMap<&'static str, OsString>,
    aliases: FxHashMap<&'static str, &'static str>,
    remaining: Vec<OsString>,
}

/// Serves values from command-line flags generated from the target record's tags.
///
/// Every field gets a flag named after its key; a `short=<alias>` option adds a second name for
/// the same flag, so `-a-def=x` and `-ad=x` are interchangeable. If both forms appear, the last
/// one wins. Flags are written `-name=value` or `--name=value`; non-bool flags also accept
/// `-name value`, and bool flags may be given bare (`-verbose`). Parsing stops at `--` or at the
/// first argument that is not a flag; see [`FlagBackend::remaining`].
///
/// The arguments are parsed once, during the first [`Backend::prepare`] call, with the fields of
/// the record being loaded. A backend instance therefore serves one record type: create one per
/// resolution need. Keys that were never registered or not supplied report not-found, leaving
/// required-field enforcement to the resolver.
#[derive(Debug)]
pub struct FlagBackend {
    args: Vec<OsString>,
    parsed: OnceLock<Result<Parsed, Failure>>,
}

impl Default for FlagBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FlagBackend {
    /// Uses the process arguments, without the program name.
    #[must_use]
    pub fn new() -> Self {
        Self::from_args(std::env::args_os().skip(1))
    }

    /// Uses `args` as the command line, without a program name.
    #[must_use]
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self { args: args.into_iter().map(Into::into).collect(), parsed: OnceLock::new() }
    }

    /// Arguments left after flag parsing stopped, or `None` before a successful parse.
    #[must_use]
    pub fn remaining(&self) -> Option<&[OsString]> {
        match self.parsed.get() {
            Some(Ok(parsed)) => Some(&parsed.remaining),
            _ => None,
        }
    }
}

impl Backend for FlagBackend {
    fn name(&self) -> &str {
        "flags"
    }

    fn get(&self, _ctx: &Context, key: &str) -> Result<Vec<u8>, BackendError> {
        let Some(Ok(parsed)) = self.parsed.get() else {
            return Err(BackendError::not_found(key));
        };
        let key = parsed.aliases.get(key).copied().unwrap_or(key);

        parsed
            .values
            .get(key)
            .map(|value| value.as_encoded_bytes().to_vec())
            .ok_or_else(|| BackendError::not_found(key))
    }

    fn prepare(&self, fields: &[FieldDescriptor]) -> Result<(), LoadError> {
        match self.parsed.get_or_init(|| parse(&self.args, fields)) {
            Ok(_) => Ok(()),
            Err(failure) => Err(failure.to_error()),
        }
    }
}

fn parse(args: &[OsString], fields: &[FieldDescriptor]) -> Result<Parsed, Failure> {
    let Split { flags, remaining, single_dash } = split_flags(args, fields);

    let matches = command(fields).try_get_matches_from(flags).map_err(|err| {
        if err.kind() == ErrorKind::DisplayHelp {
            Failure::Help(err.render().to_string())
        } else {
            Failure::Invalid(as_typed(err.to_string().trim_end(), &single_dash))
        }
    })?;

    let values: FxHashMap<_, _> = fields
        .iter()
        .filter_map(|field| matches.get_one::<OsString>(field.key).map(|v| (field.key, v.clone())))
        .collect();
    let aliases = fields.iter().filter_map(|f| f.short.map(|alias| (alias, f.key))).collect();

    debug!(
        flags = fields.len(),
        supplied = values.len(),
        remaining = remaining.len(),
        "command line parsed"
    );
    Ok(Parsed { values, aliases, remaining })
}

fn command(fields: &[FieldDescriptor]) -> Command {
    let mut command = Command::new("layerconf")
        .no_binary_name(true)
        .args_override_self(true)
        .disable_help_flag(true)
        .disable_version_flag(true);

    for field in fields {
        command = command.arg(flag(field));
    }

    let help_taken = fields.iter().flat_map(FieldDescriptor::names).any(|n| n == "help" || n == "h");
    if !help_taken {
        command = command.arg(
            Arg::new(HELP_ID)
                .long("help")
                .alias("h")
                .action(ArgAction::Help)
                .help("Print the available flags"),
        );
    }

    command
}

fn flag(field: &FieldDescriptor) -> Arg {
    let mut arg = Arg::new(field.key)
        .long(field.key)
        .value_name(field.kind.name())
        .value_parser(clap::value_parser!(OsString))
        .action(ArgAction::Set);

    if let Some(alias) = field.short {
        arg = arg.visible_alias(alias);
    }
    if let Some(description) = field.description {
        arg = arg.help(description);
    }

    if field.kind == TypeKind::Bool {
        arg.num_args(0..=1).require_equals(true).default_missing_value("true")
    } else {
        arg.num_args(1).allow_hyphen_values(true)
    }
}

#[derive(Debug, Default)]
struct Split {
    /// Flag tokens in clap's `--name` form.
    flags: Vec<OsString>,
    /// Arguments after the point where flag parsing stopped.
    remaining: Vec<OsString>,
    /// Names the user wrote with a single dash.
    single_dash: Vec<String>,
}

/// Quotes single-dash flags in a clap message the way they were typed.
fn as_typed(message: &str, single_dash: &[String]) -> String {
    single_dash.iter().fold(message.to_owned(), |message, name| {
        ['\'', '=', ' '].iter().fold(message, |message, end| {
            message.replace(&format!("'--{name}{end}"), &format!("'-{name}{end}"))
        })
    })
}

fn split_flags(args: &[OsString], fields: &[FieldDescriptor]) -> Split {
    let takes_value: FxHashMap<&str, bool> = fields
        .iter()
        .flat_map(|f| f.names().map(move |name| (name, f.kind != TypeKind::Bool)))
        .collect();

    let mut split = Split { flags: Vec::with_capacity(args.len()), ..Split::default() };
    let mut expect_value = false;

    for (position, arg) in args.iter().enumerate() {
        if expect_value {
            split.flags.push(arg.clone());
            expect_value = false;
            continue;
        }

        let bytes = arg.as_encoded_bytes();
        if bytes == b"--" {
            split.remaining = args[position + 1..].to_vec();
            return split;
        }
        if bytes.len() < 2 || bytes[0] != b'-' {
            split.remaining = args[position..].to_vec();
            return split;
        }

        let double_dash = bytes.starts_with(b"--");
        let body = if double_dash { &bytes[2..] } else { &bytes[1..] };
        let (name, inline_value) = match body.iter().position(|&b| b == b'=') {
            Some(at) => (&body[..at], true),
            None => (body, false),
        };
        let name = std::str::from_utf8(name).ok();
        expect_value = !inline_value && name.and_then(|name| takes_value.get(name)).copied().unwrap_or(false);

        if double_dash {
            split.flags.push(arg.clone());
        } else {
            let mut long = OsString::from("-");
            long.push(arg);
            split.flags.push(long);
            split.single_dash.extend(name.map(str::to_owned));
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(index: usize, key: &'static str, short: Option<&'static str>, kind: TypeKind) -> FieldDescriptor {
        FieldDescriptor {
            index,
            name: key,
            key,
            short,
            required: false,
            backend: None,
            description: None,
            kind,
        }
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            field(0, "a", None, TypeKind::String),
            field(1, "a-def", Some("ad"), TypeKind::String),
            field(2, "b", None, TypeKind::Bool),
            field(3, "d", None, TypeKind::Int { bits: 64 }),
        ]
    }

    fn value(backend: &FlagBackend, key: &str) -> Option<String> {
        backend
            .get(&Context::background(), key)
            .ok()
            .map(|raw| String::from_utf8(raw).unwrap_or_default())
    }

    #[test]
    fn serves_single_and_double_dash_flags() {
        let backend = FlagBackend::from_args(["-a=hello", "--d=-100"]);
        backend.prepare(&fields()).expect("arguments should parse");

        assert_eq!(value(&backend, "a").as_deref(), Some("hello"));
        assert_eq!(value(&backend, "d").as_deref(), Some("-100"));
        assert_eq!(value(&backend, "b"), None);
    }

    #[test]
    fn alias_and_long_form_share_storage() {
        let short = FlagBackend::from_args(["-ad=hello"]);
        short.prepare(&fields()).expect("arguments should parse");
        let long = FlagBackend::from_args(["-a-def=hello"]);
        long.prepare(&fields()).expect("arguments should parse");

        assert_eq!(value(&short, "a-def"), value(&long, "a-def"));
        assert_eq!(value(&short, "ad").as_deref(), Some("hello"));
    }

    #[test]
    fn last_occurrence_wins_across_alias_and_key() {
        let backend = FlagBackend::from_args(["-a-def=first", "-ad=second"]);
        backend.prepare(&fields()).expect("arguments should parse");

        assert_eq!(value(&backend, "a-def").as_deref(), Some("second"));
    }

    #[test]
    fn bare_bool_flag_means_true() {
        let backend = FlagBackend::from_args(["-b", "-a", "spaced"]);
        backend.prepare(&fields()).expect("arguments should parse");

        assert_eq!(value(&backend, "b").as_deref(), Some("true"));
        assert_eq!(value(&backend, "a").as_deref(), Some("spaced"));
    }

    #[test]
    fn separated_value_may_start_with_a_dash() {
        let backend = FlagBackend::from_args(["-d", "-5"]);
        backend.prepare(&fields()).expect("arguments should parse");

        assert_eq!(value(&backend, "d").as_deref(), Some("-5"));
    }

    #[test]
    fn parsing_stops_at_first_positional_or_terminator() {
        let backend = FlagBackend::from_args(["-a=x", "serve", "-b"]);
        backend.prepare(&fields()).expect("arguments should parse");
        assert_eq!(backend.remaining(), Some(&[OsString::from("serve"), OsString::from("-b")][..]));
        assert_eq!(value(&backend, "b"), None);

        let backend = FlagBackend::from_args(["-b", "--", "-a=x"]);
        backend.prepare(&fields()).expect("arguments should parse");
        assert_eq!(backend.remaining(), Some(&[OsString::from("-a=x")][..]));
        assert_eq!(value(&backend, "a"), None);
    }

    #[test]
    fn unknown_flag_fails_the_parse() {
        let backend = FlagBackend::from_args(["-nope=1"]);
        let err = backend.prepare(&fields()).expect_err("unknown flag should be rejected");

        assert!(matches!(err, LoadError::FlagParse { .. }), "{err}");
        assert!(backend.prepare(&fields()).is_err(), "the failure is remembered");
        assert_eq!(backend.remaining(), None);
    }

    #[test]
    fn parse_errors_quote_flags_as_typed() {
        let err = FlagBackend::from_args(["-nope=1"]).prepare(&fields()).expect_err("unknown flag");
        let message = err.to_string();
        assert!(message.contains("'-nope'"), "{message}");
        assert!(!message.contains("'--nope'"), "{message}");

        let err = FlagBackend::from_args(["--nope=1"]).prepare(&fields()).expect_err("unknown flag");
        assert!(err.to_string().contains("'--nope'"), "{err}");
    }

    #[test]
    fn any_key_can_be_a_flag_next_to_help() {
        let fields = vec![
            field(0, "layerconf-help", None, TypeKind::String),
            field(1, "help-id", None, TypeKind::Bool),
        ];

        let backend = FlagBackend::from_args(["-layerconf-help=x", "-help-id"]);
        backend.prepare(&fields).expect("arguments should parse");
        assert_eq!(value(&backend, "layerconf-help").as_deref(), Some("x"));
        assert_eq!(value(&backend, "help-id").as_deref(), Some("true"));

        let help = FlagBackend::from_args(["-h"]);
        assert!(matches!(help.prepare(&fields), Err(LoadError::HelpRequested { .. })));
    }

    #[test]
    fn help_flag_reports_usage() {
        let backend = FlagBackend::from_args(["-help"]);
        let err = backend.prepare(&fields()).expect_err("help should interrupt loading");

        let LoadError::HelpRequested { usage } = err else {
            panic!("expected HelpRequested, got {err}");
        };
        assert!(usage.contains("--a-def"), "{usage}");
    }

    #[test]
    fn unregistered_key_and_unprepared_backend_report_not_found() {
        let backend = FlagBackend::from_args(["-a=x"]);
        let ctx = Context::background();
        assert!(backend.get(&ctx, "a").is_err_and(|e| e.is_not_found()));

        backend.prepare(&fields()).expect("arguments should parse");
        assert!(backend.get(&ctx, "missing").is_err_and(|e| e.is_not_found()));
    }

    #[test]
    fn concurrent_prepare_parses_once() {
        let backend = FlagBackend::from_args(["-a=shared"]);
        let fields = fields();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| backend.prepare(&fields).expect("arguments should parse"));
            }
        });

        assert_eq!(value(&backend, "a").as_deref(), Some("shared"));
    }
}
