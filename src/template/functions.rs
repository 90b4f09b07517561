//! Function vocabulary available to templates.
//!
//! A [`FunctionRegistry`] is built once (usually via
//! [`FunctionRegistry::standard`]) and passed explicitly to every analysis
//! call. Only the handful of builtins that affect control flow or printing
//! have real behavior; everything else is a stub that returns its own name,
//! which is all the analyzer needs to produce a structurally valid skeleton.

use std::collections::BTreeMap;

use super::render::Data;

/// Behavior bound to a function name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    And,
    Or,
    Not,
    Len,
    Index,
    Print,
    Printf,
    Println,
    /// Pulls in a shared fragment; renders as nothing.
    Include,
    /// Accepts any arguments and returns the function's own name.
    Stub,
}

/// Name under which include fragments are pulled into a template.
pub const INCLUDE: &str = "include";

/// Builtins that keep their semantics during zero-value rendering.
const REAL_BUILTINS: &[(&str, Function)] = &[
    ("and", Function::And),
    ("or", Function::Or),
    ("not", Function::Not),
    ("len", Function::Len),
    ("index", Function::Index),
    ("print", Function::Print),
    ("printf", Function::Printf),
    ("println", Function::Println),
];

/// Builtins stubbed out because their result depends on real values.
const STUBBED_BUILTINS: &[&str] = &[
    "eq", "ne", "lt", "le", "gt", "ge", "html", "js", "urlquery", "slice", "call",
];

/// Helper library commonly available to configuration templates.
const LIBRARY: &[&str] = &[
    // dates
    "ago", "date", "dateInZone", "dateModify", "date_in_zone", "date_modify", "duration",
    "durationRound", "htmlDate", "htmlDateInZone", "mustDateModify", "mustToDate",
    "must_date_modify", "now", "toDate", "unixEpoch",
    // strings
    "abbrev", "abbrevboth", "camelcase", "cat", "contains", "hasPrefix", "hasSuffix", "indent",
    "initials", "kebabcase", "lower", "nindent", "nospace", "plural", "quote", "randAlpha",
    "randAlphaNum", "randAscii", "randNumeric", "repeat", "replace", "shuffle", "snakecase",
    "squote", "substr", "swapcase", "title", "trim", "trimAll", "trimPrefix", "trimSuffix",
    "trimall", "trunc", "untitle", "upper", "wrap", "wrapWith", "hello",
    // conversion and lists of strings
    "atoi", "float64", "int", "int64", "join", "sortAlpha", "split", "splitList", "splitn",
    "toDecimal", "toString", "toStrings",
    // math
    "add", "add1", "add1f", "addf", "biggest", "ceil", "div", "divf", "floor", "max", "maxf",
    "min", "minf", "mod", "mul", "mulf", "randInt", "round", "seq", "sub", "subf", "until",
    "untilStep",
    // defaults and flow
    "all", "any", "coalesce", "compact", "default", "empty", "fail", "mustCompact", "ternary",
    // encoding
    "b32dec", "b32enc", "b64dec", "b64enc", "fromJson", "mustFromJson", "mustToJson",
    "mustToPrettyJson", "mustToRawJson", "toJson", "toPrettyJson", "toRawJson",
    // reflection
    "deepCopy", "deepEqual", "kindIs", "kindOf", "mustDeepCopy", "typeIs", "typeIsLike",
    "typeOf",
    // os and paths
    "base", "clean", "dir", "env", "expandenv", "ext", "getHostByName", "isAbs", "osBase",
    "osClean", "osDir", "osExt", "osIsAbs",
    // dictionaries
    "dict", "dig", "get", "hasKey", "keys", "merge", "mergeOverwrite", "mustMerge",
    "mustMergeOverwrite", "omit", "pick", "pluck", "set", "unset", "values",
    // lists
    "append", "chunk", "concat", "first", "has", "initial", "last", "list", "mustAppend",
    "mustChunk", "mustFirst", "mustHas", "mustInitial", "mustLast", "mustPrepend", "mustPush",
    "mustRest", "mustReverse", "mustSlice", "mustUniq", "mustWithout", "prepend", "push",
    "rest", "reverse", "tuple", "uniq", "without",
    // crypto
    "adler32sum", "bcrypt", "buildCustomCert", "decryptAES", "derivePassword", "encryptAES",
    "genCA", "genCAWithKey", "genPrivateKey", "genSelfSignedCert", "genSelfSignedCertWithKey",
    "genSignedCert", "genSignedCertWithKey", "htpasswd", "randBytes", "sha1sum", "sha256sum",
    "uuidv4",
    // semver, regex, urls
    "semver", "semverCompare", "mustRegexFind", "mustRegexFindAll", "mustRegexMatch",
    "mustRegexReplaceAll", "mustRegexReplaceAllLiteral", "mustRegexSplit", "regexFind",
    "regexFindAll", "regexMatch", "regexQuoteMeta", "regexReplaceAll", "regexReplaceAllLiteral",
    "regexSplit", "urlJoin", "urlParse",
    // chart-style helpers
    "fromYaml", "fromYamlArray", "fromJsonArray", "lookup", "required", "toToml", "toYaml",
    "tpl",
];

/// Registry of callable template functions.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Function>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the builtins, the helper library and `include`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for name in STUBBED_BUILTINS.iter().chain(LIBRARY) {
            registry.stub(*name);
        }
        for (name, function) in REAL_BUILTINS {
            registry.register(*name, *function);
        }
        registry.register(INCLUDE, Function::Include);
        registry
    }

    /// Bind a name, replacing any previous binding.
    pub fn register(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    /// Bind a name to a stub.
    pub fn stub(&mut self, name: impl Into<String>) {
        self.register(name, Function::Stub);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Function> {
        self.functions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Invoke a function by name.
    ///
    /// Errors are plain messages; the renderer attaches the line.
    pub fn call(&self, name: &str, args: Vec<Data>) -> Result<Data, String> {
        let function = self
            .get(name)
            .ok_or_else(|| format!("function {:?} not defined", name))?;

        match function {
            Function::And => {
                require_at_least(name, &args, 1)?;
                let last = args.len() - 1;
                Ok(args
                    .into_iter()
                    .enumerate()
                    .find(|(i, arg)| !arg.truthy() || *i == last)
                    .map(|(_, arg)| arg)
                    .unwrap_or(Data::Nil))
            }
            Function::Or => {
                require_at_least(name, &args, 1)?;
                let last = args.len() - 1;
                Ok(args
                    .into_iter()
                    .enumerate()
                    .find(|(i, arg)| arg.truthy() || *i == last)
                    .map(|(_, arg)| arg)
                    .unwrap_or(Data::Nil))
            }
            Function::Not => {
                require_exactly(name, &args, 1)?;
                Ok(Data::Bool(!args[0].truthy()))
            }
            Function::Len => {
                require_exactly(name, &args, 1)?;
                match &args[0] {
                    Data::Nil => Ok(Data::Int(0)),
                    Data::Str(s) => Ok(Data::Int(s.len() as i64)),
                    other => Err(format!("len of type {}", other.type_name())),
                }
            }
            Function::Index => {
                require_at_least(name, &args, 1)?;
                let mut item = args[0].clone();
                for key in &args[1..] {
                    item = match (&item, key) {
                        (Data::Str(s), Data::Int(i)) => usize::try_from(*i)
                            .ok()
                            .and_then(|i| s.as_bytes().get(i))
                            .map(|b| Data::Int(i64::from(*b)))
                            .ok_or_else(|| format!("index out of range: {}", i))?,
                        _ => Data::Nil,
                    };
                }
                Ok(item)
            }
            Function::Print => Ok(Data::Str(sprint(&args))),
            Function::Println => {
                let joined: Vec<String> = args.iter().map(Data::printed).collect();
                Ok(Data::Str(format!("{}\n", joined.join(" "))))
            }
            Function::Printf => {
                require_at_least(name, &args, 1)?;
                let format = args[0].printed();
                Ok(Data::Str(sprintf(&format, &args[1..])))
            }
            Function::Include => Ok(Data::Str(String::new())),
            Function::Stub => Ok(Data::Str(name.to_string())),
        }
    }
}

fn require_exactly(name: &str, args: &[Data], want: usize) -> Result<(), String> {
    if args.len() == want {
        Ok(())
    } else {
        Err(format!(
            "wrong number of args for {}: want {} got {}",
            name,
            want,
            args.len()
        ))
    }
}

fn require_at_least(name: &str, args: &[Data], want: usize) -> Result<(), String> {
    if args.len() >= want {
        Ok(())
    } else {
        Err(format!(
            "wrong number of args for {}: want at least {} got {}",
            name,
            want,
            args.len()
        ))
    }
}

/// Spaces are added between operands when neither side is a string.
fn sprint(args: &[Data]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 && !matches!(arg, Data::Str(_)) && !matches!(args[i - 1], Data::Str(_)) {
            out.push(' ');
        }
        out.push_str(&arg.printed());
    }
    out
}

/// Minimal formatter for the verbs templates actually use.
fn sprintf(format: &str, args: &[Data]) -> String {
    let mut out = String::new();
    let mut args = args.iter();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        // Flags, width and precision are accepted and ignored.
        while chars
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | '#' | ' '))
        {
            chars.next();
        }

        let Some(verb) = chars.next() else {
            out.push_str("%!(NOVERB)");
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }

        match args.next() {
            Some(arg) => match verb {
                'q' => out.push_str(&format!("{:?}", arg.printed())),
                _ => out.push_str(&arg.printed()),
            },
            None => out.push_str(&format!("%!{}(MISSING)", verb)),
        }
    }

    out
}
