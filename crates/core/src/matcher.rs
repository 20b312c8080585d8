//! Build-context matching.
//!
//! Decides whether a Go file takes part in the build for a given [`GoEnv`]: file name
//! conventions, `_GOOS`/`_GOARCH` suffixes and the `//go:build` / `// +build`
//! constraint lines in the leading comment block.

use crate::config::GoEnv;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid build constraint: {message}")]
    Syntax { path: PathBuf, message: String },
}

/// Decides whether a file in a directory is part of the active build
pub trait BuildMatcher: Send + Sync {
    fn match_file(&self, dir: &Path, name: &str) -> Result<bool, MatchError>;
}

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js",
    "linux", "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips",
    "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le",
    "riscv", "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

fn go_build_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^//go:build(?:\s+(.*))?$").expect("valid regex"))
}

fn plus_build_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^//\s*\+build(?:\s+(.*))?$").expect("valid regex"))
}

/// Default matcher evaluating file names and constraint comments against a [`GoEnv`]
#[derive(Debug, Clone)]
pub struct BuildContext {
    env: GoEnv,
}

impl BuildContext {
    pub fn new(env: GoEnv) -> Self {
        Self { env }
    }

    /// Whether a single tag is satisfied
    pub fn match_tag(&self, tag: &str) -> bool {
        let env = &self.env;
        if tag == env.goos || tag == env.goarch || tag == "gc" {
            return true;
        }
        if tag == "unix" && UNIX_OS.contains(&env.goos.as_str()) {
            return true;
        }
        if tag == "cgo" && env.cgo_enabled {
            return true;
        }
        // GOOS aliases: android is linux, illumos is solaris, ios is darwin
        match (env.goos.as_str(), tag) {
            ("android", "linux") | ("illumos", "solaris") | ("ios", "darwin") => return true,
            _ => {}
        }
        env.build_tags.iter().any(|t| t == tag) || env.release_tags.iter().any(|t| t == tag)
    }

    /// Check the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name suffixes
    pub fn good_os_arch_file(&self, name: &str) -> bool {
        let stem = name.split('.').next().unwrap_or(name);

        // Everything before the first underscore is ignored, so `linux.go` matches
        // everywhere.
        let Some(idx) = stem.find('_') else {
            return true;
        };
        let mut elems: Vec<&str> = stem[idx..].split('_').collect();
        if elems.last() == Some(&"test") {
            elems.pop();
        }

        let n = elems.len();
        if n >= 2 && KNOWN_OS.contains(&elems[n - 2]) && KNOWN_ARCH.contains(&elems[n - 1]) {
            return self.match_tag(elems[n - 2]) && self.match_tag(elems[n - 1]);
        }
        if n >= 1 && (KNOWN_OS.contains(&elems[n - 1]) || KNOWN_ARCH.contains(&elems[n - 1])) {
            return self.match_tag(elems[n - 1]);
        }
        true
    }

    /// Evaluate the constraint lines of a file's leading comment block
    pub fn match_source(&self, source: &str) -> Result<bool, String> {
        let constraints = Constraints::scan(source)?;

        if let Some(expr) = constraints.go_build {
            let expr = parse_expr(&expr)?;
            return Ok(expr.eval(&|tag| self.match_tag(tag)));
        }

        for line in &constraints.plus_build {
            if !self.match_plus_build_line(line)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `// +build` lines: space-separated options are OR'd, comma-separated terms AND'd
    fn match_plus_build_line(&self, line: &str) -> Result<bool, String> {
        let mut any = false;
        for option in line.split_whitespace() {
            let mut all = true;
            for term in option.split(',') {
                let (negated, tag) = match term.strip_prefix('!') {
                    Some(rest) => (true, rest),
                    None => (false, term),
                };
                if !is_valid_tag(tag) {
                    return Err(format!("invalid +build term {:?}", term));
                }
                if self.match_tag(tag) == negated {
                    all = false;
                }
            }
            any |= all;
        }
        Ok(any)
    }
}

impl BuildMatcher for BuildContext {
    fn match_file(&self, dir: &Path, name: &str) -> Result<bool, MatchError> {
        if name.starts_with('_') || name.starts_with('.') {
            return Ok(false);
        }
        if !name.ends_with(".go") {
            return Ok(false);
        }
        if !self.good_os_arch_file(name) {
            return Ok(false);
        }

        let path = dir.join(name);
        let source = fs::read_to_string(&path).map_err(|source| MatchError::Io {
            path: path.clone(),
            source,
        })?;

        self.match_source(&source)
            .map_err(|message| MatchError::Syntax { path, message })
    }
}

/// Constraint lines found before the package clause
#[derive(Debug, Default)]
struct Constraints {
    go_build: Option<String>,
    plus_build: Vec<String>,
}

impl Constraints {
    /// Collect constraint lines from the leading comment block.
    ///
    /// `// +build` lines only count when a blank line follows them before the package
    /// clause; otherwise they are part of the package documentation.
    fn scan(source: &str) -> Result<Self, String> {
        let mut out = Constraints::default();
        let mut plus_build: Vec<(usize, String)> = Vec::new();
        let mut last_blank = 0;
        let mut in_block = false;

        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim();

            if in_block {
                if let Some(end) = line.find("*/") {
                    in_block = false;
                    if !line[end + 2..].trim().is_empty() {
                        break;
                    }
                }
                continue;
            }

            if line.is_empty() {
                last_blank = idx;
                continue;
            }
            if line.starts_with("/*") {
                in_block = !line[2..].contains("*/");
                continue;
            }
            if !line.starts_with("//") {
                break;
            }

            if let Some(caps) = go_build_re().captures(line) {
                if out.go_build.is_some() {
                    return Err("multiple //go:build comments".to_string());
                }
                out.go_build = Some(caps.get(1).map_or("", |m| m.as_str()).to_string());
            } else if let Some(caps) = plus_build_re().captures(line) {
                plus_build.push((idx, caps.get(1).map_or("", |m| m.as_str()).to_string()));
            }
        }

        out.plus_build = plus_build
            .into_iter()
            .filter(|(idx, _)| *idx < last_blank)
            .map(|(_, line)| line)
            .collect();

        Ok(out)
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// A parsed `//go:build` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn eval(&self, ok: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Tag(tag) => ok(tag),
            Expr::Not(inner) => !inner.eval(ok),
            Expr::And(lhs, rhs) => lhs.eval(ok) && rhs.eval(ok),
            Expr::Or(lhs, rhs) => lhs.eval(ok) || rhs.eval(ok),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '!' => tokens.push(Token::Not),
            '&' | '|' => {
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(format!("unexpected {:?} at offset {}", c, pos));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::from(c);
                while let Some((_, next)) =
                    chars.next_if(|&(_, n)| n.is_alphanumeric() || n == '_' || n == '.')
                {
                    tag.push(next);
                }
                tokens.push(Token::Tag(tag));
            }
            other => return Err(format!("unexpected {:?} at offset {}", other, pos)),
        }
    }

    Ok(tokens)
}

/// Parse a `//go:build` expression (`||`, `&&`, `!`, parentheses, tags)
pub fn parse_expr(text: &str) -> Result<Expr, String> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }

    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected token {:?}", parser.tokens[parser.pos]));
    }
    Ok(expr)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, String> {
        let mut lhs = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err("missing )".to_string());
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Tag(tag)) => {
                self.pos += 1;
                Ok(Expr::Tag(tag))
            }
            Some(other) => Err(format!("unexpected token {:?}", other)),
            None => Err("unexpected end of expression".to_string()),
        }
    }
}
