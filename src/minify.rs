//! The bundled engine: a lexical GLSL minifier.
//!
//! Comments are dropped, whitespace is only kept where two tokens would
//! otherwise run together, and preprocessor directives stay on lines of their
//! own. It also rejects stage-specific builtins used in the wrong stage and
//! `#version` lines the target cannot accept.

use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

use crate::error::GlslOptError;
use crate::gateway::Engine;
use crate::target::{ShaderStage, ShaderTarget};

#[derive(Parser)]
#[grammar = "glsl.pest"]
pub struct GlslLexer;

/// Size the heap starts with; it grows when a call needs more room.
pub const INITIAL_HEAP_SIZE: usize = 64 * 1024;

const VERTEX_ONLY: &[&str] = &["gl_Position", "gl_PointSize", "gl_VertexID", "gl_InstanceID"];

const FRAGMENT_ONLY: &[&str] = &[
    "gl_FragColor",
    "gl_FragData",
    "gl_FragCoord",
    "gl_FragDepth",
    "gl_FrontFacing",
    "gl_PointCoord",
    "discard",
];

#[derive(Debug, Default)]
pub struct MinifyEngine {
    heap: Vec<u8>,
    loaded: bool,
}

impl MinifyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out `source` and `result` as two NUL-terminated strings at the
    /// start of the heap and returns the offset of the result.
    fn store(&mut self, source: &[u8], result: &[u8]) -> usize {
        let offset = source.len() + 1;
        let needed = offset + result.len() + 1;
        if self.heap.len() < needed {
            self.heap.resize(needed, 0);
        }
        self.heap[..source.len()].copy_from_slice(source);
        self.heap[source.len()] = 0;
        self.heap[offset..offset + result.len()].copy_from_slice(result);
        self.heap[offset + result.len()] = 0;
        offset
    }
}

impl Engine for MinifyEngine {
    fn initialize(&mut self) -> Result<(), GlslOptError> {
        self.heap = vec![0; INITIAL_HEAP_SIZE];
        self.loaded = true;
        Ok(())
    }

    fn optimize(&mut self, source: &[u8], target: u32, is_vertex: bool) -> usize {
        let stage = if is_vertex {
            ShaderStage::Vertex
        } else {
            ShaderStage::Fragment
        };

        let result = if !self.loaded {
            Err("engine is not loaded".to_string())
        } else if source.contains(&0) {
            Err("source contains a NUL byte".to_string())
        } else {
            ShaderTarget::from_code(target)
                .ok_or_else(|| format!("unknown target code {}", target))
                .and_then(|target| {
                    std::str::from_utf8(source)
                        .map_err(|e| format!("source is not valid UTF-8: {}", e))
                        .and_then(|text| minify(text, target, stage))
                })
        };

        let bytes = match result {
            Ok(text) => text.into_bytes(),
            Err(message) => format!("Error: {}", message).into_bytes(),
        };
        self.store(source, &bytes)
    }

    fn heap(&self) -> &[u8] {
        &self.heap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    Number,
    Operator,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
}

const FUSING_OPERATOR_CHARS: &str = "+-*/%<>=!&|^";

/// Whether `prev` and `next` need a space between them to stay two tokens.
fn needs_space(prev: Token, next: Token) -> bool {
    use TokenKind::*;

    let prev_last = prev.text.chars().last().unwrap_or(' ');
    let next_first = next.text.chars().next().unwrap_or(' ');
    match (prev.kind, next.kind) {
        (Word | Number, Word | Number) => true,
        (Number, Operator) => next_first == '.',
        (Operator, Number) => prev_last == '.',
        (Operator, Operator) => {
            FUSING_OPERATOR_CHARS.contains(prev_last) && FUSING_OPERATOR_CHARS.contains(next_first)
        }
        _ => false,
    }
}

fn position(pair: &Pair<Rule>) -> String {
    let (line, col) = pair.line_col();
    format!("{}:{}", line, col)
}

/// Joins continued lines, drops comments and collapses runs of whitespace.
fn normalize_directive(text: &str) -> Result<String, String> {
    let joined = text.replace("\\\r\n", " ").replace("\\\n", " ");
    let mut code = String::with_capacity(joined.len());
    let mut rest = joined.as_str();
    while let Some(index) = rest.find('/') {
        let tail = &rest[index..];
        if tail.starts_with("//") {
            code.push_str(&rest[..index]);
            rest = "";
        } else if let Some(comment) = tail.strip_prefix("/*") {
            code.push_str(&rest[..index]);
            code.push(' ');
            let end = comment
                .find("*/")
                .ok_or_else(|| "unterminated comment".to_string())?;
            rest = &comment[end + 2..];
        } else {
            code.push_str(&rest[..=index]);
            rest = &rest[index + 1..];
        }
    }
    code.push_str(rest);
    Ok(code.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn check_version(directive: &str, target: ShaderTarget) -> Result<(), String> {
    let body = directive.trim_start_matches('#').trim_start();
    let Some(rest) = body.strip_prefix("version") else {
        return Ok(());
    };
    let words: Vec<&str> = rest.split_whitespace().collect();
    let number = words.first().copied().unwrap_or("");
    let es = words.get(1) == Some(&"es");

    let compatible = match target {
        ShaderTarget::OpenGL => !es && number != "100",
        ShaderTarget::OpenGLES20 => number == "100",
        ShaderTarget::OpenGLES30 => es && matches!(number, "300" | "310" | "320"),
    };
    if compatible {
        Ok(())
    } else {
        Err(format!(
            "#version {} is not compatible with target {}",
            words.join(" "),
            target
        ))
    }
}

fn check_builtin(name: &str, stage: ShaderStage) -> bool {
    match stage {
        ShaderStage::Vertex => !FRAGMENT_ONLY.contains(&name),
        ShaderStage::Fragment => !VERTEX_ONLY.contains(&name),
    }
}

/// Minifies `source`. Errors are plain messages, without the sentinel.
pub fn minify(source: &str, target: ShaderTarget, stage: ShaderStage) -> Result<String, String> {
    let shader = GlslLexer::parse(Rule::shader, source)
        .map_err(|e| e.to_string())?
        .next()
        .ok_or_else(|| "empty token stream".to_string())?;

    let mut out = String::with_capacity(source.len());
    let mut prev: Option<Token> = None;

    for pair in shader.into_inner() {
        let kind = match pair.as_rule() {
            Rule::space | Rule::block_comment | Rule::line_comment | Rule::EOI => continue,
            Rule::unterminated_comment => {
                return Err(format!("{}: unterminated comment", position(&pair)));
            }
            Rule::unknown => {
                return Err(format!(
                    "{}: unexpected character '{}'",
                    position(&pair),
                    pair.as_str()
                ));
            }
            Rule::directive => {
                let directive = normalize_directive(pair.as_str())
                    .and_then(|directive| check_version(&directive, target).map(|_| directive))
                    .map_err(|message| format!("{}: {}", position(&pair), message))?;
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(&directive);
                out.push('\n');
                prev = None;
                continue;
            }
            Rule::identifier => {
                if !check_builtin(pair.as_str(), stage) {
                    return Err(format!(
                        "{}: '{}' is not available in {} shaders",
                        position(&pair),
                        pair.as_str(),
                        stage
                    ));
                }
                TokenKind::Word
            }
            Rule::number => TokenKind::Number,
            Rule::operator => TokenKind::Operator,
            other => return Err(format!("unexpected token {:?}", other)),
        };

        let token = Token {
            kind,
            text: pair.as_str(),
        };
        if prev.map_or(false, |p| needs_space(p, token)) {
            out.push(' ');
        }
        out.push_str(token.text);
        prev = Some(token);
    }

    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
