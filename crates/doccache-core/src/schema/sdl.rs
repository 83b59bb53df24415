//! SDL rendering and reading.
//!
//! Only the subset of GraphQL SDL that [`render`] produces is understood by
//! [`parse`]: `interface` and `type` definitions, `implements` lists, named and
//! list field types with `!`, and the `@id` and `@search(by: [...])`
//! directives. Other directives are skipped.
//!
//! Stub types are preceded by a `# doccache:stub` comment line. The backend
//! keeps comments, so the marker survives a push and read-back.
//!
//! Types render without the fields they inherit unchanged from their
//! interfaces, the way the backend expects them. A type that declares an
//! inherited field differently (an `@id` promotion, say) keeps its own line.

use super::field::{FieldType, SimplifiedField};
use super::interface::SimplifiedInterface;
use super::simplified_type::SimplifiedType;
use super::Schema;
use crate::DoccacheError;
use crate::codec::{GqlScalar, SearchIndex};
use std::fmt::Write;

/// Comment line marking the next type as a stub.
const STUB_MARKER: &str = "# doccache:stub";

// =============================================================================
// RENDER
// =============================================================================

/// Render the schema: interfaces first, then types, each in name order.
pub(super) fn render(schema: &Schema) -> String {
    let mut out = String::new();
    for iface in schema.interfaces() {
        let fields: Vec<&SimplifiedField> = iface.fields.values().collect();
        write_definition(&mut out, "interface", &iface.name, &[], &fields, false);
    }
    for ty in schema.types() {
        let fields: Vec<&SimplifiedField> = ty
            .fields
            .values()
            .filter(|f| {
                !ty.interfaces.iter().any(|i| {
                    schema
                        .get_interface(i)
                        .is_some_and(|iface| iface.fields.get(&f.name) == Some(*f))
                })
            })
            .collect();
        write_definition(&mut out, "type", &ty.name, &ty.interfaces, &fields, ty.stub);
    }
    out
}

fn write_definition(
    out: &mut String,
    keyword: &str,
    name: &str,
    interfaces: &[String],
    fields: &[&SimplifiedField],
    stub: bool,
) {
    if !out.is_empty() {
        out.push('\n');
    }
    if stub {
        out.push_str(STUB_MARKER);
        out.push('\n');
    }
    out.push_str(keyword);
    out.push(' ');
    out.push_str(name);
    if !interfaces.is_empty() {
        out.push_str(" implements ");
        out.push_str(&interfaces.join(" & "));
    }
    if fields.is_empty() {
        out.push('\n');
        return;
    }
    out.push_str(" {\n");
    for f in fields {
        out.push_str("  ");
        out.push_str(&render_field(f));
        out.push('\n');
    }
    out.push_str("}\n");
}

fn render_field(f: &SimplifiedField) -> String {
    let mut line = format!("{}: ", f.name);
    if f.is_array {
        let _ = write!(line, "[{}]", f.field_type.name());
    } else {
        line.push_str(f.field_type.name());
    }
    if f.non_null {
        line.push('!');
    }
    if f.is_id {
        line.push_str(" @id");
    }
    if let Some(index) = f.index {
        let _ = write!(line, " @search(by: [{}])", index.as_str());
    }
    line
}

// =============================================================================
// LEXER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Punct(char),
    Stub,
}

struct Lexer {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Lexer {
    fn new(text: &str) -> Result<Self, DoccacheError> {
        let mut tokens = Vec::new();
        for (n, raw_line) in text.lines().enumerate() {
            let line = n + 1;
            if raw_line.trim() == STUB_MARKER {
                tokens.push((Token::Stub, line));
                continue;
            }
            let code = raw_line.split('#').next().unwrap_or_default();
            let mut chars = code.char_indices().peekable();
            while let Some((start, c)) = chars.next() {
                match c {
                    c if c.is_whitespace() || c == ',' => {}
                    '{' | '}' | '(' | ')' | '[' | ']' | ':' | '!' | '@' | '&' | '=' => {
                        tokens.push((Token::Punct(c), line));
                    }
                    '"' => {
                        // String arguments of skipped directives.
                        let mut end = code.len();
                        for (i, c) in chars.by_ref() {
                            if c == '"' {
                                end = i;
                                break;
                            }
                        }
                        tokens.push((Token::Name(code[start + 1..end].to_string()), line));
                    }
                    c if c.is_ascii_alphanumeric() || c == '_' => {
                        let mut end = start + c.len_utf8();
                        while let Some(&(i, c)) = chars.peek() {
                            if !(c.is_ascii_alphanumeric() || c == '_') {
                                break;
                            }
                            end = i + c.len_utf8();
                            chars.next();
                        }
                        tokens.push((Token::Name(code[start..end].to_string()), line));
                    }
                    other => {
                        return Err(DoccacheError::SchemaParse {
                            line,
                            message: format!("unexpected character '{other}'"),
                        });
                    }
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |(_, l)| *l)
    }

    fn error(&self, message: impl Into<String>) -> DoccacheError {
        DoccacheError::SchemaParse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        self.pos += 1;
        t
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        let found = self.at_punct(c);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_punct(&mut self, c: char) -> Result<(), DoccacheError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn name(&mut self) -> Result<String, DoccacheError> {
        match self.next() {
            Some(Token::Name(n)) => Ok(n),
            Some(Token::Punct(c)) => {
                self.pos -= 1;
                Err(self.error(format!("expected a name, found '{c}'")))
            }
            Some(Token::Stub) => {
                self.pos -= 1;
                Err(self.error("misplaced stub marker"))
            }
            None => Err(self.error("unexpected end of schema")),
        }
    }
}

// =============================================================================
// PARSER
// =============================================================================

/// Read SDL text into interfaces and types (inherited fields not yet applied).
pub(super) fn parse(
    text: &str,
) -> Result<(Vec<SimplifiedInterface>, Vec<SimplifiedType>), DoccacheError> {
    let mut lx = Lexer::new(text)?;
    let mut interfaces = Vec::new();
    let mut types = Vec::new();
    let mut stub = false;

    while lx.peek().is_some() {
        if lx.peek() == Some(&Token::Stub) {
            lx.pos += 1;
            stub = true;
            continue;
        }
        let keyword = lx.name()?;
        match keyword.as_str() {
            "interface" => {
                let name = lx.name()?;
                let _ = parse_implements(&mut lx)?;
                let mut iface = SimplifiedInterface::new(name);
                for f in parse_fields(&mut lx)? {
                    iface.insert(f);
                }
                interfaces.push(iface);
            }
            "type" => {
                let mut ty = SimplifiedType::new(lx.name()?);
                ty.stub = std::mem::take(&mut stub);
                ty.interfaces = parse_implements(&mut lx)?;
                for f in parse_fields(&mut lx)? {
                    ty.insert(f);
                }
                types.push(ty);
            }
            other => return Err(lx.error(format!("unsupported definition '{other}'"))),
        }
    }
    Ok((interfaces, types))
}

fn parse_implements(lx: &mut Lexer) -> Result<Vec<String>, DoccacheError> {
    let mut names = Vec::new();
    if lx.peek() != Some(&Token::Name("implements".to_string())) {
        return Ok(names);
    }
    lx.pos += 1;
    lx.eat_punct('&');
    names.push(lx.name()?);
    while lx.eat_punct('&') {
        names.push(lx.name()?);
    }
    Ok(names)
}

fn parse_fields(lx: &mut Lexer) -> Result<Vec<SimplifiedField>, DoccacheError> {
    let mut fields = Vec::new();
    if !lx.eat_punct('{') {
        return Ok(fields);
    }
    while !lx.eat_punct('}') {
        fields.push(parse_field(lx)?);
    }
    Ok(fields)
}

fn parse_field(lx: &mut Lexer) -> Result<SimplifiedField, DoccacheError> {
    let name = lx.name()?;
    lx.expect_punct(':')?;

    let is_array = lx.eat_punct('[');
    let type_name = lx.name()?;
    if is_array {
        lx.eat_punct('!');
        lx.expect_punct(']')?;
    }
    let non_null = lx.eat_punct('!');

    let mut field = SimplifiedField {
        name,
        field_type: GqlScalar::from_sdl(&type_name)
            .map_or(FieldType::Object(type_name), FieldType::Scalar),
        non_null,
        is_array,
        is_id: false,
        index: None,
    };

    while lx.eat_punct('@') {
        let directive = lx.name()?;
        match directive.as_str() {
            "id" => field.is_id = true,
            "search" => field.index = parse_search(lx)?,
            _ => skip_arguments(lx)?,
        }
    }
    Ok(field)
}

fn parse_search(lx: &mut Lexer) -> Result<Option<SearchIndex>, DoccacheError> {
    if !lx.eat_punct('(') {
        return Ok(None);
    }
    let mut index = None;
    while !lx.eat_punct(')') {
        let arg = lx.name()?;
        lx.expect_punct(':')?;
        if arg != "by" {
            return Err(lx.error(format!("unsupported @search argument '{arg}'")));
        }
        lx.expect_punct('[')?;
        while !lx.eat_punct(']') {
            let raw = lx.name()?;
            let parsed = SearchIndex::from_sdl(&raw)
                .ok_or_else(|| lx.error(format!("unsupported search index '{raw}'")))?;
            index = index.or(Some(parsed));
        }
    }
    Ok(index)
}

fn skip_arguments(lx: &mut Lexer) -> Result<(), DoccacheError> {
    if !lx.eat_punct('(') {
        return Ok(());
    }
    let mut depth = 1usize;
    while depth > 0 {
        match lx.next() {
            Some(Token::Punct('(')) => depth += 1,
            Some(Token::Punct(')')) => depth -= 1,
            Some(_) => {}
            None => return Err(lx.error("unterminated directive arguments")),
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
