//! Recursive descent stylesheet parser with error recovery.
//!
//! Merged stylesheets come from several fragments, some of which may be
//! hand-written or truncated, so parsing never aborts. A malformed declaration
//! is dropped up to the next `;`; a malformed selector drops its whole block;
//! at-rules are skipped. Each skip leaves a [`StyleDiagnostic`].

use crate::css::model::*;
use crate::css::tokenizer::{tokenize, Lexeme, Token};

/// A recoverable problem found while compiling a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (byte {offset})")]
pub struct StyleDiagnostic {
    /// Byte offset into the merged stylesheet text.
    pub offset: usize,
    pub message: String,
}

/// Rules that parsed, plus everything that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRules {
    pub rules: Vec<RuleSet>,
    pub diagnostics: Vec<StyleDiagnostic>,
}

/// Parse `source` into rule sets, recovering from malformed input.
pub fn parse_rules(source: &str) -> ParsedRules {
    let lexed = tokenize(source);
    let mut diagnostics: Vec<StyleDiagnostic> = lexed
        .rejected
        .iter()
        .map(|span| StyleDiagnostic {
            offset: span.start,
            message: format!("unrecognised input `{}`", &source[span.clone()]),
        })
        .collect();

    let mut parser = Parser {
        source,
        tokens: lexed.lexemes,
        cursor: 0,
        diagnostics: Vec::new(),
    };
    let mut rules = Vec::new();

    while let Some(tok) = parser.peek() {
        let start = parser.cursor;
        if tok.token == Token::AtKeyword {
            let name = parser.text(&tok).to_owned();
            parser.note(start, format!("unsupported at-rule `{name}`"));
            parser.skip_statement();
            continue;
        }
        match parser.parse_rule() {
            Ok(rule) => rules.push(rule),
            Err(diagnostic) => {
                parser.diagnostics.push(diagnostic);
                parser.cursor = start;
                parser.skip_statement();
            }
        }
    }

    diagnostics.append(&mut parser.diagnostics);
    diagnostics.sort_by_key(|d| d.offset);
    ParsedRules { rules, diagnostics }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Lexeme>,
    cursor: usize,
    diagnostics: Vec<StyleDiagnostic>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Lexeme> {
        self.tokens.get(self.cursor).cloned()
    }

    fn peek_token(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|l| l.token)
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn text(&self, lexeme: &Lexeme) -> &'a str {
        &self.source[lexeme.span.clone()]
    }

    fn offset_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map(|l| l.span.start)
            .unwrap_or(self.source.len())
    }

    fn error(&self, message: impl Into<String>) -> StyleDiagnostic {
        StyleDiagnostic {
            offset: self.offset_of(self.cursor),
            message: message.into(),
        }
    }

    fn note(&mut self, index: usize, message: String) {
        let offset = self.offset_of(index);
        self.diagnostics.push(StyleDiagnostic { offset, message });
    }

    fn expect(&mut self, expected: Token) -> Result<Lexeme, StyleDiagnostic> {
        match self.peek() {
            Some(tok) if tok.token == expected => {
                self.cursor += 1;
                Ok(tok)
            }
            Some(tok) => Err(self.error(format!(
                "expected {expected:?}, found `{}`",
                self.text(&tok)
            ))),
            None => Err(self.error(format!("expected {expected:?}, found end of input"))),
        }
    }

    /// The current token starts immediately where the previous one ended.
    fn is_adjacent(&self) -> bool {
        let prev = self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i));
        match (prev, self.tokens.get(self.cursor)) {
            (Some(prev), Some(curr)) => prev.span.end == curr.span.start,
            _ => false,
        }
    }

    /// Skip one statement: up to and including a `;` or a balanced `{ ... }`
    /// block, whichever comes first. Always consumes at least one token.
    fn skip_statement(&mut self) {
        let start = self.cursor;
        let mut depth = 0usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::BraceOpen => depth += 1,
                Token::BraceClose if depth <= 1 => break,
                Token::BraceClose => depth -= 1,
                Token::Semicolon if depth == 0 => break,
                _ => {}
            }
        }
        if self.cursor == start {
            self.cursor = self.tokens.len();
        }
    }

    fn parse_rule(&mut self) -> Result<RuleSet, StyleDiagnostic> {
        let selectors = self.parse_selector_list()?;
        self.expect(Token::BraceOpen)?;
        let declarations = self.parse_declarations();
        self.expect(Token::BraceClose)?;
        Ok(RuleSet {
            selectors,
            declarations,
        })
    }

    fn parse_selector_list(&mut self) -> Result<Vec<Selector>, StyleDiagnostic> {
        let mut selectors = vec![self.parse_selector()?];
        while self.peek_token() == Some(Token::Comma) {
            self.cursor += 1;
            selectors.push(self.parse_selector()?);
        }
        Ok(selectors)
    }

    fn parse_selector(&mut self) -> Result<Selector, StyleDiagnostic> {
        let mut parts = vec![SelectorPart::Compound(self.parse_compound()?)];
        loop {
            match self.peek_token() {
                Some(Token::GreaterThan) => {
                    self.cursor += 1;
                    parts.push(SelectorPart::Combinator(Combinator::Child));
                    parts.push(SelectorPart::Compound(self.parse_compound()?));
                }
                // Whitespace-separated start of another compound.
                Some(
                    Token::Ident
                    | Token::Hash
                    | Token::HexColor
                    | Token::Dot
                    | Token::Star
                    | Token::PseudoClass,
                ) => {
                    parts.push(SelectorPart::Combinator(Combinator::Descendant));
                    parts.push(SelectorPart::Compound(self.parse_compound()?));
                }
                _ => break,
            }
        }
        Ok(Selector { parts })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector, StyleDiagnostic> {
        let mut compound = CompoundSelector::new();
        match self.peek() {
            Some(tok) if tok.token == Token::Ident => {
                self.cursor += 1;
                compound.push(SelectorComponent::Type(self.text(&tok).to_owned()));
            }
            Some(tok) if tok.token == Token::Star => {
                self.cursor += 1;
                compound.push(SelectorComponent::Universal);
            }
            Some(tok) if is_qualifier(tok.token) => compound.push(self.parse_qualifier()?),
            _ => return Err(self.error("expected selector")),
        }
        while self.is_adjacent() && self.peek_token().is_some_and(is_qualifier) {
            compound.push(self.parse_qualifier()?);
        }
        Ok(compound)
    }

    /// `.class`, `#id` or `:pseudo`.
    fn parse_qualifier(&mut self) -> Result<SelectorComponent, StyleDiagnostic> {
        let Some(tok) = self.advance() else {
            return Err(self.error("expected selector"));
        };
        match tok.token {
            Token::PseudoClass => Ok(SelectorComponent::PseudoClass(self.text(&tok)[1..].to_owned())),
            // `#add` lexes as a color but is an id in selector position.
            Token::HexColor => Ok(SelectorComponent::Id(self.text(&tok)[1..].to_owned())),
            Token::Dot | Token::Hash => {
                let name = match self.peek() {
                    Some(next) if next.token == Token::Ident && self.is_adjacent() => {
                        self.cursor += 1;
                        self.text(&next).to_owned()
                    }
                    _ => {
                        let what = if tok.token == Token::Dot { "class" } else { "id" };
                        return Err(self.error(format!("expected {what} name")));
                    }
                };
                Ok(if tok.token == Token::Dot {
                    SelectorComponent::Class(name)
                } else {
                    SelectorComponent::Id(name)
                })
            }
            _ => Err(self.error("expected selector")),
        }
    }

    /// Declarations up to (not including) the closing `}`.
    fn parse_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        while let Some(token) = self.peek_token() {
            match token {
                Token::BraceClose => break,
                Token::Semicolon => self.cursor += 1,
                _ => match self.parse_declaration() {
                    Ok(declaration) => declarations.push(declaration),
                    Err(diagnostic) => {
                        self.diagnostics.push(diagnostic);
                        self.skip_declaration();
                    }
                },
            }
        }
        declarations
    }

    /// Skip to just past the next `;`, or stop before `}`.
    fn skip_declaration(&mut self) {
        while let Some(token) = self.peek_token() {
            match token {
                Token::BraceClose => return,
                Token::Semicolon => {
                    self.cursor += 1;
                    return;
                }
                _ => self.cursor += 1,
            }
        }
    }

    fn parse_declaration(&mut self) -> Result<Declaration, StyleDiagnostic> {
        let property = match self.peek() {
            Some(tok) if tok.token == Token::Ident => {
                self.cursor += 1;
                self.text(&tok).to_owned()
            }
            _ => return Err(self.error("expected property name")),
        };

        let mut values = Vec::new();
        let mut important = false;
        match self.peek() {
            // `color:red` lexes the colon and value as one pseudo-class.
            Some(tok) if tok.token == Token::PseudoClass && self.is_adjacent() => {
                self.cursor += 1;
                values.push(DeclarationValue::Ident(self.text(&tok)[1..].to_owned()));
            }
            _ => {
                self.expect(Token::Colon)?;
            }
        }
        while let Some(tok) = self.peek() {
            match tok.token {
                Token::Semicolon | Token::BraceClose => break,
                Token::Important => {
                    self.cursor += 1;
                    important = true;
                    break;
                }
                _ => values.push(self.parse_value()?),
            }
        }
        if values.is_empty() {
            return Err(self.error(format!("missing value for `{property}`")));
        }
        if self.peek_token() == Some(Token::Semicolon) {
            self.cursor += 1;
        }
        Ok(Declaration {
            property,
            values,
            important,
        })
    }

    fn parse_value(&mut self) -> Result<DeclarationValue, StyleDiagnostic> {
        let Some(tok) = self.peek() else {
            return Err(self.error("expected value"));
        };
        let text = self.text(&tok);
        let value = match tok.token {
            Token::Ident => DeclarationValue::Ident(text.to_owned()),
            Token::Number => DeclarationValue::Number(
                text.parse()
                    .map_err(|_| self.error(format!("invalid number `{text}`")))?,
            ),
            Token::Dimension => {
                let (number, unit) = split_dimension(text)
                    .ok_or_else(|| self.error(format!("invalid dimension `{text}`")))?;
                let number = number
                    .parse()
                    .map_err(|_| self.error(format!("invalid dimension `{text}`")))?;
                DeclarationValue::Dimension(number, unit.to_owned())
            }
            Token::HexColor => DeclarationValue::Color(text[1..].to_owned()),
            Token::String => DeclarationValue::String(text[1..text.len() - 1].to_owned()),
            Token::Variable => DeclarationValue::Variable(text[1..].to_owned()),
            _ => return Err(self.error(format!("unexpected `{text}` in value"))),
        };
        self.cursor += 1;
        Ok(value)
    }
}

fn is_qualifier(token: Token) -> bool {
    matches!(
        token,
        Token::Dot | Token::Hash | Token::HexColor | Token::PseudoClass
    )
}

/// `"1.5em"` → `("1.5", "em")`.
fn split_dimension(text: &str) -> Option<(&str, &str)> {
    let split = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && i == 0)))
        .map(|(i, _)| i)?;
    (split > 0).then(|| text.split_at(split))
}
