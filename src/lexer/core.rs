// Copyright (c) 2021, BlockProject 3D
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of BlockProject 3D nor the names of its contributors
//       may be used to endorse or promote products derived from this software
//       without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::collections::VecDeque;
use std::sync::Arc;

use regex::Regex;

use crate::lexer::error::Error;
use crate::lexer::token::{check_keyword, Token, TokenEntry};
use crate::location::SourceLoc;

fn is_ident_start(chr: u8) -> bool
{
    chr.is_ascii_alphabetic() || chr == b'_'
}

fn is_ident_part(chr: u8) -> bool
{
    chr.is_ascii_alphanumeric() || chr == b'_'
}

/// Tokenizer for the shading language. Tracks a running source location and
/// honors `#line N` / `#line N "file"` directives: the line following a
/// directive carries the given number, and the file name stays in effect
/// until replaced.
pub struct Lexer
{
    tokens: VecDeque<TokenEntry>,
    cur_loc: SourceLoc,
    line_directive: Regex
}

impl Default for Lexer
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Lexer
{
    pub fn new() -> Lexer
    {
        Lexer {
            tokens: VecDeque::new(),
            cur_loc: SourceLoc::line(1),
            // SAFETY: the pattern is a constant known to compile
            line_directive: Regex::new(r#"^line\s+(\d+)(?:\s+"([^"]*)")?\s*$"#).unwrap()
        }
    }

    pub fn process(&mut self, code: &str) -> Result<(), Error>
    {
        let bytes = code.as_bytes();
        let mut pos = 0;
        // line number to apply at the next newline, set by a #line directive
        let mut pending_line: Option<u32> = None;
        while pos < bytes.len() {
            let chr = bytes[pos];
            if chr == b'\n' {
                match pending_line.take() {
                    Some(line) => self.cur_loc.line = line,
                    None => self.cur_loc.line += 1
                }
                pos += 1;
                continue;
            }
            if chr == b' ' || chr == b'\t' || chr == b'\r' {
                pos += 1;
                continue;
            }
            if chr == b'/' && pos + 1 < bytes.len() {
                if bytes[pos + 1] == b'/' {
                    while pos < bytes.len() && bytes[pos] != b'\n' {
                        pos += 1;
                    }
                    continue;
                }
                if bytes[pos + 1] == b'*' {
                    pos = self.skip_block_comment(bytes, pos + 2, &mut pending_line)?;
                    continue;
                }
            }
            if chr == b'#' {
                pos = self.process_directive(code, pos + 1, &mut pending_line)?;
                continue;
            }
            if chr.is_ascii_digit() || (chr == b'.' && pos + 1 < bytes.len() && bytes[pos + 1].is_ascii_digit())
            {
                pos = self.scan_number(code, pos)?;
                continue;
            }
            if is_ident_start(chr) {
                let start = pos;
                while pos < bytes.len() && is_ident_part(bytes[pos]) {
                    pos += 1;
                }
                let text = &code[start..pos];
                let token = check_keyword(text).unwrap_or_else(|| Token::Identifier(text.into()));
                self.push(token);
                continue;
            }
            pos = self.scan_punct(bytes, pos)?;
        }
        Ok(())
    }

    fn skip_block_comment(
        &mut self,
        bytes: &[u8],
        mut pos: usize,
        pending_line: &mut Option<u32>
    ) -> Result<usize, Error>
    {
        while pos + 1 < bytes.len() {
            if bytes[pos] == b'*' && bytes[pos + 1] == b'/' {
                return Ok(pos + 2);
            }
            if bytes[pos] == b'\n' {
                match pending_line.take() {
                    Some(line) => self.cur_loc.line = line,
                    None => self.cur_loc.line += 1
                }
            }
            pos += 1;
        }
        Err(Error::UnterminatedComment(self.cur_loc.clone()))
    }

    fn process_directive(
        &mut self,
        code: &str,
        pos: usize,
        pending_line: &mut Option<u32>
    ) -> Result<usize, Error>
    {
        let bytes = code.as_bytes();
        let mut end = pos;
        while end < bytes.len() && bytes[end] != b'\n' {
            end += 1;
        }
        let text = code[pos..end].trim();
        if let Some(caps) = self.line_directive.captures(text) {
            // SAFETY: group 1 is mandatory in the pattern and all digits
            let line: u32 = caps
                .get(1)
                .unwrap()
                .as_str()
                .parse()
                .map_err(|_| Error::MalformedDirective(self.cur_loc.clone()))?;
            *pending_line = Some(line);
            if let Some(file) = caps.get(2) {
                self.cur_loc.file = Some(Arc::from(file.as_str()));
            }
            return Ok(end);
        }
        if text.starts_with("line") {
            return Err(Error::MalformedDirective(self.cur_loc.clone()));
        }
        // other preprocessor directives belong to the external preprocessor
        // and reach this lexer only in already-expanded form; skip the line
        Ok(end)
    }

    fn scan_number(&mut self, code: &str, start: usize) -> Result<usize, Error>
    {
        let bytes = code.as_bytes();
        let mut pos = start;
        let mut is_float = false;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'.' {
            is_float = true;
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
        }
        if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
            let mut exp = pos + 1;
            if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
                exp += 1;
            }
            if exp < bytes.len() && bytes[exp].is_ascii_digit() {
                is_float = true;
                pos = exp;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
        }
        let digits = &code[start..pos];
        if pos < bytes.len() && matches!(bytes[pos], b'f' | b'F' | b'h' | b'H') {
            is_float = true;
            pos += 1;
        }
        if pos < bytes.len() && is_ident_part(bytes[pos]) {
            return Err(Error::MalformedNumber(self.cur_loc.clone(), code[start..=pos].into()));
        }
        if is_float {
            let value: f32 = digits
                .parse()
                .map_err(|_| Error::MalformedNumber(self.cur_loc.clone(), digits.into()))?;
            self.push(Token::FloatConst(value));
        } else {
            let value: i64 = digits
                .parse()
                .map_err(|_| Error::MalformedNumber(self.cur_loc.clone(), digits.into()))?;
            self.push(Token::IntConst(value));
        }
        Ok(pos)
    }

    fn scan_punct(&mut self, bytes: &[u8], pos: usize) -> Result<usize, Error>
    {
        let two = if pos + 1 < bytes.len() {
            Some((bytes[pos], bytes[pos + 1]))
        } else {
            None
        };
        let token = match two {
            Some((b'+', b'+')) => Some(Token::Increment),
            Some((b'-', b'-')) => Some(Token::Decrement),
            Some((b'+', b'=')) => Some(Token::PlusAssign),
            Some((b'-', b'=')) => Some(Token::MinusAssign),
            Some((b'*', b'=')) => Some(Token::StarAssign),
            Some((b'/', b'=')) => Some(Token::SlashAssign),
            Some((b'=', b'=')) => Some(Token::Equal),
            Some((b'!', b'=')) => Some(Token::NotEqual),
            Some((b'<', b'=')) => Some(Token::LessEqual),
            Some((b'>', b'=')) => Some(Token::GreaterEqual),
            Some((b'&', b'&')) => Some(Token::AndAnd),
            Some((b'|', b'|')) => Some(Token::OrOr),
            _ => None
        };
        if let Some(token) = token {
            self.push(token);
            return Ok(pos + 2);
        }
        let token = match bytes[pos] {
            b'(' => Token::LParen,
            b')' => Token::RParen,
            b'{' => Token::LBrace,
            b'}' => Token::RBrace,
            b'[' => Token::LBracket,
            b']' => Token::RBracket,
            b',' => Token::Comma,
            b';' => Token::Semicolon,
            b':' => Token::Colon,
            b'.' => Token::Dot,
            b'?' => Token::Question,
            b'=' => Token::Assign,
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => Token::Slash,
            b'%' => Token::Percent,
            b'<' => Token::Less,
            b'>' => Token::Greater,
            b'!' => Token::Not,
            b'&' => Token::Amp,
            b'|' => Token::Pipe,
            b'^' => Token::Caret,
            b'~' => Token::Tilde,
            other => {
                return Err(Error::UnknownCharacter(self.cur_loc.clone(), other as char));
            }
        };
        self.push(token);
        Ok(pos + 1)
    }

    fn push(&mut self, token: Token)
    {
        self.tokens.push_back(TokenEntry {
            token,
            loc: self.cur_loc.clone()
        });
    }

    pub fn into_tokens(self) -> VecDeque<TokenEntry>
    {
        self.tokens
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn lex(code: &str) -> Vec<Token>
    {
        let mut lexer = Lexer::new();
        lexer.process(code).unwrap();
        lexer.into_tokens().into_iter().map(|e| e.token).collect()
    }

    #[test]
    fn basic_declaration()
    {
        let toks = lex("float4x4 matrix_mvp;");
        assert_eq!(
            toks,
            vec![
                Token::Identifier("float4x4".into()),
                Token::Identifier("matrix_mvp".into()),
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn float_suffixes()
    {
        let toks = lex("1.f 0.5 2 1.0e3");
        assert_eq!(
            toks,
            vec![
                Token::FloatConst(1.0),
                Token::FloatConst(0.5),
                Token::IntConst(2),
                Token::FloatConst(1000.0)
            ]
        );
    }

    #[test]
    fn swizzle_is_dot_identifier()
    {
        let toks = lex("uv.xyz");
        assert_eq!(
            toks,
            vec![
                Token::Identifier("uv".into()),
                Token::Dot,
                Token::Identifier("xyz".into())
            ]
        );
    }

    #[test]
    fn line_directive_resets_location()
    {
        let mut lexer = Lexer::new();
        lexer
            .process("#line 1 \"undefined-type-in.txt\"\n#line 1 \"undefined-type-in.hlsl\"\nvoid main\n{\nx\n")
            .unwrap();
        let toks: Vec<TokenEntry> = lexer.into_tokens().into_iter().collect();
        assert_eq!(toks[0].loc.line, 1);
        assert_eq!(toks[0].loc.file.as_deref(), Some("undefined-type-in.hlsl"));
        // `{` is on the line after `void main`
        assert_eq!(toks[2].loc.line, 2);
        assert_eq!(toks[3].loc.line, 3);
    }

    #[test]
    fn comments_are_skipped()
    {
        let toks = lex("a // comment\n/* block\nstill */ b");
        assert_eq!(
            toks,
            vec![Token::Identifier("a".into()), Token::Identifier("b".into())]
        );
    }

    #[test]
    fn line_numbers_advance()
    {
        let mut lexer = Lexer::new();
        lexer.process("a\nb\n\nc\n").unwrap();
        let toks: Vec<TokenEntry> = lexer.into_tokens().into_iter().collect();
        assert_eq!(toks[0].loc.line, 1);
        assert_eq!(toks[1].loc.line, 2);
        assert_eq!(toks[2].loc.line, 4);
    }

    #[test]
    fn two_char_operators()
    {
        let toks = lex("a += b == c && d");
        assert_eq!(
            toks,
            vec![
                Token::Identifier("a".into()),
                Token::PlusAssign,
                Token::Identifier("b".into()),
                Token::Equal,
                Token::Identifier("c".into()),
                Token::AndAnd,
                Token::Identifier("d".into())
            ]
        );
    }
}
