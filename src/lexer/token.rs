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

use std::fmt::{Display, Formatter};

use crate::location::SourceLoc;

#[derive(Clone, Debug, PartialEq)]
pub enum Token
{
    Identifier(String),
    IntConst(i64),
    FloatConst(f32),
    BoolConst(bool),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Question,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Increment,
    Decrement,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    AndAnd,
    OrOr,
    Not,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Struct,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    Discard,
    Const,
    Static,
    Uniform,
    In,
    Out,
    InOut,
    Void,
    Register
}

pub fn check_keyword(text: &str) -> Option<Token>
{
    match text {
        "struct" => Some(Token::Struct),
        "return" => Some(Token::Return),
        "if" => Some(Token::If),
        "else" => Some(Token::Else),
        "for" => Some(Token::For),
        "while" => Some(Token::While),
        "do" => Some(Token::Do),
        "break" => Some(Token::Break),
        "continue" => Some(Token::Continue),
        "discard" => Some(Token::Discard),
        "const" => Some(Token::Const),
        "static" => Some(Token::Static),
        "uniform" => Some(Token::Uniform),
        "in" => Some(Token::In),
        "out" => Some(Token::Out),
        "inout" => Some(Token::InOut),
        "void" => Some(Token::Void),
        "register" => Some(Token::Register),
        "true" => Some(Token::BoolConst(true)),
        "false" => Some(Token::BoolConst(false)),
        _ => None
    }
}

impl Token
{
    /// The source text used when this token appears in a diagnostic.
    pub fn lexeme(&self) -> String
    {
        match self {
            Token::Identifier(s) => s.clone(),
            Token::IntConst(i) => i.to_string(),
            Token::FloatConst(f) => f.to_string(),
            Token::BoolConst(b) => b.to_string(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBrace => "{".into(),
            Token::RBrace => "}".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),
            Token::Comma => ",".into(),
            Token::Semicolon => ";".into(),
            Token::Colon => ":".into(),
            Token::Dot => ".".into(),
            Token::Question => "?".into(),
            Token::Assign => "=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::PlusAssign => "+=".into(),
            Token::MinusAssign => "-=".into(),
            Token::StarAssign => "*=".into(),
            Token::SlashAssign => "/=".into(),
            Token::Increment => "++".into(),
            Token::Decrement => "--".into(),
            Token::Equal => "==".into(),
            Token::NotEqual => "!=".into(),
            Token::Less => "<".into(),
            Token::Greater => ">".into(),
            Token::LessEqual => "<=".into(),
            Token::GreaterEqual => ">=".into(),
            Token::AndAnd => "&&".into(),
            Token::OrOr => "||".into(),
            Token::Not => "!".into(),
            Token::Amp => "&".into(),
            Token::Pipe => "|".into(),
            Token::Caret => "^".into(),
            Token::Tilde => "~".into(),
            Token::Struct => "struct".into(),
            Token::Return => "return".into(),
            Token::If => "if".into(),
            Token::Else => "else".into(),
            Token::For => "for".into(),
            Token::While => "while".into(),
            Token::Do => "do".into(),
            Token::Break => "break".into(),
            Token::Continue => "continue".into(),
            Token::Discard => "discard".into(),
            Token::Const => "const".into(),
            Token::Static => "static".into(),
            Token::Uniform => "uniform".into(),
            Token::In => "in".into(),
            Token::Out => "out".into(),
            Token::InOut => "inout".into(),
            Token::Void => "void".into(),
            Token::Register => "register".into()
        }
    }

    pub fn identifier(self) -> Option<String>
    {
        if let Token::Identifier(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

impl Display for Token
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.write_str(&self.lexeme())
    }
}

pub struct TokenEntry
{
    pub token: Token,
    pub loc: SourceLoc
}
