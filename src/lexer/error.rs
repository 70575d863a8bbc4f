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

use thiserror::Error;

use crate::location::SourceLoc;

#[derive(Clone, Debug, Error)]
pub enum Error
{
    #[error("unknown character '{1}' at {0}")]
    UnknownCharacter(SourceLoc, char),
    #[error("malformed number '{1}' at {0}")]
    MalformedNumber(SourceLoc, String),
    #[error("unterminated block comment at {0}")]
    UnterminatedComment(SourceLoc),
    #[error("malformed preprocessor directive at {0}")]
    MalformedDirective(SourceLoc)
}

impl Error
{
    pub fn loc(&self) -> &SourceLoc
    {
        match self {
            Error::UnknownCharacter(loc, _) => loc,
            Error::MalformedNumber(loc, _) => loc,
            Error::UnterminatedComment(loc) => loc,
            Error::MalformedDirective(loc) => loc
        }
    }

    /// The offending text, as quoted in the session info log.
    pub fn lexeme(&self) -> String
    {
        match self {
            Error::UnknownCharacter(_, c) => c.to_string(),
            Error::MalformedNumber(_, s) => s.clone(),
            Error::UnterminatedComment(_) => "/*".into(),
            Error::MalformedDirective(_) => "#".into()
        }
    }

    pub fn message(&self) -> &'static str
    {
        match self {
            Error::UnknownCharacter(..) => "unknown character",
            Error::MalformedNumber(..) => "malformed number",
            Error::UnterminatedComment(_) => "unterminated comment",
            Error::MalformedDirective(_) => "malformed preprocessor directive"
        }
    }
}
