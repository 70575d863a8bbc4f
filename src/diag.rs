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

use std::fmt::Write;

use crate::location::SourceLoc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prefix
{
    Warning,
    Error,
    InternalError
}

impl Prefix
{
    pub fn text(&self) -> &'static str
    {
        match self {
            Prefix::Warning => "WARNING: ",
            Prefix::Error => "ERROR: ",
            Prefix::InternalError => "INTERNAL ERROR: "
        }
    }
}

/// Accumulates diagnostics and debug output for one compile session.
///
/// The info channel carries the user-facing log; the debug channel carries
/// the intermediate-tree dump when requested. The full log is the info text
/// followed by the debug text.
pub struct InfoSink
{
    info: String,
    debug: String,
    errors: usize
}

impl Default for InfoSink
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl InfoSink
{
    pub fn new() -> InfoSink
    {
        InfoSink {
            info: String::new(),
            debug: String::new(),
            errors: 0
        }
    }

    pub fn erase(&mut self)
    {
        self.info.clear();
        self.debug.clear();
        self.errors = 0;
    }

    /// Clears the user-facing log but keeps the debug channel, as the
    /// translation entry point does between runs.
    pub fn erase_info(&mut self)
    {
        self.info.clear();
        self.errors = 0;
    }

    /// Records a located diagnostic. The format is part of the external
    /// contract, down to the space before the newline:
    /// `<file>(<line>): ERROR: '<lexeme>' : <message> `
    pub fn error(&mut self, loc: &SourceLoc, lexeme: &str, message: &str)
    {
        self.errors += 1;
        // writing to a String cannot fail
        let _ = write!(self.info, "{}: ERROR: '{}' : {} \n", loc, lexeme, message);
    }

    /// Records an unlocated message, e.g. a link failure.
    pub fn message(&mut self, prefix: Prefix, message: &str)
    {
        if prefix != Prefix::Warning {
            self.errors += 1;
        }
        self.info.push_str(prefix.text());
        self.info.push_str(message);
        self.info.push('\n');
    }

    pub fn raw(&mut self, text: &str)
    {
        self.info.push_str(text);
    }

    pub fn debug_line(&mut self, text: &str)
    {
        self.debug.push_str(text);
        self.debug.push('\n');
    }

    pub fn error_count(&self) -> usize
    {
        self.errors
    }

    pub fn info_is_empty(&self) -> bool
    {
        self.info.is_empty()
    }

    pub fn log(&self) -> String
    {
        let mut out = self.info.clone();
        out.push_str(&self.debug);
        out
    }
}
