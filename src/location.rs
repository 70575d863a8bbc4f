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
use std::sync::Arc;

/// A source position carried by every tree node and every diagnostic.
///
/// The file component is optional: it is set by a `#line N "name"` directive
/// and stays in effect until the next directive replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SourceLoc
{
    pub file: Option<Arc<str>>,
    pub line: u32
}

impl SourceLoc
{
    pub fn new(file: Option<Arc<str>>, line: u32) -> SourceLoc
    {
        SourceLoc { file, line }
    }

    pub fn line(line: u32) -> SourceLoc
    {
        SourceLoc { file: None, line }
    }
}

impl Display for SourceLoc
{
    // Rendered as file(line), or just (line) when no file is active.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        if let Some(file) = &self.file {
            f.write_str(file)?;
        }
        if self.line > 0 {
            write!(f, "({})", self.line)
        } else {
            f.write_str("(?)")
        }
    }
}

/// Appends a `#line` directive for the given location.
///
/// The GLSL spec (1.10 and 1.20) does not allow a file name here, only an
/// integer source string number, so the file component is never printed.
pub fn write_line_directive(out: &mut String, indent: &str, loc: &SourceLoc)
{
    out.push_str(indent);
    out.push_str("#line ");
    out.push_str(&loc.line.to_string());
    out.push('\n');
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn display_with_file()
    {
        let loc = SourceLoc::new(Some("test.hlsl".into()), 12);
        assert_eq!(loc.to_string(), "test.hlsl(12)");
    }

    #[test]
    fn display_without_file()
    {
        let loc = SourceLoc::line(7);
        assert_eq!(loc.to_string(), "(7)");
    }

    #[test]
    fn display_unknown_line()
    {
        let loc = SourceLoc::new(None, 0);
        assert_eq!(loc.to_string(), "(?)");
    }

    #[test]
    fn line_directive()
    {
        let mut out = String::new();
        write_line_directive(&mut out, "    ", &SourceLoc::new(Some("a.hlsl".into()), 4));
        assert_eq!(out, "    #line 4\n");
    }
}
