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

use bp3d_hlslang::{initialize, Compiler, Stage, TargetVersion};
use proptest::prelude::*;

proptest! {
    // arbitrary input must never crash the session; a failed parse must
    // leave something in the info log
    #[test]
    fn parse_never_panics(source in "[ -~\\n\\t]{0,128}")
    {
        prop_assert!(initialize());
        let mut compiler = Compiler::new(Stage::Fragment);
        let ok = compiler.parse(Some(&source), TargetVersion::GlslEs100, 0);
        if !ok {
            prop_assert!(!compiler.info_log().is_empty());
        }
    }

    #[test]
    fn translate_never_panics(entry in "[A-Za-z_][A-Za-z0-9_]{0,12}")
    {
        prop_assert!(initialize());
        let mut compiler = Compiler::new(Stage::Vertex);
        let src = "void main (float4 vertex : POSITION, out float4 overtex : POSITION)\n{\n    overtex = vertex;\n}\n";
        prop_assert!(compiler.parse(Some(src), TargetVersion::GlslEs100, 0));
        let ok = compiler.translate(&entry, TargetVersion::GlslEs100, 0);
        prop_assert_eq!(ok, entry == "main");
    }
}
