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

use bp3d_hlslang::{initialize, shutdown, Compiler, Stage, TargetVersion};

const SRC: &str = "void main (float4 vertex : POSITION, out float4 overtex : POSITION)\n{\n    overtex = vertex;\n}\n";

// Init and shutdown mutate process-wide state, so the whole lifecycle runs
// inside a single test.
#[test]
fn init_shutdown_lifecycle()
{
    assert!(initialize());
    // repeated init is a no-op
    assert!(initialize());

    let mut compiler = Compiler::new(Stage::Vertex);
    assert!(compiler.parse(Some(SRC), TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    assert!(compiler.shader().contains("gl_Position"));

    shutdown();
    let mut stale = Compiler::new(Stage::Vertex);
    assert!(!stale.parse(Some(SRC), TargetVersion::GlslEs100, 0));
    assert!(stale.info_log().contains("INTERNAL ERROR:"));
    // a missing source text is still a successful no-op
    assert!(stale.parse(None, TargetVersion::GlslEs100, 0));

    // init brings the process back to a working state
    assert!(initialize());
    let mut fresh = Compiler::new(Stage::Vertex);
    assert!(fresh.parse(Some(SRC), TargetVersion::GlslEs100, 0), "{}", fresh.info_log());
    assert!(fresh.translate("main", TargetVersion::GlslEs100, 0), "{}", fresh.info_log());
}
