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

use log::debug;

use crate::ast::Unit;
use crate::codegen::{self, CodegenOutput, UniformInfo};
use crate::config::{AttribSemantic, PrefixTable, Stage, TargetVersion, OPT_DUMP_INTERMEDIATE};
use crate::diag::{InfoSink, Prefix};
use crate::lexer::Lexer;
use crate::linker::Linker;
use crate::parser::{ParseContext, Parser};
use crate::symbols::SymbolTable;
use crate::transform::{propagate_mutable_uniforms, propagate_sampler_types};

/// One per-stage compile session.
///
/// Drives parse, transforms and code generation through [`Compiler::parse`],
/// then linking through [`Compiler::translate`]. The session owns its tree,
/// its derived symbol table and its output; nothing is shared between
/// sessions except the process-wide built-in tables, so sessions may run
/// concurrently on separate threads.
pub struct Compiler
{
    stage: Stage,
    prefix: PrefixTable,
    sink: InfoSink,
    linker: Linker,
    parsed: Option<CodegenOutput>
}

impl Compiler
{
    pub fn new(stage: Stage) -> Compiler
    {
        Self::with_prefix(stage, PrefixTable::default())
    }

    pub fn with_prefix(stage: Stage, prefix: PrefixTable) -> Compiler
    {
        Compiler {
            stage,
            linker: Linker::new(prefix.clone()),
            prefix,
            sink: InfoSink::new(),
            parsed: None
        }
    }

    pub fn stage(&self) -> Stage
    {
        self.stage
    }

    /// Parses one shader text and runs the transform passes and the code
    /// generator. Returns true on success; diagnostics are retrieved
    /// through [`Compiler::info_log`]. A missing source text succeeds with
    /// empty output.
    pub fn parse(&mut self, source: Option<&str>, version: TargetVersion, options: u32) -> bool
    {
        self.sink.erase();
        let source = match source {
            Some(v) => v,
            None => return true
        };
        self.parsed = None;
        let builtins = match crate::shared_builtins() {
            Some(v) => v,
            None => {
                self.sink
                    .message(Prefix::InternalError, "Compiler is not initialized.");
                return false;
            }
        };
        let mut lexer = Lexer::new();
        if let Err(error) = lexer.process(source) {
            self.sink.error(error.loc(), &error.lexeme(), error.message());
            return false;
        }
        let mut unit = Unit::new();
        let aborted = {
            let table = SymbolTable::with_shared(builtins.stage(self.stage));
            let mut ctx = ParseContext::new(table, &mut unit, &mut self.sink);
            ctx.table.push();
            if !ctx.table.at_global_level() {
                ctx.sink
                    .message(Prefix::InternalError, "Wrong symbol table level");
            }
            let mut parser = Parser::new(lexer);
            !parser.parse_unit(&mut ctx)
        };
        if options & OPT_DUMP_INTERMEDIATE != 0 {
            let mut lines = Vec::new();
            unit.dump(&mut lines);
            for line in lines {
                self.sink.debug_line(&line);
            }
        }
        if aborted || self.sink.error_count() > 0 {
            // keep the log authoritative even when nothing was recorded
            if self.sink.info_is_empty() {
                self.sink.raw(&format!(
                    "ERROR: {} compilation errors.  No code generated.\n\n",
                    self.sink.error_count().max(1)
                ));
            }
            return false;
        }
        propagate_sampler_types(&mut unit, &mut self.sink);
        propagate_mutable_uniforms(&mut unit);
        if self.sink.error_count() > 0 {
            return false;
        }
        let output = codegen::run(&unit, version, &self.prefix, &mut self.sink);
        debug!(
            "parsed {:?} shader: {} function(s), {} uniform(s)",
            self.stage,
            output.functions.len(),
            output.uniforms.len()
        );
        self.parsed = Some(output);
        true
    }

    /// Links the parsed shader against an entry point, producing the final
    /// GLSL text and the uniform reflection table. Requires a prior
    /// successful [`Compiler::parse`] on this session.
    pub fn translate(&mut self, entry: &str, version: TargetVersion, _options: u32) -> bool
    {
        self.sink.erase_info();
        let output = match &self.parsed {
            Some(v) => v,
            None => {
                self.sink
                    .message(Prefix::Error, "Shader does not have valid object code.");
                return false;
            }
        };
        self.linker
            .link(output, entry, self.stage, version, &mut self.sink)
    }

    /// The last successfully linked GLSL text; empty before the first
    /// successful translation on this session.
    pub fn shader(&self) -> &str
    {
        self.linker.shader_text()
    }

    pub fn info_log(&self) -> String
    {
        self.sink.log()
    }

    pub fn uniform_count(&self) -> usize
    {
        self.linker.uniforms().len()
    }

    pub fn uniforms(&self) -> &[UniformInfo]
    {
        self.linker.uniforms()
    }

    /// Overrides synthesized attribute names for the given input semantics.
    /// Entries apply in order; the call fails on the first name that is
    /// already claimed by a different semantic, keeping earlier entries.
    /// Takes effect at the next [`Compiler::translate`].
    pub fn set_user_attribute_names(
        &mut self,
        semantics: &[AttribSemantic],
        names: &[&str]
    ) -> bool
    {
        for (semantic, name) in semantics.iter().zip(names) {
            if !self.linker.set_user_attrib_name(*semantic, name) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn null_source_is_success()
    {
        let mut compiler = Compiler::new(Stage::Vertex);
        assert!(compiler.parse(None, TargetVersion::GlslEs100, 0));
        assert!(compiler.info_log().is_empty());
        assert_eq!(compiler.shader(), "");
    }

    #[test]
    fn translate_without_parse_fails()
    {
        let mut compiler = Compiler::new(Stage::Fragment);
        assert!(!compiler.translate("main", TargetVersion::GlslEs100, 0));
        assert_eq!(
            compiler.info_log(),
            "ERROR: Shader does not have valid object code.\n"
        );
    }

    #[test]
    fn attribute_name_collision_fails()
    {
        let mut compiler = Compiler::new(Stage::Vertex);
        assert!(compiler.set_user_attribute_names(
            &[AttribSemantic::Position, AttribSemantic::Normal],
            &["a_position", "a_normal"]
        ));
        assert!(!compiler.set_user_attribute_names(&[AttribSemantic::Tangent], &["a_position"]));
    }

    #[test]
    fn parse_then_translate()
    {
        assert!(crate::initialize());
        let mut compiler = Compiler::new(Stage::Vertex);
        let src = "float4x4 mvp;\nvoid main (float4 vertex : POSITION, out float4 overtex : POSITION)\n{\n    overtex = mul (mvp, vertex);\n}\n";
        assert!(compiler.parse(Some(src), TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
        assert!(compiler.translate("main", TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
        let text = compiler.shader();
        assert!(text.contains("uniform highp mat4 mvp;"));
        assert!(text.contains("void xlat_main( in highp vec4 vertex, out highp vec4 overtex ) {"));
        assert!(text.contains("gl_Position = vec4(xlt_overtex);"));
        assert_eq!(compiler.uniform_count(), 1);
        assert_eq!(compiler.uniforms()[0].type_code, 21);
    }

    #[test]
    fn intermediate_dump_reaches_debug_log()
    {
        assert!(crate::initialize());
        let mut compiler = Compiler::new(Stage::Vertex);
        let src = "void main (float4 vertex : POSITION, out float4 overtex : POSITION)\n{\n    overtex = vertex;\n}\n";
        assert!(compiler.parse(Some(src), TargetVersion::GlslEs100, OPT_DUMP_INTERMEDIATE));
        assert!(compiler.info_log().contains("Sequence"));
    }
}
