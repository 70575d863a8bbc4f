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

//! Whole-tree rewrites that run between parsing and code generation.

mod mutable;
mod samplers;

pub use mutable::propagate_mutable_uniforms;
pub use samplers::propagate_sampler_types;

use crate::ast::{AggOp, NodeId, NodeKind, Unit};
use crate::location::SourceLoc;

/// Invokes `visit` for every function call node under `id`, leaves first.
pub(crate) fn walk_calls<F: FnMut(&str, &[NodeId], &SourceLoc)>(unit: &Unit, id: NodeId, visit: &mut F)
{
    let node = unit.arena.node(id);
    match &node.kind {
        NodeKind::Symbol { .. } | NodeKind::Constant(_) => (),
        NodeKind::Unary { operand, .. } => walk_calls(unit, *operand, visit),
        NodeKind::Binary { left, right, .. } => {
            walk_calls(unit, *left, visit);
            walk_calls(unit, *right, visit);
        }
        NodeKind::Selection {
            cond,
            then_block,
            else_block
        } => {
            walk_calls(unit, *cond, visit);
            if let Some(id) = then_block {
                walk_calls(unit, *id, visit);
            }
            if let Some(id) = else_block {
                walk_calls(unit, *id, visit);
            }
        }
        NodeKind::Loop {
            init,
            cond,
            step,
            body,
            ..
        } => {
            for id in [init, cond, step].into_iter().flatten() {
                walk_calls(unit, *id, visit);
            }
            walk_calls(unit, *body, visit);
        }
        NodeKind::Branch { value, .. } => {
            if let Some(id) = value {
                walk_calls(unit, *id, visit);
            }
        }
        NodeKind::Aggregate { op, name, children } => {
            for child in children {
                walk_calls(unit, *child, visit);
            }
            if *op == AggOp::FunctionCall {
                visit(name, children, &node.loc);
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::ast::types::Basic;
    use crate::diag::InfoSink;
    use crate::lexer::Lexer;
    use crate::parser::{ParseContext, Parser};
    use crate::symbols::SymbolTable;

    fn parse_with_builtins(source: &str) -> (Unit, InfoSink)
    {
        let builtins = crate::builtins::seed_all().unwrap();
        let mut unit = Unit::new();
        let mut sink = InfoSink::new();
        let mut lexer = Lexer::new();
        lexer.process(source).unwrap();
        let table = SymbolTable::with_shared(builtins.fragment);
        let mut ctx = ParseContext::new(table, &mut unit, &mut sink);
        ctx.table.push();
        let mut parser = Parser::new(lexer);
        assert!(parser.parse_unit(&mut ctx));
        assert_eq!(sink.error_count(), 0, "{}", sink.log());
        (unit, sink)
    }

    #[test]
    fn generic_sampler_constrained_by_use()
    {
        let (mut unit, mut sink) = parse_with_builtins(
            "sampler shadowmap;\nsampler env;\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    return texCUBE(env, uv.xyz) + shadow2D(shadowmap, uv.xyz);\n}\n"
        );
        propagate_sampler_types(&mut unit, &mut sink);
        assert_eq!(unit.globals[0].ty.basic, Basic::Sampler2DShadow);
        assert_eq!(unit.globals[1].ty.basic, Basic::SamplerCube);
        assert_eq!(sink.error_count(), 0);
    }

    #[test]
    fn unconstrained_sampler_defaults_to_2d()
    {
        let (mut unit, mut sink) =
            parse_with_builtins("sampler unused;\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    return uv;\n}\n");
        propagate_sampler_types(&mut unit, &mut sink);
        assert_eq!(unit.globals[0].ty.basic, Basic::Sampler2D);
    }

    #[test]
    fn conflicting_sampler_constraints_are_diagnosed()
    {
        let (mut unit, mut sink) = parse_with_builtins(
            "sampler s;\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    return tex3D(s, uv.xyz) + texCUBE(s, uv.xyz);\n}\n"
        );
        propagate_sampler_types(&mut unit, &mut sink);
        assert!(sink.error_count() > 0);
    }

    #[test]
    fn constraint_crosses_function_boundary()
    {
        let (mut unit, mut sink) = parse_with_builtins(
            "sampler shadowmap;\nfloat sample_one(sampler2DShadow s, float3 uv)\n{\n    return shadow2D(s, uv);\n}\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    return sample_one(shadowmap, uv.xyz);\n}\n"
        );
        propagate_sampler_types(&mut unit, &mut sink);
        assert_eq!(unit.globals[0].ty.basic, Basic::Sampler2DShadow);
    }

    #[test]
    fn assigned_uniform_is_marked_mutable()
    {
        let (mut unit, _) = parse_with_builtins(
            "float4 tint;\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    tint = uv;\n    return tint;\n}\n"
        );
        propagate_mutable_uniforms(&mut unit);
        assert!(unit.globals[0].mutable);
    }

    #[test]
    fn uniform_passed_to_out_param_is_mutable()
    {
        let (mut unit, _) = parse_with_builtins(
            "float4 tint;\nvoid fill(out float4 v)\n{\n    v = float4(1.0, 1.0, 1.0, 1.0);\n}\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    fill(tint);\n    return tint;\n}\n"
        );
        propagate_mutable_uniforms(&mut unit);
        assert!(unit.globals[0].mutable);
        assert!(unit.functions[0].params[0].written);
    }

    #[test]
    fn read_only_uniform_stays_immutable()
    {
        let (mut unit, _) = parse_with_builtins(
            "float4 tint;\nfloat4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    return tint * uv;\n}\n"
        );
        propagate_mutable_uniforms(&mut unit);
        assert!(!unit.globals[0].mutable);
    }
}
