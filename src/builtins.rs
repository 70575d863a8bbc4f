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

use std::sync::Arc;

use log::info;
use phf::phf_set;
use thiserror::Error;

use crate::ast::Unit;
use crate::config::Stage;
use crate::diag::InfoSink;
use crate::lexer::Lexer;
use crate::parser::{ParseContext, Parser};
use crate::symbols::{Scope, SymbolTable};

/// Words the language reserves without using; declaring one is an error.
static RESERVED_WORDS: phf::Set<&'static str> = phf_set! {
    "asm",
    "auto",
    "case",
    "catch",
    "char",
    "class",
    "const_cast",
    "default",
    "delete",
    "dynamic_cast",
    "enum",
    "explicit",
    "friend",
    "goto",
    "long",
    "mutable",
    "namespace",
    "new",
    "operator",
    "private",
    "protected",
    "public",
    "reinterpret_cast",
    "short",
    "signed",
    "sizeof",
    "static_cast",
    "switch",
    "template",
    "this",
    "throw",
    "try",
    "typedef",
    "typename",
    "union",
    "unsigned",
    "using",
    "virtual",
    "volatile"
};

pub fn is_reserved_word(name: &str) -> bool
{
    RESERVED_WORDS.contains(name)
}

// Intrinsic signatures shared by both stages. Parsed through the normal
// parser path so overload storage and mangling match user functions.
const COMMON_BUILTINS: &[&str] = &[
    "float4 mul(float4x4 m, float4 v);",
    "float3 mul(float3x3 m, float3 v);",
    "float2 mul(float2x2 m, float2 v);",
    "float4 mul(float4 v, float4x4 m);",
    "float3 mul(float3 v, float3x3 m);",
    "float2 mul(float2 v, float2x2 m);",
    "float4x4 mul(float4x4 a, float4x4 b);",
    "float3x3 mul(float3x3 a, float3x3 b);",
    "float2x2 mul(float2x2 a, float2x2 b);",
    "float dot(float a, float b);",
    "float dot(float2 a, float2 b);",
    "float dot(float3 a, float3 b);",
    "float dot(float4 a, float4 b);",
    "float3 cross(float3 a, float3 b);",
    "float length(float v);",
    "float length(float2 v);",
    "float length(float3 v);",
    "float length(float4 v);",
    "float distance(float2 a, float2 b);",
    "float distance(float3 a, float3 b);",
    "float distance(float4 a, float4 b);",
    "float normalize(float v);",
    "float2 normalize(float2 v);",
    "float3 normalize(float3 v);",
    "float4 normalize(float4 v);",
    "float min(float a, float b);",
    "float2 min(float2 a, float2 b);",
    "float3 min(float3 a, float3 b);",
    "float4 min(float4 a, float4 b);",
    "float max(float a, float b);",
    "float2 max(float2 a, float2 b);",
    "float3 max(float3 a, float3 b);",
    "float4 max(float4 a, float4 b);",
    "float clamp(float x, float lo, float hi);",
    "float2 clamp(float2 x, float2 lo, float2 hi);",
    "float3 clamp(float3 x, float3 lo, float3 hi);",
    "float4 clamp(float4 x, float4 lo, float4 hi);",
    "float saturate(float x);",
    "float2 saturate(float2 x);",
    "float3 saturate(float3 x);",
    "float4 saturate(float4 x);",
    "float lerp(float a, float b, float t);",
    "float2 lerp(float2 a, float2 b, float2 t);",
    "float3 lerp(float3 a, float3 b, float3 t);",
    "float4 lerp(float4 a, float4 b, float4 t);",
    "float2 lerp(float2 a, float2 b, float t);",
    "float3 lerp(float3 a, float3 b, float t);",
    "float4 lerp(float4 a, float4 b, float t);",
    "float step(float edge, float x);",
    "float2 step(float2 edge, float2 x);",
    "float3 step(float3 edge, float3 x);",
    "float4 step(float4 edge, float4 x);",
    "float smoothstep(float a, float b, float x);",
    "float2 smoothstep(float2 a, float2 b, float2 x);",
    "float3 smoothstep(float3 a, float3 b, float3 x);",
    "float4 smoothstep(float4 a, float4 b, float4 x);",
    "float pow(float x, float y);",
    "float2 pow(float2 x, float2 y);",
    "float3 pow(float3 x, float3 y);",
    "float4 pow(float4 x, float4 y);",
    "float exp(float x);",
    "float2 exp(float2 x);",
    "float3 exp(float3 x);",
    "float4 exp(float4 x);",
    "float exp2(float x);",
    "float log(float x);",
    "float log2(float x);",
    "float sqrt(float x);",
    "float2 sqrt(float2 x);",
    "float3 sqrt(float3 x);",
    "float4 sqrt(float4 x);",
    "float rsqrt(float x);",
    "float abs(float x);",
    "float2 abs(float2 x);",
    "float3 abs(float3 x);",
    "float4 abs(float4 x);",
    "float sign(float x);",
    "float floor(float x);",
    "float2 floor(float2 x);",
    "float3 floor(float3 x);",
    "float4 floor(float4 x);",
    "float ceil(float x);",
    "float frac(float x);",
    "float2 frac(float2 x);",
    "float3 frac(float3 x);",
    "float4 frac(float4 x);",
    "float fmod(float x, float y);",
    "float2 fmod(float2 x, float2 y);",
    "float3 fmod(float3 x, float3 y);",
    "float4 fmod(float4 x, float4 y);",
    "float sin(float x);",
    "float2 sin(float2 x);",
    "float3 sin(float3 x);",
    "float4 sin(float4 x);",
    "float cos(float x);",
    "float2 cos(float2 x);",
    "float3 cos(float3 x);",
    "float4 cos(float4 x);",
    "float tan(float x);",
    "float asin(float x);",
    "float acos(float x);",
    "float atan(float x);",
    "float atan2(float y, float x);",
    "float3 reflect(float3 i, float3 n);",
    "float3 refract(float3 i, float3 n, float eta);",
    "float4 tex1D(sampler1D s, float t);",
    "float4 tex2D(sampler2D s, float2 t);",
    "float4 tex2D(sampler2DShadow s, float3 t);",
    "float4 tex2Dproj(sampler2D s, float4 t);",
    "float4 tex2Dproj(sampler2DShadow s, float4 t);",
    "float4 tex3D(sampler3D s, float3 t);",
    "float4 texCUBE(samplerCUBE s, float3 t);",
    "float shadow2D(sampler2DShadow s, float3 t);",
    "float shadow2Dproj(sampler2DShadow s, float4 t);"
];

// Derivatives only exist in the fragment stage.
const FRAGMENT_BUILTINS: &[&str] = &[
    "float ddx(float x);",
    "float2 ddx(float2 x);",
    "float3 ddx(float3 x);",
    "float4 ddx(float4 x);",
    "float ddy(float x);",
    "float2 ddy(float2 x);",
    "float3 ddy(float3 x);",
    "float4 ddy(float4 x);",
    "float fwidth(float x);",
    "float2 fwidth(float2 x);",
    "float3 fwidth(float3 x);",
    "float4 fwidth(float4 x);"
];

#[derive(Debug, Error)]
pub enum SeedError
{
    #[error("failed to tokenize built-in declarations: {0}")]
    Lexer(crate::lexer::error::Error),
    #[error("failed to parse built-in declarations")]
    Parser
}

/// The per-stage built-in symbol levels, built once per process and shared
/// read-only between every subsequent compile session.
pub struct SharedBuiltins
{
    pub vertex: Arc<Scope>,
    pub fragment: Arc<Scope>
}

impl SharedBuiltins
{
    pub fn stage(&self, stage: Stage) -> Arc<Scope>
    {
        match stage {
            Stage::Vertex => self.vertex.clone(),
            Stage::Fragment => self.fragment.clone()
        }
    }
}

fn seed_stage(stage: Stage) -> Result<Arc<Scope>, SeedError>
{
    let mut table = SymbolTable::new();
    table.push();
    let mut unit = Unit::new();
    let mut sink = InfoSink::new();
    let mut ctx = ParseContext::new(table, &mut unit, &mut sink);
    ctx.seeding = true;
    let mut sources: Vec<&str> = COMMON_BUILTINS.to_vec();
    if stage == Stage::Fragment {
        sources.extend_from_slice(FRAGMENT_BUILTINS);
    }
    for decl in sources {
        let mut lexer = Lexer::new();
        lexer.process(decl).map_err(SeedError::Lexer)?;
        let mut parser = Parser::new(lexer);
        if !parser.parse_unit(&mut ctx) {
            return Err(SeedError::Parser);
        }
    }
    if ctx.sink.error_count() > 0 {
        return Err(SeedError::Parser);
    }
    Ok(ctx.table.into_shared())
}

/// Builds both per-stage tables. Idempotence is handled by the process
/// singleton that caches the result.
pub fn seed_all() -> Result<SharedBuiltins, SeedError>
{
    let vertex = seed_stage(Stage::Vertex)?;
    let fragment = seed_stage(Stage::Fragment)?;
    info!("Seeded built-in symbol tables for both shader stages");
    Ok(SharedBuiltins { vertex, fragment })
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::ast::types::{Basic, Precision, TypeInfo};

    #[test]
    fn reserved_words()
    {
        assert!(is_reserved_word("asm"));
        assert!(is_reserved_word("typedef"));
        assert!(!is_reserved_word("main"));
        assert!(!is_reserved_word("float4"));
    }

    #[test]
    fn seeding_builds_overloads()
    {
        let builtins = seed_all().unwrap();
        let table = SymbolTable::with_shared(builtins.fragment);
        let m4 = TypeInfo::matrix(4, 4, Precision::High);
        let v4 = TypeInfo::vector(Basic::Float, 4, Precision::High);
        let hit = table.resolve_call("mul", &[m4, v4]).unwrap();
        assert!(hit.builtin);
        assert_eq!(hit.ret.rows, 4);
        assert!(hit.ret.is_vector());
    }

    #[test]
    fn shadow_sampler_overload_of_tex2d()
    {
        let builtins = seed_all().unwrap();
        let table = SymbolTable::with_shared(builtins.fragment);
        let shadow = TypeInfo::sampler(Basic::Sampler2DShadow);
        let v3 = TypeInfo::vector(Basic::Float, 3, Precision::High);
        let hit = table.resolve_call("tex2D", &[shadow, v3.clone()]).unwrap();
        // the source-language tex2D returns a vector even on shadow samplers
        assert!(hit.ret.is_vector());
        let shadow = TypeInfo::sampler(Basic::Sampler2DShadow);
        let hit = table.resolve_call("shadow2D", &[shadow, v3]).unwrap();
        assert!(hit.ret.is_scalar());
    }

    #[test]
    fn derivatives_only_in_fragment_stage()
    {
        let builtins = seed_all().unwrap();
        let f = TypeInfo::scalar(Basic::Float, Precision::High);
        let vertex = SymbolTable::with_shared(builtins.vertex);
        assert!(vertex.resolve_call("ddx", &[f.clone()]).is_err());
        let fragment = SymbolTable::with_shared(builtins.fragment);
        assert!(fragment.resolve_call("ddx", &[f]).is_ok());
    }

    #[test]
    fn seeding_is_repeatable()
    {
        let a = seed_all().unwrap();
        let b = seed_all().unwrap();
        let ta = SymbolTable::with_shared(a.vertex);
        let tb = SymbolTable::with_shared(b.vertex);
        let f3 = TypeInfo::vector(Basic::Float, 3, Precision::High);
        assert_eq!(
            ta.resolve_call("normalize", &[f3.clone()]).unwrap().mangled,
            tb.resolve_call("normalize", &[f3]).unwrap().mangled
        );
    }
}
