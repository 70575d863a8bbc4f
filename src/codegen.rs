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

//! Target-aware translation of the typed tree into per-function GLSL
//! fragments plus the struct, global and uniform records the linker
//! assembles into the final text.

mod function;
mod output;

pub use function::{CodegenOutput, GlslFunction, GlslGlobal, UniformInfo};
pub use output::run;

use crate::ast::types::{Basic, Precision, TypeInfo};
use crate::ast::StructDef;
use crate::config::TargetVersion;

/// GLSL spelling of a type under the given target version.
pub fn type_name(version: TargetVersion, ty: &TypeInfo, structs: &[StructDef]) -> String
{
    match ty.basic {
        Basic::Void => "void".into(),
        Basic::Bool => {
            if ty.rows > 1 {
                format!("bvec{}", ty.rows)
            } else {
                "bool".into()
            }
        }
        Basic::Int => {
            if ty.rows > 1 {
                format!("ivec{}", ty.rows)
            } else {
                "int".into()
            }
        }
        Basic::Uint => {
            // unsigned integers only exist in the modern dialects
            let (scalar, vector) = if version.is_legacy() {
                ("int", "ivec")
            } else {
                ("uint", "uvec")
            };
            if ty.rows > 1 {
                format!("{}{}", vector, ty.rows)
            } else {
                scalar.into()
            }
        }
        Basic::Float => {
            if ty.is_matrix() {
                if ty.rows == ty.cols {
                    format!("mat{}", ty.rows)
                } else {
                    format!("mat{}x{}", ty.rows, ty.cols)
                }
            } else if ty.rows > 1 {
                format!("vec{}", ty.rows)
            } else {
                "float".into()
            }
        }
        Basic::Sampler | Basic::Sampler2D => "sampler2D".into(),
        Basic::Sampler1D => "sampler1D".into(),
        Basic::Sampler1DShadow => "sampler1DShadow".into(),
        Basic::Sampler2DShadow => "sampler2DShadow".into(),
        Basic::Sampler3D => "sampler3D".into(),
        Basic::SamplerCube => "samplerCube".into(),
        Basic::SamplerRect => "sampler2DRect".into(),
        Basic::SamplerRectShadow => "sampler2DRectShadow".into(),
        Basic::Struct => ty
            .struct_ref
            .and_then(|id| structs.get(id as usize))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "struct".into())
    }
}

/// Precision qualifier including the trailing space, or empty when the
/// target carries no precision qualifiers or the type takes none.
pub fn precision_prefix(version: TargetVersion, ty: &TypeInfo) -> &'static str
{
    if !version.uses_precision() {
        return "";
    }
    if !ty.basic.is_numeric() && !ty.basic.is_sampler() {
        return "";
    }
    match ty.precision {
        Precision::High => "highp ",
        Precision::Medium => "mediump ",
        Precision::Low => "lowp ",
        Precision::None => ""
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn float_family_names()
    {
        let v = TargetVersion::GlslEs100;
        assert_eq!(type_name(v, &TypeInfo::scalar(Basic::Float, Precision::High), &[]), "float");
        assert_eq!(type_name(v, &TypeInfo::vector(Basic::Float, 4, Precision::Low), &[]), "vec4");
        assert_eq!(type_name(v, &TypeInfo::matrix(4, 4, Precision::High), &[]), "mat4");
        assert_eq!(type_name(v, &TypeInfo::matrix(2, 3, Precision::High), &[]), "mat2x3");
    }

    #[test]
    fn precision_only_on_es_targets()
    {
        let hi = TypeInfo::scalar(Basic::Float, Precision::High);
        assert_eq!(precision_prefix(TargetVersion::GlslEs100, &hi), "highp ");
        assert_eq!(precision_prefix(TargetVersion::Glsl120, &hi), "");
        let shadow = TypeInfo::sampler(Basic::Sampler2DShadow);
        assert_eq!(precision_prefix(TargetVersion::GlslEs300, &shadow), "lowp ");
        let b = TypeInfo::scalar(Basic::Bool, Precision::None);
        assert_eq!(precision_prefix(TargetVersion::GlslEs100, &b), "");
    }

    #[test]
    fn uint_degrades_on_legacy_targets()
    {
        let u = TypeInfo::scalar(Basic::Uint, Precision::High);
        assert_eq!(type_name(TargetVersion::GlslEs100, &u, &[]), "int");
        assert_eq!(type_name(TargetVersion::GlslEs300, &u, &[]), "uint");
    }
}
