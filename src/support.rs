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

use crate::ast::types::{Basic, TypeInfo};
use crate::config::{PrefixTable, TargetVersion};

/// Support helpers the code generator may require. The same identifier
/// resolves to different snippets under different target versions; that is
/// the only legitimate reason two compiles of one shader differ textually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HelperId
{
    ConstructMat2FromMat3,
    ConstructMat2FromMat4,
    ConstructMat3FromMat4,
    Shadow2D,
    Shadow2DProj
}

impl HelperId
{
    /// Base name; the caller adds the configured helper prefix. Construct
    /// helpers carry the mangled source type so variants never collide.
    pub fn name(&self) -> &'static str
    {
        match self {
            HelperId::ConstructMat2FromMat3 => "constructMat2_mf3x3",
            HelperId::ConstructMat2FromMat4 => "constructMat2_mf4x4",
            HelperId::ConstructMat3FromMat4 => "constructMat3_mf4x4",
            HelperId::Shadow2D => "shadow2D",
            HelperId::Shadow2DProj => "shadow2Dproj"
        }
    }
}

/// Per-target table of helper snippets and intrinsic substitutions.
pub struct SupportLib
{
    version: TargetVersion
}

impl SupportLib
{
    pub fn new(version: TargetVersion) -> SupportLib
    {
        SupportLib { version }
    }

    /// Picks the construct helper for a matrix truncation, or None when the
    /// target version has the constructor built in.
    pub fn matrix_construct_helper(&self, target_rows: u8, source: &TypeInfo) -> Option<HelperId>
    {
        if !self.version.is_legacy() {
            return None;
        }
        match (target_rows, source.rows) {
            (2, 3) => Some(HelperId::ConstructMat2FromMat3),
            (2, 4) => Some(HelperId::ConstructMat2FromMat4),
            (3, 4) => Some(HelperId::ConstructMat3FromMat4),
            _ => None
        }
    }

    /// GLSL call name for a texture fetch on the given sampler type.
    pub fn texture_fn(&self, sampler: Basic, proj: bool) -> &'static str
    {
        if !self.version.is_legacy() {
            return if proj { "textureProj" } else { "texture" };
        }
        match (sampler, proj) {
            (Basic::Sampler2DShadow, false) => "shadow2D",
            (Basic::Sampler2DShadow, true) => "shadow2DProj",
            (Basic::Sampler1D, false) => "texture1D",
            (Basic::Sampler1D, true) => "texture1DProj",
            (Basic::Sampler3D, false) => "texture3D",
            (Basic::Sampler3D, true) => "texture3DProj",
            (Basic::SamplerCube, _) => "textureCube",
            (_, true) => "texture2DProj",
            (_, false) => "texture2D"
        }
    }

    /// Extension directive a helper demands under this target, if any.
    pub fn extension(&self, id: HelperId) -> Option<&'static str>
    {
        match id {
            HelperId::Shadow2D | HelperId::Shadow2DProj
                if self.version == TargetVersion::GlslEs100 =>
            {
                Some("GL_EXT_shadow_samplers")
            }
            _ => None
        }
    }

    /// The helper's GLSL text, or None when the target spells it with a
    /// built-in instead.
    pub fn snippet(&self, id: HelperId, prefix: &PrefixTable) -> Option<String>
    {
        let text: &'static str = match id {
            HelperId::ConstructMat2FromMat3 => {
                if !self.version.is_legacy() {
                    return None;
                }
                "mat2 <h>constructMat2_mf3x3( mat3 m) {\n  return mat2( vec2( m[0]), vec2( m[1]));\n}\n"
            }
            HelperId::ConstructMat2FromMat4 => {
                if !self.version.is_legacy() {
                    return None;
                }
                "mat2 <h>constructMat2_mf4x4( mat4 m) {\n  return mat2( vec2( m[0]), vec2( m[1]));\n}\n"
            }
            HelperId::ConstructMat3FromMat4 => {
                if !self.version.is_legacy() {
                    return None;
                }
                "mat3 <h>constructMat3_mf4x4( mat4 m) {\n  return mat3( vec3( m[0]), vec3( m[1]), vec3( m[2]));\n}\n"
            }
            HelperId::Shadow2D => match self.version {
                TargetVersion::GlslEs100 => {
                    "float <h>shadow2D(sampler2DShadow s, vec3 coord) { return shadow2DEXT (s, coord); }\n"
                }
                TargetVersion::GlslEs300 => {
                    "float <h>shadow2D(mediump sampler2DShadow s, vec3 coord) { return texture (s, coord); }\n"
                }
                TargetVersion::Glsl110 | TargetVersion::Glsl120 => {
                    "float <h>shadow2D(sampler2DShadow s, vec3 coord) { return shadow2D (s, coord).x; }\n"
                }
                TargetVersion::Glsl140 => {
                    "float <h>shadow2D(sampler2DShadow s, vec3 coord) { return texture (s, coord); }\n"
                }
            },
            HelperId::Shadow2DProj => match self.version {
                TargetVersion::GlslEs100 => {
                    "float <h>shadow2Dproj(sampler2DShadow s, vec4 coord) { return shadow2DProjEXT (s, coord); }\n"
                }
                TargetVersion::GlslEs300 => {
                    "float <h>shadow2Dproj(mediump sampler2DShadow s, vec4 coord) { return textureProj (s, coord); }\n"
                }
                TargetVersion::Glsl110 | TargetVersion::Glsl120 => {
                    "float <h>shadow2Dproj(sampler2DShadow s, vec4 coord) { return shadow2DProj (s, coord).x; }\n"
                }
                TargetVersion::Glsl140 => {
                    "float <h>shadow2Dproj(sampler2DShadow s, vec4 coord) { return textureProj (s, coord); }\n"
                }
            }
        };
        Some(text.replace("<h>", &prefix.helper("")))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn mat3_helper_only_on_legacy_targets()
    {
        let legacy = SupportLib::new(TargetVersion::GlslEs100);
        let m4 = TypeInfo::matrix(4, 4, crate::ast::Precision::High);
        assert_eq!(
            legacy.matrix_construct_helper(3, &m4),
            Some(HelperId::ConstructMat3FromMat4)
        );
        let modern = SupportLib::new(TargetVersion::GlslEs300);
        assert_eq!(modern.matrix_construct_helper(3, &m4), None);
        let desktop = SupportLib::new(TargetVersion::Glsl140);
        assert_eq!(desktop.matrix_construct_helper(3, &m4), None);
    }

    #[test]
    fn mat3_snippet_text()
    {
        let lib = SupportLib::new(TargetVersion::GlslEs100);
        let prefix = PrefixTable::default();
        assert_eq!(
            lib.snippet(HelperId::ConstructMat3FromMat4, &prefix).unwrap(),
            "mat3 xll_constructMat3_mf4x4( mat4 m) {\n  return mat3( vec3( m[0]), vec3( m[1]), vec3( m[2]));\n}\n"
        );
    }

    #[test]
    fn shadow_snippets_per_version()
    {
        let prefix = PrefixTable::default();
        let es2 = SupportLib::new(TargetVersion::GlslEs100);
        assert_eq!(
            es2.snippet(HelperId::Shadow2D, &prefix).unwrap(),
            "float xll_shadow2D(sampler2DShadow s, vec3 coord) { return shadow2DEXT (s, coord); }\n"
        );
        assert_eq!(es2.extension(HelperId::Shadow2D), Some("GL_EXT_shadow_samplers"));
        let es3 = SupportLib::new(TargetVersion::GlslEs300);
        assert_eq!(
            es3.snippet(HelperId::Shadow2DProj, &prefix).unwrap(),
            "float xll_shadow2Dproj(mediump sampler2DShadow s, vec4 coord) { return textureProj (s, coord); }\n"
        );
        assert_eq!(es3.extension(HelperId::Shadow2D), None);
    }

    #[test]
    fn texture_fn_names()
    {
        let legacy = SupportLib::new(TargetVersion::GlslEs100);
        assert_eq!(legacy.texture_fn(Basic::Sampler2D, false), "texture2D");
        assert_eq!(legacy.texture_fn(Basic::Sampler2D, true), "texture2DProj");
        assert_eq!(legacy.texture_fn(Basic::Sampler2DShadow, false), "shadow2D");
        assert_eq!(legacy.texture_fn(Basic::Sampler2DShadow, true), "shadow2DProj");
        let modern = SupportLib::new(TargetVersion::GlslEs300);
        assert_eq!(modern.texture_fn(Basic::Sampler2DShadow, false), "texture");
        assert_eq!(modern.texture_fn(Basic::Sampler2D, true), "textureProj");
    }
}
