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

use serde::{Deserialize, Serialize};

/// Shader stage a compiler session translates for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage
{
    Vertex,
    Fragment
}

/// GLSL dialect the translator emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetVersion
{
    GlslEs100,
    Glsl110,
    Glsl120,
    Glsl140,
    GlslEs300
}

impl TargetVersion
{
    /// Precision qualifiers are emitted only for the ES dialects.
    pub fn uses_precision(self) -> bool
    {
        matches!(self, TargetVersion::GlslEs100 | TargetVersion::GlslEs300)
    }

    /// Legacy dialects use `attribute`/`varying` and the `texture2D` call
    /// family; modern ones use `in`/`out` and `texture`.
    pub fn is_legacy(self) -> bool
    {
        matches!(
            self,
            TargetVersion::GlslEs100 | TargetVersion::Glsl110 | TargetVersion::Glsl120
        )
    }
}

/// Dumps the intermediate tree into the session debug log.
pub const OPT_DUMP_INTERMEDIATE: u32 = 1 << 0;

/// Attribute input channels a vertex shader parameter can bind to.
///
/// Used to key user-supplied attribute names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttribSemantic
{
    Position,
    Normal,
    Color0,
    Color1,
    Texcoord0,
    Texcoord1,
    Texcoord2,
    Texcoord3,
    Texcoord4,
    Texcoord5,
    Texcoord6,
    Texcoord7,
    Texcoord8,
    Texcoord9,
    Tangent,
    Binormal,
    BlendWeight,
    BlendIndices
}

static ATTRIB_SEMANTICS: phf::Map<&'static str, AttribSemantic> = phf::phf_map! {
    "POSITION" => AttribSemantic::Position,
    "NORMAL" => AttribSemantic::Normal,
    "COLOR" => AttribSemantic::Color0,
    "COLOR0" => AttribSemantic::Color0,
    "COLOR1" => AttribSemantic::Color1,
    "TEXCOORD0" => AttribSemantic::Texcoord0,
    "TEXCOORD1" => AttribSemantic::Texcoord1,
    "TEXCOORD2" => AttribSemantic::Texcoord2,
    "TEXCOORD3" => AttribSemantic::Texcoord3,
    "TEXCOORD4" => AttribSemantic::Texcoord4,
    "TEXCOORD5" => AttribSemantic::Texcoord5,
    "TEXCOORD6" => AttribSemantic::Texcoord6,
    "TEXCOORD7" => AttribSemantic::Texcoord7,
    "TEXCOORD8" => AttribSemantic::Texcoord8,
    "TEXCOORD9" => AttribSemantic::Texcoord9,
    "TANGENT" => AttribSemantic::Tangent,
    "BINORMAL" => AttribSemantic::Binormal,
    "BLENDWEIGHT" => AttribSemantic::BlendWeight,
    "BLENDINDICES" => AttribSemantic::BlendIndices
};

impl AttribSemantic
{
    pub fn from_name(name: &str) -> Option<AttribSemantic>
    {
        ATTRIB_SEMANTICS.get(name).copied()
    }
}

/// Configurable prefix applied to every synthesized identifier.
///
/// All generated name families derive from a single prefix string; with the
/// default `"xl"` this yields the `xll_`/`xlat_`/`xlv_`/`xlt_` family, with
/// an empty prefix the `l_`/`at_`/`v_`/`t_` family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefixTable
{
    pub prefix: String
}

impl Default for PrefixTable
{
    fn default() -> Self
    {
        PrefixTable { prefix: "xl".into() }
    }
}

impl PrefixTable
{
    pub fn new<T: Into<String>>(prefix: T) -> PrefixTable
    {
        PrefixTable { prefix: prefix.into() }
    }

    /// Support helper functions: `xll_`.
    pub fn helper(&self, name: &str) -> String
    {
        format!("{}l_{}", self.prefix, name)
    }

    /// The renamed entry function: `xlat_main`.
    pub fn entry(&self, name: &str) -> String
    {
        format!("{}at_{}", self.prefix, name)
    }

    /// Varying globals keyed by semantic: `xlv_TEXCOORD0`.
    pub fn varying(&self, semantic: &str) -> String
    {
        format!("{}v_{}", self.prefix, semantic)
    }

    /// Temporaries in the synthesized main: `xlt_overtex`.
    pub fn temp(&self, name: &str) -> String
    {
        format!("{}t_{}", self.prefix, name)
    }

    /// Attribute globals keyed by semantic: `xlat_attrib_POSITION`.
    pub fn attrib(&self, semantic: &str) -> String
    {
        format!("{}at_attrib_{}", self.prefix, semantic)
    }

    /// The synthesized return-value local: `xl_retval`.
    pub fn retval(&self) -> String
    {
        format!("{}_retval", self.prefix)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn default_prefix_family()
    {
        let p = PrefixTable::default();
        assert_eq!(p.helper("shadow2D"), "xll_shadow2D");
        assert_eq!(p.entry("main"), "xlat_main");
        assert_eq!(p.varying("TEXCOORD0"), "xlv_TEXCOORD0");
        assert_eq!(p.temp("overtex"), "xlt_overtex");
        assert_eq!(p.attrib("POSITION"), "xlat_attrib_POSITION");
        assert_eq!(p.retval(), "xl_retval");
    }

    #[test]
    fn empty_prefix_family()
    {
        let p = PrefixTable::new("");
        assert_eq!(p.helper("constructMat3_mf4x4"), "l_constructMat3_mf4x4");
        assert_eq!(p.entry("main"), "at_main");
        assert_eq!(p.varying("TEXCOORD0"), "v_TEXCOORD0");
        assert_eq!(p.temp("onormal"), "t_onormal");
        assert_eq!(p.retval(), "_retval");
    }

    #[test]
    fn precision_versions()
    {
        assert!(TargetVersion::GlslEs100.uses_precision());
        assert!(TargetVersion::GlslEs300.uses_precision());
        assert!(!TargetVersion::Glsl110.uses_precision());
        assert!(!TargetVersion::Glsl120.uses_precision());
        assert!(!TargetVersion::Glsl140.uses_precision());
    }
}
