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

/// Basic type category. `half` and `fixed` spellings collapse onto `Float`
/// with a medium/low precision; precision is a separate component of the
/// type tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Basic
{
    Void,
    Bool,
    Int,
    Uint,
    Float,
    Sampler,
    Sampler1D,
    Sampler1DShadow,
    Sampler2D,
    Sampler2DShadow,
    Sampler3D,
    SamplerCube,
    SamplerRect,
    SamplerRectShadow,
    Struct
}

impl Basic
{
    pub fn is_sampler(self) -> bool
    {
        matches!(
            self,
            Basic::Sampler
                | Basic::Sampler1D
                | Basic::Sampler1DShadow
                | Basic::Sampler2D
                | Basic::Sampler2DShadow
                | Basic::Sampler3D
                | Basic::SamplerCube
                | Basic::SamplerRect
                | Basic::SamplerRectShadow
        )
    }

    pub fn is_shadow_sampler(self) -> bool
    {
        matches!(
            self,
            Basic::Sampler1DShadow | Basic::Sampler2DShadow | Basic::SamplerRectShadow
        )
    }

    pub fn is_numeric(self) -> bool
    {
        matches!(self, Basic::Int | Basic::Uint | Basic::Float)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precision
{
    None,
    Low,
    Medium,
    High
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Qualifier
{
    None,
    Const,
    In,
    Out,
    InOut,
    Uniform,
    Attribute,
    Varying
}

pub type StructId = u32;

/// The full type tuple carried by every expression node and every symbol.
///
/// Vectors are N rows by 1 column; matrices are R rows by C columns; scalars
/// are 1x1. `array_size` of zero means "not an array".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo
{
    pub basic: Basic,
    pub rows: u8,
    pub cols: u8,
    pub array_size: u32,
    pub struct_ref: Option<StructId>,
    pub qualifier: Qualifier,
    pub precision: Precision
}

impl TypeInfo
{
    pub fn void() -> TypeInfo
    {
        TypeInfo {
            basic: Basic::Void,
            rows: 1,
            cols: 1,
            array_size: 0,
            struct_ref: None,
            qualifier: Qualifier::None,
            precision: Precision::None
        }
    }

    pub fn scalar(basic: Basic, precision: Precision) -> TypeInfo
    {
        TypeInfo {
            basic,
            rows: 1,
            cols: 1,
            array_size: 0,
            struct_ref: None,
            qualifier: Qualifier::None,
            precision
        }
    }

    pub fn vector(basic: Basic, rows: u8, precision: Precision) -> TypeInfo
    {
        TypeInfo {
            basic,
            rows,
            cols: 1,
            array_size: 0,
            struct_ref: None,
            qualifier: Qualifier::None,
            precision
        }
    }

    pub fn matrix(rows: u8, cols: u8, precision: Precision) -> TypeInfo
    {
        TypeInfo {
            basic: Basic::Float,
            rows,
            cols,
            array_size: 0,
            struct_ref: None,
            qualifier: Qualifier::None,
            precision
        }
    }

    pub fn sampler(basic: Basic) -> TypeInfo
    {
        TypeInfo {
            basic,
            rows: 1,
            cols: 1,
            array_size: 0,
            struct_ref: None,
            qualifier: Qualifier::None,
            precision: Precision::Low
        }
    }

    pub fn structure(id: StructId) -> TypeInfo
    {
        TypeInfo {
            basic: Basic::Struct,
            rows: 1,
            cols: 1,
            array_size: 0,
            struct_ref: Some(id),
            qualifier: Qualifier::None,
            precision: Precision::None
        }
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> TypeInfo
    {
        self.qualifier = qualifier;
        self
    }

    pub fn is_scalar(&self) -> bool
    {
        self.rows == 1 && self.cols == 1 && self.array_size == 0 && self.basic.is_numeric()
            || (self.basic == Basic::Bool && self.rows == 1 && self.cols == 1)
    }

    pub fn is_vector(&self) -> bool
    {
        self.rows > 1 && self.cols == 1
    }

    pub fn is_matrix(&self) -> bool
    {
        self.cols > 1
    }

    pub fn is_array(&self) -> bool
    {
        self.array_size > 0
    }

    pub fn component_count(&self) -> u32
    {
        self.rows as u32 * self.cols as u32
    }

    /// True when both types have the same basic category and shape, ignoring
    /// qualifier and precision.
    pub fn same_shape(&self, other: &TypeInfo) -> bool
    {
        self.basic == other.basic
            && self.rows == other.rows
            && self.cols == other.cols
            && self.array_size == other.array_size
            && self.struct_ref == other.struct_ref
    }

    /// Assignment compatibility under the shading-language promotion
    /// lattice: identical shapes, basic-type widening (bool -> int -> float)
    /// at equal shape, scalar splat to any vector, and vector narrowing
    /// (which the source language permits with an implicit truncation).
    /// Matrix shapes must match exactly.
    pub fn promotable_to(&self, target: &TypeInfo) -> bool
    {
        if self.array_size != target.array_size {
            return false;
        }
        if self.basic == Basic::Struct || target.basic == Basic::Struct {
            return self.struct_ref == target.struct_ref;
        }
        if self.basic.is_sampler() || target.basic.is_sampler() {
            // a still-unconstrained sampler may bind to any concrete one
            return self.basic == target.basic
                || self.basic == Basic::Sampler
                || target.basic == Basic::Sampler;
        }
        if !self.basic.is_numeric() && self.basic != Basic::Bool {
            return false;
        }
        if self.is_matrix() || target.is_matrix() {
            return self.rows == target.rows && self.cols == target.cols;
        }
        if !basic_widens_to(self.basic, target.basic) {
            return false;
        }
        // scalar -> vector splat, vector -> scalar / smaller vector truncation
        self.rows == target.rows || self.rows == 1 || self.rows >= target.rows
    }

    /// Overload-resolution mangling of one parameter type. Matrices mangle
    /// as `mf4x4`, vectors as `vf4`, scalars as a single letter, samplers by
    /// dimension. The matrix form also names the construct helpers.
    pub fn mangle(&self) -> String
    {
        let mut out = String::new();
        match self.basic {
            Basic::Void => out.push('v'),
            Basic::Bool => out.push('b'),
            Basic::Int => out.push('i'),
            Basic::Uint => out.push('u'),
            Basic::Float => out.push('f'),
            Basic::Sampler => out.push_str("sG"),
            Basic::Sampler1D => out.push_str("s1D"),
            Basic::Sampler1DShadow => out.push_str("s1DS"),
            Basic::Sampler2D => out.push_str("s2D"),
            Basic::Sampler2DShadow => out.push_str("s2DS"),
            Basic::Sampler3D => out.push_str("s3D"),
            Basic::SamplerCube => out.push_str("sCB"),
            Basic::SamplerRect => out.push_str("sR"),
            Basic::SamplerRectShadow => out.push_str("sRS"),
            Basic::Struct => {
                out.push('S');
                if let Some(id) = self.struct_ref {
                    out.push_str(&id.to_string());
                }
            }
        }
        if self.is_matrix() {
            out = format!("m{}{}x{}", out, self.rows, self.cols);
        } else if self.is_vector() {
            out = format!("v{}{}", out, self.rows);
        }
        if self.array_size > 0 {
            out = format!("{}[{}]", out, self.array_size);
        }
        out
    }

    /// Numeric reflection code matching the public enum of the original
    /// cross-compiler interface (mat4 is 21, sampler2DShadow is 26).
    pub fn type_code(&self) -> i32
    {
        match self.basic {
            Basic::Void => 0,
            Basic::Bool => 1 + (self.rows as i32 - 1),
            Basic::Int | Basic::Uint => 5 + (self.rows as i32 - 1),
            Basic::Float => {
                if self.is_matrix() {
                    13 + (self.rows as i32 - 2) * 3 + (self.cols as i32 - 2)
                } else {
                    9 + (self.rows as i32 - 1)
                }
            }
            Basic::Sampler => 22,
            Basic::Sampler1D => 23,
            Basic::Sampler1DShadow => 24,
            Basic::Sampler2D => 25,
            Basic::Sampler2DShadow => 26,
            Basic::Sampler3D => 27,
            Basic::SamplerCube => 28,
            Basic::SamplerRect => 29,
            Basic::SamplerRectShadow => 30,
            Basic::Struct => 32
        }
    }
}

fn basic_widens_to(from: Basic, to: Basic) -> bool
{
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Basic::Bool, Basic::Int)
            | (Basic::Bool, Basic::Uint)
            | (Basic::Bool, Basic::Float)
            | (Basic::Int, Basic::Uint)
            | (Basic::Uint, Basic::Int)
            | (Basic::Int, Basic::Float)
            | (Basic::Uint, Basic::Float)
            | (Basic::Float, Basic::Int)
            | (Basic::Float, Basic::Uint)
            | (Basic::Int, Basic::Bool)
            | (Basic::Float, Basic::Bool)
    )
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn reflection_codes_match_public_enum()
    {
        assert_eq!(TypeInfo::matrix(4, 4, Precision::High).type_code(), 21);
        assert_eq!(TypeInfo::matrix(3, 3, Precision::High).type_code(), 17);
        assert_eq!(TypeInfo::matrix(2, 3, Precision::High).type_code(), 14);
        assert_eq!(TypeInfo::sampler(Basic::Sampler2DShadow).type_code(), 26);
        assert_eq!(TypeInfo::sampler(Basic::Sampler2D).type_code(), 25);
        assert_eq!(TypeInfo::vector(Basic::Float, 4, Precision::High).type_code(), 12);
        assert_eq!(TypeInfo::scalar(Basic::Float, Precision::High).type_code(), 9);
        assert_eq!(TypeInfo::scalar(Basic::Bool, Precision::None).type_code(), 1);
    }

    #[test]
    fn mangling()
    {
        assert_eq!(TypeInfo::matrix(4, 4, Precision::High).mangle(), "mf4x4");
        assert_eq!(TypeInfo::matrix(3, 3, Precision::High).mangle(), "mf3x3");
        assert_eq!(TypeInfo::vector(Basic::Float, 3, Precision::High).mangle(), "vf3");
        assert_eq!(TypeInfo::scalar(Basic::Float, Precision::High).mangle(), "f");
        assert_eq!(TypeInfo::sampler(Basic::Sampler2DShadow).mangle(), "s2DS");
    }

    #[test]
    fn promotion_lattice()
    {
        let f = TypeInfo::scalar(Basic::Float, Precision::High);
        let f4 = TypeInfo::vector(Basic::Float, 4, Precision::High);
        let i = TypeInfo::scalar(Basic::Int, Precision::High);
        let m4 = TypeInfo::matrix(4, 4, Precision::High);
        let m3 = TypeInfo::matrix(3, 3, Precision::High);
        assert!(i.promotable_to(&f));
        assert!(f.promotable_to(&f4));
        assert!(f4.promotable_to(&f));
        assert!(!m4.promotable_to(&m3));
        assert!(m4.promotable_to(&m4));
    }

    #[test]
    fn generic_sampler_promotes_to_concrete()
    {
        let generic = TypeInfo::sampler(Basic::Sampler);
        let shadow = TypeInfo::sampler(Basic::Sampler2DShadow);
        assert!(generic.promotable_to(&shadow));
        assert!(shadow.promotable_to(&generic));
        let plain = TypeInfo::sampler(Basic::Sampler2D);
        assert!(!plain.promotable_to(&shadow));
    }
}
