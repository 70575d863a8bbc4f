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

use regex::Regex;

use crate::ast::types::{Basic, Precision, TypeInfo};
use crate::ast::Unit;
use crate::diag::InfoSink;
use crate::symbols::{Symbol, SymbolTable};

/// Everything the parser reads and writes while reducing one translation
/// unit. Passed explicitly to every parser entry so sessions can run
/// concurrently on separate threads.
pub struct ParseContext<'a>
{
    pub table: SymbolTable,
    pub unit: &'a mut Unit,
    pub sink: &'a mut InfoSink,
    /// Set while parsing the built-in declaration strings; inserted
    /// functions are marked as built-ins and bodies are not required.
    pub seeding: bool,
    /// Return type of the function currently being parsed.
    pub current_ret: TypeInfo
}

impl<'a> ParseContext<'a>
{
    pub fn new(table: SymbolTable, unit: &'a mut Unit, sink: &'a mut InfoSink) -> ParseContext<'a>
    {
        ParseContext {
            table,
            unit,
            sink,
            seeding: false,
            current_ret: TypeInfo::void()
        }
    }
}

fn scalar_base(name: &str) -> Option<(Basic, Precision)>
{
    match name {
        "float" | "double" => Some((Basic::Float, Precision::High)),
        "half" => Some((Basic::Float, Precision::Medium)),
        "fixed" => Some((Basic::Float, Precision::Low)),
        "int" => Some((Basic::Int, Precision::High)),
        "uint" | "dword" => Some((Basic::Uint, Precision::High)),
        "bool" => Some((Basic::Bool, Precision::None)),
        _ => None
    }
}

fn sampler_base(name: &str) -> Option<Basic>
{
    match name {
        "sampler" => Some(Basic::Sampler),
        "sampler1D" => Some(Basic::Sampler1D),
        "sampler1DShadow" => Some(Basic::Sampler1DShadow),
        "sampler2D" => Some(Basic::Sampler2D),
        "sampler2DShadow" => Some(Basic::Sampler2DShadow),
        "sampler3D" => Some(Basic::Sampler3D),
        "samplerCUBE" | "samplerCube" => Some(Basic::SamplerCube),
        "samplerRECT" => Some(Basic::SamplerRect),
        "samplerRECTShadow" => Some(Basic::SamplerRectShadow),
        _ => None
    }
}

/// Resolves a type spelling: scalar keywords, `floatN` vectors, `floatRxC`
/// matrices, sampler keywords, or a declared struct name.
pub fn parse_type_name(name: &str, table: &SymbolTable) -> Option<TypeInfo>
{
    if let Some((basic, precision)) = scalar_base(name) {
        return Some(TypeInfo::scalar(basic, precision));
    }
    if let Some(basic) = sampler_base(name) {
        return Some(TypeInfo::sampler(basic));
    }
    // SAFETY: the pattern is a constant known to compile
    let re = Regex::new(r"^(float|half|fixed|double|int|uint|bool)([1-4])(?:x([1-4]))?$").unwrap();
    if let Some(caps) = re.captures(name) {
        // SAFETY: groups 1 and 2 are mandatory in the pattern
        let (basic, precision) = scalar_base(caps.get(1).unwrap().as_str()).unwrap();
        let rows: u8 = caps.get(2).unwrap().as_str().parse().ok()?;
        if let Some(cols) = caps.get(3) {
            let cols: u8 = cols.as_str().parse().ok()?;
            if basic != Basic::Float {
                return None;
            }
            return Some(TypeInfo::matrix(rows, cols, precision));
        }
        return Some(TypeInfo::vector(basic, rows, precision));
    }
    if let Some(Symbol::Struct(s)) = table.find(name) {
        return Some(TypeInfo::structure(s.id));
    }
    None
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn scalar_spellings()
    {
        let table = SymbolTable::new();
        let f = parse_type_name("float", &table).unwrap();
        assert_eq!((f.basic, f.precision), (Basic::Float, Precision::High));
        let h = parse_type_name("half", &table).unwrap();
        assert_eq!(h.precision, Precision::Medium);
        let x = parse_type_name("fixed", &table).unwrap();
        assert_eq!(x.precision, Precision::Low);
    }

    #[test]
    fn vector_and_matrix_spellings()
    {
        let table = SymbolTable::new();
        let v = parse_type_name("float4", &table).unwrap();
        assert_eq!((v.rows, v.cols), (4, 1));
        let f4 = parse_type_name("fixed4", &table).unwrap();
        assert_eq!((f4.rows, f4.precision), (4, Precision::Low));
        let m = parse_type_name("float3x3", &table).unwrap();
        assert_eq!((m.rows, m.cols), (3, 3));
        let m2 = parse_type_name("float2x4", &table).unwrap();
        assert_eq!((m2.rows, m2.cols), (2, 4));
        assert!(parse_type_name("int3x3", &table).is_none());
        assert!(parse_type_name("float5", &table).is_none());
    }

    #[test]
    fn sampler_spellings()
    {
        let table = SymbolTable::new();
        assert_eq!(
            parse_type_name("sampler2DShadow", &table).unwrap().basic,
            Basic::Sampler2DShadow
        );
        assert_eq!(
            parse_type_name("samplerCUBE", &table).unwrap().basic,
            Basic::SamplerCube
        );
        assert_eq!(parse_type_name("sampler", &table).unwrap().basic, Basic::Sampler);
    }

    #[test]
    fn unknown_name_is_not_a_type()
    {
        let table = SymbolTable::new();
        assert!(parse_type_name("bloat4", &table).is_none());
    }
}
