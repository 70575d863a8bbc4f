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

use crate::ast::types::TypeInfo;
use crate::ast::{Param, StructDef};
use crate::config::TargetVersion;
use crate::support::HelperId;

/// One uniform of the reflection table, in declaration order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformInfo
{
    pub name: String,
    pub semantic: Option<String>,
    pub type_code: i32,
    pub array_size: u32,
    pub register_spec: Option<String>
}

/// A function translated by the codegen traversal. The signature is not
/// part of the text: the linker renders it, renaming the entry function.
#[derive(Clone, Debug)]
pub struct GlslFunction
{
    pub name: String,
    pub mangled: String,
    pub ret: TypeInfo,
    pub ret_semantic: Option<String>,
    pub params: Vec<Param>,
    /// Body statements, indented one level, each line newline-terminated.
    pub body: String,
    /// Mangled names of user functions this one calls, in first-use order.
    pub called: Vec<String>,
    /// Support helpers required by this function, in first-use order.
    pub support: Vec<HelperId>,
    /// Struct registry indices referenced by this function.
    pub structs_used: Vec<u32>,
    pub line: u32,
    /// The function contributes its own leading line directive in addition
    /// to the linker's (observed for entries with a return semantic).
    pub extra_line_directive: bool
}

/// A global variable as the linker emits it.
#[derive(Clone, Debug)]
pub struct GlslGlobal
{
    pub name: String,
    pub ty: TypeInfo,
    pub semantic: Option<String>,
    pub register_spec: Option<String>,
    pub mutable: bool,
    /// Rendered initializer for non-uniform globals, when representable at
    /// the declaration.
    pub init_text: Option<String>,
    /// Initializer statements deferred into the synthesized main.
    pub deferred: Vec<String>,
    pub line: u32
}

/// Everything the linker needs, produced during the parse call and kept on
/// the session until the next parse.
pub struct CodegenOutput
{
    pub functions: Vec<GlslFunction>,
    pub globals: Vec<GlslGlobal>,
    pub uniforms: Vec<UniformInfo>,
    pub structs: Vec<StructDef>,
    pub version: TargetVersion
}
