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

//! HLSL to GLSL shader translator.
//!
//! Shaders written in the HLSL dialect (semantic-annotated entry points,
//! `floatNxM` matrix spellings, `tex2D`/`shadow2D` intrinsics) are parsed
//! into a typed tree, rewritten by sampler-type and uniform-mutability
//! passes, and emitted as GLSL for one of several target dialects, together
//! with a uniform reflection table.
//!
//! Call [`initialize`] once per process, then drive per-stage [`Compiler`]
//! sessions: `parse` one shader text, `translate` it against an entry-point
//! name, and read the result through `shader` and `uniforms`.

use std::sync::{Arc, RwLock};

use log::info;

pub mod ast;
mod builtins;
mod codegen;
mod compiler;
mod config;
mod diag;
mod lexer;
mod linker;
mod location;
mod parser;
mod pool;
mod support;
mod symbols;
mod transform;

pub use codegen::UniformInfo;
pub use compiler::Compiler;
pub use config::{AttribSemantic, PrefixTable, Stage, TargetVersion, OPT_DUMP_INTERMEDIATE};

use builtins::SharedBuiltins;

static BUILTINS: RwLock<Option<Arc<SharedBuiltins>>> = RwLock::new(None);

/// Builds the process-wide built-in symbol tables unless they already
/// exist. Idempotent; must run before the first [`Compiler::parse`].
pub fn initialize() -> bool
{
    let mut guard = match BUILTINS.write() {
        Ok(v) => v,
        Err(_) => return false
    };
    if guard.is_some() {
        return true;
    }
    match builtins::seed_all() {
        Ok(tables) => {
            *guard = Some(Arc::new(tables));
            info!("Initialized shader translator");
            true
        }
        Err(_) => false
    }
}

/// Releases the shared built-in tables. Sessions created afterwards fail to
/// parse until [`initialize`] runs again; existing sessions keep the
/// snapshot they already hold.
pub fn shutdown()
{
    if let Ok(mut guard) = BUILTINS.write() {
        *guard = None;
    }
}

pub(crate) fn shared_builtins() -> Option<Arc<SharedBuiltins>>
{
    BUILTINS.read().ok()?.clone()
}
