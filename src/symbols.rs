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

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::ast::types::{StructId, TypeInfo};

#[derive(Clone, Debug)]
pub struct VarSymbol
{
    pub name: String,
    pub ty: TypeInfo,
    /// Index into the unit's global registry for globals; None for locals.
    pub global: Option<u32>
}

#[derive(Clone, Debug)]
pub struct FunSymbol
{
    pub name: String,
    pub mangled: String,
    pub ret: TypeInfo,
    pub params: Vec<TypeInfo>,
    pub builtin: bool,
    pub defined: bool
}

#[derive(Clone, Debug)]
pub struct StructSymbol
{
    pub name: String,
    pub id: StructId
}

#[derive(Clone, Debug)]
pub enum Symbol
{
    Variable(VarSymbol),
    Function(FunSymbol),
    Struct(StructSymbol)
}

impl Symbol
{
    /// Map key. Functions are keyed by their mangled signature so overloads
    /// coexist; the '(' in the key keeps them disjoint from plain names.
    fn key(&self) -> String
    {
        match self {
            Symbol::Variable(v) => v.name.clone(),
            Symbol::Function(f) => f.mangled.clone(),
            Symbol::Struct(s) => s.name.clone()
        }
    }
}

/// Builds the mangled signature key for a function name and parameter list.
pub fn mangle_function(name: &str, params: &[TypeInfo]) -> String
{
    let mut out = String::from(name);
    out.push('(');
    for (i, p) in params.iter().enumerate() {
        if i != 0 {
            out.push(';');
        }
        out.push_str(&p.mangle());
    }
    out
}

#[derive(Clone, Debug, Default)]
pub struct Scope
{
    symbols: BTreeMap<String, Symbol>
}

impl Scope
{
    pub fn new() -> Scope
    {
        Scope {
            symbols: BTreeMap::new()
        }
    }

    fn find(&self, name: &str) -> Option<&Symbol>
    {
        self.symbols.get(name)
    }

    /// Range scan over every overload of `name`; the sorted map stands in
    /// for a signature trie.
    fn overloads<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a FunSymbol>
    {
        let start = format!("{}(", name);
        let end = format!("{})", name);
        self.symbols.range(start..end).filter_map(|(_, s)| match s {
            Symbol::Function(f) => Some(f),
            _ => None
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol>
    {
        self.symbols.values()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InsertError
{
    #[error("redefinition")]
    Redefinition,
    #[error("function signature collides")]
    SignatureCollision
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CallError
{
    #[error("no matching overloaded function found")]
    NoMatch,
    #[error("ambiguous function call")]
    Ambiguous
}

/// A stack of scopes over an optional shared built-in level.
///
/// The built-in level is seeded once per process and shared by reference
/// between sessions; it is never written after seeding, so per-compile
/// tables layer plain scopes on top of the same snapshot.
pub struct SymbolTable
{
    shared: Option<Arc<Scope>>,
    scopes: Vec<Scope>
}

impl SymbolTable
{
    /// A fresh table with no built-in level; used while seeding.
    pub fn new() -> SymbolTable
    {
        SymbolTable {
            shared: None,
            scopes: Vec::new()
        }
    }

    /// A per-compile table layered over the shared built-in level.
    pub fn with_shared(shared: Arc<Scope>) -> SymbolTable
    {
        SymbolTable {
            shared: Some(shared),
            scopes: Vec::new()
        }
    }

    /// Collapses a seeded single-scope table into a shareable built-in level.
    pub fn into_shared(mut self) -> Arc<Scope>
    {
        Arc::new(self.scopes.pop().unwrap_or_default())
    }

    pub fn push(&mut self)
    {
        self.scopes.push(Scope::new());
    }

    pub fn pop(&mut self)
    {
        self.scopes.pop();
    }

    pub fn at_global_level(&self) -> bool
    {
        self.scopes.len() == 1
    }

    pub fn at_shared_builtin_level(&self) -> bool
    {
        self.scopes.is_empty()
    }

    pub fn insert(&mut self, symbol: Symbol) -> Result<(), InsertError>
    {
        let key = symbol.key();
        let scope = match self.scopes.last_mut() {
            Some(v) => v,
            None => return Err(InsertError::Redefinition)
        };
        if scope.symbols.contains_key(&key) {
            return match symbol {
                Symbol::Function(_) => Err(InsertError::SignatureCollision),
                _ => Err(InsertError::Redefinition)
            };
        }
        scope.symbols.insert(key, symbol);
        Ok(())
    }

    /// Replaces a function symbol in place, e.g. when a prototype gains a
    /// definition.
    pub fn redefine_function(&mut self, symbol: FunSymbol)
    {
        for scope in self.scopes.iter_mut().rev() {
            if scope.symbols.contains_key(&symbol.mangled) {
                scope
                    .symbols
                    .insert(symbol.mangled.clone(), Symbol::Function(symbol));
                return;
            }
        }
    }

    /// Searches top-down through the open scopes, then the built-in level.
    pub fn find(&self, name: &str) -> Option<&Symbol>
    {
        for scope in self.scopes.iter().rev() {
            if let Some(sym) = scope.find(name) {
                return Some(sym);
            }
        }
        self.shared.as_deref().and_then(|s| s.find(name))
    }

    pub fn find_any_function(&self, name: &str) -> bool
    {
        for scope in self.scopes.iter().rev() {
            if scope.overloads(name).next().is_some() {
                return true;
            }
        }
        self.shared
            .as_deref()
            .map(|s| s.overloads(name).next().is_some())
            .unwrap_or(false)
    }

    /// Overload resolution on the parameter-type list: an exact signature
    /// match wins; otherwise a single candidate reachable through the
    /// promotion lattice is accepted, and several such candidates are
    /// ambiguous.
    pub fn resolve_call(&self, name: &str, args: &[TypeInfo]) -> Result<FunSymbol, CallError>
    {
        let mangled = mangle_function(name, args);
        let mut candidates: Vec<&FunSymbol> = Vec::new();
        for scope in self.scopes.iter().rev() {
            candidates.extend(scope.overloads(name));
        }
        if let Some(shared) = self.shared.as_deref() {
            candidates.extend(shared.overloads(name));
        }
        if candidates.is_empty() {
            return Err(CallError::NoMatch);
        }
        if let Some(exact) = candidates.iter().find(|f| f.mangled == mangled) {
            return Ok((*exact).clone());
        }
        let promotable: Vec<&FunSymbol> = candidates
            .iter()
            .filter(|f| {
                f.params.len() == args.len()
                    && args.iter().zip(&f.params).all(|(a, p)| a.promotable_to(p))
            })
            .copied()
            .collect();
        match promotable.len() {
            0 => Err(CallError::NoMatch),
            1 => Ok(promotable[0].clone()),
            _ => Err(CallError::Ambiguous)
        }
    }
}

impl Default for SymbolTable
{
    fn default() -> Self
    {
        Self::new()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::ast::types::{Basic, Precision};

    fn float() -> TypeInfo
    {
        TypeInfo::scalar(Basic::Float, Precision::High)
    }

    fn float_vec(n: u8) -> TypeInfo
    {
        TypeInfo::vector(Basic::Float, n, Precision::High)
    }

    fn fun(name: &str, params: Vec<TypeInfo>) -> Symbol
    {
        let mangled = mangle_function(name, &params);
        Symbol::Function(FunSymbol {
            name: name.into(),
            mangled,
            ret: float(),
            params,
            builtin: true,
            defined: false
        })
    }

    #[test]
    fn overloads_coexist()
    {
        let mut table = SymbolTable::new();
        table.push();
        table.insert(fun("dot", vec![float_vec(3), float_vec(3)])).unwrap();
        table.insert(fun("dot", vec![float_vec(4), float_vec(4)])).unwrap();
        let hit = table.resolve_call("dot", &[float_vec(4), float_vec(4)]).unwrap();
        assert_eq!(hit.mangled, "dot(vf4;vf4");
    }

    #[test]
    fn signature_collision_rejected()
    {
        let mut table = SymbolTable::new();
        table.push();
        table.insert(fun("f", vec![float()])).unwrap();
        assert_eq!(
            table.insert(fun("f", vec![float()])),
            Err(InsertError::SignatureCollision)
        );
    }

    #[test]
    fn promotion_resolution()
    {
        let mut table = SymbolTable::new();
        table.push();
        table.insert(fun("sqrt", vec![float()])).unwrap();
        let int = TypeInfo::scalar(Basic::Int, Precision::High);
        let hit = table.resolve_call("sqrt", &[int]).unwrap();
        assert_eq!(hit.mangled, "sqrt(f");
    }

    #[test]
    fn shared_level_is_searched_last()
    {
        let mut seed = SymbolTable::new();
        seed.push();
        seed.insert(Symbol::Variable(VarSymbol {
            name: "gl_thing".into(),
            ty: float(),
            global: None
        }))
        .unwrap();
        let shared = seed.into_shared();

        let mut table = SymbolTable::with_shared(shared);
        table.push();
        assert!(table.at_global_level());
        assert!(table.find("gl_thing").is_some());
        table.insert(Symbol::Variable(VarSymbol {
            name: "gl_thing".into(),
            ty: float_vec(2),
            global: None
        }))
        .unwrap();
        // the per-compile scope shadows the built-in level
        match table.find("gl_thing") {
            Some(Symbol::Variable(v)) => assert_eq!(v.ty.rows, 2),
            _ => panic!("expected variable")
        }
    }

    #[test]
    fn scope_pop_restores_outer_symbol()
    {
        let mut table = SymbolTable::new();
        table.push();
        table
            .insert(Symbol::Variable(VarSymbol {
                name: "x".into(),
                ty: float(),
                global: None
            }))
            .unwrap();
        table.push();
        table
            .insert(Symbol::Variable(VarSymbol {
                name: "x".into(),
                ty: float_vec(3),
                global: None
            }))
            .unwrap();
        match table.find("x") {
            Some(Symbol::Variable(v)) => assert_eq!(v.ty.rows, 3),
            _ => panic!("expected variable")
        }
        table.pop();
        match table.find("x") {
            Some(Symbol::Variable(v)) => assert_eq!(v.ty.rows, 1),
            _ => panic!("expected variable")
        }
    }
}
