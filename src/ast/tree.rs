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

use crate::ast::types::{Qualifier, TypeInfo};
use crate::location::SourceLoc;
use crate::pool::Pool;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Const
{
    Bool(bool),
    Int(i64),
    Float(f32)
}

#[derive(Clone, Debug, PartialEq)]
pub enum UnaryOp
{
    Negative,
    LogicalNot,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    /// Conversion to the node's own type; inserted by type checking and by
    /// C-style casts such as `(float3x3)m`.
    Cast,
    /// Member access or swizzle; the payload is the field text.
    Field(String)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp
{
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
    Index,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign
}

impl BinaryOp
{
    pub fn is_assignment(self) -> bool
    {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
        )
    }

    pub fn glsl(self) -> &'static str
    {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Index => "[]",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/="
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopKind
{
    While,
    DoWhile,
    For
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchKind
{
    Return,
    Break,
    Continue,
    Discard,
    Kill
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggOp
{
    Sequence,
    Function,
    FunctionCall,
    Parameters,
    Constructor,
    CommaList,
    Declaration,
    InitializerList
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind
{
    /// A reference to a named symbol. `global` indexes the unit's global
    /// registry when the symbol is a global variable.
    Symbol
    {
        name: String,
        global: Option<u32>
    },
    Constant(Const),
    Unary
    {
        op: UnaryOp,
        operand: NodeId
    },
    Binary
    {
        op: BinaryOp,
        left: NodeId,
        right: NodeId
    },
    Selection
    {
        cond: NodeId,
        then_block: Option<NodeId>,
        else_block: Option<NodeId>
    },
    Loop
    {
        kind: LoopKind,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId
    },
    Branch
    {
        kind: BranchKind,
        value: Option<NodeId>
    },
    /// N-ary node; `name` holds the mangled callee for `FunctionCall` and
    /// `Function` aggregates.
    Aggregate
    {
        op: AggOp,
        name: String,
        children: Vec<NodeId>
    }
}

#[derive(Clone, Debug)]
pub struct Node
{
    pub kind: NodeKind,
    pub ty: TypeInfo,
    pub loc: SourceLoc
}

/// Arena owning every node of one compile session's tree.
pub struct NodeArena
{
    pool: Pool<Node>
}

impl Default for NodeArena
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl NodeArena
{
    pub fn new() -> NodeArena
    {
        let mut pool = Pool::new();
        pool.push();
        NodeArena { pool }
    }

    pub fn alloc(&mut self, kind: NodeKind, ty: TypeInfo, loc: SourceLoc) -> NodeId
    {
        NodeId(self.pool.alloc(Node { kind, ty, loc }))
    }

    pub fn node(&self, id: NodeId) -> &Node
    {
        self.pool.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node
    {
        self.pool.get_mut(id.0)
    }

    pub fn len(&self) -> usize
    {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.pool.is_empty()
    }
}

/// A global variable declaration. Globals without a storage keyword are
/// uniforms, following the source language's default.
#[derive(Clone, Debug)]
pub struct GlobalVar
{
    pub name: String,
    pub ty: TypeInfo,
    pub semantic: Option<String>,
    pub register_spec: Option<String>,
    pub init: Option<NodeId>,
    pub loc: SourceLoc,
    /// Set by the mutable-uniform pass when any reachable code writes the
    /// uniform; such uniforms are lifted to local copies at link time.
    pub mutable: bool
}

impl GlobalVar
{
    pub fn is_uniform(&self) -> bool
    {
        self.ty.qualifier == Qualifier::Uniform
    }
}

#[derive(Clone, Debug)]
pub struct StructField
{
    pub name: String,
    pub ty: TypeInfo,
    pub semantic: Option<String>
}

#[derive(Clone, Debug)]
pub struct StructDef
{
    pub name: String,
    pub fields: Vec<StructField>,
    pub loc: SourceLoc
}

#[derive(Clone, Debug)]
pub struct Param
{
    pub name: String,
    pub ty: TypeInfo,
    pub semantic: Option<String>,
    /// Set by the mutable-uniform pass when the parameter is written inside
    /// the function or forwarded to a written parameter.
    pub written: bool
}

#[derive(Clone, Debug)]
pub struct FunctionDef
{
    pub name: String,
    pub mangled: String,
    pub ret: TypeInfo,
    pub ret_semantic: Option<String>,
    pub params: Vec<Param>,
    pub body: Option<NodeId>,
    pub loc: SourceLoc
}

/// One parsed translation unit: the tree plus the registries the transform
/// passes and the code generator work from. Owned by the session and
/// released as a whole.
pub struct Unit
{
    pub arena: NodeArena,
    pub root: Option<NodeId>,
    pub globals: Vec<GlobalVar>,
    pub structs: Vec<StructDef>,
    pub functions: Vec<FunctionDef>
}

impl Default for Unit
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Unit
{
    pub fn new() -> Unit
    {
        Unit {
            arena: NodeArena::new(),
            root: None,
            globals: Vec::new(),
            structs: Vec::new(),
            functions: Vec::new()
        }
    }

    pub fn find_global(&self, name: &str) -> Option<u32>
    {
        self.globals
            .iter()
            .position(|g| g.name == name)
            .map(|i| i as u32)
    }

    pub fn find_function(&self, mangled: &str) -> Option<&FunctionDef>
    {
        self.functions.iter().find(|f| f.mangled == mangled)
    }

    /// Writes an indented dump of the tree, one node per line. Used by the
    /// intermediate dump option.
    pub fn dump(&self, out: &mut Vec<String>)
    {
        if let Some(root) = self.root {
            self.dump_node(root, 0, out);
        }
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut Vec<String>)
    {
        let node = self.arena.node(id);
        let indent = "  ".repeat(depth);
        let children: Vec<NodeId> = match &node.kind {
            NodeKind::Symbol { name, .. } => {
                out.push(format!("{}symbol '{}' ({})", indent, name, node.ty.mangle()));
                return;
            }
            NodeKind::Constant(c) => {
                out.push(format!("{}const {:?}", indent, c));
                return;
            }
            NodeKind::Unary { op, operand } => {
                out.push(format!("{}unary {:?}", indent, op));
                vec![*operand]
            }
            NodeKind::Binary { op, left, right } => {
                out.push(format!("{}binary {}", indent, op.glsl()));
                vec![*left, *right]
            }
            NodeKind::Selection {
                cond,
                then_block,
                else_block
            } => {
                out.push(format!("{}selection", indent));
                let mut v = vec![*cond];
                v.extend(then_block.iter().copied());
                v.extend(else_block.iter().copied());
                v
            }
            NodeKind::Loop {
                kind,
                init,
                cond,
                step,
                body
            } => {
                out.push(format!("{}loop {:?}", indent, kind));
                let mut v = Vec::new();
                v.extend(init.iter().copied());
                v.extend(cond.iter().copied());
                v.extend(step.iter().copied());
                v.push(*body);
                v
            }
            NodeKind::Branch { kind, value } => {
                out.push(format!("{}branch {:?}", indent, kind));
                value.iter().copied().collect()
            }
            NodeKind::Aggregate { op, name, children } => {
                if name.is_empty() {
                    out.push(format!("{}{:?}", indent, op));
                } else {
                    out.push(format!("{}{:?} '{}'", indent, op, name));
                }
                children.clone()
            }
        };
        for child in children {
            self.dump_node(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::ast::types::{Basic, Precision};

    #[test]
    fn arena_roundtrip()
    {
        let mut arena = NodeArena::new();
        let ty = TypeInfo::scalar(Basic::Float, Precision::High);
        let a = arena.alloc(NodeKind::Constant(Const::Float(1.0)), ty.clone(), SourceLoc::line(1));
        let b = arena.alloc(
            NodeKind::Unary {
                op: UnaryOp::Negative,
                operand: a
            },
            ty,
            SourceLoc::line(1)
        );
        assert_eq!(arena.len(), 2);
        match &arena.node(b).kind {
            NodeKind::Unary { operand, .. } => assert_eq!(*operand, a),
            _ => panic!("wrong node kind")
        }
    }

    #[test]
    fn dump_produces_one_line_per_node()
    {
        let mut unit = Unit::new();
        let ty = TypeInfo::scalar(Basic::Float, Precision::High);
        let c = unit
            .arena
            .alloc(NodeKind::Constant(Const::Float(2.0)), ty.clone(), SourceLoc::line(1));
        let root = unit.arena.alloc(
            NodeKind::Aggregate {
                op: AggOp::Sequence,
                name: String::new(),
                children: vec![c]
            },
            TypeInfo::void(),
            SourceLoc::line(1)
        );
        unit.root = Some(root);
        let mut lines = Vec::new();
        unit.dump(&mut lines);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Sequence"));
    }
}
