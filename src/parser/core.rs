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

use std::collections::VecDeque;

use crate::ast::types::{Basic, Precision, Qualifier, TypeInfo};
use crate::ast::{
    AggOp,
    BinaryOp,
    BranchKind,
    FunctionDef,
    GlobalVar,
    LoopKind,
    NodeId,
    NodeKind,
    Param,
    StructDef,
    StructField
};
use crate::builtins::is_reserved_word;
use crate::lexer::token::{Token, TokenEntry};
use crate::lexer::Lexer;
use crate::location::SourceLoc;
use crate::parser::context::{parse_type_name, ParseContext};
use crate::parser::expr::convert_checked;
use crate::symbols::{FunSymbol, InsertError, Symbol, VarSymbol};

/// Marker for an unrecoverable syntax error; the diagnostic has already been
/// recorded when this is returned.
pub struct Abort;

pub type PResult<T> = Result<T, Abort>;

/// Bottom-up parser producing the typed tree directly. Recoverable semantic
/// errors are recorded and parsing continues; syntax errors abort.
pub struct Parser
{
    pub(crate) tokens: VecDeque<TokenEntry>,
    pub(crate) cur_loc: SourceLoc
}

impl Parser
{
    pub fn new(lexer: Lexer) -> Parser
    {
        Parser {
            tokens: lexer.into_tokens(),
            cur_loc: SourceLoc::line(1)
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token>
    {
        self.tokens.front().map(|e| &e.token)
    }

    pub(crate) fn peek_second(&self) -> Option<&Token>
    {
        self.tokens.get(1).map(|e| &e.token)
    }

    pub(crate) fn peek_third(&self) -> Option<&Token>
    {
        self.tokens.get(2).map(|e| &e.token)
    }

    pub(crate) fn pop(&mut self, ctx: &mut ParseContext) -> PResult<Token>
    {
        match self.tokens.pop_front() {
            Some(entry) => {
                self.cur_loc = entry.loc;
                Ok(entry.token)
            }
            None => {
                let loc = self.cur_loc.clone();
                Err(self.syntax_error(ctx, "", &loc))
            }
        }
    }

    /// Records the abort diagnostic. The doubled message mirrors the
    /// reference implementation's parser wording.
    pub(crate) fn syntax_error(&mut self, ctx: &mut ParseContext, lexeme: &str, loc: &SourceLoc)
        -> Abort
    {
        ctx.sink.error(loc, lexeme, "syntax error syntax error");
        Abort
    }

    pub(crate) fn expect(&mut self, ctx: &mut ParseContext, token: Token) -> PResult<Token>
    {
        let actual = self.pop(ctx)?;
        if actual != token {
            let loc = self.cur_loc.clone();
            return Err(self.syntax_error(ctx, &actual.lexeme(), &loc));
        }
        Ok(actual)
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &mut ParseContext) -> PResult<String>
    {
        let actual = self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        match actual {
            Token::Identifier(name) => {
                self.check_reserved(ctx, &name, &loc)?;
                Ok(name)
            }
            other => Err(self.syntax_error(ctx, &other.lexeme(), &loc))
        }
    }

    /// Using a reserved word yields its own diagnostic and then aborts with
    /// a syntax error at the same token.
    pub(crate) fn check_reserved(&mut self, ctx: &mut ParseContext, name: &str, loc: &SourceLoc)
        -> PResult<()>
    {
        if is_reserved_word(name) {
            ctx.sink.error(loc, name, "Reserved word.");
            return Err(self.syntax_error(ctx, name, loc));
        }
        Ok(())
    }

    /// Parses one translation unit into the context's unit. Returns false
    /// when parsing aborted; recoverable diagnostics are visible through the
    /// context's error count either way.
    pub fn parse_unit(&mut self, ctx: &mut ParseContext) -> bool
    {
        let mut children = Vec::new();
        let ok = loop {
            if self.peek().is_none() {
                break true;
            }
            if self.parse_external(ctx, &mut children).is_err() {
                break false;
            }
        };
        let root = ctx.unit.arena.alloc(
            NodeKind::Aggregate {
                op: AggOp::Sequence,
                name: String::new(),
                children
            },
            TypeInfo::void(),
            SourceLoc::line(1)
        );
        ctx.unit.root = Some(root);
        ok
    }

    fn parse_external(&mut self, ctx: &mut ParseContext, children: &mut Vec<NodeId>) -> PResult<()>
    {
        if self.peek() == Some(&Token::Struct) {
            self.parse_struct_decl(ctx)?;
            return Ok(());
        }
        let (mut has_const, mut has_static, mut has_uniform) = (false, false, false);
        loop {
            match self.peek() {
                Some(Token::Const) => has_const = true,
                Some(Token::Static) => has_static = true,
                Some(Token::Uniform) => has_uniform = true,
                _ => break
            }
            self.pop(ctx)?;
        }
        let qualifier = if has_uniform {
            Qualifier::Uniform
        } else if has_const {
            Qualifier::Const
        } else if has_static {
            Qualifier::None
        } else {
            Qualifier::Uniform
        };
        let ty_loc = self.cur_peek_loc();
        let base = self.parse_type(ctx)?;
        let name = self.expect_identifier(ctx)?;
        if self.peek() == Some(&Token::LParen) {
            if let Some(node) = self.parse_function(ctx, base, name, ty_loc)? {
                children.push(node);
            }
            return Ok(());
        }
        if base.basic == Basic::Void {
            let loc = self.cur_loc.clone();
            ctx.sink.error(&loc, &name, "variables cannot have void type");
        }
        self.parse_global_declarators(ctx, base, qualifier, name, ty_loc, children)
    }

    fn cur_peek_loc(&self) -> SourceLoc
    {
        self.tokens
            .front()
            .map(|e| e.loc.clone())
            .unwrap_or_else(|| self.cur_loc.clone())
    }

    fn parse_type(&mut self, ctx: &mut ParseContext) -> PResult<TypeInfo>
    {
        match self.pop(ctx)? {
            Token::Void => Ok(TypeInfo::void()),
            Token::Identifier(name) => {
                let loc = self.cur_loc.clone();
                self.check_reserved(ctx, &name, &loc)?;
                match parse_type_name(&name, &ctx.table) {
                    Some(ty) => Ok(ty),
                    None => {
                        ctx.sink.error(&loc, &name, "undeclared identifier");
                        Ok(TypeInfo::scalar(Basic::Float, Precision::High))
                    }
                }
            }
            other => {
                let loc = self.cur_loc.clone();
                Err(self.syntax_error(ctx, &other.lexeme(), &loc))
            }
        }
    }

    fn parse_array_suffix(&mut self, ctx: &mut ParseContext) -> PResult<Option<u32>>
    {
        if self.peek() != Some(&Token::LBracket) {
            return Ok(None);
        }
        self.pop(ctx)?;
        let size = match self.pop(ctx)? {
            Token::IntConst(v) if v > 0 => v as u32,
            other => {
                let loc = self.cur_loc.clone();
                return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
            }
        };
        self.expect(ctx, Token::RBracket)?;
        Ok(Some(size))
    }

    /// Parses the trailing `: SEMANTIC` / `: register(...)` specifiers of a
    /// declarator.
    fn parse_bind_specs(&mut self, ctx: &mut ParseContext)
        -> PResult<(Option<String>, Option<String>)>
    {
        let mut semantic = None;
        let mut register_spec = None;
        while self.peek() == Some(&Token::Colon) {
            self.pop(ctx)?;
            match self.pop(ctx)? {
                Token::Register => {
                    self.expect(ctx, Token::LParen)?;
                    register_spec = Some(self.expect_identifier(ctx)?);
                    self.expect(ctx, Token::RParen)?;
                }
                Token::Identifier(name) => {
                    let loc = self.cur_loc.clone();
                    self.check_reserved(ctx, &name, &loc)?;
                    semantic = Some(name);
                }
                other => {
                    let loc = self.cur_loc.clone();
                    return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
                }
            }
        }
        Ok((semantic, register_spec))
    }

    fn parse_initializer(&mut self, ctx: &mut ParseContext, target: &TypeInfo) -> PResult<NodeId>
    {
        if self.peek() == Some(&Token::LBrace) {
            let loc = self.cur_loc.clone();
            self.pop(ctx)?;
            let mut items = Vec::new();
            loop {
                let item = self.parse_expression(ctx)?;
                let item = if target.array_size > 0 {
                    let mut elem = target.clone();
                    elem.array_size = 0;
                    convert_checked(ctx, item, &elem, "{")
                } else {
                    let scalar = TypeInfo::scalar(target.basic, target.precision);
                    convert_checked(ctx, item, &scalar, "{")
                };
                items.push(item);
                match self.pop(ctx)? {
                    Token::Comma => {
                        // allow a trailing comma before the closing brace
                        if self.peek() == Some(&Token::RBrace) {
                            self.pop(ctx)?;
                            break;
                        }
                    }
                    Token::RBrace => break,
                    other => {
                        let loc = self.cur_loc.clone();
                        return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
                    }
                }
            }
            return Ok(ctx.unit.arena.alloc(
                NodeKind::Aggregate {
                    op: AggOp::InitializerList,
                    name: String::new(),
                    children: items
                },
                target.clone(),
                loc
            ));
        }
        let init = self.parse_expression(ctx)?;
        Ok(convert_checked(ctx, init, target, "="))
    }

    fn parse_global_declarators(
        &mut self,
        ctx: &mut ParseContext,
        base: TypeInfo,
        qualifier: Qualifier,
        first_name: String,
        ty_loc: SourceLoc,
        children: &mut Vec<NodeId>
    ) -> PResult<()>
    {
        let mut name = first_name;
        loop {
            let mut ty = base.clone();
            ty.qualifier = qualifier;
            if ty.basic.is_sampler() {
                ty.qualifier = Qualifier::Uniform;
            }
            if let Some(size) = self.parse_array_suffix(ctx)? {
                ty.array_size = size;
            }
            let (semantic, register_spec) = self.parse_bind_specs(ctx)?;
            let init = if self.peek() == Some(&Token::Assign) {
                self.pop(ctx)?;
                Some(self.parse_initializer(ctx, &ty)?)
            } else {
                None
            };
            let index = ctx.unit.globals.len() as u32;
            let inserted = ctx.table.insert(Symbol::Variable(VarSymbol {
                name: name.clone(),
                ty: ty.clone(),
                global: Some(index)
            }));
            if inserted == Err(InsertError::Redefinition) {
                ctx.sink.error(&ty_loc, &name, "redefinition");
            } else {
                ctx.unit.globals.push(GlobalVar {
                    name: name.clone(),
                    ty: ty.clone(),
                    semantic,
                    register_spec,
                    init,
                    loc: ty_loc.clone(),
                    mutable: false
                });
                let sym = ctx.unit.arena.alloc(
                    NodeKind::Symbol {
                        name: name.clone(),
                        global: Some(index)
                    },
                    ty.clone(),
                    ty_loc.clone()
                );
                let child = match init {
                    Some(init) => ctx.unit.arena.alloc(
                        NodeKind::Binary {
                            op: BinaryOp::Assign,
                            left: sym,
                            right: init
                        },
                        ty.clone(),
                        ty_loc.clone()
                    ),
                    None => sym
                };
                let decl = ctx.unit.arena.alloc(
                    NodeKind::Aggregate {
                        op: AggOp::Declaration,
                        name: String::new(),
                        children: vec![child]
                    },
                    TypeInfo::void(),
                    ty_loc.clone()
                );
                children.push(decl);
            }
            match self.pop(ctx)? {
                Token::Comma => name = self.expect_identifier(ctx)?,
                Token::Semicolon => return Ok(()),
                other => {
                    let loc = self.cur_loc.clone();
                    return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
                }
            }
        }
    }

    fn parse_struct_decl(&mut self, ctx: &mut ParseContext) -> PResult<()>
    {
        self.expect(ctx, Token::Struct)?;
        let loc = self.cur_loc.clone();
        let name = self.expect_identifier(ctx)?;
        self.expect(ctx, Token::LBrace)?;
        let mut fields = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            let ty = self.parse_type(ctx)?;
            let fname = self.expect_identifier(ctx)?;
            let mut fty = ty;
            if let Some(size) = self.parse_array_suffix(ctx)? {
                fty.array_size = size;
            }
            let (semantic, _) = self.parse_bind_specs(ctx)?;
            self.expect(ctx, Token::Semicolon)?;
            fields.push(StructField {
                name: fname,
                ty: fty,
                semantic
            });
        }
        self.expect(ctx, Token::RBrace)?;
        self.expect(ctx, Token::Semicolon)?;
        let id = ctx.unit.structs.len() as u32;
        ctx.unit.structs.push(StructDef {
            name: name.clone(),
            fields,
            loc: loc.clone()
        });
        if ctx
            .table
            .insert(Symbol::Struct(crate::symbols::StructSymbol { name: name.clone(), id }))
            .is_err()
        {
            ctx.sink.error(&loc, &name, "redefinition");
        }
        Ok(())
    }

    fn parse_param(&mut self, ctx: &mut ParseContext) -> PResult<Param>
    {
        let mut qualifier = Qualifier::In;
        loop {
            match self.peek() {
                Some(Token::In) => qualifier = Qualifier::In,
                Some(Token::Out) => qualifier = Qualifier::Out,
                Some(Token::InOut) => qualifier = Qualifier::InOut,
                Some(Token::Const) | Some(Token::Uniform) => (),
                _ => break
            }
            self.pop(ctx)?;
        }
        let mut ty = self.parse_type(ctx)?;
        ty.qualifier = qualifier;
        let name = self.expect_identifier(ctx)?;
        if let Some(size) = self.parse_array_suffix(ctx)? {
            ty.array_size = size;
        }
        let (semantic, _) = self.parse_bind_specs(ctx)?;
        Ok(Param {
            name,
            ty,
            semantic,
            written: false
        })
    }

    fn parse_function(
        &mut self,
        ctx: &mut ParseContext,
        ret: TypeInfo,
        name: String,
        loc: SourceLoc
    ) -> PResult<Option<NodeId>>
    {
        self.expect(ctx, Token::LParen)?;
        let mut params = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pop(ctx)?;
        } else {
            loop {
                params.push(self.parse_param(ctx)?);
                match self.pop(ctx)? {
                    Token::Comma => (),
                    Token::RParen => break,
                    other => {
                        let loc = self.cur_loc.clone();
                        return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
                    }
                }
            }
        }
        let (ret_semantic, _) = self.parse_bind_specs(ctx)?;
        let param_types: Vec<TypeInfo> = params.iter().map(|p| p.ty.clone()).collect();
        let mangled = crate::symbols::mangle_function(&name, &param_types);
        let symbol = FunSymbol {
            name: name.clone(),
            mangled: mangled.clone(),
            ret: ret.clone(),
            params: param_types,
            builtin: ctx.seeding,
            defined: false
        };
        match self.pop(ctx)? {
            Token::Semicolon => {
                if ctx.table.insert(Symbol::Function(symbol)).is_err() && !ctx.seeding {
                    ctx.sink.error(&loc, &name, "redefinition");
                }
                Ok(None)
            }
            Token::LBrace => {
                let mut symbol = symbol;
                symbol.defined = true;
                match ctx.table.insert(Symbol::Function(symbol.clone())) {
                    Ok(()) => (),
                    Err(InsertError::SignatureCollision) => {
                        let already_defined = matches!(
                            ctx.table.find(&mangled),
                            Some(Symbol::Function(f)) if f.defined
                        );
                        if already_defined {
                            ctx.sink.error(&loc, &name, "redefinition");
                        } else {
                            ctx.table.redefine_function(symbol);
                        }
                    }
                    Err(_) => ctx.sink.error(&loc, &name, "redefinition")
                }
                let saved_ret = std::mem::replace(&mut ctx.current_ret, ret.clone());
                ctx.table.push();
                let mut param_nodes = Vec::new();
                for p in &params {
                    let mut pty = p.ty.clone();
                    pty.qualifier = Qualifier::None;
                    let _ = ctx.table.insert(Symbol::Variable(VarSymbol {
                        name: p.name.clone(),
                        ty: pty.clone(),
                        global: None
                    }));
                    param_nodes.push(ctx.unit.arena.alloc(
                        NodeKind::Symbol {
                            name: p.name.clone(),
                            global: None
                        },
                        pty,
                        loc.clone()
                    ));
                }
                let body = self.parse_block_statements(ctx)?;
                ctx.table.pop();
                ctx.current_ret = saved_ret;
                let param_agg = ctx.unit.arena.alloc(
                    NodeKind::Aggregate {
                        op: AggOp::Parameters,
                        name: String::new(),
                        children: param_nodes
                    },
                    TypeInfo::void(),
                    loc.clone()
                );
                let node = ctx.unit.arena.alloc(
                    NodeKind::Aggregate {
                        op: AggOp::Function,
                        name: mangled.clone(),
                        children: vec![param_agg, body]
                    },
                    ret.clone(),
                    loc.clone()
                );
                ctx.unit.functions.push(FunctionDef {
                    name,
                    mangled,
                    ret,
                    ret_semantic,
                    params,
                    body: Some(body),
                    loc
                });
                Ok(Some(node))
            }
            other => {
                let loc = self.cur_loc.clone();
                Err(self.syntax_error(ctx, &other.lexeme(), &loc))
            }
        }
    }

    /// Parses statements up to and including the closing brace. The opening
    /// brace has already been consumed.
    fn parse_block_statements(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let loc = self.cur_loc.clone();
        let mut children = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            if self.peek().is_none() {
                let loc = self.cur_loc.clone();
                return Err(self.syntax_error(ctx, "", &loc));
            }
            if let Some(stmt) = self.parse_statement(ctx)? {
                children.push(stmt);
            }
        }
        self.pop(ctx)?;
        Ok(ctx.unit.arena.alloc(
            NodeKind::Aggregate {
                op: AggOp::Sequence,
                name: String::new(),
                children
            },
            TypeInfo::void(),
            loc
        ))
    }

    fn starts_declaration(&self, ctx: &ParseContext) -> bool
    {
        match self.peek() {
            Some(Token::Const) | Some(Token::Static) => true,
            Some(Token::Identifier(name)) => {
                parse_type_name(name, &ctx.table).is_some()
                    && matches!(self.peek_second(), Some(Token::Identifier(_)))
            }
            _ => false
        }
    }

    fn parse_statement(&mut self, ctx: &mut ParseContext) -> PResult<Option<NodeId>>
    {
        match self.peek() {
            Some(Token::Semicolon) => {
                self.pop(ctx)?;
                Ok(None)
            }
            Some(Token::LBrace) => {
                self.pop(ctx)?;
                ctx.table.push();
                let block = self.parse_block_statements(ctx);
                ctx.table.pop();
                Ok(Some(block?))
            }
            Some(Token::Return) => {
                self.pop(ctx)?;
                let loc = self.cur_loc.clone();
                let value = if self.peek() == Some(&Token::Semicolon) {
                    if ctx.current_ret.basic != Basic::Void {
                        ctx.sink.error(&loc, "return", "non-void function must return a value");
                    }
                    None
                } else {
                    let expr = self.parse_expression(ctx)?;
                    if ctx.current_ret.basic == Basic::Void {
                        ctx.sink.error(&loc, "return", "void function cannot return a value");
                        Some(expr)
                    } else {
                        let ret = ctx.current_ret.clone();
                        Some(convert_checked(ctx, expr, &ret, "return"))
                    }
                };
                self.expect(ctx, Token::Semicolon)?;
                Ok(Some(ctx.unit.arena.alloc(
                    NodeKind::Branch {
                        kind: BranchKind::Return,
                        value
                    },
                    TypeInfo::void(),
                    loc
                )))
            }
            Some(Token::Break) => self.parse_simple_branch(ctx, BranchKind::Break),
            Some(Token::Continue) => self.parse_simple_branch(ctx, BranchKind::Continue),
            Some(Token::Discard) => self.parse_simple_branch(ctx, BranchKind::Discard),
            Some(Token::If) => self.parse_if(ctx),
            Some(Token::While) => self.parse_while(ctx),
            Some(Token::Do) => self.parse_do(ctx),
            Some(Token::For) => self.parse_for(ctx),
            _ if self.starts_declaration(ctx) => self.parse_local_declaration(ctx).map(Some),
            _ => {
                let expr = self.parse_expression(ctx)?;
                self.expect(ctx, Token::Semicolon)?;
                Ok(Some(expr))
            }
        }
    }

    fn parse_simple_branch(&mut self, ctx: &mut ParseContext, kind: BranchKind)
        -> PResult<Option<NodeId>>
    {
        self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        self.expect(ctx, Token::Semicolon)?;
        Ok(Some(ctx.unit.arena.alloc(
            NodeKind::Branch { kind, value: None },
            TypeInfo::void(),
            loc
        )))
    }

    fn parse_condition(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        self.expect(ctx, Token::LParen)?;
        let cond = self.parse_expression(ctx)?;
        self.expect(ctx, Token::RParen)?;
        let bool_ty = TypeInfo::scalar(Basic::Bool, Precision::None);
        Ok(convert_checked(ctx, cond, &bool_ty, "("))
    }

    fn parse_if(&mut self, ctx: &mut ParseContext) -> PResult<Option<NodeId>>
    {
        self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        let cond = self.parse_condition(ctx)?;
        let then_block = self.parse_statement(ctx)?;
        let else_block = if self.peek() == Some(&Token::Else) {
            self.pop(ctx)?;
            self.parse_statement(ctx)?
        } else {
            None
        };
        Ok(Some(ctx.unit.arena.alloc(
            NodeKind::Selection {
                cond,
                then_block,
                else_block
            },
            TypeInfo::void(),
            loc
        )))
    }

    fn parse_while(&mut self, ctx: &mut ParseContext) -> PResult<Option<NodeId>>
    {
        self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        let cond = self.parse_condition(ctx)?;
        let body = self
            .parse_statement(ctx)?
            .unwrap_or_else(|| self.empty_sequence(ctx));
        Ok(Some(ctx.unit.arena.alloc(
            NodeKind::Loop {
                kind: LoopKind::While,
                init: None,
                cond: Some(cond),
                step: None,
                body
            },
            TypeInfo::void(),
            loc
        )))
    }

    fn parse_do(&mut self, ctx: &mut ParseContext) -> PResult<Option<NodeId>>
    {
        self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        let body = self
            .parse_statement(ctx)?
            .unwrap_or_else(|| self.empty_sequence(ctx));
        self.expect(ctx, Token::While)?;
        let cond = self.parse_condition(ctx)?;
        self.expect(ctx, Token::Semicolon)?;
        Ok(Some(ctx.unit.arena.alloc(
            NodeKind::Loop {
                kind: LoopKind::DoWhile,
                init: None,
                cond: Some(cond),
                step: None,
                body
            },
            TypeInfo::void(),
            loc
        )))
    }

    fn parse_for(&mut self, ctx: &mut ParseContext) -> PResult<Option<NodeId>>
    {
        self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        self.expect(ctx, Token::LParen)?;
        ctx.table.push();
        let result = self.parse_for_inner(ctx, loc);
        ctx.table.pop();
        result
    }

    fn parse_for_inner(&mut self, ctx: &mut ParseContext, loc: SourceLoc) -> PResult<Option<NodeId>>
    {
        let init = if self.peek() == Some(&Token::Semicolon) {
            self.pop(ctx)?;
            None
        } else if self.starts_declaration(ctx) {
            Some(self.parse_local_declaration(ctx)?)
        } else {
            let expr = self.parse_expression(ctx)?;
            self.expect(ctx, Token::Semicolon)?;
            Some(expr)
        };
        let cond = if self.peek() == Some(&Token::Semicolon) {
            None
        } else {
            let expr = self.parse_expression(ctx)?;
            let bool_ty = TypeInfo::scalar(Basic::Bool, Precision::None);
            Some(convert_checked(ctx, expr, &bool_ty, "("))
        };
        self.expect(ctx, Token::Semicolon)?;
        let step = if self.peek() == Some(&Token::RParen) {
            None
        } else {
            Some(self.parse_expression(ctx)?)
        };
        self.expect(ctx, Token::RParen)?;
        let body = self
            .parse_statement(ctx)?
            .unwrap_or_else(|| self.empty_sequence(ctx));
        Ok(Some(ctx.unit.arena.alloc(
            NodeKind::Loop {
                kind: LoopKind::For,
                init,
                cond,
                step,
                body
            },
            TypeInfo::void(),
            loc
        )))
    }

    fn empty_sequence(&mut self, ctx: &mut ParseContext) -> NodeId
    {
        ctx.unit.arena.alloc(
            NodeKind::Aggregate {
                op: AggOp::Sequence,
                name: String::new(),
                children: Vec::new()
            },
            TypeInfo::void(),
            self.cur_loc.clone()
        )
    }

    fn parse_local_declaration(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let mut has_const = false;
        loop {
            match self.peek() {
                Some(Token::Const) => has_const = true,
                Some(Token::Static) => (),
                _ => break
            }
            self.pop(ctx)?;
        }
        let ty_loc = self.cur_peek_loc();
        let base = self.parse_type(ctx)?;
        if base.basic == Basic::Void {
            ctx.sink
                .error(&ty_loc, "void", "variables cannot have void type");
        }
        let mut children = Vec::new();
        loop {
            let name = self.expect_identifier(ctx)?;
            let name_loc = self.cur_loc.clone();
            let mut ty = base.clone();
            if has_const {
                ty.qualifier = Qualifier::Const;
            }
            if let Some(size) = self.parse_array_suffix(ctx)? {
                ty.array_size = size;
            }
            if self.peek() == Some(&Token::Colon) {
                ctx.sink
                    .error(&name_loc, &name, "semantic annotation on non-parameter");
                self.parse_bind_specs(ctx)?;
            }
            let init = if self.peek() == Some(&Token::Assign) {
                self.pop(ctx)?;
                Some(self.parse_initializer(ctx, &ty)?)
            } else {
                None
            };
            let mut sym_ty = ty.clone();
            sym_ty.qualifier = Qualifier::None;
            if ctx
                .table
                .insert(Symbol::Variable(VarSymbol {
                    name: name.clone(),
                    ty: sym_ty.clone(),
                    global: None
                }))
                .is_err()
            {
                ctx.sink.error(&name_loc, &name, "redefinition");
            }
            let sym = ctx.unit.arena.alloc(
                NodeKind::Symbol {
                    name: name.clone(),
                    global: None
                },
                ty.clone(),
                name_loc.clone()
            );
            let child = match init {
                Some(init) => ctx.unit.arena.alloc(
                    NodeKind::Binary {
                        op: BinaryOp::Assign,
                        left: sym,
                        right: init
                    },
                    ty.clone(),
                    name_loc
                ),
                None => sym
            };
            children.push(child);
            match self.pop(ctx)? {
                Token::Comma => (),
                Token::Semicolon => break,
                other => {
                    let loc = self.cur_loc.clone();
                    return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
                }
            }
        }
        Ok(ctx.unit.arena.alloc(
            NodeKind::Aggregate {
                op: AggOp::Declaration,
                name: String::new(),
                children
            },
            TypeInfo::void(),
            ty_loc
        ))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::ast::Unit;
    use crate::diag::InfoSink;
    use crate::symbols::SymbolTable;

    fn parse(source: &str) -> (Unit, InfoSink, bool)
    {
        let mut unit = Unit::new();
        let mut sink = InfoSink::new();
        let mut lexer = Lexer::new();
        lexer.process(source).unwrap();
        let mut table = SymbolTable::new();
        table.push();
        let ok = {
            let mut ctx = ParseContext::new(table, &mut unit, &mut sink);
            let mut parser = Parser::new(lexer);
            parser.parse_unit(&mut ctx)
        };
        let errors = sink.error_count();
        (unit, sink, ok && errors == 0)
    }

    #[test]
    fn globals_default_to_uniform()
    {
        let (unit, _, ok) = parse("float4x4 matrix_mvp;\nfloat4x4 matrix_normal;\n");
        assert!(ok);
        assert_eq!(unit.globals.len(), 2);
        assert!(unit.globals[0].is_uniform());
        assert_eq!(unit.globals[0].loc.line, 1);
        assert_eq!(unit.globals[1].loc.line, 2);
        assert_eq!(unit.globals[0].ty.type_code(), 21);
    }

    #[test]
    fn static_globals_are_not_uniform()
    {
        let (unit, _, ok) = parse("static float k = 1.0;\n");
        assert!(ok);
        assert!(!unit.globals[0].is_uniform());
        assert!(unit.globals[0].init.is_some());
    }

    #[test]
    fn function_with_semantics()
    {
        let (unit, _, ok) = parse(
            "void main (float4 vertex : POSITION, out float4 overtex : POSITION)\n{\n    overtex = vertex;\n}\n"
        );
        assert!(ok);
        assert_eq!(unit.functions.len(), 1);
        let f = &unit.functions[0];
        assert_eq!(f.name, "main");
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].semantic.as_deref(), Some("POSITION"));
        assert_eq!(f.params[1].ty.qualifier, Qualifier::Out);
    }

    #[test]
    fn return_semantic_is_recorded()
    {
        let (unit, _, ok) = parse("fixed4 main (float4 uv : TEXCOORD0) : COLOR0\n{\n    return uv;\n}\n");
        assert!(ok);
        assert_eq!(unit.functions[0].ret_semantic.as_deref(), Some("COLOR0"));
        assert_eq!(unit.functions[0].ret.precision, Precision::Low);
    }

    #[test]
    fn undeclared_type_then_syntax_error()
    {
        let src = "#line 1 \"undefined-type-in.hlsl\"\nvoid main(out float4 overtex : POSITION)\n    {\n        bloat4 b(1.f, 1.f, 1.f, 1.f);\n        overtex = float4(b.x,b.y,b,z,b.w);\n    }\n";
        let (_, sink, ok) = parse(src);
        assert!(!ok);
        assert_eq!(
            sink.log(),
            "undefined-type-in.hlsl(3): ERROR: 'bloat4' : undeclared identifier \n\
             undefined-type-in.hlsl(3): ERROR: 'b' : syntax error syntax error \n"
        );
    }

    #[test]
    fn reserved_word_diagnostics()
    {
        let src = "#line 1 \"undefined-type-in.hlsl\"\nvoid main(out float4 asm : POSITION)\n    {\n    }\n";
        let (_, sink, ok) = parse(src);
        assert!(!ok);
        assert_eq!(
            sink.log(),
            "undefined-type-in.hlsl(1): ERROR: 'asm' : Reserved word. \n\
             undefined-type-in.hlsl(1): ERROR: 'asm' : syntax error syntax error \n"
        );
    }

    #[test]
    fn struct_members_resolve()
    {
        let (unit, _, ok) = parse(
            "struct Light { float4 color; float power; };\nvoid main (out float4 o : COLOR0)\n{\n    Light l;\n    l.power = 1.0;\n    o = l.color * l.power;\n}\n"
        );
        assert!(ok);
        assert_eq!(unit.structs.len(), 1);
        assert_eq!(unit.structs[0].fields.len(), 2);
    }

    #[test]
    fn array_initializer_list()
    {
        let (unit, _, ok) = parse("static float weights[3] = { 0.25, 0.5, 0.25 };\n");
        assert!(ok);
        assert_eq!(unit.globals[0].ty.array_size, 3);
        assert!(unit.globals[0].init.is_some());
    }
}
