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

use crate::ast::types::{Basic, Precision, TypeInfo};
use crate::ast::{AggOp, BinaryOp, Const, NodeId, NodeKind, UnaryOp};
use crate::lexer::token::Token;
use crate::location::SourceLoc;
use crate::parser::context::{parse_type_name, ParseContext};
use crate::parser::core::{PResult, Parser};
use crate::symbols::{CallError, Symbol};

/// Inserts a conversion node unless the expression already has the target
/// shape. Scalar constants fold in place so literal arguments emit as plain
/// numbers.
pub fn convert(ctx: &mut ParseContext, id: NodeId, target: &TypeInfo) -> NodeId
{
    let node = ctx.unit.arena.node(id);
    if node.ty.same_shape(target) {
        return id;
    }
    let loc = node.loc.clone();
    let mut ty = target.clone();
    ty.qualifier = crate::ast::Qualifier::None;
    if target.rows == 1 && target.cols == 1 {
        if let NodeKind::Constant(c) = &node.kind {
            let folded = match (c, target.basic) {
                (Const::Int(i), Basic::Float) => Some(Const::Float(*i as f32)),
                (Const::Float(f), Basic::Int) => Some(Const::Int(*f as i64)),
                (Const::Bool(b), Basic::Int) => Some(Const::Int(*b as i64)),
                (Const::Bool(b), Basic::Float) => Some(Const::Float(*b as i64 as f32)),
                _ => None
            };
            if let Some(folded) = folded {
                return ctx.unit.arena.alloc(NodeKind::Constant(folded), ty, loc);
            }
        }
    }
    ctx.unit.arena.alloc(
        NodeKind::Unary {
            op: UnaryOp::Cast,
            operand: id
        },
        ty,
        loc
    )
}

/// Like `convert` but diagnoses incompatible shapes instead of emitting a
/// silently wrong tree.
pub fn convert_checked(ctx: &mut ParseContext, id: NodeId, target: &TypeInfo, lexeme: &str) -> NodeId
{
    let ty = ctx.unit.arena.node(id).ty.clone();
    if !ty.promotable_to(target) {
        let loc = ctx.unit.arena.node(id).loc.clone();
        ctx.sink.error(&loc, lexeme, "cannot implicitly convert between types");
        return id;
    }
    convert(ctx, id, target)
}

fn swizzle_index(chr: char) -> Option<u8>
{
    match chr {
        'x' | 'r' | 's' => Some(0),
        'y' | 'g' | 't' => Some(1),
        'z' | 'b' | 'p' => Some(2),
        'w' | 'a' | 'q' => Some(3),
        _ => None
    }
}

fn binary_precedence(token: &Token) -> Option<(BinaryOp, u8)>
{
    match token {
        Token::Star => Some((BinaryOp::Mul, 10)),
        Token::Slash => Some((BinaryOp::Div, 10)),
        Token::Percent => Some((BinaryOp::Mod, 10)),
        Token::Plus => Some((BinaryOp::Add, 9)),
        Token::Minus => Some((BinaryOp::Sub, 9)),
        Token::Less => Some((BinaryOp::Less, 8)),
        Token::Greater => Some((BinaryOp::Greater, 8)),
        Token::LessEqual => Some((BinaryOp::LessEqual, 8)),
        Token::GreaterEqual => Some((BinaryOp::GreaterEqual, 8)),
        Token::Equal => Some((BinaryOp::Equal, 7)),
        Token::NotEqual => Some((BinaryOp::NotEqual, 7)),
        Token::AndAnd => Some((BinaryOp::LogicalAnd, 6)),
        Token::OrOr => Some((BinaryOp::LogicalOr, 5)),
        _ => None
    }
}

fn assignment_op(token: &Token) -> Option<BinaryOp>
{
    match token {
        Token::Assign => Some(BinaryOp::Assign),
        Token::PlusAssign => Some(BinaryOp::AddAssign),
        Token::MinusAssign => Some(BinaryOp::SubAssign),
        Token::StarAssign => Some(BinaryOp::MulAssign),
        Token::SlashAssign => Some(BinaryOp::DivAssign),
        _ => None
    }
}

fn wider_basic(a: Basic, b: Basic) -> Basic
{
    if a == Basic::Float || b == Basic::Float {
        Basic::Float
    } else if a == Basic::Uint || b == Basic::Uint {
        Basic::Uint
    } else {
        Basic::Int
    }
}

impl Parser
{
    pub(crate) fn parse_expression(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let left = self.parse_ternary(ctx)?;
        let op = match self.peek().and_then(assignment_op) {
            Some(op) => op,
            None => return Ok(left)
        };
        self.pop(ctx)?;
        if !self.is_lvalue(ctx, left) {
            let loc = ctx.unit.arena.node(left).loc.clone();
            ctx.sink.error(&loc, op.glsl(), "l-value required");
        }
        let right = self.parse_expression(ctx)?;
        let target = ctx.unit.arena.node(left).ty.clone();
        let right = convert_checked(ctx, right, &target, op.glsl());
        let loc = ctx.unit.arena.node(left).loc.clone();
        Ok(ctx
            .unit
            .arena
            .alloc(NodeKind::Binary { op, left, right }, target, loc))
    }

    fn is_lvalue(&self, ctx: &ParseContext, id: NodeId) -> bool
    {
        match &ctx.unit.arena.node(id).kind {
            NodeKind::Symbol { .. } => true,
            NodeKind::Unary {
                op: UnaryOp::Field(_),
                operand
            } => self.is_lvalue(ctx, *operand),
            NodeKind::Binary {
                op: BinaryOp::Index,
                left,
                ..
            } => self.is_lvalue(ctx, *left),
            _ => false
        }
    }

    fn parse_ternary(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let cond = self.parse_binary(ctx, 0)?;
        if self.peek() != Some(&Token::Question) {
            return Ok(cond);
        }
        self.pop(ctx)?;
        let bool_ty = TypeInfo::scalar(Basic::Bool, Precision::None);
        let cond = convert_checked(ctx, cond, &bool_ty, "?");
        let then_expr = self.parse_expression(ctx)?;
        self.expect(ctx, Token::Colon)?;
        let else_expr = self.parse_expression(ctx)?;
        let ty = ctx.unit.arena.node(then_expr).ty.clone();
        let else_expr = convert_checked(ctx, else_expr, &ty, ":");
        let loc = ctx.unit.arena.node(cond).loc.clone();
        Ok(ctx.unit.arena.alloc(
            NodeKind::Selection {
                cond,
                then_block: Some(then_expr),
                else_block: Some(else_expr)
            },
            ty,
            loc
        ))
    }

    fn parse_binary(&mut self, ctx: &mut ParseContext, min_prec: u8) -> PResult<NodeId>
    {
        let mut left = self.parse_unary(ctx)?;
        while let Some((op, prec)) = self.peek().and_then(binary_precedence) {
            if prec < min_prec {
                break;
            }
            self.pop(ctx)?;
            let right = self.parse_binary(ctx, prec + 1)?;
            left = self.make_binary(ctx, op, left, right)?;
        }
        Ok(left)
    }

    fn make_binary(&mut self, ctx: &mut ParseContext, op: BinaryOp, left: NodeId, right: NodeId)
        -> PResult<NodeId>
    {
        let lty = ctx.unit.arena.node(left).ty.clone();
        let rty = ctx.unit.arena.node(right).ty.clone();
        let loc = ctx.unit.arena.node(left).loc.clone();
        match op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                let bool_ty = TypeInfo::scalar(Basic::Bool, Precision::None);
                let left = convert_checked(ctx, left, &bool_ty, op.glsl());
                let right = convert_checked(ctx, right, &bool_ty, op.glsl());
                Ok(ctx
                    .unit
                    .arena
                    .alloc(NodeKind::Binary { op, left, right }, bool_ty, loc))
            }
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::Greater
            | BinaryOp::LessEqual
            | BinaryOp::GreaterEqual => {
                let (left, right) = self.unify_arith(ctx, op, left, right, &lty, &rty, &loc);
                let bool_ty = TypeInfo::scalar(Basic::Bool, Precision::None);
                Ok(ctx
                    .unit
                    .arena
                    .alloc(NodeKind::Binary { op, left, right }, bool_ty, loc))
            }
            _ => {
                if lty.is_matrix() && rty.is_vector() || lty.is_vector() && rty.is_matrix() {
                    ctx.sink
                        .error(&loc, op.glsl(), "matrix and vector operands require mul");
                }
                let (left, right) = self.unify_arith(ctx, op, left, right, &lty, &rty, &loc);
                // the larger shape wins: scalars broadcast over the other side
                let lty = ctx.unit.arena.node(left).ty.clone();
                let rty = ctx.unit.arena.node(right).ty.clone();
                let ty = if lty.component_count() >= rty.component_count() {
                    lty
                } else {
                    rty
                };
                Ok(ctx.unit.arena.alloc(NodeKind::Binary { op, left, right }, ty, loc))
            }
        }
    }

    /// Unifies the basic categories of two numeric operands, leaving shapes
    /// alone (scalar broadcast needs no conversion in the output language).
    fn unify_arith(
        &mut self,
        ctx: &mut ParseContext,
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
        lty: &TypeInfo,
        rty: &TypeInfo,
        loc: &SourceLoc
    ) -> (NodeId, NodeId)
    {
        if !lty.basic.is_numeric() && lty.basic != Basic::Bool
            || !rty.basic.is_numeric() && rty.basic != Basic::Bool
        {
            ctx.sink.error(loc, op.glsl(), "wrong operand types");
            return (left, right);
        }
        if lty.is_vector() && rty.is_vector() && lty.rows != rty.rows {
            ctx.sink.error(loc, op.glsl(), "vector sizes do not match");
        }
        let basic = wider_basic(lty.basic, rty.basic);
        let precision = lty.precision.max(rty.precision);
        let mut lt = lty.clone();
        lt.basic = basic;
        lt.precision = precision;
        let mut rt = rty.clone();
        rt.basic = basic;
        rt.precision = precision;
        (convert(ctx, left, &lt), convert(ctx, right, &rt))
    }

    fn parse_unary(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let (op, lexeme) = match self.peek() {
            Some(Token::Minus) => (Some(UnaryOp::Negative), "-"),
            Some(Token::Not) => (Some(UnaryOp::LogicalNot), "!"),
            Some(Token::Increment) => (Some(UnaryOp::PreIncrement), "++"),
            Some(Token::Decrement) => (Some(UnaryOp::PreDecrement), "--"),
            Some(Token::Tilde) => (Some(UnaryOp::BitNot), "~"),
            _ => (None, "")
        };
        if let Some(op) = op {
            self.pop(ctx)?;
            let loc = self.cur_loc.clone();
            let operand = self.parse_unary(ctx)?;
            let ty = match op {
                UnaryOp::LogicalNot => {
                    let bool_ty = TypeInfo::scalar(Basic::Bool, Precision::None);
                    let operand = convert_checked(ctx, operand, &bool_ty, lexeme);
                    return Ok(ctx.unit.arena.alloc(
                        NodeKind::Unary { op, operand },
                        bool_ty,
                        loc
                    ));
                }
                _ => ctx.unit.arena.node(operand).ty.clone()
            };
            return Ok(ctx.unit.arena.alloc(NodeKind::Unary { op, operand }, ty, loc));
        }
        // C-style cast: '(' type-name ')' unary-expression
        if self.peek() == Some(&Token::LParen) {
            if let Some(Token::Identifier(name)) = self.peek_second() {
                let is_cast = parse_type_name(name, &ctx.table).is_some()
                    && self.peek_third() == Some(&Token::RParen);
                if is_cast {
                    self.pop(ctx)?;
                    let loc = self.cur_loc.clone();
                    let name = match self.pop(ctx)? {
                        Token::Identifier(name) => name,
                        // SAFETY: peeked as identifier above
                        _ => unreachable!()
                    };
                    self.expect(ctx, Token::RParen)?;
                    // SAFETY: checked by is_cast above
                    let target = parse_type_name(&name, &ctx.table).unwrap();
                    let operand = self.parse_unary(ctx)?;
                    return Ok(ctx.unit.arena.alloc(
                        NodeKind::Unary {
                            op: UnaryOp::Cast,
                            operand
                        },
                        target,
                        loc
                    ));
                }
            }
        }
        self.parse_postfix(ctx)
    }

    fn parse_postfix(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let mut node = self.parse_primary(ctx)?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pop(ctx)?;
                    let loc = self.cur_loc.clone();
                    let field = self.expect_identifier(ctx)?;
                    node = self.make_field(ctx, node, field, loc)?;
                }
                Some(Token::LBracket) => {
                    self.pop(ctx)?;
                    let loc = self.cur_loc.clone();
                    let index = self.parse_expression(ctx)?;
                    self.expect(ctx, Token::RBracket)?;
                    let base_ty = ctx.unit.arena.node(node).ty.clone();
                    let ty = if base_ty.is_array() {
                        let mut t = base_ty.clone();
                        t.array_size = 0;
                        t
                    } else if base_ty.is_matrix() {
                        TypeInfo::vector(Basic::Float, base_ty.cols, base_ty.precision)
                    } else if base_ty.is_vector() {
                        TypeInfo::scalar(base_ty.basic, base_ty.precision)
                    } else {
                        ctx.sink.error(&loc, "[", "cannot index this type");
                        base_ty.clone()
                    };
                    node = ctx.unit.arena.alloc(
                        NodeKind::Binary {
                            op: BinaryOp::Index,
                            left: node,
                            right: index
                        },
                        ty,
                        loc
                    );
                }
                Some(Token::Increment) => {
                    self.pop(ctx)?;
                    let loc = self.cur_loc.clone();
                    let ty = ctx.unit.arena.node(node).ty.clone();
                    node = ctx.unit.arena.alloc(
                        NodeKind::Unary {
                            op: UnaryOp::PostIncrement,
                            operand: node
                        },
                        ty,
                        loc
                    );
                }
                Some(Token::Decrement) => {
                    self.pop(ctx)?;
                    let loc = self.cur_loc.clone();
                    let ty = ctx.unit.arena.node(node).ty.clone();
                    node = ctx.unit.arena.alloc(
                        NodeKind::Unary {
                            op: UnaryOp::PostDecrement,
                            operand: node
                        },
                        ty,
                        loc
                    );
                }
                _ => break
            }
        }
        Ok(node)
    }

    fn make_field(&mut self, ctx: &mut ParseContext, base: NodeId, field: String, loc: SourceLoc)
        -> PResult<NodeId>
    {
        let base_ty = ctx.unit.arena.node(base).ty.clone();
        let ty = if base_ty.basic == Basic::Struct {
            let def = base_ty
                .struct_ref
                .and_then(|id| ctx.unit.structs.get(id as usize));
            match def.and_then(|d| d.fields.iter().find(|f| f.name == field)) {
                Some(f) => f.ty.clone(),
                None => {
                    ctx.sink.error(&loc, &field, "no such field");
                    TypeInfo::scalar(Basic::Float, Precision::High)
                }
            }
        } else if base_ty.basic.is_numeric() || base_ty.basic == Basic::Bool {
            if base_ty.is_matrix() {
                ctx.sink.error(&loc, &field, "cannot swizzle a matrix");
                base_ty.clone()
            } else {
                let mut valid = field.len() <= 4 && !field.is_empty();
                for chr in field.chars() {
                    match swizzle_index(chr) {
                        Some(i) if i < base_ty.rows => (),
                        _ => valid = false
                    }
                }
                if !valid {
                    ctx.sink.error(&loc, &field, "invalid swizzle");
                }
                if field.len() == 1 {
                    TypeInfo::scalar(base_ty.basic, base_ty.precision)
                } else {
                    TypeInfo::vector(base_ty.basic, field.len() as u8, base_ty.precision)
                }
            }
        } else {
            ctx.sink.error(&loc, &field, "no such field");
            base_ty.clone()
        };
        Ok(ctx.unit.arena.alloc(
            NodeKind::Unary {
                op: UnaryOp::Field(field),
                operand: base
            },
            ty,
            loc
        ))
    }

    fn parse_primary(&mut self, ctx: &mut ParseContext) -> PResult<NodeId>
    {
        let token = self.pop(ctx)?;
        let loc = self.cur_loc.clone();
        match token {
            Token::IntConst(v) => Ok(ctx.unit.arena.alloc(
                NodeKind::Constant(Const::Int(v)),
                TypeInfo::scalar(Basic::Int, Precision::High),
                loc
            )),
            Token::FloatConst(v) => Ok(ctx.unit.arena.alloc(
                NodeKind::Constant(Const::Float(v)),
                TypeInfo::scalar(Basic::Float, Precision::High),
                loc
            )),
            Token::BoolConst(v) => Ok(ctx.unit.arena.alloc(
                NodeKind::Constant(Const::Bool(v)),
                TypeInfo::scalar(Basic::Bool, Precision::None),
                loc
            )),
            Token::LParen => {
                let inner = self.parse_expression(ctx)?;
                self.expect(ctx, Token::RParen)?;
                Ok(inner)
            }
            Token::Identifier(name) => {
                self.check_reserved(ctx, &name, &loc)?;
                if self.peek() == Some(&Token::LParen) {
                    if let Some(target) = parse_type_name(&name, &ctx.table) {
                        return self.parse_constructor(ctx, target, &name, loc);
                    }
                    return self.parse_call(ctx, name, loc);
                }
                match ctx.table.find(&name) {
                    Some(Symbol::Variable(v)) => {
                        let mut ty = v.ty.clone();
                        let global = v.global;
                        ty.qualifier = crate::ast::Qualifier::None;
                        Ok(ctx.unit.arena.alloc(NodeKind::Symbol { name, global }, ty, loc))
                    }
                    _ => {
                        ctx.sink.error(&loc, &name, "undeclared identifier");
                        Ok(ctx.unit.arena.alloc(
                            NodeKind::Symbol { name, global: None },
                            TypeInfo::scalar(Basic::Float, Precision::High),
                            loc
                        ))
                    }
                }
            }
            other => Err(self.syntax_error(ctx, &other.lexeme(), &loc))
        }
    }

    fn parse_arguments(&mut self, ctx: &mut ParseContext) -> PResult<Vec<NodeId>>
    {
        self.expect(ctx, Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pop(ctx)?;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(ctx)?);
            match self.pop(ctx)? {
                Token::Comma => (),
                Token::RParen => break,
                other => {
                    let loc = self.cur_loc.clone();
                    return Err(self.syntax_error(ctx, &other.lexeme(), &loc));
                }
            }
        }
        Ok(args)
    }

    fn parse_constructor(
        &mut self,
        ctx: &mut ParseContext,
        target: TypeInfo,
        name: &str,
        loc: SourceLoc
    ) -> PResult<NodeId>
    {
        let args = self.parse_arguments(ctx)?;
        if args.len() == 1 {
            let arg_ty = ctx.unit.arena.node(args[0]).ty.clone();
            // single-argument constructors behave like conversions: matrix
            // truncation such as float3x3(m), scalar splats, and narrowing
            if arg_ty.is_matrix()
                || arg_ty.is_scalar()
                || arg_ty.component_count() >= target.component_count()
            {
                return Ok(ctx.unit.arena.alloc(
                    NodeKind::Unary {
                        op: UnaryOp::Cast,
                        operand: args[0]
                    },
                    target,
                    loc
                ));
            }
        }
        let mut provided = 0u32;
        for arg in &args {
            let ty = &ctx.unit.arena.node(*arg).ty;
            if ty.is_matrix() {
                ctx.sink.error(&loc, name, "matrix argument in componentwise constructor");
            }
            provided += ty.component_count();
        }
        if provided != target.component_count() {
            ctx.sink.error(&loc, name, "wrong number of arguments in constructor");
        }
        // componentwise arguments adopt the constructed basic type
        let scalar = TypeInfo::scalar(target.basic, target.precision);
        let args: Vec<NodeId> = args
            .into_iter()
            .map(|arg| {
                let ty = ctx.unit.arena.node(arg).ty.clone();
                let mut want = scalar.clone();
                want.rows = ty.rows;
                convert(ctx, arg, &want)
            })
            .collect();
        Ok(ctx.unit.arena.alloc(
            NodeKind::Aggregate {
                op: AggOp::Constructor,
                name: String::new(),
                children: args
            },
            target,
            loc
        ))
    }

    fn parse_call(&mut self, ctx: &mut ParseContext, name: String, loc: SourceLoc) -> PResult<NodeId>
    {
        let args = self.parse_arguments(ctx)?;
        let arg_types: Vec<TypeInfo> = args
            .iter()
            .map(|a| ctx.unit.arena.node(*a).ty.clone())
            .collect();
        match ctx.table.resolve_call(&name, &arg_types) {
            Ok(f) => {
                let args: Vec<NodeId> = args
                    .into_iter()
                    .zip(&f.params)
                    .map(|(arg, p)| {
                        if p.basic.is_sampler() {
                            // samplers pass through; their concrete type is
                            // settled by the sampler propagation pass
                            arg
                        } else {
                            convert(ctx, arg, p)
                        }
                    })
                    .collect();
                let mut ty = f.ret.clone();
                ty.qualifier = crate::ast::Qualifier::None;
                Ok(ctx.unit.arena.alloc(
                    NodeKind::Aggregate {
                        op: AggOp::FunctionCall,
                        name: f.mangled,
                        children: args
                    },
                    ty,
                    loc
                ))
            }
            Err(err) => {
                if !ctx.table.find_any_function(&name) {
                    ctx.sink.error(&loc, &name, "undeclared identifier");
                } else {
                    match err {
                        CallError::NoMatch => {
                            ctx.sink
                                .error(&loc, &name, "no matching overloaded function found")
                        }
                        CallError::Ambiguous => {
                            ctx.sink.error(&loc, &name, "ambiguous function call")
                        }
                    }
                }
                Ok(ctx.unit.arena.alloc(
                    NodeKind::Constant(Const::Float(0.0)),
                    TypeInfo::scalar(Basic::Float, Precision::High),
                    loc
                ))
            }
        }
    }
}
