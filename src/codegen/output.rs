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

use std::fmt::Write;

use log::debug;
use phf::phf_set;

use crate::ast::types::{Basic, TypeInfo};
use crate::ast::{
    AggOp,
    BinaryOp,
    BranchKind,
    Const,
    FunctionDef,
    GlobalVar,
    LoopKind,
    NodeId,
    NodeKind,
    UnaryOp,
    Unit
};
use crate::codegen::function::{CodegenOutput, GlslFunction, GlslGlobal, UniformInfo};
use crate::codegen::{precision_prefix, type_name};
use crate::config::{PrefixTable, TargetVersion};
use crate::diag::InfoSink;
use crate::support::{HelperId, SupportLib};

static INTRINSIC_NAMES: phf::Set<&'static str> = phf_set! {
    "mul", "dot", "cross", "length", "distance", "normalize", "min", "max",
    "clamp", "saturate", "lerp", "step", "smoothstep", "pow", "exp", "exp2",
    "log", "log2", "sqrt", "rsqrt", "abs", "sign", "floor", "ceil", "frac",
    "fmod", "sin", "cos", "tan", "asin", "acos", "atan", "atan2", "reflect",
    "refract", "ddx", "ddy", "fwidth", "tex1D", "tex2D", "tex2Dproj", "tex3D",
    "texCUBE", "shadow2D", "shadow2Dproj"
};

/// Simple renames where the output language spells the intrinsic
/// differently but the call shape is unchanged.
fn rename_intrinsic(name: &str) -> &str
{
    match name {
        "lerp" => "mix",
        "frac" => "fract",
        "rsqrt" => "inversesqrt",
        "fmod" => "mod",
        "atan2" => "atan",
        "ddx" => "dFdx",
        "ddy" => "dFdy",
        other => other
    }
}

fn fmt_float(v: f32) -> String
{
    if v == v.trunc() && v.is_finite() && v.abs() < 1e9 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

struct LineState
{
    last_assign: Option<u32>
}

/// Tree-to-text visitor owning the per-function emission state.
struct Codegen<'a>
{
    unit: &'a Unit,
    version: TargetVersion,
    support: SupportLib,
    prefix: &'a PrefixTable,
    called: Vec<String>,
    helpers: Vec<HelperId>,
    structs_used: Vec<u32>
}

/// Translates the whole unit. Runs during the parse call, once the
/// transform passes have settled sampler types and uniform mutability.
pub fn run(unit: &Unit, version: TargetVersion, prefix: &PrefixTable, _sink: &mut InfoSink)
    -> CodegenOutput
{
    let mut cg = Codegen {
        unit,
        version,
        support: SupportLib::new(version),
        prefix,
        called: Vec::new(),
        helpers: Vec::new(),
        structs_used: Vec::new()
    };
    let mut globals = Vec::new();
    let mut uniforms = Vec::new();
    for g in &unit.globals {
        globals.push(cg.emit_global(g));
        if g.is_uniform() {
            uniforms.push(UniformInfo {
                name: g.name.clone(),
                semantic: g.semantic.clone(),
                type_code: g.ty.type_code(),
                array_size: g.ty.array_size,
                register_spec: g.register_spec.clone()
            });
        }
    }
    let functions = unit
        .functions
        .iter()
        .filter(|f| f.body.is_some())
        .map(|f| cg.emit_function(f))
        .collect();
    CodegenOutput {
        functions,
        globals,
        uniforms,
        structs: unit.structs.clone(),
        version
    }
}

impl<'a> Codegen<'a>
{
    fn mark_struct(&mut self, ty: &TypeInfo)
    {
        if ty.basic == Basic::Struct {
            if let Some(id) = ty.struct_ref {
                if !self.structs_used.contains(&id) {
                    self.structs_used.push(id);
                }
            }
        }
    }

    fn ty_name(&mut self, ty: &TypeInfo) -> String
    {
        self.mark_struct(ty);
        type_name(self.version, ty, &self.unit.structs)
    }

    fn prec(&self, ty: &TypeInfo) -> &'static str
    {
        precision_prefix(self.version, ty)
    }

    fn need_helper(&mut self, id: HelperId)
    {
        if !self.helpers.contains(&id) {
            self.helpers.push(id);
        }
    }

    fn emit_global(&mut self, g: &GlobalVar) -> GlslGlobal
    {
        self.mark_struct(&g.ty);
        let mut init_text = None;
        let mut deferred = Vec::new();
        if let Some(init) = g.init {
            if g.is_uniform() {
                debug!("dropping initializer on uniform '{}'", g.name);
            } else if let NodeKind::Aggregate {
                op: AggOp::InitializerList,
                children,
                ..
            } = &self.unit.arena.node(init).kind
            {
                let children = children.clone();
                if g.ty.is_array() {
                    for (i, item) in children.iter().enumerate() {
                        let expr = self.emit_expr(*item);
                        deferred.push(format!("{}[{}] = {};", g.name, i, expr));
                    }
                } else {
                    let args: Vec<String> = children.iter().map(|c| self.emit_expr(*c)).collect();
                    let ty = self.ty_name(&g.ty);
                    deferred.push(format!("{} = {}( {});", g.name, ty, args.join(", ")));
                }
            } else {
                init_text = Some(self.emit_expr(init));
            }
        }
        GlslGlobal {
            name: g.name.clone(),
            ty: g.ty.clone(),
            semantic: g.semantic.clone(),
            register_spec: g.register_spec.clone(),
            mutable: g.mutable,
            init_text,
            deferred,
            line: g.loc.line
        }
    }

    fn emit_function(&mut self, f: &FunctionDef) -> GlslFunction
    {
        self.called.clear();
        self.helpers.clear();
        self.structs_used.clear();
        self.mark_struct(&f.ret);
        for p in &f.params {
            self.mark_struct(&p.ty);
        }
        let mut body = String::new();
        let mut state = LineState { last_assign: None };
        // SAFETY: run() only visits functions that carry a body
        let root = f.body.unwrap();
        if let NodeKind::Aggregate { children, .. } = &self.unit.arena.node(root).kind {
            for child in children.clone() {
                self.emit_statement(child, 1, &mut body, &mut state, true);
            }
        }
        GlslFunction {
            name: f.name.clone(),
            mangled: f.mangled.clone(),
            ret: f.ret.clone(),
            ret_semantic: f.ret_semantic.clone(),
            params: f.params.clone(),
            body,
            called: std::mem::take(&mut self.called),
            support: std::mem::take(&mut self.helpers),
            structs_used: std::mem::take(&mut self.structs_used),
            line: f.loc.line,
            extra_line_directive: f.ret_semantic.is_some()
        }
    }

    fn emit_block(&mut self, id: NodeId, indent: usize, out: &mut String, state: &mut LineState)
    {
        if let NodeKind::Aggregate {
            op: AggOp::Sequence,
            children,
            ..
        } = &self.unit.arena.node(id).kind
        {
            for child in children.clone() {
                self.emit_statement(child, indent, out, state, false);
            }
        } else {
            self.emit_statement(id, indent, out, state, false);
        }
    }

    fn emit_statement(
        &mut self,
        id: NodeId,
        indent: usize,
        out: &mut String,
        state: &mut LineState,
        top: bool
    )
    {
        let ind = "    ".repeat(indent);
        let node = self.unit.arena.node(id);
        let loc_line = node.loc.line;
        match node.kind.clone() {
            NodeKind::Aggregate {
                op: AggOp::Declaration,
                children,
                ..
            } => {
                for child in children {
                    self.emit_declarator(child, &ind, out);
                }
            }
            NodeKind::Aggregate {
                op: AggOp::Sequence,
                children,
                ..
            } => {
                let _ = writeln!(out, "{}{{", ind);
                for child in children {
                    self.emit_statement(child, indent + 1, out, state, false);
                }
                let _ = writeln!(out, "{}}}", ind);
            }
            NodeKind::Binary { op, .. } if op.is_assignment() => {
                // line directives precede assignment statements that are not
                // on the line right after the previous one
                if top {
                    let emit_directive = match state.last_assign {
                        None => true,
                        Some(prev) => loc_line != prev + 1
                    };
                    if emit_directive {
                        let _ = writeln!(out, "{}#line {}", ind, loc_line);
                    }
                    state.last_assign = Some(loc_line);
                }
                let expr = self.emit_expr(id);
                let _ = writeln!(out, "{}{};", ind, expr);
            }
            NodeKind::Branch { kind, value } => match kind {
                BranchKind::Return => match value {
                    Some(v) => {
                        let expr = self.emit_expr(v);
                        let _ = writeln!(out, "{}return {};", ind, expr);
                    }
                    None => {
                        let _ = writeln!(out, "{}return;", ind);
                    }
                },
                BranchKind::Break => {
                    let _ = writeln!(out, "{}break;", ind);
                }
                BranchKind::Continue => {
                    let _ = writeln!(out, "{}continue;", ind);
                }
                BranchKind::Discard | BranchKind::Kill => {
                    let _ = writeln!(out, "{}discard;", ind);
                }
            },
            NodeKind::Selection {
                cond,
                then_block,
                else_block
            } => {
                let cond = self.emit_expr(cond);
                let _ = writeln!(out, "{}if ({}) {{", ind, cond);
                if let Some(then_block) = then_block {
                    self.emit_block(then_block, indent + 1, out, state);
                }
                match else_block {
                    Some(else_block) => {
                        let _ = writeln!(out, "{}}} else {{", ind);
                        self.emit_block(else_block, indent + 1, out, state);
                        let _ = writeln!(out, "{}}}", ind);
                    }
                    None => {
                        let _ = writeln!(out, "{}}}", ind);
                    }
                }
            }
            NodeKind::Loop {
                kind,
                init,
                cond,
                step,
                body
            } => self.emit_loop(kind, init, cond, step, body, indent, out, state),
            _ => {
                let expr = self.emit_expr(id);
                let _ = writeln!(out, "{}{};", ind, expr);
            }
        }
    }

    fn emit_declarator(&mut self, id: NodeId, ind: &str, out: &mut String)
    {
        let node = self.unit.arena.node(id);
        match node.kind.clone() {
            NodeKind::Symbol { name, .. } => {
                let ty = node.ty.clone();
                let decl = self.declaration_text(&ty, &name);
                let _ = writeln!(out, "{}{};", ind, decl);
            }
            NodeKind::Binary { left, right, .. } => {
                let (name, ty) = match self.unit.arena.node(left).kind.clone() {
                    NodeKind::Symbol { name, .. } => (name, self.unit.arena.node(left).ty.clone()),
                    _ => return
                };
                if let NodeKind::Aggregate {
                    op: AggOp::InitializerList,
                    children,
                    ..
                } = &self.unit.arena.node(right).kind
                {
                    let children = children.clone();
                    let decl = self.declaration_text(&ty, &name);
                    if ty.is_array() {
                        let _ = writeln!(out, "{}{};", ind, decl);
                        for (i, item) in children.iter().enumerate() {
                            let expr = self.emit_expr(*item);
                            let _ = writeln!(out, "{}{}[{}] = {};", ind, name, i, expr);
                        }
                    } else {
                        let args: Vec<String> = children.iter().map(|c| self.emit_expr(*c)).collect();
                        let tname = self.ty_name(&ty);
                        let _ = writeln!(out, "{}{} = {}( {});", ind, decl, tname, args.join(", "));
                    }
                    return;
                }
                let expr = self.emit_expr(right);
                let decl = self.declaration_text(&ty, &name);
                let _ = writeln!(out, "{}{} = {};", ind, decl, expr);
            }
            _ => ()
        }
    }

    fn declaration_text(&mut self, ty: &TypeInfo, name: &str) -> String
    {
        let tname = self.ty_name(ty);
        let arr = if ty.array_size > 0 {
            format!("[{}]", ty.array_size)
        } else {
            String::new()
        };
        format!("{}{} {}{}", self.prec(ty), tname, name, arr)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_loop(
        &mut self,
        kind: LoopKind,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
        indent: usize,
        out: &mut String,
        state: &mut LineState
    )
    {
        let ind = "    ".repeat(indent);
        match kind {
            LoopKind::For => {
                let init = init.map(|id| self.inline_statement(id)).unwrap_or_default();
                let cond = cond.map(|id| self.emit_expr(id)).unwrap_or_default();
                let step = step.map(|id| self.emit_expr(id)).unwrap_or_default();
                let _ = writeln!(out, "{}for ({}; {}; {}) {{", ind, init, cond, step);
                self.emit_block(body, indent + 1, out, state);
                let _ = writeln!(out, "{}}}", ind);
            }
            LoopKind::While => {
                let cond = cond.map(|id| self.emit_expr(id)).unwrap_or_default();
                let _ = writeln!(out, "{}while ({}) {{", ind, cond);
                self.emit_block(body, indent + 1, out, state);
                let _ = writeln!(out, "{}}}", ind);
            }
            LoopKind::DoWhile => {
                let _ = writeln!(out, "{}do {{", ind);
                self.emit_block(body, indent + 1, out, state);
                let cond = cond.map(|id| self.emit_expr(id)).unwrap_or_default();
                let _ = writeln!(out, "{}}} while ({});", ind, cond);
            }
        }
    }

    /// Renders a for-initializer without indentation or terminator.
    fn inline_statement(&mut self, id: NodeId) -> String
    {
        let node = self.unit.arena.node(id);
        if let NodeKind::Aggregate {
            op: AggOp::Declaration,
            children,
            ..
        } = &node.kind
        {
            let children = children.clone();
            let mut parts = Vec::new();
            for child in children {
                let mut text = String::new();
                self.emit_declarator(child, "", &mut text);
                parts.push(text.trim_end_matches(&['\n', ';'][..]).to_string());
            }
            return parts.join(", ");
        }
        self.emit_expr(id)
    }

    fn emit_expr(&mut self, id: NodeId) -> String
    {
        let node = self.unit.arena.node(id);
        match node.kind.clone() {
            NodeKind::Symbol { name, global } => {
                // written uniforms read through their local copy
                if let Some(g) = global {
                    let g = &self.unit.globals[g as usize];
                    if g.mutable && g.is_uniform() {
                        return self.prefix.temp(&name);
                    }
                }
                name
            }
            NodeKind::Constant(c) => match c {
                Const::Bool(b) => b.to_string(),
                Const::Int(i) => i.to_string(),
                Const::Float(f) => fmt_float(f)
            },
            NodeKind::Unary { op, operand } => self.emit_unary(id, op, operand),
            NodeKind::Binary { op, left, right } => {
                let l = self.emit_expr(left);
                let r = self.emit_expr(right);
                match op {
                    BinaryOp::Index => format!("{}[{}]", l, r),
                    BinaryOp::Mod
                        if self.unit.arena.node(left).ty.basic == Basic::Float =>
                    {
                        format!("mod( {}, {})", l, r)
                    }
                    BinaryOp::Mul
                        if self.unit.arena.node(left).ty.is_matrix()
                            && self.unit.arena.node(right).ty.is_matrix() =>
                    {
                        format!("matrixCompMult( {}, {})", l, r)
                    }
                    _ if op.is_assignment() => format!("{} {} {}", l, op.glsl(), r),
                    _ => format!("({} {} {})", l, op.glsl(), r)
                }
            }
            NodeKind::Selection {
                cond,
                then_block,
                else_block
            } => {
                let c = self.emit_expr(cond);
                let t = then_block.map(|id| self.emit_expr(id)).unwrap_or_default();
                let e = else_block.map(|id| self.emit_expr(id)).unwrap_or_default();
                format!("(({}) ? ({}) : ({}))", c, t, e)
            }
            NodeKind::Aggregate { op, name, children } => match op {
                AggOp::Constructor => {
                    let ty = node.ty.clone();
                    let args: Vec<String> = children.iter().map(|c| self.emit_expr(*c)).collect();
                    let tname = self.ty_name(&ty);
                    format!("{}( {})", tname, args.join(", "))
                }
                AggOp::FunctionCall => self.emit_call(&name, &children),
                AggOp::CommaList | AggOp::InitializerList => {
                    let args: Vec<String> = children.iter().map(|c| self.emit_expr(*c)).collect();
                    args.join(", ")
                }
                _ => String::new()
            },
            NodeKind::Branch { .. } | NodeKind::Loop { .. } => String::new()
        }
    }

    fn emit_unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) -> String
    {
        let inner = self.emit_expr(operand);
        match op {
            UnaryOp::Negative => format!("(-{})", inner),
            UnaryOp::LogicalNot => format!("(!{})", inner),
            UnaryOp::BitNot => format!("(~{})", inner),
            UnaryOp::PreIncrement => format!("(++{})", inner),
            UnaryOp::PreDecrement => format!("(--{})", inner),
            UnaryOp::PostIncrement => format!("({}++)", inner),
            UnaryOp::PostDecrement => format!("({}--)", inner),
            UnaryOp::Field(field) => format!("{}.{}", inner, field),
            UnaryOp::Cast => {
                let target = self.unit.arena.node(id).ty.clone();
                let source = self.unit.arena.node(operand).ty.clone();
                if target.is_matrix() && source.is_matrix() && target.rows < source.rows {
                    if let Some(helper) = self.support.matrix_construct_helper(target.rows, &source)
                    {
                        self.need_helper(helper);
                        return format!("{}( {})", self.prefix.helper(helper.name()), inner);
                    }
                }
                let tname = self.ty_name(&target);
                format!("{}( {})", tname, inner)
            }
        }
    }

    fn emit_call(&mut self, mangled: &str, args: &[NodeId]) -> String
    {
        let base = mangled.split('(').next().unwrap_or(mangled);
        let rendered: Vec<String> = args.iter().map(|a| self.emit_expr(*a)).collect();
        if self.unit.find_function(mangled).is_some() || !INTRINSIC_NAMES.contains(base) {
            if !self.called.iter().any(|c| c == mangled) {
                self.called.push(mangled.to_string());
            }
            return format!("{}( {})", base, rendered.join(", "));
        }
        match base {
            "mul" => format!("({} * {})", rendered[0], rendered[1]),
            "saturate" => format!("clamp( {}, 0.0, 1.0)", rendered[0]),
            "shadow2D" => {
                self.need_helper(HelperId::Shadow2D);
                format!("{}( {})", self.prefix.helper("shadow2D"), rendered.join(", "))
            }
            "shadow2Dproj" => {
                self.need_helper(HelperId::Shadow2DProj);
                format!("{}( {})", self.prefix.helper("shadow2Dproj"), rendered.join(", "))
            }
            "tex1D" | "tex2D" | "tex2Dproj" | "tex3D" | "texCUBE" => {
                let sampler = args
                    .first()
                    .map(|a| self.unit.arena.node(*a).ty.basic)
                    .unwrap_or(Basic::Sampler2D);
                let proj = base.ends_with("proj");
                let name = self.support.texture_fn(sampler, proj);
                format!("{}( {})", name, rendered.join(", "))
            }
            other => format!("{}( {})", rename_intrinsic(other), rendered.join(", "))
        }
    }
}
