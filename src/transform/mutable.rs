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

use log::debug;

use crate::ast::types::Qualifier;
use crate::ast::{BinaryOp, NodeId, NodeKind, UnaryOp, Unit};
use crate::transform::walk_calls;

/// Follows member and index chains down to the written symbol.
fn lvalue_root(unit: &Unit, id: NodeId) -> Option<NodeId>
{
    match &unit.arena.node(id).kind {
        NodeKind::Symbol { .. } => Some(id),
        NodeKind::Unary {
            op: UnaryOp::Field(_),
            operand
        } => lvalue_root(unit, *operand),
        NodeKind::Binary {
            op: BinaryOp::Index,
            left,
            ..
        } => lvalue_root(unit, *left),
        _ => None
    }
}

fn mark_write(unit: &mut Unit, function: usize, target: NodeId, changed: &mut bool)
{
    let root = match lvalue_root(unit, target) {
        Some(v) => v,
        None => return
    };
    match unit.arena.node(root).kind.clone() {
        NodeKind::Symbol { global: Some(g), .. } => {
            let global = &mut unit.globals[g as usize];
            if global.is_uniform() && !global.mutable {
                debug!("uniform '{}' is written, lifting to a local copy", global.name);
                global.mutable = true;
                *changed = true;
            }
        }
        NodeKind::Symbol { name, global: None } => {
            if let Some(p) = unit.functions[function]
                .params
                .iter()
                .position(|p| p.name == name)
            {
                if !unit.functions[function].params[p].written {
                    unit.functions[function].params[p].written = true;
                    *changed = true;
                }
            }
        }
        _ => ()
    }
}

fn collect_writes(unit: &Unit, id: NodeId, out: &mut Vec<NodeId>)
{
    let node = unit.arena.node(id);
    let children: Vec<NodeId> = match &node.kind {
        NodeKind::Symbol { .. } | NodeKind::Constant(_) => return,
        NodeKind::Unary { op, operand } => {
            if matches!(
                op,
                UnaryOp::PreIncrement
                    | UnaryOp::PreDecrement
                    | UnaryOp::PostIncrement
                    | UnaryOp::PostDecrement
            ) {
                out.push(*operand);
            }
            vec![*operand]
        }
        NodeKind::Binary { op, left, right } => {
            if op.is_assignment() {
                out.push(*left);
            }
            vec![*left, *right]
        }
        NodeKind::Selection {
            cond,
            then_block,
            else_block
        } => {
            let mut v = vec![*cond];
            v.extend(then_block.iter().copied());
            v.extend(else_block.iter().copied());
            v
        }
        NodeKind::Loop {
            init,
            cond,
            step,
            body,
            ..
        } => {
            let mut v = Vec::new();
            v.extend(init.iter().copied());
            v.extend(cond.iter().copied());
            v.extend(step.iter().copied());
            v.push(*body);
            v
        }
        NodeKind::Branch { value, .. } => value.iter().copied().collect(),
        NodeKind::Aggregate { children, .. } => children.clone()
    };
    for child in children {
        collect_writes(unit, child, out);
    }
}

/// Marks every uniform that any reachable code writes: direct assignment
/// targets, and uniforms handed to `out`/`inout` parameters. Runs a workset
/// loop so writes discovered through parameters feed back into call sites.
/// The output language forbids assigning to uniforms, so the linker lifts
/// marked uniforms to local copies.
pub fn propagate_mutable_uniforms(unit: &mut Unit)
{
    loop {
        let mut changed = false;
        for idx in 0..unit.functions.len() {
            let body = match unit.functions[idx].body {
                Some(v) => v,
                None => continue
            };
            let mut writes = Vec::new();
            collect_writes(unit, body, &mut writes);
            for target in writes {
                mark_write(unit, idx, target, &mut changed);
            }
            let mut calls: Vec<(String, Vec<NodeId>)> = Vec::new();
            walk_calls(unit, body, &mut |name, args, _| {
                calls.push((name.to_string(), args.to_vec()));
            });
            for (callee, args) in calls {
                let param_info: Vec<(Qualifier, bool)> = match unit.find_function(&callee) {
                    Some(f) => f.params.iter().map(|p| (p.ty.qualifier, p.written)).collect(),
                    None => continue
                };
                for (i, arg) in args.iter().enumerate() {
                    let (qualifier, written) = match param_info.get(i) {
                        Some(v) => *v,
                        None => continue
                    };
                    if qualifier == Qualifier::Out || qualifier == Qualifier::InOut || written {
                        mark_write(unit, idx, *arg, &mut changed);
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }
}
