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

use std::collections::HashMap;

use log::debug;
use phf::phf_map;

use crate::ast::types::Basic;
use crate::ast::{NodeId, NodeKind, Unit};
use crate::diag::InfoSink;
use crate::location::SourceLoc;
use crate::transform::walk_calls;

/// Texture type each intrinsic imposes on its sampler argument.
static SAMPLER_CONSTRAINTS: phf::Map<&'static str, Basic> = phf_map! {
    "tex1D" => Basic::Sampler1D,
    "tex2D" => Basic::Sampler2D,
    "tex2Dproj" => Basic::Sampler2D,
    "tex3D" => Basic::Sampler3D,
    "texCUBE" => Basic::SamplerCube,
    "shadow2D" => Basic::Sampler2DShadow,
    "shadow2Dproj" => Basic::Sampler2DShadow
};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum SamplerSlot
{
    Global(u32),
    Param(usize, usize)
}

struct CallSite
{
    function: usize,
    callee: String,
    args: Vec<NodeId>,
    loc: SourceLoc
}

fn sampler_slot(unit: &Unit, function: usize, arg: NodeId) -> Option<SamplerSlot>
{
    match &unit.arena.node(arg).kind {
        NodeKind::Symbol { global: Some(g), .. } => Some(SamplerSlot::Global(*g)),
        NodeKind::Symbol { name, global: None } => unit.functions[function]
            .params
            .iter()
            .position(|p| &p.name == name)
            .map(|i| SamplerSlot::Param(function, i)),
        _ => None
    }
}

fn slot_basic(unit: &Unit, slot: SamplerSlot) -> Basic
{
    match slot {
        SamplerSlot::Global(g) => unit.globals[g as usize].ty.basic,
        SamplerSlot::Param(f, p) => unit.functions[f].params[p].ty.basic
    }
}

fn set_slot_basic(unit: &mut Unit, slot: SamplerSlot, basic: Basic)
{
    match slot {
        SamplerSlot::Global(g) => unit.globals[g as usize].ty.basic = basic,
        SamplerSlot::Param(f, p) => unit.functions[f].params[p].ty.basic = basic
    }
}

/// Infers concrete sampler types for symbols declared with the generic
/// `sampler` keyword from the intrinsics they flow into, iterating across
/// function boundaries until nothing changes. Conflicting constraints on one
/// symbol are diagnosed; anything still generic afterwards defaults to 2D.
pub fn propagate_sampler_types(unit: &mut Unit, sink: &mut InfoSink)
{
    let mut calls: Vec<CallSite> = Vec::new();
    for (idx, f) in unit.functions.iter().enumerate() {
        if let Some(body) = f.body {
            walk_calls(unit, body, &mut |name, args, loc| {
                calls.push(CallSite {
                    function: idx,
                    callee: name.to_string(),
                    args: args.to_vec(),
                    loc: loc.clone()
                });
            });
        }
    }

    let mut constrained: HashMap<SamplerSlot, Basic> = HashMap::new();
    loop {
        let mut changed = false;
        for call in &calls {
            let base = call.callee.split('(').next().unwrap_or("");
            // intrinsic constraint on the leading sampler argument
            if let Some(&want) = SAMPLER_CONSTRAINTS.get(base) {
                if let Some(arg) = call.args.first() {
                    if let Some(slot) = sampler_slot(unit, call.function, *arg) {
                        changed |= constrain(unit, sink, &mut constrained, slot, want, &call.loc);
                    }
                }
            }
            // a concrete parameter of a user function constrains the caller's
            // generic argument, and vice versa through later rounds
            if let Some(callee) = unit.find_function(&call.callee) {
                let param_basics: Vec<Basic> = callee.params.iter().map(|p| p.ty.basic).collect();
                for (i, arg) in call.args.iter().enumerate() {
                    let want = match param_basics.get(i) {
                        Some(b) if b.is_sampler() && *b != Basic::Sampler => *b,
                        _ => continue
                    };
                    if let Some(slot) = sampler_slot(unit, call.function, *arg) {
                        changed |= constrain(unit, sink, &mut constrained, slot, want, &call.loc);
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    // unconstrained samplers default to 2D
    for g in &mut unit.globals {
        if g.ty.basic == Basic::Sampler {
            debug!("sampler '{}' left unconstrained, defaulting to 2D", g.name);
            g.ty.basic = Basic::Sampler2D;
        }
    }
    for f in &mut unit.functions {
        for p in &mut f.params {
            if p.ty.basic == Basic::Sampler {
                p.ty.basic = Basic::Sampler2D;
            }
        }
    }
    refresh_symbol_nodes(unit);
}

fn constrain(
    unit: &mut Unit,
    sink: &mut InfoSink,
    constrained: &mut HashMap<SamplerSlot, Basic>,
    slot: SamplerSlot,
    want: Basic,
    loc: &SourceLoc
) -> bool
{
    let current = slot_basic(unit, slot);
    if !current.is_sampler() {
        return false;
    }
    if current != Basic::Sampler {
        // declared concrete, or already constrained this run
        if let Some(prev) = constrained.get(&slot) {
            if *prev != want {
                let name = slot_name(unit, slot);
                sink.error(loc, &name, "conflicting sampler types");
            }
        }
        return false;
    }
    constrained.insert(slot, want);
    set_slot_basic(unit, slot, want);
    true
}

fn slot_name(unit: &Unit, slot: SamplerSlot) -> String
{
    match slot {
        SamplerSlot::Global(g) => unit.globals[g as usize].name.clone(),
        SamplerSlot::Param(f, p) => unit.functions[f].params[p].name.clone()
    }
}

/// Re-stamps sampler symbol nodes with the types settled above so code
/// generation sees the concrete type at every use site.
fn refresh_symbol_nodes(unit: &mut Unit)
{
    let globals: Vec<Basic> = unit.globals.iter().map(|g| g.ty.basic).collect();
    let functions: Vec<(Option<NodeId>, Vec<(String, Basic)>)> = unit
        .functions
        .iter()
        .map(|f| {
            (
                f.body,
                f.params
                    .iter()
                    .map(|p| (p.name.clone(), p.ty.basic))
                    .collect()
            )
        })
        .collect();
    for i in 0..unit.arena.len() {
        let id = NodeId(i as u32);
        let global = match &unit.arena.node(id).kind {
            NodeKind::Symbol { global: Some(g), .. } => *g,
            _ => continue
        };
        if unit.arena.node(id).ty.basic.is_sampler() {
            unit.arena.node_mut(id).ty.basic = globals[global as usize];
        }
    }
    // parameter symbols are matched by name within their function body
    for (body, params) in functions {
        let body = match body {
            Some(v) => v,
            None => continue
        };
        refresh_params(unit, body, &params);
    }
}

fn refresh_params(unit: &mut Unit, id: NodeId, params: &[(String, Basic)])
{
    let children: Vec<NodeId> = match unit.arena.node(id).kind.clone() {
        NodeKind::Symbol { name, global: None } => {
            if let Some((_, basic)) = params.iter().find(|(n, _)| *n == name) {
                if unit.arena.node(id).ty.basic.is_sampler() {
                    unit.arena.node_mut(id).ty.basic = *basic;
                }
            }
            return;
        }
        NodeKind::Symbol { .. } | NodeKind::Constant(_) => return,
        NodeKind::Unary { operand, .. } => vec![operand],
        NodeKind::Binary { left, right, .. } => vec![left, right],
        NodeKind::Selection {
            cond,
            then_block,
            else_block
        } => {
            let mut v = vec![cond];
            v.extend(then_block);
            v.extend(else_block);
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
            v.extend(init);
            v.extend(cond);
            v.extend(step);
            v.push(body);
            v
        }
        NodeKind::Branch { value, .. } => value.into_iter().collect(),
        NodeKind::Aggregate { children, .. } => children
    };
    for child in children {
        refresh_params(unit, child, params);
    }
}
