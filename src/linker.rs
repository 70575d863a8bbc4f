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
use std::fmt::Write;

use log::debug;

use crate::ast::types::Qualifier;
use crate::codegen::{precision_prefix, type_name, CodegenOutput, GlslFunction, UniformInfo};
use crate::config::{AttribSemantic, PrefixTable, Stage, TargetVersion};
use crate::diag::{InfoSink, Prefix};
use crate::support::{HelperId, SupportLib};

/// Where one entry-point output lands in the stage interface.
enum OutputSlot
{
    Position,
    Varying(String),
    FragData(u32),
    FragDepth
}

impl OutputSlot
{
    fn text(&self) -> String
    {
        match self {
            OutputSlot::Position => "gl_Position".into(),
            OutputSlot::Varying(name) => name.clone(),
            OutputSlot::FragData(n) => format!("gl_FragData[{}]", n),
            OutputSlot::FragDepth => "gl_FragDepth".into()
        }
    }
}

fn color_semantic_index(semantic: &str) -> Option<u32>
{
    let upper = semantic.to_ascii_uppercase();
    if let Some(rest) = upper.strip_prefix("COLOR") {
        if rest.is_empty() {
            return Some(0);
        }
        return rest.parse().ok();
    }
    None
}

/// Combines the codegen records into the final GLSL text: helpers, globals,
/// user functions, the renamed entry and a synthesized `main` that moves
/// data between the stage interface and the entry's parameters.
pub struct Linker
{
    prefix: PrefixTable,
    attrib_names: HashMap<AttribSemantic, String>,
    shader_text: String,
    uniforms: Vec<UniformInfo>
}

impl Linker
{
    pub fn new(prefix: PrefixTable) -> Linker
    {
        Linker {
            prefix,
            attrib_names: HashMap::new(),
            shader_text: String::new(),
            uniforms: Vec::new()
        }
    }

    /// Overrides the synthesized attribute name for one input semantic.
    /// Fails on a name already claimed by a different semantic, leaving
    /// earlier registrations intact.
    pub fn set_user_attrib_name(&mut self, semantic: AttribSemantic, name: &str) -> bool
    {
        let clash = self
            .attrib_names
            .iter()
            .any(|(sem, n)| *sem != semantic && n == name);
        if clash {
            return false;
        }
        self.attrib_names.insert(semantic, name.into());
        true
    }

    pub fn shader_text(&self) -> &str
    {
        &self.shader_text
    }

    pub fn uniforms(&self) -> &[UniformInfo]
    {
        &self.uniforms
    }

    pub fn link(
        &mut self,
        out: &CodegenOutput,
        entry: &str,
        stage: Stage,
        version: TargetVersion,
        sink: &mut InfoSink
    ) -> bool
    {
        let support = SupportLib::new(version);
        if out.version != version {
            debug!(
                "translating against {:?} but code was generated for {:?}",
                version, out.version
            );
        }
        let candidates: Vec<&GlslFunction> =
            out.functions.iter().filter(|f| f.name == entry).collect();
        let entry_fn = match candidates.len() {
            0 => {
                sink.message(Prefix::Error, &format!("Failed to find entry function: '{}'", entry));
                return false;
            }
            1 => candidates[0],
            _ => {
                sink.message(Prefix::Error, &format!("Entry function '{}' is ambiguous.", entry));
                return false;
            }
        };

        // depth-first over the call graph; callees come out first, the
        // entry itself last
        let mut order: Vec<&GlslFunction> = Vec::new();
        let mut visited: Vec<String> = Vec::new();
        if !self.collect_functions(out, entry_fn, &mut order, &mut visited, sink) {
            return false;
        }

        let mut helpers: Vec<HelperId> = Vec::new();
        for f in &order {
            for id in &f.support {
                if !helpers.contains(id) {
                    helpers.push(*id);
                }
            }
        }
        let mut extensions: Vec<&'static str> = Vec::new();
        for id in &helpers {
            if let Some(ext) = support.extension(*id) {
                if !extensions.contains(&ext) {
                    extensions.push(ext);
                }
            }
        }

        let mut text = String::new();
        for ext in extensions {
            let _ = writeln!(text, "#extension {} : require", ext);
        }
        for id in &helpers {
            if let Some(snippet) = support.snippet(*id, &self.prefix) {
                text.push_str(&snippet);
            }
        }

        self.emit_globals(out, version, &mut text);
        self.emit_structs(out, &order, version, &mut text);

        for f in &order {
            let is_entry = std::ptr::eq(*f, entry_fn);
            let _ = writeln!(text, "#line {}", f.line);
            if f.extra_line_directive {
                let _ = writeln!(text, "#line {}", f.line);
            }
            let fname = if is_entry {
                self.prefix.entry(entry)
            } else {
                f.name.clone()
            };
            let params: Vec<String> = f
                .params
                .iter()
                .map(|p| {
                    let qual = match p.ty.qualifier {
                        Qualifier::Out => "out",
                        Qualifier::InOut => "inout",
                        _ => "in"
                    };
                    let arr = if p.ty.array_size > 0 {
                        format!("[{}]", p.ty.array_size)
                    } else {
                        String::new()
                    };
                    format!(
                        "{} {}{} {}{}",
                        qual,
                        precision_prefix(version, &p.ty),
                        type_name(version, &p.ty, &out.structs),
                        p.name,
                        arr
                    )
                })
                .collect();
            let signature = if params.is_empty() {
                format!(
                    "{}{} {}()",
                    precision_prefix(version, &f.ret),
                    type_name(version, &f.ret, &out.structs),
                    fname
                )
            } else {
                format!(
                    "{}{} {}( {} )",
                    precision_prefix(version, &f.ret),
                    type_name(version, &f.ret, &out.structs),
                    fname,
                    params.join(", ")
                )
            };
            let _ = writeln!(text, "{} {{", signature);
            text.push_str(&f.body);
            text.push_str("}\n");
        }

        if !self.emit_interface_and_main(out, entry_fn, entry, stage, version, &mut text, sink) {
            return false;
        }

        self.uniforms = out.uniforms.clone();
        self.shader_text = text;
        debug!("linked entry '{}' for {:?} / {:?}", entry, stage, version);
        true
    }

    fn collect_functions<'a>(
        &self,
        out: &'a CodegenOutput,
        f: &'a GlslFunction,
        order: &mut Vec<&'a GlslFunction>,
        visited: &mut Vec<String>,
        sink: &mut InfoSink
    ) -> bool
    {
        if visited.iter().any(|v| v == &f.mangled) {
            return true;
        }
        visited.push(f.mangled.clone());
        for callee in &f.called {
            match out.functions.iter().find(|g| &g.mangled == callee) {
                Some(g) => {
                    if !self.collect_functions(out, g, order, visited, sink) {
                        return false;
                    }
                }
                None => {
                    let base = callee.split('(').next().unwrap_or(callee);
                    sink.message(Prefix::Error, &format!("Failed to find function: '{}'", base));
                    return false;
                }
            }
        }
        order.push(f);
        true
    }

    fn emit_globals(&self, out: &CodegenOutput, version: TargetVersion, text: &mut String)
    {
        let mut first = true;
        for g in &out.globals {
            if !first {
                let _ = writeln!(text, "#line {}", g.line);
            }
            first = false;
            let prec = precision_prefix(version, &g.ty);
            let tname = type_name(version, &g.ty, &out.structs);
            let arr = if g.ty.array_size > 0 {
                format!("[{}]", g.ty.array_size)
            } else {
                String::new()
            };
            if g.ty.qualifier == Qualifier::Uniform {
                let _ = writeln!(text, "uniform {}{} {}{};", prec, tname, g.name, arr);
                if g.mutable {
                    // the writable copy every use site reads and writes; it
                    // picks up the uniform's value in the main prologue
                    let _ = writeln!(text, "{}{} {}{};", prec, tname, self.prefix.temp(&g.name), arr);
                }
            } else {
                match &g.init_text {
                    Some(init) => {
                        let _ = writeln!(text, "{}{} {}{} = {};", prec, tname, g.name, arr, init);
                    }
                    None => {
                        let _ = writeln!(text, "{}{} {}{};", prec, tname, g.name, arr);
                    }
                }
            }
        }
    }

    fn emit_structs(
        &self,
        out: &CodegenOutput,
        order: &[&GlslFunction],
        version: TargetVersion,
        text: &mut String
    )
    {
        // reachable set: named by any emitted function or any global, then
        // closed over field types, emitted in declaration order
        let mut used: Vec<u32> = Vec::new();
        for f in order {
            for id in &f.structs_used {
                if !used.contains(id) {
                    used.push(*id);
                }
            }
        }
        for g in &out.globals {
            if let Some(id) = g.ty.struct_ref {
                if !used.contains(&id) {
                    used.push(id);
                }
            }
        }
        let mut i = 0;
        while i < used.len() {
            if let Some(s) = out.structs.get(used[i] as usize) {
                for field in &s.fields {
                    if let Some(id) = field.ty.struct_ref {
                        if !used.contains(&id) {
                            used.push(id);
                        }
                    }
                }
            }
            i += 1;
        }
        used.sort_unstable();
        for id in used {
            let s = match out.structs.get(id as usize) {
                Some(v) => v,
                None => continue
            };
            let _ = writeln!(text, "#line {}", s.loc.line);
            let _ = writeln!(text, "struct {} {{", s.name);
            for field in &s.fields {
                let arr = if field.ty.array_size > 0 {
                    format!("[{}]", field.ty.array_size)
                } else {
                    String::new()
                };
                let _ = writeln!(
                    text,
                    "    {}{} {}{};",
                    precision_prefix(version, &field.ty),
                    type_name(version, &field.ty, &out.structs),
                    field.name,
                    arr
                );
            }
            text.push_str("};\n");
        }
    }

    fn input_global_name(&self, stage: Stage, semantic: &str) -> String
    {
        match stage {
            Stage::Vertex => match AttribSemantic::from_name(semantic)
                .and_then(|sem| self.attrib_names.get(&sem))
            {
                Some(name) => name.clone(),
                None => self.prefix.attrib(semantic)
            },
            Stage::Fragment => self.prefix.varying(semantic)
        }
    }

    fn output_slot(
        &self,
        stage: Stage,
        semantic: &str,
        sink: &mut InfoSink
    ) -> Option<OutputSlot>
    {
        match stage {
            Stage::Vertex => {
                if semantic.eq_ignore_ascii_case("POSITION") {
                    Some(OutputSlot::Position)
                } else {
                    Some(OutputSlot::Varying(self.prefix.varying(semantic)))
                }
            }
            Stage::Fragment => {
                if semantic.eq_ignore_ascii_case("DEPTH") {
                    Some(OutputSlot::FragDepth)
                } else if let Some(n) = color_semantic_index(semantic) {
                    Some(OutputSlot::FragData(n))
                } else {
                    sink.message(
                        Prefix::Error,
                        &format!("Unsupported fragment output semantic: '{}'", semantic)
                    );
                    None
                }
            }
        }
    }

    fn emit_interface_and_main(
        &self,
        out: &CodegenOutput,
        entry_fn: &GlslFunction,
        entry: &str,
        stage: Stage,
        version: TargetVersion,
        text: &mut String,
        sink: &mut InfoSink
    ) -> bool
    {
        let legacy = version.is_legacy();
        let in_qual = match (stage, legacy) {
            (Stage::Vertex, true) => "attribute",
            (Stage::Vertex, false) => "in",
            (Stage::Fragment, true) => "varying",
            (Stage::Fragment, false) => "in"
        };
        let out_qual = if legacy { "varying" } else { "out" };

        struct ParamBind
        {
            arg: String,
            write: Option<(OutputSlot, String)>
        }

        let mut input_decls = String::new();
        let mut output_decls = String::new();
        let mut locals = String::new();
        let mut binds: Vec<ParamBind> = Vec::new();
        let mut seen_outputs: Vec<String> = Vec::new();

        for p in &entry_fn.params {
            let semantic = match &p.semantic {
                Some(s) => s.clone(),
                None => {
                    sink.message(
                        Prefix::Error,
                        &format!("Entry parameter '{}' has no semantic.", p.name)
                    );
                    return false;
                }
            };
            let tname = type_name(version, &p.ty, &out.structs);
            let prec = precision_prefix(version, &p.ty);
            match p.ty.qualifier {
                Qualifier::Out | Qualifier::InOut => {
                    if seen_outputs.contains(&semantic) {
                        sink.message(
                            Prefix::Error,
                            &format!("Output semantic '{}' is bound more than once.", semantic)
                        );
                        return false;
                    }
                    seen_outputs.push(semantic.clone());
                    let slot = match self.output_slot(stage, &semantic, sink) {
                        Some(v) => v,
                        None => return false
                    };
                    if let OutputSlot::Varying(name) = &slot {
                        let _ = writeln!(output_decls, "{} {}{} {};", out_qual, prec, tname, name);
                    }
                    let temp = self.prefix.temp(&p.name);
                    if p.ty.qualifier == Qualifier::InOut {
                        let src = self.input_global_name(stage, &semantic);
                        let _ = writeln!(input_decls, "{} {}{} {};", in_qual, prec, tname, src);
                        let _ = writeln!(locals, "    {}{} {} = {}({});", prec, tname, temp, tname, src);
                    } else {
                        let _ = writeln!(locals, "    {}{} {};", prec, tname, temp);
                    }
                    binds.push(ParamBind {
                        arg: temp.clone(),
                        write: Some((slot, temp))
                    });
                }
                _ => {
                    let src = self.input_global_name(stage, &semantic);
                    let _ = writeln!(input_decls, "{} {}{} {};", in_qual, prec, tname, src);
                    binds.push(ParamBind {
                        arg: format!("{}({})", tname, src),
                        write: None
                    });
                }
            }
        }

        // the return-value local precedes the per-parameter temporaries
        let param_locals = std::mem::take(&mut locals);
        let has_ret = entry_fn.ret.basic != crate::ast::Basic::Void;
        let mut ret_write: Option<(OutputSlot, String)> = None;
        if has_ret {
            let semantic = entry_fn
                .ret_semantic
                .clone()
                .unwrap_or_else(|| match stage {
                    Stage::Vertex => "POSITION".into(),
                    Stage::Fragment => "COLOR0".into()
                });
            let slot = match self.output_slot(stage, &semantic, sink) {
                Some(v) => v,
                None => return false
            };
            let tname = type_name(version, &entry_fn.ret, &out.structs);
            let prec = precision_prefix(version, &entry_fn.ret);
            if let OutputSlot::Varying(name) = &slot {
                let _ = writeln!(output_decls, "{} {}{} {};", out_qual, prec, tname, name);
            }
            let retval = self.prefix.retval();
            let _ = writeln!(locals, "    {}{} {};", prec, tname, retval);
            ret_write = Some((slot, retval));
        }
        locals.push_str(&param_locals);

        text.push_str(&input_decls);
        text.push_str(&output_decls);
        text.push_str("void main() {\n");
        text.push_str(&locals);
        for g in &out.globals {
            if g.mutable && g.ty.qualifier == Qualifier::Uniform {
                let _ = writeln!(text, "    {} = {};", self.prefix.temp(&g.name), g.name);
            }
            for stmt in &g.deferred {
                let _ = writeln!(text, "    {}", stmt);
            }
        }
        let args: Vec<String> = binds.iter().map(|b| b.arg.clone()).collect();
        let call = if args.is_empty() {
            format!("{}()", self.prefix.entry(entry))
        } else {
            format!("{}( {})", self.prefix.entry(entry), args.join(", "))
        };
        match &ret_write {
            Some((_, retval)) => {
                let _ = writeln!(text, "    {} = {};", retval, call);
            }
            None => {
                let _ = writeln!(text, "    {};", call);
            }
        }
        for (bind, p) in binds.iter().zip(&entry_fn.params) {
            if let Some((slot, temp)) = &bind.write {
                let tname = type_name(version, &p.ty, &out.structs);
                let _ = writeln!(text, "    {} = {}({});", slot.text(), tname, temp);
            }
        }
        if let Some((slot, retval)) = &ret_write {
            let tname = type_name(version, &entry_fn.ret, &out.structs);
            let _ = writeln!(text, "    {} = {}({});", slot.text(), tname, retval);
        }
        text.push_str("}\n");
        true
    }
}
