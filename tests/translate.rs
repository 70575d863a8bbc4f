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

use bp3d_hlslang::{initialize, AttribSemantic, Compiler, PrefixTable, Stage, TargetVersion};

const VERTEX_SHADER_SRC: &str = r#"
float4x4 matrix_mvp;
float4x4 matrix_normal;

void main (float4 vertex : POSITION, out float4 overtex : POSITION, float3 normal : NORMAL, out float3 onormal : TEXCOORD0)
{
    overtex = mul (matrix_mvp, vertex);
    onormal = mul ((float3x3)matrix_normal, normal);
}
"#;

const FRAGMENT_SHADER_SRC: &str = "
sampler2DShadow shadowmap;

fixed4 main (float4 uv : TEXCOORD0) : COLOR0
{
\tfloat s1 = shadow2D (shadowmap, uv.xyz);
\tfloat s2 = shadow2Dproj (shadowmap, uv);

\ts1 = tex2D (shadowmap, uv.xyz);
\ts2 = tex2Dproj (shadowmap, uv);

\treturn s1 + s2;
}
";

fn trim_str(text: &str) -> &str
{
    text.trim_matches(|c| c == ' ' || c == '\n' || c == '\r' || c == '\t')
}

/// Mirrors the test driver: shader text plus a comment block rendered from
/// the uniform reflection table.
fn compiled_shader_text(compiler: &Compiler) -> String
{
    let mut text = compiler.shader().to_string();
    if compiler.uniform_count() > 0 {
        text.push_str("\n// uniforms:\n");
        for u in compiler.uniforms() {
            text.push_str(&format!(
                "// {}:{} type {} arrsize {}",
                u.name,
                u.semantic.as_deref().unwrap_or("<none>"),
                u.type_code,
                u.array_size
            ));
            if let Some(register_spec) = &u.register_spec {
                text.push_str(" register ");
                text.push_str(register_spec);
            }
            text.push('\n');
        }
    }
    text
}

fn compile_shader(stage: Stage, version: TargetVersion, source: &str) -> (bool, String)
{
    assert!(initialize());
    let mut compiler = Compiler::new(stage);
    if !compiler.parse(Some(source), version, 0) {
        return (false, compiler.info_log());
    }
    if !compiler.translate("main", version, 0) {
        return (false, compiler.info_log());
    }
    (true, compiled_shader_text(&compiler))
}

fn assert_compiles_to(stage: Stage, version: TargetVersion, source: &str, expected: &str)
{
    let (success, output) = compile_shader(stage, version, source);
    assert!(success, "failed to compile shader: {}", output);
    assert_eq!(trim_str(expected), trim_str(&output), "full output:\n{}", output);
}

#[test]
fn vertex_shader_es2()
{
    assert_compiles_to(
        Stage::Vertex,
        TargetVersion::GlslEs100,
        VERTEX_SHADER_SRC,
        r#"
mat3 xll_constructMat3_mf4x4( mat4 m) {
  return mat3( vec3( m[0]), vec3( m[1]), vec3( m[2]));
}
uniform highp mat4 matrix_mvp;
#line 3
uniform highp mat4 matrix_normal;
#line 5
void xlat_main( in highp vec4 vertex, out highp vec4 overtex, in highp vec3 normal, out highp vec3 onormal ) {
    #line 7
    overtex = (matrix_mvp * vertex);
    onormal = (xll_constructMat3_mf4x4( matrix_normal) * normal);
}
attribute highp vec4 xlat_attrib_POSITION;
attribute highp vec3 xlat_attrib_NORMAL;
varying highp vec3 xlv_TEXCOORD0;
void main() {
    highp vec4 xlt_overtex;
    highp vec3 xlt_onormal;
    xlat_main( vec4(xlat_attrib_POSITION), xlt_overtex, vec3(xlat_attrib_NORMAL), xlt_onormal);
    gl_Position = vec4(xlt_overtex);
    xlv_TEXCOORD0 = vec3(xlt_onormal);
}

// uniforms:
// matrix_mvp:<none> type 21 arrsize 0
// matrix_normal:<none> type 21 arrsize 0
"#
    );
}

#[test]
fn vertex_shader_es3()
{
    assert_compiles_to(
        Stage::Vertex,
        TargetVersion::GlslEs300,
        VERTEX_SHADER_SRC,
        r#"
uniform highp mat4 matrix_mvp;
#line 3
uniform highp mat4 matrix_normal;
#line 5
void xlat_main( in highp vec4 vertex, out highp vec4 overtex, in highp vec3 normal, out highp vec3 onormal ) {
    #line 7
    overtex = (matrix_mvp * vertex);
    onormal = (mat3( matrix_normal) * normal);
}
in highp vec4 xlat_attrib_POSITION;
in highp vec3 xlat_attrib_NORMAL;
out highp vec3 xlv_TEXCOORD0;
void main() {
    highp vec4 xlt_overtex;
    highp vec3 xlt_onormal;
    xlat_main( vec4(xlat_attrib_POSITION), xlt_overtex, vec3(xlat_attrib_NORMAL), xlt_onormal);
    gl_Position = vec4(xlt_overtex);
    xlv_TEXCOORD0 = vec3(xlt_onormal);
}

// uniforms:
// matrix_mvp:<none> type 21 arrsize 0
// matrix_normal:<none> type 21 arrsize 0
"#
    );
}

#[test]
fn fragment_shader_es2()
{
    assert_compiles_to(
        Stage::Fragment,
        TargetVersion::GlslEs100,
        FRAGMENT_SHADER_SRC,
        r#"
#extension GL_EXT_shadow_samplers : require
float xll_shadow2D(sampler2DShadow s, vec3 coord) { return shadow2DEXT (s, coord); }
float xll_shadow2Dproj(sampler2DShadow s, vec4 coord) { return shadow2DProjEXT (s, coord); }
uniform lowp sampler2DShadow shadowmap;
#line 4
#line 4
lowp vec4 xlat_main( in highp vec4 uv ) {
    highp float s1 = xll_shadow2D( shadowmap, uv.xyz);
    highp float s2 = xll_shadow2Dproj( shadowmap, uv);
    #line 9
    s1 = float( shadow2D( shadowmap, uv.xyz));
    s2 = float( shadow2DProj( shadowmap, uv));
    return vec4( (s1 + s2));
}
varying highp vec4 xlv_TEXCOORD0;
void main() {
    lowp vec4 xl_retval;
    xl_retval = xlat_main( vec4(xlv_TEXCOORD0));
    gl_FragData[0] = vec4(xl_retval);
}

// uniforms:
// shadowmap:<none> type 26 arrsize 0
"#
    );
}

#[test]
fn fragment_shader_es3()
{
    assert_compiles_to(
        Stage::Fragment,
        TargetVersion::GlslEs300,
        FRAGMENT_SHADER_SRC,
        r#"
float xll_shadow2D(mediump sampler2DShadow s, vec3 coord) { return texture (s, coord); }
float xll_shadow2Dproj(mediump sampler2DShadow s, vec4 coord) { return textureProj (s, coord); }
uniform lowp sampler2DShadow shadowmap;
#line 4
#line 4
lowp vec4 xlat_main( in highp vec4 uv ) {
    highp float s1 = xll_shadow2D( shadowmap, uv.xyz);
    highp float s2 = xll_shadow2Dproj( shadowmap, uv);
    #line 9
    s1 = float( texture( shadowmap, uv.xyz));
    s2 = float( textureProj( shadowmap, uv));
    return vec4( (s1 + s2));
}
in highp vec4 xlv_TEXCOORD0;
void main() {
    lowp vec4 xl_retval;
    xl_retval = xlat_main( vec4(xlv_TEXCOORD0));
    gl_FragData[0] = vec4(xl_retval);
}

// uniforms:
// shadowmap:<none> type 26 arrsize 0
"#
    );
}

#[test]
fn syntax_error_diagnostics()
{
    let source = "
#line 1 \"undefined-type-in.txt\"
#line 1 \"undefined-type-in.hlsl\"
void main(out float4 overtex : POSITION)
    {
        bloat4 b(1.f, 1.f, 1.f, 1.f);
        overtex = float4(b.x,b.y,b,z,b.w);
    }
";
    let (success, output) = compile_shader(Stage::Vertex, TargetVersion::GlslEs100, source);
    assert!(!success, "expected error");
    assert_eq!(
        trim_str(&output),
        trim_str(
            "undefined-type-in.hlsl(3): ERROR: 'bloat4' : undeclared identifier \n\
             undefined-type-in.hlsl(3): ERROR: 'b' : syntax error syntax error \n"
        )
    );
}

#[test]
fn reserved_word_diagnostics()
{
    let source = "
#line 1 \"undefined-type-in.txt\"
#line 1 \"undefined-type-in.hlsl\"
void main(out float4 asm : POSITION)
    {
        float4 b(1.f, 1.f, 1.f, 1.f);
        asm = float4(b.x,b.y,b,z,b.w);
    }
";
    let (success, output) = compile_shader(Stage::Vertex, TargetVersion::GlslEs100, source);
    assert!(!success, "expected error");
    assert_eq!(
        trim_str(&output),
        trim_str(
            "undefined-type-in.hlsl(1): ERROR: 'asm' : Reserved word. \n\
             undefined-type-in.hlsl(1): ERROR: 'asm' : syntax error syntax error \n"
        )
    );
}

/// Empty configured prefix plus caller-supplied attribute names, the way
/// engine integrations drive the translator.
#[test]
fn vertex_shader_es2_empty_prefix_user_attribs()
{
    assert!(initialize());
    let mut compiler = Compiler::with_prefix(Stage::Vertex, PrefixTable::new(""));
    assert!(compiler.set_user_attribute_names(
        &[AttribSemantic::Position, AttribSemantic::Normal],
        &["a_position", "a_normal"]
    ));
    assert!(compiler.parse(Some(VERTEX_SHADER_SRC), TargetVersion::GlslEs100, 0));
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0));
    let expected = r#"
mat3 l_constructMat3_mf4x4( mat4 m) {
  return mat3( vec3( m[0]), vec3( m[1]), vec3( m[2]));
}
uniform highp mat4 matrix_mvp;
#line 3
uniform highp mat4 matrix_normal;
#line 5
void at_main( in highp vec4 vertex, out highp vec4 overtex, in highp vec3 normal, out highp vec3 onormal ) {
    #line 7
    overtex = (matrix_mvp * vertex);
    onormal = (l_constructMat3_mf4x4( matrix_normal) * normal);
}
attribute highp vec4 a_position;
attribute highp vec3 a_normal;
varying highp vec3 v_TEXCOORD0;
void main() {
    highp vec4 t_overtex;
    highp vec3 t_onormal;
    at_main( vec4(a_position), t_overtex, vec3(a_normal), t_onormal);
    gl_Position = vec4(t_overtex);
    v_TEXCOORD0 = vec3(t_onormal);
}

// uniforms:
// matrix_mvp:<none> type 21 arrsize 0
// matrix_normal:<none> type 21 arrsize 0
"#;
    assert_eq!(trim_str(expected), trim_str(&compiled_shader_text(&compiler)));
}

#[test]
fn fragment_shader_es2_empty_prefix()
{
    assert!(initialize());
    let mut compiler = Compiler::with_prefix(Stage::Fragment, PrefixTable::new(""));
    assert!(compiler.parse(Some(FRAGMENT_SHADER_SRC), TargetVersion::GlslEs100, 0));
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0));
    let expected = r#"
#extension GL_EXT_shadow_samplers : require
float l_shadow2D(sampler2DShadow s, vec3 coord) { return shadow2DEXT (s, coord); }
float l_shadow2Dproj(sampler2DShadow s, vec4 coord) { return shadow2DProjEXT (s, coord); }
uniform lowp sampler2DShadow shadowmap;
#line 4
#line 4
lowp vec4 at_main( in highp vec4 uv ) {
    highp float s1 = l_shadow2D( shadowmap, uv.xyz);
    highp float s2 = l_shadow2Dproj( shadowmap, uv);
    #line 9
    s1 = float( shadow2D( shadowmap, uv.xyz));
    s2 = float( shadow2DProj( shadowmap, uv));
    return vec4( (s1 + s2));
}
varying highp vec4 v_TEXCOORD0;
void main() {
    lowp vec4 _retval;
    _retval = at_main( vec4(v_TEXCOORD0));
    gl_FragData[0] = vec4(_retval);
}

// uniforms:
// shadowmap:<none> type 26 arrsize 0
"#;
    assert_eq!(trim_str(expected), trim_str(&compiled_shader_text(&compiler)));
}

#[test]
fn desktop_targets_have_no_precision_qualifiers()
{
    for version in [TargetVersion::Glsl110, TargetVersion::Glsl120, TargetVersion::Glsl140] {
        let (success, output) = compile_shader(Stage::Vertex, version, VERTEX_SHADER_SRC);
        assert!(success, "{}", output);
        assert!(!output.contains("highp"));
        assert!(!output.contains("mediump"));
        assert!(!output.contains("lowp"));
        assert!(output.contains("uniform mat4 matrix_mvp;"));
    }
}

#[test]
fn desktop_140_uses_in_out_and_mat3_constructor()
{
    let (success, output) = compile_shader(Stage::Vertex, TargetVersion::Glsl140, VERTEX_SHADER_SRC);
    assert!(success, "{}", output);
    assert!(output.contains("in vec4 xlat_attrib_POSITION;"));
    assert!(output.contains("out vec3 xlv_TEXCOORD0;"));
    assert!(output.contains("(mat3( matrix_normal) * normal)"));
    assert!(!output.contains("xll_constructMat3"));
}

#[test]
fn uniform_semantics_and_registers_are_reflected()
{
    assert!(initialize());
    let source = "
float4x4 matrix_mvp : WORLDVIEWPROJECTION;
float4 tint : register(c12);
void main (float4 vertex : POSITION, out float4 overtex : POSITION)
{
    overtex = mul (matrix_mvp, vertex) * tint;
}
";
    let mut compiler = Compiler::new(Stage::Vertex);
    assert!(compiler.parse(Some(source), TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    let uniforms = compiler.uniforms();
    assert_eq!(uniforms.len(), 2);
    assert_eq!(uniforms[0].semantic.as_deref(), Some("WORLDVIEWPROJECTION"));
    assert_eq!(uniforms[1].register_spec.as_deref(), Some("c12"));
    assert_eq!(uniforms[1].type_code, 12);
}

#[test]
fn mutable_uniform_is_lifted_to_local_copy()
{
    assert!(initialize());
    let source = "
float4 tint;
fixed4 main (float4 uv : TEXCOORD0) : COLOR0
{
    tint = tint * 0.5;
    return tint + uv;
}
";
    let mut compiler = Compiler::new(Stage::Fragment);
    assert!(compiler.parse(Some(source), TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    let text = compiler.shader();
    assert!(text.contains("uniform highp vec4 tint;"));
    assert!(text.contains("highp vec4 xlt_tint;"));
    assert!(text.contains("    xlt_tint = tint;"));
    assert!(text.contains("xlt_tint = (xlt_tint * 0.5);"));
    assert!(!text.contains("\n    tint ="));
    // the reflection table still reports the declared name
    assert_eq!(compiler.uniforms()[0].name, "tint");
}

#[test]
fn deferred_array_initializer_lands_in_main_prologue()
{
    assert!(initialize());
    let source = "
static float weights[3] = { 0.25, 0.5, 0.25 };
fixed4 main (float4 uv : TEXCOORD0) : COLOR0
{
    return uv * weights[1];
}
";
    let mut compiler = Compiler::new(Stage::Fragment);
    assert!(compiler.parse(Some(source), TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0), "{}", compiler.info_log());
    let text = compiler.shader();
    assert!(text.contains("float weights[3];"));
    assert!(text.contains("    weights[0] = 0.25;"));
    assert!(text.contains("    weights[1] = 0.5;"));
    assert!(text.contains("    weights[2] = 0.25;"));
    let main_pos = text.find("void main()").unwrap();
    let init_pos = text.find("weights[0] = 0.25;").unwrap();
    assert!(init_pos > main_pos);
}

#[test]
fn generic_sampler_resolves_from_use()
{
    let source = "
sampler shadowmap;
fixed4 main (float4 uv : TEXCOORD0) : COLOR0
{
    return shadow2D (shadowmap, uv.xyz);
}
";
    let (success, output) = compile_shader(Stage::Fragment, TargetVersion::GlslEs100, source);
    assert!(success, "{}", output);
    assert!(output.contains("uniform lowp sampler2DShadow shadowmap;"));
    assert!(output.contains("// shadowmap:<none> type 26 arrsize 0"));
}

#[test]
fn user_function_is_emitted_before_entry()
{
    let source = "
float4x4 mvp;
float4 transform(float4 v)
{
    return mul (mvp, v);
}
void main (float4 vertex : POSITION, out float4 overtex : POSITION)
{
    overtex = transform(vertex);
}
";
    let (success, output) = compile_shader(Stage::Vertex, TargetVersion::GlslEs100, source);
    assert!(success, "{}", output);
    let helper_pos = output.find("vec4 transform( in highp vec4 v ) {").unwrap();
    let entry_pos = output.find("void xlat_main(").unwrap();
    assert!(helper_pos < entry_pos);
    assert!(output.contains("overtex = transform( vertex);"));
}

#[test]
fn repeated_parse_and_translate_is_deterministic()
{
    assert!(initialize());
    let mut compiler = Compiler::new(Stage::Vertex);
    assert!(compiler.parse(Some(VERTEX_SHADER_SRC), TargetVersion::GlslEs100, 0));
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0));
    let first = compiled_shader_text(&compiler);
    assert!(compiler.parse(Some(VERTEX_SHADER_SRC), TargetVersion::GlslEs100, 0));
    assert!(compiler.translate("main", TargetVersion::GlslEs100, 0));
    let second = compiled_shader_text(&compiler);
    assert_eq!(first, second);
}

#[test]
fn concurrent_sessions_produce_identical_output()
{
    assert!(initialize());
    let mut handles = Vec::new();
    for _ in 0..8 {
        handles.push(std::thread::spawn(|| {
            compile_shader(Stage::Fragment, TargetVersion::GlslEs100, FRAGMENT_SHADER_SRC)
        }));
    }
    let results: Vec<(bool, String)> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results[0].0, "{}", results[0].1);
    for r in &results[1..] {
        assert_eq!(results[0], *r);
    }
}
