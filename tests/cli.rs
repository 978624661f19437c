use std::fs;
use std::path::Path;

use assert_cmd::Command;

const FRAGMENT: &str = "\
// tint everything red
precision mediump float;
void main() {
    gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0); /* opaque */
}
";

const FRAGMENT_MIN: &str = "precision mediump float;void main(){gl_FragColor=vec4(1.0,0.0,0.0,1.0);}\n";

fn glslopt(bin: &str, dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin(bin).expect("binary not built");
    cmd.current_dir(dir).env("RUST_LOG", "warn");
    cmd
}

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[test]
fn test_fragment_stage_inferred_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.frag"), FRAGMENT).unwrap();

    let assert = glslopt("glslopt", dir.path()).arg("shader.frag").assert().success();
    assert_eq!(
        String::from_utf8_lossy(&assert.get_output().stdout),
        FRAGMENT_MIN
    );
}

#[test]
fn test_reads_standard_input() {
    let dir = tempfile::tempdir().unwrap();
    let assert = glslopt("glslopt", dir.path())
        .args(["--fs", "-t", "OpenGLES2"])
        .write_stdin(FRAGMENT)
        .assert()
        .success();
    assert_eq!(
        String::from_utf8_lossy(&assert.get_output().stdout),
        FRAGMENT_MIN
    );
}

#[test]
fn test_undetermined_stage_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.glsl"), FRAGMENT).unwrap();

    let assert = glslopt("glslopt", dir.path())
        .args(["shader.glsl", "-oshader.min.glsl"])
        .assert()
        .code(255);
    assert!(stderr_of(&assert).contains("the shader type is not defined. use --vs or --fs."));
    assert!(assert.get_output().stdout.is_empty());
    assert!(!dir.path().join("shader.min.glsl").exists());
}

#[test]
fn test_engine_error_is_printed_and_nothing_written() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.vert"), FRAGMENT).unwrap();

    let assert = glslopt("glslopt", dir.path())
        .args(["shader.vert", "--output", "out.glsl"])
        .assert()
        .code(255);
    let stderr = stderr_of(&assert);
    assert!(stderr.contains("'gl_FragColor' is not available in vertex shaders"));
    assert!(!stderr.contains("Error:"));
    assert!(!dir.path().join("out.glsl").exists());
}

#[test]
fn test_header_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.frag"), FRAGMENT).unwrap();

    glslopt("glslopt", dir.path())
        .args(["shader.frag", "--output", "shader.h"])
        .assert()
        .success();

    let header = fs::read_to_string(dir.path().join("shader.h")).unwrap();
    assert_eq!(
        header,
        format!(
            "#define __to_text_(x) #x\nconst char g_shader[] = __to_text_(\n{});\n#undef __to_text_\n",
            FRAGMENT_MIN
        )
    );
}

#[test]
fn test_parse_errors_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.frag"), FRAGMENT).unwrap();

    let assert = glslopt("glslopt", dir.path())
        .args(["--bogus", "shader.frag", "-x"])
        .assert()
        .success();
    let stderr = stderr_of(&assert);
    assert!(stderr.lines().any(|line| line == "unknown option --bogus."));
    assert!(stderr.lines().any(|line| line == "unknown option -x."));
}

#[test]
fn test_parse_errors_survive_disabled_logging() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.frag"), FRAGMENT).unwrap();

    let assert = glslopt("glslopt", dir.path())
        .env("RUST_LOG", "off")
        .args(["shader.frag", "-o", "a.glsl", "--output", "b.glsl", "--fs", "--fs"])
        .assert()
        .success();
    let stderr = stderr_of(&assert);
    assert!(stderr
        .lines()
        .any(|line| line == "multiple output defined. previous one will be ignored."));
    assert!(stderr.lines().any(|line| line == "multiple --fs defined."));
    assert!(!dir.path().join("a.glsl").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("b.glsl")).unwrap(),
        FRAGMENT_MIN
    );
}

#[test]
fn test_invalid_target_and_multiple_inputs() {
    let dir = tempfile::tempdir().unwrap();

    let assert = glslopt("glslopt", dir.path())
        .args(["a.frag", "--target", "vulkan"])
        .assert()
        .code(255);
    assert!(stderr_of(&assert).contains("invalid target vulkan"));

    let assert = glslopt("glslopt", dir.path())
        .args(["a.frag", "b.frag"])
        .assert()
        .code(255);
    assert!(stderr_of(&assert).contains("multiple inputs are not supported."));
}

#[test]
fn test_version_and_help_exit_non_zero() {
    let dir = tempfile::tempdir().unwrap();

    let assert = glslopt("glslopt", dir.path()).arg("--version").assert().code(255);
    assert_eq!(
        String::from_utf8_lossy(&assert.get_output().stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );

    let assert = glslopt("glslopt", dir.path()).arg("--help").assert().code(255);
    assert!(String::from_utf8_lossy(&assert.get_output().stdout).contains("-o, --output <value>"));
}

#[test]
fn test_text_tool_writes_sibling_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("shader.frag"), FRAGMENT).unwrap();

    glslopt("glslopt-text", dir.path())
        .arg("shader.frag")
        .assert()
        .success();

    let written = fs::read_to_string(dir.path().join("shader.min.frag")).unwrap();
    assert_eq!(written, FRAGMENT_MIN);
}

#[test]
fn test_text_tool_requires_input() {
    let dir = tempfile::tempdir().unwrap();
    let assert = glslopt("glslopt-text", dir.path())
        .arg("--vs")
        .assert()
        .code(255);
    assert!(stderr_of(&assert).contains("no inputs."));
}
