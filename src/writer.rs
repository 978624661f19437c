use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;

/// Somewhere to put the optimized shader.
pub trait Output {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Finishes the output. Nothing may be written afterwards.
    fn end(&mut self) -> io::Result<()>;
}

/// Writes to a file created (or truncated) when the output is opened.
///
/// The descriptor is released by `end`, or by drop on any path that never
/// reaches it.
pub struct FileOutput {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl FileOutput {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        debug!("opened {} for writing", path.display());
        Ok(Self {
            path,
            file: Some(BufWriter::new(file)),
        })
    }
}

impl Output for FileOutput {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is already closed", self.path.display()),
            )),
        }
    }

    fn end(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            debug!("closed {}", self.path.display());
        }
        Ok(())
    }
}

/// Writes straight through to a stream such as standard output.
pub struct StreamOutput<W: Write> {
    stream: W,
}

impl StreamOutput<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> StreamOutput<W> {
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}

impl<W: Write> Output for StreamOutput<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)
    }

    fn end(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

/// Standard output when no path is given, otherwise the file at `path`,
/// opened right away.
pub fn select_output(path: Option<&Path>) -> io::Result<Box<dyn Output>> {
    match path {
        Some(path) => Ok(Box::new(FileOutput::create(path)?)),
        None => Ok(Box::new(StreamOutput::stdout())),
    }
}

pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "h++", "hh"];

pub fn is_header_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            HEADER_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// `g_` followed by the file stem, with `.`, `/` and `\` turned into `_`.
pub fn derive_header_symbol(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "g_{}",
        stem.replace(|c: char| matches!(c, '.' | '/' | '\\'), "_")
    )
}

/// The symbol to embed the shader under, if the output is a C header.
///
/// An explicit `--cheader` name always wins; otherwise one is derived for
/// outputs with a header extension.
pub fn header_symbol(output: Option<&Path>, explicit: Option<&str>) -> Option<String> {
    match (explicit, output) {
        (Some(name), _) => Some(name.to_string()),
        (None, Some(path)) if is_header_path(path) => Some(derive_header_symbol(path)),
        _ => None,
    }
}

/// Writes `payload`, wrapped in a C string constant when `symbol` is set.
pub fn write_payload(out: &mut dyn Output, payload: &[u8], symbol: Option<&str>) -> io::Result<()> {
    match symbol {
        Some(name) => {
            out.write(b"#define __to_text_(x) #x\n")?;
            out.write(format!("const char {}[] = __to_text_(\n", name).as_bytes())?;
            out.write(payload)?;
            out.write(b");\n#undef __to_text_\n")
        }
        None => out.write(payload),
    }
}

#[cfg(test)]
mod tests {
    use crate::writer::*;

    #[test]
    fn test_header_symbol_derivation() {
        assert_eq!(derive_header_symbol(Path::new("shader.h")), "g_shader");
        assert_eq!(
            derive_header_symbol(Path::new("out/blur.pass.hpp")),
            "g_blur_pass"
        );
        assert_eq!(
            header_symbol(Some(Path::new("include/shader.HH")), None),
            Some("g_shader".to_string())
        );
        assert_eq!(header_symbol(Some(Path::new("shader.frag")), None), None);
        assert_eq!(header_symbol(None, None), None);
        assert_eq!(
            header_symbol(Some(Path::new("shader.frag")), Some("kShader")),
            Some("kShader".to_string())
        );
    }

    #[test]
    fn test_header_extensions() {
        for name in ["a.h", "a.hpp", "a.h++", "a.hh", "a.H", "a.HPP"] {
            assert!(is_header_path(Path::new(name)), "{}", name);
        }
        for name in ["a.c", "a.glsl", "a", "a.hxx"] {
            assert!(!is_header_path(Path::new(name)), "{}", name);
        }
    }

    #[test]
    fn test_c_header_template() {
        let mut out = StreamOutput::new(Vec::new());
        write_payload(&mut out, b"void main(){}\n", Some("g_shader")).unwrap();
        out.end().unwrap();
        assert_eq!(
            String::from_utf8(out.into_inner()).unwrap(),
            "#define __to_text_(x) #x\nconst char g_shader[] = __to_text_(\nvoid main(){}\n);\n#undef __to_text_\n"
        );
    }

    #[test]
    fn test_plain_payload_is_verbatim() {
        let mut out = StreamOutput::new(Vec::new());
        write_payload(&mut out, b"\x01raw\xffbytes", None).unwrap();
        assert_eq!(out.into_inner(), b"\x01raw\xffbytes");
    }

    #[test]
    fn test_file_output_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.glsl");
        std::fs::write(&path, b"stale content that must be truncated").unwrap();

        let payload = b"precision mediump float;void main(){}\n";
        let mut out = FileOutput::create(&path).unwrap();
        out.write(&payload[..10]).unwrap();
        out.write(&payload[10..]).unwrap();
        out.end().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), payload);
        assert!(out.write(b"late").is_err());
        out.end().unwrap();
    }

    #[test]
    fn test_select_output_opens_file_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shader.min.frag");
        let out = select_output(Some(path.as_path())).unwrap();
        assert!(path.exists());
        drop(out);
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }
}
