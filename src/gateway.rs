//! Façade over a shader-optimization [`Engine`].
//!
//! Engines hand results back as a NUL-terminated string somewhere inside a heap
//! they own and reuse between calls. [`Optimizer::optimize_buffer`] finds the
//! terminator and returns the bytes before it as a view into that heap; the
//! view borrows the optimizer, so it has to be dropped (or copied out with
//! `to_vec`) before the next call can be made.

use log::debug;
use tokio::sync::OnceCell;

use crate::error::GlslOptError;
use crate::target::ShaderTarget;

/// Prefix marking an engine result as an error message.
pub const ERROR_SENTINEL: &[u8] = b"Error:";

pub trait Engine {
    /// One-time setup. Called by [`Optimizer::load`] before any optimize call.
    fn initialize(&mut self) -> Result<(), GlslOptError>;

    /// Optimizes `source` for the target with the given
    /// [`code`](ShaderTarget::code) and returns the heap offset of the
    /// NUL-terminated result. Failures are reported in-band as an
    /// [`ERROR_SENTINEL`] string.
    fn optimize(&mut self, source: &[u8], target: u32, is_vertex: bool) -> usize;

    fn heap(&self) -> &[u8];
}

pub struct Optimizer<E> {
    engine: E,
    ready: OnceCell<()>,
}

impl<E: Engine> Optimizer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            ready: OnceCell::new(),
        }
    }

    /// Waits until the engine is ready. Only the first call initializes it.
    pub async fn load(&mut self) -> Result<(), GlslOptError> {
        let engine = &mut self.engine;
        self.ready
            .get_or_try_init(|| async move {
                debug!("initializing optimizer engine");
                engine.initialize()
            })
            .await?;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.ready.initialized()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Text in, text out. The result is not inspected for the error sentinel.
    pub fn optimize_text(&mut self, source: &str, target: ShaderTarget, is_vertex: bool) -> String {
        let view = self.optimize_buffer(source.as_bytes(), target, is_vertex);
        String::from_utf8_lossy(view).into_owned()
    }

    /// Bytes in, bytes out. The returned slice aliases the engine heap.
    pub fn optimize_buffer(&mut self, source: &[u8], target: ShaderTarget, is_vertex: bool) -> &[u8] {
        let offset = self.engine.optimize(source, target.code(), is_vertex);
        let view = null_terminated(self.engine.heap(), offset);
        debug!(
            "engine returned {} bytes at heap offset {}",
            view.len(),
            offset
        );
        view
    }
}

/// Bytes of `heap` from `offset` up to (not including) the first NUL.
///
/// Stops at the end of the heap if no terminator is found; an offset past the
/// end yields an empty slice.
pub fn null_terminated(heap: &[u8], offset: usize) -> &[u8] {
    let Some(tail) = heap.get(offset..) else {
        return &[];
    };
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    &tail[..end]
}

/// Splits an engine result into the payload or the error it carries.
pub fn check_sentinel(result: &[u8]) -> Result<&[u8], GlslOptError> {
    match result.strip_prefix(ERROR_SENTINEL) {
        Some(message) => Err(GlslOptError::Engine(
            String::from_utf8_lossy(message).trim().to_string(),
        )),
        None => Ok(result),
    }
}
