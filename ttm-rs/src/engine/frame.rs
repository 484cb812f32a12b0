//! Call frames.

use crate::engine::Meta;
use crate::error::{Error, Result};

/// Most arguments a call may carry, the function name included.
pub const MAX_ARGS: usize = 63;

/// Activation record of one call being collected or evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// `args[0]` is the function name.
    pub args: Vec<String>,
    /// Set for `#<...>`, clear for `##<...>`.
    pub active: bool,
}

impl Frame {
    pub fn new(active: bool) -> Self {
        Self { args: Vec::new(), active }
    }

    pub fn name(&self) -> &str {
        self.arg(0)
    }

    /// Argument `i`, or the empty string when absent.
    pub fn arg(&self, i: usize) -> &str {
        self.args.get(i).map_or("", String::as_str)
    }

    /// Number of arguments, not counting the name.
    pub fn argc(&self) -> usize {
        self.args.len().saturating_sub(1)
    }

    /// Arguments after the name.
    pub fn rest(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }

    /// Render as call text, e.g. `#<ds;x;abc>`.
    pub fn render(&self, meta: &Meta) -> String {
        let mut out = String::new();
        out.push(meta.sharp);
        if !self.active {
            out.push(meta.sharp);
        }
        out.push(meta.open);
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                out.push(meta.semi);
            }
            out.push_str(arg);
        }
        out.push(meta.close);
        out
    }
}

/// Depth-bounded stack of frames, innermost last.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Push, failing once `limit` frames are already live.
    pub fn push(&mut self, frame: Frame, limit: usize) -> Result<()> {
        if self.frames.len() >= limit {
            return Err(Error::StackOverflow { limit });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Frame> {
        self.frames.pop().ok_or(Error::StackUnderflow)
    }

    pub fn top(&self) -> Result<&Frame> {
        self.frames.last().ok_or(Error::StackUnderflow)
    }

    pub fn top_mut(&mut self) -> Result<&mut Frame> {
        self.frames.last_mut().ok_or(Error::StackUnderflow)
    }

    /// Drop every frame above `depth`.
    pub fn unwind(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Every live frame rendered as call text, outermost first.
    pub fn describe(&self, meta: &Meta) -> Vec<String> {
        self.frames.iter().map(|f| f.render(meta)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(args: &[&str], active: bool) -> Frame {
        Frame { args: args.iter().map(|s| s.to_string()).collect(), active }
    }

    #[test]
    fn args_and_argc() {
        let f = frame(&["ds", "x", "body"], true);
        assert_eq!(f.name(), "ds");
        assert_eq!(f.argc(), 2);
        assert_eq!(f.arg(2), "body");
        assert_eq!(f.arg(9), "");
        assert_eq!(f.rest(), &["x".to_string(), "body".to_string()]);
        assert_eq!(Frame::new(true).argc(), 0);
        assert!(Frame::new(true).rest().is_empty());
    }

    #[test]
    fn render_active_and_passive() {
        let meta = Meta::default();
        assert_eq!(frame(&["ad", "1", "2"], true).render(&meta), "#<ad;1;2>");
        assert_eq!(frame(&["names"], false).render(&meta), "##<names>");
    }

    #[test]
    fn push_respects_limit() {
        let mut s = FrameStack::new();
        s.push(Frame::new(true), 2).unwrap();
        s.push(Frame::new(true), 2).unwrap();
        assert_eq!(s.push(Frame::new(true), 2), Err(Error::StackOverflow { limit: 2 }));
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn underflow_and_unwind() {
        let mut s = FrameStack::new();
        assert_eq!(s.pop(), Err(Error::StackUnderflow));
        for _ in 0..5 {
            s.push(Frame::new(false), 10).unwrap();
        }
        s.unwind(1);
        assert_eq!(s.depth(), 1);
    }
}
