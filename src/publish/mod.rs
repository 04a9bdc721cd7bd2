//! 状态行的输出目标: X11 根窗口标题或标准输出

use std::io::Write;

use crate::error::{Error, Result};

mod x11;

pub use self::x11::X11Publisher;

pub trait Publisher {
    fn publish(&mut self, line: &str) -> Result<()>;

    /// 退出前清除已发布的内容
    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, line: &str) -> Result<()> {
        (**self).publish(line)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// 每个 tick 写一行并立即 flush
#[derive(Debug)]
pub struct StreamPublisher<W: Write> {
    out: W,
}

impl<W: Write> StreamPublisher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Publisher for StreamPublisher<W> {
    fn publish(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line)
            .and_then(|()| self.out.flush())
            .map_err(Error::Publish)
    }
}
