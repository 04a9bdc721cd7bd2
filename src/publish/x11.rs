//! 设置根窗口的 `WM_NAME`(dwm 等窗口管理器把它显示在状态栏)

use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, PropMode, Window};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::error::{Error, Result};

use super::Publisher;

pub struct X11Publisher {
    conn: RustConnection,
    root: Window,
}

impl X11Publisher {
    /// `display` 为空时使用 `$DISPLAY`
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, screen) = x11rb::connect(display).map_err(|err| Error::Display(err.to_string()))?;
        let root = conn
            .setup()
            .roots
            .get(screen)
            .map(|screen| screen.root)
            .ok_or_else(|| Error::Display(format!("screen {} does not exist", screen)))?;
        let name = display.unwrap_or("$DISPLAY");
        info!(display = name, screen, "connected to X server");
        Ok(Self { conn, root })
    }

    fn store_name(&self, name: &[u8]) -> Result<()> {
        let to_display_error = |err: &dyn std::fmt::Display| Error::Display(err.to_string());
        self.conn
            .change_property8(PropMode::REPLACE, self.root, AtomEnum::WM_NAME, AtomEnum::STRING, name)
            .map_err(|err| to_display_error(&err))?;
        self.conn.sync().map_err(|err| to_display_error(&err))
    }
}

impl Publisher for X11Publisher {
    fn publish(&mut self, line: &str) -> Result<()> {
        self.store_name(line.as_bytes())
    }

    fn clear(&mut self) -> Result<()> {
        debug!("clearing root window name");
        self.store_name(&[])
    }
}
