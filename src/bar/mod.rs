//! 状态栏: provider 表与渲染
//!
//! provider = 探针 + 模板 + 参数, 表的顺序就是输出中从左到右的顺序。

use std::fmt;

use tracing::debug;

use crate::probe::Probe;

mod template;

pub use template::Template;

/// 一列输出
pub struct Provider {
    name: String,
    probe: Box<dyn Probe>,
    template: Template,
    argument: Option<String>,
}

impl Provider {
    pub fn new(name: impl Into<String>, probe: Box<dyn Probe>, template: Template, argument: Option<String>) -> Self {
        Self { name: name.into(), probe, template, argument }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 调用探针并套用模板, 失败时用占位符代替值
    fn render(&mut self, unknown: &str) -> String {
        match self.probe.sample(self.argument.as_deref()) {
            Ok(value) => self.template.apply(&value),
            Err(err) => {
                debug!(probe = %self.name, argument = ?self.argument, "probe failed: {}", err);
                self.template.apply(unknown)
            }
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name())
            .field("template", &self.template().source())
            .field("argument", &self.argument())
            .finish()
    }
}

/// 启动时构建, 运行期间不再增删
#[derive(Debug, Default)]
pub struct ProviderTable {
    providers: Vec<Provider>,
}

impl ProviderTable {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    pub fn entries(&self) -> &[Provider] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

/// 把所有 provider 的输出拼成一行, 长度受 `max_len` 限制
#[derive(Debug, Clone)]
pub struct Renderer {
    unknown: String,
    max_len: usize,
}

impl Renderer {
    /// `max_len` 与 C 缓冲区一致, 包含结尾的 NUL, 所以内容最多 `max_len - 1` 字节
    pub fn new(unknown: impl Into<String>, max_len: usize) -> Self {
        Self { unknown: unknown.into(), max_len }
    }

    pub fn capacity(&self) -> usize {
        self.max_len.saturating_sub(1)
    }

    pub fn render(&self, table: &mut ProviderTable) -> String {
        let capacity = self.capacity();
        let mut line = String::with_capacity(capacity.min(4096));

        for provider in table.providers.iter_mut() {
            let fragment = provider.render(&self.unknown);
            let room = capacity - line.len();
            if fragment.len() > room {
                line.push_str(&fragment[..floor_char_boundary(&fragment, room)]);
                debug!(probe = %provider.name(), capacity, "status line truncated");
                break;
            }
            line.push_str(&fragment);
        }
        line
    }
}

/// 不超过 index 的最大字符边界
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|i| s.is_char_boundary(*i)).unwrap_or(0)
}
