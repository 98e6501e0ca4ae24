//! Output buffer for analytics code fragments.
//!
//! Trackers accept an `Arc<dyn CodeSink>` and append rendered fragments to
//! a named insertion point of the page's analytics snippet.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::templates::escape_script_json;

/// Insertion points of the analytics.js snippet, in output order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CodeBlock {
    BeforeScriptTag,
    BeforeScript,
    BeforeInit,
    AfterInit,
    /// Fragments that must run before the main `send pageview` call.
    BeforeTrack,
    AfterTrack,
    AfterScript,
    AfterScriptTag,
}

impl CodeBlock {
    pub const ALL: [CodeBlock; 8] = [
        CodeBlock::BeforeScriptTag,
        CodeBlock::BeforeScript,
        CodeBlock::BeforeInit,
        CodeBlock::AfterInit,
        CodeBlock::BeforeTrack,
        CodeBlock::AfterTrack,
        CodeBlock::AfterScript,
        CodeBlock::AfterScriptTag,
    ];
}

/// A rendered fragment and the slot it was added to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePart {
    pub block: CodeBlock,
    pub code: String,
}

/// Destination for rendered code fragments.
pub trait CodeSink: Send + Sync {
    fn add_code_part(&self, code: String, block: CodeBlock);
}

/// Discards every fragment.
pub struct NoOpSink;

impl CodeSink for NoOpSink {
    fn add_code_part(&self, _code: String, _block: CodeBlock) {}
}

/// Append-only in-memory buffer. Fragments keep insertion order within
/// each block.
#[derive(Default)]
pub struct CodeBuffer {
    parts: Mutex<Vec<CodePart>>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self {
            parts: Mutex::new(Vec::new()),
        }
    }

    pub fn parts(&self) -> Vec<CodePart> {
        self.parts.lock().clone()
    }

    /// Fragments of a single block, in insertion order.
    pub fn block(&self, block: CodeBlock) -> Vec<String> {
        self.parts
            .lock()
            .iter()
            .filter(|p| p.block == block)
            .map(|p| p.code.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.parts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.lock().is_empty()
    }

    pub fn clear(&self) {
        self.parts.lock().clear();
    }

    /// Assemble the full analytics.js snippet with every buffered fragment
    /// placed at its insertion point.
    pub fn render_script(&self, tracking_id: &str) -> String {
        let parts = self.parts.lock();
        let mut out = String::new();

        for block in CodeBlock::ALL {
            match block {
                CodeBlock::BeforeScript => out.push_str("<script>\n"),
                CodeBlock::BeforeInit => out.push_str(ANALYTICS_LOADER),
                CodeBlock::AfterInit => {
                    let id = escape_script_json(&serde_json::Value::from(tracking_id).to_string());
                    out.push_str(&format!("ga('create', {id}, 'auto');\n"));
                }
                CodeBlock::AfterTrack => out.push_str("ga('send', 'pageview');\n"),
                CodeBlock::AfterScriptTag => out.push_str("</script>\n"),
                _ => {}
            }
            for part in parts.iter().filter(|p| p.block == block) {
                out.push_str(&part.code);
                if !part.code.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out
    }
}

impl CodeSink for CodeBuffer {
    fn add_code_part(&self, code: String, block: CodeBlock) {
        self.parts.lock().push(CodePart { block, code });
    }
}

const ANALYTICS_LOADER: &str = "(function(i,s,o,g,r,a,m){i['GoogleAnalyticsObject']=r;i[r]=i[r]||function(){\
(i[r].q=i[r].q||[]).push(arguments)},i[r].l=1*new Date();a=s.createElement(o),\
m=s.getElementsByTagName(o)[0];a.async=1;a.src=g;m.parentNode.insertBefore(a,m)\
})(window,document,'script','https://www.google-analytics.com/analytics.js','ga');\n";

/// Convenience: create a sink that drops everything.
pub fn noop_sink() -> Arc<dyn CodeSink> {
    Arc::new(NoOpSink)
}

/// Convenience: create a shared buffer.
pub fn code_buffer() -> Arc<CodeBuffer> {
    Arc::new(CodeBuffer::new())
}
