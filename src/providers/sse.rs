/// Reassembles server-sent event frames from arbitrary byte chunks.
#[derive(Debug, Default)]
pub(super) struct SseBuffer {
    buffer: String,
}

impl SseBuffer {
    pub(super) fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub(super) fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Pop the next complete `\n\n`-terminated event block, if any.
    pub(super) fn next_event_block(&mut self) -> Option<String> {
        let boundary = self.buffer.find("\n\n")?;
        let remaining = self.buffer.split_off(boundary + 2);
        let event_block = std::mem::take(&mut self.buffer);
        self.buffer = remaining;
        Some(event_block)
    }
}

/// Extract the payloads of `data: ` lines from one event block.
pub(super) fn data_lines(event_block: &str) -> Vec<&str> {
    event_block
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .collect()
}
