//! Incremental decoding of a chunked SSE body into complete lines.

/// Stateful UTF-8 decoder that tolerates sequences split across reads.
///
/// Incomplete trailing bytes are held back until the next call; bytes that
/// can never form a valid sequence are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match error.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush bytes still held back at end of input.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}

/// Splits decoded text on `\n`, keeping the unterminated tail buffered.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: String,
}

impl LineBuffer {
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            lines.push(self.buffer[..pos].to_string());
            self.buffer.drain(..=pos);
        }
        lines
    }

    pub fn take_remainder(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

/// Byte chunks in, complete lines out.
#[derive(Debug, Default)]
pub struct SseDecoder {
    utf8: Utf8Decoder,
    lines: LineBuffer,
}

impl SseDecoder {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let text = self.utf8.decode(chunk);
        self.lines.push(&text)
    }

    /// The last line of the body if it was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let tail = self.utf8.finish();
        let mut remainder = self.lines.take_remainder();
        remainder.push_str(&tail);
        if remainder.trim().is_empty() {
            None
        } else {
            Some(remainder)
        }
    }
}
