// src/client/decode.rs

/// Incremental UTF-8 decoder for a byte-chunk stream. A multi-byte scalar
/// split across two chunks is held back until its remaining bytes arrive.
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn decode(&mut self, input: &[u8]) -> String {
        let bytes = if self.pending.is_empty() {
            input.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(input);
            joined
        };

        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                // Incomplete trailing sequence; keep it for the next chunk.
                let valid = err.valid_up_to();
                self.pending = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Emits replacement characters for any bytes still held at end of
    /// stream (a reply truncated mid-scalar).
    pub fn flush(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            String::from_utf8_lossy(&std::mem::take(&mut self.pending)).into_owned()
        }
    }
}

impl Default for Utf8StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}
