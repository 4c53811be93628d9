//! Incremental UTF-8 chunk decoding
//!
//! A streaming response body arrives as arbitrary byte chunks; a multi-byte
//! scalar may be split across a chunk boundary. [`ChunkDecoder`] carries the
//! undecoded trailing bytes of each chunk into the next call so that the
//! concatenation of all returned fragments equals the decoding of the
//! concatenation of all chunks. Decoding is best-effort: invalid interior
//! sequences are skipped rather than failing the stream.

/// Stateful UTF-8 decoder for streamed byte chunks
///
/// One decoder belongs to exactly one stream session; the carried partial
/// bytes are per-session state, so independent sessions never cross-talk.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    /// Undecoded trailing bytes from the previous chunk
    carry: Vec<u8>,
}

impl ChunkDecoder {
    /// Create a decoder with no carried state
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, carrying any incomplete trailing sequence
    ///
    /// Returns all text that can be decoded from the carried bytes plus
    /// this chunk. A zero-length chunk is legal and returns whatever the
    /// carry alone decodes to (nothing, unless prior bytes were invalid).
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(chunk);

        let mut out = String::with_capacity(buf.len());
        let mut input: &[u8] = &buf;

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        // Invalid interior bytes: skip and keep decoding.
                        Some(len) => input = &rest[len..],
                        // Incomplete trailing sequence: carry it forward.
                        None => {
                            self.carry = rest.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// Flush decoder state at end of stream
    ///
    /// An incomplete trailing multi-byte sequence is silently dropped.
    /// Returns any text recoverable from the carry (currently always empty,
    /// since a carry is by construction an incomplete sequence).
    pub fn finish(&mut self) -> String {
        if !self.carry.is_empty() {
            tracing::debug!(
                "Dropping {} undecoded trailing bytes at end of stream",
                self.carry.len()
            );
            self.carry.clear();
        }
        String::new()
    }

    /// Whether the decoder is carrying an incomplete sequence
    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }
}
