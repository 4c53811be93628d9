//! Stream session controller
//!
//! [`StreamSession`] drives the read loop for one streaming response body:
//! read a chunk, decode it, frame it into lines, and dispatch each line to
//! a [`StreamHandler`] callback, awaiting every dispatch so callbacks never
//! run concurrently within a session. The loop runs until the reader
//! reaches natural end of stream or the shared [`CancelToken`] is set.
//!
//! Cancellation is cooperative: setting the token does not preempt an
//! in-flight read. The loop observes the flag at the top of each iteration
//! and again after each read resolves, then releases the reader before
//! exiting. `on_finish` fires exactly once on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::stream::{ChunkDecoder, FramedLine, LineFramer};

/// Shared cancellation flag for one stream session
///
/// The caller keeps a clone and sets it; the session only reads it.
/// Write-once-observed-many: there is no way to un-cancel.
///
/// # Examples
///
/// ```
/// use hearthchat::stream::CancelToken;
///
/// let token = CancelToken::new();
/// let shared = token.clone();
/// assert!(!shared.is_cancelled());
/// token.cancel();
/// assert!(shared.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Callbacks dispatched by a [`StreamSession`]
///
/// Dispatches are awaited in line order; a fallible callback returning an
/// error ends the session (with `on_finish(false)`) and the error is
/// returned to the caller of [`StreamSession::run`].
#[async_trait::async_trait]
pub trait StreamHandler: Send {
    /// A `data:` line; `payload` is the raw trimmed text. The controller
    /// does not parse or validate payload structure.
    async fn on_data(&mut self, payload: &str) -> Result<()>;

    /// An `event:` line naming the next logical event
    async fn on_event(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// A `:` comment line
    async fn on_comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    /// End of session; `is_done` is true only on natural end of stream
    async fn on_finish(&mut self, is_done: bool);
}

/// One in-flight read of a streaming response body
///
/// Exclusively owns the byte reader, a [`ChunkDecoder`], and a
/// [`LineFramer`]; the only state shared with the caller is the
/// [`CancelToken`]. The session is consumed by [`run`](Self::run), so no
/// reads or dispatches can occur after it returns.
pub struct StreamSession<S> {
    reader: S,
    decoder: ChunkDecoder,
    framer: LineFramer,
    cancel: CancelToken,
}

impl<S, E> StreamSession<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send,
    E: std::fmt::Display,
{
    /// Take ownership of a response byte stream
    pub fn new(reader: S, cancel: CancelToken) -> Self {
        Self {
            reader,
            decoder: ChunkDecoder::new(),
            framer: LineFramer::new(),
            cancel,
        }
    }

    /// Drive the read loop to completion
    ///
    /// Returns `Ok(true)` on natural end of stream, `Ok(false)` when the
    /// session exited via cancellation, and `Err` when a handler callback
    /// failed. `handler.on_finish` is invoked exactly once in all cases,
    /// and the reader is released before returning on every path.
    ///
    /// Chunk-level transport or decode errors are logged and the loop
    /// continues with the next read; they never end the session.
    pub async fn run<H>(self, handler: &mut H) -> Result<bool>
    where
        H: StreamHandler + ?Sized,
    {
        let Self {
            mut reader,
            mut decoder,
            mut framer,
            cancel,
        } = self;

        let mut done = false;
        let mut callback_err = None;

        'read: loop {
            if cancel.is_cancelled() {
                tracing::debug!("Stream session cancelled before read");
                break;
            }

            let chunk = match reader.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    // Transient transport error: abandon this iteration,
                    // keep the session alive.
                    tracing::warn!("Stream read error, continuing: {}", e);
                    continue;
                }
                None => {
                    done = true;
                    break;
                }
            };

            if cancel.is_cancelled() {
                tracing::debug!("Stream session cancelled after read resolved");
                break;
            }

            let fragment = decoder.decode(&chunk);
            for line in framer.push(&fragment) {
                if let Err(e) = dispatch(handler, &line).await {
                    tracing::warn!("Stream handler failed on {:?}: {}", line, e);
                    callback_err = Some(e);
                    break 'read;
                }
            }
        }

        if done {
            // Flush carried decoder state; an incomplete trailing
            // multi-byte sequence is dropped here.
            decoder.finish();
            if framer.has_partial_line() {
                tracing::debug!("Dropping partial line at end of stream");
            }
        } else {
            // Exit was not natural completion: release the reader before
            // signalling finish so the connection is torn down.
            drop(reader);
        }

        handler.on_finish(done).await;

        match callback_err {
            Some(e) => Err(e),
            None => Ok(done),
        }
    }
}

/// Dispatch one framed line to the matching handler callback
async fn dispatch<H>(handler: &mut H, line: &FramedLine) -> Result<()>
where
    H: StreamHandler + ?Sized,
{
    match line {
        FramedLine::Data(payload) => handler.on_data(payload).await,
        FramedLine::Event(name) => handler.on_event(name).await,
        FramedLine::Comment(text) => handler.on_comment(text).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HearthchatError;

    type ChunkResult = std::result::Result<Bytes, std::io::Error>;

    /// Records every dispatch in order and counts finishes.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
        finish_count: usize,
        finished_done: Option<bool>,
        cancel_after_data: Option<CancelToken>,
        fail_on_data: bool,
    }

    #[async_trait::async_trait]
    impl StreamHandler for Recorder {
        async fn on_data(&mut self, payload: &str) -> Result<()> {
            if self.fail_on_data {
                return Err(HearthchatError::Handler("sink closed".to_string()).into());
            }
            self.calls.push(format!("data:{}", payload));
            if let Some(token) = &self.cancel_after_data {
                token.cancel();
            }
            Ok(())
        }

        async fn on_event(&mut self, name: &str) -> Result<()> {
            self.calls.push(format!("event:{}", name));
            Ok(())
        }

        async fn on_comment(&mut self, text: &str) -> Result<()> {
            self.calls.push(format!("comment:{}", text));
            Ok(())
        }

        async fn on_finish(&mut self, is_done: bool) {
            self.finish_count += 1;
            self.finished_done = Some(is_done);
        }
    }

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = ChunkResult> + Unpin + Send {
        let items: Vec<ChunkResult> = parts
            .iter()
            .map(|p| Ok(Bytes::copy_from_slice(p)))
            .collect();
        futures::stream::iter(items)
    }

    #[tokio::test]
    async fn test_data_lines_dispatched_then_finish_true() {
        let mut handler = Recorder::default();
        let session = StreamSession::new(
            chunks(&[b"dat", b"a: hello\ndata: world\n"]),
            CancelToken::new(),
        );

        let done = session.run(&mut handler).await.expect("run should succeed");

        assert!(done);
        assert_eq!(handler.calls, vec!["data:hello", "data:world"]);
        assert_eq!(handler.finish_count, 1);
        assert_eq!(handler.finished_done, Some(true));
    }

    #[tokio::test]
    async fn test_all_line_kinds_dispatched_in_order() {
        let mut handler = Recorder::default();
        let body: &[u8] = b": warming up\nevent: token\ndata: alpha\n";
        let session = StreamSession::new(chunks(&[body]), CancelToken::new());

        session.run(&mut handler).await.expect("run should succeed");

        assert_eq!(
            handler.calls,
            vec!["comment:warming up", "event:token", "data:alpha"]
        );
    }

    #[tokio::test]
    async fn test_chunk_boundary_invariance() {
        let body = b"event: token\ndata: alpha\ndata: beta\n: tick\n";
        let mut whole = Recorder::default();
        StreamSession::new(chunks(&[body]), CancelToken::new())
            .run(&mut whole)
            .await
            .expect("run should succeed");

        for split in 0..body.len() {
            let mut handler = Recorder::default();
            StreamSession::new(chunks(&[&body[..split], &body[split..]]), CancelToken::new())
                .run(&mut handler)
                .await
                .expect("run should succeed");
            assert_eq!(handler.calls, whole.calls, "split at byte {}", split);
        }
    }

    #[tokio::test]
    async fn test_multibyte_payload_split_at_chunk_boundary() {
        // "déjà" with the é split across the boundary.
        let body = "data: déjà\n".as_bytes();
        // Byte 8 is the middle of the two-byte "é".
        let mut handler = Recorder::default();
        StreamSession::new(chunks(&[&body[..8], &body[8..]]), CancelToken::new())
            .run(&mut handler)
            .await
            .expect("run should succeed");
        assert_eq!(handler.calls, vec!["data:déjà"]);
    }

    #[tokio::test]
    async fn test_pre_cancelled_session_dispatches_nothing() {
        let token = CancelToken::new();
        token.cancel();
        let mut handler = Recorder::default();
        let session = StreamSession::new(chunks(&[b"data: hello\n"]), token);

        let done = session.run(&mut handler).await.expect("run should succeed");

        assert!(!done);
        assert!(handler.calls.is_empty());
        assert_eq!(handler.finished_done, Some(false));
        assert_eq!(handler.finish_count, 1);
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_keeps_prior_dispatches() {
        let token = CancelToken::new();
        let mut handler = Recorder {
            cancel_after_data: Some(token.clone()),
            ..Default::default()
        };
        // The first chunk's line is dispatched; the cancel set inside the
        // callback is observed before the second chunk is processed.
        let session = StreamSession::new(chunks(&[b"data: first\n", b"data: second\n"]), token);

        let done = session.run(&mut handler).await.expect("run should succeed");

        assert!(!done);
        assert_eq!(handler.calls, vec!["data:first"]);
        assert_eq!(handler.finished_done, Some(false));
    }

    #[tokio::test]
    async fn test_transport_error_is_recovered_not_fatal() {
        let items: Vec<ChunkResult> = vec![
            Ok(Bytes::from_static(b"data: before\n")),
            Err(std::io::Error::new(std::io::ErrorKind::Other, "reset")),
            Ok(Bytes::from_static(b"data: after\n")),
        ];
        let mut handler = Recorder::default();

        let done = StreamSession::new(futures::stream::iter(items), CancelToken::new())
            .run(&mut handler)
            .await
            .expect("run should succeed");

        assert!(done);
        assert_eq!(handler.calls, vec!["data:before", "data:after"]);
    }

    #[tokio::test]
    async fn test_callback_error_finishes_false_and_propagates() {
        let mut handler = Recorder {
            fail_on_data: true,
            ..Default::default()
        };
        let session = StreamSession::new(chunks(&[b"data: boom\n"]), CancelToken::new());

        let result = session.run(&mut handler).await;

        assert!(result.is_err());
        assert_eq!(handler.finish_count, 1);
        assert_eq!(handler.finished_done, Some(false));
    }

    #[tokio::test]
    async fn test_trailing_partial_line_dropped_at_end() {
        let mut handler = Recorder::default();
        let done = StreamSession::new(
            chunks(&[b"data: whole\ndata: tail-without-newline"]),
            CancelToken::new(),
        )
        .run(&mut handler)
        .await
        .expect("run should succeed");

        assert!(done);
        assert_eq!(handler.calls, vec!["data:whole"]);
    }

    #[tokio::test]
    async fn test_empty_stream_finishes_done() {
        let mut handler = Recorder::default();
        let done = StreamSession::new(chunks(&[]), CancelToken::new())
            .run(&mut handler)
            .await
            .expect("run should succeed");
        assert!(done);
        assert!(handler.calls.is_empty());
        assert_eq!(handler.finished_done, Some(true));
    }
}
