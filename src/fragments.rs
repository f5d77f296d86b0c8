//! Turning response chunks into text fragments.
//!
//! A [`FragmentStream`] yields the text of each chunk in arrival order,
//! skips chunks that carry no text, and converts service-side blocking into
//! an [`Error::Blocked`]. It ends after the first error.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, ready};

use crate::client::ResponseStream;
use crate::error::{Error, Result};
use crate::types::{GenerateContentResponse, UsageMetadata};

/// A lazy, single-pass stream of reply fragments for one turn.
///
/// # Examples
///
/// ```
/// use futures::{StreamExt, stream};
/// use personachat::{FragmentStream, GenerateContentResponse};
///
/// # tokio_test::block_on(async {
/// let chunks = vec![
///     Ok(GenerateContentResponse::from_text("Ahoy, ")),
///     Ok(GenerateContentResponse::default()),
///     Ok(GenerateContentResponse::from_text("matey!")),
/// ];
/// let fragments: Vec<String> = FragmentStream::new(Box::pin(stream::iter(chunks)))
///     .map(|fragment| fragment.unwrap())
///     .collect()
///     .await;
/// assert_eq!(fragments, vec!["Ahoy, ", "matey!"]);
/// # });
/// ```
pub struct FragmentStream {
    inner: ResponseStream,
    usage: Option<UsageMetadata>,
    done: bool,
}

impl FragmentStream {
    /// Wrap a stream of response chunks.
    pub fn new(inner: ResponseStream) -> Self {
        Self {
            inner,
            usage: None,
            done: false,
        }
    }

    /// The most recent usage report seen on the stream.
    pub fn usage(&self) -> Option<UsageMetadata> {
        self.usage
    }
}

impl Stream for FragmentStream {
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }
            match ready!(this.inner.as_mut().poll_next(cx)) {
                None => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Some(Err(err)) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Some(Ok(chunk)) => {
                    if let Some(usage) = chunk.usage_metadata {
                        this.usage = Some(usage);
                    }
                    match fragment_of(&chunk) {
                        Ok(Some(text)) => return Poll::Ready(Some(Ok(text))),
                        Ok(None) => continue,
                        Err(err) => {
                            this.done = true;
                            return Poll::Ready(Some(Err(err)));
                        }
                    }
                }
            }
        }
    }
}

/// The text a chunk contributes to the reply.
///
/// `Ok(None)` means the chunk is bookkeeping only (usage, a bare finish
/// reason) and nothing should be written.
pub fn fragment_of(chunk: &GenerateContentResponse) -> Result<Option<String>> {
    if let Some(reason) = chunk.block_reason() {
        return Err(Error::blocked(format!("prompt rejected ({reason})")));
    }
    if let Some(text) = chunk.text().filter(|text| !text.is_empty()) {
        return Ok(Some(text));
    }
    match chunk.finish_reason() {
        Some(reason) if reason.is_blocked() => Err(Error::blocked(format!(
            "reply stopped ({})",
            reason.as_str()
        ))),
        _ => Ok(None),
    }
}
