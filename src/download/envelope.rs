//! Response head plus streaming body, as handed from a transport to the
//! orchestrator.

use std::fmt;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::HeaderMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::classify::BodyPresence;

/// Streaming response body. Dropping it releases the underlying connection.
pub type BodyStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Response headers as an ordered multimap.
///
/// Names are stored lower-cased in first-arrival order; values keep their
/// arrival order, so repeated headers survive intact. Lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl ResponseHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a reqwest header map.
    ///
    /// Non-UTF-8 values are converted lossily rather than dropped.
    #[must_use]
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            let value = value.to_str().map_or_else(
                |_| String::from_utf8_lossy(value.as_bytes()).into_owned(),
                str::to_string,
            );
            headers.append(name.as_str(), value);
        }
        headers
    }

    /// Appends a value, keeping earlier values for the same name.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// All values for `name`, in arrival order.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// First value for `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(<[String]>::first)
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}

impl Serialize for ResponseHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            map.serialize_entry(name, values)?;
        }
        map.end()
    }
}

/// Status, headers and body of one HTTP response.
///
/// Owned by the orchestrator for the duration of a single download.
pub struct ResponseEnvelope {
    status: u16,
    headers: ResponseHeaders,
    content_length: Option<u64>,
    body: BodyStream,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn new(
        status: u16,
        headers: ResponseHeaders,
        content_length: Option<u64>,
        body: BodyStream,
    ) -> Self {
        Self {
            status,
            headers,
            content_length,
            body,
        }
    }

    /// Envelope over an in-memory body, for transports that already hold the
    /// payload and for tests.
    #[must_use]
    pub fn from_bytes(status: u16, headers: ResponseHeaders, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let content_length = Some(body.len() as u64);
        let stream = stream::once(async move { Ok::<_, io::Error>(body) });
        Self::new(status, headers, content_length, Box::pin(stream))
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    /// Declared length from the response head. Informational only; stored
    /// lengths always come from the sink.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Determines whether the body carries any bytes.
    ///
    /// No-content statuses (204, 205) and a declared length of zero are empty
    /// without touching the stream. Otherwise at most one non-empty chunk is read and pushed back in front
    /// of the remaining stream, so nothing is lost and memory stays bounded.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised by the body stream while probing.
    pub async fn probe_body(&mut self) -> io::Result<BodyPresence> {
        if matches!(self.status, 204 | 205) || self.content_length == Some(0) {
            return Ok(BodyPresence::Empty);
        }

        while let Some(chunk) = self.body.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            let drained: BodyStream = Box::pin(stream::empty());
            let rest = std::mem::replace(&mut self.body, drained);
            self.body = Box::pin(stream::once(async move { Ok::<_, io::Error>(chunk) }).chain(rest));
            return Ok(BodyPresence::NonEmpty);
        }

        Ok(BodyPresence::Empty)
    }

    /// Splits the envelope into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (u16, ResponseHeaders, BodyStream) {
        (self.status, self.headers, self.body)
    }
}

impl fmt::Debug for ResponseEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseEnvelope")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
