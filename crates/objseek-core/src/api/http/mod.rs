//! Path-style HTTP object transport on libcurl.
//!
//! Objects live at `{endpoint}/{bucket}/{key}`. Data fetches are GETs with an
//! open-ended `Range: bytes=N-`; metadata comes from HEAD. Requests are not
//! signed; static headers from config (e.g. a bearer token) are attached to
//! every request.

mod body;
mod parse;

use super::{ObjectApi, ObjectBody, ObjectStat};
use crate::error::TransportError;
use body::{CurlBody, CHUNK_QUEUE_DEPTH};
use std::collections::HashMap;
use std::io::{self, Read};
use std::str;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use url::Url;

/// Transfer options applied to every curl handle.
#[derive(Debug, Clone, Copy)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Abort when throughput stays below this many bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
        }
    }
}

/// `ObjectApi` over plain HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpObjectApi {
    endpoint: Url,
    headers: HashMap<String, String>,
    curl: CurlOptions,
}

impl HttpObjectApi {
    pub fn new(
        endpoint: &str,
        headers: HashMap<String, String>,
        curl: CurlOptions,
    ) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase.into());
        }
        Ok(Self {
            endpoint,
            headers,
            curl,
        })
    }

    /// URL of `bucket/key`. Each `/`-separated key segment is percent-encoded.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url, TransportError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));
        Ok(url)
    }

    fn easy(&self, url: &Url) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.connect_timeout(self.curl.connect_timeout)?;
        easy.low_speed_limit(self.curl.low_speed_limit)?;
        easy.low_speed_time(self.curl.low_speed_time)?;

        let mut list = curl::easy::List::new();
        for (k, v) in &self.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if !self.headers.is_empty() {
            easy.http_headers(list)?;
        }
        Ok(easy)
    }

    fn status_error(&self, code: u32, url: &Url, bucket: &str, key: &str) -> TransportError {
        if code == 404 {
            TransportError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        } else {
            TransportError::Http {
                code,
                url: url.to_string(),
            }
        }
    }
}

impl ObjectApi for HttpObjectApi {
    fn get_object(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
    ) -> Result<(ObjectBody, ObjectStat), TransportError> {
        let url = self.object_url(bucket, key)?;
        let mut easy = self.easy(&url)?;
        if offset > 0 {
            easy.range(&format!("{}-", offset))?;
        }

        let (tx, rx) = mpsc::sync_channel(CHUNK_QUEUE_DEPTH);
        let abort = Arc::new(AtomicBool::new(false));
        let worker_abort = Arc::clone(&abort);
        let worker = thread::Builder::new()
            .name("objseek-fetch".to_string())
            .spawn(move || body::run_transfer(easy, tx, worker_abort))?;
        let mut body = CurlBody::new(rx, abort, worker);

        let (code, lines) = body.wait_head()?;
        let head = parse::parse_headers(&lines);
        tracing::debug!(%url, offset, code, "object fetch started");

        match code {
            206 => Ok((Box::new(body), head.to_stat(offset))),
            200 if offset == 0 => Ok((Box::new(body), head.to_stat(0))),
            200 => {
                // Server ignored the Range header; skip to the requested offset.
                tracing::debug!(%url, offset, "range ignored by server, discarding prefix");
                let stat = head.to_stat(0);
                let skipped = io::copy(&mut (&mut body).take(offset), &mut io::sink())?;
                if skipped < offset {
                    return Ok((Box::new(io::empty()), stat));
                }
                Ok((Box::new(body), stat))
            }
            416 => Ok((Box::new(io::empty()), head.to_stat(offset))),
            c if (200..300).contains(&c) => Ok((Box::new(body), head.to_stat(offset))),
            c => Err(self.status_error(c, &url, bucket, key)),
        }
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectStat, TransportError> {
        let url = self.object_url(bucket, key)?;
        let mut headers: Vec<String> = Vec::new();
        let mut easy = self.easy(&url)?;
        easy.nobody(true)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    if parse::parse_status_line(s).is_some() {
                        headers.clear();
                    }
                    headers.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(self.status_error(code, &url, bucket, key));
        }
        let head = parse::parse_headers(&headers);
        if head.content_length.is_none() {
            tracing::warn!(%url, "HEAD response without Content-Length");
            return Err(TransportError::MissingLength {
                url: url.to_string(),
            });
        }
        Ok(head.to_stat(0))
    }
}
